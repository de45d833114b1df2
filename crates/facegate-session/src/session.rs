//! A running capture session: engine thread, frame pump and detection worker
//! wired together.

use crate::config::Config;
use crate::engine::{spawn_engine, EngineError, EngineHandle, SessionEvent};
use crate::pump::{spawn_detection_worker, spawn_frame_pump};
use facegate_core::{FaceCapability, LocationProvider};
use facegate_hw::{CameraError, FrameSource};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("failed to spawn frame pump: {0}")]
    Spawn(std::io::Error),
}

pub struct Session {
    handle: EngineHandle,
    pump: std::thread::JoinHandle<()>,
    worker: tokio::task::JoinHandle<()>,
}

impl Session {
    /// Open a session. Must be called from within a Tokio runtime.
    ///
    /// Returns the session and the stream of events it will emit.
    pub fn start(
        config: &Config,
        mut source: Box<dyn FrameSource>,
        capability: Box<dyn FaceCapability>,
        location: Arc<dyn LocationProvider>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let handle = spawn_engine(config, location, events_tx)?;

        let facing = handle.facing();
        source.set_facing(*facing.borrow())?;

        let (frame_tx, frame_rx) = watch::channel(None);
        let pump = spawn_frame_pump(source, facing, frame_tx, config.frame_interval)
            .map_err(SessionError::Spawn)?;
        let worker = spawn_detection_worker(capability, frame_rx, handle.clone());

        Ok((
            Self {
                handle,
                pump,
                worker,
            },
            events_rx,
        ))
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// Stop the engine and wait for the pump and worker to wind down.
    pub async fn close(self) -> Result<(), SessionError> {
        // The engine may already be gone; shutdown continues either way.
        if let Err(e) = self.handle.close().await {
            tracing::debug!(error = %e, "engine already stopped");
        }
        drop(self.handle);

        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "detection worker ended abnormally");
        }
        let pump = self.pump;
        if let Ok(Err(_)) = tokio::task::spawn_blocking(move || pump.join()).await {
            tracing::warn!("frame pump panicked");
        }
        Ok(())
    }
}
