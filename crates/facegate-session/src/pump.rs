//! Frame pump and detection worker.
//!
//! The pump pulls frames from a `FrameSource` on its own thread and publishes
//! only the newest one. The worker evaluates whatever is newest when it gets
//! round to it, so a slow detector drops frames instead of queueing them.

use crate::engine::EngineHandle;
use facegate_core::{CameraFacing, DetectionResult, FaceCapability};
use facegate_hw::{Frame, FrameSource};
use std::time::Duration;
use tokio::sync::watch;

/// Drive `source` until the detection side goes away or the engine stops
/// publishing a facing. Follows facing changes before each frame.
pub fn spawn_frame_pump(
    mut source: Box<dyn FrameSource>,
    mut facing: watch::Receiver<CameraFacing>,
    frame_tx: watch::Sender<Option<Frame>>,
    interval: Duration,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("facegate-pump".into())
        .spawn(move || {
            let mut pulled: u64 = 0;
            let mut failures: u64 = 0;
            loop {
                if frame_tx.is_closed() {
                    break;
                }
                match facing.has_changed() {
                    Ok(true) => {
                        let wanted = *facing.borrow_and_update();
                        if let Err(e) = source.set_facing(wanted) {
                            tracing::warn!(facing = %wanted, error = %e, "camera switch failed");
                        }
                    }
                    Ok(false) => {}
                    Err(_) => break,
                }

                match source.next_frame() {
                    Ok(frame) => {
                        pulled += 1;
                        frame_tx.send_replace(Some(frame));
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::warn!(error = %e, "frame capture failed");
                    }
                }
                std::thread::sleep(interval);
            }
            tracing::debug!(pulled, failures, "frame pump stopped");
        })
}

/// Run detection on the newest frame and forward each result to the engine.
///
/// A capability failure is treated as a frame with no faces, so the gate's
/// state is left alone. Detection runs on the blocking pool since real
/// detectors are CPU-bound.
pub fn spawn_detection_worker(
    mut capability: Box<dyn FaceCapability>,
    mut frames: watch::Receiver<Option<Frame>>,
    engine: EngineHandle,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            let Some(frame) = frames.borrow_and_update().clone() else {
                continue;
            };

            let joined = tokio::task::spawn_blocking(move || {
                let faces = capability.detect(&frame.data, frame.width, frame.height);
                (capability, frame, faces)
            })
            .await;

            let (returned, frame, faces) = match joined {
                Ok(out) => out,
                Err(e) => {
                    tracing::error!(error = %e, "detection task panicked");
                    break;
                }
            };
            capability = returned;

            let detection = match faces {
                Ok(faces) => DetectionResult {
                    frame_width: frame.width,
                    frame_height: frame.height,
                    faces,
                },
                Err(e) => {
                    tracing::warn!(seq = frame.sequence, error = %e, "face detection failed");
                    DetectionResult::empty(frame.width, frame.height)
                }
            };

            tracing::trace!(seq = frame.sequence, faces = detection.faces.len(), "frame evaluated");
            if engine.submit_frame(frame, detection).await.is_err() {
                break;
            }
        }
        tracing::debug!("detection worker stopped");
    })
}
