use crate::config::Config;
use facegate_core::{
    CameraFacing, CaptureGate, CaptureStep, DetectionResult, GateEffect, GateSnapshot,
    LocationProvider, ValidityEvaluator,
};
use facegate_hw::Frame;
use facegate_store::{PhotoStore, RecordStore, StoreError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

const REQUEST_QUEUE_DEPTH: usize = 8;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Notifications from the session to whoever opened it.
///
/// Events are queued without bound; the receiver should be drained for the
/// life of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A photo was taken. `path` is `None` when saving it failed, in which
    /// case no metadata was recorded either.
    Captured {
        step: CaptureStep,
        path: Option<PathBuf>,
        sequence: u32,
        facing: CameraFacing,
        width: u32,
        height: u32,
    },
    /// A captured photo was discarded.
    Retried { step: CaptureStep },
    ConfirmChanged { enabled: bool },
    OverlayChanged { valid: bool },
    CameraSwitched { facing: CameraFacing },
    /// The session is complete and should be dismissed.
    Finished,
}

/// Messages sent to the engine thread.
enum EngineRequest {
    Frame {
        frame: Frame,
        detection: DetectionResult,
    },
    Confirm {
        reply: oneshot::Sender<GateSnapshot>,
    },
    Retry {
        reply: oneshot::Sender<GateSnapshot>,
    },
    Status {
        reply: oneshot::Sender<GateSnapshot>,
    },
    Close,
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    facing: watch::Receiver<CameraFacing>,
    session_id: Uuid,
}

impl EngineHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The camera the gate currently wants frames from.
    pub fn facing(&self) -> watch::Receiver<CameraFacing> {
        self.facing.clone()
    }

    /// Hand a frame and its detection result to the engine.
    pub async fn submit_frame(
        &self,
        frame: Frame,
        detection: DetectionResult,
    ) -> Result<(), EngineError> {
        self.tx
            .send(EngineRequest::Frame { frame, detection })
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Press confirm. Returns the gate state after the press.
    pub async fn confirm(&self) -> Result<GateSnapshot, EngineError> {
        self.request(|reply| EngineRequest::Confirm { reply }).await
    }

    /// Press retry. Returns the gate state after the press.
    pub async fn retry(&self) -> Result<GateSnapshot, EngineError> {
        self.request(|reply| EngineRequest::Retry { reply }).await
    }

    pub async fn status(&self) -> Result<GateSnapshot, EngineError> {
        self.request(|reply| EngineRequest::Status { reply }).await
    }

    /// Stop the engine thread. Pending frames are discarded.
    pub async fn close(&self) -> Result<(), EngineError> {
        self.tx
            .send(EngineRequest::Close)
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    async fn request<F>(&self, make: F) -> Result<GateSnapshot, EngineError>
    where
        F: FnOnce(oneshot::Sender<GateSnapshot>) -> EngineRequest,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Single owner of the capture gate. All state mutation happens here, one
/// request at a time.
pub struct Engine {
    session_id: Uuid,
    gate: CaptureGate,
    evaluator: ValidityEvaluator,
    photos: PhotoStore,
    records: RecordStore,
    location: Arc<dyn LocationProvider>,
    jpeg_quality: u8,
    last_frame: Option<Frame>,
    events: mpsc::UnboundedSender<SessionEvent>,
    facing_tx: watch::Sender<CameraFacing>,
}

impl Engine {
    pub fn new(
        config: &Config,
        records: RecordStore,
        location: Arc<dyn LocationProvider>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let gate = CaptureGate::new(config.manual_device_check);
        let (facing_tx, _) = watch::channel(gate.facing());
        Self {
            session_id: Uuid::new_v4(),
            gate,
            evaluator: ValidityEvaluator::new(config.validity),
            photos: PhotoStore::new(&config.data_dir),
            records,
            location,
            jpeg_quality: config.jpeg_quality,
            last_frame: None,
            events,
            facing_tx,
        }
    }

    pub fn snapshot(&self) -> GateSnapshot {
        self.gate.snapshot()
    }

    /// Take in one evaluated frame. The frame becomes the preview that a
    /// confirm would save; its verdict updates the confirm affordance.
    pub fn on_frame(&mut self, frame: Frame, detection: &DetectionResult) {
        if frame.facing != self.gate.facing() {
            tracing::debug!(
                session = %self.session_id,
                seq = frame.sequence,
                facing = %frame.facing,
                "dropping frame from previous camera"
            );
            return;
        }
        self.last_frame = Some(frame);

        let before = self.gate.snapshot();
        let verdict = self.evaluator.evaluate(detection);
        self.gate.apply_validity(verdict);
        self.emit_changes(&before);
    }

    pub fn confirm(&mut self) -> GateSnapshot {
        let before = self.gate.snapshot();
        if let Some(effect) = self.gate.confirm(self.last_frame.is_some()) {
            self.apply(effect);
        }
        self.emit_changes(&before);
        self.gate.snapshot()
    }

    pub fn retry(&mut self) -> GateSnapshot {
        let before = self.gate.snapshot();
        if let Some(effect) = self.gate.retry() {
            self.apply(effect);
        }
        self.emit_changes(&before);
        self.gate.snapshot()
    }

    fn apply(&mut self, effect: GateEffect) {
        tracing::info!(session = %self.session_id, ?effect, state = ?self.gate.state(), "gate transition");
        match effect {
            GateEffect::Capture(step) => self.capture(step),
            GateEffect::Discard(step) => self.discard(step),
            GateEffect::SwitchCamera(facing) => {
                self.last_frame = None;
                self.facing_tx.send_replace(facing);
                self.emit(SessionEvent::CameraSwitched { facing });
            }
            GateEffect::Finish => self.emit(SessionEvent::Finished),
        }
    }

    /// Persist the preview frame and its metadata. Failures are logged; the
    /// gate has already moved on.
    fn capture(&mut self, step: CaptureStep) {
        let Some(frame) = self.last_frame.as_ref() else {
            return;
        };
        let (sequence, facing, width, height) = (frame.sequence, frame.facing, frame.width, frame.height);

        let path = match frame.encode_jpeg(self.jpeg_quality) {
            Ok(jpeg) => match self.photos.save(step, &jpeg) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(session = %self.session_id, %step, error = %e, "failed to save photo");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(session = %self.session_id, %step, error = %e, "failed to encode photo");
                None
            }
        };

        // Metadata only describes photos that exist on disk.
        let coordinate = self.location.current();
        if path.is_some() {
            let now = chrono::Local::now();
            if let Err(e) = self.records.update(|r| r.stamp(step, &now, coordinate)) {
                tracing::warn!(session = %self.session_id, %step, error = %e, "failed to record capture metadata");
            }
        }

        tracing::info!(
            session = %self.session_id,
            %step,
            seq = sequence,
            saved = path.is_some(),
            has_location = coordinate.is_some(),
            "photo captured"
        );
        self.emit(SessionEvent::Captured {
            step,
            path,
            sequence,
            facing,
            width,
            height,
        });
    }

    /// Remove the step's photo and metadata. Failures are logged and a stale
    /// file may remain.
    fn discard(&mut self, step: CaptureStep) {
        if let Err(e) = self.photos.delete(step) {
            tracing::warn!(session = %self.session_id, %step, error = %e, "failed to delete photo");
        }
        if let Err(e) = self.records.update(|r| r.clear_step(step)) {
            tracing::warn!(session = %self.session_id, %step, error = %e, "failed to clear capture metadata");
        }
        self.emit(SessionEvent::Retried { step });
    }

    fn emit_changes(&self, before: &GateSnapshot) {
        let after = self.gate.snapshot();
        if after.confirm_enabled != before.confirm_enabled {
            self.emit(SessionEvent::ConfirmChanged {
                enabled: after.confirm_enabled,
            });
        }
        if after.overlay_valid != before.overlay_valid {
            self.emit(SessionEvent::OverlayChanged {
                valid: after.overlay_valid,
            });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine: the session keeps running headless.
        let _ = self.events.send(event);
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Opens the record store up front so a broken database fails the session
/// before any frame is processed.
pub fn spawn_engine(
    config: &Config,
    location: Arc<dyn LocationProvider>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> Result<EngineHandle, EngineError> {
    let records = RecordStore::open(&config.db_path)?;
    let engine = Engine::new(config, records, location, events);
    spawn_with(engine)
}

/// Run an already-built engine on its own thread.
pub fn spawn_with(mut engine: Engine) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(REQUEST_QUEUE_DEPTH);
    let facing = engine.facing_tx.subscribe();
    let session_id = engine.session_id;

    tracing::info!(
        session = %session_id,
        manual_device_check = engine.gate.manual_device_check(),
        photos = %engine.photos.dir().display(),
        "capture session opened"
    );

    std::thread::Builder::new()
        .name("facegate-engine".into())
        .spawn(move || {
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Frame { frame, detection } => engine.on_frame(frame, &detection),
                    EngineRequest::Confirm { reply } => {
                        let _ = reply.send(engine.confirm());
                    }
                    EngineRequest::Retry { reply } => {
                        let _ = reply.send(engine.retry());
                    }
                    EngineRequest::Status { reply } => {
                        let _ = reply.send(engine.snapshot());
                    }
                    EngineRequest::Close => break,
                }
            }
            tracing::info!(session = %engine.session_id, state = ?engine.gate.state(), "capture session closed");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle {
        tx,
        facing,
        session_id,
    })
}
