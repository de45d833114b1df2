//! Capture gate: the subject → (optional) device capture state machine.
//!
//! The gate is pure state. Every action returns the side effect its owner
//! must carry out (save a photo, delete one, switch camera, end the session);
//! the owner performs it best-effort and never feeds failures back in.

use crate::types::{CameraFacing, CaptureStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    SubjectAwaiting,
    SubjectCaptured,
    DeviceAwaiting,
    DeviceCaptured,
    Done,
}

impl GateState {
    /// The step this state belongs to, or `None` once the session is done.
    pub fn step(&self) -> Option<CaptureStep> {
        match self {
            GateState::SubjectAwaiting | GateState::SubjectCaptured => Some(CaptureStep::Subject),
            GateState::DeviceAwaiting | GateState::DeviceCaptured => Some(CaptureStep::Device),
            GateState::Done => None,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, GateState::SubjectAwaiting | GateState::DeviceAwaiting)
    }
}

/// Guide image shown behind the live preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Face,
    Device,
}

/// Work the gate's owner must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEffect {
    /// Persist the last evaluated frame as this step's photo.
    Capture(CaptureStep),
    /// Delete this step's photo and metadata.
    Discard(CaptureStep),
    /// Point the frame source at another camera.
    SwitchCamera(CameraFacing),
    /// The session is complete; dismiss.
    Finish,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StepFlags {
    captured: bool,
    confirmed: bool,
}

/// Snapshot of the gate for display and status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSnapshot {
    pub state: GateState,
    pub manual_device_check: bool,
    pub confirm_enabled: bool,
    pub retry_visible: bool,
    pub overlay_valid: bool,
    pub facing: CameraFacing,
    pub placeholder: Placeholder,
    pub subject_captured: bool,
    pub device_captured: bool,
}

pub struct CaptureGate {
    state: GateState,
    manual_device_check: bool,
    subject: StepFlags,
    device: StepFlags,
    confirm_enabled: bool,
    retry_visible: bool,
    overlay_valid: bool,
    facing: CameraFacing,
    placeholder: Placeholder,
}

impl CaptureGate {
    /// Start a session. `manual_device_check` decides whether a device photo
    /// follows the subject photo and cannot change afterwards.
    pub fn new(manual_device_check: bool) -> Self {
        Self {
            state: GateState::SubjectAwaiting,
            manual_device_check,
            subject: StepFlags::default(),
            device: StepFlags::default(),
            confirm_enabled: false,
            retry_visible: false,
            overlay_valid: false,
            facing: CameraFacing::Front,
            placeholder: Placeholder::Face,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn manual_device_check(&self) -> bool {
        self.manual_device_check
    }

    pub fn confirm_enabled(&self) -> bool {
        self.confirm_enabled
    }

    pub fn retry_visible(&self) -> bool {
        self.retry_visible
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn is_captured(&self, step: CaptureStep) -> bool {
        self.flags(step).captured
    }

    pub fn is_confirmed(&self, step: CaptureStep) -> bool {
        self.flags(step).confirmed
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            state: self.state,
            manual_device_check: self.manual_device_check,
            confirm_enabled: self.confirm_enabled,
            retry_visible: self.retry_visible,
            overlay_valid: self.overlay_valid,
            facing: self.facing,
            placeholder: self.placeholder,
            subject_captured: self.subject.captured,
            device_captured: self.device.captured,
        }
    }

    /// Apply a validity verdict for the latest frame.
    ///
    /// `None` (no face in the frame) leaves everything as it was. Verdicts are
    /// only honoured while a step is awaiting capture. Returns true when the
    /// confirm affordance changed.
    pub fn apply_validity(&mut self, verdict: Option<bool>) -> bool {
        let Some(valid) = verdict else {
            return false;
        };
        if !self.state.is_awaiting() {
            return false;
        }
        self.overlay_valid = valid;
        let changed = self.confirm_enabled != valid;
        self.confirm_enabled = valid;
        changed
    }

    /// Handle a confirm tap. `frame_available` reports whether a preview
    /// frame exists to be saved; without one, capture is a no-op.
    pub fn confirm(&mut self, frame_available: bool) -> Option<GateEffect> {
        match self.state {
            GateState::SubjectAwaiting | GateState::DeviceAwaiting => {
                if !self.confirm_enabled {
                    tracing::debug!(state = ?self.state, "confirm ignored: face not valid");
                    return None;
                }
                if !frame_available {
                    tracing::debug!(state = ?self.state, "confirm ignored: no preview frame");
                    return None;
                }
                let step = self.current_step();
                self.flags_mut(step).captured = true;
                self.retry_visible = true;
                self.state = match step {
                    CaptureStep::Subject => GateState::SubjectCaptured,
                    CaptureStep::Device => GateState::DeviceCaptured,
                };
                Some(GateEffect::Capture(step))
            }
            GateState::SubjectCaptured => {
                self.subject.confirmed = true;
                if !self.manual_device_check {
                    self.state = GateState::Done;
                    return Some(GateEffect::Finish);
                }
                self.state = GateState::DeviceAwaiting;
                self.facing = CameraFacing::Rear;
                self.placeholder = Placeholder::Device;
                self.overlay_valid = false;
                self.confirm_enabled = true;
                self.retry_visible = false;
                Some(GateEffect::SwitchCamera(CameraFacing::Rear))
            }
            GateState::DeviceCaptured => {
                self.device.confirmed = true;
                self.state = GateState::Done;
                Some(GateEffect::Finish)
            }
            GateState::Done => None,
        }
    }

    /// Handle a retry tap. Only meaningful right after a capture.
    pub fn retry(&mut self) -> Option<GateEffect> {
        let (step, next) = match self.state {
            GateState::SubjectCaptured => (CaptureStep::Subject, GateState::SubjectAwaiting),
            GateState::DeviceCaptured => (CaptureStep::Device, GateState::DeviceAwaiting),
            _ => return None,
        };
        self.flags_mut(step).captured = false;
        self.retry_visible = false;
        self.state = next;
        Some(GateEffect::Discard(step))
    }

    fn current_step(&self) -> CaptureStep {
        self.state.step().unwrap_or(CaptureStep::Device)
    }

    fn flags(&self, step: CaptureStep) -> &StepFlags {
        match step {
            CaptureStep::Subject => &self.subject,
            CaptureStep::Device => &self.device,
        }
    }

    fn flags_mut(&mut self, step: CaptureStep) -> &mut StepFlags {
        match step {
            CaptureStep::Subject => &mut self.subject,
            CaptureStep::Device => &mut self.device,
        }
    }
}
