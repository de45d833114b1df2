//! facegate-core — Face validity evaluation and capture gating.
//!
//! Judges detection results from an external face capability and drives the
//! subject/device capture state machine. No I/O happens here.

pub mod capability;
pub mod gate;
pub mod record;
pub mod types;
pub mod validity;

pub use capability::{parse_recording, CapabilityError, FaceCapability, ReplayCapability, ReplayEntry};
pub use gate::{CaptureGate, GateEffect, GateSnapshot, GateState, Placeholder};
pub use record::{CaptureRecord, FixedLocation, LocationProvider};
pub use types::{CameraFacing, CaptureStep, Coordinate, DetectionResult, FaceObservation, Point, Rect};
pub use validity::{FaceVerdict, OrientationTolerance, ValidityConfig, ValidityEvaluator};
