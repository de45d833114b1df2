//! facegate-hw — Frame sources and frame encoding.
//!
//! Provides the `FrameSource` seam the session pumps frames from, a
//! directory-replay camera, and JPEG encoding for captured photos.

pub mod camera;
pub mod frame;

pub use camera::{CameraError, FrameSource, ImageDirCamera};
pub use frame::{Frame, FrameError};
