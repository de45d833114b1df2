//! Frame sources.
//!
//! `ImageDirCamera` replays still images from disk in place of a live
//! camera: `front/` and `rear/` subdirectories feed the two facings, or the
//! directory itself feeds both.

use crate::frame::Frame;
use facegate_core::CameraFacing;
use std::path::{Path, PathBuf};
use thiserror::Error;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("no {0} camera available")]
    FacingUnavailable(CameraFacing),
}

/// A producer of camera frames.
pub trait FrameSource: Send {
    /// Select the physical camera for subsequent frames.
    fn set_facing(&mut self, facing: CameraFacing) -> Result<(), CameraError>;

    fn facing(&self) -> CameraFacing;

    /// Capture the next frame from the selected camera.
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
}

/// Replays image files as a camera, cycling through them in name order.
pub struct ImageDirCamera {
    front: Vec<PathBuf>,
    rear: Vec<PathBuf>,
    facing: CameraFacing,
    cursor: usize,
    sequence: u32,
}

impl ImageDirCamera {
    pub fn open(dir: &Path) -> Result<Self, CameraError> {
        if !dir.is_dir() {
            return Err(CameraError::DeviceNotFound(dir.display().to_string()));
        }

        let front_dir = dir.join("front");
        let rear_dir = dir.join("rear");
        let (front, rear) = if front_dir.is_dir() || rear_dir.is_dir() {
            (list_images(&front_dir)?, list_images(&rear_dir)?)
        } else {
            let all = list_images(dir)?;
            (all.clone(), all)
        };

        if front.is_empty() {
            return Err(CameraError::DeviceNotFound(format!(
                "{}: no images for the front camera",
                dir.display()
            )));
        }

        tracing::info!(
            dir = %dir.display(),
            front = front.len(),
            rear = rear.len(),
            "opened image directory camera"
        );

        Ok(Self {
            front,
            rear,
            facing: CameraFacing::Front,
            cursor: 0,
            sequence: 0,
        })
    }

    fn images(&self, facing: CameraFacing) -> &[PathBuf] {
        match facing {
            CameraFacing::Front => &self.front,
            CameraFacing::Rear => &self.rear,
        }
    }
}

impl FrameSource for ImageDirCamera {
    fn set_facing(&mut self, facing: CameraFacing) -> Result<(), CameraError> {
        if self.images(facing).is_empty() {
            return Err(CameraError::FacingUnavailable(facing));
        }
        if facing != self.facing {
            tracing::info!(from = %self.facing, to = %facing, "switching camera");
            self.facing = facing;
            self.cursor = 0;
        }
        Ok(())
    }

    fn facing(&self) -> CameraFacing {
        self.facing
    }

    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let images = self.images(self.facing);
        let count = images.len();
        let path = images
            .get(self.cursor % count.max(1))
            .ok_or(CameraError::FacingUnavailable(self.facing))?
            .clone();
        self.cursor = (self.cursor + 1) % count;

        let img = image::open(&path)
            .map_err(|e| CameraError::CaptureFailed(format!("{}: {e}", path.display())))?
            .to_rgb8();

        let frame = Frame::from_image(img, self.sequence, self.facing);
        self.sequence = self.sequence.wrapping_add(1);
        Ok(frame)
    }
}

/// Image files directly inside `dir`, sorted by name. A missing directory
/// yields an empty list.
fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CameraError::DeviceNotFound(format!("{}: {e}", dir.display())))?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path, w: u32, h: u32, shade: u8) {
        RgbImage::from_pixel(w, h, Rgb([shade, shade, shade]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_open_missing_dir() {
        let result = ImageDirCamera::open(Path::new("/nonexistent/facegate-frames"));
        assert!(matches!(result, Err(CameraError::DeviceNotFound(_))));
    }

    #[test]
    fn test_open_dir_without_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert!(ImageDirCamera::open(dir.path()).is_err());
    }

    #[test]
    fn test_flat_dir_cycles_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 4, 2, 20);
        write_png(&dir.path().join("a.png"), 2, 2, 10);

        let mut cam = ImageDirCamera::open(dir.path()).unwrap();
        let f0 = cam.next_frame().unwrap();
        let f1 = cam.next_frame().unwrap();
        let f2 = cam.next_frame().unwrap();
        assert_eq!((f0.width, f0.data[0]), (2, 10));
        assert_eq!((f1.width, f1.data[0]), (4, 20));
        assert_eq!((f2.width, f2.data[0]), (2, 10));
        assert_eq!((f0.sequence, f1.sequence, f2.sequence), (0, 1, 2));
    }

    #[test]
    fn test_flat_dir_serves_both_facings() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 2, 2, 10);
        let mut cam = ImageDirCamera::open(dir.path()).unwrap();
        cam.set_facing(CameraFacing::Rear).unwrap();
        assert_eq!(cam.next_frame().unwrap().facing, CameraFacing::Rear);
    }

    #[test]
    fn test_split_dirs_switch_facing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("front")).unwrap();
        std::fs::create_dir(dir.path().join("rear")).unwrap();
        write_png(&dir.path().join("front/selfie.png"), 2, 2, 10);
        write_png(&dir.path().join("rear/device.png"), 2, 2, 200);

        let mut cam = ImageDirCamera::open(dir.path()).unwrap();
        assert_eq!(cam.next_frame().unwrap().data[0], 10);
        cam.set_facing(CameraFacing::Rear).unwrap();
        let frame = cam.next_frame().unwrap();
        assert_eq!(frame.data[0], 200);
        assert_eq!(frame.facing, CameraFacing::Rear);
    }

    #[test]
    fn test_missing_rear_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("front")).unwrap();
        write_png(&dir.path().join("front/selfie.png"), 2, 2, 10);

        let mut cam = ImageDirCamera::open(dir.path()).unwrap();
        assert!(matches!(
            cam.set_facing(CameraFacing::Rear),
            Err(CameraError::FacingUnavailable(CameraFacing::Rear))
        ));
        assert_eq!(cam.facing(), CameraFacing::Front);
    }
}
