//! Frame type and encoding — RGB buffers, JPEG output.

use facegate_core::CameraFacing;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage};

/// A captured RGB camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Packed RGB8 pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
    pub facing: CameraFacing,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("facing", &self.facing)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Wrap a packed RGB8 buffer, checking its length.
    pub fn from_rgb(
        data: Vec<u8>,
        width: u32,
        height: u32,
        sequence: u32,
        facing: CameraFacing,
    ) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence,
            facing,
        })
    }

    pub fn from_image(image: RgbImage, sequence: u32, facing: CameraFacing) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence,
            facing,
        }
    }

    /// Encode as baseline JPEG. `quality` is 1–100.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, FrameError> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode(&self.data, self.width, self.height, ExtendedColorType::Rgb8)?;
        Ok(out)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid RGB length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb.iter().copied().cycle().take((width * height * 3) as usize).collect();
        Frame::from_rgb(data, width, height, 0, CameraFacing::Front).unwrap()
    }

    #[test]
    fn test_from_rgb_rejects_short_buffer() {
        let result = Frame::from_rgb(vec![0; 5], 2, 1, 0, CameraFacing::Front);
        assert!(matches!(
            result,
            Err(FrameError::InvalidLength { expected: 6, actual: 5 })
        ));
    }

    #[test]
    fn test_from_image_keeps_dimensions() {
        let img = RgbImage::new(4, 3);
        let frame = Frame::from_image(img, 7, CameraFacing::Rear);
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.data.len(), 36);
        assert_eq!(frame.sequence, 7);
        assert_eq!(frame.facing, CameraFacing::Rear);
    }

    #[test]
    fn test_encode_jpeg_magic() {
        let jpeg = solid(16, 16, [200, 100, 50]).encode_jpeg(80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_decodes_back_to_same_size() {
        let jpeg = solid(20, 10, [10, 20, 30]).encode_jpeg(80).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }
}
