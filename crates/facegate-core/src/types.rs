use serde::{Deserialize, Serialize};

/// A point in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
///
/// Containment is half-open: the left/top edges are inside, the right/bottom
/// edges are not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

/// One detected face for one frame, as reported by the face capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Bounding box normalized to the frame dimensions.
    pub bounds: Rect,
    /// Face outline, in image pixel coordinates.
    #[serde(default)]
    pub contour: Vec<Point>,
    /// Head rotation around the vertical axis, degrees.
    pub yaw: f32,
    /// Head rotation around the horizontal axis, degrees.
    pub pitch: f32,
    /// Head tilt in the image plane, degrees.
    pub roll: f32,
}

/// Detection output for a single frame. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub frame_width: u32,
    pub frame_height: u32,
    pub faces: Vec<FaceObservation>,
}

impl DetectionResult {
    pub fn empty(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            faces: Vec::new(),
        }
    }
}

/// Which photo the session is currently working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStep {
    /// The user's selfie.
    Subject,
    /// The alcohol-measurement device, taken with the rear camera.
    Device,
}

impl CaptureStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureStep::Subject => "subject",
            CaptureStep::Device => "device",
        }
    }
}

impl std::fmt::Display for CaptureStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical camera selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    Front,
    Rear,
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Front => f.write_str("front"),
            CameraFacing::Rear => f.write_str("rear"),
        }
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(9.99, 9.99)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
        assert!(!r.contains(Point::new(5.0, 10.0)));
        assert!(!r.contains(Point::new(-0.01, 5.0)));
    }

    #[test]
    fn test_rect_area_ignores_negative_extent() {
        assert!((Rect::new(0.0, 0.0, 0.5, 0.25).area() - 0.125).abs() < 1e-6);
        assert_eq!(Rect::new(0.0, 0.0, -1.0, 2.0).area(), 0.0);
    }

    #[test]
    fn test_capture_step_ordering() {
        assert!(CaptureStep::Subject < CaptureStep::Device);
    }

    #[test]
    fn test_face_observation_contour_defaults_to_empty() {
        let json = r#"{"bounds":{"x":0.1,"y":0.1,"width":0.5,"height":0.5},"yaw":1.0,"pitch":2.0,"roll":3.0}"#;
        let face: FaceObservation = serde_json::from_str(json).unwrap();
        assert!(face.contour.is_empty());
        assert!((face.roll - 3.0).abs() < 1e-6);
    }
}
