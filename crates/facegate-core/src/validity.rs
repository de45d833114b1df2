//! Face validity evaluation.
//!
//! Decides whether a detection pass shows a face that may be captured: the
//! whole face outline inside the guide region, head facing the camera.

use crate::types::{DetectionResult, FaceObservation, Point, Rect};
use serde::Deserialize;

const DEFAULT_MAX_YAW: f32 = 15.0;
const DEFAULT_MAX_PITCH: f32 = 15.0;
const DEFAULT_MAX_ROLL: f32 = 20.0;

/// Symmetric orientation limits in degrees (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrientationTolerance {
    pub max_yaw: f32,
    pub max_pitch: f32,
    pub max_roll: f32,
}

impl Default for OrientationTolerance {
    fn default() -> Self {
        Self {
            max_yaw: DEFAULT_MAX_YAW,
            max_pitch: DEFAULT_MAX_PITCH,
            max_roll: DEFAULT_MAX_ROLL,
        }
    }
}

impl OrientationTolerance {
    pub fn accepts(&self, face: &FaceObservation) -> bool {
        face.yaw.abs() <= self.max_yaw
            && face.pitch.abs() <= self.max_pitch
            && face.roll.abs() <= self.max_roll
    }
}

/// Guide region and tolerances, loadable from the `[region]` / `[tolerance]`
/// tables of a TOML file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidityConfig {
    /// Valid region in normalized frame coordinates.
    pub region: Rect,
    pub tolerance: OrientationTolerance,
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self {
            region: Rect::new(0.1, 0.1, 0.8, 0.8),
            tolerance: OrientationTolerance::default(),
        }
    }
}

/// Per-face breakdown of the validity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVerdict {
    /// Contour points that fell outside the valid region.
    pub outside_points: usize,
    pub orientation_ok: bool,
}

impl FaceVerdict {
    pub fn is_valid(&self) -> bool {
        self.outside_points == 0 && self.orientation_ok
    }
}

pub struct ValidityEvaluator {
    config: ValidityConfig,
}

impl ValidityEvaluator {
    pub fn new(config: ValidityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidityConfig {
        &self.config
    }

    /// Pick the face to judge: the largest bounding box, earliest on ties.
    pub fn select_face(faces: &[FaceObservation]) -> Option<&FaceObservation> {
        let mut best: Option<&FaceObservation> = None;
        for face in faces {
            match best {
                Some(b) if face.bounds.area() <= b.bounds.area() => {}
                _ => best = Some(face),
            }
        }
        best
    }

    /// Check one face against the region and tolerances.
    ///
    /// Contour points are normalized by the frame size before the region
    /// test. An empty contour passes the region test.
    pub fn verdict(&self, face: &FaceObservation, frame_width: u32, frame_height: u32) -> FaceVerdict {
        let outside_points = if frame_width == 0 || frame_height == 0 {
            face.contour.len()
        } else {
            let (w, h) = (frame_width as f32, frame_height as f32);
            face.contour
                .iter()
                .filter(|p| !self.config.region.contains(Point::new(p.x / w, p.y / h)))
                .count()
        };

        FaceVerdict {
            outside_points,
            orientation_ok: self.config.tolerance.accepts(face),
        }
    }

    /// Evaluate a detection pass.
    ///
    /// Returns `None` when no face was detected: absence of a face is not an
    /// invalid signal, the previous verdict stays in effect.
    pub fn evaluate(&self, result: &DetectionResult) -> Option<bool> {
        let face = Self::select_face(&result.faces)?;
        let verdict = self.verdict(face, result.frame_width, result.frame_height);
        if !verdict.is_valid() {
            tracing::debug!(
                faces = result.faces.len(),
                outside_points = verdict.outside_points,
                orientation_ok = verdict.orientation_ok,
                yaw = face.yaw,
                pitch = face.pitch,
                roll = face.roll,
                "face not capturable"
            );
        }
        Some(verdict.is_valid())
    }
}

impl Default for ValidityEvaluator {
    fn default() -> Self {
        Self::new(ValidityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 100;
    const H: u32 = 100;

    fn face(contour: &[(f32, f32)], yaw: f32, pitch: f32, roll: f32) -> FaceObservation {
        FaceObservation {
            bounds: Rect::new(0.3, 0.3, 0.4, 0.4),
            contour: contour.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            yaw,
            pitch,
            roll,
        }
    }

    fn centered() -> Vec<(f32, f32)> {
        vec![(30.0, 30.0), (70.0, 30.0), (70.0, 70.0), (30.0, 70.0)]
    }

    fn result(faces: Vec<FaceObservation>) -> DetectionResult {
        DetectionResult {
            frame_width: W,
            frame_height: H,
            faces,
        }
    }

    #[test]
    fn test_no_faces_is_no_update() {
        let eval = ValidityEvaluator::default();
        assert_eq!(eval.evaluate(&result(vec![])), None);
    }

    #[test]
    fn test_centered_frontal_face_valid() {
        let eval = ValidityEvaluator::default();
        assert_eq!(eval.evaluate(&result(vec![face(&centered(), 0.0, 0.0, 0.0)])), Some(true));
    }

    #[test]
    fn test_tolerance_boundaries_inclusive() {
        let eval = ValidityEvaluator::default();
        let f = face(&centered(), -15.0, 15.0, -20.0);
        assert_eq!(eval.evaluate(&result(vec![f])), Some(true));
    }

    #[test]
    fn test_each_angle_violation_invalidates() {
        let eval = ValidityEvaluator::default();
        for (yaw, pitch, roll) in [(15.1, 0.0, 0.0), (0.0, -15.1, 0.0), (0.0, 0.0, 20.1)] {
            let f = face(&centered(), yaw, pitch, roll);
            assert_eq!(
                eval.evaluate(&result(vec![f])),
                Some(false),
                "yaw={yaw} pitch={pitch} roll={roll}"
            );
        }
    }

    #[test]
    fn test_single_point_outside_region_invalidates() {
        let eval = ValidityEvaluator::default();
        let mut contour = centered();
        contour.push((95.0, 50.0));
        let f = face(&contour, 0.0, 0.0, 0.0);
        let verdict = eval.verdict(&f, W, H);
        assert_eq!(verdict.outside_points, 1);
        assert!(verdict.orientation_ok);
        assert_eq!(eval.evaluate(&result(vec![f])), Some(false));
    }

    #[test]
    fn test_region_edges() {
        let eval = ValidityEvaluator::default();
        let f = face(&[(91.0, 50.0)], 0.0, 0.0, 0.0);
        assert_eq!(eval.verdict(&f, W, H).outside_points, 1);
        let f = face(&[(10.0, 50.0), (89.0, 89.0)], 0.0, 0.0, 0.0);
        assert_eq!(eval.verdict(&f, W, H).outside_points, 0);
        let f = face(&[(9.0, 50.0)], 0.0, 0.0, 0.0);
        assert_eq!(eval.verdict(&f, W, H).outside_points, 1);
    }

    #[test]
    fn test_empty_contour_passes_region() {
        let eval = ValidityEvaluator::default();
        assert_eq!(eval.evaluate(&result(vec![face(&[], 0.0, 0.0, 0.0)])), Some(true));
        assert_eq!(eval.evaluate(&result(vec![face(&[], 30.0, 0.0, 0.0)])), Some(false));
    }

    #[test]
    fn test_zero_sized_frame_rejects_contour() {
        let eval = ValidityEvaluator::default();
        let f = face(&centered(), 0.0, 0.0, 0.0);
        assert!(!eval.verdict(&f, 0, H).is_valid());
    }

    #[test]
    fn test_largest_face_wins() {
        let eval = ValidityEvaluator::default();
        let mut big_invalid = face(&centered(), 40.0, 0.0, 0.0);
        big_invalid.bounds = Rect::new(0.1, 0.1, 0.6, 0.6);
        let small_valid = face(&centered(), 0.0, 0.0, 0.0);

        // Order must not matter.
        assert_eq!(
            eval.evaluate(&result(vec![small_valid.clone(), big_invalid.clone()])),
            Some(false)
        );
        assert_eq!(eval.evaluate(&result(vec![big_invalid, small_valid])), Some(false));
    }

    #[test]
    fn test_equal_area_first_face_wins() {
        let a = face(&centered(), 1.0, 0.0, 0.0);
        let b = face(&centered(), 2.0, 0.0, 0.0);
        let faces = [a, b];
        let picked = ValidityEvaluator::select_face(&faces).unwrap();
        assert!((picked.yaw - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: ValidityConfig = config_from_json(
            r#"{"region":{"x":0.0,"y":0.0,"width":0.5,"height":0.5},"tolerance":{"max_roll":5.0}}"#,
        );
        assert!((cfg.tolerance.max_yaw - DEFAULT_MAX_YAW).abs() < 1e-6);
        assert!((cfg.tolerance.max_roll - 5.0).abs() < 1e-6);

        let eval = ValidityEvaluator::new(cfg);
        assert_eq!(eval.evaluate(&result(vec![face(&centered(), 0.0, 0.0, 0.0)])), Some(false));
        assert_eq!(eval.evaluate(&result(vec![face(&[(10.0, 10.0)], 0.0, 0.0, 6.0)])), Some(false));
        assert_eq!(eval.evaluate(&result(vec![face(&[(10.0, 10.0)], 0.0, 0.0, 4.0)])), Some(true));
    }

    fn config_from_json(json: &str) -> ValidityConfig {
        serde_json::from_str(json).unwrap()
    }
}
