//! Face capability seam.
//!
//! The detector itself is an external collaborator; facegate only consumes
//! its observations. `ReplayCapability` feeds recorded observations back in,
//! one entry per processed frame.

use crate::types::FaceObservation;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("detection failed: {0}")]
    DetectionFailed(String),
    #[error("capability unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read recording {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("bad recording at line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("recording is empty")]
    EmptyRecording,
}

/// Something that finds faces in a frame.
///
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceCapability: Send {
    fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceObservation>, CapabilityError>;
}

/// One recorded detection pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplayEntry {
    Faces(Vec<FaceObservation>),
    Failure { error: String },
}

/// Replays recorded detection passes in order, wrapping around at the end.
pub struct ReplayCapability {
    entries: Vec<ReplayEntry>,
    cursor: usize,
}

impl ReplayCapability {
    pub fn new(entries: Vec<ReplayEntry>) -> Result<Self, CapabilityError> {
        if entries.is_empty() {
            return Err(CapabilityError::EmptyRecording);
        }
        Ok(Self { entries, cursor: 0 })
    }

    /// Load a JSON-lines recording: one JSON array of observations (or
    /// `{"error": "..."}`) per line. Blank lines are skipped.
    pub fn load(path: &Path) -> Result<Self, CapabilityError> {
        let text = std::fs::read_to_string(path).map_err(|source| CapabilityError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let entries = parse_recording(&text)?;
        tracing::info!(path = %path.display(), entries = entries.len(), "loaded detection recording");
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a JSON-lines recording into entries.
pub fn parse_recording(text: &str) -> Result<Vec<ReplayEntry>, CapabilityError> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l).map_err(|source| CapabilityError::Parse { line: i + 1, source })
        })
        .collect()
}

impl FaceCapability for ReplayCapability {
    fn detect(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<FaceObservation>, CapabilityError> {
        let entry = &self.entries[self.cursor];
        self.cursor = (self.cursor + 1) % self.entries.len();
        match entry {
            ReplayEntry::Faces(faces) => Ok(faces.clone()),
            ReplayEntry::Failure { error } => Err(CapabilityError::DetectionFailed(error.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ONE_FACE: &str = r#"[{"bounds":{"x":0.2,"y":0.2,"width":0.4,"height":0.4},"contour":[{"x":50.0,"y":50.0}],"yaw":0.0,"pitch":0.0,"roll":0.0}]"#;

    #[test]
    fn test_parse_recording_mixed_entries() {
        let text = format!("{ONE_FACE}\n\n[]\n{{\"error\":\"model busy\"}}\n");
        let entries = parse_recording(&text).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], ReplayEntry::Faces(f) if f.len() == 1));
        assert!(matches!(&entries[1], ReplayEntry::Faces(f) if f.is_empty()));
        assert!(matches!(&entries[2], ReplayEntry::Failure { error } if error == "model busy"));
    }

    #[test]
    fn test_parse_recording_reports_line() {
        let err = parse_recording("[]\nnot json\n").unwrap_err();
        assert!(matches!(err, CapabilityError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_replay_wraps_around() {
        let mut cap = ReplayCapability::new(parse_recording(&format!("{ONE_FACE}\n[]")).unwrap()).unwrap();
        assert_eq!(cap.detect(&[], 0, 0).unwrap().len(), 1);
        assert_eq!(cap.detect(&[], 0, 0).unwrap().len(), 0);
        assert_eq!(cap.detect(&[], 0, 0).unwrap().len(), 1);
    }

    #[test]
    fn test_replay_failure_entry() {
        let mut cap = ReplayCapability::new(vec![ReplayEntry::Failure { error: "boom".into() }]).unwrap();
        assert!(matches!(cap.detect(&[], 0, 0), Err(CapabilityError::DetectionFailed(_))));
    }

    #[test]
    fn test_replay_empty_recording_rejected() {
        assert!(matches!(ReplayCapability::new(vec![]), Err(CapabilityError::EmptyRecording)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{ONE_FACE}").unwrap();
        let cap = ReplayCapability::load(file.path()).unwrap();
        assert_eq!(cap.len(), 1);
    }
}
