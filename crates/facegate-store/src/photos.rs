use crate::StoreError;
use facegate_core::CaptureStep;
use std::path::{Path, PathBuf};

const PHOTO_DIR: &str = "photos";
const SUBJECT_PHOTO: &str = "user_avatar.jpg";
const DEVICE_PHOTO: &str = "alcohol_device.jpg";

/// Fixed-path photo files, one per capture step.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Photos are kept in `<data_dir>/photos/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(PHOTO_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Well-known location of the photo for `step`.
    pub fn path(&self, step: CaptureStep) -> PathBuf {
        match step {
            CaptureStep::Subject => self.dir.join(SUBJECT_PHOTO),
            CaptureStep::Device => self.dir.join(DEVICE_PHOTO),
        }
    }

    pub fn exists(&self, step: CaptureStep) -> bool {
        self.path(step).is_file()
    }

    /// Write `jpeg` as the photo for `step`, replacing any previous one.
    ///
    /// Writes to a sibling temp file and renames, so the fixed path never
    /// holds a partial image.
    pub fn save(&self, step: CaptureStep, jpeg: &[u8]) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            op: "create",
            path: self.dir.display().to_string(),
            source,
        })?;

        let path = self.path(step);
        let tmp = path.with_extension("jpg.tmp");
        std::fs::write(&tmp, jpeg).map_err(|source| StoreError::Io {
            op: "write",
            path: tmp.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            op: "rename",
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!(%step, path = %path.display(), bytes = jpeg.len(), "photo saved");
        Ok(path)
    }

    /// Delete the photo for `step`. Returns false when there was nothing to
    /// delete.
    pub fn delete(&self, step: CaptureStep) -> Result<bool, StoreError> {
        let path = self.path(step);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(%step, path = %path.display(), "photo deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io {
                op: "delete",
                path: path.display().to_string(),
                source,
            }),
        }
    }
}
