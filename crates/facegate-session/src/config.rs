use facegate_core::{Coordinate, ValidityConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid validity config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Session configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root for photos and the record database.
    pub data_dir: PathBuf,
    /// Path to the SQLite database holding the capture record.
    pub db_path: PathBuf,
    /// Whether a device photo follows the subject photo.
    pub manual_device_check: bool,
    /// Delay between frames pulled from the frame source.
    pub frame_interval: Duration,
    /// JPEG quality for saved photos (1–100).
    pub jpeg_quality: u8,
    /// Coordinate reported by the location provider, if any.
    pub location: Option<Coordinate>,
    /// Guide region and orientation tolerances.
    pub validity: ValidityConfig,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with
    /// defaults. Only a present but unreadable validity file is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from any variable lookup.
    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| var(key).and_then(|v| v.trim().parse::<f64>().ok());

        let data_dir = var("FACEGATE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir(&var));

        let db_path = var("FACEGATE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("facegate.db"));

        let location = match (parse("FACEGATE_LAT"), parse("FACEGATE_LNG")) {
            (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
            _ => None,
        };

        let validity = match var("FACEGATE_VALIDITY_FILE") {
            Some(path) => load_validity(Path::new(&path))?,
            None => ValidityConfig::default(),
        };

        let frame_interval_ms = var("FACEGATE_FRAME_INTERVAL_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(66);
        let jpeg_quality = var("FACEGATE_JPEG_QUALITY")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(80)
            .clamp(1, 100) as u8;

        Ok(Self {
            data_dir,
            db_path,
            manual_device_check: var("FACEGATE_MANUAL_DEVICE_CHECK")
                .map(|v| v.trim() != "0")
                .unwrap_or(false),
            frame_interval: Duration::from_millis(frame_interval_ms),
            jpeg_quality,
            location,
            validity,
        })
    }

    /// Defaults rooted at `data_dir`, ignoring the environment.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            db_path: data_dir.join("facegate.db"),
            manual_device_check: false,
            frame_interval: Duration::from_millis(66),
            jpeg_quality: 80,
            location: None,
            validity: ValidityConfig::default(),
        }
    }
}

/// Parse a validity TOML file (`[region]` and `[tolerance]` tables, both
/// optional).
pub fn load_validity(path: &Path) -> Result<ValidityConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), ?config, "loaded validity config");
    Ok(config)
}

fn default_data_dir<F>(var: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facegate")
}
