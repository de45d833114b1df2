//! facegate-store — Local persistence for captures.
//!
//! Photos live at fixed paths under the data directory, one per capture
//! step. Capture metadata is a single JSON record in a SQLite key-value
//! table.

pub mod photos;
pub mod records;

pub use photos::PhotoStore;
pub use records::{RecordStore, CAPTURE_RECORD_KEY};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt capture record: {0}")]
    Json(#[from] serde_json::Error),
}
