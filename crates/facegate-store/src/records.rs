use crate::StoreError;
use facegate_core::CaptureRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Key under which the capture record is stored.
pub const CAPTURE_RECORD_KEY: &str = "CaptureInfo";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

/// SQLite-backed key-value store holding the capture record.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                op: "create",
                path: parent.display().to_string(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened record store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// The stored record, or `None` if nothing was ever captured.
    pub fn load(&self) -> Result<Option<CaptureRecord>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![CAPTURE_RECORD_KEY],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|v| serde_json::from_str(&v).map_err(StoreError::from))
            .transpose()
    }

    pub fn save(&self, record: &CaptureRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CAPTURE_RECORD_KEY, value],
        )?;
        Ok(())
    }

    /// Read-modify-write the record inside one transaction, starting from an
    /// empty record when none is stored or the stored one is unreadable.
    /// Returns the updated record.
    pub fn update<F>(&mut self, f: F) -> Result<CaptureRecord, StoreError>
    where
        F: FnOnce(&mut CaptureRecord),
    {
        let tx = self.conn.transaction()?;
        let current: Option<String> = tx
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![CAPTURE_RECORD_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let mut record = match current.as_deref().map(serde_json::from_str::<CaptureRecord>) {
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "discarding corrupt capture record");
                CaptureRecord::default()
            }
            None => CaptureRecord::default(),
        };
        f(&mut record);

        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CAPTURE_RECORD_KEY, serde_json::to_string(&record)?],
        )?;
        tx.commit()?;
        Ok(record)
    }

    /// Delete the stored record. Returns true if one existed.
    pub fn remove(&self) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "DELETE FROM settings WHERE key = ?1",
            params![CAPTURE_RECORD_KEY],
        )?;
        Ok(n > 0)
    }
}
