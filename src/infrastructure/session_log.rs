use crate::domain::models::SessionRecord;
use crate::infrastructure::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known name of the persisted session log, matching the storage key
/// the web client used for its history.
pub const SESSION_LOG_FILE: &str = "studySessionsData.json";

/// Append-only log of session records. Records are immutable once written;
/// completion is always a new record, never an update.
pub trait SessionLogStore: Send + Sync {
    fn append(&self, record: &SessionRecord) -> Result<(), AppError>;
    fn load_all(&self) -> Result<Vec<SessionRecord>, AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

/// File-backed log: one JSON array in a single well-known file. A corrupt
/// or unreadable file degrades to an empty history instead of failing.
#[derive(Debug)]
pub struct JsonFileSessionLog {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileSessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Vec<SessionRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(error) => {
                tracing::warn!("failed reading session log, treating as empty: {error}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<SessionRecord>>(&raw) {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!("session log is not valid JSON, treating as empty: {error}");
                Vec::new()
            }
        }
    }

    fn write_records(&self, records: &[SessionRecord]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let formatted = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, format!("{formatted}\n"))?;
        Ok(())
    }
}

impl SessionLogStore for JsonFileSessionLog {
    fn append(&self, record: &SessionRecord) -> Result<(), AppError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|error| AppError::Internal(format!("session log lock poisoned: {error}")))?;
        let mut records = self.read_records();
        records.push(record.clone());
        self.write_records(&records)
    }

    fn load_all(&self) -> Result<Vec<SessionRecord>, AppError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|error| AppError::Internal(format!("session log lock poisoned: {error}")))?;
        Ok(self.read_records())
    }

    fn clear(&self) -> Result<(), AppError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|error| AppError::Internal(format!("session log lock poisoned: {error}")))?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Io(error)),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionLog {
    records: Mutex<Vec<SessionRecord>>,
}

impl SessionLogStore for InMemorySessionLog {
    fn append(&self, record: &SessionRecord) -> Result<(), AppError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|error| AppError::Internal(format!("in-memory lock poisoned: {error}")))?;
        guard.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SessionRecord>, AppError> {
        let guard = self
            .records
            .lock()
            .map_err(|error| AppError::Internal(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }

    fn clear(&self) -> Result<(), AppError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|error| AppError::Internal(format!("in-memory lock poisoned: {error}")))?;
        guard.clear();
        Ok(())
    }
}
