use lanpack_db::OperationError;
use lanpack_model::ManifestError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The package manifest matches none of the four root shapes.
    #[error("Unknown manifest: {0}")]
    UnknownManifest(String),
    #[error("{kind} '{id}' not found")]
    RecordNotFound { kind: &'static str, id: Uuid },
    #[error("Database error: {0}")]
    Persistence(#[from] OperationError),
    #[error("Storage location unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Manifest error: {0}")]
    Manifest(ManifestError),
    #[error("Payload '{entry}' is corrupt: expected sha256 {expected}, got {actual}")]
    CorruptPayload {
        entry: String,
        expected: String,
        actual: String,
    },
    #[error("Payload missing: {0}")]
    MissingPayload(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("{operation} called out of order (current phase: {phase})")]
    OutOfOrder {
        operation: &'static str,
        phase: &'static str,
    },
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(OperationError::Sqlite(e))
    }
}

impl From<ManifestError> for SyncError {
    fn from(e: ManifestError) -> Self {
        match e {
            ManifestError::UnknownKind(detail) => Self::UnknownManifest(detail),
            other => Self::Manifest(other),
        }
    }
}
