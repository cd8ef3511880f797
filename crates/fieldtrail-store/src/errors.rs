//! Error helpers for fieldtrail-store
//!
//! Wraps fieldtrail-core ExError with store-specific constructors

use fieldtrail_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a corrupt-body error for a stored document
pub fn corrupt_document(collection: &str, id: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("sqlite_decode")
        .with_record_id(id.to_string())
        .with_message(format!(
            "Stored document in '{}' is not valid JSON: {}",
            collection, err
        ))
}

/// Create a missing-identity error for an insert
pub fn missing_identity(id_field: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("sqlite_insert")
        .with_message(format!("document has no string `{}`", id_field))
}

/// Create a lock poisoned error
pub fn poisoned(op: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_message("sqlite connection lock poisoned")
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
