//! Store-side constructors for `ExError`
//!
//! Everything the store returns is an `ExError`; these helpers keep the
//! kind, op and message shape uniform across the migration runner, the
//! connection layer and the CRUD statements.

use userbook_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// A migration step failed and was rolled back
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Migration)
        .with_op("migration")
        .with_message(format!("{} rolled back: {}", migration_id, reason))
}

/// A recorded migration no longer matches the SQL embedded in this build
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "{} was applied with checksum {} but this build embeds {}",
            migration_id, actual, expected
        ))
}

/// Classify a SQLite failure
///
/// Busy and locked databases are contention (`Concurrency`); everything
/// else is `Persistence`. The op is `sqlite` until the store retags it.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
            ExErrorKind::Concurrency
        }
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind).with_op("sqlite").with_message(err.to_string())
}

pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation)
        .with_message(err.to_string())
}

/// A thread panicked while holding the connection
pub fn lock_poisoned(operation: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(operation)
        .with_message("store lock poisoned by a panicked thread")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_kinds() {
        assert_eq!(
            migration_error("001", "boom").kind(),
            ExErrorKind::Migration
        );
        assert_eq!(
            checksum_mismatch("001", "aa", "bb").kind(),
            ExErrorKind::ConstraintViolation
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(io_error("open", io).op(), Some("open"));
    }

    #[test]
    fn test_sqlite_errors_are_classified() {
        let plain = from_rusqlite(rusqlite::Error::InvalidQuery);
        assert_eq!(plain.kind(), ExErrorKind::Persistence);
        assert_eq!(plain.op(), Some("sqlite"));

        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert_eq!(from_rusqlite(busy).kind(), ExErrorKind::Concurrency);
    }
}
