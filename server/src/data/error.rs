//! Unified error type for data layer
//!
//! Wraps backend-specific errors so services and handlers only deal with
//! `DataError`.

use thiserror::Error;

/// Unified error type for data layer operations
#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// Migration failed
    #[error("Migration {version} ({name}) failed on {backend}: {error}")]
    MigrationFailed {
        backend: &'static str,
        version: i32,
        name: String,
        error: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Conflict error (duplicate entry, lost compare-and-swap)
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Convert from the backend SqliteError type
impl From<crate::data::sqlite::SqliteError> for DataError {
    fn from(e: crate::data::sqlite::SqliteError) -> Self {
        match e {
            crate::data::sqlite::SqliteError::Database(e) => Self::Sqlite(e),
            crate::data::sqlite::SqliteError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                backend: "sqlite",
                version,
                name,
                error,
            },
            crate::data::sqlite::SqliteError::Io(e) => Self::Io(e),
            crate::data::sqlite::SqliteError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::SqliteError;

    #[test]
    fn test_migration_failed_from_sqlite() {
        let err: DataError = SqliteError::MigrationFailed {
            version: 2,
            name: "add_sessions_index".to_string(),
            error: "syntax error".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Migration 2 (add_sessions_index) failed on sqlite: syntax error"
        );
    }

    #[test]
    fn test_conflict_from_sqlite() {
        let err: DataError = SqliteError::Conflict("taken".to_string()).into();
        assert!(matches!(err, DataError::Conflict(ref m) if m == "taken"));
    }
}
