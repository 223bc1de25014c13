//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataError {
    /// Map unique-index violations to [`MetadataError::Constraint`], keeping
    /// every other database error as is.
    pub fn from_insert(err: sqlx::Error, table: &str) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Constraint(format!("duplicate row in {table}: {}", db_err.message()))
            }
            other => Self::Database(other),
        }
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
