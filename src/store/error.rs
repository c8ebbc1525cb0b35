//! Store Errors
//!
//! Error types for account and bank persistence.

/// Errors that can occur in a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend could not serve the request (I/O failure, poisoned lock, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored row could not be turned back into a domain value
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Operation needs an identifier but the entity was never persisted
    #[error("{0} has not been persisted")]
    NotPersisted(&'static str),

    /// Update of an id with no stored row
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: i64 },
}

impl StoreError {
    /// Check if this error is retryable
    ///
    /// Connection trouble and transaction conflicts are; constraint
    /// violations and other statement errors fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(err)) => {
                err.code().map_or(false, |code| is_transient_sqlstate(&code))
            }
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            ),
            StoreError::Unavailable(_) => true,
            _ => false,
        }
    }
}

/// Serialization failure, deadlock, and the connection/resource classes
fn is_transient_sqlstate(code: &str) -> bool {
    matches!(code, "40001" | "40P01") || code.starts_with("08") || code.starts_with("53")
}

impl From<crate::domain::DomainError> for StoreError {
    fn from(err: crate::domain::DomainError) -> Self {
        StoreError::InvalidData(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
