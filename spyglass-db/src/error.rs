//! Error types for Spyglass persistence operations

use spyglass_core::TimestampMs;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result alias for persistence operations.
pub type DbResult<T> = Result<T, DbError>;

/// Persistence layer errors.
///
/// Storage faults are fatal for the enclosing operation and are never
/// retried here; callers decide whether to retry the whole operation.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to create connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("connection pool checkout failed: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("storage fault: {0}")]
    Sql(#[from] tokio_postgres::Error),

    #[error(
        "recovery close point {close_point} is not in the past (now {now}); \
         closing would corrupt presence data"
    )]
    ClockSkew {
        close_point: TimestampMs,
        now: TimestampMs,
    },

    #[error("{table} row missing after unique-violation fallback")]
    Inconsistent { table: &'static str },
}

/// Outcome of an insert that races against concurrent first-insertion.
///
/// Distinguishes the expected unique-violation from every other storage
/// fault so the fallback read is type-checked rather than inferred from
/// a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// This caller won the insert.
    Inserted(T),
    /// Another caller inserted the same key first; re-read their row.
    AlreadyExists,
}

/// Classify an insert result: unique-violations become
/// [`InsertOutcome::AlreadyExists`], everything else stays an error.
pub(crate) fn classify_insert<T>(
    result: Result<T, tokio_postgres::Error>,
) -> DbResult<InsertOutcome<T>> {
    match result {
        Ok(value) => Ok(InsertOutcome::Inserted(value)),
        Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => Ok(InsertOutcome::AlreadyExists),
        Err(e) => Err(DbError::Sql(e)),
    }
}
