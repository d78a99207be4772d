use deckstore_core::error::{CoreError, ErrorKind};

/// Name of the CHECK constraint that backs the ledger bounds.
const LEDGER_CONSTRAINT: &str = "ck_deck_entries_conservation";

/// Error type for every engine operation.
///
/// Wraps [`CoreError`] for domain failures and adds the storage and
/// runtime failures the engine itself can produce.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `deckstore_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The operation panicked; the worker survived.
    #[error("Operation panicked: {0}")]
    WorkerPanic(String),

    /// The worker pool is shut down and accepts no more work.
    #[error("Worker pool is closed")]
    PoolClosed,
}

/// Convenience type alias for engine return values.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(core) => core.kind(),
            EngineError::Database(err) => classify_sqlx_error(err),
            EngineError::Migration(_) | EngineError::WorkerPanic(_) | EngineError::PoolClosed => {
                ErrorKind::StorageFailure
            }
        }
    }
}

/// A ledger CHECK violation means the requested move was illegal, not that
/// the store failed.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorKind {
    match err.as_database_error().and_then(|db| db.constraint()) {
        Some(LEDGER_CONSTRAINT) => ErrorKind::Conflict,
        _ => ErrorKind::StorageFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_kinds_pass_through() {
        let err = EngineError::from(CoreError::PileEmpty("discard".into()));
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);

        let err = EngineError::from(CoreError::CardNotInPile {
            pile: "discard".into(),
            code: "AS".into(),
        });
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn runtime_failures_are_storage_failures() {
        assert_eq!(EngineError::PoolClosed.kind(), ErrorKind::StorageFailure);
        assert_eq!(
            EngineError::WorkerPanic("boom".into()).kind(),
            ErrorKind::StorageFailure
        );
        assert_eq!(
            EngineError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::StorageFailure
        );
    }

    #[test]
    fn core_errors_display_transparently() {
        let err = EngineError::from(CoreError::DeckNotFound("abc".into()));
        assert_eq!(err.to_string(), "Deck not found: abc");
    }
}
