//! Errors surfaced by transactional execution

use std::time::Duration;

/// Why a unit of work did not succeed
#[derive(Debug, thiserror::Error)]
pub enum WorkFailure<E> {
    /// The unit of work returned an error
    #[error(transparent)]
    Failed(E),
    /// The unit of work was still running when the deadline passed
    #[error("transaction deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Outcome of a failed [`Store::exec_tx`](crate::Store::exec_tx) call
#[derive(Debug, thiserror::Error)]
pub enum TxError<E = sqlx::Error> {
    /// No transaction was opened; nothing to clean up
    #[error("begin transaction: {0}")]
    Begin(#[source] sqlx::Error),

    /// The unit of work failed and its transaction was rolled back
    #[error(transparent)]
    Work(WorkFailure<E>),

    /// The unit of work failed and the rollback failed too.
    ///
    /// The transaction's final state is unknown to the caller.
    #[error("transaction error: {work}, rollback error: {rollback}")]
    Rollback {
        #[source]
        work: WorkFailure<E>,
        rollback: sqlx::Error,
    },

    /// The unit of work succeeded but the commit was rejected
    #[error("commit transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

impl<E> TxError<E> {
    /// The unit of work's own error, whether or not rollback succeeded
    pub fn work_error(&self) -> Option<&E> {
        match self {
            TxError::Work(WorkFailure::Failed(err))
            | TxError::Rollback {
                work: WorkFailure::Failed(err),
                ..
            } => Some(err),
            _ => None,
        }
    }

    pub fn rollback_error(&self) -> Option<&sqlx::Error> {
        match self {
            TxError::Rollback { rollback, .. } => Some(rollback),
            _ => None,
        }
    }

    /// True when the unit of work ran out of time
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(
            self,
            TxError::Work(WorkFailure::DeadlineExceeded(_))
                | TxError::Rollback {
                    work: WorkFailure::DeadlineExceeded(_),
                    ..
                }
        )
    }

    /// Unwrap the unit of work's error when the rollback went through
    pub fn into_work_error(self) -> Result<E, Self> {
        match self {
            TxError::Work(WorkFailure::Failed(err)) => Ok(err),
            other => Err(other),
        }
    }
}
