//! Database transaction utilities
//!
//! [`Store`] owns the pool and drives transactions around a caller supplied
//! unit of work. The unit of work receives a [`Queries`] bound to the open
//! transaction, so every statement it issues takes part in it:
//!
//! ```ignore
//! let account = store
//!     .exec_tx(|q| {
//!         Box::pin(async move {
//!             let account = q.create_account("alice", 0, "EUR").await?;
//!             q.create_entry(account.id, 100).await?;
//!             q.add_account_balance(account.id, 100).await
//!         })
//!     })
//!     .await?;
//! ```
//!
//! An `Err` from the unit of work rolls the transaction back, an `Ok` commits
//! it. If the unit of work panics or the whole call is dropped, the transaction
//! is dropped with it and sqlx rolls it back when the connection returns to
//! the pool.

use std::future::Future;
use std::io;
use std::time::Duration;

use futures::future::BoxFuture;
use log::debug;
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use tokio::time::{Instant, timeout, timeout_at};

use super::error::{TxError, WorkFailure};
use super::options::TxOptions;
use super::queries::Queries;
use crate::constants::{ROLLBACK_TIMEOUT, STATEMENT_TIMEOUT_MARGIN, TX_LOG_TARGET};

/// Runs queries on their own or grouped into transactions.
///
/// Cloning is cheap and clones share the pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
    options: TxOptions,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self::with_options(pool, TxOptions::default())
    }

    /// Store whose `exec_tx` calls use `options` unless told otherwise
    pub fn with_options(pool: PgPool, options: TxOptions) -> Self {
        Store { pool, options }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Options `exec_tx` applies to every transaction
    pub fn options(&self) -> TxOptions {
        self.options
    }

    /// Queries bound to the pool, each one running outside any transaction
    pub fn queries(&self) -> Queries<'static> {
        Queries::new(self.pool.clone())
    }

    /// Run `work` in a transaction with the store's default options
    pub async fn exec_tx<T, E, F>(&self, work: F) -> Result<T, TxError<E>>
    where
        F: for<'q> FnOnce(&'q mut Queries<'_>) -> BoxFuture<'q, Result<T, E>>,
    {
        self.exec_tx_with(self.options, work).await
    }

    /// Run `work` in a transaction, committing if it returns `Ok` and rolling
    /// back otherwise.
    ///
    /// `work` is only invoked once the transaction has begun. A rollback
    /// failure is reported together with the error that caused the rollback.
    pub async fn exec_tx_with<T, E, F>(&self, options: TxOptions, work: F) -> Result<T, TxError<E>>
    where
        F: for<'q> FnOnce(&'q mut Queries<'_>) -> BoxFuture<'q, Result<T, E>>,
    {
        // A deadline too far out to represent is no deadline at all.
        let deadline = options
            .deadline
            .and_then(|limit| Some((limit, Instant::now().checked_add(limit)?)));
        let deadline_at = deadline.map(|(_, at)| at);

        let mut tx = within(deadline_at, self.pool.begin())
            .await
            .map_err(TxError::Begin)?;

        if let Some(sql) = options.set_transaction_sql() {
            // Dropping `tx` on this path rolls it back.
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(TxError::Begin)?;
        }
        if let Some(at) = deadline_at {
            // The server cancels a statement still running at the deadline, so
            // the rollback below does not queue behind it.
            let remaining = at.saturating_duration_since(Instant::now());
            sqlx::query(&statement_timeout_sql(remaining))
                .execute(&mut *tx)
                .await
                .map_err(TxError::Begin)?;
        }
        debug!(target: TX_LOG_TARGET, "transaction begun");

        let outcome = {
            let mut queries = Queries::bind(&mut *tx);
            match deadline {
                Some((limit, at)) => match timeout_at(at, work(&mut queries)).await {
                    Ok(result) => result.map_err(WorkFailure::Failed),
                    Err(_) => Err(WorkFailure::DeadlineExceeded(limit)),
                },
                None => work(&mut queries).await.map_err(WorkFailure::Failed),
            }
        };

        match outcome {
            Ok(value) => {
                within(deadline_at, tx.commit()).await.map_err(TxError::Commit)?;
                debug!(target: TX_LOG_TARGET, "transaction committed");
                Ok(value)
            }
            Err(failure) => {
                let abandoned = matches!(failure, WorkFailure::DeadlineExceeded(_));
                match rollback(tx, abandoned).await {
                    Ok(()) => {
                        debug!(target: TX_LOG_TARGET, "transaction rolled back");
                        Err(TxError::Work(failure))
                    }
                    Err(rollback) => {
                        debug!(target: TX_LOG_TARGET, "transaction rollback failed");
                        Err(TxError::Rollback {
                            work: failure,
                            rollback,
                        })
                    }
                }
            }
        }
    }
}

/// Roll `tx` back within `ROLLBACK_TIMEOUT`.
///
/// `abandoned` is set when the unit of work was dropped mid-statement; the
/// replies to that statement are drained first.
async fn rollback(
    mut tx: Transaction<'static, Postgres>,
    abandoned: bool,
) -> Result<(), sqlx::Error> {
    let finish = async move {
        if abandoned {
            settle(&mut tx).await;
        }
        tx.rollback().await
    };
    match timeout(ROLLBACK_TIMEOUT, finish).await {
        Ok(result) => result,
        Err(_) => Err(timed_out("rollback timed out")),
    }
}

/// Read past the outcome of a statement whose future was dropped.
///
/// sqlx returns a server error still on the wire to whoever reads next, which
/// would otherwise come back from the rollback.
async fn settle(conn: &mut PgConnection) {
    for _ in 0..2 {
        match conn.ping().await {
            Err(sqlx::Error::Database(err)) => {
                debug!(target: TX_LOG_TARGET, "discarded abandoned statement error: {err}");
            }
            _ => return,
        }
    }
}

/// Await `fut`, failing with a timeout error once `deadline` has passed
async fn within<T, F>(deadline: Option<Instant>, fut: F) -> Result<T, sqlx::Error>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match deadline {
        Some(at) => timeout_at(at, fut)
            .await
            .unwrap_or_else(|_| Err(timed_out("transaction deadline exceeded"))),
        None => fut.await,
    }
}

/// `SET LOCAL statement_timeout` for the time left before the deadline.
///
/// The server limit runs out `STATEMENT_TIMEOUT_MARGIN` ahead of the client
/// one, so a cancelled statement has usually answered before the deadline.
/// Zero would disable the timeout and the server caps it at `i32::MAX`
/// milliseconds.
fn statement_timeout_sql(remaining: Duration) -> String {
    let millis = remaining
        .saturating_sub(STATEMENT_TIMEOUT_MARGIN)
        .as_millis()
        .clamp(1, i32::MAX as u128);
    format!("SET LOCAL statement_timeout = {millis}")
}

fn timed_out(msg: &'static str) -> sqlx::Error {
    sqlx::Error::Io(io::Error::new(io::ErrorKind::TimedOut, msg))
}
