//! Transactional unit-of-work store for a Postgres ledger.
//!
//! [`Store`] wraps a [`sqlx::PgPool`]. [`Store::queries`] runs single
//! statements straight on the pool; [`Store::exec_tx`] groups several of them
//! into one transaction that is either committed as a whole or rolled back.

pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod services;

pub use config::DbConfig;
pub use models::{Account, Entry, Transfer, TransferTxParams, TransferTxResult};
pub use services::db::Store;
pub use services::error::{TxError, WorkFailure};
pub use services::options::{IsolationLevel, ParseIsolationLevelError, TxOptions};
pub use services::queries::{Queries, QueryExecutor};
