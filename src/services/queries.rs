//! Query provider bound to a single executor
//!
//! [`Queries`] bundles the domain queries behind one value. It is bound either
//! to the pool, where every call checks out its own connection and runs on its
//! own, or to the connection of an open transaction, where every call takes
//! part in that transaction. Binding is free: it only stores the executor.

use sqlx::postgres::PgQueryResult;
use sqlx::{Executor, PgConnection, PgPool, Postgres};

use crate::domain::{accounts, entries, transfers};
use crate::models::{Account, Entry, Transfer};

/// What a [`Queries`] instance issues its statements through
#[derive(Debug)]
pub enum QueryExecutor<'c> {
    Pool(PgPool),
    Transaction(&'c mut PgConnection),
}

impl From<PgPool> for QueryExecutor<'static> {
    fn from(pool: PgPool) -> Self {
        QueryExecutor::Pool(pool)
    }
}

impl<'c> From<&'c mut PgConnection> for QueryExecutor<'c> {
    fn from(conn: &'c mut PgConnection) -> Self {
        QueryExecutor::Transaction(conn)
    }
}

// Runs a domain query on whichever executor `$self` is bound to.
macro_rules! route {
    ($self:ident, $query:path $(, $arg:expr)*) => {
        match &mut $self.executor {
            QueryExecutor::Pool(pool) => $query(&*pool $(, $arg)*).await,
            QueryExecutor::Transaction(conn) => $query(&mut **conn $(, $arg)*).await,
        }
    };
}

#[derive(Debug)]
pub struct Queries<'c> {
    executor: QueryExecutor<'c>,
}

impl Queries<'static> {
    /// Bind to the pool; calls run outside any transaction
    pub fn new(pool: PgPool) -> Self {
        Self::bind(pool)
    }
}

impl<'c> Queries<'c> {
    pub fn bind(executor: impl Into<QueryExecutor<'c>>) -> Self {
        Queries {
            executor: executor.into(),
        }
    }

    /// True when bound to a transaction's connection
    pub fn in_transaction(&self) -> bool {
        matches!(self.executor, QueryExecutor::Transaction(_))
    }

    pub async fn create_account(
        &mut self,
        owner: &str,
        balance: i64,
        currency: &str,
    ) -> Result<Account, sqlx::Error> {
        route!(self, accounts::create_account, owner, balance, currency)
    }

    pub async fn get_account(&mut self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        route!(self, accounts::get_account, id)
    }

    /// Row-locking read; only meaningful inside a transaction
    pub async fn get_account_for_update(
        &mut self,
        id: i64,
    ) -> Result<Option<Account>, sqlx::Error> {
        route!(self, accounts::get_account_for_update, id)
    }

    pub async fn list_accounts(
        &mut self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, sqlx::Error> {
        route!(self, accounts::list_accounts, owner, limit, offset)
    }

    pub async fn update_account(
        &mut self,
        id: i64,
        balance: i64,
    ) -> Result<Option<Account>, sqlx::Error> {
        route!(self, accounts::update_account, id, balance)
    }

    pub async fn add_account_balance(
        &mut self,
        id: i64,
        amount: i64,
    ) -> Result<Option<Account>, sqlx::Error> {
        route!(self, accounts::add_account_balance, id, amount)
    }

    pub async fn delete_account(&mut self, id: i64) -> Result<bool, sqlx::Error> {
        route!(self, accounts::delete_account, id)
    }

    pub async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, sqlx::Error> {
        route!(self, entries::create_entry, account_id, amount)
    }

    pub async fn get_entry(&mut self, id: i64) -> Result<Option<Entry>, sqlx::Error> {
        route!(self, entries::get_entry, id)
    }

    pub async fn list_entries(
        &mut self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, sqlx::Error> {
        route!(self, entries::list_entries, account_id, limit, offset)
    }

    pub async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, sqlx::Error> {
        route!(self, transfers::create_transfer, from_account_id, to_account_id, amount)
    }

    pub async fn get_transfer(&mut self, id: i64) -> Result<Option<Transfer>, sqlx::Error> {
        route!(self, transfers::get_transfer, id)
    }

    pub async fn list_transfers(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, sqlx::Error> {
        route!(
            self,
            transfers::list_transfers,
            from_account_id,
            to_account_id,
            limit,
            offset
        )
    }

    /// Run a raw statement on the bound executor
    pub async fn execute(&mut self, sql: &str) -> Result<PgQueryResult, sqlx::Error> {
        route!(self, execute_raw, sql)
    }
}

async fn execute_raw<'e, E>(executor: E, sql: &str) -> Result<PgQueryResult, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(sql).execute(executor).await
}
