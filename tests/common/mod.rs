#![allow(dead_code)]

use bank_store::{Account, DbConfig, Store};

const SCHEMA: &str = include_str!("schema.sql");
const SCHEMA_LOCK: i64 = 0x6261_6e6b;

/// Store on `DATABASE_URL` with the ledger schema in place
pub async fn store() -> Store {
    let pool = DbConfig::from_env()
        .connect()
        .await
        .expect("connect to DATABASE_URL");

    // Test binaries run in parallel; serialize the CREATE IF NOT EXISTS.
    let mut conn = pool.acquire().await.expect("acquire connection");
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(SCHEMA_LOCK)
        .execute(&mut *conn)
        .await
        .expect("take schema lock");
    sqlx::raw_sql(SCHEMA)
        .execute(&mut *conn)
        .await
        .expect("apply schema");
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(SCHEMA_LOCK)
        .execute(&mut *conn)
        .await
        .expect("release schema lock");
    drop(conn);

    Store::new(pool)
}

pub fn unique_owner(prefix: &str) -> String {
    format!("{}-{:016x}", prefix, rand::random::<u64>())
}

pub async fn account(store: &Store, balance: i64) -> Account {
    store
        .queries()
        .create_account(&unique_owner("acct"), balance, "EUR")
        .await
        .expect("create account")
}

pub async fn balance(store: &Store, id: i64) -> i64 {
    store
        .queries()
        .get_account(id)
        .await
        .expect("read account")
        .expect("account exists")
        .balance
}
