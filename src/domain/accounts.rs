//! Accounts domain - DB queries for accounts
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for transactions).

use sqlx::{Executor, Postgres};

use crate::models::Account;

/// Insert a new account
pub async fn create_account<'e, E>(
    executor: E,
    owner: &str,
    balance: i64,
    currency: &str,
) -> Result<Account, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO accounts (owner, balance, currency)
        VALUES ($1, $2, $3)
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(owner)
    .bind(balance)
    .bind(currency)
    .fetch_one(executor)
    .await
}

/// Get an account by ID
pub async fn get_account<'e, E>(executor: E, id: i64) -> Result<Option<Account>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT id, owner, balance, currency, created_at FROM accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Get an account by ID and lock its row until the surrounding transaction ends.
///
/// `FOR NO KEY UPDATE` leaves inserts referencing the account (entries,
/// transfers) unblocked.
pub async fn get_account_for_update<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<Account>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT id, owner, balance, currency, created_at FROM accounts
        WHERE id = $1
        FOR NO KEY UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// List accounts of one owner, oldest first
pub async fn list_accounts<'e, E>(
    executor: E,
    owner: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Account>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT id, owner, balance, currency, created_at FROM accounts
        WHERE owner = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// Overwrite an account balance
pub async fn update_account<'e, E>(
    executor: E,
    id: i64,
    balance: i64,
) -> Result<Option<Account>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE accounts SET balance = $2
        WHERE id = $1
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(id)
    .bind(balance)
    .fetch_optional(executor)
    .await
}

/// Add a signed amount to an account balance in a single statement
pub async fn add_account_balance<'e, E>(
    executor: E,
    id: i64,
    amount: i64,
) -> Result<Option<Account>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE accounts SET balance = balance + $2
        WHERE id = $1
        RETURNING id, owner, balance, currency, created_at
        "#,
    )
    .bind(id)
    .bind(amount)
    .fetch_optional(executor)
    .await
}

/// Delete an account, returning whether a row was removed
pub async fn delete_account<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
