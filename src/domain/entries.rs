//! Entries domain - DB queries for account entries
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for transactions).

use sqlx::{Executor, Postgres};

use crate::models::Entry;

/// Record a signed balance change for an account
pub async fn create_entry<'e, E>(
    executor: E,
    account_id: i64,
    amount: i64,
) -> Result<Entry, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO entries (account_id, amount)
        VALUES ($1, $2)
        RETURNING id, account_id, amount, created_at
        "#,
    )
    .bind(account_id)
    .bind(amount)
    .fetch_one(executor)
    .await
}

pub async fn get_entry<'e, E>(executor: E, id: i64) -> Result<Option<Entry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT id, account_id, amount, created_at FROM entries WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// List entries of one account, oldest first
pub async fn list_entries<'e, E>(
    executor: E,
    account_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Entry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT id, account_id, amount, created_at FROM entries
        WHERE account_id = $1
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}
