//! Transfers domain - DB queries for transfer records
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for transactions).

use sqlx::{Executor, Postgres};

use crate::models::Transfer;

/// Insert a transfer record. Balances are not touched here.
pub async fn create_transfer<'e, E>(
    executor: E,
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
) -> Result<Transfer, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO transfers (from_account_id, to_account_id, amount)
        VALUES ($1, $2, $3)
        RETURNING id, from_account_id, to_account_id, amount, created_at
        "#,
    )
    .bind(from_account_id)
    .bind(to_account_id)
    .bind(amount)
    .fetch_one(executor)
    .await
}

pub async fn get_transfer<'e, E>(executor: E, id: i64) -> Result<Option<Transfer>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT id, from_account_id, to_account_id, amount, created_at FROM transfers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// List transfers leaving `from_account_id` or arriving at `to_account_id`
pub async fn list_transfers<'e, E>(
    executor: E,
    from_account_id: i64,
    to_account_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transfer>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT id, from_account_id, to_account_id, amount, created_at FROM transfers
        WHERE from_account_id = $1 OR to_account_id = $2
        ORDER BY id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(from_account_id)
    .bind(to_account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}
