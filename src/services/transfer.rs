//! Money transfer as a single transaction

use super::db::Store;
use super::error::TxError;
use super::queries::Queries;
use crate::models::{Account, TransferTxParams, TransferTxResult};

impl Store {
    /// Move `amount` between two accounts.
    ///
    /// Records the transfer, a debit entry on the source account and a credit
    /// entry on the destination, then updates both balances. Nothing is kept
    /// unless every step succeeds.
    pub async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult, TxError> {
        self.exec_tx(move |q| {
            Box::pin(async move {
                let transfer = q
                    .create_transfer(params.from_account_id, params.to_account_id, params.amount)
                    .await?;
                let from_entry = q.create_entry(params.from_account_id, -params.amount).await?;
                let to_entry = q.create_entry(params.to_account_id, params.amount).await?;

                // Lock rows in id order so opposite transfers cannot deadlock.
                let (from_account, to_account) = if params.from_account_id < params.to_account_id {
                    move_money(
                        q,
                        params.from_account_id,
                        -params.amount,
                        params.to_account_id,
                        params.amount,
                    )
                    .await?
                } else {
                    let (to, from) = move_money(
                        q,
                        params.to_account_id,
                        params.amount,
                        params.from_account_id,
                        -params.amount,
                    )
                    .await?;
                    (from, to)
                };

                Ok::<_, sqlx::Error>(TransferTxResult {
                    transfer,
                    from_account,
                    to_account,
                    from_entry,
                    to_entry,
                })
            })
        })
        .await
    }
}

async fn move_money(
    q: &mut Queries<'_>,
    first_id: i64,
    first_amount: i64,
    second_id: i64,
    second_amount: i64,
) -> Result<(Account, Account), sqlx::Error> {
    let first = q
        .add_account_balance(first_id, first_amount)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let second = q
        .add_account_balance(second_id, second_amount)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    Ok((first, second))
}
