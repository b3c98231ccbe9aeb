mod common;

use bank_store::{TransferTxParams, TxError};

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn transfer_moves_money_and_records_entries() {
    let store = common::store().await;
    let from = common::account(&store, 100).await;
    let to = common::account(&store, 100).await;

    let result = store
        .transfer_tx(TransferTxParams {
            from_account_id: from.id,
            to_account_id: to.id,
            amount: 10,
        })
        .await
        .expect("transfer commits");

    assert_eq!(result.transfer.from_account_id, from.id);
    assert_eq!(result.transfer.to_account_id, to.id);
    assert_eq!(result.transfer.amount, 10);
    assert_eq!(result.from_entry.account_id, from.id);
    assert_eq!(result.from_entry.amount, -10);
    assert_eq!(result.to_entry.account_id, to.id);
    assert_eq!(result.to_entry.amount, 10);
    assert_eq!(result.from_account.balance, 90);
    assert_eq!(result.to_account.balance, 110);

    let mut queries = store.queries();
    assert!(queries.get_transfer(result.transfer.id).await.unwrap().is_some());
    assert!(queries.get_entry(result.from_entry.id).await.unwrap().is_some());
    assert!(queries.get_entry(result.to_entry.id).await.unwrap().is_some());
    let listed = queries.list_transfers(from.id, from.id, 10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn concurrent_transfers_keep_balances_consistent() {
    let store = common::store().await;
    let from = common::account(&store, 1_000).await;
    let to = common::account(&store, 1_000).await;
    let n = 5;
    let amount = 10;

    let handles: Vec<_> = (0..n)
        .map(|_| {
            let store = store.clone();
            let params = TransferTxParams {
                from_account_id: from.id,
                to_account_id: to.id,
                amount,
            };
            tokio::spawn(async move { store.transfer_tx(params).await })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task joins").expect("transfer commits");
    }

    assert_eq!(common::balance(&store, from.id).await, 1_000 - n * amount);
    assert_eq!(common::balance(&store, to.id).await, 1_000 + n * amount);

    let mut queries = store.queries();
    assert_eq!(queries.list_entries(from.id, 100, 0).await.unwrap().len() as i64, n);
    assert_eq!(queries.list_entries(to.id, 100, 0).await.unwrap().len() as i64, n);
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn opposite_transfers_do_not_deadlock() {
    let store = common::store().await;
    let a = common::account(&store, 500).await;
    let b = common::account(&store, 500).await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = store.clone();
            let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            tokio::spawn(async move {
                store
                    .transfer_tx(TransferTxParams {
                        from_account_id: from,
                        to_account_id: to,
                        amount: 7,
                    })
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task joins").expect("transfer commits");
    }

    assert_eq!(common::balance(&store, a.id).await, 500);
    assert_eq!(common::balance(&store, b.id).await, 500);
}

#[tokio::test]
#[ignore = "requires Postgres at DATABASE_URL"]
async fn transfer_to_missing_account_changes_nothing() {
    let store = common::store().await;
    let from = common::account(&store, 100).await;

    let err = store
        .transfer_tx(TransferTxParams {
            from_account_id: from.id,
            to_account_id: i64::MAX,
            amount: 10,
        })
        .await
        .expect_err("foreign key rejects unknown account");

    assert!(matches!(err, TxError::Work(_)));
    assert!(matches!(err.work_error(), Some(sqlx::Error::Database(_))));

    let mut queries = store.queries();
    assert_eq!(common::balance(&store, from.id).await, 100);
    assert!(queries.list_entries(from.id, 10, 0).await.unwrap().is_empty());
    assert!(queries.list_transfers(from.id, from.id, 10, 0).await.unwrap().is_empty());
}
