//! # Mock Framework
//!
//! Utilities for testing clients without a running store actor.
//!
//! Use [`create_mock_store`] to get a store client and the receiver its
//! requests arrive on. Then use [`expect_transaction`] to run the next
//! transaction against tables the test owns, or [`expect_no_request`] to
//! assert that nothing reached the store.

use tokio::sync::mpsc;

use crate::store::{FailPoint, StoreClient, StoreRequest, Tables};

/// Creates a store client whose requests land on the returned receiver.
///
/// The test plays the store: it decides when each transaction runs and
/// against which tables, and can inspect the tables afterwards.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Runs the next request against `tables` if it is a transaction.
/// Returns `false` for anything else, including a closed channel.
pub async fn expect_transaction(
    receiver: &mut mpsc::Receiver<StoreRequest>,
    tables: &mut Tables,
) -> bool {
    expect_failing_transaction(receiver, tables, None).await
}

/// Like [`expect_transaction`], with `fail_point` armed for that transaction.
pub async fn expect_failing_transaction(
    receiver: &mut mpsc::Receiver<StoreRequest>,
    tables: &mut Tables,
    fail_point: Option<FailPoint>,
) -> bool {
    match receiver.recv().await {
        Some(StoreRequest::Transact { job }) => {
            job(tables, fail_point);
            true
        }
        _ => false,
    }
}

/// True when no request is waiting on the receiver.
pub fn expect_no_request(receiver: &mut mpsc::Receiver<StoreRequest>) -> bool {
    receiver.try_recv().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ProductClient;
    use crate::domain::ProductCreate;
    use crate::error::InventoryError;
    use crate::store::StoreOp;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_mock_store() {
        let (store, mut receiver) = create_mock_store(10);
        let client = ProductClient::new(store);

        let create_task = tokio::spawn(async move {
            client
                .add_product(ProductCreate::new("Widget", Decimal::ONE, 3))
                .await
        });

        let mut tables = Tables::default();
        assert!(expect_transaction(&mut receiver, &mut tables).await, "Expected a transaction");

        let product = create_task.await.unwrap().unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(tables.products.get(1), Some(&product));
    }

    #[tokio::test]
    async fn test_mock_store_with_fail_point() {
        let (store, mut receiver) = create_mock_store(10);
        let client = ProductClient::new(store);

        let create_task = tokio::spawn(async move {
            client
                .add_product(ProductCreate::new("Widget", Decimal::ONE, 3))
                .await
        });

        let mut tables = Tables::default();
        let point = FailPoint::on::<crate::domain::Product>(StoreOp::Insert);
        assert!(expect_failing_transaction(&mut receiver, &mut tables, Some(point)).await);

        assert!(matches!(create_task.await.unwrap(), Err(InventoryError::Internal(_))));
        assert!(tables.products.is_empty());
    }

    #[tokio::test]
    async fn closed_store_surfaces_as_internal() {
        let (store, receiver) = create_mock_store(1);
        drop(receiver);
        let client = ProductClient::new(store);

        assert!(matches!(client.get_product(1).await, Err(InventoryError::Internal(_))));
    }
}
