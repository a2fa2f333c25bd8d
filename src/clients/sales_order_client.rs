use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::clients::log_rejection;
use crate::domain::{SalesOrder, SalesOrderCreate, SalesOrderPatch, SalesOrderView};
use crate::error::InventoryError;
use crate::reconcile::{self, validation};
use crate::store::{RowId, StoreClient};

/// Client for sales orders (stock-out).
#[derive(Clone)]
pub struct SalesOrderClient {
    store: StoreClient,
}

impl_store_client!(SalesOrderClient);
impl_order_reads!(SalesOrderClient, SalesOrder, sales_order);

impl SalesOrderClient {
    /// Places a sales order, priced from the product, and removes its
    /// quantity from stock.
    #[instrument(
        skip(self, params),
        fields(product_id = ?params.product_id, quantity = params.quantity)
    )]
    pub async fn create_sales_order(
        &self,
        params: SalesOrderCreate,
    ) -> Result<SalesOrderView, InventoryError> {
        debug!("Sending request");
        let (product_id, quantity) =
            validation::new_order(params.product_id, params.quantity).inspect_err(log_rejection)?;

        let created = self
            .store
            .transaction(move |tx| {
                reconcile::create_order(tx, product_id, quantity, |id, product| {
                    let mut order = SalesOrder {
                        id,
                        product_id: product.id,
                        quantity,
                        total_price: Decimal::ZERO,
                        order_date: Utc::now(),
                    };
                    order.reprice(product)?;
                    Ok(order)
                })
            })
            .await
            .inspect_err(log_rejection)?;

        info!(
            order_id = created.order.id,
            total_price = %created.order.total_price,
            "Sales order created"
        );
        Ok(created.into_view())
    }

    /// Amends a sales order. The total price is recomputed from the current
    /// product price and the order date is refreshed.
    #[instrument(skip(self, patch))]
    pub async fn update_sales_order(
        &self,
        id: RowId,
        patch: SalesOrderPatch,
    ) -> Result<SalesOrderView, InventoryError> {
        debug!("Sending request");
        let quantity = patch
            .quantity
            .map(validation::order_quantity)
            .transpose()
            .inspect_err(log_rejection)?;
        let product_id = patch.product_id;

        let updated = self
            .store
            .transaction(move |tx| {
                reconcile::update_order::<SalesOrder>(
                    tx,
                    id,
                    product_id,
                    quantity,
                    |order, product| {
                        order.reprice(product)?;
                        order.order_date = Utc::now();
                        Ok(())
                    },
                )
            })
            .await
            .inspect_err(log_rejection)?;

        info!(order_id = id, quantity = updated.order.quantity, "Sales order updated");
        Ok(updated.into_view())
    }

    /// Cancels a sales order and returns its quantity to stock.
    #[instrument(skip(self))]
    pub async fn delete_sales_order(&self, id: RowId) -> Result<SalesOrderView, InventoryError> {
        debug!("Sending request");
        let deleted = self
            .store
            .transaction(move |tx| reconcile::delete_order::<SalesOrder>(tx, id))
            .await
            .inspect_err(log_rejection)?;

        info!(order_id = id, "Sales order deleted");
        Ok(deleted.into_view())
    }
}
