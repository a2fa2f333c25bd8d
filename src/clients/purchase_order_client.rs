use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::clients::log_rejection;
use crate::domain::{PurchaseOrder, PurchaseOrderCreate, PurchaseOrderPatch, PurchaseOrderView};
use crate::error::InventoryError;
use crate::reconcile::{self, validation};
use crate::store::{RowId, StoreClient};

/// Client for purchase orders (stock-in).
#[derive(Clone)]
pub struct PurchaseOrderClient {
    store: StoreClient,
}

impl_store_client!(PurchaseOrderClient);
impl_order_reads!(PurchaseOrderClient, PurchaseOrder, purchase_order);

impl PurchaseOrderClient {
    /// Places a purchase order and adds its quantity to the product's stock.
    #[instrument(
        skip(self, params),
        fields(product_id = ?params.product_id, quantity = params.quantity)
    )]
    pub async fn create_purchase_order(
        &self,
        params: PurchaseOrderCreate,
    ) -> Result<PurchaseOrderView, InventoryError> {
        debug!("Sending request");
        let (product_id, quantity) =
            validation::new_order(params.product_id, params.quantity).inspect_err(log_rejection)?;
        let supplier = params.supplier;

        let created = self
            .store
            .transaction(move |tx| {
                reconcile::create_order(tx, product_id, quantity, |id, product| {
                    Ok(PurchaseOrder {
                        id,
                        product_id: product.id,
                        quantity,
                        supplier,
                        order_date: Utc::now(),
                    })
                })
            })
            .await
            .inspect_err(log_rejection)?;

        info!(
            order_id = created.order.id,
            stock = created.product.as_ref().map(|product| product.quantity),
            "Purchase order created"
        );
        Ok(created.into_view())
    }

    /// Amends a purchase order, moving stock by the change in quantity only.
    /// The order date is refreshed.
    #[instrument(skip(self, patch))]
    pub async fn update_purchase_order(
        &self,
        id: RowId,
        patch: PurchaseOrderPatch,
    ) -> Result<PurchaseOrderView, InventoryError> {
        debug!("Sending request");
        let quantity = patch
            .quantity
            .map(validation::order_quantity)
            .transpose()
            .inspect_err(log_rejection)?;
        let PurchaseOrderPatch {
            product_id,
            supplier,
            ..
        } = patch;

        let updated = self
            .store
            .transaction(move |tx| {
                reconcile::update_order::<PurchaseOrder>(tx, id, product_id, quantity, |order, _| {
                    if let Some(supplier) = supplier {
                        order.supplier = supplier;
                    }
                    order.order_date = Utc::now();
                    Ok(())
                })
            })
            .await
            .inspect_err(log_rejection)?;

        info!(order_id = id, quantity = updated.order.quantity, "Purchase order updated");
        Ok(updated.into_view())
    }

    /// Cancels a purchase order and takes its quantity back out of stock.
    #[instrument(skip(self))]
    pub async fn delete_purchase_order(
        &self,
        id: RowId,
    ) -> Result<PurchaseOrderView, InventoryError> {
        debug!("Sending request");
        let deleted = self
            .store
            .transaction(move |tx| reconcile::delete_order::<PurchaseOrder>(tx, id))
            .await
            .inspect_err(log_rejection)?;

        info!(order_id = id, "Purchase order deleted");
        Ok(deleted.into_view())
    }
}
