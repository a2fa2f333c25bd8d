use tracing::{debug, info, instrument};

use crate::clients::log_rejection;
use crate::domain::{Product, ProductCreate, ProductPatch};
use crate::error::InventoryError;
use crate::reconcile::{guards, load_product, validation};
use crate::store::{RowId, StoreClient};

/// Client for the product catalogue.
#[derive(Clone)]
pub struct ProductClient {
    store: StoreClient,
}

impl_store_client!(ProductClient);

impl ProductClient {
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, InventoryError> {
        debug!("Sending request");
        self.store
            .transaction(|tx| -> Result<_, InventoryError> {
                Ok(tx.find_where::<Product>(|_| true)?)
            })
            .await
            .inspect_err(log_rejection)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: RowId) -> Result<Product, InventoryError> {
        debug!("Sending request");
        self.store
            .transaction(move |tx| load_product(tx, id))
            .await
            .inspect_err(log_rejection)
    }

    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn add_product(&self, params: ProductCreate) -> Result<Product, InventoryError> {
        debug!("Sending request");
        let params = validation::new_product(params).inspect_err(log_rejection)?;

        let product = self
            .store
            .transaction(move |tx| -> Result<_, InventoryError> {
                guards::ensure_unique_name(tx, &params.name, None)?;
                Ok(tx.insert(|id| Product::from_create(id, params))?)
            })
            .await
            .inspect_err(log_rejection)?;

        info!(product_id = product.id, quantity = product.quantity, "Product added");
        Ok(product)
    }

    /// Edits the supplied fields of a product. A direct quantity edit sets the
    /// stock level outright.
    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: RowId,
        patch: ProductPatch,
    ) -> Result<Product, InventoryError> {
        debug!("Sending request");
        let patch = validation::product_patch(patch).inspect_err(log_rejection)?;

        let product = self
            .store
            .transaction(move |tx| -> Result<_, InventoryError> {
                let mut product = load_product(tx, id)?;
                if let Some(name) = &patch.name {
                    guards::ensure_unique_name(tx, name, Some(id))?;
                }
                product.apply_patch(patch);
                Ok(tx.save(product)?)
            })
            .await
            .inspect_err(log_rejection)?;

        info!(product_id = id, quantity = product.quantity, "Product updated");
        Ok(product)
    }

    /// Removes a product that no sales order references.
    ///
    /// Purchase orders for it are kept with their `product_id` unchanged (the
    /// reference is not cleared) and report no product from then on.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: RowId) -> Result<Product, InventoryError> {
        debug!("Sending request");
        let product = self
            .store
            .transaction(move |tx| -> Result<_, InventoryError> {
                let product = load_product(tx, id)?;
                guards::ensure_no_sales_orders(tx, id)?;
                tx.delete::<Product>(id)?;
                Ok(product)
            })
            .await
            .inspect_err(log_rejection)?;

        info!(product_id = id, "Product deleted");
        Ok(product)
    }
}
