use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clients::{ProductClient, PurchaseOrderClient, SalesOrderClient};
use crate::config::Config;
use crate::error::InventoryError;
use crate::store::{FailPoint, StoreActor, StoreClient};

/// The running inventory: one store actor and the clients wired to it.
///
/// Responsible for starting the store, handing each client the same store
/// handle, and shutting everything down.
pub struct InventorySystem {
    pub product_client: ProductClient,
    pub purchase_order_client: PurchaseOrderClient,
    pub sales_order_client: SalesOrderClient,
    store: StoreClient,
    store_handle: JoinHandle<()>,
}

impl InventorySystem {
    pub fn new(config: &Config) -> Self {
        let (actor, store) = StoreActor::new(config.store_buffer);
        Self::start(actor, store)
    }

    /// Starts a system whose store fails the given operation every time.
    pub fn with_fail_point(config: &Config, fail_point: FailPoint) -> Self {
        let (actor, store) = StoreActor::new(config.store_buffer);
        Self::start(actor.with_fail_point(fail_point), store)
    }

    fn start(actor: StoreActor, store: StoreClient) -> Self {
        let store_handle = tokio::spawn(actor.run());
        info!("Inventory system started");

        Self {
            product_client: ProductClient::new(store.clone()),
            purchase_order_client: PurchaseOrderClient::new(store.clone()),
            sales_order_client: SalesOrderClient::new(store.clone()),
            store,
            store_handle,
        }
    }

    pub async fn shutdown(self) -> Result<(), InventoryError> {
        info!("Shutting down system...");
        self.store.shutdown().await?;

        if let Err(e) = self.store_handle.await {
            error!(error = %e, "Store task failed");
            return Err(InventoryError::Internal(format!("store task failed: {e}")));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
