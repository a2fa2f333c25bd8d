//! Handles through which callers read and mutate inventory.
//!
//! Every mutation runs in a single store transaction. Shape checks run before
//! the transaction is requested, so malformed input never reaches the store.

#[macro_use]
mod macros;

mod product_client;
mod purchase_order_client;
mod sales_order_client;

pub use product_client::ProductClient;
pub use purchase_order_client::PurchaseOrderClient;
pub use sales_order_client::SalesOrderClient;

use tracing::{error, warn};

use crate::error::InventoryError;

/// Logs an error on its way back to the caller. Storage faults are errors;
/// everything else is a rejected request.
pub(crate) fn log_rejection(e: &InventoryError) {
    match e {
        InventoryError::Internal(_) => error!(error = %e, "Request failed"),
        _ => warn!(error = %e, code = e.code(), "Request rejected"),
    }
}
