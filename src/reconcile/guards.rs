//! Cross-row constraints checked before a product is written or removed.

use crate::domain::{Product, SalesOrder};
use crate::error::InventoryError;
use crate::store::{RowId, Transaction};

/// No other live product may carry `name`. `current` is the product being
/// renamed, which may keep its own name.
pub fn ensure_unique_name(
    tx: &Transaction<'_>,
    name: &str,
    current: Option<RowId>,
) -> Result<(), InventoryError> {
    let duplicates =
        tx.count::<Product>(|product| product.name == name && Some(product.id) != current)?;
    if duplicates > 0 {
        return Err(InventoryError::conflict(format!(
            "a product named '{name}' already exists"
        )));
    }
    Ok(())
}

/// A product stays while sales orders refer to it. Purchase orders do not
/// block deletion.
pub fn ensure_no_sales_orders(
    tx: &Transaction<'_>,
    product_id: RowId,
) -> Result<(), InventoryError> {
    let sales_orders = tx.count::<SalesOrder>(|order| order.product_id == product_id)?;
    if sales_orders > 0 {
        return Err(InventoryError::conflict(format!(
            "cannot delete product {product_id}: {sales_orders} sales orders exist"
        )));
    }
    Ok(())
}
