//! Shape and business-rule checks for orders and products.
//!
//! Each check either returns the accepted value or the error to surface.

use rust_decimal::Decimal;

use crate::domain::{Product, ProductCreate, ProductPatch};
use crate::error::InventoryError;
use crate::reconcile::OrderKind;
use crate::store::RowId;

pub fn order_quantity(quantity: i64) -> Result<i64, InventoryError> {
    if quantity > 0 {
        Ok(quantity)
    } else {
        Err(InventoryError::validation(
            "order quantity must be greater than 0",
        ))
    }
}

pub fn required_product(product_id: Option<RowId>) -> Result<RowId, InventoryError> {
    product_id.ok_or_else(|| InventoryError::validation("productId is required"))
}

/// Checks a new order's product reference and quantity.
pub fn new_order(product_id: Option<RowId>, quantity: i64) -> Result<(RowId, i64), InventoryError> {
    Ok((required_product(product_id)?, order_quantity(quantity)?))
}

/// An order's product can only be restated, never changed.
pub fn ensure_same_product(
    kind: OrderKind,
    current: RowId,
    requested: Option<RowId>,
) -> Result<(), InventoryError> {
    match requested {
        Some(requested) if requested != current => Err(InventoryError::conflict(format!(
            "the ordered product cannot be changed from {current} to {requested}; cancel the {} and place a new one",
            kind.label()
        ))),
        _ => Ok(()),
    }
}

/// Stock left after applying `delta` to `product`, which must not go negative.
pub fn ensure_stock(product: &Product, delta: i64) -> Result<i64, InventoryError> {
    match product.quantity.checked_add(delta) {
        Some(quantity) if quantity >= 0 => Ok(quantity),
        Some(_) => Err(InventoryError::InsufficientStock {
            product_id: product.id,
            requested: delta.saturating_neg(),
            available: product.quantity,
        }),
        None => Err(InventoryError::validation("stock level is out of range")),
    }
}

pub fn product_name(name: &str) -> Result<String, InventoryError> {
    let name = name.trim();
    if name.is_empty() {
        Err(InventoryError::validation("product name is required"))
    } else {
        Ok(name.to_string())
    }
}

pub fn product_price(price: Decimal) -> Result<Decimal, InventoryError> {
    if price < Decimal::ZERO {
        Err(InventoryError::validation("product price cannot be negative"))
    } else {
        Ok(price)
    }
}

pub fn stock_level(quantity: i64) -> Result<i64, InventoryError> {
    if quantity < 0 {
        Err(InventoryError::validation("product quantity cannot be negative"))
    } else {
        Ok(quantity)
    }
}

/// Normalizes and checks a new product.
pub fn new_product(params: ProductCreate) -> Result<ProductCreate, InventoryError> {
    Ok(ProductCreate {
        name: product_name(&params.name)?,
        price: product_price(params.price)?,
        quantity: stock_level(params.quantity)?,
        description: params.description,
    })
}

/// Normalizes and checks the supplied fields of a product edit.
pub fn product_patch(patch: ProductPatch) -> Result<ProductPatch, InventoryError> {
    Ok(ProductPatch {
        name: patch.name.as_deref().map(product_name).transpose()?,
        price: patch.price.map(product_price).transpose()?,
        quantity: patch.quantity.map(stock_level).transpose()?,
        description: patch.description,
    })
}
