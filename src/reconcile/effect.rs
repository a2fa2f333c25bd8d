use crate::domain::Product;
use crate::error::InventoryError;
use crate::store::{Entity, RowId};

/// Which way an order moves stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// Stock-in.
    Purchase,
    /// Stock-out.
    Sales,
}

impl OrderKind {
    pub const fn sign(self) -> i64 {
        match self {
            OrderKind::Purchase => 1,
            OrderKind::Sales => -1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            OrderKind::Purchase => "purchase order",
            OrderKind::Sales => "sales order",
        }
    }
}

/// An order row whose existence moves its product's stock.
///
/// Orders never record whether their effect was applied; every mutation is
/// reconciled against the order's previously persisted quantity.
pub trait StockOrder: Entity {
    const KIND: OrderKind;
    type View: Send + 'static;

    fn product_id(&self) -> RowId;
    fn quantity(&self) -> i64;
    fn set_quantity(&mut self, quantity: i64);
    fn into_view(self, product: Option<Product>) -> Self::View;
}

/// Signed change to product stock when an order goes from `previous` to `next`
/// units.
///
/// A new order has `previous = 0`; a deleted one has `next = 0`.
pub fn delta(kind: OrderKind, previous: i64, next: i64) -> Result<i64, InventoryError> {
    next.checked_sub(previous)
        .and_then(|change| change.checked_mul(kind.sign()))
        .ok_or_else(|| {
            InventoryError::validation(format!(
                "quantity change from {previous} to {next} is out of range"
            ))
        })
}
