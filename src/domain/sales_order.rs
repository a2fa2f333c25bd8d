use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Product;
use crate::error::InventoryError;
use crate::reconcile::{OrderKind, StockOrder};
use crate::store::RowId;

/// Stock-out: while it exists, `quantity` is removed from the product's stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub id: RowId,
    pub product_id: RowId,
    pub quantity: i64,
    /// `quantity` times the product price when the order was last written.
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
}

/// Payload for placing a sales order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SalesOrderCreate {
    pub product_id: Option<RowId>,
    pub quantity: i64,
}

/// Payload for amending a sales order. `None` leaves a field unchanged.
///
/// `product_id` may only repeat the order's current product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SalesOrderPatch {
    pub product_id: Option<RowId>,
    pub quantity: Option<i64>,
}

/// A sales order with its product attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderView {
    #[serde(flatten)]
    pub order: SalesOrder,
    pub product: Option<Product>,
}

impl SalesOrderCreate {
    pub fn new(product_id: RowId, quantity: i64) -> Self {
        Self {
            product_id: Some(product_id),
            quantity,
        }
    }
}

impl SalesOrderPatch {
    pub fn quantity(quantity: i64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }
}

impl SalesOrder {
    /// Recomputes `total_price` from the current quantity and `product`'s price.
    /// A total too large for a decimal is rejected and leaves the order as it was.
    pub fn reprice(&mut self, product: &Product) -> Result<(), InventoryError> {
        self.total_price = Decimal::from(self.quantity)
            .checked_mul(product.price)
            .ok_or_else(|| {
                InventoryError::validation(format!(
                    "total price of {} units at {} is out of range",
                    self.quantity, product.price
                ))
            })?;
        Ok(())
    }
}

impl StockOrder for SalesOrder {
    const KIND: OrderKind = OrderKind::Sales;
    type View = SalesOrderView;

    fn product_id(&self) -> RowId {
        self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
    }

    fn into_view(self, product: Option<Product>) -> SalesOrderView {
        SalesOrderView {
            order: self,
            product,
        }
    }
}
