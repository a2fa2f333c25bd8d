use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Product;
use crate::reconcile::{OrderKind, StockOrder};
use crate::store::RowId;

/// Stock-in: while it exists, `quantity` is added to the product's stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: RowId,
    pub product_id: RowId,
    pub quantity: i64,
    pub supplier: String,
    pub order_date: DateTime<Utc>,
}

/// Payload for placing a purchase order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PurchaseOrderCreate {
    pub product_id: Option<RowId>,
    pub quantity: i64,
    pub supplier: String,
}

/// Payload for amending a purchase order. `None` leaves a field unchanged.
///
/// `product_id` may only repeat the order's current product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PurchaseOrderPatch {
    pub product_id: Option<RowId>,
    pub quantity: Option<i64>,
    pub supplier: Option<String>,
}

/// A purchase order with its product attached.
///
/// `product` is `None` once the product has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderView {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub product: Option<Product>,
}

impl PurchaseOrderCreate {
    pub fn new(product_id: RowId, quantity: i64, supplier: impl Into<String>) -> Self {
        Self {
            product_id: Some(product_id),
            quantity,
            supplier: supplier.into(),
        }
    }
}

impl PurchaseOrderPatch {
    pub fn quantity(quantity: i64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }
}

impl StockOrder for PurchaseOrder {
    const KIND: OrderKind = OrderKind::Purchase;
    type View = PurchaseOrderView;

    fn product_id(&self) -> RowId {
        self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
    }

    fn into_view(self, product: Option<Product>) -> PurchaseOrderView {
        PurchaseOrderView {
            order: self,
            product,
        }
    }
}
