//! Transactional steps that keep a product's stock equal to the net effect of
//! its orders.
//!
//! Every function here runs inside a store transaction: it re-reads the rows it
//! needs, validates against that fresh state, writes the product and then the
//! order. Returning an error leaves the transaction to roll back, so product
//! and order writes land together or not at all.

use tracing::{debug, warn};

use crate::domain::Product;
use crate::error::InventoryError;
use crate::reconcile::{effect, validation, OrderKind, StockOrder};
use crate::store::{RowId, Transaction};

/// Order and product rows as written by a reconciled mutation.
#[derive(Debug, Clone)]
pub struct Reconciled<O> {
    pub order: O,
    pub product: Option<Product>,
}

impl<O: StockOrder> Reconciled<O> {
    pub fn into_view(self) -> O::View {
        self.order.into_view(self.product)
    }
}

pub fn load_product(tx: &Transaction<'_>, id: RowId) -> Result<Product, InventoryError> {
    tx.find::<Product>(id)?
        .ok_or(InventoryError::NotFound { entity: "product", id })
}

pub fn load_order<O: StockOrder>(tx: &Transaction<'_>, id: RowId) -> Result<O, InventoryError> {
    tx.find::<O>(id)?.ok_or(InventoryError::NotFound {
        entity: O::KIND.label(),
        id,
    })
}

/// Pairs an order with its product as currently stored.
pub fn attach_product<O: StockOrder>(
    tx: &Transaction<'_>,
    order: O,
) -> Result<O::View, InventoryError> {
    let product = tx.find::<Product>(order.product_id())?;
    Ok(order.into_view(product))
}

/// Moves `product`'s stock by the effect of an order going from `previous` to
/// `next` units and stages the product write.
pub fn apply_effect(
    tx: &mut Transaction<'_>,
    kind: OrderKind,
    mut product: Product,
    previous: i64,
    next: i64,
) -> Result<Product, InventoryError> {
    let delta = effect::delta(kind, previous, next)?;
    product.quantity = validation::ensure_stock(&product, delta)?;
    debug!(
        product_id = product.id,
        delta,
        quantity = product.quantity,
        "Applying stock effect"
    );
    Ok(tx.save(product)?)
}

/// Places a new order. `build` receives the assigned order id and the product
/// with the order's effect already applied. A `build` error aborts the
/// transaction like any other.
pub fn create_order<O: StockOrder>(
    tx: &mut Transaction<'_>,
    product_id: RowId,
    quantity: i64,
    build: impl FnOnce(RowId, &Product) -> Result<O, InventoryError>,
) -> Result<Reconciled<O>, InventoryError> {
    let quantity = validation::order_quantity(quantity)?;
    let product = load_product(tx, product_id)?;
    let product = apply_effect(tx, O::KIND, product, 0, quantity)?;
    let order = tx.try_insert(|id| build(id, &product))?;
    Ok(Reconciled {
        order,
        product: Some(product),
    })
}

/// Amends an order's quantity, reconciling only the difference from what was
/// persisted. `quantity = None` keeps the current quantity. `amend` updates
/// the order's remaining fields after the new quantity is set.
pub fn update_order<O: StockOrder>(
    tx: &mut Transaction<'_>,
    order_id: RowId,
    requested_product: Option<RowId>,
    quantity: Option<i64>,
    amend: impl FnOnce(&mut O, &Product) -> Result<(), InventoryError>,
) -> Result<Reconciled<O>, InventoryError> {
    let mut order = load_order::<O>(tx, order_id)?;
    validation::ensure_same_product(O::KIND, order.product_id(), requested_product)?;
    let next = match quantity {
        Some(quantity) => validation::order_quantity(quantity)?,
        None => order.quantity(),
    };

    let product = load_product(tx, order.product_id())?;
    let product = apply_effect(tx, O::KIND, product, order.quantity(), next)?;

    order.set_quantity(next);
    amend(&mut order, &product)?;
    let order = tx.save(order)?;
    Ok(Reconciled {
        order,
        product: Some(product),
    })
}

/// Removes an order and reverses its effect on stock.
///
/// An order whose product no longer exists is removed without a stock effect.
pub fn delete_order<O: StockOrder>(
    tx: &mut Transaction<'_>,
    order_id: RowId,
) -> Result<Reconciled<O>, InventoryError> {
    let order = load_order::<O>(tx, order_id)?;
    let product = match tx.find::<Product>(order.product_id())? {
        Some(product) => Some(apply_effect(tx, O::KIND, product, order.quantity(), 0)?),
        None => {
            warn!(
                order_id,
                product_id = order.product_id(),
                "Removing {} whose product no longer exists",
                O::KIND.label()
            );
            None
        }
    };
    tx.delete::<O>(order_id)?;
    Ok(Reconciled { order, product })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PurchaseOrder, SalesOrder};
    use crate::store::{FailPoint, StoreOp, Tables};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn seeded(quantity: i64) -> Tables {
        let mut tables = Tables::default();
        let mut tx = Transaction::begin(&mut tables, None);
        tx.insert(|id| Product {
            id,
            name: "Widget".to_string(),
            description: String::new(),
            price: Decimal::new(200, 2),
            quantity,
        })
        .unwrap();
        tx.commit().unwrap();
        tables
    }

    fn sale(
        tx: &mut Transaction<'_>,
        quantity: i64,
    ) -> Result<Reconciled<SalesOrder>, InventoryError> {
        create_order(tx, 1, quantity, |id, product| {
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
    }

    fn purchase(
        tx: &mut Transaction<'_>,
        quantity: i64,
    ) -> Result<Reconciled<PurchaseOrder>, InventoryError> {
        create_order(tx, 1, quantity, |id, product| {
            Ok(PurchaseOrder {
                id,
                product_id: product.id,
                quantity,
                supplier: "Acme".to_string(),
                order_date: Utc::now(),
            })
        })
    }

    fn commit<T>(
        tables: &mut Tables,
        work: impl FnOnce(&mut Transaction<'_>) -> Result<T, InventoryError>,
    ) -> Result<T, InventoryError> {
        commit_with(tables, None, work)
    }

    fn commit_with<T>(
        tables: &mut Tables,
        fail_point: Option<FailPoint>,
        work: impl FnOnce(&mut Transaction<'_>) -> Result<T, InventoryError>,
    ) -> Result<T, InventoryError> {
        let mut tx = Transaction::begin(tables, fail_point);
        match work(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    #[test]
    fn create_then_delete_purchase_restores_stock() {
        let mut tables = seeded(5);
        let created = commit(&mut tables, |tx| purchase(tx, 10)).unwrap();
        assert_eq!(tables.products.get(1).unwrap().quantity, 15);

        let id = created.order.id;
        commit(&mut tables, |tx| delete_order::<PurchaseOrder>(tx, id)).unwrap();
        assert_eq!(tables.products.get(1).unwrap().quantity, 5);
        assert!(tables.purchase_orders.is_empty());
    }

    #[test]
    fn sale_prices_order_from_product() {
        let mut tables = seeded(5);
        let created = commit(&mut tables, |tx| sale(tx, 3)).unwrap();
        assert_eq!(created.order.total_price, Decimal::new(600, 2));
        assert_eq!(created.product.unwrap().quantity, 2);
    }

    #[test]
    fn update_reconciles_against_persisted_quantity() {
        let mut tables = seeded(10);
        let created = commit(&mut tables, |tx| sale(tx, 4)).unwrap();
        assert_eq!(tables.products.get(1).unwrap().quantity, 6);

        let id = created.order.id;
        let updated = commit(&mut tables, |tx| {
            update_order::<SalesOrder>(tx, id, None, Some(10), |order, product| {
                order.reprice(product)
            })
        })
        .unwrap();
        assert_eq!(updated.order.quantity, 10);
        assert_eq!(updated.order.total_price, Decimal::new(2000, 2));
        assert_eq!(tables.products.get(1).unwrap().quantity, 0);

        let result = commit(&mut tables, |tx| {
            update_order::<SalesOrder>(tx, id, None, Some(11), |_, _| Ok(()))
        });
        assert!(matches!(result, Err(InventoryError::InsufficientStock { .. })));
        assert_eq!(tables.products.get(1).unwrap().quantity, 0);
        assert_eq!(tables.sales_orders.get(id).unwrap().quantity, 10);
    }

    #[test]
    fn update_without_quantity_keeps_stock() {
        let mut tables = seeded(10);
        let created = commit(&mut tables, |tx| purchase(tx, 4)).unwrap();
        let id = created.order.id;

        commit(&mut tables, |tx| {
            update_order::<PurchaseOrder>(tx, id, Some(1), None, |order, _| {
                order.supplier = "Globex".to_string();
                Ok(())
            })
        })
        .unwrap();
        assert_eq!(tables.products.get(1).unwrap().quantity, 14);
        assert_eq!(tables.purchase_orders.get(id).unwrap().supplier, "Globex");
    }

    #[test]
    fn repointing_an_order_is_a_conflict() {
        let mut tables = seeded(10);
        let created = commit(&mut tables, |tx| sale(tx, 1)).unwrap();
        let id = created.order.id;

        let result = commit(&mut tables, |tx| {
            update_order::<SalesOrder>(tx, id, Some(2), Some(1), |_, _| Ok(()))
        });
        assert!(matches!(result, Err(InventoryError::Conflict(_))));
    }

    #[test]
    fn reducing_a_consumed_purchase_cannot_drive_stock_negative() {
        let mut tables = seeded(0);
        let created = commit(&mut tables, |tx| purchase(tx, 10)).unwrap();
        commit(&mut tables, |tx| sale(tx, 8)).unwrap();
        assert_eq!(tables.products.get(1).unwrap().quantity, 2);

        let id = created.order.id;
        let result = commit(&mut tables, |tx| delete_order::<PurchaseOrder>(tx, id));
        assert_eq!(
            result.unwrap_err(),
            InventoryError::InsufficientStock {
                product_id: 1,
                requested: 10,
                available: 2
            }
        );
        assert_eq!(tables.purchase_orders.len(), 1);
    }

    #[test]
    fn missing_rows_are_not_found() {
        let mut tables = seeded(1);
        let result = commit(&mut tables, |tx| {
            create_order(tx, 99, 1, |id, _| {
                Ok(PurchaseOrder {
                    id,
                    product_id: 99,
                    quantity: 1,
                    supplier: String::new(),
                    order_date: Utc::now(),
                })
            })
        });
        assert_eq!(
            result.unwrap_err(),
            InventoryError::NotFound { entity: "product", id: 99 }
        );

        let result = commit(&mut tables, |tx| delete_order::<SalesOrder>(tx, 5));
        assert_eq!(
            result.unwrap_err(),
            InventoryError::NotFound { entity: "sales order", id: 5 }
        );
    }

    #[test]
    fn failed_order_write_discards_product_write() {
        let mut tables = seeded(5);
        let point = FailPoint::on::<SalesOrder>(StoreOp::Insert);
        let mut tx = Transaction::begin(&mut tables, Some(point));
        let result = sale(&mut tx, 2);
        assert!(matches!(result, Err(InventoryError::Internal(_))));
        tx.rollback();

        assert_eq!(tables.products.get(1).unwrap().quantity, 5);
        assert!(tables.sales_orders.is_empty());
    }

    #[test]
    fn orphaned_purchase_is_removed_without_effect() {
        let mut tables = seeded(5);
        let created = commit(&mut tables, |tx| purchase(tx, 3)).unwrap();
        commit(&mut tables, |tx| Ok(tx.delete::<Product>(1)?)).unwrap();

        let id = created.order.id;
        let removed = commit(&mut tables, |tx| delete_order::<PurchaseOrder>(tx, id)).unwrap();
        assert!(removed.product.is_none());
        assert!(tables.purchase_orders.is_empty());
    }

    #[test]
    fn failed_order_save_discards_product_write() {
        let mut tables = seeded(10);
        let id = commit(&mut tables, |tx| sale(tx, 4)).unwrap().order.id;

        let point = FailPoint::on::<SalesOrder>(StoreOp::Save);
        let result = commit_with(&mut tables, Some(point), |tx| {
            update_order::<SalesOrder>(tx, id, None, Some(6), |order, product| {
                order.reprice(product)
            })
        });
        assert!(matches!(result, Err(InventoryError::Internal(_))));
        assert_eq!(tables.products.get(1).unwrap().quantity, 6);
        assert_eq!(tables.sales_orders.get(id).unwrap().quantity, 4);
    }

    #[test]
    fn failed_order_delete_discards_product_write() {
        let mut tables = seeded(5);
        let id = commit(&mut tables, |tx| purchase(tx, 3)).unwrap().order.id;

        let point = FailPoint::on::<PurchaseOrder>(StoreOp::Delete);
        let result = commit_with(&mut tables, Some(point), |tx| {
            delete_order::<PurchaseOrder>(tx, id)
        });
        assert!(matches!(result, Err(InventoryError::Internal(_))));
        assert_eq!(tables.products.get(1).unwrap().quantity, 8);
        assert_eq!(tables.purchase_orders.get(id).unwrap().quantity, 3);
    }

    #[test]
    fn failed_amend_discards_product_write() {
        let mut tables = seeded(10);
        let id = commit(&mut tables, |tx| sale(tx, 2)).unwrap().order.id;

        let result = commit(&mut tables, |tx| {
            update_order::<SalesOrder>(tx, id, None, Some(5), |_, _| {
                Err(InventoryError::validation("total price is out of range"))
            })
        });
        assert!(matches!(result, Err(InventoryError::Validation(_))));
        assert_eq!(tables.products.get(1).unwrap().quantity, 8);
        assert_eq!(tables.sales_orders.get(id).unwrap().quantity, 2);
    }
}
