use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use inventory_hub::app_system::{setup_tracing, InventorySystem};
use inventory_hub::config::Config;
use inventory_hub::domain::{ProductCreate, PurchaseOrderCreate, SalesOrderCreate};
use inventory_hub::error::InventoryError;

#[tokio::main]
async fn main() -> Result<(), InventoryError> {
    let config = Config::from_env();
    setup_tracing(&config.log);

    info!(store_buffer = config.store_buffer, "Starting inventory system");

    let system = InventorySystem::new(&config);

    let product = system
        .product_client
        .add_product(ProductCreate::new("Widget", Decimal::new(1999, 2), 5))
        .await?;
    info!(product_id = product.id, quantity = product.quantity, "Product created");

    let span = tracing::info_span!("restock");
    let purchase = async {
        system
            .purchase_order_client
            .create_purchase_order(PurchaseOrderCreate::new(product.id, 10, "Acme Supply"))
            .await
    }
    .instrument(span)
    .await?;
    info!(
        order_id = purchase.order.id,
        stock = purchase.product.as_ref().map(|product| product.quantity),
        "Restocked"
    );

    let span = tracing::info_span!("sale");
    let sale = async {
        system
            .sales_order_client
            .create_sales_order(SalesOrderCreate::new(product.id, 12))
            .await
    }
    .instrument(span)
    .await?;
    info!(
        order_id = sale.order.id,
        total_price = %sale.order.total_price,
        "Sold"
    );

    // Only 3 units remain, so this one is refused.
    match system
        .sales_order_client
        .create_sales_order(SalesOrderCreate::new(product.id, 4))
        .await
    {
        Ok(order) => error!(order_id = order.order.id, "Oversell was accepted"),
        Err(e) => {
            let body = e.to_response();
            info!(
                status = body.status,
                code = body.code,
                message = %body.message,
                "Oversell refused"
            );
        }
    }

    let product = system.product_client.get_product(product.id).await?;
    info!(product_id = product.id, quantity = product.quantity, "Final stock");

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
