/// Generates `new(store)` for a client that holds a `store: StoreClient`.
macro_rules! impl_store_client {
    ($client_name:ident) => {
        impl $client_name {
            pub fn new(store: $crate::store::StoreClient) -> Self {
                Self { store }
            }
        }
    };
}

/// Generates `get_<name>` and `list_<name>s` for an order client. Both return
/// orders with their product attached.
macro_rules! impl_order_reads {
    ($client_name:ident, $order:ty, $order_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $order_name_snake>](
                    &self,
                    id: $crate::store::RowId,
                ) -> Result<
                    <$order as $crate::reconcile::StockOrder>::View,
                    $crate::error::InventoryError,
                > {
                    tracing::debug!("Sending request");
                    self.store
                        .transaction(move |tx| -> Result<_, $crate::error::InventoryError> {
                            let order = $crate::reconcile::load_order::<$order>(tx, id)?;
                            $crate::reconcile::attach_product(tx, order)
                        })
                        .await
                        .inspect_err($crate::clients::log_rejection)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<list_ $order_name_snake s>](
                    &self,
                ) -> Result<
                    Vec<<$order as $crate::reconcile::StockOrder>::View>,
                    $crate::error::InventoryError,
                > {
                    tracing::debug!("Sending request");
                    self.store
                        .transaction(|tx| -> Result<_, $crate::error::InventoryError> {
                            let tx = &*tx;
                            tx.find_where::<$order>(|_| true)?
                                .into_iter()
                                .map(|order| $crate::reconcile::attach_product(tx, order))
                                .collect()
                        })
                        .await
                        .inspect_err($crate::clients::log_rejection)
                }
            }
        }
    };
}
