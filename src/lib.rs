//! Inventory stock reconciliation: products, purchase orders (stock-in) and
//! sales orders (stock-out), with every product's stock kept equal to the net
//! effect of its orders.

pub mod app_system;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod reconcile;
pub mod store;

#[cfg(test)]
mod mock_framework;
