//! Rows kept by the store and the payloads callers send to change them.

pub mod product;
pub mod purchase_order;
pub mod sales_order;

pub use product::*;
pub use purchase_order::*;
pub use sales_order::*;
