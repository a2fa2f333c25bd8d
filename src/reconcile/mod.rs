//! Stock reconciliation: the effect each order has on its product, the checks
//! guarding every mutation, and the transactional steps that apply them.

mod effect;
pub mod guards;
mod manager;
pub mod validation;

pub use effect::*;
pub use manager::*;
