//! Storefront domain model: value objects and the product, cart and order aggregates.
pub mod aggregates;
pub mod value_objects;

pub use aggregates::*;
pub use value_objects::{Money, ResourceId, ResourceIdError};
