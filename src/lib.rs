//! Storefront Client
//!
//! Client-side core of an online store backed by a json-server style REST API.
//!
//! ## Features
//! - Persistent shopping cart
//! - Catalog browsing with filters, sorting and pagination
//! - Three-step checkout with address and payment validation
//! - Order placement, history and cancellation

pub mod api;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod filter;
pub mod services;
pub mod storage;

use thiserror::Error;

pub use api::{ApiClient, ApiError};
pub use checkout::{Checkout, CheckoutError, CheckoutStep, PaymentForm};
pub use config::{ConfigError, StorefrontConfig};
pub use domain::*;
pub use filter::{FilterPanel, FilterSelection, RatingFilter};
pub use services::{CartStore, CatalogClient, OrderClient, OrderHistory, ProductListing, ProductQuery, SortOption};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid id: {0}")]
    InvalidId(#[from] ResourceIdError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
