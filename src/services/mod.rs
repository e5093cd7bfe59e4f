//! Stateful clients and view-models layered over the backend.
pub mod cart_store;
pub mod catalog;
pub mod listing;
pub mod order_history;
pub mod orders;

pub use cart_store::{CartStore, CART_KEY};
pub use catalog::{CatalogClient, ProductPage, ProductQuery, SortOption, DEFAULT_PAGE_SIZE};
pub use listing::{ListingState, LoadOutcome, ProductListing};
pub use order_history::{HistoryState, OrderHistory, StatusFilter};
pub use orders::OrderClient;
