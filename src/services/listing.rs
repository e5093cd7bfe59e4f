//! Observable product listing backing the grid and pagination views.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::api::ApiError;
use crate::domain::{Product, ResourceId};
use crate::services::catalog::{CatalogClient, ProductPage, ProductQuery};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingState {
    pub products: Vec<Product>,
    pub total_pages: u32,
    pub total_items: u32,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Query behind the products currently shown.
    pub query: Option<ProductQuery>,
}

impl ListingState {
    pub fn pages(&self) -> RangeInclusive<u32> { 1..=self.total_pages }
    pub fn current_page(&self) -> u32 { self.query.as_ref().map_or(1, |q| q.page) }
}

/// Whether a finished request was applied to the listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer request was issued while this one was in flight.
    Stale,
}

/// Each request takes the next sequence number; a response is applied only
/// if its number is still the latest issued.
pub struct ProductListing {
    catalog: Arc<CatalogClient>,
    state: watch::Sender<ListingState>,
    issued: AtomicU64,
}

impl ProductListing {
    pub fn new(catalog: Arc<CatalogClient>) -> Self {
        let (state, _) = watch::channel(ListingState::default());
        Self { catalog, state, issued: AtomicU64::new(0) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingState> { self.state.subscribe() }
    pub fn snapshot(&self) -> ListingState { self.state.borrow().clone() }

    #[instrument(skip(self, query), fields(page = query.page))]
    pub async fn load(&self, query: ProductQuery) -> Result<LoadOutcome, ApiError> {
        let seq = self.begin();
        let result = self.catalog.products(&query).await;
        self.finish(seq, result.map(|page| (page, query)))
    }

    /// Reloads the current query at another page.
    pub async fn go_to_page(&self, page: u32) -> Result<LoadOutcome, ApiError> {
        let query = self.state.borrow().query.clone().unwrap_or_default();
        self.load(query.page(page)).await
    }

    /// Replaces the listing with the top-rated products related to `product`.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn load_related(&self, product: &Product) -> Result<LoadOutcome, ApiError> {
        self.load_related_in(&product.category, &product.id).await
    }

    pub async fn load_related_in(&self, category: &str, exclude: &ResourceId) -> Result<LoadOutcome, ApiError> {
        let seq = self.begin();
        let result = self.catalog.top_rated_in_category(category, exclude).await;
        let current = self.state.borrow().query.clone().unwrap_or_default();
        self.finish(seq, result.map(|products| {
            let items = products.len() as u32;
            (ProductPage { data: products, pages: 1, items }, current)
        }))
    }

    fn begin(&self) -> u64 {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
        seq
    }

    fn finish(&self, seq: u64, result: Result<(ProductPage, ProductQuery), ApiError>) -> Result<LoadOutcome, ApiError> {
        let message = result.as_ref().err().map(ToString::to_string);
        let applied = self.state.send_if_modified(|s| {
            if self.issued.load(Ordering::SeqCst) != seq {
                return false;
            }
            s.is_loading = false;
            match &result {
                Ok((page, query)) => {
                    s.products = page.data.clone();
                    s.total_pages = page.pages;
                    s.total_items = page.items;
                    s.query = Some(query.clone());
                }
                // Products from the last successful load stay visible.
                Err(_) => s.error = message.clone(),
            }
            true
        });

        if !applied {
            debug!(seq, "Discarding stale listing response");
            return Ok(LoadOutcome::Stale);
        }
        match result {
            Ok(_) => Ok(LoadOutcome::Applied),
            Err(e) => {
                warn!(error = %e, "Product listing failed");
                Err(e)
            }
        }
    }
}
