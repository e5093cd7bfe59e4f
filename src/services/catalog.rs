//! Catalog access: categories, product listings and product detail.
//!
//! Categories are fetched once per client and product detail is cached by id
//! until [`CatalogClient::clear_product_cache`]; concurrent callers asking for
//! the same entry share one request. Listings are never cached.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::api::{ApiClient, ApiError, QueryParams};
use crate::domain::{Category, Money, Product, ResourceId};

pub const DEFAULT_PAGE_SIZE: u32 = 6;
const RELATED_FETCH_LIMIT: usize = 5;
const RELATED_SHOWN: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    #[default]
    PriceLowToHigh,
    PriceHighToLow,
    Popularity,
}

impl SortOption {
    fn params(&self) -> QueryParams {
        match self {
            Self::PriceLowToHigh => vec![("_sort", "price".into())],
            Self::PriceHighToLow => vec![("_sort", "-price".into())],
            Self::Popularity => vec![("_sort", "rating".into()), ("_order", "desc".into())],
        }
    }
}

impl FromStr for SortOption {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priceLowToHigh" | "price-asc" => Ok(Self::PriceLowToHigh),
            "priceHighToLow" | "price-desc" => Ok(Self::PriceHighToLow),
            "popularity" => Ok(Self::Popularity),
            other => Err(format!("unknown sort option '{other}'")),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::PriceLowToHigh => "priceLowToHigh", Self::PriceHighToLow => "priceHighToLow", Self::Popularity => "popularity" })
    }
}

/// Filter, sort and page selection for a product listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub per_page: u32,
    /// Category names; a product matches any of them.
    pub categories: Vec<String>,
    pub min_price: Money,
    /// `None` leaves the upper bound open.
    pub max_price: Option<Money>,
    pub min_rating: u8,
    pub sort: SortOption,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self { page: 1, per_page: DEFAULT_PAGE_SIZE, categories: vec![], min_price: Money::ZERO, max_price: None, min_rating: 0, sort: SortOption::default() }
    }
}

impl ProductQuery {
    pub fn page(mut self, page: u32) -> Self { self.page = page.max(1); self }

    pub fn to_params(&self) -> QueryParams {
        let mut params: QueryParams = vec![("_page", self.page.to_string()), ("_per_page", self.per_page.to_string())];
        params.extend(self.categories.iter().map(|c| ("category", c.clone())));
        if self.min_price > Money::ZERO {
            params.push(("price_gte", self.min_price.amount().to_string()));
        }
        if let Some(max) = self.max_price {
            params.push(("price_lte", max.amount().to_string()));
        }
        if self.min_rating > 0 {
            params.push(("rating_gte", self.min_rating.to_string()));
        }
        params.extend(self.sort.params());
        params
    }
}

/// One page of a product listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub data: Vec<Product>,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub items: u32,
}

pub struct CatalogClient {
    api: ApiClient,
    categories: OnceCell<Arc<Vec<Category>>>,
    products: Cache<ResourceId, Arc<Product>>,
}

impl CatalogClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api, categories: OnceCell::new(), products: Cache::builder().build() }
    }

    /// All categories; fetched on first use and then held for the client's lifetime.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        self.categories
            .get_or_try_init(|| async {
                let categories: Vec<Category> = self.api.get("categories", &[]).await?;
                debug!(count = categories.len(), "Fetched categories");
                Ok::<_, ApiError>(Arc::new(categories))
            })
            .await
            .map(Arc::clone)
    }

    /// Product detail by id, served from cache after the first fetch.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ResourceId) -> Result<Arc<Product>, ApiError> {
        self.products
            .try_get_with(id.clone(), async {
                let product: Product = self.api.get(&format!("products/{id}"), &[]).await?;
                debug!("Fetched product detail");
                Ok::<_, ApiError>(Arc::new(product))
            })
            .await
            .map_err(ApiError::Shared)
    }

    pub fn clear_product_cache(&self) { self.products.invalidate_all(); }

    /// A filtered, sorted page of products. Always hits the backend.
    #[instrument(skip(self, query), fields(page = query.page))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let page: ProductPage = self.api.get("products", &query.to_params()).await?;
        debug!(returned = page.data.len(), total = page.items, "Fetched product page");
        Ok(page)
    }

    /// Up to four of the highest-rated products in `category`, excluding `exclude`.
    #[instrument(skip(self))]
    pub async fn top_rated_in_category(&self, category: &str, exclude: &ResourceId) -> Result<Vec<Product>, ApiError> {
        let params: QueryParams = vec![
            ("_limit", RELATED_FETCH_LIMIT.to_string()),
            ("_sort", "rating".into()),
            ("_order", "desc".into()),
            ("category", category.to_string()),
        ];
        let products: Vec<Product> = self.api.get("products", &params).await?;
        Ok(products.into_iter().filter(|p| &p.id != exclude).take(RELATED_SHOWN).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(params: &QueryParams) -> Vec<String> {
        params.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    #[test]
    fn test_default_query_params() {
        assert_eq!(keys(&ProductQuery::default().to_params()), vec!["_page=1", "_per_page=6", "_sort=price"]);
    }

    #[test]
    fn test_full_query_params() {
        let query = ProductQuery {
            page: 3,
            per_page: 6,
            categories: vec!["audio".into(), "home".into()],
            min_price: Money::whole(50),
            max_price: Some(Money::whole(500)),
            min_rating: 4,
            sort: SortOption::Popularity,
        };
        assert_eq!(
            keys(&query.to_params()),
            vec!["_page=3", "_per_page=6", "category=audio", "category=home", "price_gte=50", "price_lte=500", "rating_gte=4", "_sort=rating", "_order=desc"]
        );
    }

    #[test]
    fn test_price_high_to_low() {
        let query = ProductQuery { sort: SortOption::PriceHighToLow, ..ProductQuery::default() };
        assert!(keys(&query.to_params()).contains(&"_sort=-price".to_string()));
    }

    #[test]
    fn test_sort_option_parse() {
        assert_eq!("popularity".parse::<SortOption>().unwrap(), SortOption::Popularity);
        assert!("cheapest".parse::<SortOption>().is_err());
    }

    #[test]
    fn test_product_cache_is_unbounded() {
        let catalog = CatalogClient::new(ApiClient::new(url::Url::parse("http://localhost:3000").unwrap()));
        assert_eq!(catalog.products.policy().max_capacity(), None);
    }

    #[test]
    fn test_page_floor() {
        assert_eq!(ProductQuery::default().page(0).page, 1);
    }
}
