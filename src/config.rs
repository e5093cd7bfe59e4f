//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STOREFRONT_API_URL` - REST backend base URL (default: http://localhost:3000)
//! - `STOREFRONT_CART_DIR` - Directory holding the persisted cart (default: .storefront)
//! - `STOREFRONT_PAGE_SIZE` - Products per listing page (default: 6)
//! - `STOREFRONT_FILTER_DEBOUNCE_MS` - Quiet period before filter changes apply (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::services::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_CART_DIR: &str = ".storefront";
pub const DEFAULT_FILTER_DEBOUNCE_MS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Base URL every backend path is resolved against
    pub api_url: Url,
    /// Where the `cart` blob is written
    pub cart_dir: PathBuf,
    pub page_size: u32,
    pub filter_debounce: Duration,
}

impl StorefrontConfig {
    /// Load configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_url = Url::parse(&get("STOREFRONT_API_URL", DEFAULT_API_URL))
            .map_err(|e| invalid("STOREFRONT_API_URL", e))?;
        let cart_dir = PathBuf::from(get("STOREFRONT_CART_DIR", DEFAULT_CART_DIR));
        let page_size = get("STOREFRONT_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())
            .parse::<u32>()
            .map_err(|e| invalid("STOREFRONT_PAGE_SIZE", e))?;
        if page_size == 0 {
            return Err(invalid("STOREFRONT_PAGE_SIZE", "must be at least 1"));
        }
        let debounce_ms = get("STOREFRONT_FILTER_DEBOUNCE_MS", &DEFAULT_FILTER_DEBOUNCE_MS.to_string())
            .parse::<u64>()
            .map_err(|e| invalid("STOREFRONT_FILTER_DEBOUNCE_MS", e))?;

        Ok(Self { api_url, cart_dir, page_size, filter_debounce: Duration::from_millis(debounce_ms) })
    }
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason.to_string())
}
