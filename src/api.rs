//! JSON-over-HTTP access to the storefront backend.
//!
//! The backend is a generic resource server (json-server style): collections
//! live at `/{resource}`, members at `/{resource}/{id}`, and listing options
//! are plain query parameters.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

/// Query parameters in the order they are appended. Keys may repeat.
pub type QueryParams = Vec<(&'static str, String)>;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status} for {path}")]
    Status { status: StatusCode, path: String },

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid request path {path}: {source}")]
    Url {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// A failure observed by a request that was coalesced with another caller's.
    #[error("{0}")]
    Shared(Arc<ApiError>),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Shared(inner) => inner.is_not_found(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self { Self::with_client(Client::new(), base_url) }

    pub fn with_client(client: Client, mut base_url: Url) -> Self {
        // Url::join drops the last segment of a base path without a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    /// Resolves `path` against the base URL and appends `query` in order.
    pub fn url(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::Url { path: path.to_string(), source })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    #[instrument(skip(self, query), fields(params = query.len()))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&'static str, String)]) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        self.send(self.client.get(url), path).await
    }

    #[instrument(skip(self, body))]
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.client.post(url).json(body), path).await
    }

    #[instrument(skip(self, body))]
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.client.patch(url).json(body), path).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            debug!(path, "Resource not found");
            return Err(ApiError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status { status, path: path.to_string() });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_keeps_base_path() {
        let api = ApiClient::new(Url::parse("http://localhost:3000/api").unwrap());
        let url = api.url("/products", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/products");
    }

    #[test]
    fn test_url_repeats_query_keys_in_order() {
        let api = ApiClient::new(Url::parse("http://localhost:3000").unwrap());
        let url = api
            .url("products", &[("_page", "2".into()), ("category", "audio".into()), ("category", "home & garden".into())])
            .unwrap();
        assert_eq!(url.query(), Some("_page=2&category=audio&category=home+%26+garden"));
    }

    #[test]
    fn test_shared_not_found() {
        let err = ApiError::Shared(Arc::new(ApiError::NotFound("products/9".into())));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: products/9");
    }
}
