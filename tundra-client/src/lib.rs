//! Tundra HTTP Clients
//!
//! Type-safe HTTP clients for the three services the Tundra controller
//! reconciles against:
//! - [`StoreClient`]: the resource store holding repos and their status
//! - [`SourceControlClient`]: a GitHub-compatible source-control API
//! - [`EngineClient`]: the pipeline engine (bindings, pipelines, runs)
//!
//! Both the controller and the CLI use these clients.
//!
//! # Example
//!
//! ```no_run
//! use tundra_client::StoreClient;
//! use tundra_core::domain::repo::RepoId;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = StoreClient::new("http://localhost:8080");
//!
//!     let repo = store.get_repo(&RepoId::new("default", "web")).await?;
//!     println!("{} tracks {}", repo.name(), repo.spec.branch);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod scm;
pub mod store;

// Re-export commonly used types
pub use engine::EngineClient;
pub use error::{ClientError, Result};
pub use scm::SourceControlClient;
pub use store::StoreClient;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Shared HTTP plumbing for the service clients
///
/// Holds the base URL, the reqwest client and an optional bearer token that
/// is attached to every request.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Bearer token sent as `Authorization` when present
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use tundra_client::ApiClient;
    ///
    /// let client = ApiClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new API client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use tundra_client::ApiClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ApiClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `segments` below the base URL, escaping each one
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Start a request against the path made of `segments`
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let builder = self.client.request(method, self.url(segments)?);

        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Send a request and deserialize the JSON response
    ///
    /// Non-success statuses become [`ClientError::ApiError`], so a 404 is
    /// recognised by [`ClientError::is_not_found`].
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Send a request whose response body is irrelevant
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await?;
        self.handle_empty_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
