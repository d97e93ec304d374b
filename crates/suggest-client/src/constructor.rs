//! HTTP client for the hosted autocomplete service.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use suggest_core::{FetchError, ServiceConfig};
use url::Url;
use uuid::Uuid;

use crate::service::{AutocompleteOptions, RecommendationOptions, SuggestionService};
use crate::wire::{AutocompleteResponse, RecommendationsResponse};

/// `SuggestionService` over HTTP.
///
/// Every client instance identifies itself with a random client id and a
/// session number, which the service uses to attribute behavioral data.
#[derive(Debug, Clone)]
pub struct ConstructorClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    client_id: Uuid,
    session_id: u32,
}

impl ConstructorClient {
    /// Create a client from service configuration.
    pub fn new(config: &ServiceConfig) -> Result<Self, FetchError> {
        if config.api_key.trim().is_empty() {
            return Err(FetchError::Unavailable("no API key configured".to_string()));
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::Unavailable(format!("invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Unavailable(format!(
                "invalid base URL: {}",
                config.base_url
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            client_id: Uuid::new_v4(),
            session_id: 1,
        })
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, ...).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Set the session number.
    pub fn with_session(mut self, session_id: u32) -> Self {
        self.session_id = session_id;
        self
    }

    /// The client id sent with every request.
    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("i", &self.client_id.to_string())
            .append_pair("s", &self.session_id.to_string());
        url
    }

    fn autocomplete_url(&self, query: &str, options: AutocompleteOptions) -> Url {
        let mut url = self.endpoint(&["autocomplete", query]);
        url.query_pairs_mut()
            .append_pair(
                "num_results_Search Suggestions",
                &options.num_suggestions.to_string(),
            )
            .append_pair("num_results_Products", &options.num_products.to_string());
        url
    }

    fn recommendations_url(&self, pod_id: &str, options: RecommendationOptions) -> Url {
        let mut url = self.endpoint(&["recommendations", "v1", "pods", pod_id]);
        url.query_pairs_mut()
            .append_pair("num_results", &options.num_results.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url.path());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::Status {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SuggestionService for ConstructorClient {
    async fn autocomplete(
        &self,
        query: String,
        options: AutocompleteOptions,
    ) -> Result<AutocompleteResponse, FetchError> {
        let url = self.autocomplete_url(&query, options);
        self.get_json(url).await
    }

    async fn recommendations(
        &self,
        pod_id: String,
        options: RecommendationOptions,
    ) -> Result<RecommendationsResponse, FetchError> {
        let url = self.recommendations_url(&pod_id, options);
        self.get_json(url).await
    }
}
