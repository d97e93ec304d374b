//! Backend integration for the suggestion engine.
//!
//! This module provides the bridge between the engine and the remote
//! suggestion service. The `Backend` trait returns boxed futures so the
//! controller can spawn them however it wants, and so tests can substitute
//! a scripted backend.

use futures::future::BoxFuture;
use std::sync::Arc;
use suggest_client::{
    AutocompleteOptions, ConstructorClient, RecommendationOptions, SuggestionService,
};
use suggest_core::{
    EngineConfig, FetchError, InGroupConfig, ResultSet, SectionTitles, ZeroState, ZeroStateConfig,
};

// =============================================================================
// Backend Trait
// =============================================================================

/// Trait for backend operations.
///
/// Futures are `'static` so they can outlive the call that created them. A
/// backend never decides whether a result is still wanted; that is the
/// engine's job.
pub trait Backend: Send + Sync {
    /// Fetch both suggestion sections for a non-empty query.
    fn fetch_suggestions(
        &self,
        query: String,
    ) -> BoxFuture<'static, Result<ResultSet, FetchError>>;

    /// Fetch the zero-state payload.
    fn fetch_zero_state(&self) -> BoxFuture<'static, Result<ZeroState, FetchError>>;
}

// =============================================================================
// Runtime Backend
// =============================================================================

/// Real backend on top of a `SuggestionService`.
pub struct RuntimeBackend {
    service: Arc<dyn SuggestionService>,
    options: AutocompleteOptions,
    in_group: InGroupConfig,
    titles: SectionTitles,
    zero_state: ZeroStateConfig,
}

impl RuntimeBackend {
    /// Create a backend over an existing service.
    pub fn new(service: Arc<dyn SuggestionService>, config: &EngineConfig) -> Self {
        Self {
            service,
            options: AutocompleteOptions {
                num_suggestions: config.results_per_section.suggestions,
                num_products: config.results_per_section.products,
            },
            in_group: config.in_group,
            titles: config.section_titles.clone(),
            zero_state: config.zero_state.clone(),
        }
    }

    /// Create a backend talking HTTP to the configured service.
    pub fn from_config(config: &EngineConfig) -> Result<Self, FetchError> {
        let client = ConstructorClient::new(&config.service)?;
        tracing::info!(
            "RuntimeBackend::from_config: base_url={}, client_id={}",
            config.service.base_url,
            client.client_id()
        );
        Ok(Self::new(Arc::new(client), config))
    }

    /// Get a reference to the service.
    pub fn service(&self) -> &Arc<dyn SuggestionService> {
        &self.service
    }
}

impl Backend for RuntimeBackend {
    fn fetch_suggestions(
        &self,
        query: String,
    ) -> BoxFuture<'static, Result<ResultSet, FetchError>> {
        let service = self.service.clone();
        let options = self.options;
        let in_group = self.in_group;
        let titles = self.titles.clone();

        Box::pin(async move {
            let response = service.autocomplete(query.clone(), options).await?;
            let result_id = response.result_id.clone();
            let (suggestions, products) = response.into_sections_with(in_group);

            let mut set = ResultSet::new(query, suggestions, products);
            set.titles = titles;
            set.result_id = result_id;
            Ok(set)
        })
    }

    fn fetch_zero_state(&self) -> BoxFuture<'static, Result<ZeroState, FetchError>> {
        let service = self.service.clone();
        let config = self.zero_state.clone();

        Box::pin(async move {
            let response = service
                .recommendations(
                    config.pod_id.clone(),
                    RecommendationOptions {
                        num_results: config.num_results,
                    },
                )
                .await?;

            let title = response
                .pod_title()
                .map(str::to_string)
                .unwrap_or(config.heading);
            let result_id = response.result_id.clone();

            let mut zero = ZeroState::products(title, response.into_products());
            zero.result_id = result_id;
            Ok(zero)
        })
    }
}

// =============================================================================
// Mock Backend for Testing
// =============================================================================


// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use std::time::Duration;
    use suggest_client::wire::{AutocompleteResponse, RecommendationsResponse};
    use suggest_client::MockSuggestionService;
    use suggest_core::{Section, SuggestionItem};

    fn autocomplete_json() -> AutocompleteResponse {
        serde_json::from_value(serde_json::json!({
            "sections": {
                "Search Suggestions": [{ "value": "shirt" }],
                "Products": [{ "value": "Shirt A", "data": { "id": "42" } }]
            },
            "result_id": "ac-1"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_runtime_backend_maps_autocomplete() {
        let mut service = MockSuggestionService::new();
        service
            .expect_autocomplete()
            .withf(|query, options| {
                query == "sh" && options.num_suggestions == 8 && options.num_products == 6
            })
            .times(1)
            .returning(|_, _| Ok(autocomplete_json()));

        let backend = RuntimeBackend::new(Arc::new(service), &EngineConfig::default());
        let set = backend.fetch_suggestions("sh".to_string()).await.unwrap();

        assert_eq!(set.query, "sh");
        assert_eq!(set.result_id.as_deref(), Some("ac-1"));
        assert_eq!(set.suggestions, vec![SuggestionItem::suggestion("shirt")]);
        assert_eq!(set.products[0].product_id(), Some("42"));
    }

    #[tokio::test]
    async fn test_runtime_backend_applies_titles_and_group_limits() {
        let mut config = EngineConfig::default();
        config.section_titles.products = Some("Top Products".to_string());
        config.in_group.groups_per_term = 1;

        let mut service = MockSuggestionService::new();
        service.expect_autocomplete().returning(|_, _| {
            Ok(serde_json::from_value(serde_json::json!({
                "sections": {
                    "Search Suggestions": [{
                        "value": "shirt",
                        "data": { "groups": [
                            { "group_id": "mens", "display_name": "Men's" },
                            { "group_id": "kids", "display_name": "Kids" }
                        ] }
                    }]
                }
            }))
            .unwrap())
        });

        let backend = RuntimeBackend::new(Arc::new(service), &config);
        let set = backend.fetch_suggestions("sh".to_string()).await.unwrap();

        assert_eq!(set.titles.title(Section::Product), "Top Products");
        assert_eq!(set.titles.title(Section::Suggestion), "Search Suggestions");
        let labels: Vec<_> = set.suggestions.iter().map(|i| i.display_label()).collect();
        assert_eq!(labels, ["shirt", "in Men's"]);
    }

    #[tokio::test]
    async fn test_runtime_backend_propagates_errors() {
        let mut service = MockSuggestionService::new();
        service.expect_autocomplete().returning(|_, _| {
            Err(FetchError::Status {
                code: 500,
                message: "boom".to_string(),
            })
        });

        let backend = RuntimeBackend::new(Arc::new(service), &EngineConfig::default());
        let err = backend
            .fetch_suggestions("xyz".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { code: 500, .. }));
    }

    #[tokio::test]
    async fn test_runtime_backend_zero_state_uses_pod_config() {
        let mut config = EngineConfig::default();
        config.zero_state.num_results = 4;

        let mut service = MockSuggestionService::new();
        service
            .expect_recommendations()
            .withf(|pod, options| pod == "hp-bestsellers" && options.num_results == 4)
            .times(1)
            .returning(|_, _| {
                Ok(serde_json::from_value(serde_json::json!({
                    "response": {
                        "results": [{ "value": "Polo", "data": { "id": "p1" } }],
                        "pod": { "id": "hp-bestsellers", "display_name": "Best Sellers" }
                    }
                }))
                .unwrap())
            });

        let backend = RuntimeBackend::new(Arc::new(service), &config);
        let zero = backend.fetch_zero_state().await.unwrap();
        assert_eq!(zero.title, "Best Sellers");
        assert_eq!(zero.products.len(), 1);
        assert!(zero.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_runtime_backend_zero_state_falls_back_to_heading() {
        let mut service = MockSuggestionService::new();
        service
            .expect_recommendations()
            .returning(|_, _| Ok(RecommendationsResponse::default()));

        let backend = RuntimeBackend::new(Arc::new(service), &EngineConfig::default());
        let zero = backend.fetch_zero_state().await.unwrap();
        assert_eq!(zero.title, "Popular");
        assert!(zero.is_empty());
    }

    #[test]
    fn test_from_config_without_key_is_unavailable() {
        let result = RuntimeBackend::from_config(&EngineConfig::default());
        assert!(matches!(result, Err(FetchError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_backend_scripted_and_default() {
        let backend = MockBackend::new().with_results(
            "sh",
            ResultSet::new("sh", vec![SuggestionItem::suggestion("shirt")], vec![]),
        );

        let set = backend.fetch_suggestions("sh".to_string()).await.unwrap();
        assert_eq!(set.len(), 1);
        let set = backend.fetch_suggestions("zz".to_string()).await.unwrap();
        assert!(set.is_empty());
        assert_eq!(backend.queries(), ["sh", "zz"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_backend_with_delay() {
        let backend = MockBackend::new().with_delay(Duration::from_millis(10));

        let start = tokio::time::Instant::now();
        let _results = backend.fetch_suggestions("test".to_string()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
