//! The remote suggestion service boundary.

use async_trait::async_trait;
use suggest_core::FetchError;

use crate::wire::{AutocompleteResponse, RecommendationsResponse};

/// Options for an autocomplete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutocompleteOptions {
    /// Maximum number of "Search Suggestions" items.
    pub num_suggestions: u32,
    /// Maximum number of "Products" items.
    pub num_products: u32,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            num_suggestions: 8,
            num_products: 6,
        }
    }
}

/// Options for a recommendations request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationOptions {
    pub num_results: u32,
}

/// Remote autocomplete/recommendation service.
///
/// Ranking is entirely the service's business; callers take the sections in
/// the order they arrive.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Fetch autocomplete sections for a query.
    async fn autocomplete(
        &self,
        query: String,
        options: AutocompleteOptions,
    ) -> Result<AutocompleteResponse, FetchError>;

    /// Fetch the results of a recommendation pod.
    async fn recommendations(
        &self,
        pod_id: String,
        options: RecommendationOptions,
    ) -> Result<RecommendationsResponse, FetchError>;
}
