//! Search analytics events.
//!
//! The engine reports what it showed and what the user picked to an injected
//! `EventSink`. The default sink writes them to the tracing log.

use serde::Serialize;
use suggest_core::{NavigationAction, SuggestionItem};

/// Something worth reporting to analytics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SearchEvent {
    /// A suggestion result set was applied.
    ResultsShown {
        query: String,
        suggestions: usize,
        products: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        result_id: Option<String>,
    },
    /// The zero-state payload arrived.
    ZeroStateShown {
        title: String,
        products: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        result_id: Option<String>,
    },
    /// An item was committed.
    ItemSelected {
        original_query: String,
        item: SuggestionItem,
        action: NavigationAction,
    },
    /// The raw query was submitted.
    SearchSubmitted { query: String },
}

/// Receives analytics events.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn record(&self, event: &SearchEvent);
}

/// Logs events with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: &SearchEvent) {
        match event {
            SearchEvent::ResultsShown {
                query,
                suggestions,
                products,
                ..
            } => tracing::info!(
                "results_shown: query={:?}, suggestions={}, products={}",
                query,
                suggestions,
                products
            ),
            SearchEvent::ZeroStateShown {
                title, products, ..
            } => tracing::info!("zero_state_shown: title={:?}, products={}", title, products),
            SearchEvent::ItemSelected {
                original_query,
                item,
                action,
            } => tracing::info!(
                "item_selected: original_query={:?}, item={:?}, route={}",
                original_query,
                item.value,
                action.route()
            ),
            SearchEvent::SearchSubmitted { query } => {
                tracing::info!("search_submitted: query={:?}", query)
            }
        }
    }
}
