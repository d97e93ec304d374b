//! Remote boundary of the suggestion engine.
//!
//! This crate provides:
//! - `SuggestionService`, the async RPC boundary for autocomplete and
//!   recommendation requests
//! - Wire types mirroring the service's JSON payloads
//! - `ConstructorClient`, an HTTP implementation of the service

mod constructor;
mod service;
pub mod wire;

pub use constructor::ConstructorClient;
pub use service::{AutocompleteOptions, RecommendationOptions, SuggestionService};
#[cfg(any(test, feature = "mock"))]
pub use service::MockSuggestionService;
pub use wire::{AutocompleteResponse, RecommendationsResponse, WireItem};
