//! Storefront search-box suggestion engine.
//!
//! This crate provides the engine behind a search box:
//! - Debounced suggestion fetches with last-issued-wins sequencing
//! - A zero-state payload fetched once per engine
//! - Keyboard navigation over a flattened two-section list
//! - Commit routing to search results or product pages
//!
//! Hosts feed input events into a `SuggestionEngine` and render the
//! `ViewModel` it publishes.

pub mod actions;
pub mod backend;
pub mod controller;
pub mod events;
pub mod keymap;
pub mod model;
pub mod navigation;

// Re-export commonly used types
pub use actions::{action_from_name, available_actions, EngineAction};
pub use backend::{Backend, RuntimeBackend};
pub use controller::{EngineBuilder, EngineError, PointerTarget, SuggestionEngine};
pub use events::{EventSink, SearchEvent, TracingEventSink};
pub use keymap::{normalize_keystroke, Keymap};
pub use model::{
    ApplyOutcome, Commit, CommitTarget, InputEffect, ListEntry, NavigationState, SearchBoxState,
    ViewMode, ViewModel, ZeroStateStatus,
};
pub use navigation::Navigator;
pub use suggest_core::{EngineConfig, NavigationAction, SuggestionItem};

/// Install a `tracing` subscriber filtered by `RUST_LOG`, defaulting to info.
///
/// Does nothing if the host already installed one.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}
