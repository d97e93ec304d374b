//! Core types for the storefront suggestion engine.
//!
//! This crate contains shared data structures that are used across all crates:
//! - Suggestion items, result sets and the zero-state payload
//! - Navigation actions and their routes
//! - Configuration types
//! - Error types

mod action;
mod config;
mod error;
mod item;

pub use action::{escape_query, NavigationAction};
pub use config::{
    config_dir, config_path, EngineConfig, InGroupConfig, ResultsPerSection, ServiceConfig,
    ZeroStateConfig,
};
pub use error::{ConfigError, FetchError};
pub use item::{
    Epoch, ItemKey, ItemLabels, ProductRef, ResultSet, Section, SectionTitles, SuggestionGroup,
    SuggestionItem, ZeroState,
};
