//! State model for the search box.
//!
//! This module contains the state machine and the view snapshot it produces.
//! Nothing here performs I/O, so everything is testable synchronously.

mod state;
mod view;

pub use state::{
    ApplyOutcome, Commit, CommitTarget, InputEffect, NavigationState, SearchBoxState,
    ZeroStateStatus,
};
pub use view::{ListEntry, ViewMode, ViewModel};
