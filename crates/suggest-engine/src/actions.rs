//! Engine actions.
//!
//! Keys are resolved to these actions by the keymap. The engine executes
//! them against the search box state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Something a keystroke can ask the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineAction {
    /// Highlight the next item, wrapping at the end.
    MoveNext,
    /// Highlight the previous item, wrapping at the start.
    MovePrevious,
    /// Commit the highlight, or search for the typed text.
    Submit,
    /// Close the panel and keep the query.
    Close,
}

impl EngineAction {
    /// Canonical action name.
    pub fn name(self) -> &'static str {
        match self {
            EngineAction::MoveNext => "move_next",
            EngineAction::MovePrevious => "move_previous",
            EngineAction::Submit => "submit",
            EngineAction::Close => "close",
        }
    }
}

impl fmt::Display for EngineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Action Lookup
// =============================================================================

/// Look up an action by name.
///
/// Accepts the canonical names plus a few aliases used by other keymaps.
pub fn action_from_name(name: &str) -> Option<EngineAction> {
    match name {
        // Navigation
        "move_next" | "cursor_down" => Some(EngineAction::MoveNext),
        "move_previous" | "cursor_up" => Some(EngineAction::MovePrevious),

        // Execution
        "submit" => Some(EngineAction::Submit),
        "close" | "dismiss" => Some(EngineAction::Close),

        _ => None,
    }
}

/// Get all canonical action names.
pub fn available_actions() -> &'static [&'static str] {
    &["move_next", "move_previous", "submit", "close"]
}
