//! Key bindings for the search box.
//!
//! The keymap starts from the default bindings and layers the configured
//! `[keymap]` table on top. Later bindings for the same keystroke win.

use std::collections::{BTreeMap, HashMap};
use suggest_core::ConfigError;

use crate::actions::{action_from_name, EngineAction};

/// Action name that removes a default binding.
const UNBIND: &str = "none";

// =============================================================================
// Keystroke Parsing
// =============================================================================

/// Canonical form of a keystroke.
///
/// Users write "Ctrl+N", "ctrl-n" or "ArrowDown"; all of these normalize to
/// lowercase `+`-separated names ("ctrl+n", "down").
pub fn normalize_keystroke(s: &str) -> String {
    let s = s.trim().to_lowercase();
    let mut parts: Vec<&str> = s.split(['+', '-']).filter(|p| !p.is_empty()).collect();
    let Some(key) = parts.pop() else {
        return String::new();
    };
    let key = match key {
        "arrowdown" => "down",
        "arrowup" => "up",
        "esc" => "escape",
        "return" => "enter",
        other => other,
    };
    parts.push(key);
    parts.join("+")
}

// =============================================================================
// Keymap
// =============================================================================

/// Keystroke to action table.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, EngineAction>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self {
            bindings: HashMap::new(),
        };
        keymap.set("down", EngineAction::MoveNext);
        keymap.set("up", EngineAction::MovePrevious);
        keymap.set("ctrl+n", EngineAction::MoveNext);
        keymap.set("ctrl+p", EngineAction::MovePrevious);
        keymap.set("enter", EngineAction::Submit);
        keymap.set("escape", EngineAction::Close);
        keymap
    }
}

impl Keymap {
    /// Defaults overridden by a configured table of keystroke -> action name.
    ///
    /// The action name "none" removes a binding.
    pub fn from_config(overrides: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut keymap = Self::default();
        for (key, name) in overrides {
            if normalize_keystroke(key).is_empty() {
                return Err(ConfigError::InvalidKeymap(format!(
                    "empty keystroke bound to '{}'",
                    name
                )));
            }
            if name == UNBIND {
                keymap.remove(key);
                continue;
            }
            let action = action_from_name(name).ok_or_else(|| {
                ConfigError::InvalidKeymap(format!("unknown action '{}' for '{}'", name, key))
            })?;
            tracing::debug!("Keymap override: {} -> {}", key, action);
            keymap.set(key, action);
        }
        Ok(keymap)
    }

    /// Bind a keystroke, replacing any previous binding.
    pub fn set(&mut self, key: &str, action: EngineAction) {
        self.bindings.insert(normalize_keystroke(key), action);
    }

    /// Remove a binding. Returns true if one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.bindings.remove(&normalize_keystroke(key)).is_some()
    }

    /// Resolve a keystroke.
    pub fn resolve(&self, key: &str) -> Option<EngineAction> {
        self.bindings.get(&normalize_keystroke(key)).copied()
    }

    /// Get the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
