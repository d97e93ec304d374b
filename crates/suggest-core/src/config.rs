//! Configuration types.
//!
//! Configuration is read from `config.toml` in the platform config
//! directory. Every field has a default, so a missing file or a partial
//! file is fine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::item::SectionTitles;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet window after the last keystroke before a fetch is issued.
    pub debounce_ms: u64,

    /// Result counts requested per section.
    pub results_per_section: ResultsPerSection,

    /// Header titles overriding the section identifiers.
    pub section_titles: SectionTitles,

    /// How many suggestions expand into per-group rows.
    pub in_group: InGroupConfig,

    /// Zero-state (nothing typed) settings.
    pub zero_state: ZeroStateConfig,

    /// Remote service settings.
    pub service: ServiceConfig,

    /// Extra key bindings, keystroke -> action name.
    pub keymap: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            results_per_section: ResultsPerSection::default(),
            section_titles: SectionTitles::default(),
            in_group: InGroupConfig::default(),
            zero_state: ZeroStateConfig::default(),
            service: ServiceConfig::default(),
            keymap: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Debounce delay as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path().ok_or(ConfigError::NoConfigDir)?;
        if path.exists() {
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Number of results requested per section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsPerSection {
    pub suggestions: u32,
    pub products: u32,
}

impl Default for ResultsPerSection {
    fn default() -> Self {
        Self {
            suggestions: 8,
            products: 6,
        }
    }
}

/// In-group suggestion expansion. The first `terms` suggestions that carry
/// groups are each followed by up to `groups_per_term` scoped rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InGroupConfig {
    pub terms: usize,
    pub groups_per_term: usize,
}

impl Default for InGroupConfig {
    fn default() -> Self {
        Self {
            terms: 1,
            groups_per_term: 2,
        }
    }
}

/// Zero-state recommendation rail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroStateConfig {
    /// Recommendation pod backing the rail.
    pub pod_id: String,

    /// Number of products requested.
    pub num_results: u32,

    /// Heading used when the pod has no display name.
    pub heading: String,
}

impl Default for ZeroStateConfig {
    fn default() -> Self {
        Self {
            pod_id: "hp-bestsellers".to_string(),
            num_results: 6,
            heading: "Popular".to_string(),
        }
    }
}

/// Remote service endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the autocomplete service.
    pub base_url: String,

    /// Public API key.
    pub api_key: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ac.cnstrc.com".to_string(),
            api_key: String::new(),
        }
    }
}

/// Get the config directory path.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("suggest"))
}

/// Get the path to `config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}
