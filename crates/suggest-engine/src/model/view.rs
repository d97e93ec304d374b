//! Render snapshot of the search box.

use serde::Serialize;
use suggest_core::SuggestionItem;

/// Which payload the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Nothing typed: the cached zero-state.
    ZeroState,
    /// Something typed: the latest suggestion results.
    Results,
}

/// Entry in the flattened panel list (for rendering).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListEntry {
    /// A section header (not selectable).
    SectionHeader { title: String },
    /// A selectable item with its flattened index.
    Item {
        item: SuggestionItem,
        flat_index: usize,
        highlighted: bool,
    },
}

/// Everything a renderer needs, published after every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub query: String,
    pub mode: ViewMode,
    pub is_open: bool,
    /// Highlighted flattened index.
    pub highlighted: Option<usize>,
    /// A suggestion fetch is outstanding.
    pub fetching: bool,
    /// The zero-state fetch is outstanding.
    pub zero_state_loading: bool,
    /// Show the "no results" message instead of sections.
    pub show_no_results: bool,
    /// Headers and items in display order.
    pub entries: Vec<ListEntry>,
    /// Number of selectable items.
    pub item_count: usize,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            query: String::new(),
            mode: ViewMode::ZeroState,
            is_open: false,
            highlighted: None,
            fetching: false,
            zero_state_loading: false,
            show_no_results: false,
            entries: Vec::new(),
            item_count: 0,
        }
    }
}

impl ViewModel {
    /// Highlight as a signed index, -1 when nothing is highlighted.
    pub fn highlighted_index(&self) -> i64 {
        self.highlighted.map_or(-1, |i| i as i64)
    }

    /// Selectable items in flattened order.
    pub fn items(&self) -> impl Iterator<Item = &SuggestionItem> {
        self.entries.iter().filter_map(|entry| match entry {
            ListEntry::Item { item, .. } => Some(item),
            ListEntry::SectionHeader { .. } => None,
        })
    }

    /// The highlighted item, if any.
    pub fn highlighted_item(&self) -> Option<&SuggestionItem> {
        self.highlighted.and_then(|i| self.items().nth(i))
    }

    /// Position of the highlighted item in `entries`, headers included.
    ///
    /// Renderers use this to scroll the highlight into view.
    pub fn highlighted_entry_index(&self) -> Option<usize> {
        let target = self.highlighted?;
        self.entries.iter().position(|entry| {
            matches!(entry, ListEntry::Item { flat_index, .. } if *flat_index == target)
        })
    }
}
