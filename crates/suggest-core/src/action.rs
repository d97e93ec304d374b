//! Navigation actions produced by committing a selection.

use serde::{Deserialize, Serialize};

/// Destination chosen by a commit or a form submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationAction {
    /// Go to the search results page for the given text.
    Search { query: String },

    /// Go to a product detail page.
    Product { id: String },
}

impl NavigationAction {
    /// Search results for the given text.
    pub fn search(query: impl Into<String>) -> Self {
        Self::Search {
            query: query.into(),
        }
    }

    /// Product detail for the given id.
    pub fn product(id: impl Into<String>) -> Self {
        Self::Product { id: id.into() }
    }

    /// Route for the host's router. Query text is form-urlencoded.
    pub fn route(&self) -> String {
        match self {
            NavigationAction::Search { query } => format!("/search?q={}", escape_query(query)),
            NavigationAction::Product { id } => format!("/product/{}", escape_query(id)),
        }
    }
}

/// Percent-escape text for use inside a URL-bearing route.
pub fn escape_query(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}
