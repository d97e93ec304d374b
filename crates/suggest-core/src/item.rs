//! Suggestion items, result sets and the zero-state payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which result section an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Free-text query suggestions.
    Suggestion,
    /// Product matches.
    Product,
}

impl Section {
    /// Section identifier used by the remote service.
    pub fn identifier(self) -> &'static str {
        match self {
            Section::Suggestion => "Search Suggestions",
            Section::Product => "Products",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Product reference attached to product-section items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Opaque product identifier.
    pub id: String,

    /// Thumbnail URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// List price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Sale price, if the product is discounted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<f64>,

    /// Variation shown for this match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<String>,
}

impl ProductRef {
    /// Create a product reference with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_url: None,
            price: None,
            sale_price: None,
            variation_id: None,
        }
    }

    /// A discount applies when the sale price is strictly below the list price.
    pub fn has_discount(&self) -> bool {
        matches!((self.sale_price, self.price), (Some(sale), Some(list)) if sale < list)
    }

    /// Price to display: the sale price when discounted, the list price otherwise.
    pub fn display_price(&self) -> Option<f64> {
        if self.has_discount() {
            self.sale_price
        } else {
            self.price
        }
    }
}

/// Catalog group a suggestion is scoped to, e.g. "shirt" in "Men's Tops".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionGroup {
    pub group_id: String,
    pub display_name: String,
}

/// Sponsored-listing labels attached by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLabels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl_campaign_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sl_campaign_owner: Option<String>,
}

impl ItemLabels {
    /// Sponsored when a campaign id is present.
    pub fn is_sponsored(&self) -> bool {
        self.sl_campaign_id.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.sl_campaign_id.is_none() && self.sl_campaign_owner.is_none()
    }
}

/// Header titles for the two sections. Blank or missing titles fall back to
/// the section identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionTitles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<String>,
}

impl SectionTitles {
    /// Title to show above `section`.
    pub fn title(&self, section: Section) -> &str {
        let custom = match section {
            Section::Suggestion => self.suggestions.as_deref(),
            Section::Product => self.products.as_deref(),
        };
        custom
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(section.identifier())
    }
}

/// Identity of an item within a displayed list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// Items carrying product data are identified by product id.
    Product(String),
    /// Everything else by section, text and group.
    Text {
        section: Section,
        value: String,
        group: Option<String>,
    },
}

/// A single row in the suggestion panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionItem {
    /// Display label. For suggestions, also the search text.
    pub value: String,

    /// Owning section.
    pub section: Section,

    /// Product data, present for product matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ProductRef>,

    /// Group scope for in-group suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<SuggestionGroup>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<ItemLabels>,
}

impl SuggestionItem {
    /// Create a text suggestion.
    pub fn suggestion(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            section: Section::Suggestion,
            data: None,
            group: None,
            labels: None,
        }
    }

    /// Create a suggestion scoped to a catalog group.
    pub fn in_group(value: impl Into<String>, group: SuggestionGroup) -> Self {
        Self {
            group: Some(group),
            ..Self::suggestion(value)
        }
    }

    /// Create a product match.
    pub fn product(value: impl Into<String>, data: ProductRef) -> Self {
        Self {
            value: value.into(),
            section: Section::Product,
            data: Some(data),
            group: None,
            labels: None,
        }
    }

    /// Attach sponsored-listing labels. Empty labels are dropped.
    pub fn with_labels(mut self, labels: ItemLabels) -> Self {
        self.labels = (!labels.is_empty()).then_some(labels);
        self
    }

    /// Text to render: "in {group}" for in-group rows, the value otherwise.
    pub fn display_label(&self) -> String {
        match (&self.section, &self.group) {
            (Section::Suggestion, Some(group)) => format!("in {}", group.display_name),
            _ => self.value.clone(),
        }
    }

    pub fn is_sponsored(&self) -> bool {
        self.labels.as_ref().is_some_and(ItemLabels::is_sponsored)
    }

    /// List identity: product id when present, `(section, value, group)` otherwise.
    pub fn key(&self) -> ItemKey {
        match &self.data {
            Some(product) => ItemKey::Product(product.id.clone()),
            None => ItemKey::Text {
                section: self.section,
                value: self.value.clone(),
                group: self.group.as_ref().map(|g| g.group_id.clone()),
            },
        }
    }

    /// Product id when this item routes to a product page.
    pub fn product_id(&self) -> Option<&str> {
        match (self.section, &self.data) {
            (Section::Product, Some(product)) => Some(product.id.as_str()),
            _ => None,
        }
    }
}

/// Sequence number assigned to a suggestion fetch when it is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Epoch(pub u64);

impl Epoch {
    /// The epoch after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Results of one settled suggestion fetch. Replaced wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Query the fetch was issued for.
    pub query: String,

    /// Text suggestions in service order.
    pub suggestions: Vec<SuggestionItem>,

    /// Product matches in service order.
    pub products: Vec<SuggestionItem>,

    /// Epoch of the fetch that produced this set.
    pub epoch: Epoch,

    /// Section header titles.
    pub titles: SectionTitles,

    /// Service-side result identifier, for analytics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
}

impl ResultSet {
    /// Create a result set from both sections.
    pub fn new(
        query: impl Into<String>,
        suggestions: Vec<SuggestionItem>,
        products: Vec<SuggestionItem>,
    ) -> Self {
        Self {
            query: query.into(),
            suggestions,
            products,
            epoch: Epoch::default(),
            titles: SectionTitles::default(),
            result_id: None,
        }
    }

    /// Empty sections for the given query, used after a failed fetch.
    pub fn empty(query: impl Into<String>) -> Self {
        Self::new(query, Vec::new(), Vec::new())
    }

    /// True when both sections are empty.
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty() && self.products.is_empty()
    }

    /// Total number of items across sections.
    pub fn len(&self) -> usize {
        self.suggestions.len() + self.products.len()
    }
}

/// Payload shown while nothing is typed. Fetched at most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZeroState {
    /// Heading shown above the zero-state rail.
    pub title: String,

    /// Text suggestions (e.g., popular searches).
    pub suggestions: Vec<SuggestionItem>,

    /// Recommended products.
    pub products: Vec<SuggestionItem>,

    /// Service-side result identifier, for analytics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
}

impl ZeroState {
    /// Create a zero-state payload holding only products.
    pub fn products(title: impl Into<String>, products: Vec<SuggestionItem>) -> Self {
        Self {
            title: title.into(),
            suggestions: Vec::new(),
            products,
            result_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty() && self.products.is_empty()
    }
}
