//! Wire types for the autocomplete and recommendation endpoints.
//!
//! Field names follow the service's JSON. Anything the engine does not
//! understand is kept in `extra` rather than rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use suggest_core::{
    InGroupConfig, ItemLabels, ProductRef, Section, SuggestionGroup, SuggestionItem,
};

/// Response body of `GET /autocomplete/{query}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    /// Section identifier -> items, e.g. "Search Suggestions", "Products".
    #[serde(default)]
    pub sections: HashMap<String, Vec<WireItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
}

impl AutocompleteResponse {
    /// Split into (suggestions, products) with default in-group expansion.
    pub fn into_sections(self) -> (Vec<SuggestionItem>, Vec<SuggestionItem>) {
        self.into_sections_with(InGroupConfig::default())
    }

    /// Split into (suggestions, products), preserving service order.
    ///
    /// The first `in_group.terms` suggestions that carry groups are each
    /// followed by one scoped row per group, up to `in_group.groups_per_term`.
    pub fn into_sections_with(
        mut self,
        in_group: InGroupConfig,
    ) -> (Vec<SuggestionItem>, Vec<SuggestionItem>) {
        let mut expanded_terms = 0;
        let mut suggestions = Vec::new();
        for item in self
            .sections
            .remove(Section::Suggestion.identifier())
            .unwrap_or_default()
        {
            let groups = item.groups();
            let plain = item.into_suggestion();

            if groups.is_empty() || expanded_terms >= in_group.terms {
                suggestions.push(plain);
                continue;
            }
            expanded_terms += 1;

            let scoped: Vec<_> = groups
                .into_iter()
                .take(in_group.groups_per_term)
                .map(|group| SuggestionItem::in_group(plain.value.clone(), group))
                .collect();
            suggestions.push(plain);
            suggestions.extend(scoped);
        }

        let products = self
            .sections
            .remove(Section::Product.identifier())
            .unwrap_or_default()
            .into_iter()
            .map(WireItem::into_product)
            .collect();
        (suggestions, products)
    }
}

/// Response body of `GET /recommendations/v1/pods/{pod_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub response: RecommendationsBody,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
}

impl RecommendationsResponse {
    /// Pod display name, if the service sent a non-empty one.
    pub fn pod_title(&self) -> Option<&str> {
        self.response
            .pod
            .as_ref()
            .and_then(|pod| pod.display_name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    /// Recommended products as product items.
    pub fn into_products(self) -> Vec<SuggestionItem> {
        self.response
            .results
            .into_iter()
            .map(WireItem::into_product)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationsBody {
    #[serde(default)]
    pub results: Vec<WireItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_num_results: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodInfo {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A single result item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireItem {
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<WireItemData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<WireLabels>,
}

impl WireItem {
    /// Groups this suggestion can be scoped to. Groups without an id or
    /// display name are skipped.
    pub fn groups(&self) -> Vec<SuggestionGroup> {
        self.data
            .iter()
            .flat_map(|data| data.groups.iter())
            .filter_map(WireGroup::to_group)
            .collect()
    }

    /// Convert into a plain text suggestion. Product data is not carried over.
    pub fn into_suggestion(self) -> SuggestionItem {
        let labels = self.labels.map(WireLabels::into_labels).unwrap_or_default();
        SuggestionItem::suggestion(self.value).with_labels(labels)
    }

    /// Convert into a product item. Items without an id keep no product data.
    pub fn into_product(self) -> SuggestionItem {
        let labels = self.labels.map(WireLabels::into_labels).unwrap_or_default();
        let mut item = SuggestionItem::suggestion(self.value).with_labels(labels);
        item.section = Section::Product;
        item.data = self.data.and_then(WireItemData::into_product_ref);
        item
    }
}

/// Item `labels` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireLabels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl_campaign_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl_campaign_owner: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireLabels {
    fn into_labels(self) -> ItemLabels {
        ItemLabels {
            sl_campaign_id: self.sl_campaign_id.as_ref().and_then(scalar_to_string),
            sl_campaign_owner: self.sl_campaign_owner.as_ref().and_then(scalar_to_string),
        }
    }
}

/// Entry of a suggestion's `data.groups` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireGroup {
    fn to_group(&self) -> Option<SuggestionGroup> {
        let group_id = self.group_id.as_ref().and_then(scalar_to_string)?;
        let display_name = self
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())?;
        Some(SuggestionGroup {
            group_id,
            display_name: display_name.to_string(),
        })
    }
}

/// Item `data` object. Numeric fields are read leniently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireItemData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<WireGroup>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireItemData {
    fn into_product_ref(self) -> Option<ProductRef> {
        let id = self.id.as_ref().and_then(scalar_to_string)?;
        Some(ProductRef {
            id,
            image_url: self.image_url,
            price: self.price.as_ref().and_then(scalar_to_f64),
            sale_price: self.sale_price.as_ref().and_then(scalar_to_f64),
            variation_id: self.variation_id.as_ref().and_then(scalar_to_string),
        })
    }
}

/// Ids arrive as strings or numbers.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Prices arrive as numbers or numeric strings.
fn scalar_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
