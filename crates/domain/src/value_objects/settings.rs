//! Module settings value object
//!
//! # Architectural Note
//!
//! ModuleSettings includes serde derives because the settings are stored as a
//! JSON blob by the settings repository and shipped to participants verbatim.
//! Every field has a serde default so older stored blobs keep loading.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::attribute_path::AttributePath;
use crate::entities::Item;
use crate::ids::ActorId;

/// A numeric actor attribute that piles can hold and transfer (currencies,
/// resources).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicAttribute {
    pub name: String,
    pub path: AttributePath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

/// Global, world-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSettings {
    // ============================================================================
    // Pile lifecycle
    // ============================================================================

    /// Default for piles whose `delete_when_empty` is left at `Default`
    #[serde(default)]
    pub delete_empty_piles: bool,

    /// Actor used as the template for new piles, provisioned on first use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_pile_actor: Option<ActorId>,

    /// Actor type given to the provisioned template actor
    #[serde(default = "default_actor_class_type")]
    pub actor_class_type: String,

    // ============================================================================
    // Host item schema
    // ============================================================================

    /// Path of the item-type value used for matching equivalent items
    #[serde(default = "default_item_type_attribute")]
    pub item_type_attribute: AttributePath,

    /// Path of the stack quantity inside item data
    #[serde(default = "default_item_quantity_attribute")]
    pub item_quantity_attribute: AttributePath,

    /// Item types piles never hold or transfer in bulk
    #[serde(default)]
    pub item_type_filters: Vec<String>,

    // ============================================================================
    // Attributes
    // ============================================================================

    #[serde(default)]
    pub dynamic_attributes: Vec<DynamicAttribute>,
}

fn default_actor_class_type() -> String {
    "character".to_string()
}

fn default_item_type_attribute() -> AttributePath {
    AttributePath::from_static("type")
}

fn default_item_quantity_attribute() -> AttributePath {
    AttributePath::from_static("system.quantity")
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            delete_empty_piles: false,
            default_pile_actor: None,
            actor_class_type: default_actor_class_type(),
            item_type_attribute: default_item_type_attribute(),
            item_quantity_attribute: default_item_quantity_attribute(),
            item_type_filters: Vec::new(),
            dynamic_attributes: Vec::new(),
        }
    }
}

impl ModuleSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            delete_empty_piles: env_or("ITEM_PILES_DELETE_EMPTY_PILES", defaults.delete_empty_piles),
            default_pile_actor: None,
            actor_class_type: env_or("ITEM_PILES_ACTOR_CLASS_TYPE", defaults.actor_class_type),
            item_type_attribute: env_or("ITEM_PILES_ITEM_TYPE_ATTRIBUTE", defaults.item_type_attribute),
            item_quantity_attribute: env_or(
                "ITEM_PILES_ITEM_QUANTITY_ATTRIBUTE",
                defaults.item_quantity_attribute,
            ),
            item_type_filters: std::env::var("ITEM_PILES_ITEM_TYPE_FILTERS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.item_type_filters),
            dynamic_attributes: defaults.dynamic_attributes,
        }
    }

    pub fn item_schema(&self) -> ItemSchema {
        ItemSchema {
            type_attribute: self.item_type_attribute.clone(),
            quantity_attribute: self.item_quantity_attribute.clone(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Where the host keeps an item's type and stack size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSchema {
    pub type_attribute: AttributePath,
    pub quantity_attribute: AttributePath,
}

impl Default for ItemSchema {
    fn default() -> Self {
        ModuleSettings::default().item_schema()
    }
}

impl ItemSchema {
    /// Stack size of an item. Items without a readable quantity count as one.
    ///
    /// Stacks are whole units; callers reject fractional stacks with
    /// [`ItemSchema::invalid_quantity`] before they reach the executor.
    pub fn quantity(&self, item: &Item) -> u32 {
        self.quantity_attribute
            .get_number(&item.data)
            .filter(|q| q.is_finite())
            .map(|q| q.max(0.0).floor() as u32)
            .unwrap_or(1)
    }

    /// The stored quantity when it is not a whole, non-negative number.
    pub fn invalid_quantity(&self, item: &Item) -> Option<f64> {
        self.quantity_attribute
            .get_number(&item.data)
            .filter(|q| !q.is_finite() || *q < 0.0 || q.fract() != 0.0)
    }

    pub fn set_quantity(&self, item: &mut Item, quantity: u32) {
        self.quantity_attribute
            .set(&mut item.data, Value::from(quantity));
    }

    pub fn item_type(&self, item: &Item) -> Option<String> {
        self.type_attribute.get_string(&item.data)
    }

    /// True when the item's type is in `filters`.
    pub fn is_filtered(&self, item: &Item, filters: &[String]) -> bool {
        self.item_type(item)
            .is_some_and(|item_type| filters.iter().any(|f| f == &item_type))
    }
}
