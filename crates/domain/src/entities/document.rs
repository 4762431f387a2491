//! Document snapshot - the coordinator's view of a host token or actor

use serde::{Deserialize, Serialize};
use serde_json::Value;

use itempiles_domain::{ActorId, DocumentKind, DocumentUuid, Item, ItemId, PileData};

/// Position on a scene in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: f64,
    pub y: f64,
}

impl GridPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whole grid units between two positions (partial squares don't count).
    pub fn distance_to(&self, other: &GridPosition) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt().floor()
    }
}

/// Token image and scale as rendered on the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAppearance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    pub scale: f64,
}

impl Default for TokenAppearance {
    fn default() -> Self {
        Self {
            img: None,
            scale: 1.0,
        }
    }
}

/// Explicit token-level overrides supplied with an update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TokenOverrides {
    pub fn is_empty(&self) -> bool {
        self.img.is_none() && self.scale.is_none() && self.name.is_none()
    }
}

/// A token or actor together with the actor data the coordinator reads.
///
/// Tokens carry their own (synthetic) actor data: items and `system`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PileDocument {
    pub uuid: DocumentUuid,
    pub name: String,
    /// Base image of the backing actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    /// Current token appearance (tokens only)
    #[serde(default)]
    pub appearance: TokenAppearance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
    /// World actor this token was created from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ActorId>,
    /// Linked tokens share data with their actor and never spawn item copies
    #[serde(default)]
    pub actor_link: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pile: Option<PileData>,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Actor system data holding attribute pools
    #[serde(default)]
    pub system: Value,
}

impl PileDocument {
    pub fn kind(&self) -> DocumentKind {
        self.uuid.kind()
    }

    /// Stored pile data, or the disabled defaults.
    pub fn pile_data(&self) -> PileData {
        self.pile.clone().unwrap_or_default()
    }

    pub fn is_valid_pile(&self) -> bool {
        self.pile.as_ref().is_some_and(|p| p.enabled)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn item_uuid(&self, id: &ItemId) -> String {
        format!("{}.Item.{}", self.uuid, id)
    }
}
