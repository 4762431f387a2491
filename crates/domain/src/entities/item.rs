//! Item entity - one stack of a fungible item type owned by a document
//!
//! The host's item payload is kept opaque in `data`; the stack size and type
//! live at configurable paths inside it (see [`crate::ItemSchema`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use itempiles_domain::ItemId;

/// An embedded item (inventory line).
///
/// Identity for merging is the item *type*, not the instance: two lines are
/// equivalent when they share an id, or failing that a name and type value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    /// Host payload; includes the type and quantity attributes
    #[serde(default)]
    pub data: Value,
}

/// A request to add `quantity` units of `item` somewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDelta {
    pub item: Item,
    pub quantity: u32,
}

/// A request to take units of an existing line away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub id: ItemId,
    /// `None` removes the whole stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// What happened to one inventory line during an operation.
///
/// Produced per resulting line; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Snapshot of the line (after the change, or before deletion)
    pub item: Item,
    /// Units actually moved
    pub quantity: u32,
    #[serde(default)]
    pub deleted: bool,
}
