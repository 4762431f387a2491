//! Data shapes passed across port boundaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use itempiles_domain::{
    ActorId, AttributeAmounts, DocumentUuid, GridPosition, InteractionId, Item, PileData,
    PileDocument, SceneId, TokenAppearance, UserId,
};

// =============================================================================
// Document Store
// =============================================================================

/// A world actor to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActor {
    pub name: String,
    /// Host actor type
    pub actor_type: String,
    pub img: Option<String>,
    pub pile: PileData,
}

/// A token to place on a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct NewToken {
    pub scene: SceneId,
    pub actor: ActorId,
    pub name: String,
    pub img: Option<String>,
    pub position: GridPosition,
    pub appearance: TokenAppearance,
    pub actor_link: bool,
    pub pile: PileData,
    /// Synthetic actor data of an unlinked token
    pub items: Vec<Item>,
    pub system: Value,
}

/// Top-level fields written together with a pile flag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentUpdate {
    pub pile: Option<PileData>,
    pub appearance: Option<TokenAppearance>,
    pub name: Option<String>,
}

impl DocumentUpdate {
    pub fn pile(pile: PileData) -> Self {
        Self {
            pile: Some(pile),
            ..Self::default()
        }
    }

    pub fn with_appearance(mut self, appearance: Option<TokenAppearance>) -> Self {
        self.appearance = appearance;
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pile.is_none() && self.appearance.is_none() && self.name.is_none()
    }
}

// =============================================================================
// Macros
// =============================================================================

/// What a pile macro is being run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacroAction {
    #[serde(rename = "createItemPile")]
    CreatePile,
    #[serde(rename = "openItemPile")]
    OpenPile,
    #[serde(rename = "closeItemPile")]
    ClosePile,
    #[serde(rename = "lockItemPile")]
    LockPile,
    #[serde(rename = "unlockItemPile")]
    UnlockPile,
    #[serde(rename = "addItems")]
    AddItems,
    #[serde(rename = "removeItems")]
    RemoveItems,
    #[serde(rename = "transferItems")]
    TransferItems,
    #[serde(rename = "transferAllItems")]
    TransferAllItems,
    #[serde(rename = "addAttributes")]
    AddAttributes,
    #[serde(rename = "removeAttributes")]
    RemoveAttributes,
    #[serde(rename = "transferAttributes")]
    TransferAttributes,
    #[serde(rename = "transferAllAttributes")]
    TransferAllAttributes,
    #[serde(rename = "transferEverything")]
    TransferEverything,
    #[serde(rename = "dropItems")]
    DropItems,
}

/// An item entry resolved to the live line it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedItem {
    /// Embedded item uuid (`<owner uuid>.Item.<id>`)
    pub uuid: String,
    pub item: Item,
    pub quantity: u32,
    #[serde(default)]
    pub deleted: bool,
}

/// The single argument a pile macro receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroInvocation {
    pub action: MacroAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PileDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PileDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ResolvedItem>,
    #[serde(default, skip_serializing_if = "AttributeAmounts::is_empty")]
    pub attributes: AttributeAmounts,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<InteractionId>,
}

// =============================================================================
// Drop Prompts
// =============================================================================

/// Question put to the dropping user when intent is ambiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct DropPrompt {
    pub item: Item,
    /// Most units the user may drop
    pub max_quantity: u32,
    /// Existing pile under the drop point
    pub target: Option<DocumentUuid>,
}

/// The user's answer to a [`DropPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropChoice {
    pub quantity: u32,
    /// Spawn a new pile even though one exists under the drop point
    pub new_pile: bool,
}
