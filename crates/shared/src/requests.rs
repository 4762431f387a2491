//! Requests executed by the privileged executor.
//!
//! Callers validate and run pre-hooks before building one of these; the
//! executor assumes every uuid and shape is already valid.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use itempiles_domain::{
    AttributeAmounts, DocumentUuid, GridPosition, InteractionId, ItemDelta, RemoveRequest, SceneId,
    TokenOverrides, UserId,
};

use crate::handlers::HandlerName;

/// A request together with who made it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivilegedCall {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<InteractionId>,
    pub request: PileRequest,
}

impl PrivilegedCall {
    pub fn new(user_id: UserId, interaction_id: Option<InteractionId>, request: PileRequest) -> Self {
        Self {
            user_id,
            interaction_id,
            request,
        }
    }

    pub fn handler(&self) -> HandlerName {
        self.request.handler()
    }
}

/// Mutation requests, tagged by handler name on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "handler", content = "args")]
pub enum PileRequest {
    #[serde(rename = "CREATE_PILE")]
    CreatePile(CreatePileData),
    #[serde(rename = "TURN_INTO_PILE")]
    TurnIntoPile {
        targets: Vec<DocumentUuid>,
        #[serde(default)]
        pile_patch: Map<String, Value>,
        #[serde(default)]
        token_overrides: TokenOverrides,
    },
    #[serde(rename = "REVERT_FROM_PILE")]
    RevertFromPile {
        targets: Vec<DocumentUuid>,
        #[serde(default)]
        token_overrides: TokenOverrides,
    },
    #[serde(rename = "UPDATE_PILE")]
    UpdatePile {
        target: DocumentUuid,
        patch: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interacting: Option<DocumentUuid>,
        #[serde(default)]
        token_overrides: TokenOverrides,
    },
    #[serde(rename = "DELETE_PILE")]
    DeletePile { target: DocumentUuid },
    #[serde(rename = "REFRESH_PILE")]
    RefreshPile { target: DocumentUuid },
    #[serde(rename = "ADD_ITEMS")]
    AddItems {
        target: DocumentUuid,
        items: Vec<ItemDelta>,
    },
    #[serde(rename = "REMOVE_ITEMS")]
    RemoveItems {
        target: DocumentUuid,
        items: Vec<RemoveRequest>,
    },
    #[serde(rename = "TRANSFER_ITEMS")]
    TransferItems {
        source: DocumentUuid,
        target: DocumentUuid,
        items: Vec<RemoveRequest>,
    },
    #[serde(rename = "TRANSFER_ALL_ITEMS")]
    TransferAllItems {
        source: DocumentUuid,
        target: DocumentUuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_type_filters: Option<Vec<String>>,
    },
    #[serde(rename = "ADD_ATTRIBUTE")]
    AddAttributes {
        target: DocumentUuid,
        attributes: AttributeAmounts,
    },
    #[serde(rename = "REMOVE_ATTRIBUTES")]
    RemoveAttributes {
        target: DocumentUuid,
        attributes: AttributeAmounts,
    },
    #[serde(rename = "TRANSFER_ATTRIBUTES")]
    TransferAttributes {
        source: DocumentUuid,
        target: DocumentUuid,
        attributes: AttributeAmounts,
    },
    #[serde(rename = "TRANSFER_ALL_ATTRIBUTES")]
    TransferAllAttributes {
        source: DocumentUuid,
        target: DocumentUuid,
    },
    #[serde(rename = "TRANSFER_EVERYTHING")]
    TransferEverything {
        source: DocumentUuid,
        target: DocumentUuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_type_filters: Option<Vec<String>>,
    },
    #[serde(rename = "DROP_ITEMS")]
    DropItems(DropItemsData),
}

impl PileRequest {
    pub fn handler(&self) -> HandlerName {
        match self {
            Self::CreatePile(_) => HandlerName::CreatePile,
            Self::TurnIntoPile { .. } => HandlerName::TurnIntoPile,
            Self::RevertFromPile { .. } => HandlerName::RevertFromPile,
            Self::UpdatePile { .. } => HandlerName::UpdatePile,
            Self::DeletePile { .. } => HandlerName::DeletePile,
            Self::RefreshPile { .. } => HandlerName::RefreshPile,
            Self::AddItems { .. } => HandlerName::AddItems,
            Self::RemoveItems { .. } => HandlerName::RemoveItems,
            Self::TransferItems { .. } => HandlerName::TransferItems,
            Self::TransferAllItems { .. } => HandlerName::TransferAllItems,
            Self::AddAttributes { .. } => HandlerName::AddAttributes,
            Self::RemoveAttributes { .. } => HandlerName::RemoveAttributes,
            Self::TransferAttributes { .. } => HandlerName::TransferAttributes,
            Self::TransferAllAttributes { .. } => HandlerName::TransferAllAttributes,
            Self::TransferEverything { .. } => HandlerName::TransferEverything,
            Self::DropItems(_) => HandlerName::DropItems,
        }
    }
}

/// Spawn a new pile token on a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePileData {
    pub scene: SceneId,
    pub position: GridPosition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemDelta>,
    /// Existing actor to spawn from instead of the default pile actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pile_actor_name: Option<String>,
    /// Pile flag values layered over the actor's
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub pile_patch: Map<String, Value>,
    #[serde(default)]
    pub token_overrides: TokenOverrides,
}

/// An item dropped on the scene or on a pile, after intent was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropItemsData {
    /// Actor the item came from; `None` for items from a compendium or sidebar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DocumentUuid>,
    /// Pile to add to; `None` spawns a new pile at `position`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DocumentUuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
    pub item: ItemDelta,
}
