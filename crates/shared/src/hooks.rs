//! Lifecycle hook names and the payload passed to hook listeners.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use itempiles_domain::{
    AttributeAmounts, DocumentUuid, InteractionId, ItemDelta, RemoveRequest, TransferRecord,
    UserId,
};

macro_rules! hook_names {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum HookName {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl HookName {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }
    };
}

hook_names! {
    PreCreate => "PRE_CREATE",
    Create => "CREATE",
    PreTurnInto => "PRE_TURN_INTO",
    TurnInto => "TURN_INTO",
    PreRevertFrom => "PRE_REVERT_FROM",
    RevertFrom => "REVERT_FROM",
    PreUpdate => "PRE_UPDATE",
    Update => "UPDATE",
    PreDelete => "PRE_DELETE",
    Delete => "DELETE",
    PreOpen => "PRE_OPEN",
    Open => "OPEN",
    PreClose => "PRE_CLOSE",
    Close => "CLOSE",
    PreLock => "PRE_LOCK",
    Lock => "LOCK",
    PreUnlock => "PRE_UNLOCK",
    Unlock => "UNLOCK",
    PreRattle => "PRE_RATTLE",
    Rattle => "RATTLE",
    PreAddItems => "PRE_ADD_ITEMS",
    AddItems => "ADD_ITEMS",
    PreRemoveItems => "PRE_REMOVE_ITEMS",
    RemoveItems => "REMOVE_ITEMS",
    PreTransferItems => "PRE_TRANSFER_ITEMS",
    TransferItems => "TRANSFER_ITEMS",
    PreTransferAllItems => "PRE_TRANSFER_ALL_ITEMS",
    TransferAllItems => "TRANSFER_ALL_ITEMS",
    PreAddAttributes => "PRE_ADD_ATTRIBUTES",
    AddAttributes => "ADD_ATTRIBUTES",
    PreRemoveAttributes => "PRE_REMOVE_ATTRIBUTES",
    RemoveAttributes => "REMOVE_ATTRIBUTES",
    PreTransferAttributes => "PRE_TRANSFER_ATTRIBUTES",
    TransferAttributes => "TRANSFER_ATTRIBUTES",
    PreTransferAllAttributes => "PRE_TRANSFER_ALL_ATTRIBUTES",
    TransferAllAttributes => "TRANSFER_ALL_ATTRIBUTES",
    PreTransferEverything => "PRE_TRANSFER_EVERYTHING",
    TransferEverything => "TRANSFER_EVERYTHING",
    PreDropDetermined => "PRE_DROP_DETERMINED",
    PreDrop => "PRE_DROP",
    Drop => "DROP",
}

impl HookName {
    /// Pre-events may be vetoed by any listener.
    pub fn is_cancelable(&self) -> bool {
        self.as_str().starts_with("PRE_")
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments handed to hook listeners.
///
/// One shape serves every hook; fields that do not apply stay empty and are
/// left out of the serialized form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HookPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DocumentUuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DocumentUuid>,
    /// Multi-target operations (turn into / revert from)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<DocumentUuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interacting: Option<DocumentUuid>,
    /// Requested additions (pre-events)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adding: Vec<ItemDelta>,
    /// Requested removals (pre-events)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removing: Vec<RemoveRequest>,
    /// Committed item records (post-events)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TransferRecord>,
    #[serde(default, skip_serializing_if = "AttributeAmounts::is_empty")]
    pub attributes: AttributeAmounts,
    /// Pile data patch or diff
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<InteractionId>,
}

impl HookPayload {
    pub fn for_target(target: DocumentUuid) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn between(source: DocumentUuid, target: DocumentUuid) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn by(mut self, user_id: UserId, interaction_id: Option<InteractionId>) -> Self {
        self.user_id = Some(user_id);
        self.interaction_id = interaction_id;
        self
    }
}
