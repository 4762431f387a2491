//! Broadcasts and the line-oriented bridge messages.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change
//! - Unknown bridge message types deserialize to `Unknown`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use itempiles_domain::{DocumentUuid, UserId};

use crate::handlers::HandlerName;
use crate::hooks::{HookName, HookPayload};
use crate::requests::PrivilegedCall;
use crate::responses::ResponseResult;

// =============================================================================
// Broadcasts (executor → participants)
// =============================================================================

/// Notifications sent after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "handler", content = "args")]
pub enum Broadcast {
    /// Pile flag changed; only the changed keys are sent
    #[serde(rename = "UPDATED_PILE")]
    UpdatedPile {
        target: DocumentUuid,
        diff: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interacting: Option<DocumentUuid>,
    },
    /// Fire a post-event hook on every participant
    #[serde(rename = "CALL_HOOK")]
    CallHook {
        hook: HookName,
        payload: HookPayload,
    },
    #[serde(rename = "RERENDER_PILE_INVENTORY")]
    RerenderPileInventory {
        target: DocumentUuid,
        #[serde(default)]
        deleted: bool,
    },
    #[serde(rename = "RERENDER_TOKEN_HUD")]
    RerenderTokenHud { target: DocumentUuid },
    /// Show a pile's inventory (sent to chosen participants)
    #[serde(rename = "OPEN_INVENTORY")]
    OpenInventory {
        target: DocumentUuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inspecting: Option<DocumentUuid>,
    },
}

impl Broadcast {
    pub fn handler(&self) -> HandlerName {
        match self {
            Self::UpdatedPile { .. } => HandlerName::UpdatedPile,
            Self::CallHook { .. } => HandlerName::CallHook,
            Self::RerenderPileInventory { .. } => HandlerName::RerenderPileInventory,
            Self::RerenderTokenHud { .. } => HandlerName::RerenderTokenHud,
            Self::OpenInventory { .. } => HandlerName::OpenInventory,
        }
    }

    pub fn hook(hook: HookName, payload: HookPayload) -> Self {
        Self::CallHook { hook, payload }
    }
}

// =============================================================================
// Bridge Messages
// =============================================================================

/// Lines read by the executor bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Execute a mutation as privileged
    Call { request_id: String, call: PrivilegedCall },
    /// Liveness probe
    Heartbeat,
    /// Unknown message type for forward compatibility
    #[serde(other)]
    Unknown,
}

/// Lines written by the executor bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Reply to a `Call`
    Response {
        request_id: String,
        result: ResponseResult,
    },
    /// Broadcast for everyone, or for the listed participants only
    Broadcast {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        participants: Option<Vec<UserId>>,
        broadcast: Broadcast,
    },
    /// Reply to a `Heartbeat`
    Pong,
    /// A line that could not be parsed
    Error { message: String },
    /// Unknown message type for forward compatibility
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_broadcast_wire_form() {
        let broadcast = Broadcast::RerenderTokenHud {
            target: DocumentUuid::parse("Scene.s1.Token.t1").unwrap(),
        };
        assert_eq!(broadcast.handler(), HandlerName::RerenderTokenHud);
        assert_eq!(
            serde_json::to_value(&broadcast).unwrap(),
            json!({"handler": "RERENDER_TOKEN_HUD", "args": {"target": "Scene.s1.Token.t1"}})
        );
    }

    #[test]
    fn test_unknown_client_message() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Shutdown"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Unknown));
    }

    #[test]
    fn test_call_message_parses() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "Call",
            "request_id": "r1",
            "call": {
                "user_id": "gm",
                "request": {"handler": "REFRESH_PILE", "args": {"target": "Actor.a1"}}
            }
        }))
        .unwrap();
        match msg {
            ClientMessage::Call { request_id, call } => {
                assert_eq!(request_id, "r1");
                assert_eq!(call.handler(), HandlerName::RefreshPile);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}
