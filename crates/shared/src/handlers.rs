//! Handler names addressed through the RPC layer.
//!
//! Names serialize to the exact strings participants register handlers
//! under, so a Rust executor can serve callers written against the host API.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! handler_names {
    (
        privileged { $($exec:ident => $exec_name:literal),+ $(,)? }
        broadcast { $($cast:ident => $cast_name:literal),+ $(,)? }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum HandlerName {
            $(
                #[serde(rename = $exec_name)]
                $exec,
            )+
            $(
                #[serde(rename = $cast_name)]
                $cast,
            )+
        }

        impl HandlerName {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$exec => $exec_name,)+
                    $(Self::$cast => $cast_name,)+
                }
            }

            /// Handlers only the privileged executor may run.
            pub fn is_privileged(&self) -> bool {
                !matches!(self, $(Self::$cast)|+)
            }
        }
    };
}

handler_names! {
    privileged {
        CreatePile => "CREATE_PILE",
        TurnIntoPile => "TURN_INTO_PILE",
        RevertFromPile => "REVERT_FROM_PILE",
        UpdatePile => "UPDATE_PILE",
        DeletePile => "DELETE_PILE",
        RefreshPile => "REFRESH_PILE",
        AddItems => "ADD_ITEMS",
        RemoveItems => "REMOVE_ITEMS",
        TransferItems => "TRANSFER_ITEMS",
        TransferAllItems => "TRANSFER_ALL_ITEMS",
        AddAttributes => "ADD_ATTRIBUTE",
        RemoveAttributes => "REMOVE_ATTRIBUTES",
        TransferAttributes => "TRANSFER_ATTRIBUTES",
        TransferAllAttributes => "TRANSFER_ALL_ATTRIBUTES",
        TransferEverything => "TRANSFER_EVERYTHING",
        DropItems => "DROP_ITEMS",
    }
    broadcast {
        UpdatedPile => "UPDATED_PILE",
        OpenInventory => "OPEN_INVENTORY",
        RerenderPileInventory => "RERENDER_PILE_INVENTORY",
        RerenderTokenHud => "RERENDER_TOKEN_HUD",
        CallHook => "CALL_HOOK",
    }
}

impl fmt::Display for HandlerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
