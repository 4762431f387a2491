//! External collaborator port traits (RPC, hooks, macros, presentation).

use async_trait::async_trait;

use itempiles_domain::{DocumentUuid, Item, PileData, TokenAppearance, UserId};
use itempiles_shared::{
    Broadcast, HookName, HookPayload, PileResponse, PrivilegedCall, ResponseResult,
};

use super::error::{MacroError, RpcError};
use super::types::{DropChoice, DropPrompt, MacroInvocation};

// =============================================================================
// Remote Procedure Dispatch
// =============================================================================

/// Leader-routed dispatch: mutations go to the single privileged executor,
/// notifications fan out to participants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcPort: Send + Sync {
    async fn execute_as_privileged(&self, call: PrivilegedCall) -> Result<PileResponse, RpcError>;
    async fn execute_for_everyone(&self, broadcast: Broadcast) -> Result<(), RpcError>;
    async fn execute_for_participants(
        &self,
        participants: &[UserId],
        broadcast: Broadcast,
    ) -> Result<(), RpcError>;
}

/// The executor side of [`RpcPort::execute_as_privileged`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcHandler: Send + Sync {
    async fn handle(&self, call: PrivilegedCall) -> ResponseResult;
}

// =============================================================================
// Hooks
// =============================================================================

/// A listener's answer to a cancelable pre-event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Proceed,
    Veto,
}

impl Outcome {
    pub fn is_veto(&self) -> bool {
        matches!(self, Self::Veto)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait HookPort: Send + Sync {
    /// Run listeners in registration order; the first veto wins.
    fn call_pre(&self, hook: HookName, payload: &HookPayload) -> Outcome;

    /// Notify every listener of a post-event.
    fn call(&self, hook: HookName, payload: &HookPayload);
}

// =============================================================================
// Macros
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MacroPort: Send + Sync {
    async fn execute(&self, name: &str, invocation: MacroInvocation) -> Result<(), MacroError>;
}

// =============================================================================
// Presentation
// =============================================================================

/// Picks the token image and scale that reflect a pile's state.
#[cfg_attr(test, mockall::automock)]
pub trait TokenImagePort: Send + Sync {
    fn resolve(
        &self,
        pile: &PileData,
        items: &[Item],
        base: &TokenAppearance,
        is_empty: bool,
    ) -> TokenAppearance;
}

#[cfg_attr(test, mockall::automock)]
pub trait SoundPort: Send + Sync {
    /// Play a sound for every participant.
    fn play(&self, src: &str);
}

/// Non-blocking messages shown to the local user.
#[cfg_attr(test, mockall::automock)]
pub trait NotifyPort: Send + Sync {
    fn warn(&self, message: &str);
}

/// Interactive questions asked while resolving a drop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DropPromptPort: Send + Sync {
    /// GM override for an item type piles normally refuse.
    async fn confirm_disallowed_item(&self, item: &Item) -> bool;

    /// `None` when the user cancels.
    async fn choose_drop(&self, prompt: DropPrompt) -> Option<DropChoice>;
}

/// Participant-side inventory and HUD views.
#[cfg_attr(test, mockall::automock)]
pub trait InventoryUiPort: Send + Sync {
    fn rerender_inventory(&self, target: &DocumentUuid, deleted: bool);
    fn rerender_token_hud(&self, target: &DocumentUuid);
    fn open_inventory(&self, target: &DocumentUuid, inspecting: Option<DocumentUuid>);
}
