//! API layer - the caller-facing contract.
//!
//! Every participant holds an [`ItemPilesApi`]. It validates input against
//! the participant's local view, runs cancelable pre-hooks, then forwards the
//! mutation to the privileged executor. [`Participant`] is the other half:
//! it reacts to the executor's broadcasts.

mod container;
mod drop;
mod error;
mod interaction;
mod mutations;
mod participant;
pub mod validation;

use std::sync::Arc;

use itempiles_domain::{
    DocumentUuid, InteractionId, ItemSchema, PileDocument, Resolvable, UserId,
};
use itempiles_shared::{
    Broadcast, HookName, HookPayload, PileRequest, PileResponse, PrivilegedCall,
};

use crate::entities::Piles;
use crate::infrastructure::ports::{
    DropPromptPort, HookPort, InventoryUiPort, NotifyPort, RpcPort, SoundPort,
};

pub use drop::{DropContext, DropRequest};
pub use error::{ApiError, ValidationError};
pub use interaction::{ClickContext, ClickOutcome};
pub use participant::Participant;

/// Who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub is_gm: bool,
}

/// Public entry points of the pile system for one participant.
pub struct ItemPilesApi {
    session: Session,
    piles: Arc<Piles>,
    rpc: Arc<dyn RpcPort>,
    hooks: Arc<dyn HookPort>,
    sounds: Arc<dyn SoundPort>,
    notify: Arc<dyn NotifyPort>,
    prompts: Arc<dyn DropPromptPort>,
    ui: Arc<dyn InventoryUiPort>,
}

impl ItemPilesApi {
    pub fn new(
        session: Session,
        piles: Arc<Piles>,
        rpc: Arc<dyn RpcPort>,
        hooks: Arc<dyn HookPort>,
        sounds: Arc<dyn SoundPort>,
        notify: Arc<dyn NotifyPort>,
        prompts: Arc<dyn DropPromptPort>,
        ui: Arc<dyn InventoryUiPort>,
    ) -> Self {
        Self {
            session,
            piles,
            rpc,
            hooks,
            sounds,
            notify,
            prompts,
            ui,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Show a pile's inventory to the given participants.
    pub async fn render_pile_interface(
        &self,
        target: &impl Resolvable,
        user_ids: &[UserId],
        inspecting: Option<DocumentUuid>,
    ) -> Result<(), ApiError> {
        let document = self.document(target).await?;
        validation::require_pile(&document)?;
        self.rpc
            .execute_for_participants(
                user_ids,
                Broadcast::OpenInventory {
                    target: document.uuid,
                    inspecting,
                },
            )
            .await?;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn document(&self, target: &impl Resolvable) -> Result<PileDocument, ApiError> {
        let uuid = target.to_uuid();
        self.piles
            .find(&uuid)
            .await?
            .ok_or_else(|| ValidationError::DocumentNotFound(uuid).into())
    }

    async fn schema(&self) -> Result<ItemSchema, ApiError> {
        Ok(self.piles.settings().await?.item_schema())
    }

    fn payload(&self, payload: HookPayload, interaction_id: Option<&InteractionId>) -> HookPayload {
        payload.by(self.session.user_id.clone(), interaction_id.cloned())
    }

    /// Run a cancelable pre-hook. Returns true when a listener vetoed.
    fn vetoed(&self, hook: HookName, payload: &HookPayload) -> bool {
        let vetoed = self.hooks.call_pre(hook, payload).is_veto();
        if vetoed {
            tracing::debug!(hook = %hook, user_id = %self.session.user_id, "Operation vetoed");
        }
        vetoed
    }

    async fn privileged(
        &self,
        request: PileRequest,
        interaction_id: Option<InteractionId>,
    ) -> Result<PileResponse, ApiError> {
        let call = PrivilegedCall::new(self.session.user_id.clone(), interaction_id, request);
        Ok(self.rpc.execute_as_privileged(call).await?)
    }
}
