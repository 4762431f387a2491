//! Container state machine: open, close, lock, unlock and rattle.
//!
//! The transition is planned here against the local view, vetoed or not by
//! pre-hooks, then persisted as a pile update. Post-hooks fire on every
//! participant from the resulting `UPDATED_PILE` diff.

use serde_json::{json, Map, Value};

use itempiles_domain::{
    ContainerAction, DocumentUuid, PileData, PileDocument, Resolvable, TokenOverrides,
    TransitionPlan,
};
use itempiles_shared::{Broadcast, HandlerName, HookName, HookPayload, PileRequest, PileResponse};

use super::mutations::unexpected;
use super::{ApiError, ItemPilesApi};

impl ItemPilesApi {
    /// Returns false when the pile stayed shut (locked, vetoed or not a container).
    pub async fn open_pile(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        self.transition(target, interacting, |pile| {
            pile.plan_transition(ContainerAction::Open)
        })
        .await
    }

    pub async fn close_pile(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        self.transition(target, interacting, |pile| {
            pile.plan_transition(ContainerAction::Close)
        })
        .await
    }

    /// Locking an open pile closes it as well.
    pub async fn lock_pile(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        self.transition(target, interacting, |pile| {
            pile.plan_transition(ContainerAction::Lock)
        })
        .await
    }

    /// Unlocking leaves the pile closed.
    pub async fn unlock_pile(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        self.transition(target, interacting, |pile| {
            pile.plan_transition(ContainerAction::Unlock)
        })
        .await
    }

    pub async fn toggle_pile_closed(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        self.transition(target, interacting, PileData::plan_toggle_closed)
            .await
    }

    pub async fn toggle_pile_locked(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        self.transition(target, interacting, PileData::plan_toggle_locked)
            .await
    }

    /// Signal that a locked container will not open. Returns true when it
    /// rattled.
    pub async fn rattle_pile(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        let document = self.document(target).await?;
        let pile = document.pile_data();
        if !pile.enabled || !pile.is_container || !pile.locked {
            return Ok(false);
        }
        self.rattle(&document, interacting).await
    }

    async fn transition(
        &self,
        target: &impl Resolvable,
        interacting: Option<DocumentUuid>,
        plan: impl FnOnce(&PileData) -> TransitionPlan,
    ) -> Result<bool, ApiError> {
        let document = self.document(target).await?;
        let current = document.pile_data();
        let plan = plan(&current);
        if plan.is_noop() {
            tracing::debug!(pile = %document.uuid, "Container already in requested state");
            return Ok(false);
        }

        let (next, closing, opening, locking, unlocking) = match plan {
            TransitionPlan::NotApplicable => return Ok(false),
            TransitionPlan::Rattle => {
                self.rattle(&document, interacting).await?;
                return Ok(false);
            }
            TransitionPlan::Apply {
                next,
                closing,
                opening,
                locking,
                unlocking,
            } => (next, closing, opening, locking, unlocking),
        };

        let payload = self.payload(
            HookPayload {
                target: Some(document.uuid.clone()),
                interacting: interacting.clone(),
                ..HookPayload::default()
            },
            None,
        );
        let pre_hooks = [
            (closing, HookName::PreClose),
            (opening, HookName::PreOpen),
            (locking, HookName::PreLock),
            (unlocking, HookName::PreUnlock),
        ];
        for (flips, hook) in pre_hooks {
            if flips && self.vetoed(hook, &payload) {
                return Ok(false);
            }
        }

        let mut patch = Map::new();
        if next.closed != current.closed {
            patch.insert("closed".into(), json!(next.closed));
        }
        if next.locked != current.locked {
            patch.insert("locked".into(), json!(next.locked));
        }
        let response = self
            .privileged(
                PileRequest::UpdatePile {
                    target: document.uuid.clone(),
                    patch,
                    interacting,
                    token_overrides: TokenOverrides::default(),
                },
                None,
            )
            .await?;
        let PileResponse::Updated { diff } = response else {
            return Err(unexpected(HandlerName::UpdatePile));
        };

        // The local view may be stale; only the executor's diff says what flipped
        let flag = |key: &str| diff.get(key).and_then(Value::as_bool);
        let (closed, locked) = (flag("closed"), flag("locked"));
        if closed.is_none() && locked.is_none() {
            tracing::debug!(pile = %document.uuid, "Container changed elsewhere first");
            return Ok(false);
        }

        let sound = match closed {
            Some(true) => next.close_sound(),
            Some(false) => next.open_sound(),
            None => None,
        };
        if let Some(src) = sound {
            self.sounds.play(src);
        }
        tracing::info!(
            pile = %document.uuid,
            closed = ?closed,
            locked = ?locked,
            "Container state changed"
        );
        Ok(true)
    }

    async fn rattle(
        &self,
        document: &PileDocument,
        interacting: Option<DocumentUuid>,
    ) -> Result<bool, ApiError> {
        let payload = self.payload(
            HookPayload {
                target: Some(document.uuid.clone()),
                interacting,
                ..HookPayload::default()
            },
            None,
        );
        if self.vetoed(HookName::PreRattle, &payload) {
            return Ok(false);
        }
        if let Some(src) = document.pile.as_ref().and_then(PileData::locked_sound) {
            self.sounds.play(src);
        }
        self.rpc
            .execute_for_everyone(Broadcast::hook(HookName::Rattle, payload))
            .await?;
        tracing::debug!(pile = %document.uuid, "Locked container rattled");
        Ok(true)
    }
}
