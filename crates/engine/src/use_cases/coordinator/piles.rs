//! Pile lifecycle: create, convert, update and delete.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use itempiles_domain::reconcile::plan_add_items;
use itempiles_domain::{
    merge_object, shallow_diff, DocumentKind, DocumentUuid, ModuleSettings, PileData,
    PileDocument, Resolvable, TokenAppearance, TokenId, TokenOverrides,
};
use itempiles_shared::{Broadcast, CreatePileData, HookName, HookPayload};

use crate::entities::Piles;
use crate::infrastructure::ports::{DocumentUpdate, MacroAction, NewActor, NewToken};

use super::side_effects::{MacroRun, SideEffects};
use super::{CallContext, CoordinatorError};

/// Name given to the provisioned template actor.
pub const DEFAULT_PILE_ACTOR_NAME: &str = "Default Item Pile";

/// Merge a camelCase pile patch over existing pile data.
fn apply_patch(pile: &PileData, patch: &Map<String, Value>) -> Result<PileData, CoordinatorError> {
    if patch.is_empty() {
        return Ok(pile.clone());
    }
    let base = serde_json::to_value(pile)
        .map_err(|e| CoordinatorError::InvalidPileData(e.to_string()))?;
    let merged = merge_object(&base, &Value::Object(patch.clone()));
    serde_json::from_value(merged).map_err(|e| CoordinatorError::InvalidPileData(e.to_string()))
}

fn pile_value(pile: &PileData) -> Result<Value, CoordinatorError> {
    serde_json::to_value(pile).map_err(|e| CoordinatorError::InvalidPileData(e.to_string()))
}

// =============================================================================
// Create
// =============================================================================

/// Spawn a new pile token from a template actor.
pub struct CreatePile {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl CreatePile {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    pub async fn execute(
        &self,
        ctx: &CallContext,
        data: CreatePileData,
    ) -> Result<DocumentUuid, CoordinatorError> {
        let mut settings = self.piles.settings().await?;
        let actor = match &data.pile_actor_name {
            Some(name) => self
                .piles
                .store()
                .find_actor_by_name(name)
                .await?
                .ok_or_else(|| CoordinatorError::PileActorNotFound(name.clone()))?,
            None => self.default_actor(&mut settings).await?,
        };
        let actor_id = actor
            .actor_id
            .clone()
            .or_else(|| actor.uuid.to_actor_ref())
            .ok_or_else(|| CoordinatorError::InvalidRequest(format!("{} is not an actor", actor.uuid)))?;

        let mut pile = apply_patch(&actor.pile_data(), &data.pile_patch)?;
        pile.enabled = true;
        let pile = pile.normalized();

        let schema = settings.item_schema();
        let items = plan_add_items(&[], &data.items, &schema).creates;

        // Appearance is resolved against what the token will hold
        let placeholder =
            TokenId::new("pending").map_err(|e| CoordinatorError::InvalidRequest(e.to_string()))?;
        let preview = PileDocument {
            uuid: DocumentUuid::for_token(&data.scene, &placeholder),
            items: items.clone(),
            position: Some(data.position),
            ..actor.clone()
        };
        let appearance = if actor.actor_link {
            let mut appearance = actor.appearance.clone();
            if let Some(img) = &data.token_overrides.img {
                appearance.img = Some(img.clone());
            }
            if let Some(scale) = data.token_overrides.scale {
                appearance.scale = scale;
            }
            appearance
        } else {
            self.effects
                .appearance_for(&preview, &pile, &settings, &data.token_overrides)
        };

        let token = self
            .piles
            .store()
            .create_token(NewToken {
                scene: data.scene.clone(),
                actor: actor_id,
                name: data
                    .token_overrides
                    .name
                    .clone()
                    .unwrap_or_else(|| actor.name.clone()),
                img: actor.img.clone(),
                position: data.position,
                appearance,
                actor_link: actor.actor_link,
                pile,
                items,
                system: actor.system.clone(),
            })
            .await?;
        tracing::info!(pile = %token.uuid, scene = %data.scene, "Pile created");

        self.effects
            .call_hook(
                HookName::Create,
                ctx.payload(HookPayload::for_target(token.uuid.clone())),
            )
            .await;
        self.effects
            .run_macro(
                &token,
                ctx,
                MacroRun::new(MacroAction::CreatePile).target(&token),
            )
            .await?;
        Ok(token.uuid)
    }

    /// The template actor, provisioned on first use and remembered in
    /// settings. The executor runs one call at a time, so this cannot race.
    async fn default_actor(
        &self,
        settings: &mut ModuleSettings,
    ) -> Result<PileDocument, CoordinatorError> {
        if let Some(id) = &settings.default_pile_actor {
            let uuid = DocumentUuid::for_actor(id);
            match self.piles.find(&uuid).await? {
                Some(actor) => return Ok(actor),
                None => tracing::warn!(actor = %uuid, "Default pile actor missing, provisioning again"),
            }
        }

        let actor = self
            .piles
            .store()
            .create_actor(NewActor {
                name: DEFAULT_PILE_ACTOR_NAME.to_string(),
                actor_type: settings.actor_class_type.clone(),
                img: None,
                pile: PileData::spawned_defaults(),
            })
            .await?;
        settings.default_pile_actor = actor.uuid.to_actor_ref().or_else(|| actor.actor_id.clone());
        self.piles.save_settings(settings).await?;
        tracing::info!(actor = %actor.uuid, "Default pile actor provisioned");
        Ok(actor)
    }
}

// =============================================================================
// Convert
// =============================================================================

/// Enable pile data on existing documents.
pub struct TurnIntoPile {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl TurnIntoPile {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    pub async fn execute(
        &self,
        ctx: &CallContext,
        targets: Vec<DocumentUuid>,
        pile_patch: Map<String, Value>,
        token_overrides: TokenOverrides,
    ) -> Result<Vec<DocumentUuid>, CoordinatorError> {
        let settings = self.piles.settings().await?;
        let mut converted = Vec::with_capacity(targets.len());
        for target in targets {
            let document = self.piles.get(&target).await?;
            let mut pile = apply_patch(&document.pile_data(), &pile_patch)?;
            pile.enabled = true;
            let pile = pile.normalized();
            let appearance =
                self.effects
                    .appearance_for(&document, &pile, &settings, &token_overrides);
            write_pile(&self.piles, &document, pile, appearance, &token_overrides).await?;
            converted.push(target);
        }
        tracing::info!(count = converted.len(), "Documents turned into piles");

        self.effects
            .call_hook(
                HookName::TurnInto,
                ctx.payload(HookPayload {
                    targets: converted.clone(),
                    ..HookPayload::default()
                }),
            )
            .await;
        for target in &converted {
            self.effects
                .broadcast(Broadcast::RerenderTokenHud {
                    target: target.clone(),
                })
                .await;
        }
        Ok(converted)
    }
}

/// Disable pile data, leaving the rest of the flag in place.
pub struct RevertFromPile {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl RevertFromPile {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    pub async fn execute(
        &self,
        ctx: &CallContext,
        targets: Vec<DocumentUuid>,
        token_overrides: TokenOverrides,
    ) -> Result<Vec<DocumentUuid>, CoordinatorError> {
        let settings = self.piles.settings().await?;
        let mut reverted = Vec::with_capacity(targets.len());
        for target in targets {
            let document = self.piles.get(&target).await?;
            let pile = PileData {
                enabled: false,
                ..document.pile_data()
            };
            let appearance =
                self.effects
                    .appearance_for(&document, &pile, &settings, &token_overrides);
            write_pile(&self.piles, &document, pile, appearance, &token_overrides).await?;
            reverted.push(target);
        }
        tracing::info!(count = reverted.len(), "Documents reverted from piles");

        self.effects
            .call_hook(
                HookName::RevertFrom,
                ctx.payload(HookPayload {
                    targets: reverted.clone(),
                    ..HookPayload::default()
                }),
            )
            .await;
        for target in &reverted {
            self.effects
                .broadcast(Broadcast::RerenderTokenHud {
                    target: target.clone(),
                })
                .await;
        }
        Ok(reverted)
    }
}

async fn write_pile(
    piles: &Piles,
    document: &PileDocument,
    pile: PileData,
    appearance: TokenAppearance,
    overrides: &TokenOverrides,
) -> Result<(), CoordinatorError> {
    let appearance = (appearance != document.appearance).then_some(appearance);
    piles
        .store()
        .update_document(
            &document.uuid,
            DocumentUpdate::pile(pile)
                .with_appearance(appearance)
                .with_name(overrides.name.clone()),
        )
        .await?;
    Ok(())
}

// =============================================================================
// Update
// =============================================================================

/// Merge a patch into a pile's data and tell everyone what changed.
pub struct UpdatePile {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
    coalesce: Duration,
}

impl UpdatePile {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>, coalesce: Duration) -> Self {
        Self {
            piles,
            effects,
            coalesce,
        }
    }

    /// Returns the changed keys with their new values.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        target: &DocumentUuid,
        patch: Map<String, Value>,
        interacting: Option<DocumentUuid>,
        token_overrides: TokenOverrides,
    ) -> Result<Map<String, Value>, CoordinatorError> {
        let document = self.piles.get(target).await?;
        let settings = self.piles.settings().await?;

        let current = document.pile_data();
        let next = apply_patch(&current, &patch)?.normalized();
        let diff = shallow_diff(&pile_value(&current)?, &pile_value(&next)?);

        // Fixed delay before persisting; calls are serialized, so nothing is merged here
        if !self.coalesce.is_zero() {
            tokio::time::sleep(self.coalesce).await;
        }

        let restyle = document.kind() == DocumentKind::Token
            || token_overrides.img.is_some()
            || token_overrides.scale.is_some();
        let appearance = restyle
            .then(|| {
                self.effects
                    .appearance_for(&document, &next, &settings, &token_overrides)
            })
            .filter(|a| a != &document.appearance);
        self.piles
            .store()
            .update_document(
                target,
                DocumentUpdate::pile(next.clone())
                    .with_appearance(appearance)
                    .with_name(token_overrides.name.clone()),
            )
            .await?;
        tracing::info!(pile = %target, changed = diff.len(), "Pile updated");

        let updated = PileDocument {
            pile: Some(next),
            ..document
        };
        let mut macro_result = Ok(());
        for action in container_macros(&diff) {
            let result = self
                .effects
                .run_macro(&updated, ctx, MacroRun::new(action).target(&updated))
                .await;
            if macro_result.is_ok() {
                macro_result = result;
            }
        }

        self.effects
            .broadcast(Broadcast::UpdatedPile {
                target: target.clone(),
                diff: diff.clone(),
                interacting,
            })
            .await;
        self.effects
            .broadcast(Broadcast::RerenderTokenHud {
                target: target.clone(),
            })
            .await;
        macro_result?;
        Ok(diff)
    }
}

/// One macro per container flag flip, in close, open, lock, unlock order.
fn container_macros(diff: &Map<String, Value>) -> Vec<MacroAction> {
    let closed = diff.get("closed").and_then(Value::as_bool);
    let locked = diff.get("locked").and_then(Value::as_bool);
    [
        (closed == Some(true), MacroAction::ClosePile),
        (closed == Some(false), MacroAction::OpenPile),
        (locked == Some(true), MacroAction::LockPile),
        (locked == Some(false), MacroAction::UnlockPile),
    ]
    .into_iter()
    .filter_map(|(flipped, action)| flipped.then_some(action))
    .collect()
}

// =============================================================================
// Delete / Refresh
// =============================================================================

pub struct DeletePile {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl DeletePile {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    pub async fn execute(
        &self,
        ctx: &CallContext,
        target: &DocumentUuid,
    ) -> Result<(), CoordinatorError> {
        let document = self.piles.get(target).await?;
        if !document.is_valid_pile() {
            return Err(CoordinatorError::NotAPile(target.clone()));
        }
        self.piles.store().delete(target).await?;
        tracing::info!(pile = %target, "Pile deleted");

        self.effects
            .call_hook(
                HookName::Delete,
                ctx.payload(HookPayload::for_target(target.clone())),
            )
            .await;
        self.effects.rerender_inventory(target, true).await;
        Ok(())
    }
}

pub struct RefreshPile {
    effects: Arc<SideEffects>,
}

impl RefreshPile {
    pub fn new(effects: Arc<SideEffects>) -> Self {
        Self { effects }
    }

    /// Returns true when the token's appearance changed.
    pub async fn execute(&self, target: &DocumentUuid) -> Result<bool, CoordinatorError> {
        self.effects.refresh(target).await
    }
}
