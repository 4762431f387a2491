//! Post-commit work shared by every handler: broadcasts, macros, token
//! appearance refresh and empty-pile cleanup.

use std::sync::Arc;

use itempiles_domain::reconcile::{is_pile_empty, should_delete_pile};
use itempiles_domain::{
    AttributeAmounts, DocumentKind, DocumentUuid, ModuleSettings, PileData, PileDocument,
    TokenAppearance, TokenOverrides, TransferRecord,
};
use itempiles_shared::{Broadcast, HookName, HookPayload};

use crate::entities::Piles;
use crate::infrastructure::ports::{
    DocumentUpdate, MacroAction, MacroInvocation, MacroPort, ResolvedItem, RpcPort,
    TokenImagePort,
};

use super::{CallContext, CoordinatorError};

/// What a single macro run is about.
pub struct MacroRun<'a> {
    pub action: MacroAction,
    pub source: Option<&'a PileDocument>,
    pub target: Option<&'a PileDocument>,
    pub items: &'a [TransferRecord],
    /// Document holding the lines in `items`; the pile running the macro
    /// when unset
    pub owner: Option<&'a PileDocument>,
    pub attributes: Option<&'a AttributeAmounts>,
}

impl<'a> MacroRun<'a> {
    pub fn new(action: MacroAction) -> Self {
        Self {
            action,
            source: None,
            target: None,
            items: &[],
            owner: None,
            attributes: None,
        }
    }

    pub fn source(mut self, source: &'a PileDocument) -> Self {
        self.source = Some(source);
        self
    }

    pub fn target(mut self, target: &'a PileDocument) -> Self {
        self.target = Some(target);
        self
    }

    pub fn items(mut self, items: &'a [TransferRecord]) -> Self {
        self.items = items;
        self
    }

    pub fn attributes(mut self, attributes: &'a AttributeAmounts) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

pub struct SideEffects {
    piles: Arc<Piles>,
    rpc: Arc<dyn RpcPort>,
    macros: Arc<dyn MacroPort>,
    token_images: Arc<dyn TokenImagePort>,
}

impl SideEffects {
    pub fn new(
        piles: Arc<Piles>,
        rpc: Arc<dyn RpcPort>,
        macros: Arc<dyn MacroPort>,
        token_images: Arc<dyn TokenImagePort>,
    ) -> Self {
        Self {
            piles,
            rpc,
            macros,
            token_images,
        }
    }

    /// Send to every participant. The mutation is already committed, so a
    /// failed broadcast is only logged.
    pub async fn broadcast(&self, broadcast: Broadcast) {
        let handler = broadcast.handler();
        if let Err(e) = self.rpc.execute_for_everyone(broadcast).await {
            tracing::warn!(handler = %handler, error = %e, "Broadcast failed after commit");
        }
    }

    pub async fn call_hook(&self, hook: HookName, payload: HookPayload) {
        self.broadcast(Broadcast::hook(hook, payload)).await;
    }

    pub async fn rerender_inventory(&self, target: &DocumentUuid, deleted: bool) {
        self.broadcast(Broadcast::RerenderPileInventory {
            target: target.clone(),
            deleted,
        })
        .await;
    }

    /// Run the macro configured on `pile`, if it has one.
    pub async fn run_macro(
        &self,
        pile: &PileDocument,
        ctx: &CallContext,
        run: MacroRun<'_>,
    ) -> Result<(), CoordinatorError> {
        let Some(name) = pile.pile.as_ref().and_then(|p| p.macro_name()) else {
            return Ok(());
        };
        let owner = run.owner.unwrap_or(pile);
        let items = run
            .items
            .iter()
            .map(|record| ResolvedItem {
                uuid: owner.item_uuid(&record.item.id),
                item: record.item.clone(),
                quantity: record.quantity,
                deleted: record.deleted,
            })
            .collect();
        let invocation = MacroInvocation {
            action: run.action,
            source: run.source.cloned(),
            target: run.target.cloned(),
            items,
            attributes: run.attributes.cloned().unwrap_or_default(),
            user_id: ctx.user_id.clone(),
            interaction_id: ctx.interaction_id.clone(),
        };
        self.macros.execute(name, invocation).await?;
        Ok(())
    }

    /// Appearance for `document` once it holds `pile`, with explicit
    /// overrides on top.
    pub fn appearance_for(
        &self,
        document: &PileDocument,
        pile: &PileData,
        settings: &ModuleSettings,
        overrides: &TokenOverrides,
    ) -> TokenAppearance {
        let mut appearance = if document.kind() == DocumentKind::Token && pile.enabled {
            let attributes = pile.effective_attributes(&settings.dynamic_attributes);
            let empty = is_pile_empty(&document.items, &document.system, attributes);
            let base = TokenAppearance {
                img: document.img.clone().or_else(|| document.appearance.img.clone()),
                scale: 1.0,
            };
            self.token_images
                .resolve(pile, &document.items, &base, empty)
        } else {
            document.appearance.clone()
        };
        if let Some(img) = &overrides.img {
            appearance.img = Some(img.clone());
        }
        if let Some(scale) = overrides.scale {
            appearance.scale = scale;
        }
        appearance
    }

    /// Recompute a token pile's appearance and persist it if it changed.
    pub async fn refresh(&self, target: &DocumentUuid) -> Result<bool, CoordinatorError> {
        let Some(document) = self.piles.find(target).await? else {
            return Ok(false);
        };
        if document.kind() != DocumentKind::Token || !document.is_valid_pile() {
            return Ok(false);
        }
        let settings = self.piles.settings().await?;
        let appearance = self.appearance_for(
            &document,
            &document.pile_data(),
            &settings,
            &TokenOverrides::default(),
        );
        if appearance == document.appearance {
            return Ok(false);
        }

        self.piles
            .store()
            .update_document(target, DocumentUpdate::default().with_appearance(Some(appearance)))
            .await?;
        tracing::debug!(pile = %target, "Token appearance refreshed");
        self.broadcast(Broadcast::RerenderTokenHud {
            target: target.clone(),
        })
        .await;
        Ok(true)
    }

    /// Delete a pile that a removal emptied, or refresh it otherwise.
    /// Returns true when the pile was deleted.
    pub async fn finish_source(
        &self,
        source: &DocumentUuid,
        ctx: &CallContext,
    ) -> Result<bool, CoordinatorError> {
        let Some(document) = self.piles.find(source).await? else {
            return Ok(false);
        };
        let settings = self.piles.settings().await?;
        if !should_delete_pile(&document, &settings) {
            self.refresh(source).await?;
            return Ok(false);
        }

        self.piles.store().delete(source).await?;
        tracing::info!(pile = %source, "Empty pile deleted");
        self.call_hook(
            HookName::Delete,
            ctx.payload(HookPayload::for_target(source.clone())),
        )
        .await;
        self.rerender_inventory(source, true).await;
        Ok(true)
    }

    /// Shared tail of a standalone transfer: macros on both ends, then
    /// refresh the target and clean up the source. Cleanup happens even
    /// when a macro fails; the first macro error is returned afterwards.
    ///
    /// `run.items` are target-side records, so both macros resolve them
    /// against the target.
    pub async fn finish_transfer(
        &self,
        ctx: &CallContext,
        source: &PileDocument,
        target: &PileDocument,
        run: MacroRun<'_>,
    ) -> Result<(), CoordinatorError> {
        let mut macro_result = Ok(());
        for pile in [source, target] {
            let result = self
                .run_macro(
                    pile,
                    ctx,
                    MacroRun {
                        action: run.action,
                        source: Some(source),
                        target: Some(target),
                        items: run.items,
                        owner: Some(target),
                        attributes: run.attributes,
                    },
                )
                .await;
            if macro_result.is_ok() {
                macro_result = result;
            }
        }
        self.refresh(&target.uuid).await?;
        self.finish_source(&source.uuid, ctx).await?;
        macro_result
    }
}
