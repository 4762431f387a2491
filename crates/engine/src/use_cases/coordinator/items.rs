//! Item mutations: add, remove and transfer.

use std::sync::Arc;

use itempiles_domain::reconcile::{
    carry_removed, filter_transferable_items, plan_add_items, plan_remove_items,
    remove_all_requests,
};
use itempiles_domain::{DocumentUuid, ItemDelta, RemoveRequest, TransferRecord};
use itempiles_shared::{HookName, HookPayload};

use crate::entities::Piles;
use crate::infrastructure::ports::MacroAction;

use super::side_effects::{MacroRun, SideEffects};
use super::{CallContext, CoordinatorError, Scope};

/// Add item stacks to a document, merging into equivalent lines.
pub struct AddItems {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl AddItems {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    /// Returns one record per resulting line with the amount added.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        target: &DocumentUuid,
        items: Vec<ItemDelta>,
        scope: Scope,
    ) -> Result<Vec<TransferRecord>, CoordinatorError> {
        let document = self.piles.get(target).await?;
        let schema = self.piles.settings().await?.item_schema();

        let plan = plan_add_items(&document.items, &items, &schema);
        if plan.is_empty() {
            tracing::debug!(pile = %target, "Nothing to add");
            return Ok(Vec::new());
        }
        let records = self.piles.apply_add(&document, plan, &schema).await?;
        tracing::info!(pile = %target, lines = records.len(), "Items added");

        self.effects
            .call_hook(
                HookName::AddItems,
                ctx.payload(HookPayload {
                    target: Some(target.clone()),
                    items: records.clone(),
                    ..HookPayload::default()
                }),
            )
            .await;
        self.effects.rerender_inventory(target, false).await;

        if scope.is_standalone() {
            let macro_result = self
                .effects
                .run_macro(
                    &document,
                    ctx,
                    MacroRun::new(MacroAction::AddItems)
                        .target(&document)
                        .items(&records),
                )
                .await;
            self.effects.refresh(target).await?;
            macro_result?;
        }
        Ok(records)
    }
}

/// Remove units from a document's lines, never below zero.
pub struct RemoveItems {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl RemoveItems {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    /// Returns one record per touched line with the amount actually removed.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        target: &DocumentUuid,
        items: Vec<RemoveRequest>,
        scope: Scope,
    ) -> Result<Vec<TransferRecord>, CoordinatorError> {
        let document = self.piles.get(target).await?;
        let schema = self.piles.settings().await?.item_schema();

        let plan = plan_remove_items(&document.items, &items, &schema);
        for id in &plan.skipped {
            tracing::warn!(pile = %target, item_id = %id, "Item to remove not found, skipped");
        }
        if plan.is_empty() {
            tracing::debug!(pile = %target, "Nothing to remove");
            return Ok(Vec::new());
        }
        self.piles.apply_remove(&document, &plan, &schema).await?;
        let records = plan.records;
        tracing::info!(pile = %target, lines = records.len(), "Items removed");

        self.effects
            .call_hook(
                HookName::RemoveItems,
                ctx.payload(HookPayload {
                    target: Some(target.clone()),
                    items: records.clone(),
                    ..HookPayload::default()
                }),
            )
            .await;
        self.effects.rerender_inventory(target, false).await;

        if scope.is_standalone() {
            let macro_result = self
                .effects
                .run_macro(
                    &document,
                    ctx,
                    MacroRun::new(MacroAction::RemoveItems)
                        .target(&document)
                        .items(&records),
                )
                .await;
            self.effects.finish_source(target, ctx).await?;
            macro_result?;
        }
        Ok(records)
    }
}

/// Move item units from one document to another.
///
/// The target receives exactly what the source confirmed as removed.
pub struct TransferItems {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
    add: Arc<AddItems>,
    remove: Arc<RemoveItems>,
}

impl TransferItems {
    pub fn new(
        piles: Arc<Piles>,
        effects: Arc<SideEffects>,
        add: Arc<AddItems>,
        remove: Arc<RemoveItems>,
    ) -> Self {
        Self {
            piles,
            effects,
            add,
            remove,
        }
    }

    /// Returns the target-side records, so their ids are the target's lines.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        source: &DocumentUuid,
        target: &DocumentUuid,
        items: Vec<RemoveRequest>,
    ) -> Result<Vec<TransferRecord>, CoordinatorError> {
        let source_doc = self.piles.get(source).await?;
        let target_doc = self.piles.get(target).await?;

        let added = self
            .move_lines(ctx, source, target, items)
            .await?;
        if added.is_empty() {
            return Ok(added);
        }
        tracing::info!(source = %source, target = %target, lines = added.len(), "Items transferred");

        self.effects
            .call_hook(
                HookName::TransferItems,
                ctx.payload(HookPayload {
                    items: added.clone(),
                    ..HookPayload::between(source.clone(), target.clone())
                }),
            )
            .await;
        self.effects
            .finish_transfer(
                ctx,
                &source_doc,
                &target_doc,
                MacroRun::new(MacroAction::TransferItems).items(&added),
            )
            .await?;
        Ok(added)
    }

    /// Remove then add, both as transfer steps.
    pub(super) async fn move_lines(
        &self,
        ctx: &CallContext,
        source: &DocumentUuid,
        target: &DocumentUuid,
        items: Vec<RemoveRequest>,
    ) -> Result<Vec<TransferRecord>, CoordinatorError> {
        let removed = self.remove.execute(ctx, source, items, Scope::Step).await?;
        if removed.is_empty() {
            return Ok(Vec::new());
        }
        self.add
            .execute(ctx, target, carry_removed(&removed), Scope::Step)
            .await
    }
}

/// Move every unfiltered line from one document to another.
pub struct TransferAllItems {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
    transfer: Arc<TransferItems>,
}

impl TransferAllItems {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>, transfer: Arc<TransferItems>) -> Self {
        Self {
            piles,
            effects,
            transfer,
        }
    }

    /// `item_type_filters` overrides the source pile's filters (or the global
    /// ones) when given.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        source: &DocumentUuid,
        target: &DocumentUuid,
        item_type_filters: Option<Vec<String>>,
        scope: Scope,
    ) -> Result<Vec<TransferRecord>, CoordinatorError> {
        let source_doc = self.piles.get(source).await?;
        let target_doc = self.piles.get(target).await?;
        let settings = self.piles.settings().await?;
        let schema = settings.item_schema();

        let filters = item_type_filters.unwrap_or_else(|| {
            source_doc
                .pile_data()
                .effective_filters(&settings.item_type_filters)
                .to_vec()
        });
        let lines = filter_transferable_items(&source_doc.items, &filters, &schema);
        if lines.is_empty() {
            tracing::debug!(source = %source, "No transferable items");
            return Ok(Vec::new());
        }

        let added = self
            .transfer
            .move_lines(ctx, source, target, remove_all_requests(&lines))
            .await?;
        tracing::info!(source = %source, target = %target, lines = added.len(), "All items transferred");

        if scope.is_standalone() && !added.is_empty() {
            self.effects
                .call_hook(
                    HookName::TransferAllItems,
                    ctx.payload(HookPayload {
                        items: added.clone(),
                        ..HookPayload::between(source.clone(), target.clone())
                    }),
                )
                .await;
            self.effects
                .finish_transfer(
                    ctx,
                    &source_doc,
                    &target_doc,
                    MacroRun::new(MacroAction::TransferAllItems).items(&added),
                )
                .await?;
        }
        Ok(added)
    }
}
