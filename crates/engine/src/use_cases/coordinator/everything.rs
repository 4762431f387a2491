//! Transfer every item and attribute in one operation.

use std::sync::Arc;

use itempiles_domain::{AttributeAmounts, DocumentUuid, TransferRecord};
use itempiles_shared::{HookName, HookPayload};

use crate::entities::Piles;
use crate::infrastructure::ports::MacroAction;

use super::attributes::TransferAllAttributes;
use super::items::TransferAllItems;
use super::side_effects::{MacroRun, SideEffects};
use super::{CallContext, CoordinatorError, Scope};

/// The inner bulk transfers run as steps; hook, macros and cleanup happen
/// once here.
pub struct TransferEverything {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
    items: Arc<TransferAllItems>,
    attributes: Arc<TransferAllAttributes>,
}

impl TransferEverything {
    pub fn new(
        piles: Arc<Piles>,
        effects: Arc<SideEffects>,
        items: Arc<TransferAllItems>,
        attributes: Arc<TransferAllAttributes>,
    ) -> Self {
        Self {
            piles,
            effects,
            items,
            attributes,
        }
    }

    pub async fn execute(
        &self,
        ctx: &CallContext,
        source: &DocumentUuid,
        target: &DocumentUuid,
        item_type_filters: Option<Vec<String>>,
    ) -> Result<(Vec<TransferRecord>, AttributeAmounts), CoordinatorError> {
        let source_doc = self.piles.get(source).await?;
        let target_doc = self.piles.get(target).await?;

        let items = self
            .items
            .execute(ctx, source, target, item_type_filters, Scope::Step)
            .await?;
        let attributes = self
            .attributes
            .execute(ctx, source, target, Scope::Step)
            .await?;
        if items.is_empty() && attributes.is_empty() {
            tracing::debug!(source = %source, "Nothing to transfer");
            return Ok((items, attributes));
        }
        tracing::info!(
            source = %source,
            target = %target,
            lines = items.len(),
            attributes = attributes.len(),
            "Everything transferred"
        );

        self.effects
            .call_hook(
                HookName::TransferEverything,
                ctx.payload(HookPayload {
                    items: items.clone(),
                    attributes: attributes.clone(),
                    ..HookPayload::between(source.clone(), target.clone())
                }),
            )
            .await;
        self.effects
            .finish_transfer(
                ctx,
                &source_doc,
                &target_doc,
                MacroRun::new(MacroAction::TransferEverything)
                    .items(&items)
                    .attributes(&attributes),
            )
            .await?;
        Ok((items, attributes))
    }
}
