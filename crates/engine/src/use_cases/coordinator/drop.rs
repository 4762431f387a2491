//! Executor side of dropping an item onto the canvas.

use std::sync::Arc;

use itempiles_domain::reconcile::carry_removed;
use itempiles_domain::{DocumentUuid, GridPosition, RemoveRequest, SceneId, TransferRecord};
use itempiles_shared::{CreatePileData, DropItemsData, HookName, HookPayload};

use crate::entities::Piles;
use crate::infrastructure::ports::MacroAction;

use super::items::{AddItems, RemoveItems};
use super::piles::CreatePile;
use super::side_effects::{MacroRun, SideEffects};
use super::{CallContext, CoordinatorError, Scope};

pub struct DropItems {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
    add: Arc<AddItems>,
    remove: Arc<RemoveItems>,
    create: Arc<CreatePile>,
}

impl DropItems {
    pub fn new(
        piles: Arc<Piles>,
        effects: Arc<SideEffects>,
        add: Arc<AddItems>,
        remove: Arc<RemoveItems>,
        create: Arc<CreatePile>,
    ) -> Self {
        Self {
            piles,
            effects,
            add,
            remove,
            create,
        }
    }

    /// Remove from the source (if any), then add to the target pile or a new
    /// pile at the drop position. Returns the receiving pile and its records.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        data: DropItemsData,
    ) -> Result<(DocumentUuid, Vec<TransferRecord>), CoordinatorError> {
        let destination = match (&data.target, data.scene.clone(), data.position) {
            (Some(target), _, _) => Destination::Existing(self.piles.get(target).await?.uuid),
            (None, Some(scene), Some(position)) => Destination::New { scene, position },
            _ => {
                return Err(CoordinatorError::InvalidRequest(
                    "drop needs a target pile or a scene position".into(),
                ))
            }
        };
        if data.item.quantity == 0 {
            return Err(CoordinatorError::InvalidRequest(
                "drop quantity must be at least 1".into(),
            ));
        }

        let carried = match &data.source {
            Some(source) => {
                let removed = self
                    .remove
                    .execute(
                        ctx,
                        source,
                        vec![RemoveRequest {
                            id: data.item.item.id.clone(),
                            quantity: Some(data.item.quantity),
                        }],
                        Scope::Step,
                    )
                    .await?;
                carry_removed(&removed)
            }
            None => vec![data.item.clone()],
        };
        if carried.is_empty() {
            return Err(CoordinatorError::InvalidRequest(format!(
                "item {} is not held by the source",
                data.item.item.id
            )));
        }

        let target = match destination {
            Destination::Existing(uuid) => uuid,
            Destination::New { scene, position } => {
                self.create
                    .execute(
                        ctx,
                        CreatePileData {
                            scene,
                            position,
                            items: Vec::new(),
                            pile_actor_name: None,
                            pile_patch: Default::default(),
                            token_overrides: Default::default(),
                        },
                    )
                    .await?
            }
        };
        let records = self.add.execute(ctx, &target, carried, Scope::Step).await?;
        tracing::info!(pile = %target, lines = records.len(), "Items dropped");

        self.effects
            .call_hook(
                HookName::Drop,
                ctx.payload(HookPayload {
                    source: data.source.clone(),
                    target: Some(target.clone()),
                    items: records.clone(),
                    ..HookPayload::default()
                }),
            )
            .await;

        let target_doc = self.piles.get(&target).await?;
        let macro_result = self
            .effects
            .run_macro(
                &target_doc,
                ctx,
                MacroRun::new(MacroAction::DropItems)
                    .target(&target_doc)
                    .items(&records),
            )
            .await;
        self.effects.refresh(&target).await?;
        if let Some(source) = &data.source {
            self.effects.finish_source(source, ctx).await?;
        }
        macro_result?;
        Ok((target, records))
    }
}

enum Destination {
    Existing(DocumentUuid),
    New {
        scene: SceneId,
        position: GridPosition,
    },
}
