//! Dropping an item onto the scene or onto a pile.
//!
//! Everything that needs the user (type filter override, range and lock
//! refusals, quantity and intent) is resolved here. Only the final
//! `DROP_ITEMS` request reaches the executor.

use serde_json::{json, Map};

use itempiles_domain::{
    DocumentUuid, GridPosition, InteractionId, Item, ItemDelta, PileDocument, SceneId,
    TransferRecord,
};
use itempiles_shared::{DropItemsData, HandlerName, HookName, HookPayload, PileRequest, PileResponse};

use crate::infrastructure::ports::{DropChoice, DropPrompt};

use super::mutations::unexpected;
use super::validation::{require_pile, validate_stack};
use super::{ApiError, ItemPilesApi, ValidationError};

/// An item let go over the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DropRequest {
    /// Actor the item is dragged from; `None` for items no character holds
    pub source: Option<DocumentUuid>,
    pub item: Item,
    /// Pile under the drop point
    pub target: Option<DocumentUuid>,
    pub scene: Option<SceneId>,
    pub position: Option<GridPosition>,
    pub interaction_id: Option<InteractionId>,
}

/// Input state at the moment of the drop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropContext {
    /// Skips the prompt: one unit onto the pile under the cursor
    pub modifier_held: bool,
    /// Token of the dropping actor, used for the range check
    pub dropping_token: Option<DocumentUuid>,
}

impl ItemPilesApi {
    /// Returns the receiving pile and the lines it gained, or `None` when the
    /// drop was refused, cancelled or vetoed.
    pub async fn drop_item(
        &self,
        request: DropRequest,
        ctx: DropContext,
    ) -> Result<Option<(DocumentUuid, Vec<TransferRecord>)>, ApiError> {
        if request.source.is_none() && !self.session.is_gm {
            self.notify
                .warn("Only a GM can drop items that no character is carrying");
            return Ok(None);
        }

        let settings = self.piles.settings().await?;
        let schema = settings.item_schema();

        let (item, max_quantity) = match &request.source {
            Some(source) => {
                let holder = self.document(source).await?;
                let line = holder.item(&request.item.id).cloned().ok_or_else(|| {
                    ValidationError::MissingItem {
                        target: holder.uuid.clone(),
                        id: request.item.id.clone(),
                    }
                })?;
                validate_stack(&line, &schema)?;
                let held = schema.quantity(&line);
                (line, held)
            }
            None => {
                let quantity = schema.quantity(&request.item);
                (request.item.clone(), quantity)
            }
        };
        if max_quantity == 0 {
            return Err(ValidationError::ZeroQuantity(item.name).into());
        }

        let target = match &request.target {
            Some(uuid) => {
                let document = self.document(uuid).await?;
                require_pile(&document)?;
                Some(document)
            }
            None => None,
        };
        if target.is_none() && (request.scene.is_none() || request.position.is_none()) {
            return Err(ValidationError::NoDropLocation.into());
        }

        let filters = match &target {
            Some(pile) => pile
                .pile_data()
                .effective_filters(&settings.item_type_filters)
                .to_vec(),
            None => settings.item_type_filters.clone(),
        };
        if schema.is_filtered(&item, &filters) {
            if !self.session.is_gm {
                self.notify.warn("Item piles do not accept that type of item");
                return Ok(None);
            }
            if !self.prompts.confirm_disallowed_item(&item).await {
                return Ok(None);
            }
        }

        if let Some(pile) = &target {
            if !self.session.is_gm && self.refused(pile, &ctx).await? {
                return Ok(None);
            }
        }

        let interaction_id = request.interaction_id.clone();
        let mut location = Map::new();
        if let Some(position) = request.position {
            location.insert("position".into(), json!(position));
        }
        let determined = self.payload(
            HookPayload {
                source: request.source.clone(),
                target: request.target.clone(),
                adding: vec![ItemDelta {
                    item: item.clone(),
                    quantity: max_quantity,
                }],
                data: location.clone(),
                ..HookPayload::default()
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreDropDetermined, &determined) {
            return Ok(None);
        }

        let choice = if ctx.modifier_held {
            DropChoice {
                quantity: 1,
                new_pile: false,
            }
        } else {
            let prompt = DropPrompt {
                item: item.clone(),
                max_quantity,
                target: request.target.clone(),
            };
            match self.prompts.choose_drop(prompt).await {
                Some(choice) => choice,
                None => return Ok(None),
            }
        };
        let quantity = choice.quantity.min(max_quantity);
        if quantity == 0 {
            return Ok(None);
        }
        let destination = if choice.new_pile {
            None
        } else {
            request.target.clone()
        };
        if destination.is_none() && (request.scene.is_none() || request.position.is_none()) {
            return Err(ValidationError::NoDropLocation.into());
        }

        let delta = ItemDelta { item, quantity };
        let payload = self.payload(
            HookPayload {
                source: request.source.clone(),
                target: destination.clone(),
                adding: vec![delta.clone()],
                data: location,
                ..HookPayload::default()
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreDrop, &payload) {
            return Ok(None);
        }

        let response = self
            .privileged(
                PileRequest::DropItems(DropItemsData {
                    source: request.source,
                    target: destination,
                    scene: request.scene,
                    position: request.position,
                    item: delta,
                }),
                interaction_id,
            )
            .await?;
        match response {
            PileResponse::Dropped { target, records } => Ok(Some((target, records))),
            _ => Err(unexpected(HandlerName::DropItems)),
        }
    }

    /// Warns and returns true when a player may not drop onto `pile`.
    async fn refused(&self, pile: &PileDocument, ctx: &DropContext) -> Result<bool, ApiError> {
        let data = pile.pile_data();
        if let Some(at) = pile.position {
            let from = match &ctx.dropping_token {
                Some(token) => self.piles.find(token).await?.and_then(|t| t.position),
                None => None,
            };
            let in_range = from.is_some_and(|from| data.distance.allows(at.distance_to(&from)));
            if !in_range {
                self.notify
                    .warn("You are too far away to drop items on that pile");
                return Ok(true);
            }
        }
        if data.is_container && data.locked {
            self.notify.warn("That pile is locked");
            return Ok(true);
        }
        Ok(false)
    }
}
