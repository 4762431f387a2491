//! Privileged executor.
//!
//! Every mutation of pile state runs here, one call at a time, in arrival
//! order. Each handler reads fresh document state, computes a plan with the
//! reconciliation functions, persists it, then fans out hooks, re-render
//! broadcasts and macros.

mod attributes;
mod drop;
mod error;
mod everything;
mod items;
mod piles;
mod side_effects;

#[cfg(test)]
mod scenarios;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use itempiles_domain::{InteractionId, UserId};
use itempiles_shared::{HookPayload, PileRequest, PileResponse, PrivilegedCall, ResponseResult};

use crate::entities::Piles;
use crate::infrastructure::ports::RpcHandler;

pub use attributes::{AddAttributes, RemoveAttributes, TransferAllAttributes, TransferAttributes};
pub use drop::DropItems;
pub use error::CoordinatorError;
pub use everything::TransferEverything;
pub use items::{AddItems, RemoveItems, TransferAllItems, TransferItems};
pub use piles::{
    CreatePile, DeletePile, RefreshPile, RevertFromPile, TurnIntoPile, UpdatePile,
    DEFAULT_PILE_ACTOR_NAME,
};
pub use side_effects::{MacroRun, SideEffects};

/// Default window UPDATE_PILE waits before persisting.
pub const DEFAULT_COALESCE: Duration = Duration::from_millis(15);

// =============================================================================
// Call Context
// =============================================================================

/// Who a privileged call runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub user_id: UserId,
    pub interaction_id: Option<InteractionId>,
}

impl CallContext {
    pub fn new(user_id: UserId, interaction_id: Option<InteractionId>) -> Self {
        Self {
            user_id,
            interaction_id,
        }
    }

    pub fn from_call(call: &PrivilegedCall) -> Self {
        Self::new(call.user_id.clone(), call.interaction_id.clone())
    }

    /// Stamp a hook payload with the caller.
    pub fn payload(&self, payload: HookPayload) -> HookPayload {
        payload.by(self.user_id.clone(), self.interaction_id.clone())
    }
}

/// Whether a handler runs as its own operation or as a step of a larger one.
///
/// Steps persist and fire their own hook, but leave macros, source cleanup
/// and (for bulk transfers) the summary hook to the enclosing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Standalone,
    Step,
}

impl Scope {
    pub fn is_standalone(self) -> bool {
        matches!(self, Scope::Standalone)
    }
}

// =============================================================================
// Coordinator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// How long UPDATE_PILE waits before persisting
    pub coalesce: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            coalesce: DEFAULT_COALESCE,
        }
    }
}

/// Handler table of the privileged executor.
pub struct Coordinator {
    pub create_pile: Arc<CreatePile>,
    pub turn_into_pile: Arc<TurnIntoPile>,
    pub revert_from_pile: Arc<RevertFromPile>,
    pub update_pile: Arc<UpdatePile>,
    pub delete_pile: Arc<DeletePile>,
    pub refresh_pile: Arc<RefreshPile>,
    pub add_items: Arc<AddItems>,
    pub remove_items: Arc<RemoveItems>,
    pub transfer_items: Arc<TransferItems>,
    pub transfer_all_items: Arc<TransferAllItems>,
    pub add_attributes: Arc<AddAttributes>,
    pub remove_attributes: Arc<RemoveAttributes>,
    pub transfer_attributes: Arc<TransferAttributes>,
    pub transfer_all_attributes: Arc<TransferAllAttributes>,
    pub transfer_everything: Arc<TransferEverything>,
    pub drop_items: Arc<DropItems>,
}

impl Coordinator {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>, config: CoordinatorConfig) -> Self {
        let create_pile = Arc::new(CreatePile::new(piles.clone(), effects.clone()));
        let add_items = Arc::new(AddItems::new(piles.clone(), effects.clone()));
        let remove_items = Arc::new(RemoveItems::new(piles.clone(), effects.clone()));
        let transfer_items = Arc::new(TransferItems::new(
            piles.clone(),
            effects.clone(),
            add_items.clone(),
            remove_items.clone(),
        ));
        let transfer_all_items = Arc::new(TransferAllItems::new(
            piles.clone(),
            effects.clone(),
            transfer_items.clone(),
        ));
        let add_attributes = Arc::new(AddAttributes::new(piles.clone(), effects.clone()));
        let remove_attributes = Arc::new(RemoveAttributes::new(piles.clone(), effects.clone()));
        let transfer_attributes = Arc::new(TransferAttributes::new(
            piles.clone(),
            effects.clone(),
            add_attributes.clone(),
            remove_attributes.clone(),
        ));
        let transfer_all_attributes = Arc::new(TransferAllAttributes::new(
            piles.clone(),
            effects.clone(),
            transfer_attributes.clone(),
        ));

        Self {
            turn_into_pile: Arc::new(TurnIntoPile::new(piles.clone(), effects.clone())),
            revert_from_pile: Arc::new(RevertFromPile::new(piles.clone(), effects.clone())),
            update_pile: Arc::new(UpdatePile::new(
                piles.clone(),
                effects.clone(),
                config.coalesce,
            )),
            delete_pile: Arc::new(DeletePile::new(piles.clone(), effects.clone())),
            refresh_pile: Arc::new(RefreshPile::new(effects.clone())),
            transfer_everything: Arc::new(TransferEverything::new(
                piles.clone(),
                effects.clone(),
                transfer_all_items.clone(),
                transfer_all_attributes.clone(),
            )),
            drop_items: Arc::new(DropItems::new(
                piles,
                effects,
                add_items.clone(),
                remove_items.clone(),
                create_pile.clone(),
            )),
            create_pile,
            add_items,
            remove_items,
            transfer_items,
            transfer_all_items,
            add_attributes,
            remove_attributes,
            transfer_attributes,
            transfer_all_attributes,
        }
    }

    /// Run one privileged call to completion.
    pub async fn dispatch(&self, call: PrivilegedCall) -> Result<PileResponse, CoordinatorError> {
        let ctx = CallContext::from_call(&call);
        let ctx = &ctx;
        let response = match call.request {
            PileRequest::CreatePile(data) => PileResponse::Created {
                uuid: self.create_pile.execute(ctx, data).await?,
            },
            PileRequest::TurnIntoPile {
                targets,
                pile_patch,
                token_overrides,
            } => PileResponse::Converted {
                uuids: self
                    .turn_into_pile
                    .execute(ctx, targets, pile_patch, token_overrides)
                    .await?,
            },
            PileRequest::RevertFromPile {
                targets,
                token_overrides,
            } => PileResponse::Converted {
                uuids: self
                    .revert_from_pile
                    .execute(ctx, targets, token_overrides)
                    .await?,
            },
            PileRequest::UpdatePile {
                target,
                patch,
                interacting,
                token_overrides,
            } => PileResponse::Updated {
                diff: self
                    .update_pile
                    .execute(ctx, &target, patch, interacting, token_overrides)
                    .await?,
            },
            PileRequest::DeletePile { target } => {
                self.delete_pile.execute(ctx, &target).await?;
                PileResponse::Deleted
            }
            PileRequest::RefreshPile { target } => PileResponse::Refreshed {
                changed: self.refresh_pile.execute(&target).await?,
            },
            PileRequest::AddItems { target, items } => PileResponse::Items {
                records: self
                    .add_items
                    .execute(ctx, &target, items, Scope::Standalone)
                    .await?,
            },
            PileRequest::RemoveItems { target, items } => PileResponse::Items {
                records: self
                    .remove_items
                    .execute(ctx, &target, items, Scope::Standalone)
                    .await?,
            },
            PileRequest::TransferItems {
                source,
                target,
                items,
            } => PileResponse::Items {
                records: self
                    .transfer_items
                    .execute(ctx, &source, &target, items)
                    .await?,
            },
            PileRequest::TransferAllItems {
                source,
                target,
                item_type_filters,
            } => PileResponse::Items {
                records: self
                    .transfer_all_items
                    .execute(ctx, &source, &target, item_type_filters, Scope::Standalone)
                    .await?,
            },
            PileRequest::AddAttributes { target, attributes } => PileResponse::Attributes {
                records: self
                    .add_attributes
                    .execute(ctx, &target, attributes, Scope::Standalone)
                    .await?,
            },
            PileRequest::RemoveAttributes { target, attributes } => PileResponse::Attributes {
                records: self
                    .remove_attributes
                    .execute(ctx, &target, attributes, Scope::Standalone)
                    .await?,
            },
            PileRequest::TransferAttributes {
                source,
                target,
                attributes,
            } => PileResponse::Attributes {
                records: self
                    .transfer_attributes
                    .execute(ctx, &source, &target, attributes)
                    .await?,
            },
            PileRequest::TransferAllAttributes { source, target } => PileResponse::Attributes {
                records: self
                    .transfer_all_attributes
                    .execute(ctx, &source, &target, Scope::Standalone)
                    .await?,
            },
            PileRequest::TransferEverything {
                source,
                target,
                item_type_filters,
            } => {
                let (items, attributes) = self
                    .transfer_everything
                    .execute(ctx, &source, &target, item_type_filters)
                    .await?;
                PileResponse::Everything { items, attributes }
            }
            PileRequest::DropItems(data) => {
                let (target, records) = self.drop_items.execute(ctx, data).await?;
                PileResponse::Dropped { target, records }
            }
        };
        Ok(response)
    }
}

#[async_trait]
impl RpcHandler for Coordinator {
    async fn handle(&self, call: PrivilegedCall) -> ResponseResult {
        let handler = call.handler();
        match self.dispatch(call).await {
            Ok(response) => ResponseResult::success(response),
            Err(e) => {
                tracing::warn!(handler = %handler, error = %e, "Privileged call failed");
                ResponseResult::error(e.code(), e.to_string())
            }
        }
    }
}
