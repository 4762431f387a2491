extern crate self as itempiles_domain;

pub mod entities;
pub mod error;
pub mod ids;
pub mod reconcile;
pub mod value_objects;

// Re-export all entities (explicit list in entities/mod.rs)
pub use entities::{
    ActorRef, ContainerAction, ContainerState, DeleteWhenEmpty, Distance, GridPosition, Item,
    ItemDelta, PileData, PileDocument, RemoveRequest, Resolvable, TokenAppearance,
    TokenDocumentRef, TokenOverrides, TokenRef, TransferRecord, TransitionPlan,
};

pub use error::DomainError;

// Re-export ID types
pub use ids::{
    ActorId, DocumentKind, DocumentUuid, InteractionId, ItemId, SceneId, TokenId, UserId,
};

// Re-export value objects
pub use value_objects::{
    clamp_subtract, merge_object, number_value, shallow_diff, split_list, AttributePath,
    DynamicAttribute, ItemSchema, ModuleSettings, QuantityChange,
};

// Re-export the reconciliation plans consumed by the coordinator
pub use reconcile::{AddPlan, AttributeAmounts, AttributePlan, QuantityUpdate, RemovePlan};
