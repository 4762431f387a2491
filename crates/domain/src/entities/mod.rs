//! Domain entities: piles, inventory lines and the documents that carry them.

mod document;
mod item;
mod pile;
mod resolvable;

pub use document::{GridPosition, PileDocument, TokenAppearance, TokenOverrides};
pub use item::{Item, ItemDelta, RemoveRequest, TransferRecord};
pub use pile::{
    ContainerAction, ContainerState, DeleteWhenEmpty, Distance, PileData, TransitionPlan,
};
pub use resolvable::{ActorRef, Resolvable, TokenDocumentRef, TokenRef};
