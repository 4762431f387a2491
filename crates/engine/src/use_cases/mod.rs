//! Use cases - privileged mutation orchestration.
//!
//! Only the elected executor runs these. Callers reach them through
//! [`crate::api::ItemPilesApi`] and the RPC port.

pub mod coordinator;

pub use coordinator::{
    CallContext, Coordinator, CoordinatorConfig, CoordinatorError, Scope, SideEffects,
};
