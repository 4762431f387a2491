//! Item Piles Protocol - wire contract between callers, the privileged
//! executor and participants
//!
//! - Handler names addressed through the RPC layer
//! - Privileged requests and their results
//! - Broadcasts sent after a mutation is persisted
//! - Hook names and payloads
//!
//! # Design Principles
//!
//! 1. **No business logic** - pure data types and serialization
//! 2. **Domain vocabulary** - ids, items and records come from `itempiles-domain`
//! 3. **Stable names** - handler and hook names serialize to fixed strings

pub mod handlers;
pub mod hooks;
pub mod messages;
pub mod requests;
pub mod responses;

pub use handlers::HandlerName;
pub use hooks::{HookName, HookPayload};
pub use messages::{Broadcast, ClientMessage, ServerMessage};
pub use requests::{CreatePileData, DropItemsData, PileRequest, PrivilegedCall};
pub use responses::{ErrorCode, PileResponse, ResponseResult};
