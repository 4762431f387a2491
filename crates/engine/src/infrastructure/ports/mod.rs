//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Document and settings storage (host documents, SQLite settings)
//! - The RPC channel between callers, the executor and participants
//! - Hooks and macros owned by the host
//! - Presentation collaborators (token images, sounds, prompts, inventory views)
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;
pub mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{DocumentStore, SettingsRepo};

pub use types::{
    DocumentUpdate, DropChoice, DropPrompt, MacroAction, MacroInvocation, NewActor, NewToken,
    ResolvedItem,
};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    DropPromptPort, HookPort, InventoryUiPort, MacroPort, NotifyPort, Outcome, RpcHandler,
    RpcPort, SoundPort, TokenImagePort,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockDocumentStore, MockSettingsRepo};

#[cfg(test)]
pub use external::{
    MockDropPromptPort, MockHookPort, MockInventoryUiPort, MockMacroPort, MockNotifyPort,
    MockRpcHandler, MockRpcPort, MockSoundPort, MockTokenImagePort,
};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{MacroError, RepoError, RpcError};
