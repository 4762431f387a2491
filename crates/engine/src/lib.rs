//! Item Piles engine library.
//!
//! ## Structure
//!
//! - `entities/` - Pile document access over the storage ports
//! - `use_cases/` - The privileged coordinator (executor role)
//! - `infrastructure/` - Port traits and their adapters
//! - `api/` - Caller-facing API and participant broadcast handling
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures module for integration testing.
#[cfg(test)]
pub mod test_fixtures;

pub use app::{App, EngineConfig};
