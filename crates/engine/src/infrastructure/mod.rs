//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod hooks;
pub mod macros;
pub mod memory_store;
pub mod ports;
pub mod rpc;
pub mod settings;
pub mod token_image;
pub mod ui;
