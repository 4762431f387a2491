//! Caller-facing errors.

use itempiles_domain::{DocumentUuid, ItemId};

use crate::infrastructure::ports::{RepoError, RpcError};

/// Malformed input rejected before anything crosses the RPC boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid uuid: {0}")]
    InvalidUuid(String),
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentUuid),
    #[error("Not an item pile: {0}")]
    NotAPile(DocumentUuid),
    #[error("{target} has no attribute at {path}")]
    MissingAttribute { target: DocumentUuid, path: String },
    #[error("{target} holds no item {id}")]
    MissingItem { target: DocumentUuid, id: ItemId },
    #[error("Invalid amount {amount} for {field}")]
    InvalidAmount { field: String, amount: f64 },
    #[error("Quantity for {0} must be at least 1")]
    ZeroQuantity(String),
    #[error("A drop needs a target pile or a scene position")]
    NoDropLocation,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("Failed to read local state: {0}")]
    Repo(#[from] RepoError),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Rpc(RpcError::CoordinatorUnavailable))
    }
}
