//! Executor-side errors.

use itempiles_domain::DocumentUuid;
use itempiles_shared::ErrorCode;

use crate::infrastructure::ports::{MacroError, RepoError};

/// Errors raised while running a privileged call.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
    #[error("Not an item pile: {0}")]
    NotAPile(DocumentUuid),
    #[error("Pile actor not found: {0}")]
    PileActorNotFound(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid pile data: {0}")]
    InvalidPileData(String),
    #[error(transparent)]
    Macro(#[from] MacroError),
    #[error("Repository error: {0}")]
    Repo(RepoError),
}

impl From<RepoError> for CoordinatorError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound { id, .. } => Self::DocumentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl CoordinatorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DocumentNotFound(_) | Self::PileActorNotFound(_) => ErrorCode::NotFound,
            Self::NotAPile(_) => ErrorCode::NotAPile,
            Self::InvalidRequest(_) | Self::InvalidPileData(_) => ErrorCode::BadRequest,
            Self::Macro(_) => ErrorCode::MacroFailed,
            Self::Repo(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_documents_map_to_not_found() {
        let error = CoordinatorError::from(RepoError::not_found("Document", "Actor.x"));
        assert!(matches!(&error, CoordinatorError::DocumentNotFound(id) if id == "Actor.x"));
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[test]
    fn storage_failures_are_internal() {
        let error = CoordinatorError::from(RepoError::database("update", "disk full"));
        assert_eq!(error.code(), ErrorCode::InternalError);
    }
}
