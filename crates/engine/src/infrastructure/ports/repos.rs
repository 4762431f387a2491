//! Repository port traits for document and settings access.

use async_trait::async_trait;

use itempiles_domain::{
    AttributeAmounts, DocumentUuid, Item, ItemId, ModuleSettings, PileDocument,
};

use super::error::RepoError;
use super::types::{DocumentUpdate, NewActor, NewToken};

// =============================================================================
// Settings Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get_global(&self) -> Result<Option<ModuleSettings>, RepoError>;
    async fn save_global(&self, settings: &ModuleSettings) -> Result<(), RepoError>;
}

// =============================================================================
// Document Store
// =============================================================================

/// The host's canonical documents. Only the privileged executor writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, uuid: &DocumentUuid) -> Result<Option<PileDocument>, RepoError>;
    async fn find_actor_by_name(&self, name: &str) -> Result<Option<PileDocument>, RepoError>;

    async fn create_actor(&self, actor: NewActor) -> Result<PileDocument, RepoError>;
    async fn create_token(&self, token: NewToken) -> Result<PileDocument, RepoError>;
    async fn delete(&self, uuid: &DocumentUuid) -> Result<(), RepoError>;

    /// Write the pile flag and token-level fields in one update.
    async fn update_document(
        &self,
        uuid: &DocumentUuid,
        update: DocumentUpdate,
    ) -> Result<(), RepoError>;

    // Embedded items
    /// Create lines; the store assigns ids and returns them in input order.
    async fn create_items(
        &self,
        uuid: &DocumentUuid,
        items: Vec<Item>,
    ) -> Result<Vec<Item>, RepoError>;
    async fn update_items(&self, uuid: &DocumentUuid, items: Vec<Item>) -> Result<(), RepoError>;
    async fn delete_items(&self, uuid: &DocumentUuid, ids: Vec<ItemId>) -> Result<(), RepoError>;

    // Attribute pools
    async fn write_attributes(
        &self,
        uuid: &DocumentUuid,
        values: &AttributeAmounts,
    ) -> Result<(), RepoError>;
}
