//! Pile entity operations.

use std::sync::Arc;

use itempiles_domain::{
    AddPlan, AttributePlan, DocumentUuid, Item, ItemSchema, ModuleSettings, PileDocument,
    RemovePlan, TransferRecord,
};

use crate::infrastructure::ports::{DocumentStore, RepoError, SettingsRepo};

/// Pile documents and the settings that govern them.
///
/// Reads go straight to the store. Writes take reconciliation plans and turn
/// them into store calls; only the privileged executor writes.
pub struct Piles {
    store: Arc<dyn DocumentStore>,
    settings: Arc<dyn SettingsRepo>,
}

impl Piles {
    pub fn new(store: Arc<dyn DocumentStore>, settings: Arc<dyn SettingsRepo>) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn find(&self, uuid: &DocumentUuid) -> Result<Option<PileDocument>, RepoError> {
        self.store.get(uuid).await
    }

    pub async fn get(&self, uuid: &DocumentUuid) -> Result<PileDocument, RepoError> {
        self.store
            .get(uuid)
            .await?
            .ok_or_else(|| RepoError::not_found("Document", uuid))
    }

    /// Stored settings, or defaults when none were ever saved.
    pub async fn settings(&self) -> Result<ModuleSettings, RepoError> {
        Ok(self.settings.get_global().await?.unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &ModuleSettings) -> Result<(), RepoError> {
        self.settings.save_global(settings).await
    }

    /// Persist an add plan. Returns the records with store-assigned ids.
    pub async fn apply_add(
        &self,
        document: &PileDocument,
        plan: AddPlan,
        schema: &ItemSchema,
    ) -> Result<Vec<TransferRecord>, RepoError> {
        let updated = updated_lines(document, &plan.updates, schema);
        if !updated.is_empty() {
            self.store.update_items(&document.uuid, updated).await?;
        }
        let created = if plan.creates.is_empty() {
            Vec::new()
        } else {
            self.store
                .create_items(&document.uuid, plan.creates.clone())
                .await?
        };
        Ok(plan.into_records(&created))
    }

    pub async fn apply_remove(
        &self,
        document: &PileDocument,
        plan: &RemovePlan,
        schema: &ItemSchema,
    ) -> Result<(), RepoError> {
        let updated = updated_lines(document, &plan.updates, schema);
        if !updated.is_empty() {
            self.store.update_items(&document.uuid, updated).await?;
        }
        if !plan.deletes.is_empty() {
            self.store
                .delete_items(&document.uuid, plan.deletes.clone())
                .await?;
        }
        Ok(())
    }

    pub async fn apply_attributes(
        &self,
        uuid: &DocumentUuid,
        plan: &AttributePlan,
    ) -> Result<(), RepoError> {
        self.store.write_attributes(uuid, &plan.updates).await
    }
}

fn updated_lines(
    document: &PileDocument,
    updates: &[itempiles_domain::QuantityUpdate],
    schema: &ItemSchema,
) -> Vec<Item> {
    updates
        .iter()
        .filter_map(|update| {
            let mut line = document.item(&update.id)?.clone();
            schema.set_quantity(&mut line, update.quantity);
            Some(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockDocumentStore, MockSettingsRepo};
    use itempiles_domain::reconcile::{plan_add_items, plan_remove_items};
    use itempiles_domain::{ItemDelta, ItemId, RemoveRequest, TokenAppearance};
    use serde_json::json;

    fn arrow(id: &str, quantity: u32) -> Item {
        Item {
            id: ItemId::new(id).unwrap(),
            name: "Arrow".into(),
            img: None,
            data: json!({"type": "ammo", "system": {"quantity": quantity}}),
        }
    }

    fn quiver(items: Vec<Item>) -> PileDocument {
        PileDocument {
            uuid: DocumentUuid::parse("Actor.quiver").unwrap(),
            name: "Quiver".into(),
            img: None,
            appearance: TokenAppearance::default(),
            position: None,
            actor_id: None,
            actor_link: true,
            pile: None,
            items,
            system: json!({}),
        }
    }

    #[tokio::test]
    async fn when_no_settings_stored_returns_defaults() {
        let mut settings = MockSettingsRepo::new();
        settings.expect_get_global().returning(|| Ok(None));
        let piles = Piles::new(Arc::new(MockDocumentStore::new()), Arc::new(settings));

        assert_eq!(piles.settings().await.unwrap(), ModuleSettings::default());
    }

    #[tokio::test]
    async fn when_document_missing_returns_not_found() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_| Ok(None));
        let piles = Piles::new(Arc::new(store), Arc::new(MockSettingsRepo::new()));

        let result = piles.get(&DocumentUuid::parse("Actor.ghost").unwrap()).await;
        assert!(matches!(result, Err(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn apply_add_writes_updates_and_uses_assigned_ids() {
        let schema = ItemSchema::default();
        let document = quiver(vec![arrow("a1", 5)]);
        let mut bolt = arrow("tmp", 2);
        bolt.name = "Bolt".into();
        let plan = plan_add_items(
            &document.items,
            &[
                ItemDelta {
                    item: arrow("other", 3),
                    quantity: 3,
                },
                ItemDelta {
                    item: bolt,
                    quantity: 2,
                },
            ],
            &schema,
        );

        let mut store = MockDocumentStore::new();
        store
            .expect_update_items()
            .withf(|_, items| items.len() == 1 && items[0].data["system"]["quantity"] == 8)
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_create_items().times(1).returning(|_, items| {
            Ok(items
                .into_iter()
                .map(|mut item| {
                    item.id = ItemId::new("assigned").unwrap();
                    item
                })
                .collect())
        });
        let piles = Piles::new(Arc::new(store), Arc::new(MockSettingsRepo::new()));

        let records = piles.apply_add(&document, plan, &schema).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].quantity, 3);
        assert_eq!(records[1].item.id.as_str(), "assigned");
    }

    #[tokio::test]
    async fn apply_remove_skips_empty_writes() {
        let schema = ItemSchema::default();
        let document = quiver(vec![arrow("a1", 5)]);
        let plan = plan_remove_items(
            &document.items,
            &[RemoveRequest {
                id: ItemId::new("a1").unwrap(),
                quantity: None,
            }],
            &schema,
        );

        let mut store = MockDocumentStore::new();
        store.expect_update_items().never();
        store
            .expect_delete_items()
            .withf(|_, ids| ids.len() == 1 && ids[0].as_str() == "a1")
            .times(1)
            .returning(|_, _| Ok(()));
        let piles = Piles::new(Arc::new(store), Arc::new(MockSettingsRepo::new()));

        piles.apply_remove(&document, &plan, &schema).await.unwrap();
    }
}
