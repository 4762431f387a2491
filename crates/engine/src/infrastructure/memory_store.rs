//! In-memory document store.
//!
//! Holds actors and tokens keyed by uuid. Used by the stdio bridge and by
//! multi-step tests. Linked tokens are stored independently of their actor.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use itempiles_domain::{
    ActorId, AttributeAmounts, DocumentUuid, Item, ItemId, PileDocument, TokenAppearance,
    TokenId,
};

use crate::infrastructure::ports::{
    DocumentStore, DocumentUpdate, NewActor, NewToken, RandomPort, RepoError,
};

pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentUuid, PileDocument>>,
    random: Arc<dyn RandomPort>,
}

impl InMemoryDocumentStore {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            random,
        }
    }

    /// Insert documents as-is, replacing any with the same uuid.
    pub async fn seed(&self, documents: impl IntoIterator<Item = PileDocument>) {
        let mut store = self.documents.write().await;
        for document in documents {
            store.insert(document.uuid.clone(), document);
        }
    }

    /// Seed from a JSON array of documents.
    pub async fn seed_from_file(&self, path: &Path) -> Result<usize, RepoError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RepoError::database("seed", e))?;
        let documents: Vec<PileDocument> =
            serde_json::from_str(&json).map_err(RepoError::serialization)?;
        let count = documents.len();
        self.seed(documents).await;
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    async fn with_document<T>(
        &self,
        uuid: &DocumentUuid,
        f: impl FnOnce(&mut PileDocument) -> T,
    ) -> Result<T, RepoError> {
        let mut store = self.documents.write().await;
        let document = store
            .get_mut(uuid)
            .ok_or_else(|| RepoError::not_found("Document", uuid))?;
        Ok(f(document))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, uuid: &DocumentUuid) -> Result<Option<PileDocument>, RepoError> {
        Ok(self.documents.read().await.get(uuid).cloned())
    }

    async fn find_actor_by_name(&self, name: &str) -> Result<Option<PileDocument>, RepoError> {
        let store = self.documents.read().await;
        let mut actors: Vec<&PileDocument> = store
            .values()
            .filter(|d| d.uuid.as_str().starts_with("Actor.") && d.name == name)
            .collect();
        // HashMap order is arbitrary; pick deterministically
        actors.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(actors.first().map(|d| (*d).clone()))
    }

    async fn create_actor(&self, actor: NewActor) -> Result<PileDocument, RepoError> {
        let id = ActorId::new(self.random.gen_id()).map_err(RepoError::constraint)?;
        let document = PileDocument {
            uuid: DocumentUuid::for_actor(&id),
            name: actor.name,
            img: actor.img.clone(),
            appearance: TokenAppearance {
                img: actor.img,
                scale: 1.0,
            },
            position: None,
            actor_id: Some(id),
            actor_link: false,
            pile: Some(actor.pile),
            items: Vec::new(),
            system: serde_json::Value::Object(Default::default()),
        };
        self.documents
            .write()
            .await
            .insert(document.uuid.clone(), document.clone());
        tracing::debug!(uuid = %document.uuid, actor_type = %actor.actor_type, "Actor created");
        Ok(document)
    }

    async fn create_token(&self, token: NewToken) -> Result<PileDocument, RepoError> {
        let id = TokenId::new(self.random.gen_id()).map_err(RepoError::constraint)?;
        let document = PileDocument {
            uuid: DocumentUuid::for_token(&token.scene, &id),
            name: token.name,
            img: token.img,
            appearance: token.appearance,
            position: Some(token.position),
            actor_id: Some(token.actor),
            actor_link: token.actor_link,
            pile: Some(token.pile),
            items: token.items,
            system: token.system,
        };
        self.documents
            .write()
            .await
            .insert(document.uuid.clone(), document.clone());
        tracing::debug!(uuid = %document.uuid, "Token created");
        Ok(document)
    }

    async fn delete(&self, uuid: &DocumentUuid) -> Result<(), RepoError> {
        self.documents
            .write()
            .await
            .remove(uuid)
            .map(|_| ())
            .ok_or_else(|| RepoError::not_found("Document", uuid))
    }

    async fn update_document(
        &self,
        uuid: &DocumentUuid,
        update: DocumentUpdate,
    ) -> Result<(), RepoError> {
        self.with_document(uuid, |document| {
            if let Some(pile) = update.pile {
                document.pile = Some(pile);
            }
            if let Some(appearance) = update.appearance {
                document.appearance = appearance;
            }
            if let Some(name) = update.name {
                document.name = name;
            }
        })
        .await
    }

    async fn create_items(
        &self,
        uuid: &DocumentUuid,
        items: Vec<Item>,
    ) -> Result<Vec<Item>, RepoError> {
        let mut created = Vec::with_capacity(items.len());
        for mut item in items {
            item.id = ItemId::new(self.random.gen_id()).map_err(RepoError::constraint)?;
            created.push(item);
        }
        let stored = created.clone();
        self.with_document(uuid, move |document| document.items.extend(stored))
            .await?;
        Ok(created)
    }

    async fn update_items(&self, uuid: &DocumentUuid, items: Vec<Item>) -> Result<(), RepoError> {
        self.with_document(uuid, |document| {
            for item in items {
                match document.items.iter_mut().find(|line| line.id == item.id) {
                    Some(line) => *line = item,
                    None => tracing::warn!(item_id = %item.id, "Update for unknown item skipped"),
                }
            }
        })
        .await
    }

    async fn delete_items(&self, uuid: &DocumentUuid, ids: Vec<ItemId>) -> Result<(), RepoError> {
        self.with_document(uuid, |document| {
            document.items.retain(|line| !ids.contains(&line.id));
        })
        .await
    }

    async fn write_attributes(
        &self,
        uuid: &DocumentUuid,
        values: &AttributeAmounts,
    ) -> Result<(), RepoError> {
        self.with_document(uuid, |document| {
            for (path, value) in values {
                path.set_number(&mut document.system, *value);
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SequentialRandom;
    use itempiles_domain::{AttributePath, GridPosition, PileData, SceneId};
    use serde_json::json;

    fn store() -> InMemoryDocumentStore {
        InMemoryDocumentStore::new(Arc::new(SequentialRandom::new()))
    }

    fn torch() -> Item {
        Item {
            id: ItemId::new("torch").unwrap(),
            name: "Torch".into(),
            img: None,
            data: json!({"type": "loot", "system": {"quantity": 1}}),
        }
    }

    #[tokio::test]
    async fn created_items_get_store_ids_in_order() {
        let store = store();
        let actor = store
            .create_actor(NewActor {
                name: "Chest".into(),
                actor_type: "character".into(),
                img: None,
                pile: PileData::default(),
            })
            .await
            .unwrap();

        let created = store
            .create_items(&actor.uuid, vec![torch(), torch()])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);

        let stored = store.get(&actor.uuid).await.unwrap().unwrap();
        assert_eq!(stored.items, created);
    }

    #[tokio::test]
    async fn token_uuid_lives_in_scene() {
        let store = store();
        let token = store
            .create_token(NewToken {
                scene: SceneId::new("scene1").unwrap(),
                actor: ActorId::new("a1").unwrap(),
                name: "Loot".into(),
                img: None,
                position: GridPosition::new(1.0, 2.0),
                appearance: TokenAppearance::default(),
                actor_link: false,
                pile: PileData::spawned_defaults(),
                items: vec![torch()],
                system: json!({}),
            })
            .await
            .unwrap();
        assert!(token.uuid.as_str().starts_with("Scene.scene1.Token."));
        assert_eq!(token.items.len(), 1);
    }

    #[tokio::test]
    async fn write_attributes_sets_nested_values() {
        let store = store();
        let actor = store
            .create_actor(NewActor {
                name: "Bob".into(),
                actor_type: "character".into(),
                img: None,
                pile: PileData::default(),
            })
            .await
            .unwrap();
        let mut values = AttributeAmounts::new();
        values.insert(AttributePath::parse("currency.gold").unwrap(), 15.0);
        store.write_attributes(&actor.uuid, &values).await.unwrap();

        let stored = store.get(&actor.uuid).await.unwrap().unwrap();
        assert_eq!(stored.system, json!({"currency": {"gold": 15}}));
    }

    #[tokio::test]
    async fn delete_missing_document_is_not_found() {
        let store = store();
        let result = store.delete(&DocumentUuid::parse("Actor.ghost").unwrap()).await;
        assert!(matches!(result, Err(e) if e.is_not_found()));
    }
}
