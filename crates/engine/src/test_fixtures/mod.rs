//! Test fixtures: a fully wired in-memory world and document builders.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{actor, item, TestWorld};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let world = TestWorld::new(world_settings()).await;
//!     world.seed([actor("bob", vec![item("arrow", "Arrow", "consumable", 5)], json!({}))]).await;
//!     // ... drive world.rpc or world.api(..)
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinHandle;

use itempiles_domain::{
    AttributePath, DocumentUuid, DynamicAttribute, GridPosition, Item, ItemId, ModuleSettings,
    PileData, PileDocument, SceneId, TokenAppearance, TokenId, UserId,
};
use itempiles_shared::{PileRequest, PileResponse, PrivilegedCall};

use crate::api::{ItemPilesApi, Session};
use crate::entities::Piles;
use crate::infrastructure::clock::SequentialRandom;
use crate::infrastructure::hooks::HookRegistry;
use crate::infrastructure::macros::MacroRegistry;
use crate::infrastructure::memory_store::InMemoryDocumentStore;
use crate::infrastructure::ports::{RpcError, RpcPort};
use crate::infrastructure::rpc::LocalRpc;
use crate::infrastructure::settings::InMemorySettingsRepo;
use crate::infrastructure::token_image::DefaultTokenImage;
use crate::infrastructure::ui::TracingUi;
use crate::use_cases::{Coordinator, CoordinatorConfig, SideEffects};

pub const SCENE: &str = "scene1";

// =============================================================================
// World
// =============================================================================

/// Every adapter wired in memory with the executor running.
pub struct TestWorld {
    pub store: Arc<InMemoryDocumentStore>,
    pub settings: Arc<InMemorySettingsRepo>,
    pub rpc: Arc<LocalRpc>,
    pub macros: Arc<MacroRegistry>,
    pub hooks: Arc<HookRegistry>,
    pub piles: Arc<Piles>,
    pub coordinator: Arc<Coordinator>,
    executor: JoinHandle<()>,
}

impl TestWorld {
    pub async fn new(settings: ModuleSettings) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new(Arc::new(SequentialRandom::new())));
        let settings = Arc::new(InMemorySettingsRepo::new(Some(settings)));
        let rpc = Arc::new(LocalRpc::new());
        let macros = Arc::new(MacroRegistry::new());
        let hooks = Arc::new(HookRegistry::new());

        let piles = Arc::new(Piles::new(store.clone(), settings.clone()));
        let effects = Arc::new(SideEffects::new(
            piles.clone(),
            rpc.clone(),
            macros.clone(),
            Arc::new(DefaultTokenImage),
        ));
        let coordinator = Arc::new(Coordinator::new(
            piles.clone(),
            effects,
            CoordinatorConfig {
                coalesce: Duration::ZERO,
            },
        ));
        let executor = rpc.register_executor(coordinator.clone()).await;

        Self {
            store,
            settings,
            rpc,
            macros,
            hooks,
            piles,
            coordinator,
            executor,
        }
    }

    pub async fn seed(&self, documents: impl IntoIterator<Item = PileDocument>) {
        self.store.seed(documents).await;
    }

    /// Send a request through the executor as the GM.
    pub async fn call(&self, request: PileRequest) -> Result<PileResponse, RpcError> {
        self.rpc
            .execute_as_privileged(PrivilegedCall::new(gm(), None, request))
            .await
    }

    /// Current state of a document; panics when it is gone.
    pub async fn doc(&self, uuid: &DocumentUuid) -> PileDocument {
        self.piles.get(uuid).await.expect("document should exist")
    }

    pub async fn exists(&self, uuid: &DocumentUuid) -> bool {
        self.piles.find(uuid).await.expect("store read").is_some()
    }

    /// Caller-side API bound to this world.
    pub fn api(&self, user_id: &str, is_gm: bool) -> ItemPilesApi {
        ItemPilesApi::new(
            Session {
                user_id: UserId::new(user_id).expect("valid user id"),
                is_gm,
            },
            self.piles.clone(),
            self.rpc.clone(),
            self.hooks.clone(),
            Arc::new(TracingUi),
            Arc::new(TracingUi),
            Arc::new(TracingUi),
            Arc::new(TracingUi),
        )
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        self.executor.abort();
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn gm() -> UserId {
    UserId::new("gm").expect("valid user id")
}

pub fn gold() -> AttributePath {
    AttributePath::parse("currency.gold").expect("valid path")
}

/// Default settings plus a gold currency.
pub fn world_settings() -> ModuleSettings {
    ModuleSettings {
        dynamic_attributes: vec![DynamicAttribute {
            name: "Gold".into(),
            path: gold(),
            img: None,
        }],
        ..ModuleSettings::default()
    }
}

/// An item line shaped for the default schema (`type`, `system.quantity`).
pub fn item(id: &str, name: &str, item_type: &str, quantity: u32) -> Item {
    Item {
        id: ItemId::new(id).expect("valid item id"),
        name: name.into(),
        img: Some(format!("icons/{id}.webp")),
        data: json!({"type": item_type, "system": {"quantity": quantity}}),
    }
}

pub fn actor_uuid(id: &str) -> DocumentUuid {
    DocumentUuid::parse(&format!("Actor.{id}")).expect("valid actor uuid")
}

pub fn token_uuid(id: &str) -> DocumentUuid {
    DocumentUuid::for_token(
        &SceneId::new(SCENE).expect("valid scene id"),
        &TokenId::new(id).expect("valid token id"),
    )
}

/// A character actor, not a pile.
pub fn actor(id: &str, items: Vec<Item>, system: Value) -> PileDocument {
    PileDocument {
        uuid: actor_uuid(id),
        name: id.into(),
        img: Some(format!("portraits/{id}.webp")),
        appearance: TokenAppearance::default(),
        position: None,
        actor_id: None,
        actor_link: true,
        pile: None,
        items,
        system,
    }
}

/// An unlinked pile token on [`SCENE`].
pub fn token_pile(
    id: &str,
    position: GridPosition,
    pile: PileData,
    items: Vec<Item>,
    system: Value,
) -> PileDocument {
    PileDocument {
        uuid: token_uuid(id),
        name: id.into(),
        img: Some("icons/pile.webp".into()),
        appearance: TokenAppearance {
            img: Some("icons/pile.webp".into()),
            scale: 1.0,
        },
        position: Some(position),
        actor_id: None,
        actor_link: false,
        pile: Some(pile),
        items,
        system,
    }
}

/// A character token on [`SCENE`].
pub fn character_token(id: &str, position: GridPosition) -> PileDocument {
    PileDocument {
        uuid: token_uuid(id),
        position: Some(position),
        actor_link: true,
        ..actor(id, Vec::new(), json!({}))
    }
}

pub fn enabled_pile() -> PileData {
    PileData {
        enabled: true,
        ..PileData::default()
    }
}

pub fn container(closed: bool, locked: bool) -> PileData {
    PileData {
        enabled: true,
        is_container: true,
        closed,
        locked,
        ..PileData::default()
    }
}

/// Quantity of the line called `name`, if the document holds one.
///
/// Lines created by the store get fresh ids, so tests look them up by name.
pub fn quantity_named(document: &PileDocument, name: &str) -> Option<u32> {
    let schema = ModuleSettings::default().item_schema();
    document
        .items
        .iter()
        .find(|line| line.name == name)
        .map(|line| schema.quantity(line))
}
