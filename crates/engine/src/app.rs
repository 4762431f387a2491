//! Application state and composition.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use itempiles_domain::UserId;

use crate::api::{ItemPilesApi, Participant, Session};
use crate::entities::Piles;
use crate::infrastructure::{
    hooks::HookRegistry,
    macros::MacroRegistry,
    ports::{DocumentStore, SettingsRepo},
    rpc::LocalRpc,
    token_image::DefaultTokenImage,
    ui::TracingUi,
};
use crate::use_cases::{coordinator::DEFAULT_COALESCE, Coordinator, CoordinatorConfig, SideEffects};

/// Process-level configuration read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// SQLite file for module settings; in-memory settings when unset
    pub settings_db: Option<String>,
    pub coalesce: Duration,
    /// JSON file of documents to seed the in-memory store with
    pub world: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings_db: None,
            coalesce: DEFAULT_COALESCE,
            world: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            settings_db: non_empty("ITEM_PILES_SETTINGS_DB"),
            coalesce: parse_coalesce(non_empty("ITEM_PILES_COALESCE_MS").as_deref()),
            world: non_empty("ITEM_PILES_WORLD").map(PathBuf::from),
        }
    }
}

fn parse_coalesce(raw: Option<&str>) -> Duration {
    match raw.map(|v| v.trim().parse::<u64>()) {
        Some(Ok(ms)) => Duration::from_millis(ms),
        Some(Err(e)) => {
            tracing::warn!("Invalid ITEM_PILES_COALESCE_MS, using default: {}", e);
            DEFAULT_COALESCE
        }
        None => DEFAULT_COALESCE,
    }
}

/// Main application state.
///
/// Holds the shared adapters and the coordinator. Participants get their
/// own [`ItemPilesApi`] through [`App::api`].
pub struct App {
    pub piles: Arc<Piles>,
    pub rpc: Arc<LocalRpc>,
    pub hooks: Arc<HookRegistry>,
    pub macros: Arc<MacroRegistry>,
    pub coordinator: Arc<Coordinator>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        settings: Arc<dyn SettingsRepo>,
        config: &EngineConfig,
    ) -> Self {
        let rpc = Arc::new(LocalRpc::new());
        let hooks = Arc::new(HookRegistry::new());
        let macros = Arc::new(MacroRegistry::new());

        let piles = Arc::new(Piles::new(store, settings));
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
                coalesce: config.coalesce,
            },
        ));

        Self {
            piles,
            rpc,
            hooks,
            macros,
            coordinator,
        }
    }

    /// Make this process the privileged executor.
    pub async fn start_executor(&self) -> JoinHandle<()> {
        self.rpc.register_executor(self.coordinator.clone()).await
    }

    /// Caller-side API for one user, with headless presentation.
    pub fn api(&self, session: Session) -> ItemPilesApi {
        ItemPilesApi::new(
            session,
            self.piles.clone(),
            self.rpc.clone(),
            self.hooks.clone(),
            Arc::new(TracingUi),
            Arc::new(TracingUi),
            Arc::new(TracingUi),
            Arc::new(TracingUi),
        )
    }

    /// Register `user_id` for broadcasts and spawn its handler.
    pub async fn join(&self, user_id: UserId) -> JoinHandle<()> {
        let broadcasts = self.rpc.register_participant(user_id).await;
        let participant = Participant::new(self.hooks.clone(), Arc::new(TracingUi));
        tokio::spawn(participant.run(broadcasts))
    }
}
