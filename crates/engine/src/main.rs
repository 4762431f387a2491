//! Item Piles Engine - stdio bridge entry point.
//!
//! Runs the privileged executor over an in-memory document store. Each
//! stdin line is a `ClientMessage`; replies and broadcasts go to stdout as
//! `ServerMessage` lines. Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itempiles_domain::ModuleSettings;
use itempiles_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    memory_store::InMemoryDocumentStore,
    ports::{ClockPort, RpcError, RpcPort, SettingsRepo},
    settings::{InMemorySettingsRepo, SqliteSettingsRepo},
};
use itempiles_engine::{App, EngineConfig};
use itempiles_shared::{ClientMessage, ErrorCode, PileResponse, ResponseResult, ServerMessage};

/// Outgoing line buffer shared by replies and mirrored broadcasts.
const OUTBOX: usize = 256;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itempiles_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Item Piles Engine");

    let config = EngineConfig::from_env();

    let settings: Arc<dyn SettingsRepo> = match &config.settings_db {
        Some(path) => {
            tracing::info!("Module settings stored in {}", path);
            let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
            Arc::new(SqliteSettingsRepo::new(path, clock).await?)
        }
        None => Arc::new(InMemorySettingsRepo::new(Some(ModuleSettings::from_env()))),
    };

    let store = Arc::new(InMemoryDocumentStore::new(Arc::new(SystemRandom::new())));
    if let Some(world) = &config.world {
        let seeded = store.seed_from_file(world).await?;
        tracing::info!(documents = seeded, "Seeded world from {}", world.display());
    }

    let app = Arc::new(App::new(store, settings, &config));
    let executor = app.start_executor().await;

    let (outbox, mut lines_out) = mpsc::channel::<ServerMessage>(OUTBOX);
    app.rpc.set_mirror(outbox.clone()).await;

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = lines_out.recv().await {
            let mut line = match serde_json::to_string(&message) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Failed to serialize outgoing message: {}", e);
                    continue;
                }
            };
            line.push('\n');
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                tracing::error!("stdout closed: {}", e);
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message = match serde_json::from_str::<ClientMessage>(&line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Unparseable bridge line: {}", e);
                let _ = outbox
                    .send(ServerMessage::Error {
                        message: e.to_string(),
                    })
                    .await;
                continue;
            }
        };

        match message {
            ClientMessage::Call { request_id, call } => {
                let app = app.clone();
                let outbox = outbox.clone();
                tokio::spawn(async move {
                    let result = reply(app.rpc.execute_as_privileged(call).await);
                    let _ = outbox
                        .send(ServerMessage::Response { request_id, result })
                        .await;
                });
            }
            ClientMessage::Heartbeat => {
                let _ = outbox.send(ServerMessage::Pong).await;
            }
            ClientMessage::Unknown => {
                tracing::debug!("Ignoring unknown bridge message");
            }
        }
    }

    tracing::info!("stdin closed, shutting down");
    app.rpc.unregister_executor().await;
    executor.abort();
    drop(outbox);
    drop(app);
    // Pending broadcasts may still hold the mirror; give them a moment to flush
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, writer).await;
    Ok(())
}

/// Wire form of an executor answer.
fn reply(result: Result<PileResponse, RpcError>) -> ResponseResult {
    match result {
        Ok(data) => ResponseResult::success(data),
        Err(RpcError::Remote { code, message }) => ResponseResult::error(code, message),
        Err(e @ RpcError::CoordinatorUnavailable) => {
            ResponseResult::error(ErrorCode::ServiceUnavailable, e.to_string())
        }
        Err(e @ RpcError::UnexpectedResponse { .. }) => {
            ResponseResult::error(ErrorCode::InternalError, e.to_string())
        }
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
