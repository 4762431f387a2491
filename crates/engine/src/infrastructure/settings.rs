//! Module settings storage: SQLite-backed and in-memory.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tokio::sync::RwLock;

use itempiles_domain::ModuleSettings;

use crate::infrastructure::ports::{ClockPort, RepoError, SettingsRepo};

/// SQLite implementation for module settings storage.
pub struct SqliteSettingsRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteSettingsRepo {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("settings", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS module_settings (
                scope TEXT NOT NULL PRIMARY KEY,
                settings_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("settings", e))?;

        Ok(Self { pool, clock })
    }

    async fn get_by_scope(&self, scope: &str) -> Result<Option<ModuleSettings>, RepoError> {
        let row = sqlx::query("SELECT settings_json FROM module_settings WHERE scope = ?")
            .bind(scope)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("settings", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("settings_json");
                let settings = serde_json::from_str(&json).map_err(RepoError::serialization)?;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    async fn save_by_scope(&self, scope: &str, settings: &ModuleSettings) -> Result<(), RepoError> {
        let json = serde_json::to_string(settings).map_err(RepoError::serialization)?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO module_settings (scope, settings_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(scope) DO UPDATE SET
                settings_json = excluded.settings_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(scope)
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("settings", e))?;

        Ok(())
    }
}

#[async_trait]
impl SettingsRepo for SqliteSettingsRepo {
    async fn get_global(&self) -> Result<Option<ModuleSettings>, RepoError> {
        self.get_by_scope("global").await
    }

    async fn save_global(&self, settings: &ModuleSettings) -> Result<(), RepoError> {
        self.save_by_scope("global", settings).await
    }
}

/// Settings held in process memory (tests, throwaway bridges).
#[derive(Default)]
pub struct InMemorySettingsRepo {
    settings: RwLock<Option<ModuleSettings>>,
}

impl InMemorySettingsRepo {
    pub fn new(settings: Option<ModuleSettings>) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsRepo for InMemorySettingsRepo {
    async fn get_global(&self) -> Result<Option<ModuleSettings>, RepoError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save_global(&self, settings: &ModuleSettings) -> Result<(), RepoError> {
        *self.settings.write().await = Some(settings.clone());
        Ok(())
    }
}
