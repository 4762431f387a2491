//! In-process macro registry.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::infrastructure::ports::{MacroError, MacroInvocation, MacroPort};

pub type MacroFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// A macro body. Receives the invocation and reports failure as text.
pub type MacroHandler = Arc<dyn Fn(MacroInvocation) -> MacroFuture + Send + Sync>;

/// Macros by name.
#[derive(Default)]
pub struct MacroRegistry {
    macros: DashMap<String, MacroHandler>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, handler: MacroHandler) {
        self.macros.insert(name.into(), handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }
}

#[async_trait]
impl MacroPort for MacroRegistry {
    async fn execute(&self, name: &str, invocation: MacroInvocation) -> Result<(), MacroError> {
        let handler = self
            .macros
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MacroError::NotFound(name.to_string()))?;

        tracing::debug!(macro_name = %name, action = ?invocation.action, "Running pile macro");
        handler(invocation).await.map_err(|message| MacroError::Failed {
            name: name.to_string(),
            message,
        })
    }
}
