//! Participant side of the executor's broadcasts.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use itempiles_shared::{Broadcast, HookName, HookPayload};

use crate::infrastructure::ports::{HookPort, InventoryUiPort};

/// Reacts to broadcasts on one participant: post-hooks and view refreshes.
pub struct Participant {
    hooks: Arc<dyn HookPort>,
    ui: Arc<dyn InventoryUiPort>,
}

impl Participant {
    pub fn new(hooks: Arc<dyn HookPort>, ui: Arc<dyn InventoryUiPort>) -> Self {
        Self { hooks, ui }
    }

    pub fn handle_broadcast(&self, broadcast: &Broadcast) {
        match broadcast {
            Broadcast::UpdatedPile {
                target,
                diff,
                interacting,
            } => {
                let payload = HookPayload {
                    target: Some(target.clone()),
                    interacting: interacting.clone(),
                    data: diff.clone(),
                    ..HookPayload::default()
                };
                self.hooks.call(HookName::Update, &payload);
                for hook in container_hooks(diff) {
                    self.hooks.call(hook, &payload);
                }
                self.ui.rerender_inventory(target, false);
            }
            Broadcast::CallHook { hook, payload } => self.hooks.call(*hook, payload),
            Broadcast::RerenderPileInventory { target, deleted } => {
                self.ui.rerender_inventory(target, *deleted)
            }
            Broadcast::RerenderTokenHud { target } => self.ui.rerender_token_hud(target),
            Broadcast::OpenInventory { target, inspecting } => {
                self.ui.open_inventory(target, inspecting.clone())
            }
        }
    }

    /// Drain broadcasts until the executor side hangs up.
    pub async fn run(self, mut broadcasts: mpsc::Receiver<Broadcast>) {
        while let Some(broadcast) = broadcasts.recv().await {
            tracing::trace!(handler = %broadcast.handler(), "Broadcast received");
            self.handle_broadcast(&broadcast);
        }
        tracing::debug!("Broadcast channel closed");
    }
}

/// Post-events implied by a pile diff, in close, open, lock, unlock order.
fn container_hooks(diff: &serde_json::Map<String, Value>) -> Vec<HookName> {
    let flag = |key: &str| diff.get(key).and_then(Value::as_bool);
    let mut hooks = Vec::new();
    match flag("closed") {
        Some(true) => hooks.push(HookName::Close),
        Some(false) => hooks.push(HookName::Open),
        None => {}
    }
    match flag("locked") {
        Some(true) => hooks.push(HookName::Lock),
        Some(false) => hooks.push(HookName::Unlock),
        None => {}
    }
    hooks
}
