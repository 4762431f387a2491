//! Headless presentation adapter.
//!
//! Stands in for a participant's client when the engine runs without one:
//! sounds, warnings and inventory views become log lines and drop prompts
//! answer with a fixed policy.

use async_trait::async_trait;

use itempiles_domain::{DocumentUuid, Item};

use crate::infrastructure::ports::{
    DropChoice, DropPrompt, DropPromptPort, InventoryUiPort, NotifyPort, SoundPort,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingUi;

impl SoundPort for TracingUi {
    fn play(&self, src: &str) {
        tracing::info!(sound = %src, "Playing sound");
    }
}

impl NotifyPort for TracingUi {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

impl InventoryUiPort for TracingUi {
    fn rerender_inventory(&self, target: &DocumentUuid, deleted: bool) {
        tracing::debug!(pile = %target, deleted, "Inventory rerender");
    }

    fn rerender_token_hud(&self, target: &DocumentUuid) {
        tracing::debug!(pile = %target, "Token HUD rerender");
    }

    fn open_inventory(&self, target: &DocumentUuid, inspecting: Option<DocumentUuid>) {
        match inspecting {
            Some(actor) => tracing::info!(pile = %target, inspecting = %actor, "Inventory opened"),
            None => tracing::info!(pile = %target, "Inventory opened"),
        }
    }
}

/// Refuses filtered item types and drops the whole stack onto an existing
/// pile when there is one.
#[async_trait]
impl DropPromptPort for TracingUi {
    async fn confirm_disallowed_item(&self, item: &Item) -> bool {
        tracing::debug!(item = %item.name, "Disallowed item refused without a prompt");
        false
    }

    async fn choose_drop(&self, prompt: DropPrompt) -> Option<DropChoice> {
        Some(DropChoice {
            quantity: prompt.max_quantity,
            new_pile: false,
        })
    }
}
