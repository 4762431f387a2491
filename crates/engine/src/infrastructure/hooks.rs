//! In-process hook registry.

use std::sync::Arc;

use dashmap::DashMap;

use itempiles_shared::{HookName, HookPayload};

use crate::infrastructure::ports::{HookPort, Outcome};

/// A registered listener.
pub type HookListener = Arc<dyn Fn(&HookPayload) -> Outcome + Send + Sync>;

/// Listeners keyed by hook name, called in registration order.
#[derive(Default)]
pub struct HookRegistry {
    listeners: DashMap<HookName, Vec<HookListener>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, hook: HookName, listener: HookListener) {
        self.listeners.entry(hook).or_default().push(listener);
    }

    /// Register a listener that never vetoes.
    pub fn on(&self, hook: HookName, listener: impl Fn(&HookPayload) + Send + Sync + 'static) {
        self.register(
            hook,
            Arc::new(move |payload: &HookPayload| {
                listener(payload);
                Outcome::Proceed
            }),
        );
    }

    pub fn clear(&self, hook: HookName) {
        self.listeners.remove(&hook);
    }

    fn snapshot(&self, hook: HookName) -> Vec<HookListener> {
        // Clone out so listeners may register others without deadlocking
        self.listeners
            .get(&hook)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

impl HookPort for HookRegistry {
    fn call_pre(&self, hook: HookName, payload: &HookPayload) -> Outcome {
        for listener in self.snapshot(hook) {
            if listener(payload).is_veto() {
                tracing::debug!(hook = %hook, "Hook vetoed");
                return Outcome::Veto;
            }
        }
        Outcome::Proceed
    }

    fn call(&self, hook: HookName, payload: &HookPayload) {
        for listener in self.snapshot(hook) {
            let _ = listener(payload);
        }
    }
}
