//! Pile entity - container/loot configuration attached to a token or actor
//!
//! Pile data is persisted by the host as a flag object on the document. Keys
//! use the host's camelCase naming so stored flags round-trip unchanged.
//!
//! # Container states
//!
//! ```text
//!   Open  <-- open / close -->  Closed  <-- unlock / lock -->  Locked
//! ```
//!
//! `lock` from `Open` closes first. `open` on a `Locked` pile is refused and
//! becomes a rattle instead.

use serde::{Deserialize, Serialize};

use itempiles_domain::DynamicAttribute;

/// Whether an emptied pile deletes its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteWhenEmpty {
    /// Follow the global `delete_empty_piles` setting
    #[default]
    Default,
    True,
    False,
}

impl DeleteWhenEmpty {
    pub fn resolve(self, global_default: bool) -> bool {
        match self {
            Self::Default => global_default,
            Self::True => true,
            Self::False => false,
        }
    }
}

// Stored by the host as "default" | true | false (older data uses "true"/"false").
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DeleteWhenEmptyRepr {
    Flag(bool),
    Text(String),
}

impl Serialize for DeleteWhenEmpty {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Default => DeleteWhenEmptyRepr::Text("default".to_string()),
            Self::True => DeleteWhenEmptyRepr::Flag(true),
            Self::False => DeleteWhenEmptyRepr::Flag(false),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DeleteWhenEmpty {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match DeleteWhenEmptyRepr::deserialize(deserializer)? {
            DeleteWhenEmptyRepr::Flag(true) => Self::True,
            DeleteWhenEmptyRepr::Flag(false) => Self::False,
            DeleteWhenEmptyRepr::Text(text) => match text.as_str() {
                "true" => Self::True,
                "false" => Self::False,
                _ => Self::Default,
            },
        })
    }
}

/// Maximum interaction range in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Distance {
    Grid(f64),
    Unbounded,
}

impl Distance {
    pub fn allows(&self, distance: f64) -> bool {
        match self {
            Self::Grid(max) => distance <= *max,
            Self::Unbounded => true,
        }
    }
}

impl From<Option<f64>> for Distance {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(d) if d.is_finite() && d >= 0.0 => Self::Grid(d),
            _ => Self::Unbounded,
        }
    }
}

impl From<Distance> for Option<f64> {
    fn from(value: Distance) -> Self {
        match value {
            Distance::Grid(d) => Some(d),
            Distance::Unbounded => None,
        }
    }
}

impl Default for Distance {
    fn default() -> Self {
        Self::Grid(1.0)
    }
}

/// Pile configuration flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PileData {
    pub enabled: bool,
    pub distance: Distance,
    #[serde(rename = "macro")]
    pub macro_name: String,
    pub delete_when_empty: DeleteWhenEmpty,

    // Container
    pub is_container: bool,
    pub closed: bool,
    pub locked: bool,
    pub closed_image: String,
    pub empty_image: String,
    pub opened_image: String,
    pub locked_image: String,
    pub close_sound: String,
    pub open_sound: String,
    pub locked_sound: String,

    // Single-item display
    pub display_one: bool,
    pub show_item_name: bool,
    pub override_single_item_scale: bool,
    pub single_item_scale: f64,

    /// Per-pile override of the global item type filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type_filters: Option<Vec<String>>,
    /// Per-pile override of the global dynamic attributes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_attributes: Option<Vec<DynamicAttribute>>,
}

impl Default for PileData {
    fn default() -> Self {
        Self {
            enabled: false,
            distance: Distance::default(),
            macro_name: String::new(),
            delete_when_empty: DeleteWhenEmpty::Default,
            is_container: false,
            closed: false,
            locked: false,
            closed_image: String::new(),
            empty_image: String::new(),
            opened_image: String::new(),
            locked_image: String::new(),
            close_sound: String::new(),
            open_sound: String::new(),
            locked_sound: String::new(),
            display_one: false,
            show_item_name: false,
            override_single_item_scale: false,
            single_item_scale: 1.0,
            item_type_filters: None,
            override_attributes: None,
        }
    }
}

/// Observable container state derived from `closed`/`locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Open,
    Closed,
    Locked,
}

/// A requested container transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerAction {
    Open,
    Close,
    Lock,
    Unlock,
}

/// What a container transition would do, computed before any hook runs.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionPlan {
    /// Disabled pile or not a container
    NotApplicable,
    /// Opening a locked container; signal failure without changing state
    Rattle,
    /// Persist `next`. The flags say which booleans actually flip, which
    /// may be none for a redundant request.
    Apply {
        next: Box<PileData>,
        closing: bool,
        opening: bool,
        locking: bool,
        unlocking: bool,
    },
}

impl TransitionPlan {
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            Self::Apply {
                closing: false,
                opening: false,
                locking: false,
                unlocking: false,
                ..
            }
        )
    }
}

impl PileData {
    /// Defaults for piles spawned from the provisioned template actor.
    pub fn spawned_defaults() -> Self {
        Self {
            enabled: true,
            delete_when_empty: DeleteWhenEmpty::True,
            display_one: true,
            show_item_name: true,
            override_single_item_scale: true,
            single_item_scale: 0.75,
            ..Self::default()
        }
    }

    pub fn container_state(&self) -> ContainerState {
        if self.locked {
            ContainerState::Locked
        } else if self.closed {
            ContainerState::Closed
        } else {
            ContainerState::Open
        }
    }

    /// Re-establish `locked => closed` after an arbitrary merge.
    pub fn normalized(mut self) -> Self {
        if self.locked {
            self.closed = true;
        }
        self
    }

    pub fn plan_transition(&self, action: ContainerAction) -> TransitionPlan {
        if !self.enabled || !self.is_container {
            return TransitionPlan::NotApplicable;
        }
        let state = self.container_state();
        let next_state = match (action, state) {
            (ContainerAction::Open, ContainerState::Locked) => return TransitionPlan::Rattle,
            (ContainerAction::Open, _) => ContainerState::Open,
            (ContainerAction::Close, ContainerState::Locked) => ContainerState::Locked,
            (ContainerAction::Close, _) => ContainerState::Closed,
            (ContainerAction::Lock, _) => ContainerState::Locked,
            (ContainerAction::Unlock, ContainerState::Locked) => ContainerState::Closed,
            (ContainerAction::Unlock, other) => other,
        };
        let mut next = self.clone();
        next.closed = next_state != ContainerState::Open;
        next.locked = next_state == ContainerState::Locked;
        TransitionPlan::Apply {
            closing: !self.closed && next.closed,
            opening: self.closed && !next.closed,
            locking: !self.locked && next.locked,
            unlocking: self.locked && !next.locked,
            next: Box::new(next),
        }
    }

    /// Toggle between open and closed; a locked pile rattles.
    pub fn plan_toggle_closed(&self) -> TransitionPlan {
        if self.closed {
            self.plan_transition(ContainerAction::Open)
        } else {
            self.plan_transition(ContainerAction::Close)
        }
    }

    pub fn plan_toggle_locked(&self) -> TransitionPlan {
        if self.locked {
            self.plan_transition(ContainerAction::Unlock)
        } else {
            self.plan_transition(ContainerAction::Lock)
        }
    }

    pub fn macro_name(&self) -> Option<&str> {
        let name = self.macro_name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Item type filters in effect for this pile.
    pub fn effective_filters<'a>(&'a self, global: &'a [String]) -> &'a [String] {
        self.item_type_filters.as_deref().unwrap_or(global)
    }

    /// Dynamic attributes in effect for this pile.
    pub fn effective_attributes<'a>(
        &'a self,
        global: &'a [DynamicAttribute],
    ) -> &'a [DynamicAttribute] {
        self.override_attributes.as_deref().unwrap_or(global)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

impl PileData {
    pub fn open_sound(&self) -> Option<&str> {
        non_empty(&self.open_sound)
    }

    pub fn close_sound(&self) -> Option<&str> {
        non_empty(&self.close_sound)
    }

    pub fn locked_sound(&self) -> Option<&str> {
        non_empty(&self.locked_sound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn container(closed: bool, locked: bool) -> PileData {
        PileData {
            enabled: true,
            is_container: true,
            closed,
            locked,
            ..PileData::default()
        }
    }

    #[test]
    fn test_flags_deserialize_with_host_keys() {
        let data: PileData = serde_json::from_value(json!({
            "enabled": true,
            "isContainer": true,
            "deleteWhenEmpty": "default",
            "distance": null,
            "macro": "Loot Macro"
        }))
        .unwrap();
        assert!(data.is_container);
        assert_eq!(data.delete_when_empty, DeleteWhenEmpty::Default);
        assert_eq!(data.distance, Distance::Unbounded);
        assert_eq!(data.macro_name(), Some("Loot Macro"));
    }

    #[test]
    fn test_delete_when_empty_serializes_like_host() {
        let mut data = PileData::default();
        assert_eq!(serde_json::to_value(&data).unwrap()["deleteWhenEmpty"], json!("default"));
        data.delete_when_empty = DeleteWhenEmpty::True;
        assert_eq!(serde_json::to_value(&data).unwrap()["deleteWhenEmpty"], json!(true));
    }

    #[test]
    fn test_delete_when_empty_resolution() {
        assert!(DeleteWhenEmpty::Default.resolve(true));
        assert!(!DeleteWhenEmpty::Default.resolve(false));
        assert!(!DeleteWhenEmpty::False.resolve(true));
        assert!(DeleteWhenEmpty::True.resolve(false));
    }

    #[test]
    fn test_lock_from_open_closes_first() {
        let plan = container(false, false).plan_transition(ContainerAction::Lock);
        match plan {
            TransitionPlan::Apply {
                next,
                closing,
                locking,
                ..
            } => {
                assert!(next.closed && next.locked);
                assert!(closing && locking);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_open_locked_rattles() {
        assert_eq!(
            container(true, true).plan_transition(ContainerAction::Open),
            TransitionPlan::Rattle
        );
        assert_eq!(container(true, true).plan_toggle_closed(), TransitionPlan::Rattle);
    }

    #[test]
    fn test_redundant_close_is_noop() {
        let plan = container(true, false).plan_transition(ContainerAction::Close);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_close_on_locked_keeps_lock() {
        match container(true, true).plan_transition(ContainerAction::Close) {
            TransitionPlan::Apply { next, .. } => assert!(next.locked && next.closed),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_unlock_leaves_closed() {
        match container(true, true).plan_transition(ContainerAction::Unlock) {
            TransitionPlan::Apply {
                next, unlocking, ..
            } => {
                assert!(unlocking);
                assert_eq!(next.container_state(), ContainerState::Closed);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_non_container_not_applicable() {
        let mut data = container(false, false);
        data.is_container = false;
        assert_eq!(
            data.plan_transition(ContainerAction::Close),
            TransitionPlan::NotApplicable
        );
        data.is_container = true;
        data.enabled = false;
        assert_eq!(
            data.plan_transition(ContainerAction::Close),
            TransitionPlan::NotApplicable
        );
    }

    #[test]
    fn test_normalized_restores_invariant() {
        let data = PileData {
            locked: true,
            closed: false,
            ..PileData::default()
        };
        assert!(data.normalized().closed);
    }

    #[test]
    fn test_distance() {
        assert!(Distance::Grid(2.0).allows(2.0));
        assert!(!Distance::Grid(2.0).allows(5.0));
        assert!(Distance::Unbounded.allows(1e9));
    }
}
