//! Attribute reconciliation: numeric pools addressed by path.

use std::collections::BTreeMap;

use serde_json::Value;

use itempiles_domain::{clamp_subtract, AttributePath, DynamicAttribute};

/// Amounts keyed by attribute path.
pub type AttributeAmounts = BTreeMap<AttributePath, f64>;

/// Absolute values to write plus the amounts to report back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributePlan {
    pub updates: AttributeAmounts,
    pub records: AttributeAmounts,
}

impl AttributePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Apply the planned absolute values to a system blob.
    pub fn apply(&self, system: &mut Value) {
        for (path, value) in &self.updates {
            path.set_number(system, *value);
        }
    }
}

/// Plan adding to attributes. Records carry the new totals.
pub fn plan_add_attributes(system: &Value, deltas: &AttributeAmounts) -> AttributePlan {
    let mut plan = AttributePlan::default();
    for (path, amount) in deltas {
        if *amount <= 0.0 {
            continue;
        }
        let current = path.get_number(system).unwrap_or(0.0);
        let total = current + amount;
        plan.updates.insert(path.clone(), total);
        plan.records.insert(path.clone(), total);
    }
    plan
}

/// Plan removing from attributes. Values clamp at zero and records carry
/// what was actually removed.
pub fn plan_remove_attributes(system: &Value, deltas: &AttributeAmounts) -> AttributePlan {
    let mut plan = AttributePlan::default();
    for (path, amount) in deltas {
        let current = path.get_number(system).unwrap_or(0.0);
        let (next, removed) = clamp_subtract(current, *amount);
        if removed <= 0.0 {
            continue;
        }
        plan.updates.insert(path.clone(), next);
        plan.records.insert(path.clone(), removed);
    }
    plan
}

/// Requested attributes that can actually move: positive on the source and
/// present on the target.
pub fn transferable_attributes(
    source: &Value,
    target: &Value,
    requested: &AttributeAmounts,
) -> AttributeAmounts {
    requested
        .iter()
        .filter(|(path, amount)| {
            **amount > 0.0
                && path.get_number(source).is_some_and(|v| v > 0.0)
                && path.exists(target)
        })
        .map(|(path, amount)| (path.clone(), *amount))
        .collect()
}

/// Every configured attribute the source holds a positive amount of and the
/// target can receive, at the source's full value.
pub fn all_transferable_attributes(
    source: &Value,
    target: &Value,
    attributes: &[DynamicAttribute],
) -> AttributeAmounts {
    attributes
        .iter()
        .filter(|attribute| attribute.path.exists(target))
        .filter_map(|attribute| {
            attribute
                .path
                .get_number(source)
                .filter(|v| *v > 0.0)
                .map(|v| (attribute.path.clone(), v))
        })
        .collect()
}

/// True when any configured attribute holds a positive amount.
pub fn has_positive_attribute(system: &Value, attributes: &[DynamicAttribute]) -> bool {
    attributes
        .iter()
        .any(|attribute| attribute.path.get_number(system).is_some_and(|v| v > 0.0))
}
