//! Quantity arithmetic for inventory lines and attribute pools

use serde::{Deserialize, Serialize};

/// Outcome of taking an amount away from an inventory line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityChange {
    /// The line survives with `remaining` units; `removed` is what was taken
    Updated { remaining: u32, removed: u32 },
    /// The line is used up; `removed` is everything it held, which may be
    /// less than was asked for
    Depleted { removed: u32 },
}

impl QuantityChange {
    /// Subtract `requested` from `current`, never going below zero.
    pub fn subtract(current: u32, requested: u32) -> Self {
        let remaining = current.saturating_sub(requested);
        if remaining >= 1 {
            Self::Updated {
                remaining,
                removed: requested,
            }
        } else {
            Self::Depleted { removed: current }
        }
    }

    pub fn should_remove(&self) -> bool {
        matches!(self, Self::Depleted { .. })
    }

    pub fn removed(&self) -> u32 {
        match self {
            Self::Updated { removed, .. } | Self::Depleted { removed } => *removed,
        }
    }

    pub fn remaining(&self) -> u32 {
        match self {
            Self::Updated { remaining, .. } => *remaining,
            Self::Depleted { .. } => 0,
        }
    }
}

/// Subtract from a scalar pool, clamping at zero.
///
/// Returns `(new_value, amount_actually_removed)`.
pub fn clamp_subtract(current: f64, requested: f64) -> (f64, f64) {
    let current = current.max(0.0);
    let removed = requested.max(0.0).min(current);
    (current - removed, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtract_partial() {
        assert_eq!(
            QuantityChange::subtract(5, 3),
            QuantityChange::Updated {
                remaining: 2,
                removed: 3
            }
        );
    }

    #[test]
    fn test_subtract_exact() {
        assert_eq!(
            QuantityChange::subtract(5, 5),
            QuantityChange::Depleted { removed: 5 }
        );
    }

    #[test]
    fn test_subtract_more_than_held_reports_actual() {
        let change = QuantityChange::subtract(5, 7);
        assert!(change.should_remove());
        assert_eq!(change.removed(), 5);
        assert_eq!(change.remaining(), 0);
    }

    #[test]
    fn test_never_negative_for_any_pair() {
        for current in 0..12u32 {
            for requested in 0..12u32 {
                let change = QuantityChange::subtract(current, requested);
                assert_eq!(change.remaining(), current.saturating_sub(requested));
                assert!(change.removed() <= current.max(requested));
            }
        }
    }

    #[test]
    fn test_clamp_subtract() {
        assert_eq!(clamp_subtract(10.0, 4.0), (6.0, 4.0));
        assert_eq!(clamp_subtract(3.0, 4.0), (0.0, 3.0));
        assert_eq!(clamp_subtract(3.0, -1.0), (3.0, 0.0));
    }
}
