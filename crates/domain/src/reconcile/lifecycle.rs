//! Pile lifecycle decisions that follow from reconciliation.

use serde_json::Value;

use itempiles_domain::{DocumentKind, DynamicAttribute, Item, ModuleSettings, PileDocument};

use super::attributes::has_positive_attribute;

/// No item lines and no positive configured attribute.
pub fn is_pile_empty(items: &[Item], system: &Value, attributes: &[DynamicAttribute]) -> bool {
    items.is_empty() && !has_positive_attribute(system, attributes)
}

/// Whether a document should be deleted after a removal emptied it.
///
/// Only enabled token piles are ever auto-deleted; actors are world data.
pub fn should_delete_pile(document: &PileDocument, settings: &ModuleSettings) -> bool {
    let Some(pile) = document.pile.as_ref().filter(|p| p.enabled) else {
        return false;
    };
    if document.kind() != DocumentKind::Token {
        return false;
    }
    if !pile.delete_when_empty.resolve(settings.delete_empty_piles) {
        return false;
    }
    let attributes = pile.effective_attributes(&settings.dynamic_attributes);
    is_pile_empty(&document.items, &document.system, attributes)
}
