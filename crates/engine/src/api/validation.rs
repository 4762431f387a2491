//! Guard checks run against the caller's local view before dispatch.

use itempiles_domain::{
    AttributeAmounts, DocumentUuid, Item, ItemDelta, ItemSchema, PileDocument, RemoveRequest,
};

use super::error::ValidationError;

/// Parse a raw uuid string handed in by a caller.
pub fn parse_uuid(raw: &str) -> Result<DocumentUuid, ValidationError> {
    DocumentUuid::parse(raw).map_err(|_| ValidationError::InvalidUuid(raw.to_string()))
}

pub fn require_pile(document: &PileDocument) -> Result<(), ValidationError> {
    if document.is_valid_pile() {
        Ok(())
    } else {
        Err(ValidationError::NotAPile(document.uuid.clone()))
    }
}

/// Stacks are whole units; a fractional one would be truncated on write.
pub fn validate_stack(item: &Item, schema: &ItemSchema) -> Result<(), ValidationError> {
    match schema.invalid_quantity(item) {
        Some(amount) => Err(ValidationError::InvalidAmount {
            field: format!("{} quantity", item.name),
            amount,
        }),
        None => Ok(()),
    }
}

pub fn validate_additions(items: &[ItemDelta], schema: &ItemSchema) -> Result<(), ValidationError> {
    for delta in items {
        if delta.quantity == 0 {
            return Err(ValidationError::ZeroQuantity(delta.item.name.clone()));
        }
        validate_stack(&delta.item, schema)?;
    }
    Ok(())
}

/// Every requested line must exist on `source` and hold a whole stack.
pub fn validate_removals(
    source: &PileDocument,
    requests: &[RemoveRequest],
    schema: &ItemSchema,
) -> Result<(), ValidationError> {
    for request in requests {
        let Some(line) = source.item(&request.id) else {
            return Err(ValidationError::MissingItem {
                target: source.uuid.clone(),
                id: request.id.clone(),
            });
        };
        validate_stack(line, schema)?;
        if request.quantity == Some(0) {
            return Err(ValidationError::ZeroQuantity(request.id.to_string()));
        }
    }
    Ok(())
}

/// Every path must exist on `document` with a finite, non-negative amount.
pub fn validate_attributes(
    document: &PileDocument,
    attributes: &AttributeAmounts,
) -> Result<(), ValidationError> {
    for (path, amount) in attributes {
        if !amount.is_finite() || *amount < 0.0 {
            return Err(ValidationError::InvalidAmount {
                field: path.to_string(),
                amount: *amount,
            });
        }
        if !path.exists(&document.system) {
            return Err(ValidationError::MissingAttribute {
                target: document.uuid.clone(),
                path: path.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{actor, gold, item};
    use itempiles_domain::ItemId;
    use serde_json::json;

    #[test]
    fn malformed_uuid_is_rejected() {
        assert_eq!(
            parse_uuid("Nonsense"),
            Err(ValidationError::InvalidUuid("Nonsense".into()))
        );
        assert!(parse_uuid("Actor.bob").is_ok());
    }

    #[test]
    fn removal_of_unknown_item_is_rejected() {
        let bob = actor("bob", vec![item("arrow", "Arrow", "consumable", 3)], json!({}));
        let request = RemoveRequest {
            id: ItemId::new("sword").unwrap(),
            quantity: Some(1),
        };
        assert!(matches!(
            validate_removals(&bob, &[request], &ItemSchema::default()),
            Err(ValidationError::MissingItem { .. })
        ));
    }

    #[test]
    fn absent_attribute_path_is_rejected() {
        let bob = actor("bob", vec![], json!({"hp": 3}));
        let mut attributes = AttributeAmounts::new();
        attributes.insert(gold(), 5.0);
        assert!(matches!(
            validate_attributes(&bob, &attributes),
            Err(ValidationError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn negative_or_nan_amounts_are_rejected() {
        let bob = actor("bob", vec![], json!({"currency": {"gold": 3}}));
        for amount in [-1.0, f64::NAN] {
            let mut attributes = AttributeAmounts::new();
            attributes.insert(gold(), amount);
            assert!(matches!(
                validate_attributes(&bob, &attributes),
                Err(ValidationError::InvalidAmount { .. })
            ));
        }
    }

    #[test]
    fn zero_quantity_addition_is_rejected() {
        let delta = ItemDelta {
            item: item("arrow", "Arrow", "consumable", 1),
            quantity: 0,
        };
        assert!(validate_additions(&[delta], &ItemSchema::default()).is_err());
    }

    #[test]
    fn fractional_stacks_are_rejected() {
        let schema = ItemSchema::default();
        let mut torch = item("torch", "Torch", "consumable", 1);
        torch.data = json!({"type": "consumable", "system": {"quantity": 2.5}});

        let delta = ItemDelta {
            item: torch.clone(),
            quantity: 2,
        };
        assert!(matches!(
            validate_additions(&[delta], &schema),
            Err(ValidationError::InvalidAmount { amount, .. }) if amount == 2.5
        ));

        let bob = actor("bob", vec![torch], json!({}));
        let request = RemoveRequest {
            id: ItemId::new("torch").unwrap(),
            quantity: Some(1),
        };
        assert!(matches!(
            validate_removals(&bob, &[request], &schema),
            Err(ValidationError::InvalidAmount { .. })
        ));
    }
}
