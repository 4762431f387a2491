//! Transfer reconciliation engine.
//!
//! Pure functions that turn an inventory snapshot plus requested deltas into
//! the writes to perform and the records to report. No I/O happens here; the
//! coordinator persists plans and broadcasts their records.

mod attributes;
mod items;
mod lifecycle;

pub use attributes::{
    all_transferable_attributes, has_positive_attribute, plan_add_attributes,
    plan_remove_attributes, transferable_attributes, AttributeAmounts, AttributePlan,
};
pub use items::{
    carry_removed, filter_transferable_items, find_similar_index, find_similar_item,
    plan_add_items, plan_remove_items, remove_all_requests, AddPlan, QuantityUpdate, RemovePlan,
};
pub use lifecycle::{is_pile_empty, should_delete_pile};

#[cfg(test)]
mod tests {
    use super::*;
    use itempiles_domain::{Item, ItemId, ItemSchema, RemoveRequest};
    use serde_json::json;

    fn arrow(id: &str, quantity: u32) -> Item {
        Item {
            id: ItemId::new(id).unwrap(),
            name: "Arrow".into(),
            img: None,
            data: json!({"type": "ammo", "system": {"quantity": quantity}}),
        }
    }

    // Apply a remove plan and an add plan to plain vectors, as a store would.
    fn apply_remove(lines: &mut Vec<Item>, plan: &RemovePlan, schema: &ItemSchema) {
        lines.retain(|line| !plan.deletes.contains(&line.id));
        for update in &plan.updates {
            if let Some(line) = lines.iter_mut().find(|l| l.id == update.id) {
                schema.set_quantity(line, update.quantity);
            }
        }
    }

    fn apply_add(lines: &mut Vec<Item>, plan: AddPlan, schema: &ItemSchema) -> Vec<Item> {
        for update in &plan.updates {
            if let Some(line) = lines.iter_mut().find(|l| l.id == update.id) {
                schema.set_quantity(line, update.quantity);
            }
        }
        lines.extend(plan.creates.iter().cloned());
        plan.creates
    }

    fn quantities(lines: &[Item], schema: &ItemSchema) -> Vec<(String, u32)> {
        let mut out: Vec<_> = lines
            .iter()
            .map(|l| (l.name.clone(), schema.quantity(l)))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_transfer_round_trip_restores_quantities() {
        let schema = ItemSchema::default();
        let mut a = vec![arrow("a1", 10)];
        let mut b = vec![arrow("b1", 2)];
        let original_a = quantities(&a, &schema);
        let original_b = quantities(&b, &schema);

        // A -> B
        let removed = plan_remove_items(
            &a,
            &[RemoveRequest {
                id: ItemId::new("a1").unwrap(),
                quantity: Some(4),
            }],
            &schema,
        );
        apply_remove(&mut a, &removed, &schema);
        let plan = plan_add_items(&b, &carry_removed(&removed.records), &schema);
        let created = apply_add(&mut b, plan.clone(), &schema);
        let returned = plan.into_records(&created);
        assert_eq!(returned[0].quantity, 4);

        // B -> A with exactly the returned records
        let requests: Vec<RemoveRequest> = returned
            .iter()
            .map(|r| RemoveRequest {
                id: r.item.id.clone(),
                quantity: Some(r.quantity),
            })
            .collect();
        let removed = plan_remove_items(&b, &requests, &schema);
        apply_remove(&mut b, &removed, &schema);
        let plan = plan_add_items(&a, &carry_removed(&removed.records), &schema);
        apply_add(&mut a, plan, &schema);

        assert_eq!(quantities(&a, &schema), original_a);
        assert_eq!(quantities(&b, &schema), original_b);
    }
}
