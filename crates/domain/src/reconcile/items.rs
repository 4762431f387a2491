//! Item reconciliation: matching, merging and add/remove planning.

use itempiles_domain::{
    Item, ItemDelta, ItemId, ItemSchema, QuantityChange, RemoveRequest, TransferRecord,
};

/// New stack size for an existing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityUpdate {
    pub id: ItemId,
    pub quantity: u32,
}

fn same_identity(line: &Item, candidate: &Item, schema: &ItemSchema) -> bool {
    line.name == candidate.name && schema.item_type(line) == schema.item_type(candidate)
}

/// Index of the line equivalent to `candidate`: same id first, otherwise the
/// first line (in source order) with the same name and type value.
pub fn find_similar_index<'a, I>(lines: I, candidate: &Item, schema: &ItemSchema) -> Option<usize>
where
    I: IntoIterator<Item = &'a Item>,
    I::IntoIter: Clone,
{
    let lines = lines.into_iter();
    lines
        .clone()
        .position(|line| line.id == candidate.id)
        .or_else(|| lines.clone().position(|line| same_identity(line, candidate, schema)))
}

pub fn find_similar_item<'a>(
    lines: &'a [Item],
    candidate: &Item,
    schema: &ItemSchema,
) -> Option<&'a Item> {
    find_similar_index(lines, candidate, schema).map(|i| &lines[i])
}

#[derive(Debug, Clone, PartialEq)]
enum PlannedRecord {
    Updated { item: Item, added: u32 },
    Created { index: usize, added: u32 },
}

/// Result of planning an add: what to write, and how to report it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddPlan {
    pub updates: Vec<QuantityUpdate>,
    /// New lines, quantity already written into their data
    pub creates: Vec<Item>,
    records: Vec<PlannedRecord>,
}

impl AddPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.creates.is_empty()
    }

    /// Build the transfer records once the store has assigned ids to the
    /// created lines. `created` must be in the same order as `creates`.
    pub fn into_records(self, created: &[Item]) -> Vec<TransferRecord> {
        let AddPlan {
            creates, records, ..
        } = self;
        records
            .into_iter()
            .filter_map(|record| match record {
                PlannedRecord::Updated { item, added } => Some(TransferRecord {
                    item,
                    quantity: added,
                    deleted: false,
                }),
                PlannedRecord::Created { index, added } => created
                    .get(index)
                    .or_else(|| creates.get(index))
                    .map(|item| TransferRecord {
                        item: item.clone(),
                        quantity: added,
                        deleted: false,
                    }),
            })
            .collect()
    }
}

struct WorkingLine {
    item: Item,
    existing: bool,
    quantity: u32,
    added: u32,
}

/// Plan adding `deltas` to a document holding `existing` lines.
///
/// Matching lines get their quantity increased; everything else becomes a new
/// line. Several deltas for the same identity merge into one resulting line,
/// which yields exactly one record.
pub fn plan_add_items(existing: &[Item], deltas: &[ItemDelta], schema: &ItemSchema) -> AddPlan {
    let mut working: Vec<WorkingLine> = existing
        .iter()
        .map(|item| WorkingLine {
            item: item.clone(),
            existing: true,
            quantity: schema.quantity(item),
            added: 0,
        })
        .collect();
    let mut touched: Vec<usize> = Vec::new();

    for delta in deltas.iter().filter(|d| d.quantity > 0) {
        let index = match find_similar_index(working.iter().map(|w| &w.item), &delta.item, schema) {
            Some(index) => {
                let line = &mut working[index];
                line.quantity = line.quantity.saturating_add(delta.quantity);
                line.added = line.added.saturating_add(delta.quantity);
                index
            }
            None => {
                working.push(WorkingLine {
                    item: delta.item.clone(),
                    existing: false,
                    quantity: delta.quantity,
                    added: delta.quantity,
                });
                working.len() - 1
            }
        };
        if !touched.contains(&index) {
            touched.push(index);
        }
    }

    let mut plan = AddPlan::default();
    for index in touched {
        let line = &working[index];
        let mut item = line.item.clone();
        schema.set_quantity(&mut item, line.quantity);
        if line.existing {
            plan.updates.push(QuantityUpdate {
                id: item.id.clone(),
                quantity: line.quantity,
            });
            plan.records.push(PlannedRecord::Updated {
                item,
                added: line.added,
            });
        } else {
            plan.records.push(PlannedRecord::Created {
                index: plan.creates.len(),
                added: line.added,
            });
            plan.creates.push(item);
        }
    }
    plan
}

/// Result of planning a removal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemovePlan {
    pub updates: Vec<QuantityUpdate>,
    pub deletes: Vec<ItemId>,
    pub records: Vec<TransferRecord>,
    /// Requested ids not present on the document
    pub skipped: Vec<ItemId>,
}

impl RemovePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Plan removing units from `existing` lines.
///
/// Each line ends at `max(0, current - requested)`. A line reaching zero is
/// deleted and reports what it actually held, which can be less than asked.
pub fn plan_remove_items(
    existing: &[Item],
    requests: &[RemoveRequest],
    schema: &ItemSchema,
) -> RemovePlan {
    // (line index, remaining, removed)
    let mut touched: Vec<(usize, u32, u32)> = Vec::new();
    let mut plan = RemovePlan::default();

    for request in requests {
        let Some(index) = existing.iter().position(|item| item.id == request.id) else {
            if !plan.skipped.contains(&request.id) {
                plan.skipped.push(request.id.clone());
            }
            continue;
        };
        let slot = match touched.iter().position(|(i, _, _)| *i == index) {
            Some(slot) => slot,
            None => {
                touched.push((index, schema.quantity(&existing[index]), 0));
                touched.len() - 1
            }
        };
        let (_, remaining, removed) = &mut touched[slot];
        let requested = request.quantity.unwrap_or(*remaining);
        if requested == 0 {
            continue;
        }
        let change = QuantityChange::subtract(*remaining, requested);
        *remaining = change.remaining();
        *removed += change.removed();
    }

    for (index, remaining, removed) in touched {
        if removed == 0 {
            continue;
        }
        let original = &existing[index];
        if remaining >= 1 {
            let mut item = original.clone();
            schema.set_quantity(&mut item, remaining);
            plan.updates.push(QuantityUpdate {
                id: item.id.clone(),
                quantity: remaining,
            });
            plan.records.push(TransferRecord {
                item,
                quantity: removed,
                deleted: false,
            });
        } else {
            plan.deletes.push(original.id.clone());
            plan.records.push(TransferRecord {
                item: original.clone(),
                quantity: removed,
                deleted: true,
            });
        }
    }
    plan
}

/// The transfer composition rule: what a target receives is exactly what
/// the source confirmed as removed, never the requested amount.
pub fn carry_removed(removed: &[TransferRecord]) -> Vec<ItemDelta> {
    removed
        .iter()
        .filter(|record| record.quantity > 0)
        .map(|record| ItemDelta {
            item: record.item.clone(),
            quantity: record.quantity,
        })
        .collect()
}

/// Lines eligible for bulk transfer: everything whose type is not filtered.
pub fn filter_transferable_items<'a>(
    lines: &'a [Item],
    type_filters: &[String],
    schema: &ItemSchema,
) -> Vec<&'a Item> {
    lines
        .iter()
        .filter(|item| !schema.is_filtered(item, type_filters))
        .collect()
}

/// Whole-stack removal requests for `lines`.
pub fn remove_all_requests(lines: &[&Item]) -> Vec<RemoveRequest> {
    lines
        .iter()
        .map(|item| RemoveRequest {
            id: item.id.clone(),
            quantity: None,
        })
        .collect()
}
