use crate::model::Operation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregation unit keyed by contraído identifier.
///
/// Owns its operations in encounter order. The derived totals are filled in
/// by the balance calculator and are read-only for every later stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContraidoGroup {
    pub contraido_id: String,
    pub operations: Vec<Operation>,
    pub total_arqueo: f64,
    pub total_cargo_valid: f64,
    pub total_cargo_invalid: f64,
    pub net_balance: f64,
    pub has_invalid_operations: bool,
    pub needs_attention: bool,
}

impl ContraidoGroup {
    fn new(contraido_id: String) -> Self {
        Self {
            contraido_id,
            operations: Vec::new(),
            total_arqueo: 0.0,
            total_cargo_valid: 0.0,
            total_cargo_invalid: 0.0,
            net_balance: 0.0,
            has_invalid_operations: false,
            needs_attention: false,
        }
    }
}

/// Output of the grouping stage: groups in first-seen contraído order plus
/// the orphan operations in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedOperations {
    pub groups: Vec<ContraidoGroup>,
    pub orphans: Vec<Operation>,
}

impl GroupedOperations {
    /// Number of operations assigned to a group.
    pub fn grouped_count(&self) -> usize {
        self.groups.iter().map(|g| g.operations.len()).sum()
    }

    /// Total operations across groups and orphans.
    pub fn total_count(&self) -> usize {
        self.grouped_count() + self.orphans.len()
    }

    /// Iterates every operation in deterministic traversal order: groups in
    /// first-seen order (each group's operations in encounter order), then
    /// orphans in input order.
    pub fn iter_operations(&self) -> impl Iterator<Item = &Operation> {
        self.groups
            .iter()
            .flat_map(|g| g.operations.iter())
            .chain(self.orphans.iter())
    }

    fn iter_operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.operations.iter_mut())
            .chain(self.orphans.iter_mut())
    }

    /// Applies `f` to every operation. Used by the validation stage to stamp
    /// the derived validity flag.
    pub fn for_each_operation_mut<F: FnMut(&mut Operation)>(&mut self, mut f: F) {
        for op in self.iter_operations_mut() {
            f(op);
        }
    }
}

/// Partitions operations by contraído identifier. A missing or blank
/// identifier marks the operation as an orphan. No operation is duplicated
/// or dropped: the union of all group lists and the orphan list equals the
/// input exactly.
pub fn partition_by_contraido(operations: &[Operation]) -> GroupedOperations {
    let mut groups: Vec<ContraidoGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut orphans: Vec<Operation> = Vec::new();

    for op in operations {
        let id = op
            .contraido_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        match id {
            Some(id) => {
                let slot = *index.entry(id.to_string()).or_insert_with(|| {
                    groups.push(ContraidoGroup::new(id.to_string()));
                    groups.len() - 1
                });
                groups[slot].operations.push(op.clone());
            }
            None => orphans.push(op.clone()),
        }
    }

    GroupedOperations { groups, orphans }
}
