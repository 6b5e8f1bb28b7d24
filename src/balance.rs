use crate::grouping::GroupedOperations;
use serde::{Deserialize, Serialize};

/// Monetary rounding unit. Balances within this tolerance of zero are
/// treated as reconciled.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// Counts, amount sum and contributing operation numbers for one slice of a
/// phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTotals {
    pub count: usize,
    pub total_amount: f64,
    pub operations: Vec<i64>,
}

impl PhaseTotals {
    fn add(&mut self, operation_number: i64, magnitude: f64) {
        self.count += 1;
        self.total_amount += magnitude;
        self.operations.push(operation_number);
    }
}

/// Cargo-phase totals split into valid and invalid sub-totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CargoTotals {
    pub count: usize,
    pub valid: PhaseTotals,
    pub invalid: PhaseTotals,
}

/// By-phase breakdown over the whole dataset, orphans included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaseBreakdown {
    pub arqueo: PhaseTotals,
    pub cargo: CargoTotals,
}

/// Global reconciliation over the whole dataset, orphans included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calculations {
    pub total_arqueo_positive: f64,
    pub total_cargo_negative: f64,
    pub total_cargo_invalid: f64,
    pub net_balance: f64,
    /// Invalid cargo operations as a share of all cargo operations, in
    /// percent. Zero when the dataset has no cargo operations.
    pub percentage_invalid: f64,
}

/// Fills the derived totals of every group. Invalid cargo magnitudes are
/// excluded from `net_balance`: they are unconfirmed movements, reported
/// separately. Groups are immutable after this stage.
pub fn compute_group_totals(grouped: &mut GroupedOperations) {
    for group in &mut grouped.groups {
        group.total_arqueo = 0.0;
        group.total_cargo_valid = 0.0;
        group.total_cargo_invalid = 0.0;
        group.has_invalid_operations = false;

        for op in &group.operations {
            if op.is_arqueo() {
                group.total_arqueo += op.magnitude();
            } else if op.is_valid_cargo() {
                group.total_cargo_valid += op.magnitude();
            } else {
                group.total_cargo_invalid += op.magnitude();
                group.has_invalid_operations = true;
            }
        }

        group.net_balance = group.total_arqueo - group.total_cargo_valid;
        group.needs_attention = group.has_invalid_operations || group.net_balance < 0.0;
    }
}

/// Computes the by-phase breakdown in deterministic traversal order.
pub fn compute_fase_breakdown(grouped: &GroupedOperations) -> FaseBreakdown {
    let mut breakdown = FaseBreakdown::default();

    for op in grouped.iter_operations() {
        if op.is_arqueo() {
            breakdown.arqueo.add(op.operation_number, op.magnitude());
        } else {
            breakdown.cargo.count += 1;
            if op.is_valid_cargo() {
                breakdown.cargo.valid.add(op.operation_number, op.magnitude());
            } else {
                breakdown.cargo.invalid.add(op.operation_number, op.magnitude());
            }
        }
    }

    breakdown
}

/// Derives the global calculations from an already-computed breakdown.
pub fn compute_calculations(breakdown: &FaseBreakdown) -> Calculations {
    let percentage_invalid = if breakdown.cargo.count == 0 {
        0.0
    } else {
        breakdown.cargo.invalid.count as f64 / breakdown.cargo.count as f64 * 100.0
    };

    Calculations {
        total_arqueo_positive: breakdown.arqueo.total_amount,
        total_cargo_negative: breakdown.cargo.valid.total_amount,
        total_cargo_invalid: breakdown.cargo.invalid.total_amount,
        net_balance: breakdown.arqueo.total_amount - breakdown.cargo.valid.total_amount,
        percentage_invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::partition_by_contraido;
    use crate::model::{Operation, Phase};

    fn op(number: i64, phase: Phase, status: Option<i64>, amount: f64, id: Option<&str>) -> Operation {
        Operation {
            operation_number: number,
            year: 2024,
            application_code: 100,
            phase,
            status,
            amount,
            cost_center: 570,
            date: String::new(),
            third_party: String::new(),
            description: String::new(),
            contraido_id: id.map(str::to_string),
            is_valid: false,
        }
    }

    #[test]
    fn test_group_reconciliation() {
        let ops = vec![
            op(1, Phase::Arqueo, None, 100.0, Some("C1")),
            op(2, Phase::Cargo, Some(4), -40.0, Some("C1")),
        ];
        let mut grouped = partition_by_contraido(&ops);
        compute_group_totals(&mut grouped);

        let group = &grouped.groups[0];
        assert_eq!(group.total_arqueo, 100.0);
        assert_eq!(group.total_cargo_valid, 40.0);
        assert_eq!(group.total_cargo_invalid, 0.0);
        assert_eq!(group.net_balance, 60.0);
        assert!(!group.has_invalid_operations);
        assert!(!group.needs_attention);
    }

    #[test]
    fn test_invalid_cargo_excluded_from_balance() {
        let ops = vec![op(1, Phase::Cargo, Some(2), -50.0, Some("C2"))];
        let mut grouped = partition_by_contraido(&ops);
        compute_group_totals(&mut grouped);

        let group = &grouped.groups[0];
        assert_eq!(group.total_cargo_invalid, 50.0);
        assert_eq!(group.net_balance, 0.0);
        assert!(group.has_invalid_operations);
        assert!(group.needs_attention);
    }

    #[test]
    fn test_needs_attention_on_negative_balance() {
        let ops = vec![
            op(1, Phase::Arqueo, None, 30.0, Some("C3")),
            op(2, Phase::Cargo, Some(4), -50.0, Some("C3")),
        ];
        let mut grouped = partition_by_contraido(&ops);
        compute_group_totals(&mut grouped);

        let group = &grouped.groups[0];
        assert!(!group.has_invalid_operations);
        assert_eq!(group.net_balance, -20.0);
        assert!(group.needs_attention);
    }

    #[test]
    fn test_fase_breakdown_tracks_operation_numbers() {
        let ops = vec![
            op(1, Phase::Arqueo, None, 100.0, Some("C1")),
            op(2, Phase::Cargo, Some(4), -40.0, Some("C1")),
            op(3, Phase::Cargo, Some(2), -10.0, None),
        ];
        let grouped = partition_by_contraido(&ops);
        let breakdown = compute_fase_breakdown(&grouped);

        assert_eq!(breakdown.arqueo.operations, vec![1]);
        assert_eq!(breakdown.cargo.count, 2);
        assert_eq!(breakdown.cargo.valid.operations, vec![2]);
        assert_eq!(breakdown.cargo.invalid.operations, vec![3]);
        assert_eq!(breakdown.cargo.invalid.total_amount, 10.0);
    }

    #[test]
    fn test_percentage_invalid_is_count_based() {
        let ops = vec![
            op(1, Phase::Cargo, Some(4), -400.0, Some("C1")),
            op(2, Phase::Cargo, Some(2), -1.0, Some("C1")),
        ];
        let grouped = partition_by_contraido(&ops);
        let calcs = compute_calculations(&compute_fase_breakdown(&grouped));

        assert_eq!(calcs.percentage_invalid, 50.0);
    }

    #[test]
    fn test_percentage_invalid_zero_without_cargo() {
        let ops = vec![op(1, Phase::Arqueo, None, 100.0, Some("C1"))];
        let grouped = partition_by_contraido(&ops);
        let calcs = compute_calculations(&compute_fase_breakdown(&grouped));

        assert_eq!(calcs.percentage_invalid, 0.0);
    }
}
