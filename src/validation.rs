use crate::balance::BALANCE_TOLERANCE;
use crate::grouping::GroupedOperations;
use crate::model::{Operation, VALID_CARGO_STATUS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidCargoOperation,
    CargoWithoutReversal,
    NegativeBalance,
    OrphanOperation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

/// A detected business-rule violation or warning. Never an error: issues are
/// first-class values inside the analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contraido_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    pub message: String,
}

/// Validation section of the analysis result. `is_valid` reflects critical
/// issues only; warnings never flip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub total_issues: usize,
    pub total_warnings: usize,
}

impl ValidationReport {
    fn from_parts(issues: Vec<Issue>, warnings: Vec<Issue>) -> Self {
        Self {
            is_valid: issues.is_empty(),
            total_issues: issues.len(),
            total_warnings: warnings.len(),
            issues,
            warnings,
        }
    }
}

/// Recomputes the derived validity flag on every operation. Arqueo
/// operations are always valid; cargo operations require status 4. Input
/// values of the flag are never trusted.
pub fn mark_operation_validity(grouped: &mut GroupedOperations) {
    grouped.for_each_operation_mut(|op| {
        op.is_valid = op.is_arqueo() || op.is_valid_cargo();
    });
}

fn invalid_cargo_issue(op: &Operation) -> Issue {
    let observed = match op.status {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    };
    Issue {
        kind: IssueKind::InvalidCargoOperation,
        severity: Severity::Critical,
        operation_number: Some(op.operation_number),
        contraido_id: op.contraido_id.clone(),
        amount: Some(op.amount),
        status: op.status,
        balance: None,
        message: format!(
            "Cargo operation {} has status {} (expected {}): incomplete or cancelled",
            op.operation_number, observed, VALID_CARGO_STATUS
        ),
    }
}

/// Evaluates every business rule over already-balanced groups and returns
/// the validation report.
///
/// Traversal is deterministic: groups in first-seen order with each group's
/// operations in encounter order, then orphans in input order. Issues and
/// warnings are appended as their triggering operation or group is
/// encountered, so repeated runs over the same input produce identical
/// reports.
pub fn validate(grouped: &GroupedOperations) -> ValidationReport {
    let mut issues: Vec<Issue> = Vec::new();
    let mut warnings: Vec<Issue> = Vec::new();

    for group in &grouped.groups {
        let mut valid_cargo = 0usize;
        let mut invalid_cargo = 0usize;

        for op in &group.operations {
            if op.is_invalid_cargo() {
                invalid_cargo += 1;
                issues.push(invalid_cargo_issue(op));
            } else if op.is_valid_cargo() {
                valid_cargo += 1;
            }
        }

        if invalid_cargo > 0 && valid_cargo == 0 {
            warnings.push(Issue {
                kind: IssueKind::CargoWithoutReversal,
                severity: Severity::Warning,
                operation_number: None,
                contraido_id: Some(group.contraido_id.clone()),
                amount: Some(group.total_cargo_invalid),
                status: None,
                balance: None,
                message: format!(
                    "Contraído '{}' has invalid cargo operations and no valid cargo: charge never completed or reversed",
                    group.contraido_id
                ),
            });
        }

        if group.net_balance < -BALANCE_TOLERANCE {
            warnings.push(Issue {
                kind: IssueKind::NegativeBalance,
                severity: Severity::Warning,
                operation_number: None,
                contraido_id: Some(group.contraido_id.clone()),
                amount: None,
                status: None,
                balance: Some(group.net_balance),
                message: format!(
                    "Contraído '{}' has negative balance: {:.2}",
                    group.contraido_id, group.net_balance
                ),
            });
        }
    }

    for op in &grouped.orphans {
        if op.is_invalid_cargo() {
            issues.push(invalid_cargo_issue(op));
        }
        warnings.push(Issue {
            kind: IssueKind::OrphanOperation,
            severity: Severity::Warning,
            operation_number: Some(op.operation_number),
            contraido_id: None,
            amount: Some(op.amount),
            status: op.status,
            balance: None,
            message: format!(
                "Operation {} has no contraído assigned",
                op.operation_number
            ),
        });
    }

    ValidationReport::from_parts(issues, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::compute_group_totals;
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

    fn run(ops: &[Operation]) -> (GroupedOperations, ValidationReport) {
        let mut grouped = partition_by_contraido(ops);
        mark_operation_validity(&mut grouped);
        compute_group_totals(&mut grouped);
        let report = validate(&grouped);
        (grouped, report)
    }

    #[test]
    fn test_validity_flag_recomputed() {
        let mut ops = vec![
            op(1, Phase::Arqueo, None, 100.0, Some("C1")),
            op(2, Phase::Cargo, Some(4), -40.0, Some("C1")),
            op(3, Phase::Cargo, Some(2), -10.0, Some("C1")),
        ];
        // An upstream flag must not be trusted.
        ops[2].is_valid = true;

        let (grouped, _) = run(&ops);
        let group = &grouped.groups[0];
        assert!(group.operations[0].is_valid);
        assert!(group.operations[1].is_valid);
        assert!(!group.operations[2].is_valid);
    }

    #[test]
    fn test_invalid_cargo_emits_critical_issue() {
        let ops = vec![op(1, Phase::Cargo, Some(2), -50.0, Some("C2"))];
        let (_, report) = run(&ops);

        assert!(!report.is_valid);
        assert_eq!(report.total_issues, 1);
        let issue = &report.issues[0];
        assert_eq!(issue.kind, IssueKind::InvalidCargoOperation);
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.operation_number, Some(1));
        assert_eq!(issue.contraido_id.as_deref(), Some("C2"));
        assert_eq!(issue.status, Some(2));
        assert!(issue.message.contains("expected 4"));
    }

    #[test]
    fn test_cargo_without_reversal_warning() {
        let ops = vec![op(1, Phase::Cargo, Some(2), -50.0, Some("C2"))];
        let (_, report) = run(&ops);

        let kinds: Vec<IssueKind> = report.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![IssueKind::CargoWithoutReversal]);
    }

    #[test]
    fn test_valid_cargo_suppresses_reversal_warning() {
        let ops = vec![
            op(1, Phase::Arqueo, None, 100.0, Some("C1")),
            op(2, Phase::Cargo, Some(2), -10.0, Some("C1")),
            op(3, Phase::Cargo, Some(4), -10.0, Some("C1")),
        ];
        let (_, report) = run(&ops);

        assert!(report
            .warnings
            .iter()
            .all(|w| w.kind != IssueKind::CargoWithoutReversal));
    }

    #[test]
    fn test_negative_balance_warning() {
        let ops = vec![
            op(1, Phase::Arqueo, None, 30.0, Some("C3")),
            op(2, Phase::Cargo, Some(4), -50.0, Some("C3")),
        ];
        let (_, report) = run(&ops);

        assert!(report.is_valid);
        assert_eq!(report.total_warnings, 1);
        let warning = &report.warnings[0];
        assert_eq!(warning.kind, IssueKind::NegativeBalance);
        assert_eq!(warning.balance, Some(-20.0));
    }

    #[test]
    fn test_orphan_warning() {
        let ops = vec![op(1, Phase::Arqueo, None, 100.0, None)];
        let (_, report) = run(&ops);

        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, IssueKind::OrphanOperation);
        assert_eq!(report.warnings[0].operation_number, Some(1));
    }

    #[test]
    fn test_orphan_invalid_cargo_gets_both() {
        let ops = vec![op(1, Phase::Cargo, None, -25.0, None)];
        let (_, report) = run(&ops);

        assert!(!report.is_valid);
        assert_eq!(report.issues[0].kind, IssueKind::InvalidCargoOperation);
        assert!(report.issues[0].message.contains("status none"));
        assert_eq!(report.warnings[0].kind, IssueKind::OrphanOperation);
    }

    #[test]
    fn test_warnings_do_not_flip_validity() {
        let ops = vec![
            op(1, Phase::Arqueo, None, 30.0, Some("C3")),
            op(2, Phase::Cargo, Some(4), -50.0, Some("C3")),
            op(3, Phase::Arqueo, None, 10.0, None),
        ];
        let (_, report) = run(&ops);

        assert!(report.is_valid);
        assert_eq!(report.total_issues, 0);
        assert_eq!(report.total_warnings, 2);
    }
}
