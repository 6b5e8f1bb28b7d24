use crate::balance::{
    compute_calculations, compute_fase_breakdown, compute_group_totals, Calculations,
    FaseBreakdown,
};
use crate::charts::{build_chart_data, ChartData};
use crate::error::{AnalysisError, Result};
use crate::grouping::{partition_by_contraido, ContraidoGroup, GroupedOperations};
use crate::model::{parse_operation_date, Operation};
use crate::validation::{mark_operation_validity, validate, ValidationReport};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type tag carried by every result produced by this analyzer.
pub const ANALYSIS_TYPE: &str = "contraidos";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

/// Scalar counts and the date range of the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_operations: usize,
    pub arqueo_count: usize,
    pub cargo_count: usize,
    pub valid_cargo_count: usize,
    pub invalid_cargo_count: usize,
    pub unique_contraidos: usize,
    pub date_range: DateRange,
}

/// Grouped and global detail of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub by_fase: FaseBreakdown,
    pub by_contraido: Vec<ContraidoGroup>,
    pub orphan_operations: Vec<Operation>,
    pub calculations: Calculations,
}

/// The engine's single output value, assembled once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_type: String,
    pub summary: Summary,
    pub details: Details,
    pub validation: ValidationReport,
    pub chart_data: ChartData,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Runs the full pipeline: grouping, validation, balances, chart aggregation
/// and assembly. Stateless; each call owns its input slice and allocates its
/// own result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContraidosAnalyzer;

impl ContraidosAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes the dataset, stamping the result with the current time.
    pub fn analyze(
        &self,
        operations: &[Operation],
        metadata: Map<String, Value>,
    ) -> Result<AnalysisResult> {
        self.analyze_at(operations, metadata, Utc::now())
    }

    /// Analyzes the dataset with a caller-supplied timestamp. Two runs over
    /// the same input with the same timestamp produce identical results.
    pub fn analyze_at(
        &self,
        operations: &[Operation],
        metadata: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> Result<AnalysisResult> {
        info!("Analyzing {} operations", operations.len());
        reject_malformed(operations)?;

        let mut grouped = partition_by_contraido(operations);
        debug!(
            "Grouped into {} contraídos, {} orphans",
            grouped.groups.len(),
            grouped.orphans.len()
        );

        mark_operation_validity(&mut grouped);
        compute_group_totals(&mut grouped);

        let validation = validate(&grouped);
        debug!(
            "Validation: {} issues, {} warnings",
            validation.total_issues, validation.total_warnings
        );

        let by_fase = compute_fase_breakdown(&grouped);
        let calculations = compute_calculations(&by_fase);
        let chart_data = build_chart_data(&by_fase, &calculations, &grouped.groups);
        let summary = build_summary(operations, &grouped);

        assemble(
            operations.len(),
            grouped,
            summary,
            by_fase,
            calculations,
            validation,
            chart_data,
            metadata,
            created_at,
        )
    }
}

/// Defensive input check. Upstream normalization is responsible for field
/// presence; the engine still refuses non-finite amounts rather than letting
/// them poison every aggregate.
fn reject_malformed(operations: &[Operation]) -> Result<()> {
    for (row, op) in operations.iter().enumerate() {
        if !op.amount.is_finite() {
            return Err(AnalysisError::MalformedInput {
                row,
                field: "amount",
                details: format!("non-finite amount on operation {}", op.operation_number),
            });
        }
    }
    Ok(())
}

fn build_summary(operations: &[Operation], grouped: &GroupedOperations) -> Summary {
    Summary {
        total_operations: operations.len(),
        arqueo_count: operations.iter().filter(|o| o.is_arqueo()).count(),
        cargo_count: operations.iter().filter(|o| o.is_cargo()).count(),
        valid_cargo_count: operations.iter().filter(|o| o.is_valid_cargo()).count(),
        invalid_cargo_count: operations.iter().filter(|o| o.is_invalid_cargo()).count(),
        unique_contraidos: grouped.groups.len(),
        date_range: date_range(operations),
    }
}

fn date_range(operations: &[Operation]) -> DateRange {
    let mut earliest: Option<NaiveDate> = None;
    let mut latest: Option<NaiveDate> = None;

    for op in operations {
        if let Some(date) = parse_operation_date(&op.date) {
            earliest = Some(earliest.map_or(date, |e| e.min(date)));
            latest = Some(latest.map_or(date, |l| l.max(date)));
        }
    }

    DateRange { earliest, latest }
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    input_count: usize,
    grouped: GroupedOperations,
    summary: Summary,
    by_fase: FaseBreakdown,
    calculations: Calculations,
    validation: ValidationReport,
    chart_data: ChartData,
    metadata: Map<String, Value>,
    created_at: DateTime<Utc>,
) -> Result<AnalysisResult> {
    // Grouping must neither lose nor duplicate operations. A mismatch here
    // is an engine bug, not a user-facing condition.
    let accounted = grouped.total_count();
    if accounted != input_count {
        return Err(AnalysisError::InternalConsistency(format!(
            "grouped + orphan operations ({}) != input operations ({})",
            accounted, input_count
        )));
    }

    Ok(AnalysisResult {
        analysis_type: ANALYSIS_TYPE.to_string(),
        summary,
        details: Details {
            by_fase,
            by_contraido: grouped.groups,
            orphan_operations: grouped.orphans,
            calculations,
        },
        validation,
        chart_data,
        metadata,
        created_at,
    })
}
