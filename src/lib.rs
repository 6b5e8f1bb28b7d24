//! # Contraídos Analyzer
//!
//! Analysis engine for contraídos ledger exports. Given a normalized
//! sequence of [`Operation`] records it produces a single immutable
//! [`AnalysisResult`]: totals by category, detected business-rule
//! violations, reconciled balances and chart-ready aggregates.
//!
//! ## Core concepts
//!
//! - **Contraído**: grouping key (contract/commitment identifier) under
//!   which related operations are reconciled.
//! - **Arqueo (AINP)**: income-phase operation, always a positive
//!   contribution.
//! - **Cargo (M;P)**: charge-phase operation, valid only when its status
//!   code equals 4.
//! - **Orphan**: an operation with no contraído assigned.
//!
//! The engine is a pure, single-threaded computation: no I/O, no shared
//! mutable state, each invocation independent. Business-rule violations are
//! reported as [`Issue`] values inside the result, never as errors.
//!
//! ## Example
//!
//! ```rust,ignore
//! use contraidos_analyzer::*;
//! use serde_json::Map;
//!
//! let operations: Vec<Operation> = load_from_upstream();
//! let result = analyze_operations(&operations, Map::new())?;
//! println!("{}", render_report(&result));
//! ```

pub mod analyzer;
pub mod balance;
pub mod charts;
pub mod error;
pub mod grouping;
pub mod model;
pub mod registry;
pub mod report;
pub mod validation;

pub use analyzer::{
    AnalysisResult, ContraidosAnalyzer, DateRange, Details, Summary, ANALYSIS_TYPE,
};
pub use balance::{Calculations, CargoTotals, FaseBreakdown, PhaseTotals, BALANCE_TOLERANCE};
pub use charts::{build_chart_data, ChartData, ChartPoint, ChartSeries, TOP_CONTRAIDOS_LIMIT};
pub use error::{AnalysisError, Result};
pub use grouping::{partition_by_contraido, ContraidoGroup, GroupedOperations};
pub use model::{parse_operation_date, Operation, Phase, RawOperationRecord, RawStatus};
pub use registry::{AnalysisRegistry, Analyzer, ContraidosParser, Parser};
pub use report::render_report;
pub use validation::{Issue, IssueKind, Severity, ValidationReport};

use serde_json::{Map, Value};

/// Analyzes a dataset of normalized operations with the built-in contraídos
/// analyzer.
pub fn analyze_operations(
    operations: &[Operation],
    metadata: Map<String, Value>,
) -> Result<AnalysisResult> {
    ContraidosAnalyzer::new().analyze(operations, metadata)
}

/// Normalizes raw export records and analyzes them in one step, dispatching
/// through the given registry.
pub fn analyze_records(
    registry: &AnalysisRegistry,
    records: &[RawOperationRecord],
    analysis_type: &str,
    metadata: Map<String, Value>,
) -> Result<AnalysisResult> {
    let parser = registry.parser_for(records)?;
    let operations = parser.normalize(records)?;
    registry.analyzer_for(analysis_type)?.analyze(&operations, metadata)
}
