use crate::analyzer::{AnalysisResult, ContraidosAnalyzer, ANALYSIS_TYPE};
use crate::error::{AnalysisError, Result};
use crate::model::{Operation, Phase, RawOperationRecord};
use serde_json::{Map, Value};

/// Normalize-input capability: turns raw export records into typed
/// operations, rejecting malformed rows instead of coercing them.
pub trait Parser {
    /// Tag of the file/export format this parser understands.
    fn file_type(&self) -> &'static str;

    /// Whether this parser claims the given records.
    fn can_parse(&self, records: &[RawOperationRecord]) -> bool;

    fn normalize(&self, records: &[RawOperationRecord]) -> Result<Vec<Operation>>;
}

impl std::fmt::Debug for dyn Parser + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("file_type", &self.file_type())
            .finish()
    }
}

/// Analyze-input capability: runs one analysis type over normalized
/// operations.
pub trait Analyzer {
    fn analysis_type(&self) -> &'static str;

    /// Whether this analyzer can handle the given dataset.
    fn can_analyze(&self, operations: &[Operation]) -> bool;

    fn analyze(
        &self,
        operations: &[Operation],
        metadata: Map<String, Value>,
    ) -> Result<AnalysisResult>;
}

impl std::fmt::Debug for dyn Analyzer + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("analysis_type", &self.analysis_type())
            .finish()
    }
}

impl Analyzer for ContraidosAnalyzer {
    fn analysis_type(&self) -> &'static str {
        ANALYSIS_TYPE
    }

    fn can_analyze(&self, _operations: &[Operation]) -> bool {
        // Normalized operations always carry the fields this analysis needs.
        true
    }

    fn analyze(
        &self,
        operations: &[Operation],
        metadata: Map<String, Value>,
    ) -> Result<AnalysisResult> {
        ContraidosAnalyzer::analyze(self, operations, metadata)
    }
}

/// The operation normalizer for contraídos ledger exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContraidosParser;

impl ContraidosParser {
    pub fn new() -> Self {
        Self
    }

    fn normalize_record(record: &RawOperationRecord, row: usize) -> Result<Operation> {
        let phase_label = require(record.phase.as_deref(), row, "phase")?;
        let phase = match phase_label.trim() {
            "AINP" => Phase::Arqueo,
            "M;P" => Phase::Cargo,
            other => {
                return Err(AnalysisError::MalformedInput {
                    row,
                    field: "phase",
                    details: format!("unrecognized phase label '{}'", other),
                })
            }
        };

        let amount = require(record.amount, row, "amount")?;
        if !amount.is_finite() {
            return Err(AnalysisError::MalformedInput {
                row,
                field: "amount",
                details: "amount is not a finite number".to_string(),
            });
        }

        let contraido_id = record
            .contraido_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(Operation {
            operation_number: require(record.operation_number, row, "operation_number")?,
            year: require(record.year, row, "year")?,
            application_code: require(record.application_code, row, "application_code")?,
            phase,
            status: record.status.as_ref().and_then(|s| s.as_code()),
            amount,
            cost_center: require(record.cost_center, row, "cost_center")?,
            date: record.date.clone().unwrap_or_default(),
            third_party: record.third_party.clone().unwrap_or_default(),
            description: record.description.clone().unwrap_or_default(),
            contraido_id,
            is_valid: false,
        })
    }
}

fn require<T>(value: Option<T>, row: usize, field: &'static str) -> Result<T> {
    value.ok_or(AnalysisError::MalformedInput {
        row,
        field,
        details: "required field is missing".to_string(),
    })
}

impl Parser for ContraidosParser {
    fn file_type(&self) -> &'static str {
        "contraidos"
    }

    fn can_parse(&self, records: &[RawOperationRecord]) -> bool {
        records
            .iter()
            .all(|r| r.phase.is_some() && r.operation_number.is_some() && r.amount.is_some())
    }

    fn normalize(&self, records: &[RawOperationRecord]) -> Result<Vec<Operation>> {
        records
            .iter()
            .enumerate()
            .map(|(row, record)| Self::normalize_record(record, row))
            .collect()
    }
}

/// Explicit registration table from format/analysis tags to concrete
/// implementations. Passed to callers instead of living in process-wide
/// state; `default()` carries the built-in contraídos pair.
pub struct AnalysisRegistry {
    parsers: Vec<Box<dyn Parser>>,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalysisRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
            analyzers: Vec::new(),
        }
    }

    pub fn register_parser(&mut self, parser: Box<dyn Parser>) {
        self.parsers.push(parser);
    }

    pub fn register_analyzer(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    /// First registered parser claiming the records.
    pub fn parser_for(&self, records: &[RawOperationRecord]) -> Result<&dyn Parser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(records))
            .map(|p| &**p)
            .ok_or_else(|| {
                AnalysisError::UnsupportedInput(format!(
                    "registered parsers: {:?}",
                    self.file_types()
                ))
            })
    }

    pub fn analyzer_for(&self, analysis_type: &str) -> Result<&dyn Analyzer> {
        self.analyzers
            .iter()
            .find(|a| a.analysis_type() == analysis_type)
            .map(|a| &**a)
            .ok_or_else(|| {
                AnalysisError::UnknownAnalysisType(format!(
                    "'{}' (available: {:?})",
                    analysis_type,
                    self.analysis_types()
                ))
            })
    }

    pub fn file_types(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.file_type()).collect()
    }

    pub fn analysis_types(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.analysis_type()).collect()
    }
}

impl Default for AnalysisRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_parser(Box::new(ContraidosParser::new()));
        registry.register_analyzer(Box::new(ContraidosAnalyzer::new()));
        registry
    }
}
