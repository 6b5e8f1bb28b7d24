use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Ledger phase of an operation, as labelled in the source export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Phase {
    #[serde(rename = "AINP")]
    #[schemars(description = "Arqueo (income/collection) phase, always a positive contribution")]
    Arqueo,

    #[serde(rename = "M;P")]
    #[schemars(description = "Cargo (charge) phase, valid only when its status code equals 4")]
    Cargo,
}

/// Status code a cargo operation must carry to count as completed.
pub const VALID_CARGO_STATUS: i64 = 4;

/// One normalized ledger movement.
///
/// `is_valid` is derived by the validation stage and is never trusted from
/// input; deserialized values are overwritten before any aggregation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Operation {
    #[schemars(description = "Operation number, unique within a dataset")]
    pub operation_number: i64,

    #[schemars(description = "Budget year the operation belongs to")]
    pub year: i32,

    #[schemars(description = "Budget application code")]
    pub application_code: i64,

    #[schemars(description = "Ledger phase: AINP (arqueo) or M;P (cargo)")]
    pub phase: Phase,

    #[serde(default)]
    #[schemars(description = "Status code; cargo operations require 4 to be valid")]
    pub status: Option<i64>,

    #[schemars(description = "Signed monetary amount; aggregation uses magnitudes")]
    pub amount: f64,

    #[schemars(description = "Cost center / CPGC code (display only)")]
    pub cost_center: i64,

    #[schemars(description = "Operation date as exported (display only)")]
    pub date: String,

    #[schemars(description = "Third party name (display only)")]
    pub third_party: String,

    #[schemars(description = "Free-text description (display only)")]
    pub description: String,

    #[serde(default)]
    #[schemars(description = "Contraído identifier; absent for orphan operations")]
    pub contraido_id: Option<String>,

    #[serde(default)]
    #[schemars(description = "Derived validity flag, recomputed by the engine")]
    pub is_valid: bool,
}

impl Operation {
    pub fn is_arqueo(&self) -> bool {
        self.phase == Phase::Arqueo
    }

    pub fn is_cargo(&self) -> bool {
        self.phase == Phase::Cargo
    }

    pub fn is_valid_cargo(&self) -> bool {
        self.is_cargo() && self.status == Some(VALID_CARGO_STATUS)
    }

    pub fn is_invalid_cargo(&self) -> bool {
        self.is_cargo() && self.status != Some(VALID_CARGO_STATUS)
    }

    pub fn is_orphan(&self) -> bool {
        self.contraido_id.is_none()
    }

    /// Absolute monetary value. Both arqueo and cargo sums work on
    /// magnitudes; the stored sign is a display convention of the export.
    pub fn magnitude(&self) -> f64 {
        self.amount.abs()
    }
}

/// Status cell as it appears in a raw export row: numeric or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawStatus {
    Number(i64),
    Text(String),
}

impl RawStatus {
    /// Coerces to a status code. Numeric text counts as numeric; anything
    /// else (blank, cancellation remarks) has no code.
    pub fn as_code(&self) -> Option<i64> {
        match self {
            RawStatus::Number(n) => Some(*n),
            RawStatus::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

/// One row of a ledger export before normalization. Every field is optional;
/// the normalizer rejects rows missing a required field rather than coercing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawOperationRecord {
    pub operation_number: Option<i64>,
    pub year: Option<i32>,
    pub application_code: Option<i64>,
    pub phase: Option<String>,
    pub status: Option<RawStatus>,
    pub amount: Option<f64>,
    pub cost_center: Option<i64>,
    pub date: Option<String>,
    pub third_party: Option<String>,
    pub description: Option<String>,
    pub contraido_id: Option<String>,
}

impl RawOperationRecord {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RawOperationRecord)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

/// Parses the date formats seen in exports: `YYYY-MM-DD`, the same with a
/// trailing `HH:MM:SS`, and `DD/MM/YYYY`. Anything else yields `None`.
pub fn parse_operation_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date_part = trimmed.split_whitespace().next()?;
    if date_part.contains('/') {
        NaiveDate::parse_from_str(date_part, "%d/%m/%Y").ok()
    } else {
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}
