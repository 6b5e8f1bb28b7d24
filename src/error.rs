use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Malformed input record {row}: field '{field}': {details}")]
    MalformedInput {
        row: usize,
        field: &'static str,
        details: String,
    },

    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),

    #[error("Unknown analysis type: {0}")]
    UnknownAnalysisType(String),

    #[error("No registered parser can handle the input: {0}")]
    UnsupportedInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
