use std::path::Path;

use anyhow::Context as _;
use thiserror::Error;

/// Malformed input rejected at the engine boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Contest result is missing the {role} identity")]
    MissingCompetitor { role: &'static str },

    #[error("Competitor {id} cannot play against themselves")]
    SelfMatch { id: String },

    #[error("Batch length mismatch: {predictions} predictions vs {outcomes} outcomes")]
    LengthMismatch { predictions: usize, outcomes: usize },

    #[error("Cannot score an empty batch")]
    EmptyBatch,

    #[error("Prediction {index} is not a probability: {value}")]
    InvalidProbability { index: usize, value: f64 },
}

/// Add context to file load errors
pub fn load_context(path: &Path) -> String {
    format!("Failed to read {}", path.display())
}

/// Add context to parse errors
pub fn parse_context(data_type: &str) -> String {
    format!("Failed to parse {}", data_type)
}

/// Wrap result with parse context
pub fn with_parse_context<T, E>(result: Result<T, E>, data_type: &str) -> anyhow::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.context(parse_context(data_type))
}
