//! Error types for the unit scores engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Duplicate row for unit '{unit_code}' in season '{season}'")]
    DuplicateRow { unit_code: String, season: String },

    #[error("Aggregation over an empty sequence")]
    EmptyAggregation,

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Invalid row key '{0}' (expected CODE@SEASON)")]
    InvalidRowKey(String),

    #[error("Operand '{0}' is not numeric but the cell is")]
    NonNumericOperand(String),

    #[error("Negative {column} score for unit '{unit_code}' in season '{season}'")]
    InvalidScore {
        unit_code: String,
        season: String,
        column: String,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
