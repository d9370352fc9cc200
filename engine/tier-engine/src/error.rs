//! Error types for the Tier Engine

use thiserror::Error;

/// Result type for Tier Engine operations
pub type Result<T> = std::result::Result<T, TierEngineError>;

/// Caller-visible errors.
///
/// Per-entity anomalies (degenerate groups, skipped metrics, entities with
/// no overlapping weights, empty groups) are not errors. They are absorbed
/// into the affected entity's output and reported as
/// [`ScoringAnomaly`](crate::models::ScoringAnomaly) values instead.
#[derive(Error, Debug)]
pub enum TierEngineError {
    #[error("Cannot compare {left} ({left_category}) with {right} ({right_category}): categories differ")]
    CategoryMismatch {
        left: String,
        left_category: String,
        right: String,
        right_category: String,
    },

    #[error("Tier {tier} has a negative target count: {target}")]
    NegativeTarget { tier: String, target: i64 },

    #[error("Tier ladder must declare at least one tier")]
    EmptyTierLadder,

    #[error("Tier label declared twice: {0}")]
    DuplicateTier(String),

    #[error("Expected {expected} percentile breakpoints, found {found}")]
    BreakpointMismatch { expected: usize, found: usize },

    #[error("Invalid percentile breakpoint: {0} (must lie in [0, 100] and descend)")]
    InvalidBreakpoint(f64),

    #[error("Metric {metric} has a negative weight: {weight}")]
    NegativeWeight { metric: String, weight: f64 },

    #[error("Entity not found: {0}")]
    UnknownEntity(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for TierEngineError {
    fn from(err: config::ConfigError) -> Self {
        TierEngineError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for TierEngineError {
    fn from(err: toml::ser::Error) -> Self {
        TierEngineError::Configuration(err.to_string())
    }
}
