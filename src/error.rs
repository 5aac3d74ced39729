//! Custom error types for the toolkit.
//!
//! This module defines the primary error type, `DaqError`, for the entire
//! library. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of failures that can occur,
//! from configuration and I/O issues to violations of the sweep dataset
//! invariants.
//!
//! The sweep-specific variants map the dataset model's failure modes
//! one-for-one: shape problems at construction, per-trace length mismatches,
//! metadata key parity, alias/name lookup failures, missing units on rescale,
//! and numeric conversion of raw instrument responses. Instrument drivers and
//! channel adapters report through `anyhow` instead, as their failures are
//! hardware-shaped and carry free-form context.

use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

#[derive(Error, Debug)]
pub enum DaqError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sweep shape error: {0}")]
    Shape(String),

    #[error("Trace '{trace}' has {actual} points but the x-trace has {expected}. Every trace must have the same length")]
    LengthMismatch {
        trace: String,
        expected: usize,
        actual: usize,
    },

    #[error("The keys of 'traces' and 'attrs' must match")]
    AttrsMismatch,

    #[error("The trace '{0}' does not exist")]
    TraceNotFound(String),

    #[error("The argument 'unit' must be given when rescaling a sweep with attrs")]
    MissingUnit,

    #[error("Sweep carries no attrs; axis labels need per-trace descriptions and units")]
    NoAttrs,

    #[error("Trace '{trace}' contains a non-numeric value '{value}'")]
    Numeric {
        trace: String,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}
