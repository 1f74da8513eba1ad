//! Error kinds raised by the simulation engine.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors raised by the engine.
///
/// Configuration errors are raised before any round executes. Invariant
/// violations abort the run: they indicate a ledger bug and are never
/// clamped away.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A configuration value is out of range.
    #[error("invalid configuration for `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },

    /// A number selection is not 6 distinct values in 1..=42.
    #[error("invalid number selection: {0}")]
    InvalidNumbers(String),

    /// The pool ledger reached a state its rules cannot produce.
    #[error("ledger invariant violated in round {round}: {detail}")]
    ArithmeticInvariantViolation { round: u64, detail: String },

    /// The run was cancelled at a round boundary.
    #[error("simulation cancelled after {completed_rounds} rounds")]
    Cancelled { completed_rounds: u64 },

    /// A result was requested before all rounds completed.
    #[error("simulation incomplete: {completed} of {requested} rounds")]
    Incomplete { completed: u64, requested: u64 },

    /// A previous error left the run unusable.
    #[error("simulation aborted by an earlier error")]
    Poisoned,
}

impl SimulationError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than the engine.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::InvalidNumbers(_))
    }
}
