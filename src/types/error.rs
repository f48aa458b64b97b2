//! The planner's closed error taxonomy.
//!
//! Raising is reserved for `InvalidSequence` and `Internal`, which are
//! engine-bug signals; everything else is returned as a value so the
//! orchestrator can classify failures without unwinding.

use std::collections::HashMap;

/// A single failed planner operation, tagged with the taxonomy row it
/// belongs to. `details` carries the observed/maximum numeric values for
/// regulatory violations, matching the original engine's
/// `HOSViolation(rule, message, details)` shape.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlannerError {
    #[error("invalid input: {message}")]
    InputValidation { message: String },

    #[error("geocoding failed: {message}")]
    Geocoding { message: String },

    #[error("routing failed: {message}")]
    Routing { message: String },

    #[error("HOS violation [{rule}]: {message}")]
    HOSViolation {
        rule: String,
        message: String,
        details: HashMap<String, f64>,
    },

    #[error("invalid event sequence [{check}]: {message}")]
    InvalidSequence {
        check: String,
        message: String,
        details: HashMap<String, f64>,
    },

    #[error("transient provider error: {message}")]
    TransientProvider { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl PlannerError {
    pub fn hos_violation(rule: &str, message: impl Into<String>, details: HashMap<String, f64>) -> Self {
        Self::HOSViolation {
            rule: rule.to_string(),
            message: message.into(),
            details,
        }
    }

    pub fn invalid_sequence(
        check: &str,
        message: impl Into<String>,
        details: HashMap<String, f64>,
    ) -> Self {
        Self::InvalidSequence {
            check: check.to_string(),
            message: message.into(),
            details,
        }
    }

    /// Whether the external task runner should retry this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientProvider { .. } | Self::Internal { .. })
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
