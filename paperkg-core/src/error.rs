//! Shared error primitives for PaperKG.
//!
//! Each subsystem crate (ingestion, normalization, storage, NLQ, reasoner,
//! temporal) defines its own `thiserror` enum for the errors specific to it.
//! This module holds only the pieces every subsystem shares: the
//! retryable-kind classifier contract, the transient-store error kinds the
//! retry helper is seeded with, the NLQ closed error-code set, and a
//! `ConfigError` used at construction time across crates.

use thiserror::Error;

/// Implemented by every subsystem error so that the retry helper and the
/// circuit breaker can classify failures without a central type-switch:
/// each error type knows whether its own variants are worth retrying,
/// rather than callers maintaining a string-keyed lookup table.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// The documented transient-store error kinds: always retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientKind {
    LockClientStopped,
    DeadlockDetected,
    Outdated,
}

impl TransientKind {
    pub fn code(&self) -> &'static str {
        match self {
            TransientKind::LockClientStopped => "LockClientStopped",
            TransientKind::DeadlockDetected => "DeadlockDetected",
            TransientKind::Outdated => "Outdated",
        }
    }

    /// Classify a raw error-code string against the documented transient set.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LockClientStopped" => Some(TransientKind::LockClientStopped),
            "DeadlockDetected" => Some(TransientKind::DeadlockDetected),
            "Outdated" => Some(TransientKind::Outdated),
            _ => None,
        }
    }
}

/// The closed NLQ error-code set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NlqErrorCode {
    /// E-NLQ-001: failed to parse a Cypher candidate out of the model response.
    Parse,
    /// E-NLQ-002: failed to generate a candidate at all (e.g. schema unavailable).
    Generation,
    /// E-NLQ-003: a generated candidate failed validation.
    Validation,
    /// E-NLQ-004: a validated candidate failed at execution time.
    Execution,
    /// E-NLQ-005: no LLM provider was available to attempt generation.
    LlmUnavailable,
}

impl NlqErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NlqErrorCode::Parse => "E-NLQ-001",
            NlqErrorCode::Generation => "E-NLQ-002",
            NlqErrorCode::Validation => "E-NLQ-003",
            NlqErrorCode::Execution => "E-NLQ-004",
            NlqErrorCode::LlmUnavailable => "E-NLQ-005",
        }
    }
}

impl std::fmt::Display for NlqErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration errors: required settings absent, fatal at construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kind_round_trips_through_code() {
        for kind in [
            TransientKind::LockClientStopped,
            TransientKind::DeadlockDetected,
            TransientKind::Outdated,
        ] {
            assert_eq!(TransientKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(TransientKind::from_code("SomethingElse"), None);
    }

    #[test]
    fn nlq_error_codes_match_documented_strings() {
        assert_eq!(NlqErrorCode::Parse.as_str(), "E-NLQ-001");
        assert_eq!(NlqErrorCode::LlmUnavailable.as_str(), "E-NLQ-005");
    }
}
