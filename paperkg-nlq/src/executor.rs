//! The NLQ engine's optional boundary to an actual query executor.
//! Injecting one lets the generator validate a candidate before returning
//! it; without one, a candidate is accepted once it parses and its
//! literals are balanced.

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self { valid: true, error: None }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self { valid: false, error: Some(error.into()) }
    }
}

#[async_trait]
pub trait CypherExecutor: Send + Sync {
    async fn validate(&self, cypher: &str) -> ValidationOutcome;

    async fn execute(&self, cypher: &str) -> Result<Value, String>;
}
