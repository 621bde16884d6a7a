//! Classifies a natural-language query's intent. The implementation is
//! LLM-driven; only the result shape is specified.

use crate::error::NlqError;
use crate::json_fragment::extract_json_object;
use async_trait::async_trait;
use paperkg_core::NlqIntentType;
use paperkg_llm::{ChatMessage, CompletionRequest, LlmProvider};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntentClassification {
    #[serde(rename = "type")]
    pub intent_type: NlqIntentType,
    pub confidence: f64,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub relations: Vec<String>,
    #[serde(default)]
    pub is_ambiguous: bool,
    #[serde(default)]
    pub clarification_needed: Option<String>,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> Result<IntentClassification, NlqError>;
}

/// LLM-backed classifier: asks the model to emit the classification as a
/// single JSON object and extracts it from the free-text response.
pub struct LlmIntentClassifier {
    llm: std::sync::Arc<dyn LlmProvider>,
}

impl LlmIntentClassifier {
    pub fn new(llm: std::sync::Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, query: &str) -> Result<IntentClassification, NlqError> {
        let prompt = format!(
            "Classify the intent of this natural-language question against a knowledge graph of \
             academic papers. Respond with a single JSON object: \
             {{\"type\": one of \"ENTITY_LOOKUP\"|\"RELATIONSHIP_QUERY\"|\"PATH_FINDING\"|\"AGGREGATION\"|\"GLOBAL_SUMMARY\"|\"COMPARISON\", \
             \"confidence\": number 0-1, \"entities\": [string], \"relations\": [string], \
             \"is_ambiguous\": bool, \"clarification_needed\": string or null}}.\n\nQuestion: {query}"
        );
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)], 512).with_temperature(0.0);
        let response = self.llm.chat(request).await.map_err(|_| NlqError::llm_unavailable())?;
        extract_json_object(&response.content)
            .ok_or_else(|| NlqError::parse("could not extract an intent classification from the model response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_parses_from_a_json_fragment() {
        let text = r#"{"type": "PATH_FINDING", "confidence": 0.9, "entities": ["GPT4", "BERT"], "is_ambiguous": false}"#;
        let parsed: IntentClassification = extract_json_object(text).unwrap();
        assert_eq!(parsed.intent_type, NlqIntentType::PathFinding);
        assert_eq!(parsed.entities, vec!["GPT4".to_string(), "BERT".to_string()]);
        assert!(!parsed.is_ambiguous);
    }
}
