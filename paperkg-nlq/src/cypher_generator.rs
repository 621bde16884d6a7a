//! Schema-aware Cypher synthesis with validation-driven retries.

use crate::cypher_literal::{escape_cypher_literal, literals_are_balanced};
use crate::error::NlqError;
use crate::executor::CypherExecutor;
use crate::intent_classifier::IntentClassification;
use paperkg_core::NlqLanguage;
use paperkg_llm::{ChatMessage, CompletionRequest, LlmProvider};
use paperkg_storage::SchemaProvider;
use regex::Regex;
use std::sync::Arc;

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RESULT_LIMIT: usize = 25;

const CYPHER_KEYWORDS: [&str; 6] = ["MATCH", "RETURN", "CREATE", "MERGE", "WITH", "CALL"];

#[derive(Debug, Clone, PartialEq)]
pub struct CypherCandidate {
    pub cypher: String,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSuccess {
    pub query: CypherCandidate,
}

pub struct CypherGenerator {
    llm: Arc<dyn LlmProvider>,
    schema: Arc<SchemaProvider>,
    executor: Option<Arc<dyn CypherExecutor>>,
    max_retries: usize,
    result_limit: usize,
}

impl CypherGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, schema: Arc<SchemaProvider>, executor: Option<Arc<dyn CypherExecutor>>) -> Self {
        Self { llm, schema, executor, max_retries: DEFAULT_MAX_RETRIES, result_limit: DEFAULT_RESULT_LIMIT }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Generate a validated Cypher query for `query`, retrying up to
    /// `max_retries` times with the previous validation error threaded
    /// into the next attempt's prompt.
    pub async fn generate(
        &self,
        query: &str,
        intent: &IntentClassification,
        language: NlqLanguage,
    ) -> Result<GenerationSuccess, NlqError> {
        let schema_text = self
            .schema
            .format_for_prompt()
            .await
            .map_err(|_| NlqError::generation("schema unavailable", vec!["Check store connectivity".to_string()]))?;

        let mut previous_error: Option<String> = None;
        let mut last_parse_failure: Option<NlqError> = None;

        for _attempt in 0..=self.max_retries {
            let prompt = self.build_prompt(&schema_text, query, intent, language, previous_error.as_deref());
            let request = CompletionRequest::new(vec![ChatMessage::user(prompt)], 1024).with_temperature(0.0);
            let response = self.llm.chat(request).await.map_err(|_| NlqError::llm_unavailable())?;

            let Some(candidate) = extract_cypher(&response.content) else {
                last_parse_failure = Some(NlqError::parse("could not extract a Cypher query from the model response"));
                previous_error = last_parse_failure.as_ref().map(|e| e.message.clone());
                continue;
            };

            if !literals_are_balanced(&candidate) {
                previous_error = Some("generated query contains an unescaped quote inside a string literal".to_string());
                continue;
            }

            let outcome = match &self.executor {
                Some(executor) => executor.validate(&candidate).await,
                None => crate::executor::ValidationOutcome::valid(),
            };

            if outcome.valid {
                return Ok(GenerationSuccess { query: CypherCandidate { cypher: candidate, is_valid: true } });
            }
            previous_error = outcome.error;
        }

        Err(last_parse_failure.unwrap_or_else(|| {
            NlqError::validation(previous_error.unwrap_or_else(|| "candidate failed validation".to_string()))
        }))
    }

    fn build_prompt(
        &self,
        schema_text: &str,
        query: &str,
        intent: &IntentClassification,
        language: NlqLanguage,
        previous_error: Option<&str>,
    ) -> String {
        let entities = intent.entities.iter().map(|e| escape_cypher_literal(e)).collect::<Vec<_>>().join(", ");
        let lang = match language {
            NlqLanguage::Ja => "Japanese",
            NlqLanguage::En => "English",
        };
        let hint = intent_hint(intent);
        let mut prompt = format!(
            "Schema:\n{schema_text}\n\n\
             Intent: {:?} (confidence {:.2})\n\
             Extracted entities: [{entities}]\n\
             {hint}\n\
             Respond to a {lang}-speaking user in Cypher only. \
             Use only the labels and relationship types listed in the schema; match property names exactly. \
             Always include a LIMIT clause (default {}); inline literal values rather than using parameters; \
             a query that matches nothing should return empty results rather than erroring.\n\n\
             User query: {query}",
            intent.intent_type, intent.confidence, self.result_limit,
        );
        if let Some(error) = previous_error {
            prompt.push_str(&format!("\n\nThe previous attempt failed validation with: {error}\nCorrect the query accordingly."));
        }
        prompt
    }
}

fn intent_hint(intent: &IntentClassification) -> &'static str {
    use paperkg_core::NlqIntentType::*;
    match intent.intent_type {
        EntityLookup => "Hint: return the matching entity's properties directly.",
        RelationshipQuery => "Hint: traverse the relevant relationship type(s) between the named entities.",
        PathFinding => "Hint: find a path between the named entities, bounded by a small number of hops.",
        Aggregation => "Hint: use an aggregating function (count, avg, collect) over the matched set.",
        GlobalSummary => "Hint: summarize across the whole label rather than a single entity.",
        Comparison => "Hint: match both entities and compare a shared property between them.",
    }
}

/// Parses the model response by first looking for a fenced code block
/// whose body looks like Cypher, then falling back to a direct
/// `MATCH ... RETURN ...` span scan.
fn extract_cypher(text: &str) -> Option<String> {
    if let Some(candidate) = extract_from_fenced_block(text) {
        return Some(candidate);
    }
    extract_match_return_span(text)
}

fn extract_from_fenced_block(text: &str) -> Option<String> {
    let fence = Regex::new(r"```(?:\w+)?\s*\n([\s\S]*?)```").ok()?;
    for capture in fence.captures_iter(text) {
        let body = capture.get(1)?.as_str().trim();
        if smells_like_cypher(body) {
            return Some(body.to_string());
        }
    }
    None
}

fn extract_match_return_span(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    let start = upper.find("MATCH")?;
    let return_pos = upper[start..].find("RETURN")?;
    let after_return = start + return_pos + "RETURN".len();
    let rest = &text[after_return..];
    let line_end = rest.find('\n').map(|i| after_return + i).unwrap_or(text.len());
    let candidate = text[start..line_end].trim();
    if smells_like_cypher(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

fn smells_like_cypher(body: &str) -> bool {
    let upper = body.to_uppercase();
    CYPHER_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_a_fenced_cypher_block() {
        let text = "Here's the query:\n```cypher\nMATCH (p:Paper) RETURN p LIMIT 25\n```\nDone.";
        assert_eq!(extract_cypher(text), Some("MATCH (p:Paper) RETURN p LIMIT 25".to_string()));
    }

    #[test]
    fn falls_back_to_a_direct_match_return_scan() {
        let text = "I think the query is MATCH (p:Paper) RETURN p.title\nLet me know if that works.";
        assert_eq!(extract_cypher(text), Some("MATCH (p:Paper) RETURN p.title".to_string()));
    }

    #[test]
    fn prose_with_no_cypher_yields_none() {
        assert_eq!(extract_cypher("I'm not sure how to answer that."), None);
    }

    use crate::executor::{CypherExecutor, ValidationOutcome};
    use crate::intent_classifier::IntentClassification;
    use async_trait::async_trait;
    use paperkg_core::NlqIntentType;
    use paperkg_storage::{InMemoryGraphStore, SchemaProvider};
    use paperkg_test_utils::MockLlmProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rejects the first two candidates with a syntax complaint, then
    /// accepts the third.
    struct FlakyValidator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CypherExecutor for FlakyValidator {
        async fn validate(&self, _cypher: &str) -> ValidationOutcome {
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                ValidationOutcome::invalid("syntax error near RETURN")
            } else {
                ValidationOutcome::valid()
            }
        }

        async fn execute(&self, _cypher: &str) -> Result<serde_json::Value, String> {
            Ok(serde_json::Value::Null)
        }
    }

    fn sample_intent() -> IntentClassification {
        IntentClassification {
            intent_type: NlqIntentType::EntityLookup,
            confidence: 0.9,
            entities: vec!["GPT4".to_string()],
            relations: Vec::new(),
            is_ambiguous: false,
            clarification_needed: None,
        }
    }

    #[tokio::test]
    async fn retries_until_validation_passes_then_succeeds_on_third_attempt() {
        let llm = Arc::new(MockLlmProvider::new());
        for _ in 0..3 {
            llm.push_response("```cypher\nMATCH (p:Paper {name: 'GPT4'}) RETURN p LIMIT 25\n```");
        }
        let schema = Arc::new(SchemaProvider::new(Arc::new(InMemoryGraphStore::new())));
        let executor = Arc::new(FlakyValidator { calls: AtomicUsize::new(0) });
        let generator = CypherGenerator::new(llm, schema, Some(executor.clone()));

        let result = generator.generate("find GPT4", &sample_intent(), NlqLanguage::En).await.unwrap();
        assert!(result.query.is_valid);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausting_retries_surfaces_a_validation_error() {
        let llm = Arc::new(MockLlmProvider::new());
        for _ in 0..=DEFAULT_MAX_RETRIES {
            llm.push_response("```cypher\nMATCH (p:Paper) RETURN p LIMIT 25\n```");
        }
        let schema = Arc::new(SchemaProvider::new(Arc::new(InMemoryGraphStore::new())));
        struct AlwaysInvalid;
        #[async_trait]
        impl CypherExecutor for AlwaysInvalid {
            async fn validate(&self, _cypher: &str) -> ValidationOutcome {
                ValidationOutcome::invalid("unknown label")
            }
            async fn execute(&self, _cypher: &str) -> Result<serde_json::Value, String> {
                Ok(serde_json::Value::Null)
            }
        }
        let generator = CypherGenerator::new(llm, schema, Some(Arc::new(AlwaysInvalid)));

        let err = generator.generate("find anything", &sample_intent(), NlqLanguage::En).await.unwrap_err();
        assert_eq!(err.code, paperkg_core::NlqErrorCode::Validation);
    }
}
