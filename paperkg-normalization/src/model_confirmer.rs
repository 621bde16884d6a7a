//! Stage three of the cascade: an LLM asked to confirm or correct the best
//! candidate so far, invoked only when that candidate's confidence is
//! still below the configured threshold.

use paperkg_llm::{ChatMessage, CompletionRequest, LlmProvider};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfirmationOutcome {
    pub confirmed: bool,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl ConfirmationOutcome {
    fn unparseable() -> Self {
        Self { confirmed: false, suggestion: None, confidence: 0.0, explanation: None }
    }
}

fn build_prompt(input: &str, best_candidate: Option<&str>) -> String {
    match best_candidate {
        Some(candidate) => format!(
            "Is \"{input}\" the same entity as canonical name \"{candidate}\"? \
             Respond with a single JSON object: \
             {{\"confirmed\": bool, \"suggestion\": string or null, \"confidence\": number between 0 and 1, \"explanation\": string or null}}."
        ),
        None => format!(
            "What is the canonical name for \"{input}\"? \
             Respond with a single JSON object: \
             {{\"confirmed\": bool, \"suggestion\": string or null, \"confidence\": number between 0 and 1, \"explanation\": string or null}}."
        ),
    }
}

/// Extract the first balanced-looking `{...}` span from free text and parse
/// it. Anything that fails to parse, including "no braces at all", yields
/// the documented fallback rather than an error.
fn extract_confirmation(text: &str) -> ConfirmationOutcome {
    let Some(start) = text.find('{') else {
        return ConfirmationOutcome::unparseable();
    };
    let Some(end) = text.rfind('}') else {
        return ConfirmationOutcome::unparseable();
    };
    if end < start {
        return ConfirmationOutcome::unparseable();
    }
    serde_json::from_str(&text[start..=end]).unwrap_or_else(|_| ConfirmationOutcome::unparseable())
}

/// Ask `provider` to confirm (or suggest a correction to) `best_candidate`
/// as the canonical form of `input`. Any provider-level failure is the
/// caller's to handle; a malformed response degrades to "not confirmed".
pub async fn confirm(
    provider: &dyn LlmProvider,
    input: &str,
    best_candidate: Option<&str>,
) -> Result<ConfirmationOutcome, paperkg_llm::LlmError> {
    let prompt = build_prompt(input, best_candidate);
    let request = CompletionRequest::new(vec![ChatMessage::user(prompt)], 256).with_temperature(0.0);
    let response = provider.chat(request).await?;
    Ok(extract_confirmation(&response.content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_clean_json_object() {
        let text = r#"{"confirmed": true, "confidence": 0.92, "suggestion": "GPT4"}"#;
        let outcome = extract_confirmation(text);
        assert!(outcome.confirmed);
        assert_eq!(outcome.confidence, 0.92);
        assert_eq!(outcome.suggestion.as_deref(), Some("GPT4"));
    }

    #[test]
    fn extracts_json_embedded_in_prose() {
        let text = "Sure, here is my answer:\n{\"confirmed\": false, \"confidence\": 0.3}\nHope that helps!";
        let outcome = extract_confirmation(text);
        assert!(!outcome.confirmed);
        assert_eq!(outcome.confidence, 0.3);
    }

    #[test]
    fn unparseable_text_falls_back_to_unconfirmed() {
        let outcome = extract_confirmation("I'm not sure how to answer that.");
        assert_eq!(outcome, ConfirmationOutcome::unparseable());
    }

    #[test]
    fn malformed_json_falls_back_to_unconfirmed() {
        let outcome = extract_confirmation("{confirmed: true, confidence: }");
        assert_eq!(outcome, ConfirmationOutcome::unparseable());
    }
}
