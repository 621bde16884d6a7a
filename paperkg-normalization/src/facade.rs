//! Entity normalizer: the façade that runs the alias lookup and the
//! three-stage cascade, in that order, and optionally registers the
//! outcome as a new alias.

use crate::alias_table::AliasTableManager;
use crate::model_confirmer::{self, ConfirmationOutcome};
use crate::rule_normalizer::{RuleNormalizationOutcome, RuleNormalizer};
use crate::similarity_matcher::{self, SimilarityOutcome};
use paperkg_core::{normalize_alias_key, Alias, AliasSource};
use paperkg_llm::LlmProvider;
use std::sync::Arc;
use tracing::warn;

/// Similarity below which model confirmation is attempted, absent an
/// explicit override.
pub const DEFAULT_LLM_CONFIRMATION_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationStage {
    AliasTable,
    Rule,
    Similarity,
    Llm,
}

#[derive(Debug, Clone, Default)]
pub struct StageTrace {
    pub rule: Option<RuleNormalizationOutcome>,
    pub similarity: Option<SimilarityOutcome>,
    pub llm: Option<ConfirmationOutcome>,
}

#[derive(Debug, Clone)]
pub struct NormalizationResult {
    pub input: String,
    pub canonical: String,
    pub confidence: f64,
    pub was_normalized: bool,
    pub stage: NormalizationStage,
    pub stages: StageTrace,
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub use_llm_confirmation: bool,
    pub llm_confirmation_threshold: f64,
    pub auto_register_aliases: bool,
    pub skip_llm: bool,
    pub force_llm: bool,
    pub similarity_threshold: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            use_llm_confirmation: false,
            llm_confirmation_threshold: DEFAULT_LLM_CONFIRMATION_THRESHOLD,
            auto_register_aliases: false,
            skip_llm: false,
            force_llm: false,
            similarity_threshold: similarity_matcher::DEFAULT_THRESHOLD,
        }
    }
}

/// Runs the cascade and owns the alias table consulted by its first stage.
/// Does not own a rule set of its own; rules are compiled once by the
/// caller and shared across calls via [`RuleNormalizer`].
pub struct EntityNormalizer {
    aliases: Arc<AliasTableManager>,
    rules: RuleNormalizer,
    known_canonicals: Vec<String>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl EntityNormalizer {
    pub fn new(aliases: Arc<AliasTableManager>, rules: RuleNormalizer, known_canonicals: Vec<String>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { aliases, rules, known_canonicals, llm }
    }

    /// Normalize `input`, short-circuiting as early as the documented
    /// stages allow. Any stage failure is logged and the best result so
    /// far is returned rather than propagated.
    pub async fn normalize(&self, input: &str, options: &NormalizeOptions) -> NormalizationResult {
        if let Ok(Some(alias)) = self.aliases.resolve_alias(input).await {
            return self.finish(input, alias.canonical, 0.95, NormalizationStage::AliasTable, StageTrace::default(), options).await;
        }

        let rule_outcome = self.rules.normalize(input);
        let mut stages = StageTrace { rule: Some(rule_outcome.clone()), ..Default::default() };

        if rule_outcome.confidence >= options.llm_confirmation_threshold && !options.force_llm {
            return self.finish(input, rule_outcome.output, rule_outcome.confidence, NormalizationStage::Rule, stages, options).await;
        }

        let similarity_outcome = similarity_matcher::match_similarity(&rule_outcome.output, &self.known_canonicals, options.similarity_threshold);
        stages.similarity = Some(similarity_outcome.clone());

        let (mut canonical, mut confidence, mut stage) = match &similarity_outcome.best {
            Some(candidate) => (candidate.canonical.clone(), candidate.score, NormalizationStage::Similarity),
            None => (rule_outcome.output.clone(), rule_outcome.confidence, NormalizationStage::Rule),
        };

        let should_confirm = options.use_llm_confirmation
            && self.llm.is_some()
            && !options.skip_llm
            && (options.force_llm || confidence < options.llm_confirmation_threshold);

        if should_confirm {
            if let Some(provider) = &self.llm {
                match model_confirmer::confirm(provider.as_ref(), input, similarity_outcome.best.as_ref().map(|c| c.canonical.as_str())).await {
                    Ok(outcome) => {
                        if outcome.confirmed {
                            if let Some(suggestion) = &outcome.suggestion {
                                canonical = suggestion.clone();
                            }
                            confidence = outcome.confidence;
                            stage = NormalizationStage::Llm;
                        }
                        stages.llm = Some(outcome);
                    }
                    Err(err) => {
                        warn!(error = %err, "model confirmation stage failed, keeping prior best result");
                    }
                }
            }
        }

        self.finish(input, canonical, confidence, stage, stages, options).await
    }

    async fn finish(
        &self,
        input: &str,
        canonical: String,
        confidence: f64,
        stage: NormalizationStage,
        stages: StageTrace,
        options: &NormalizeOptions,
    ) -> NormalizationResult {
        let was_normalized = normalize_alias_key(input) != normalize_alias_key(&canonical);
        if options.auto_register_aliases && was_normalized {
            let source = match stage {
                NormalizationStage::AliasTable => AliasSource::Rule,
                NormalizationStage::Rule => AliasSource::Rule,
                NormalizationStage::Similarity => AliasSource::Similarity,
                NormalizationStage::Llm => AliasSource::Llm,
            };
            let alias = Alias {
                alias: input.to_string(),
                canonical: canonical.clone(),
                confidence,
                source,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            if let Err(err) = self.aliases.register_alias(alias).await {
                warn!(error = %err, "failed to auto-register alias, continuing with in-memory result");
            }
        }

        NormalizationResult { input: input.to_string(), canonical, confidence, was_normalized, stage, stages }
    }
}
