//! Stage one of the cascade: compiled regex rewrites applied in descending
//! priority order.

use crate::error::NormalizationError;
use paperkg_core::NormalizationRule;
use regex::{Regex, RegexBuilder};

struct CompiledRule {
    regex: Regex,
    replacement: String,
    rule_id: String,
}

/// Holds the rule set compiled once at load time, sorted so higher-priority
/// rules are tried first.
pub struct RuleNormalizer {
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleNormalizationOutcome {
    pub output: String,
    pub applied_rule_ids: Vec<String>,
    pub confidence: f64,
}

impl RuleNormalizer {
    /// Compiles every rule case-insensitively. Rules are sorted by
    /// descending priority; ties keep their input order.
    pub fn new(mut rules: Vec<NormalizationRule>) -> Result<Self, NormalizationError> {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        let compiled = rules
            .into_iter()
            .map(|rule| {
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| CompiledRule { regex, replacement: rule.replacement, rule_id: rule.id.to_string() })
                    .map_err(|e| NormalizationError::InvalidRule { rule_id: rule.id.to_string(), message: e.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules: compiled })
    }

    /// Apply every compiled rule in order. A rule "applies" only if its
    /// replacement actually changes the string.
    pub fn normalize(&self, input: &str) -> RuleNormalizationOutcome {
        let mut current = input.to_string();
        let mut applied_rule_ids = Vec::new();

        for rule in &self.rules {
            let replaced = rule.regex.replace_all(&current, rule.replacement.as_str()).into_owned();
            if replaced != current {
                current = replaced;
                applied_rule_ids.push(rule.rule_id.clone());
            }
        }

        let confidence = if applied_rule_ids.is_empty() {
            0.5
        } else {
            (0.7 + 0.1 * applied_rule_ids.len() as f64).min(0.95)
        };

        RuleNormalizationOutcome { output: current, applied_rule_ids, confidence }
    }
}
