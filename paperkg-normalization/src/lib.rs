//! Entity canonicalization: a three-stage cascade (rules, similarity, model
//! confirmation) consulted only after an alias-table lookup misses, with
//! optional auto-registration of the cascade's outcome as a new alias.

mod alias_table;
mod error;
mod facade;
mod model_confirmer;
mod rule_normalizer;
mod similarity_matcher;

pub use alias_table::{AliasRepository, AliasTableManager, DEFAULT_CACHE_TTL, DEFAULT_MAX_CACHE_SIZE};
pub use error::NormalizationError;
pub use facade::{
    EntityNormalizer, NormalizationResult, NormalizationStage, NormalizeOptions, StageTrace, DEFAULT_LLM_CONFIRMATION_THRESHOLD,
};
pub use model_confirmer::{confirm, ConfirmationOutcome};
pub use rule_normalizer::{RuleNormalizationOutcome, RuleNormalizer};
pub use similarity_matcher::{match_similarity, match_similarity_with_vector_index, SimilarityCandidate, SimilarityOutcome, DEFAULT_THRESHOLD};
