//! PaperKG Core - Data Types
//!
//! Pure data structures and shared error/ID primitives. Every other crate in
//! the workspace depends on this one. This crate contains no I/O and no
//! business logic beyond small, total functions (content hashing, text
//! normalization) that are part of the data model's own invariants.

mod cache;
mod content_hash;
mod embedding;
mod entities;
mod enums;
mod error;
mod ids;
mod similarity;
mod text_norm;

pub use cache::{CacheStats, TtlLruCache};
pub use content_hash::paper_content_hash;
pub use embedding::{EmbeddingVector, VectorError};
pub use entities::{
    Alias, Author, DailyMetrics, GraphEntity, GraphRelation, NormalizationRule, Path,
    Paper, PropertyMap, PropertyValue, TrendSnapshot,
};
pub use enums::{
    AdoptionPhase, AliasSource, CircuitState, ForecastMethod, GraphEntityType,
    GraphRelationType, MatchType, NlqIntentType, NlqLanguage, PaperSource, ProcessingStatus,
    TimelineGranularity, TrendDirection,
};
pub use error::{ConfigError, NlqErrorCode, Retryable, TransientKind};
pub use ids::{GraphEntityId, GraphRelationId, PaperId, RuleId, ScheduleId};
pub use similarity::{levenshtein, normalized_similarity};
pub use text_norm::{normalize_alias_key, normalize_author_name, normalize_title};
