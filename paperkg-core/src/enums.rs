//! Closed-set enums for the PaperKG data model.

use serde::{Deserialize, Serialize};

/// Where a `Paper` record originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperSource {
    Bibliographic,
    OpenAccess,
    Manual,
}

/// Lifecycle status of a `Paper` as it moves through extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStatus {
    Ingested,
    Extracting,
    Extracted,
    Reviewing,
    Completed,
    Failed,
}

/// Type discriminator for a `GraphEntity` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphEntityType {
    AiModel,
    Technique,
    Concept,
    Organization,
    Person,
    Publication,
    Benchmark,
    Community,
    Entity,
}

/// Closed set of relation types a `GraphRelation` edge may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphRelationType {
    DerivedFrom,
    Uses,
    DevelopedBy,
    AuthoredBy,
    AffiliatedWith,
    EvaluatedOn,
    Cites,
    Improves,
    Applies,
    BelongsTo,
    MemberOf,
    /// Ingestion-specific: links a `Publication` entity back to the `Paper` it was extracted from.
    ExtractedFrom,
    /// Ingestion-specific: links two `Paper`-derived `Publication` entities that were deduplicated together.
    DuplicateOf,
}

impl GraphRelationType {
    /// The relation's Cypher-facing name, used by the schema provider and the NLQ generator.
    pub fn as_cypher_str(&self) -> &'static str {
        match self {
            GraphRelationType::DerivedFrom => "DERIVED_FROM",
            GraphRelationType::Uses => "USES",
            GraphRelationType::DevelopedBy => "DEVELOPED_BY",
            GraphRelationType::AuthoredBy => "AUTHORED_BY",
            GraphRelationType::AffiliatedWith => "AFFILIATED_WITH",
            GraphRelationType::EvaluatedOn => "EVALUATED_ON",
            GraphRelationType::Cites => "CITES",
            GraphRelationType::Improves => "IMPROVES",
            GraphRelationType::Applies => "APPLIES",
            GraphRelationType::BelongsTo => "BELONGS_TO",
            GraphRelationType::MemberOf => "MEMBER_OF",
            GraphRelationType::ExtractedFrom => "EXTRACTED_FROM",
            GraphRelationType::DuplicateOf => "DUPLICATE_OF",
        }
    }
}

/// Provenance of an `Alias` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasSource {
    Rule,
    Similarity,
    Llm,
    Import,
}

/// Discrete citation-dynamics classification for an entity on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionPhase {
    Emerging,
    Growing,
    Mature,
    Declining,
}

/// The class of match a deduplication verdict is based on.
///
/// `ExternalId` is kept distinct from `Doi` rather than overloading the `Doi`
/// tag for any shared strong identifier a source exposes (arXiv ID, PMID,
/// Semantic Scholar ID, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Doi,
    ExternalId,
    Title,
    TitleAuthor,
}

/// Forecasting method selector for `TrendForecaster`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMethod {
    Sma,
    Ema,
    Wma,
    Linear,
}

/// Direction of a forecasted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Stable,
    Down,
}

/// Timeline aggregation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineGranularity {
    Day,
    Week,
    Month,
}

/// Classified intent of a natural-language query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NlqIntentType {
    EntityLookup,
    RelationshipQuery,
    PathFinding,
    Aggregation,
    GlobalSummary,
    Comparison,
}

/// Desired natural-language locale for NLQ prompts and clarifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NlqLanguage {
    Ja,
    En,
}

/// Three-state circuit breaker status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_type_cypher_names_are_shouty_snake_case() {
        assert_eq!(GraphRelationType::DerivedFrom.as_cypher_str(), "DERIVED_FROM");
        assert_eq!(GraphRelationType::Cites.as_cypher_str(), "CITES");
    }

    #[test]
    fn paper_source_serializes_kebab_case() {
        let json = serde_json::to_string(&PaperSource::OpenAccess).unwrap();
        assert_eq!(json, "\"open-access\"");
    }
}
