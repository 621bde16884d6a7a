//! Stage two of the cascade: edit-distance similarity against a set of
//! known canonical names, optionally widened with vector-search neighbors.

use paperkg_core::normalized_similarity;
use paperkg_llm::{VectorHit, VectorIndex, VectorSearchRequest};

/// Similarity at or above which a candidate is surfaced.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityCandidate {
    pub canonical: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityOutcome {
    pub best: Option<SimilarityCandidate>,
    pub candidates: Vec<SimilarityCandidate>,
}

/// Edit-distance matching against the in-memory `known` set. Pure and
/// synchronous: no vector index involved.
pub fn match_similarity(input: &str, known: &[String], threshold: f64) -> SimilarityOutcome {
    let mut candidates: Vec<SimilarityCandidate> = known
        .iter()
        .map(|canonical| SimilarityCandidate { canonical: canonical.clone(), score: normalized_similarity(input, canonical) })
        .filter(|c| c.score >= threshold)
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let best = candidates.first().cloned();
    SimilarityOutcome { best, candidates }
}

/// Same as [`match_similarity`], but widens the known set with the index's
/// top-k approximate neighbors of `embedding` before scoring. A failed
/// vector search degrades to edit-distance-only matching rather than
/// failing the whole cascade.
pub async fn match_similarity_with_vector_index(
    input: &str,
    known: &[String],
    threshold: f64,
    index: &dyn VectorIndex,
    collection: &str,
    embedding: Vec<f32>,
    top_k: usize,
) -> SimilarityOutcome {
    let mut augmented = known.to_vec();
    let request = VectorSearchRequest { collection: collection.to_string(), vector: embedding, limit: top_k, with_payload: false };
    if let Ok(hits) = index.search(request).await {
        augmented.extend(hits.into_iter().map(|hit: VectorHit| hit.entity_id));
        augmented.sort();
        augmented.dedup();
    }
    match_similarity(input, &augmented, threshold)
}
