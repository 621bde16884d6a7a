//! Pure deduplication: given a candidate paper and a set of existing
//! papers, decide whether the candidate is a duplicate and, if so, of
//! what kind and how confidently.

use paperkg_core::{normalize_author_name, normalize_title, normalized_similarity, MatchType, Paper};
use std::collections::HashSet;

/// Similarity at or above which a title match is accepted outright.
pub const TAU_EXACT: f64 = 0.95;
/// Similarity at or above which a title match is a *candidate*, needing
/// corroborating author overlap to be accepted.
pub const TAU_CANDIDATE: f64 = 0.80;
/// Minimum normalized-name author overlap for a `title_author` match.
pub const MIN_AUTHOR_MATCHES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateVerdict {
    pub is_duplicate: bool,
    pub matched_id: Option<String>,
    pub match_type: Option<MatchType>,
    pub similarity: f64,
    pub needs_review: bool,
}

impl DuplicateVerdict {
    fn none() -> Self {
        Self { is_duplicate: false, matched_id: None, match_type: None, similarity: 0.0, needs_review: false }
    }

    fn matched(id: &str, match_type: MatchType, similarity: f64, needs_review: bool) -> Self {
        Self { is_duplicate: true, matched_id: Some(id.to_string()), match_type: Some(match_type), similarity, needs_review }
    }
}

fn author_name_set(paper: &Paper) -> HashSet<String> {
    paper.authors.iter().map(|a| normalize_author_name(&a.name)).collect()
}

/// Decide whether `candidate` duplicates anything in `existing`, in the
/// documented priority order: identical DOI, then identical external id,
/// then title (with optional author corroboration).
pub fn check_duplicate(candidate: &Paper, existing: &[Paper]) -> DuplicateVerdict {
    if let Some(doi) = candidate.doi.as_deref() {
        if let Some(hit) = existing.iter().find(|p| p.doi.as_deref() == Some(doi)) {
            return DuplicateVerdict::matched(hit.id.as_str(), MatchType::Doi, 1.0, false);
        }
    }

    if let Some(external_id) = candidate.external_id.as_deref() {
        if let Some(hit) = existing.iter().find(|p| p.external_id.as_deref() == Some(external_id)) {
            return DuplicateVerdict::matched(hit.id.as_str(), MatchType::ExternalId, 1.0, false);
        }
    }

    let candidate_title = normalize_title(&candidate.title);
    let candidate_authors = author_name_set(candidate);

    let mut best: Option<(&Paper, f64)> = None;
    for other in existing {
        let similarity = normalized_similarity(&candidate_title, &normalize_title(&other.title));
        if best.map(|(_, s)| similarity > s).unwrap_or(true) {
            best = Some((other, similarity));
        }
    }

    let Some((hit, similarity)) = best else {
        return DuplicateVerdict::none();
    };

    if similarity >= TAU_EXACT {
        return DuplicateVerdict::matched(hit.id.as_str(), MatchType::Title, similarity, similarity < 1.0);
    }

    if similarity >= TAU_CANDIDATE {
        let shared_authors = author_name_set(hit).intersection(&candidate_authors).count();
        if shared_authors >= MIN_AUTHOR_MATCHES {
            return DuplicateVerdict::matched(hit.id.as_str(), MatchType::TitleAuthor, similarity, true);
        }
    }

    DuplicateVerdict::none()
}

/// Batch mode: accepted non-duplicates are folded into the comparison set
/// as the batch is scanned, so duplicates *within* the batch are caught
/// too. Returns one verdict per input paper, in order.
pub fn check_duplicates(papers: &[Paper], existing: &[Paper]) -> Vec<DuplicateVerdict> {
    let mut comparison_set = existing.to_vec();
    let mut verdicts = Vec::with_capacity(papers.len());
    for paper in papers {
        let verdict = check_duplicate(paper, &comparison_set);
        if !verdict.is_duplicate {
            comparison_set.push(paper.clone());
        }
        verdicts.push(verdict);
    }
    verdicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperkg_test_utils::PaperBuilder;

    #[test]
    fn identical_doi_is_a_duplicate_with_similarity_one() {
        let existing = PaperBuilder::new("10.1234/x", "A").with_doi("10.1234/x").build();
        let candidate = PaperBuilder::new("new1", "A updated").with_doi("10.1234/x").build();

        let verdict = check_duplicate(&candidate, &[existing]);
        assert!(verdict.is_duplicate);
        assert_eq!(verdict.match_type, Some(MatchType::Doi));
        assert_eq!(verdict.similarity, 1.0);
        assert!(!verdict.needs_review);
    }

    #[test]
    fn shared_external_id_is_a_duplicate_distinct_from_doi() {
        let existing = PaperBuilder::new("p1", "A").with_external_id("arXiv:1234.5678").build();
        let candidate = PaperBuilder::new("p2", "A updated").with_external_id("arXiv:1234.5678").build();

        let verdict = check_duplicate(&candidate, &[existing]);
        assert!(verdict.is_duplicate);
        assert_eq!(verdict.match_type, Some(MatchType::ExternalId));
        assert_eq!(verdict.similarity, 1.0);
    }

    #[test]
    fn title_and_author_fuzzy_match_needs_review() {
        let existing = PaperBuilder::new("p1", "A Comprehensive Survey of Large Language Models")
            .with_authors(&["Zhang", "Li", "Wang", "Chen"])
            .build();
        let candidate = PaperBuilder::new("p2", "A Comprehensive Review of Large Language Model")
            .with_authors(&["Zhang", "Li", "Wang", "Kumar"])
            .build();

        let verdict = check_duplicate(&candidate, &[existing]);
        assert!(verdict.is_duplicate);
        assert_eq!(verdict.match_type, Some(MatchType::TitleAuthor));
        assert!(verdict.needs_review);
        assert!(verdict.similarity >= TAU_CANDIDATE && verdict.similarity < TAU_EXACT);
    }

    #[test]
    fn unrelated_papers_are_not_duplicates() {
        let existing = PaperBuilder::new("p1", "Graph Neural Networks for Molecules").build();
        let candidate = PaperBuilder::new("p2", "A Theory of Quantum Error Correction").build();
        let verdict = check_duplicate(&candidate, &[existing]);
        assert!(!verdict.is_duplicate);
    }

    #[test]
    fn batch_mode_catches_duplicates_within_the_batch() {
        let first = PaperBuilder::new("p1", "A Survey of Diffusion Models").with_doi("10.1/a").build();
        let second = PaperBuilder::new("p2", "A Survey of Diffusion Models v2").with_doi("10.1/a").build();

        let verdicts = check_duplicates(&[first, second], &[]);
        assert!(!verdicts[0].is_duplicate);
        assert!(verdicts[1].is_duplicate);
        assert_eq!(verdicts[1].match_type, Some(MatchType::Doi));
    }
}
