//! Deterministic content hash for `Paper` records.

use crate::entities::Author;
use crate::text_norm::normalize_title;
use sha2::{Digest, Sha256};

/// Compute the deterministic content hash over (normalized title, normalized
/// abstract, ordered author names, sorted categories).
///
/// Author names are sorted before hashing so that reordering an *equal* set
/// of authors never changes the hash: any permutation of the same multiset
/// of names yields the same sorted sequence.
pub fn paper_content_hash(
    title: &str,
    abstract_text: &str,
    authors: &[Author],
    categories: &[String],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_title(title).as_bytes());
    hasher.update(b"\0");
    hasher.update(normalize_title(abstract_text).as_bytes());
    hasher.update(b"\0");

    let mut author_names: Vec<String> = authors
        .iter()
        .map(|a| crate::text_norm::normalize_author_name(&a.name))
        .collect();
    author_names.sort();
    hasher.update(author_names.join(",").as_bytes());
    hasher.update(b"\0");

    let mut sorted_categories: Vec<String> = categories.to_vec();
    sorted_categories.sort();
    hasher.update(sorted_categories.join(",").as_bytes());

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(name: &str) -> Author {
        Author::new(name)
    }

    #[test]
    fn hash_is_stable_across_reinvocation() {
        let h1 = paper_content_hash(
            "A Survey",
            "An abstract.",
            &[author("Zhang"), author("Li")],
            &["cs.CL".to_string()],
        );
        let h2 = paper_content_hash(
            "A Survey",
            "An abstract.",
            &[author("Zhang"), author("Li")],
            &["cs.CL".to_string()],
        );
        assert_eq!(h1, h2);
    }

    #[test]
    fn reordering_equal_author_lists_does_not_change_hash() {
        let h1 = paper_content_hash(
            "A Survey",
            "An abstract.",
            &[author("Zhang"), author("Li"), author("Wang")],
            &["cs.CL".to_string(), "cs.AI".to_string()],
        );
        let h2 = paper_content_hash(
            "A Survey",
            "An abstract.",
            &[author("Wang"), author("Zhang"), author("Li")],
            &["cs.AI".to_string(), "cs.CL".to_string()],
        );
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_authors_change_the_hash() {
        let h1 = paper_content_hash("A Survey", "An abstract.", &[author("Zhang")], &[]);
        let h2 = paper_content_hash("A Survey", "An abstract.", &[author("Li")], &[]);
        assert_ne!(h1, h2);
    }
}
