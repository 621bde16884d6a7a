//! Text normalization helpers shared by the content hash, the deduplicator,
//! and the alias table.

/// Lowercase, strip everything that is not a word character or whitespace,
/// then collapse runs of whitespace to a single space and trim.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    collapse_whitespace(&stripped)
}

/// Lowercase, strip punctuation, collapse whitespace — the author-name
/// normalization rule used for author matching.
pub fn normalize_author_name(name: &str) -> String {
    normalize_title(name)
}

/// The alias table's primary-key form: lowercased and trimmed. Unlike
/// `normalize_title`, punctuation is preserved — aliases like "GPT-4" and
/// "GPT 4" are deliberately distinct keys unless a rule merges them
/// upstream.
pub fn normalize_alias_key(alias: &str) -> String {
    alias.trim().to_lowercase()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(
            normalize_title("A Survey of  Large-Language Models!"),
            "a survey of large language models"
        );
    }

    #[test]
    fn normalize_alias_key_preserves_punctuation() {
        assert_eq!(normalize_alias_key("  GPT-4  "), "gpt-4");
    }
}
