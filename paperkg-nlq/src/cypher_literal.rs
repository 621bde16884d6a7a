//! A minimal safety net around the generator's choice to inline literal
//! values rather than parameterize them: escape apostrophes and strip
//! control characters before a value is embedded in prompt hint text, and
//! flag candidates whose string literals don't close cleanly.

/// Doubles single quotes and drops control characters, so a value like
/// `O'Brien` can be safely embedded inside a Cypher string literal.
pub fn escape_cypher_literal(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect::<String>().replace('\'', "''")
}

/// Walks `cypher` tracking whether we're inside a single-quoted string
/// literal, treating `''` as an escaped quote rather than a close/reopen.
/// Returns `false` if a literal is left unclosed, which is the shape an
/// un-escaped apostrophe inside a value produces.
pub fn literals_are_balanced(cypher: &str) -> bool {
    let mut chars = cypher.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if c == '\'' {
            if in_string && chars.peek() == Some(&'\'') {
                chars.next();
                continue;
            }
            in_string = !in_string;
        }
    }
    !in_string
}
