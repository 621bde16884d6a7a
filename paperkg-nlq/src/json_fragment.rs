//! Extracts a JSON object embedded in otherwise free-form model text.

use serde::de::DeserializeOwned;

pub fn extract_json_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, PartialEq, Debug)]
    struct Sample {
        a: i32,
    }

    #[test]
    fn extracts_from_surrounding_prose() {
        let text = "here you go:\n{\"a\": 7}\nthanks";
        assert_eq!(extract_json_object::<Sample>(text), Some(Sample { a: 7 }));
    }

    #[test]
    fn missing_braces_yields_none() {
        assert_eq!(extract_json_object::<Sample>("no json here"), None);
    }
}
