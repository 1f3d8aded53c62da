//! Serde helpers for request payloads.
//!
//! The front end submits blank inputs as empty strings; optional text fields
//! treat those as absent.

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating empty or whitespace-only strings as None.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "deserialize_optional_string")]
        comments: Option<String>,
    }

    #[test]
    fn test_deserialize_optional_string_empty() {
        let form: Form = serde_json::from_str(r#"{"comments": ""}"#).unwrap();
        assert_eq!(form.comments, None);
    }

    #[test]
    fn test_deserialize_optional_string_whitespace() {
        let form: Form = serde_json::from_str(r#"{"comments": "   "}"#).unwrap();
        assert_eq!(form.comments, None);
    }

    #[test]
    fn test_deserialize_optional_string_value() {
        let form: Form = serde_json::from_str(r#"{"comments": "north wing"}"#).unwrap();
        assert_eq!(form.comments, Some("north wing".to_string()));
    }

    #[test]
    fn test_deserialize_optional_string_missing() {
        let form: Form = serde_json::from_str("{}").unwrap();
        assert_eq!(form.comments, None);
    }

    #[test]
    fn test_deserialize_optional_string_null() {
        let form: Form = serde_json::from_str(r#"{"comments": null}"#).unwrap();
        assert_eq!(form.comments, None);
    }
}
