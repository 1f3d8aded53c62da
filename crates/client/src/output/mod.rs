//! Output formatting.
//!
//! `--format json` prints compact JSON lines so output can be piped into
//! other tools; `pretty` goes through [`pretty`].

pub mod pretty;

use serde::Serialize;

/// Compact JSON for machine consumption.
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_json_is_single_line() {
        let output = format_json(&json!({"name": "Lab", "floors": [1, 2]}));
        assert!(!output.contains('\n'));
        assert_eq!(output, r#"{"floors":[1,2],"name":"Lab"}"#);
    }
}
