//! JSON parsing helpers for model responses
//!
//! Models often wrap the JSON payload in prose or code fences even when asked
//! for structured output, so the outermost object is cut out before decoding.

use serde::de::DeserializeOwned;

use crate::capabilities::Capability;
use crate::error::{Error, Result};

const RAW_PREVIEW_CHARS: usize = 200;

/// Slice from the first `{` to the last `}`, if any
pub fn extract_json_object(response: &str) -> Option<&str> {
    let response = response.trim();
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}

/// Decode a capability response, reporting failures as schema violations
pub fn parse_response<T: DeserializeOwned>(capability: Capability, response: &str) -> Result<T> {
    let json_str = extract_json_object(response).ok_or_else(|| {
        Error::schema(
            capability,
            format!("no JSON object in response | Raw: {}", preview(response)),
        )
    })?;

    serde_json::from_str(json_str).map_err(|e| {
        Error::schema(
            capability,
            format!("invalid JSON: {} | Raw: {}", e, preview(json_str)),
        )
    })
}

fn preview(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() > RAW_PREVIEW_CHARS {
        format!("{}...", text.chars().take(RAW_PREVIEW_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::SavingsTipsResponse;

    #[test]
    fn test_extract_json_object() {
        assert_eq!(
            extract_json_object("Sure! ```json\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_response_ok() {
        let raw = r#"Here you go: {"savingsTips":[{"tip":"Brew coffee at home","estimatedSavings":40}]}"#;
        let parsed: SavingsTipsResponse =
            parse_response(Capability::SuggestSavingsTips, raw).unwrap();
        assert_eq!(parsed.savings_tips.len(), 1);
        assert_eq!(parsed.savings_tips[0].estimated_savings, 40.0);
    }

    #[test]
    fn test_parse_response_schema_violation() {
        let err = parse_response::<SavingsTipsResponse>(
            Capability::SuggestSavingsTips,
            r#"{"tips": []}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaViolation {
                capability: Capability::SuggestSavingsTips,
                ..
            }
        ));

        let err =
            parse_response::<SavingsTipsResponse>(Capability::SuggestSavingsTips, "nothing")
                .unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), RAW_PREVIEW_CHARS + 3);
    }
}
