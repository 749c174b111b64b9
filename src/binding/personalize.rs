use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::resolver::{deep_search, render};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%%(.*?)%%").expect("placeholder regex is valid"));

/// Substitute every `%%field%%` placeholder in `template` with the value
/// found by a case-insensitive deep search of the payload.
///
/// Placeholders with no matching field stay verbatim, delimiters included,
/// so a misconfigured template degrades visibly instead of dropping
/// content. Never fails; an empty template comes back empty.
pub fn personalize(template: &str, payload: &Value) -> String {
    if template.is_empty() {
        return String::new();
    }

    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let field = &caps[1];
            match deep_search(payload, field).and_then(render) {
                Some(value) => value,
                None => {
                    tracing::debug!(field, "placeholder left unresolved");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replaces_matching_placeholder() {
        assert_eq!(
            personalize("Hello %%Name%%", &json!({ "Name": "Ann" })),
            "Hello Ann"
        );
    }

    #[test]
    fn test_unmatched_placeholder_stays_verbatim() {
        assert_eq!(
            personalize("Hello %%Missing%%", &json!({ "Name": "Ann" })),
            "Hello %%Missing%%"
        );
    }

    #[test]
    fn test_field_match_is_case_insensitive() {
        assert_eq!(
            personalize("Hi %%phone%%", &json!({ "Phone": "+34" })),
            "Hi +34"
        );
    }

    #[test]
    fn test_multiple_placeholders() {
        let payload = json!({ "First": "Ann", "Last": "Lee" });
        assert_eq!(
            personalize("%%First%% %%Last%%!", &payload),
            "Ann Lee!"
        );
    }

    #[test]
    fn test_searches_nested_payload() {
        let payload = json!({ "Event": { "E1": { "Phone": "+34" } } });
        assert_eq!(personalize("Hi %%Phone%%", &payload), "Hi +34");
    }

    #[test]
    fn test_empty_template_unchanged() {
        assert_eq!(personalize("", &json!({ "Name": "Ann" })), "");
    }

    #[test]
    fn test_no_placeholders_is_idempotent() {
        let payload = json!({ "Name": "Ann" });
        let once = personalize("plain text", &payload);
        assert_eq!(once, "plain text");
        assert_eq!(personalize(&once, &payload), once);
    }

    #[test]
    fn test_adjacent_placeholders_match_non_greedily() {
        let payload = json!({ "A": "1", "B": "2" });
        assert_eq!(personalize("%%A%%%%B%%", &payload), "12");
    }

    #[test]
    fn test_numeric_value_renders_as_text() {
        assert_eq!(
            personalize("Count: %%Count%%", &json!({ "Count": 3 })),
            "Count: 3"
        );
    }
}
