use serde_json::Value;

/// Resolve one configured data binding against the journey payload.
///
/// - blank binding → `None`
/// - `{{Event.<key>.<field>}}` with `payload.Event` present → strict walk
///   of the path; `None` at the first missing segment, no fallback
/// - `{{Event...}}` with `payload.Event` absent → case-insensitive
///   depth-first search of the whole payload for the last path segment
/// - anything else non-blank (including `{{...}}` strings that are not a
///   well-formed `Event` path) → returned verbatim as a literal
///
/// Pure function; no side effects.
pub fn resolve(binding: &str, payload: &Value) -> Option<String> {
    let binding = binding.trim();
    if binding.is_empty() {
        return None;
    }

    let Some(path) = event_path(binding) else {
        return Some(binding.to_string());
    };

    if let Some(event) = payload.get("Event") {
        let mut cursor = event;
        for segment in &path[1..] {
            cursor = cursor.get(segment)?;
        }
        return render(cursor);
    }

    // The event data did not arrive under `Event`; fall back to searching
    // anywhere in the payload for the leaf field name.
    let leaf = path.last()?;
    deep_search(payload, leaf).and_then(render)
}

/// Parse `{{Event.a.b}}` into its dot-separated segments.
/// Returns `None` unless the braces are balanced, the first segment is
/// `Event` (case-sensitive) and there is at least one more segment.
fn event_path(binding: &str) -> Option<Vec<&str>> {
    let inner = binding.strip_prefix("{{")?.strip_suffix("}}")?;
    let segments: Vec<&str> = inner.split('.').collect();
    if segments.first() != Some(&"Event") || segments.len() < 2 {
        return None;
    }
    Some(segments)
}

/// Preorder depth-first search for a key matching `field`
/// (case-insensitive). First match in map iteration order wins.
pub(crate) fn deep_search<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.eq_ignore_ascii_case(field) {
                    return Some(child);
                }
                if let Some(found) = deep_search(child, field) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(|item| deep_search(item, field)),
        _ => None,
    }
}

/// Scalars render as text; `null` counts as unresolved.
pub(crate) fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "keyValue": "c-001",
            "Event": {
                "E1": {
                    "Phone": "+3412345678",
                    "Name": "Ann",
                    "Nested": { "Deep": "inner" }
                }
            }
        })
    }

    #[test]
    fn test_event_path_resolves_exact_value() {
        assert_eq!(
            resolve("{{Event.E1.Phone}}", &payload()),
            Some("+3412345678".to_string())
        );
    }

    #[test]
    fn test_event_path_walks_deeper_paths() {
        assert_eq!(
            resolve("{{Event.E1.Nested.Deep}}", &payload()),
            Some("inner".to_string())
        );
    }

    #[test]
    fn test_missing_segment_returns_none_without_fallback() {
        // `Phone` exists elsewhere in the payload, but the strict branch
        // must not fall back to searching for it.
        assert_eq!(resolve("{{Event.Other.Phone}}", &payload()), None);
        assert_eq!(resolve("{{Event.E1.Missing}}", &payload()), None);
    }

    #[test]
    fn test_blank_binding_returns_none() {
        assert_eq!(resolve("", &payload()), None);
        assert_eq!(resolve("   ", &payload()), None);
    }

    #[test]
    fn test_literal_binding_passes_through() {
        assert_eq!(
            resolve("+34600111222", &payload()),
            Some("+34600111222".to_string())
        );
        assert_eq!(resolve("hello", &json!({})), Some("hello".to_string()));
    }

    #[test]
    fn test_braced_non_event_binding_is_a_literal() {
        assert_eq!(
            resolve("{{Contact.Phone}}", &payload()),
            Some("{{Contact.Phone}}".to_string())
        );
        assert_eq!(resolve("{{Event}}", &payload()), Some("{{Event}}".to_string()));
    }

    #[test]
    fn test_fallback_search_when_event_absent() {
        let flat = json!({
            "contact": { "details": { "phone": "+111" } }
        });
        assert_eq!(
            resolve("{{Event.E1.Phone}}", &flat),
            Some("+111".to_string())
        );
    }

    #[test]
    fn test_fallback_search_misses_returns_none() {
        let flat = json!({ "contact": { "name": "Ann" } });
        assert_eq!(resolve("{{Event.E1.Phone}}", &flat), None);
    }

    #[test]
    fn test_fallback_tie_break_is_first_in_iteration_order() {
        // serde_json's map iterates keys in sorted order, so `a.phone`
        // is encountered before `b.phone`.
        let flat = json!({
            "a": { "phone": "first" },
            "b": { "phone": "second" }
        });
        assert_eq!(
            resolve("{{Event.E1.Phone}}", &flat),
            Some("first".to_string())
        );
    }

    #[test]
    fn test_fallback_searches_inside_arrays() {
        let flat = json!({
            "rows": [ { "name": "x" }, { "phone": "+222" } ]
        });
        assert_eq!(
            resolve("{{Event.E1.Phone}}", &flat),
            Some("+222".to_string())
        );
    }

    #[test]
    fn test_numeric_values_render_as_text() {
        let data = json!({ "Event": { "E1": { "Count": 7, "Flag": true } } });
        assert_eq!(resolve("{{Event.E1.Count}}", &data), Some("7".to_string()));
        assert_eq!(resolve("{{Event.E1.Flag}}", &data), Some("true".to_string()));
    }

    #[test]
    fn test_null_value_is_unresolved() {
        let data = json!({ "Event": { "E1": { "Phone": null } } });
        assert_eq!(resolve("{{Event.E1.Phone}}", &data), None);
    }
}
