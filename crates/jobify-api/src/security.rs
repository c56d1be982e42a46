//! Input sanitization.
//!
//! This module provides:
//! - Markup cleaning for string values (script blocks removed, `<` escaped)
//! - Detection and removal of query-operator keys (`$gt`, `a.b`, `a[$ne]`)

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// `<script ...> ... </script>` blocks, case-insensitive, across lines.
static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script regex")
});

/// Unterminated opening script tags left after block removal.
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*/?\s*script\b[^>]*>?").expect("valid script tag regex"));

/// Clean a single string value.
pub fn clean_text(input: &str) -> String {
    let without_blocks = SCRIPT_BLOCK.replace_all(input, "");
    let without_tags = SCRIPT_TAG.replace_all(&without_blocks, "");
    without_tags.replace('<', "&lt;").trim().to_string()
}

/// Clean every string in a JSON value, recursively. Keys are left alone.
pub fn clean_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let cleaned = clean_text(s);
            if cleaned != *s {
                *s = cleaned;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(clean_value),
        Value::Object(map) => map.values_mut().for_each(clean_value),
        _ => {}
    }
}

/// Object keys that could change a document query's structure.
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Query keys are also checked per bracket segment, so `a[$ne]` and
/// `a[b.c]` are caught.
pub fn is_operator_query_key(key: &str) -> bool {
    if is_operator_key(key) {
        return true;
    }
    key.split(['[', ']'])
        .filter(|segment| !segment.is_empty())
        .any(is_operator_key)
}

/// Remove operator keys from a JSON value, recursively.
///
/// Returns the dotted paths of the removed keys.
pub fn strip_operators(value: &mut Value) -> Vec<String> {
    let mut removed = Vec::new();
    strip_at(value, "", &mut removed);
    removed
}

fn strip_at(value: &mut Value, prefix: &str, removed: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            let offending: Vec<String> = map.keys().filter(|k| is_operator_key(k)).cloned().collect();
            for key in offending {
                map.remove(&key);
                removed.push(join_path(prefix, &key));
            }
            for (key, child) in map.iter_mut() {
                strip_at(child, &join_path(prefix, key), removed);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                strip_at(child, &join_path(prefix, &index.to_string()), removed);
            }
        }
        _ => {}
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Acme  "), "Acme");
        assert_eq!(clean_text("<script>alert(1)</script>Acme"), "Acme");
        assert_eq!(clean_text("<SCRIPT type=\"x\">\nbad()\n</script >ok"), "ok");
        assert_eq!(clean_text("<b>bold</b>"), "&lt;b>bold&lt;/b>");
        assert_eq!(clean_text("<script>never closed"), "never closed");
        assert_eq!(clean_text("5 > 3"), "5 > 3");
    }

    #[test]
    fn test_clean_value_is_recursive() {
        let mut value = json!({
            "company": " <script>x()</script>Acme ",
            "tags": ["<i>a</i>", 3, null],
            "nested": { "position": "<img src=x>" },
        });
        clean_value(&mut value);
        assert_eq!(
            value,
            json!({
                "company": "Acme",
                "tags": ["&lt;i>a&lt;/i>", 3, null],
                "nested": { "position": "&lt;img src=x>" },
            })
        );
    }

    #[test]
    fn test_operator_keys() {
        assert!(is_operator_key("$gt"));
        assert!(is_operator_key("profile.email"));
        assert!(!is_operator_key("email"));
        assert!(!is_operator_key("price$"));

        assert!(is_operator_query_key("status[$ne]"));
        assert!(is_operator_query_key("a[b.c]"));
        assert!(!is_operator_query_key("status"));
        assert!(!is_operator_query_key("tags[]"));
    }

    #[test]
    fn test_strip_operators() {
        let mut value = json!({
            "email": "a@b.c",
            "password": { "$ne": null },
            "$where": "sleep(1000)",
            "list": [{ "x.y": 1, "ok": 2 }],
        });
        let mut removed = strip_operators(&mut value);
        removed.sort();

        assert_eq!(removed, ["$where", "list/0/x.y", "password/$ne"]);
        assert_eq!(
            value,
            json!({
                "email": "a@b.c",
                "password": {},
                "list": [{ "ok": 2 }],
            })
        );
    }
}
