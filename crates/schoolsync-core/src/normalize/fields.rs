//! Tolerant field lookups over raw records.
//!
//! Every lookup walks an ordered list of alternative key names and returns the
//! first usable value. Strings are trimmed and blank strings count as absent.

use serde_json::Value;

/// Raw value stored under `key`, ignoring explicit nulls.
pub fn field<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    record.as_object()?.get(key).filter(|v| !v.is_null())
}

/// Text form of a scalar value. Numbers are stringified; everything else is
/// not text.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-blank text value among `keys`, in priority order.
pub fn first_text(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| field(record, key))
        .find_map(as_text)
}

/// First value among `keys` that is present and not null.
pub fn first_present<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| field(record, key))
}

/// Interpret a value as a flag: booleans, `0`/`1`, and common words.
pub fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "ok" | "success" => Some(true),
            "false" | "0" | "no" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_text_priority_and_blank_skipping() {
        let record = json!({"name": "   ", "fullName": " Ada Lovelace ", "studentName": "Ada"});
        assert_eq!(
            first_text(&record, &["name", "fullName", "studentName"]),
            Some("Ada Lovelace".to_string())
        );
    }

    #[test]
    fn test_first_text_stringifies_numbers() {
        let record = json!({"grade": 7});
        assert_eq!(first_text(&record, &["grade"]), Some("7".to_string()));
    }

    #[test]
    fn test_field_ignores_null_and_non_objects() {
        assert!(field(&json!({"a": null}), "a").is_none());
        assert!(field(&json!(["a"]), "a").is_none());
        assert!(first_text(&json!("plain"), &["a"]).is_none());
    }

    #[test]
    fn test_as_flag() {
        assert_eq!(as_flag(&json!(true)), Some(true));
        assert_eq!(as_flag(&json!(0)), Some(false));
        assert_eq!(as_flag(&json!("Yes")), Some(true));
        assert_eq!(as_flag(&json!("false")), Some(false));
        assert_eq!(as_flag(&json!("maybe")), None);
    }
}
