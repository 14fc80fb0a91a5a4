//! Best-effort timestamp resolution for heterogeneous records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::fields::field;

/// Epoch values below this magnitude are seconds, at or above it milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y", "%b %d, %Y", "%d %b %Y"];

/// Digit-only strings shorter than this are not epochs ("2024", "20240301").
const MIN_EPOCH_DIGITS: usize = 9;

/// Resolve a timestamp from the first of `keys` that yields one.
pub fn resolve_from_keys(record: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .filter_map(|key| field(record, key))
        .find_map(resolve)
}

/// Resolve a single value: date-like wrapper objects first, then numeric
/// epochs, then date strings.
pub fn resolve(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(_) => from_date_object(value),
        Value::Number(n) => n.as_f64().and_then(from_epoch),
        Value::String(s) => from_text(s),
        _ => None,
    }
}

/// `{"$date": ...}` (extended JSON) and `{"seconds": n, "nanoseconds": n}`
/// (serialized timestamp objects, with or without a leading underscore).
fn from_date_object(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(inner) = field(value, "$date") {
        return match inner {
            Value::Object(_) => field(inner, "$numberLong").and_then(resolve),
            other => resolve(other),
        };
    }

    let seconds = field(value, "seconds")
        .or_else(|| field(value, "_seconds"))
        .and_then(Value::as_i64)?;
    let nanos = field(value, "nanoseconds")
        .or_else(|| field(value, "_nanoseconds"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
}

fn from_epoch(raw: f64) -> Option<DateTime<Utc>> {
    if !raw.is_finite() {
        return None;
    }
    let millis = if raw.abs() < MILLIS_THRESHOLD {
        raw * 1000.0
    } else {
        raw
    };
    DateTime::from_timestamp_millis(millis as i64)
}

fn from_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.len() >= MIN_EPOCH_DIGITS && text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse::<f64>().ok().and_then(from_epoch);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECS: i64 = 1_700_000_000;

    #[test]
    fn test_epoch_seconds_and_millis() {
        let from_secs = resolve(&json!(SECS)).unwrap();
        let from_millis = resolve(&json!(SECS * 1000)).unwrap();
        assert_eq!(from_secs, from_millis);
        assert_eq!(from_secs.timestamp(), SECS);
    }

    #[test]
    fn test_digit_string_is_epoch() {
        assert_eq!(resolve(&json!("1700000000")).unwrap().timestamp(), SECS);
    }

    #[test]
    fn test_short_digit_strings_are_not_epochs() {
        assert!(resolve(&json!("2024")).is_none());
        assert_eq!(
            resolve(&json!("20240301")).unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert!(resolve(&json!("12345678")).is_none());
    }

    #[test]
    fn test_date_like_objects() {
        let mongo = resolve(&json!({"$date": "2024-03-01T10:00:00Z"})).unwrap();
        assert_eq!(mongo.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let long = resolve(&json!({"$date": {"$numberLong": "1700000000000"}})).unwrap();
        assert_eq!(long.timestamp(), SECS);

        let stamp = resolve(&json!({"_seconds": SECS, "_nanoseconds": 0})).unwrap();
        assert_eq!(stamp.timestamp(), SECS);
    }

    #[test]
    fn test_date_strings() {
        assert!(resolve(&json!("2024-03-01T10:00:00.123+02:00")).is_some());
        assert!(resolve(&json!("Fri, 01 Mar 2024 10:00:00 GMT")).is_some());
        assert!(resolve(&json!("2024-03-01 10:00:00")).is_some());
        assert_eq!(
            resolve(&json!("2024-03-01")).unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_unparseable_values() {
        assert!(resolve(&json!("yesterday-ish")).is_none());
        assert!(resolve(&json!("")).is_none());
        assert!(resolve(&json!(true)).is_none());
        assert!(resolve(&json!({"when": "now"})).is_none());
    }

    #[test]
    fn test_resolve_from_keys_skips_unusable_values() {
        let record = json!({"createdAt": "garbage", "timestamp": SECS});
        let resolved = resolve_from_keys(&record, &["createdAt", "timestamp"]).unwrap();
        assert_eq!(resolved.timestamp(), SECS);
    }
}
