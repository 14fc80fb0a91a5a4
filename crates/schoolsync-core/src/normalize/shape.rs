//! Extract the record list from an arbitrarily-shaped response envelope.

use serde_json::Value;
use tracing::trace;

use crate::models::RawRecord;

/// Generic collection keys, checked after a source's domain-specific keys.
pub const GENERIC_COLLECTION_KEYS: &[&str] = &["data", "items", "records"];

/// Maximum nesting depth searched for a fallback array.
pub const MAX_SEARCH_DEPTH: usize = 4;

/// Return the records held by `envelope`.
///
/// 1. A bare array is returned as-is.
/// 2. An object holding an array under one of `domain_keys`, then one of the
///    generic keys, returns that array.
/// 3. Otherwise the first array-valued field found depth-first (fields in
///    insertion order, at most `MAX_SEARCH_DEPTH` levels down) is returned.
/// 4. Anything else is "no data": an empty vector, never an error.
pub fn normalize(envelope: &Value, domain_keys: &[&str]) -> Vec<RawRecord> {
    if let Value::Array(items) = envelope {
        return items.clone();
    }

    let Value::Object(map) = envelope else {
        return Vec::new();
    };

    let known = domain_keys
        .iter()
        .chain(GENERIC_COLLECTION_KEYS.iter())
        .find_map(|key| map.get(*key).and_then(Value::as_array));
    if let Some(items) = known {
        return items.clone();
    }

    match find_first_array(envelope, 0) {
        Some(items) => {
            trace!(len = items.len(), "Envelope resolved by nested search");
            items.clone()
        }
        None => Vec::new(),
    }
}

fn find_first_array(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    if depth >= MAX_SEARCH_DEPTH {
        return None;
    }
    let map = value.as_object()?;
    for child in map.values() {
        match child {
            Value::Array(items) => return Some(items),
            Value::Object(_) => {
                if let Some(found) = find_first_array(child, depth + 1) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}
