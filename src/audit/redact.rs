//! Sensitive-field redaction for audit payloads

use serde_json::Value;
use std::collections::HashSet;

pub const REDACTED: &str = "[REDACTED]";

/// Replace the value of every key found in `sensitive` (compared lowercase),
/// at any depth of objects and arrays.
pub fn redact(value: &mut Value, sensitive: &HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if sensitive.contains(&key.to_ascii_lowercase()) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact(v, sensitive);
                }
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                redact(v, sensitive);
            }
        }
        _ => {}
    }
}

/// Normalise a configured field list into the lookup set used by `redact`
pub fn sensitive_set<I, S>(fields: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| f.as_ref().trim().to_ascii_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}
