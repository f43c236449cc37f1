//! Field-level diff between two JSON snapshots

use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

/// Bookkeeping fields that change on every write and carry no information
const IGNORED_FIELDS: &[&str] = &["updated_at"];

/// Compare two snapshots and return `{field: {"old": .., "new": ..}}` for
/// every top-level field whose value differs. A field missing on one side
/// compares as `null`. Non-object snapshots are compared whole under `"value"`.
pub fn diff(before: &Value, after: &Value) -> Map<String, Value> {
    let mut changes = Map::new();

    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
            for key in keys {
                if IGNORED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let old_value = old.get(key).unwrap_or(&Value::Null);
                let new_value = new.get(key).unwrap_or(&Value::Null);
                if old_value != new_value {
                    changes.insert(
                        key.clone(),
                        json!({ "old": old_value, "new": new_value }),
                    );
                }
            }
        }
        _ => {
            if before != after {
                changes.insert("value".to_string(), json!({ "old": before, "new": after }));
            }
        }
    }

    changes
}
