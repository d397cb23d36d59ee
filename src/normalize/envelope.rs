//! Flattens the upstream response envelope into a list of draw items.
//!
//! Shapes seen across upstream revisions, checked in this order:
//!
//! 1. a bare array of items
//! 2. `{"data": [...]}`
//! 3. `{"list": [...]}`
//! 4. `{"data": {"list": [...]}}`
//!
//! Anything else is treated as a single item. `data` as an array must be
//! checked before `data.list`, since both inspect `data`.

use serde_json::Value;

use crate::types::RawItem;

pub fn unwrap_items(parsed: Value) -> Vec<RawItem> {
    match parsed {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if matches!(map.get("data"), Some(Value::Array(_))) {
                if let Some(Value::Array(items)) = map.remove("data") {
                    return items;
                }
            }
            if matches!(map.get("list"), Some(Value::Array(_))) {
                if let Some(Value::Array(items)) = map.remove("list") {
                    return items;
                }
            }
            let nested = map
                .get_mut("data")
                .and_then(Value::as_object_mut)
                .and_then(|data| data.remove("list"));
            match nested {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    // data.list was present but not an array: put it back so the
                    // fallback wraps the envelope untouched.
                    if let Some(data) = map.get_mut("data").and_then(Value::as_object_mut) {
                        data.insert("list".to_string(), other);
                    }
                    vec![Value::Object(map)]
                }
                None => vec![Value::Object(map)],
            }
        }
        other => vec![other],
    }
}
