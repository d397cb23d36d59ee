pub mod classifier;
pub mod envelope;
pub mod resolver;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::{NUMBER_KEYS, PERIOD_KEYS};
use crate::types::{DrawRecord, ItemRejection, RawItem};

pub use classifier::{classify_color, classify_size};
pub use envelope::unwrap_items;
pub use resolver::resolve;

/// Interprets a JSON value as an integer: integers, integral floats, and
/// numeric strings (surrounding whitespace allowed). Everything else is None.
/// Fractional values are rejected rather than truncated: a number of 5.7 is
/// malformed, not draw 5.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Turns one upstream item into a DrawRecord, or says why it was dropped.
/// The item is kept verbatim as the record's raw payload.
pub fn normalize_item(item: RawItem, observed_at: DateTime<Utc>) -> Result<DrawRecord, ItemRejection> {
    let period = resolve(&item, PERIOD_KEYS).ok_or(ItemRejection::MissingPeriod)?;
    let number = resolve(&item, NUMBER_KEYS).ok_or(ItemRejection::MissingNumber)?;
    let period = coerce_int(period).ok_or(ItemRejection::InvalidPeriod)?;
    let winning_number = coerce_int(number).ok_or(ItemRejection::InvalidNumber)?;
    let result_color = classify_color(number);
    let result_size = classify_size(number);

    Ok(DrawRecord {
        period,
        draw_time: observed_at,
        winning_number,
        result_color,
        result_size,
        raw_payload: item,
    })
}
