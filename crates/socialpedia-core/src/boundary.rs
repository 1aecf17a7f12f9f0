// Store-native value encodings -> plain JSON, right before results leave the process
use crate::models::Record;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Replace extended-JSON identifier and timestamp wrappers with plain strings.
///
/// Exports from document stores wrap object IDs as `{"$oid": "..."}` and
/// timestamps as `{"$date": ...}`. Clients expect plain strings, so both are
/// flattened in place, at any depth. Anything unrecognised is left alone.
pub fn plain_identifiers(record: &mut Record) {
    for (_, value) in record.iter_mut() {
        normalize(value);
    }
}

fn normalize(value: &mut Value) {
    if let Some(plain) = flatten_wrapper(value) {
        *value = Value::String(plain);
        return;
    }

    match value {
        Value::Array(items) => items.iter_mut().for_each(normalize),
        Value::Object(map) => map.iter_mut().for_each(|(_, v)| normalize(v)),
        _ => {}
    }
}

fn flatten_wrapper(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }

    if let Some(oid) = map.get("$oid") {
        return oid.as_str().map(str::to_string);
    }

    map.get("$date").and_then(date_to_string)
}

fn date_to_string(date: &Value) -> Option<String> {
    match date {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_i64().and_then(millis_to_rfc3339),
        // Canonical extended JSON: {"$date": {"$numberLong": "1700000000000"}}
        Value::Object(inner) => number_long(inner).and_then(millis_to_rfc3339),
        _ => None,
    }
}

fn number_long(inner: &Map<String, Value>) -> Option<i64> {
    inner.get("$numberLong")?.as_str()?.parse().ok()
}

fn millis_to_rfc3339(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
