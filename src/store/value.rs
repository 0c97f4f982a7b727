//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Integers travel as decimal strings (`integerValue`). Timestamps,
//! references and bytes decode to their string form.

use serde_json::{Map, Value, json};

use super::{Fields, StoreError};

pub(crate) fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect();
    Value::Object(encoded)
}

pub(crate) fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({ "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() } }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub(crate) fn decode_fields(fields: Option<&Map<String, Value>>) -> Result<Fields, StoreError> {
    let Some(fields) = fields else {
        return Ok(Fields::new());
    };
    fields
        .iter()
        .map(|(k, v)| decode(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

pub(crate) fn decode(value: &Value) -> Result<Value, StoreError> {
    let Some(obj) = value.as_object() else {
        return Err(StoreError::Parse(format!("expected typed value object, got {value}")));
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Err(StoreError::Parse("empty typed value".into()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| bad(kind, inner)),
        "integerValue" => decode_integer(inner).ok_or_else(|| bad(kind, inner)),
        "doubleValue" => Ok(inner
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| bad(kind, inner)),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(Value::Null),
            "longitude": inner.get("longitude").cloned().unwrap_or(Value::Null),
        })),
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map_or(&[][..], Vec::as_slice);
            items
                .iter()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => decode_fields(inner.get("fields").and_then(Value::as_object)).map(Value::Object),
        other => Err(StoreError::Parse(format!("unsupported value type {other}"))),
    }
}

fn decode_integer(inner: &Value) -> Option<Value> {
    match inner {
        Value::String(s) => s.parse::<i64>().ok().map(Value::from),
        Value::Number(n) => n.as_i64().map(Value::from),
        _ => None,
    }
}

fn bad(kind: &str, inner: &Value) -> StoreError {
    StoreError::Parse(format!("invalid {kind}: {inner}"))
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
