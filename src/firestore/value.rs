//! Conversion between JSON values and Firestore's wire values.
//!
//! Firestore only knows signed 64-bit integers, so JSON numbers that fit in an
//! `i64` become `integerValue` and everything else becomes `doubleValue`.

use std::collections::HashMap;

use firestore_grpc::v1::{value::ValueType, ArrayValue, MapValue, Value};
use serde_json::{Map, Number};

pub(crate) fn to_firestore_fields(
    fields: &Map<String, serde_json::Value>,
) -> HashMap<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), to_firestore_value(value)))
        .collect()
}

pub(crate) fn to_firestore_value(value: &serde_json::Value) -> Value {
    let value_type = match value {
        serde_json::Value::Null => ValueType::NullValue(0),
        serde_json::Value::Bool(b) => ValueType::BooleanValue(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => ValueType::IntegerValue(i),
            // `as_f64` only fails for arbitrary precision numbers, which we
            // don't enable.
            None => ValueType::DoubleValue(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => ValueType::StringValue(s.clone()),
        serde_json::Value::Array(items) => ValueType::ArrayValue(ArrayValue {
            values: items.iter().map(to_firestore_value).collect(),
        }),
        serde_json::Value::Object(fields) => ValueType::MapValue(MapValue {
            fields: to_firestore_fields(fields),
        }),
    };

    Value {
        value_type: Some(value_type),
    }
}

pub(crate) fn from_firestore_fields(
    fields: HashMap<String, Value>,
) -> Map<String, serde_json::Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key, from_firestore_value(value)))
        .collect()
}

/// Timestamps become `{ "seconds", "nanos" }` objects and geo points become
/// `{ "latitude", "longitude" }` objects. Non-finite doubles have no JSON
/// representation and turn into `null`.
pub(crate) fn from_firestore_value(value: Value) -> serde_json::Value {
    let Some(value_type) = value.value_type else {
        return serde_json::Value::Null;
    };

    match value_type {
        ValueType::NullValue(_) => serde_json::Value::Null,
        ValueType::BooleanValue(b) => serde_json::Value::Bool(b),
        ValueType::IntegerValue(i) => serde_json::Value::Number(i.into()),
        ValueType::DoubleValue(f) => Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueType::TimestampValue(ts) => serde_json::json!({
            "seconds": ts.seconds,
            "nanos": ts.nanos,
        }),
        ValueType::StringValue(s) => serde_json::Value::String(s),
        ValueType::BytesValue(bytes) => {
            serde_json::Value::Array(bytes.into_iter().map(serde_json::Value::from).collect())
        }
        ValueType::ReferenceValue(reference) => serde_json::Value::String(reference),
        ValueType::GeoPointValue(point) => serde_json::json!({
            "latitude": point.latitude,
            "longitude": point.longitude,
        }),
        ValueType::ArrayValue(array) => serde_json::Value::Array(
            array.values.into_iter().map(from_firestore_value).collect(),
        ),
        ValueType::MapValue(map) => serde_json::Value::Object(from_firestore_fields(map.fields)),
    }
}
