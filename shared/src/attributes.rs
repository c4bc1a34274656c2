//! JSON <-> DynamoDB `AttributeValue` conversion.
//!
//! Documents are stored as top-level item attributes, so a record's fields
//! map one-to-one onto attributes next to the table keys.

use aws_sdk_dynamodb::types::AttributeValue;
use garden_atoms::store::Document;
use garden_atoms::StoreError;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

pub fn from_attribute(attr: &AttributeValue) -> Result<Value, StoreError> {
    Ok(match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::L(items) => {
            Value::Array(items.iter().map(from_attribute).collect::<Result<_, _>>()?)
        }
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), from_attribute(v)?)))
                .collect::<Result<Map<_, _>, StoreError>>()?,
        ),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(StoreError::Backend(format!(
                "unsupported attribute type: {:?}",
                other
            )))
        }
    })
}

fn parse_number(n: &str) -> Result<Number, StoreError> {
    n.parse::<Number>()
        .map_err(|e| StoreError::Backend(format!("invalid number attribute {:?}: {}", n, e)))
}

/// Attributes for every field of `doc`.
pub fn to_item(doc: &Document) -> HashMap<String, AttributeValue> {
    doc.iter().map(|(k, v)| (k.clone(), to_attribute(v))).collect()
}

/// Decode an item, leaving out the attributes named in `skip` (the keys).
pub fn from_item(
    item: &HashMap<String, AttributeValue>,
    skip: &[&str],
) -> Result<Document, StoreError> {
    item.iter()
        .filter(|(k, _)| !skip.contains(&k.as_str()))
        .map(|(k, v)| Ok((k.clone(), from_attribute(v)?)))
        .collect()
}
