//! Narrow contracts over the document store and the object (blob) store.
//!
//! Services only ever see `dyn DocumentStore` / `dyn ObjectStore`; the
//! DynamoDB and S3 backed implementations live in `garden-shared`, the
//! in-memory ones in [`memory`].

pub mod memory;

use async_trait::async_trait;
use chrono::DateTime;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::StoreError;

/// A schemaless record as stored: top-level field name -> JSON value.
pub type Document = Map<String, Value>;

/// A document together with its id within the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub equals: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality filter plus ordering over a single named field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.to_string(),
            equals: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match &self.filter {
            Some(f) => doc.get(&f.field) == Some(&f.equals),
            None => true,
        }
    }

    /// Sort documents in place according to `order_by`.
    ///
    /// Documents missing the field sort after every document that has it,
    /// in both directions.
    pub fn sort(&self, docs: &mut [StoredDocument]) {
        let Some(order) = &self.order_by else {
            return;
        };
        docs.sort_by(|a, b| {
            match (a.data.get(&order.field), b.data.get(&order.field)) {
                (Some(x), Some(y)) => {
                    let ord = compare_values(x, y);
                    match order.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }
}

/// Total-enough ordering over JSON scalars.
///
/// RFC 3339 strings compare as instants: serialized timestamps carry a
/// variable number of fractional digits, so byte order is not time order.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Serialize `value` into a storable document. Only JSON objects qualify.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Serialization(serde_json::Error::custom(
            "document must serialize to a JSON object",
        ))),
    }
}

/// Document store contract: records addressed by collection + id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when the record does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write a full record, replacing any existing record with the same id.
    async fn create(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError>;

    /// Set the given top-level fields on an existing record in one write.
    ///
    /// Returns `StoreError::NotFound` if the record does not exist.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn query(&self, collection: &str, query: &Query)
        -> Result<Vec<StoredDocument>, StoreError>;

    /// Set the given fields, creating the record if it is absent.
    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;
}

/// Object (blob) store contract for a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, for logging.
    fn bucket(&self) -> &str;

    /// Write `body` at `key`, replacing any existing object.
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Fixed collection, document and object names the pipeline reads and
/// writes. Injected into services so the storage layout stays swappable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub projects_collection: String,
    pub settings_collection: String,
    pub website_document: String,
    pub projects_snapshot_key: String,
    pub settings_snapshot_key: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            projects_collection: "projects".to_string(),
            settings_collection: "settings".to_string(),
            website_document: "website".to_string(),
            projects_snapshot_key: "website/projects.json".to_string(),
            settings_snapshot_key: "website/websiteConfig.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            data: value.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn timestamps_sort_by_instant_not_bytes() {
        let mut docs = vec![
            doc("whole", json!({"createdAt": "2024-05-01T10:00:00Z"})),
            doc("fraction", json!({"createdAt": "2024-05-01T10:00:00.500Z"})),
            doc("older", json!({"createdAt": "2024-04-30T23:59:59.999Z"})),
        ];
        Query::new()
            .order_by("createdAt", Direction::Descending)
            .sort(&mut docs);

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["fraction", "whole", "older"]);
    }

    #[test]
    fn missing_sort_field_goes_last() {
        let mut docs = vec![
            doc("none", json!({})),
            doc("a", json!({"n": 1})),
            doc("b", json!({"n": 2})),
        ];
        Query::new().order_by("n", Direction::Ascending).sort(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "none"]);
    }

    #[test]
    fn equality_filter() {
        let q = Query::new().where_eq("status", "active");
        assert!(q.matches(json!({"status": "active"}).as_object().unwrap()));
        assert!(!q.matches(json!({"status": "draft"}).as_object().unwrap()));
        assert!(!q.matches(json!({}).as_object().unwrap()));
    }
}
