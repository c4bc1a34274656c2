//! In-memory store implementations.
//!
//! Both stores record every call they receive and can be told to fail a
//! class of operation, which is what the service tests assert against.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{Document, DocumentStore, ObjectStore, Query, StoredDocument};
use crate::error::StoreError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentOp {
    Get,
    Create,
    Update,
    Delete,
    Query,
    Merge,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    calls: Mutex<Vec<DocumentOp>>,
    failing: Mutex<HashSet<DocumentOp>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail with a backend error.
    pub fn fail(&self, op: DocumentOp) {
        lock(&self.failing).insert(op);
    }

    pub fn count(&self, op: DocumentOp) -> usize {
        lock(&self.calls).iter().filter(|c| **c == op).count()
    }

    /// Direct read that bypasses call recording and failure injection.
    pub fn snapshot(&self, collection: &str, id: &str) -> Option<Document> {
        lock(&self.collections)
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }

    fn record(&self, op: DocumentOp) -> Result<(), StoreError> {
        lock(&self.calls).push(op);
        if lock(&self.failing).contains(&op) {
            return Err(StoreError::Backend(format!("injected {:?} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.record(DocumentOp::Get)?;
        Ok(self.snapshot(collection, id))
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError> {
        self.record(DocumentOp::Create)?;
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.record(DocumentOp::Update)?;
        let mut collections = lock(&self.collections);
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.record(DocumentOp::Delete)?;
        if let Some(c) = lock(&self.collections).get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.record(DocumentOp::Query)?;
        let mut docs: Vec<StoredDocument> = lock(&self.collections)
            .get(collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        query.sort(&mut docs);
        Ok(docs)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.record(DocumentOp::Merge)?;
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default()
            .extend(fields);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub body: Vec<u8>,
}

pub struct MemoryObjectStore {
    bucket: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    delete_calls: Mutex<Vec<String>>,
    put_calls: Mutex<Vec<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    failing_puts: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::default(),
            delete_calls: Mutex::default(),
            put_calls: Mutex::default(),
            failing_deletes: Mutex::default(),
            failing_puts: Mutex::default(),
        }
    }

    /// Seed an object without recording a put.
    pub fn insert(&self, key: &str, content_type: &str, body: &[u8]) {
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                body: body.to_vec(),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    /// Every key a delete was attempted for, in arrival order, including
    /// attempts that failed.
    pub fn delete_calls(&self) -> Vec<String> {
        lock(&self.delete_calls).clone()
    }

    pub fn put_calls(&self) -> Vec<String> {
        lock(&self.put_calls).clone()
    }

    pub fn fail_delete(&self, key: &str) {
        lock(&self.failing_deletes).insert(key.to_string());
    }

    pub fn fail_put(&self, key: &str) {
        lock(&self.failing_puts).insert(key.to_string());
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> Result<(), StoreError> {
        lock(&self.put_calls).push(key.to_string());
        if lock(&self.failing_puts).contains(key) {
            return Err(StoreError::Backend(format!("injected put failure for {}", key)));
        }
        lock(&self.objects).insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                body,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.delete_calls).push(key.to_string());
        if lock(&self.failing_deletes).contains(key) {
            return Err(StoreError::Backend(format!("injected delete failure for {}", key)));
        }
        match lock(&self.objects).remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                collection: self.bucket.clone(),
                id: key.to_string(),
            }),
        }
    }
}
