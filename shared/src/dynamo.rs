//! DynamoDB-backed [`DocumentStore`] on a single table.
//!
//! Item keys: `PK = <collection>`, `SK = <collection>#<id>`. Document fields
//! are stored as top-level attributes beside the keys.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use garden_atoms::store::{Document, DocumentStore, Query, StoredDocument};
use garden_atoms::StoreError;
use std::collections::HashMap;

use crate::attributes::{from_item, to_attribute, to_item};

const KEY_ATTRIBUTES: [&str; 2] = ["PK", "SK"];

#[derive(Clone)]
pub struct DynamoDocumentStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoDocumentStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn sort_key(collection: &str, id: &str) -> String {
        format!("{}#{}", collection, id)
    }

    /// Full item for `put_item`; the key attributes override any document
    /// fields of the same name.
    fn keyed_item(collection: &str, id: &str, data: &Document) -> HashMap<String, AttributeValue> {
        let mut item = to_item(data);
        item.insert("PK".to_string(), AttributeValue::S(collection.to_string()));
        item.insert("SK".to_string(), AttributeValue::S(Self::sort_key(collection, id)));
        item
    }

    /// Build a `SET` expression over `fields`, using placeholders so field
    /// names never clash with reserved words.
    fn set_expression(
        fields: &Document,
    ) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
        let mut update_expr = vec![];
        let mut expr_names = HashMap::new();
        let mut expr_values = HashMap::new();

        for (i, (name, value)) in fields.iter().enumerate() {
            update_expr.push(format!("#f{i} = :v{i}"));
            expr_names.insert(format!("#f{i}"), name.clone());
            expr_values.insert(format!(":v{i}"), to_attribute(value));
        }

        (format!("SET {}", update_expr.join(", ")), expr_names, expr_values)
    }
}

#[async_trait]
impl DocumentStore for DynamoDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(collection.to_string()))
            .key("SK", AttributeValue::S(Self::sort_key(collection, id)))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB get_item error: {}", e)))?;

        result
            .item()
            .map(|item| from_item(item, &KEY_ATTRIBUTES))
            .transpose()
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::keyed_item(collection, id, &data)))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB put_item error: {}", e)))?;
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let (update_expression, expr_names, expr_values) = Self::set_expression(&fields);

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(collection.to_string()))
            .key("SK", AttributeValue::S(Self::sort_key(collection, id)))
            .update_expression(update_expression)
            .condition_expression("attribute_exists(PK)");

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        match builder.send().await {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })
            }
            Err(e) => Err(StoreError::Backend(format!("DynamoDB update_item error: {}", e))),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(collection.to_string()))
            .key("SK", AttributeValue::S(Self::sort_key(collection, id)))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB delete_item error: {}", e)))?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let prefix = Self::sort_key(collection, "");
        let mut docs = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut req = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(collection.to_string()))
                .expression_attribute_values(":sk_prefix", AttributeValue::S(prefix.clone()))
                .set_exclusive_start_key(start_key.take());

            if let Some(filter) = &query.filter {
                req = req
                    .filter_expression("#f = :v")
                    .expression_attribute_names("#f", filter.field.clone())
                    .expression_attribute_values(":v", to_attribute(&filter.equals));
            }

            let resp = req
                .send()
                .await
                .map_err(|e| StoreError::Backend(format!("DynamoDB query error: {}", e)))?;

            for item in resp.items() {
                let Some(id) = item
                    .get("SK")
                    .and_then(|v| v.as_s().ok())
                    .and_then(|sk| sk.strip_prefix(prefix.as_str()))
                else {
                    continue;
                };
                docs.push(StoredDocument {
                    id: id.to_string(),
                    data: from_item(item, &KEY_ATTRIBUTES)?,
                });
            }

            match resp.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        // DynamoDB cannot order by a non-key attribute.
        query.sort(&mut docs);
        Ok(docs)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let (update_expression, expr_names, expr_values) = Self::set_expression(&fields);

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(collection.to_string()))
            .key("SK", AttributeValue::S(Self::sort_key(collection, id)))
            .update_expression(update_expression);

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB update_item error: {}", e)))?;
        Ok(())
    }
}
