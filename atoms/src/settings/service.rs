use chrono::{DateTime, Utc};
use serde_json::json;
use validator::Validate;

use super::model::{UpdateSettingsPayload, WebsiteSettings, PROJECT_UPDATED_AT, PUBLISHED_AT};
use crate::error::{AtomError, AtomResult, StoreError};
use crate::store::{to_document, Document, DocumentStore, StoreLayout};

/// Raw settings document, as published.
///
/// The admin client stores more sections than [`WebsiteSettings`] models,
/// so the publish path works on the untyped document. A missing document is
/// a store failure rather than a client error, since publishing needs it.
pub async fn load_settings_document(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
) -> AtomResult<Document> {
    docs.get(&layout.settings_collection, &layout.website_document)
        .await?
        .ok_or_else(|| {
            AtomError::Store(StoreError::NotFound {
                collection: layout.settings_collection.clone(),
                id: layout.website_document.clone(),
            })
        })
}

/// Typed settings; an absent document reads as defaults.
pub async fn get_website_settings(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
) -> AtomResult<WebsiteSettings> {
    match docs
        .get(&layout.settings_collection, &layout.website_document)
        .await?
    {
        Some(doc) => Ok(serde_json::from_value(serde_json::Value::Object(doc))?),
        None => Ok(WebsiteSettings::default()),
    }
}

/// Merge the editable settings fields, creating the document if needed.
pub async fn update_website_settings(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
    payload: UpdateSettingsPayload,
) -> AtomResult<()> {
    payload.validate()?;

    let mut fields = to_document(&payload)?;
    fields.insert("updatedAt".to_string(), json!(Utc::now()));

    docs.merge(&layout.settings_collection, &layout.website_document, fields)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to update website settings");
            AtomError::from(e)
        })
}

/// Record that the set of public projects changed.
///
/// Advisory marker only: a failed write is logged and swallowed.
pub async fn touch_project_updated_at(docs: &dyn DocumentStore, layout: &StoreLayout) {
    mark(docs, layout, PROJECT_UPDATED_AT, Utc::now()).await;
}

/// Record a successful publish. Best-effort, like the touch above.
pub async fn mark_published(docs: &dyn DocumentStore, layout: &StoreLayout, at: DateTime<Utc>) {
    mark(docs, layout, PUBLISHED_AT, at).await;
}

async fn mark(docs: &dyn DocumentStore, layout: &StoreLayout, field: &str, at: DateTime<Utc>) {
    let mut fields = Document::new();
    fields.insert(field.to_string(), json!(at));

    if let Err(e) = docs
        .merge(&layout.settings_collection, &layout.website_document, fields)
        .await
    {
        tracing::warn!(field, error = %e, "Failed to update settings marker");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{DocumentOp, MemoryDocumentStore};
    use assert_matches::assert_matches;

    fn payload(title: &str) -> UpdateSettingsPayload {
        serde_json::from_value(json!({
            "title": title,
            "websiteURL": "https://garden.example",
            "social": {"instagram": "@garden"},
            "seo": ["gardens", "mallorca"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn missing_settings_read_as_defaults() {
        let docs = MemoryDocumentStore::new();
        let settings = get_website_settings(&docs, &StoreLayout::default()).await.unwrap();
        assert_eq!(settings, WebsiteSettings::default());
    }

    #[tokio::test]
    async fn update_merges_and_keeps_markers() {
        let docs = MemoryDocumentStore::new();
        let layout = StoreLayout::default();
        touch_project_updated_at(&docs, &layout).await;

        update_website_settings(&docs, &layout, payload("Garden")).await.unwrap();

        let settings = get_website_settings(&docs, &layout).await.unwrap();
        assert_eq!(settings.title, "Garden");
        assert_eq!(settings.website_url, "https://garden.example");
        assert_eq!(settings.social.instagram, "@garden");
        assert_eq!(settings.seo, vec!["gardens", "mallorca"]);
        assert!(settings.updated_at.is_some());
        assert!(settings.project_updated_at.is_some());
    }

    #[tokio::test]
    async fn overlong_title_is_rejected_without_write() {
        let docs = MemoryDocumentStore::new();
        let err = update_website_settings(&docs, &StoreLayout::default(), payload(&"x".repeat(200)))
            .await
            .unwrap_err();
        assert_matches!(err, AtomError::Validation(_));
        assert_eq!(docs.count(DocumentOp::Merge), 0);
    }

    #[tokio::test]
    async fn touch_creates_document_and_swallows_failure() {
        let docs = MemoryDocumentStore::new();
        let layout = StoreLayout::default();

        touch_project_updated_at(&docs, &layout).await;
        let doc = docs.snapshot("settings", "website").unwrap();
        assert!(doc.contains_key(PROJECT_UPDATED_AT));

        docs.fail(DocumentOp::Merge);
        touch_project_updated_at(&docs, &layout).await;
        assert_eq!(docs.count(DocumentOp::Merge), 2);
    }

    #[tokio::test]
    async fn load_document_reports_missing_settings() {
        let docs = MemoryDocumentStore::new();
        let err = load_settings_document(&docs, &StoreLayout::default()).await.unwrap_err();
        assert_matches!(err, AtomError::Store(StoreError::NotFound { .. }));
    }
}
