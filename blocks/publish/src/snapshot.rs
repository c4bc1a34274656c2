use chrono::{DateTime, Utc};
use garden_atoms::projects::{decode_projects, STATUS_ACTIVE};
use garden_atoms::settings::{load_settings_document, mark_published};
use garden_atoms::store::{Direction, Query};
use garden_atoms::{AtomError, AtomResult, DocumentStore, ObjectStore, StoreLayout};
use serde::Serialize;

pub const SNAPSHOT_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    pub projects: usize,
    pub projects_key: String,
    pub settings_key: String,
    pub published_at: DateTime<Utc>,
}

/// Write the public catalog and the site settings to the public bucket.
///
/// Everything is read and encoded before the first write. A failed write
/// stops the run and is returned; an earlier artifact that was already
/// written stays in place.
pub async fn publish_snapshot(
    docs: &dyn DocumentStore,
    public: &dyn ObjectStore,
    layout: &StoreLayout,
) -> AtomResult<PublishReport> {
    let query = Query::new()
        .where_eq("status", STATUS_ACTIVE)
        .order_by("createdAt", Direction::Descending);

    let stored = docs
        .query(&layout.projects_collection, &query)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch active projects");
            AtomError::from(e)
        })?;
    let projects = decode_projects(stored);

    let settings = load_settings_document(docs, layout).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch website settings for publish");
        e
    })?;

    let projects_json = serde_json::to_vec_pretty(&projects)?;
    let settings_json = serde_json::to_vec_pretty(&settings)?;

    write_artifact(public, &layout.projects_snapshot_key, projects_json).await?;
    write_artifact(public, &layout.settings_snapshot_key, settings_json).await?;

    let published_at = Utc::now();
    mark_published(docs, layout, published_at).await;

    tracing::info!(
        bucket = public.bucket(),
        projects = projects.len(),
        "Published website data"
    );

    Ok(PublishReport {
        projects: projects.len(),
        projects_key: layout.projects_snapshot_key.clone(),
        settings_key: layout.settings_snapshot_key.clone(),
        published_at,
    })
}

async fn write_artifact(public: &dyn ObjectStore, key: &str, body: Vec<u8>) -> AtomResult<()> {
    public
        .put(key, SNAPSHOT_CONTENT_TYPE, body)
        .await
        .map_err(|e| {
            tracing::error!(bucket = public.bucket(), path = key, error = %e, "Failed to upload snapshot");
            AtomError::from(e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use garden_atoms::store::memory::{DocumentOp, MemoryDocumentStore, MemoryObjectStore};
    use garden_atoms::store::Document;
    use garden_atoms::StoreError;
    use serde_json::{json, Value};

    async fn seed(docs: &MemoryDocumentStore) {
        let records = [
            ("p1", json!({"title": "Oldest", "status": "active", "createdAt": "2024-01-01T00:00:00Z"})),
            ("p2", json!({"title": "Draft", "status": "inactive", "createdAt": "2024-03-01T00:00:00Z"})),
            ("p3", json!({"title": "Newest", "status": "active", "createdAt": "2024-05-01T00:00:00.25Z",
                          "hasTestimonial": true,
                          "testimonial": {"quote": "Great", "author": "Lu"}})),
            ("p4", json!({"title": "Middle", "status": "active", "createdAt": "2024-05-01T00:00:00Z",
                          "testimonial": null})),
        ];
        for (id, value) in records {
            let data: Document = value.as_object().cloned().unwrap();
            docs.create("projects", id, data).await.unwrap();
        }
        let settings = json!({"title": "Garden", "seo": ["a"], "extraSection": {"k": 1}});
        docs.create("settings", "website", settings.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    fn body_json(store: &MemoryObjectStore, key: &str) -> Value {
        serde_json::from_slice(&store.object(key).unwrap().body).unwrap()
    }

    #[tokio::test]
    async fn publishes_active_projects_newest_first() {
        let docs = MemoryDocumentStore::new();
        let public = MemoryObjectStore::new("public");
        seed(&docs).await;

        let report = publish_snapshot(&docs, &public, &StoreLayout::default()).await.unwrap();
        assert_eq!(report.projects, 3);

        let projects = body_json(&public, "website/projects.json");
        let titles: Vec<_> = projects
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
        assert_eq!(projects[1]["testimonial"], Value::Null);

        let object = public.object("website/projects.json").unwrap();
        assert_eq!(object.content_type, "application/json");
        assert!(String::from_utf8(object.body).unwrap().contains("\n  "));

        let settings = body_json(&public, "website/websiteConfig.json");
        assert_eq!(settings["extraSection"]["k"], 1);

        let stored = docs.snapshot("settings", "website").unwrap();
        assert!(stored.contains_key("publishedAt"));
    }

    #[tokio::test]
    async fn failed_projects_write_stops_before_settings() {
        let docs = MemoryDocumentStore::new();
        let public = MemoryObjectStore::new("public");
        seed(&docs).await;
        public.fail_put("website/projects.json");

        let err = publish_snapshot(&docs, &public, &StoreLayout::default()).await.unwrap_err();
        assert_matches!(err, AtomError::Store(_));
        assert_eq!(public.put_calls(), vec!["website/projects.json"]);
        assert!(!docs.snapshot("settings", "website").unwrap().contains_key("publishedAt"));
    }

    #[tokio::test]
    async fn missing_settings_aborts_before_any_write() {
        let docs = MemoryDocumentStore::new();
        let public = MemoryObjectStore::new("public");

        let err = publish_snapshot(&docs, &public, &StoreLayout::default()).await.unwrap_err();
        assert_matches!(err, AtomError::Store(StoreError::NotFound { .. }));
        assert!(public.put_calls().is_empty());
    }

    #[tokio::test]
    async fn query_failure_is_reported() {
        let docs = MemoryDocumentStore::new();
        let public = MemoryObjectStore::new("public");
        docs.fail(DocumentOp::Query);

        let err = publish_snapshot(&docs, &public, &StoreLayout::default()).await.unwrap_err();
        assert_matches!(err, AtomError::Store(_));
        assert!(public.put_calls().is_empty());
    }

    #[tokio::test]
    async fn empty_catalog_publishes_empty_array() {
        let docs = MemoryDocumentStore::new();
        let public = MemoryObjectStore::new("public");
        docs.create("settings", "website", Document::new()).await.unwrap();

        publish_snapshot(&docs, &public, &StoreLayout::default()).await.unwrap();
        assert_eq!(body_json(&public, "website/projects.json"), json!([]));
    }
}
