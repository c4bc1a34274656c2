use garden_atoms::response::{error, json};
use garden_atoms::{DocumentStore, ObjectStore, StoreLayout};
use lambda_http::{http::StatusCode, Body, Error, Response};

use crate::snapshot::publish_snapshot;

/// POST /admin/settings/website/publish
pub async fn publish_website_handler(
    docs: &dyn DocumentStore,
    public: &dyn ObjectStore,
    layout: &StoreLayout,
) -> Result<Response<Body>, Error> {
    tracing::info!(bucket = public.bucket(), "publish_website_handler called");

    match publish_snapshot(docs, public, layout).await {
        Ok(report) => json(
            StatusCode::OK,
            &serde_json::json!({
                "status": "success",
                "message": "Website data and configuration published successfully",
                "report": report,
            }),
        ),
        Err(e) => error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_atoms::store::memory::{MemoryDocumentStore, MemoryObjectStore};
    use serde_json::json;

    #[tokio::test]
    async fn publish_writes_both_files() {
        let docs = MemoryDocumentStore::new();
        let public = MemoryObjectStore::new("public");
        let settings = json!({"title": "Garden"});
        docs.create("settings", "website", settings.as_object().cloned().unwrap())
            .await
            .unwrap();

        let resp = publish_website_handler(&docs, &public, &StoreLayout::default())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(public.contains("website/projects.json"));
        assert!(public.contains("website/websiteConfig.json"));
    }

    #[tokio::test]
    async fn missing_settings_is_a_server_error() {
        let docs = MemoryDocumentStore::new();
        let public = MemoryObjectStore::new("public");

        let resp = publish_website_handler(&docs, &public, &StoreLayout::default())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(public.put_calls().is_empty());
    }
}
