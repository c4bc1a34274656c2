use garden_atoms::media::{Reaper, ReaperConfig};
use garden_atoms::{DocumentStore, ObjectStore, StoreLayout};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::dynamo::DynamoDocumentStore;
use crate::s3::S3ObjectStore;

/// Everything a request handler needs, built once per cold start.
pub struct AppState {
    pub config: AppConfig,
    pub layout: StoreLayout,
    pub documents: Arc<dyn DocumentStore>,
    pub public_objects: Arc<dyn ObjectStore>,
    pub reaper: Reaper,
}

impl AppState {
    /// Wire the stores and start the reaper against the assets bucket.
    /// Must be called inside a tokio runtime.
    pub fn new(
        config: AppConfig,
        documents: Arc<dyn DocumentStore>,
        assets: Arc<dyn ObjectStore>,
        public_objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let reaper = Reaper::spawn(
            assets,
            ReaperConfig {
                workers: config.reaper_workers,
                queue_capacity: config.reaper_queue_capacity,
            },
        );

        Self {
            config,
            layout: StoreLayout::default(),
            documents,
            public_objects,
            reaper,
        }
    }

    /// Build the AWS clients from the ambient credentials and region.
    pub async fn from_aws(config: AppConfig) -> Self {
        let aws = aws_config::load_from_env().await;
        let dynamo_client = aws_sdk_dynamodb::Client::new(&aws);
        let s3_client = aws_sdk_s3::Client::new(&aws);

        tracing::info!(
            table = %config.table_name,
            assets_bucket = %config.assets_bucket,
            public_bucket = %config.public_bucket,
            "Connecting stores"
        );

        let documents = Arc::new(DynamoDocumentStore::new(dynamo_client, config.table_name.clone()));
        let assets = Arc::new(S3ObjectStore::new(s3_client.clone(), config.assets_bucket.clone()));
        let public_objects = Arc::new(S3ObjectStore::new(s3_client, config.public_bucket.clone()));

        Self::new(config, documents, assets, public_objects)
    }
}
