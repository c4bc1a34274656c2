//! Publish block: turns the live catalog into the static files the public
//! site reads.

mod http;
mod snapshot;

pub use http::publish_website_handler;
pub use snapshot::{publish_snapshot, PublishReport, SNAPSHOT_CONTENT_TYPE};
