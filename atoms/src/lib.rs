//! Domain atoms for the garden portfolio backend.
//!
//! Every atom takes its store handles as arguments instead of reaching for
//! global clients, so the same logic runs against DynamoDB/S3 in the lambda
//! and against the in-memory stores in tests.

pub mod error;
pub mod media;
pub mod projects;
pub mod response;
pub mod settings;
pub mod store;

pub use error::{AtomError, AtomResult, StoreError};
pub use store::{DocumentStore, ObjectStore, StoreLayout};
