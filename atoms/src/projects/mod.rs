// Re-export model types and service functions
pub mod http;
pub mod model;
pub mod service;

pub use model::{Project, ProjectPayload, Testimonial, STATUS_ACTIVE, STATUS_INACTIVE};
pub use service::*;
pub use http::*;
