pub mod http;
pub mod model;
pub mod service;

pub use model::{SocialLinks, UpdateSettingsPayload, WebsiteSettings};
pub use service::*;
pub use http::*;
