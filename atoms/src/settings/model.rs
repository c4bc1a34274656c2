use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Field on the settings document that marks the last change to the set of
/// publicly visible projects.
pub const PROJECT_UPDATED_AT: &str = "projectUpdatedAt";
pub const PUBLISHED_AT: &str = "publishedAt";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SocialLinks {
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub whatsapp: String,
}

/// Singleton website settings document.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSettings {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "websiteURL", default)]
    pub website_url: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub social: SocialLinks,
    #[serde(default)]
    pub seo: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Editable part of the settings document.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsPayload {
    #[validate(length(max = 120, message = "title is too long"))]
    pub title: String,
    #[serde(rename = "websiteURL", default)]
    pub website_url: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 300, message = "excerpt is too long"))]
    pub excerpt: String,
    #[serde(default)]
    pub social: SocialLinks,
    #[serde(default)]
    pub seo: Vec<String>,
}
