use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::media::model::deserialize_images;
use crate::media::ProjectImage;
use crate::store::StoredDocument;

/// The one status value that makes a project publicly visible.
pub const STATUS_ACTIVE: &str = "active";

/// Status given to projects created without one.
pub const STATUS_INACTIVE: &str = "inactive";

/// Project domain model - a portfolio entry with its images
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default, deserialize_with = "deserialize_images")]
    pub images: Vec<ProjectImage>,
    #[serde(default)]
    pub has_testimonial: bool,
    #[serde(default)]
    pub testimonial: Option<Testimonial>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    /// Decode a stored record. The document key is authoritative for `id`.
    pub fn from_stored(stored: StoredDocument) -> Result<Self, serde_json::Error> {
        let mut project: Project = serde_json::from_value(serde_json::Value::Object(stored.data))?;
        project.id = stored.id;
        Ok(project)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[validate(length(min = 1, message = "testimonial quote must not be empty"))]
    pub quote: String,
    #[validate(length(min = 1, message = "testimonial author must not be empty"))]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Body of create and update requests.
///
/// Update replaces `title`, `images` and the cover image outright. The
/// optional fields left out of an update mean "keep what is stored"; the
/// admin client does not send all of them on every edit.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    /// Client-chosen id, honored on create only.
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_images")]
    #[validate(nested)]
    pub images: Vec<ProjectImage>,
    #[serde(default)]
    pub has_testimonial: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub testimonial: Option<Testimonial>,
}

impl ProjectPayload {
    /// Explicit cover image, else the first image, else empty.
    pub fn effective_cover_image(&self) -> String {
        match self.cover_image.as_deref() {
            Some(cover) if !cover.is_empty() => cover.to_string(),
            _ => self
                .images
                .first()
                .map(|img| img.url.clone())
                .unwrap_or_default(),
        }
    }

    /// Testimonial to store, if the payload says anything about it.
    ///
    /// `None` leaves the stored pair untouched; `Some((false, None))` clears it.
    pub fn testimonial_fields(&self) -> Option<(bool, Option<Testimonial>)> {
        match self.has_testimonial {
            Some(true) => Some((true, self.testimonial.clone())),
            Some(false) => Some((false, None)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_record_decodes_with_defaults() {
        let stored = StoredDocument {
            id: "p1".to_string(),
            data: json!({
                "title": "Old terrace",
                "images": [{"url": "https://host/v0/b/bkt/o/a.webp"}],
                "createdAt": "2024-01-02T03:04:05Z"
            })
            .as_object()
            .cloned()
            .unwrap(),
        };
        let project = Project::from_stored(stored).unwrap();
        assert_eq!(project.id, "p1");
        assert_eq!(project.images[0].storage_path, "");
        assert!(project.testimonial.is_none());
        assert!(!project.is_active());
    }

    #[test]
    fn record_with_url_only_images_decodes() {
        let stored = StoredDocument {
            id: "old".to_string(),
            data: json!({
                "title": "Courtyard",
                "status": "active",
                "images": ["https://h/v0/b/x/o/a.webp", "https://h/v0/b/x/o/b.webp"]
            })
            .as_object()
            .cloned()
            .unwrap(),
        };
        let project = Project::from_stored(stored).unwrap();
        assert_eq!(project.images.len(), 2);
        assert_eq!(project.images[1].url, "https://h/v0/b/x/o/b.webp");
        assert!(project.images.iter().all(|img| img.storage_path.is_empty()));
    }

    #[test]
    fn omitted_optional_fields_stay_unset() {
        let payload: ProjectPayload = serde_json::from_value(json!({"title": "Patio"})).unwrap();
        assert!(payload.tags.is_none());
        assert!(payload.description.is_none());
        assert!(payload.status.is_none());
    }

    #[test]
    fn cover_image_falls_back_to_first_image() {
        let mut payload: ProjectPayload = serde_json::from_value(json!({
            "title": "Patio",
            "images": [{"url": "u1"}, {"url": "u2"}]
        }))
        .unwrap();
        assert_eq!(payload.effective_cover_image(), "u1");

        payload.cover_image = Some("u2".to_string());
        assert_eq!(payload.effective_cover_image(), "u2");

        payload.cover_image = Some(String::new());
        payload.images.clear();
        assert_eq!(payload.effective_cover_image(), "");
    }

    #[test]
    fn nested_image_validation() {
        let payload: ProjectPayload = serde_json::from_value(json!({
            "title": "Patio",
            "images": [{"url": ""}]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn project_without_testimonial_serializes_null() {
        let project: Project = serde_json::from_value(json!({"id": "p1"})).unwrap();
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["testimonial"], serde_json::Value::Null);
        assert_eq!(value["hasTestimonial"], json!(false));
    }
}
