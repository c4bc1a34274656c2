use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// An image attached to a project.
///
/// `storage_path` is the canonical object key; `url` is the public download
/// link the admin client keys its payloads by. Records written before
/// `storagePath` existed only carry the url.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectImage {
    #[serde(default)]
    pub id: String,
    #[validate(length(min = 1, message = "image url must not be empty"))]
    pub url: String,
    #[serde(default)]
    pub storage_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ProjectImage {
    pub fn new(url: &str, storage_path: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.to_string(),
            storage_path: storage_path.to_string(),
            thumbnail: None,
            caption: None,
            alt: None,
            width: None,
            height: None,
        }
    }
}

/// Stored form of an image: early records kept only the download url.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredImage {
    Url(String),
    Full(ProjectImage),
}

impl From<StoredImage> for ProjectImage {
    fn from(stored: StoredImage) -> Self {
        match stored {
            StoredImage::Url(url) => ProjectImage {
                id: String::new(),
                url,
                storage_path: String::new(),
                thumbnail: None,
                caption: None,
                alt: None,
                width: None,
                height: None,
            },
            StoredImage::Full(image) => image,
        }
    }
}

/// Deserialize an image list whose entries are either bare urls or full
/// image objects. Use with `#[serde(deserialize_with = ...)]`.
pub fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<ProjectImage>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = Vec::<StoredImage>::deserialize(deserializer)?;
    Ok(stored.into_iter().map(ProjectImage::from).collect())
}
