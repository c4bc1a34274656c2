use chrono::Utc;
use serde_json::json;
use validator::Validate;

use super::model::{Project, ProjectPayload, STATUS_ACTIVE, STATUS_INACTIVE};
use crate::error::{AtomError, AtomResult};
use crate::media::{orphaned_images, Reaper};
use crate::settings::touch_project_updated_at;
use crate::store::{to_document, Direction, Document, DocumentStore, Query, StoreLayout, StoredDocument};

/// Whether a change between two statuses can alter the public catalog.
///
/// True when either side is active, so both promotion and demotion count.
pub fn affects_public_catalog(old_status: Option<&str>, new_status: Option<&str>) -> bool {
    old_status == Some(STATUS_ACTIVE) || new_status == Some(STATUS_ACTIVE)
}

fn validate_payload(payload: &ProjectPayload) -> AtomResult<()> {
    payload.validate()?;
    if payload.has_testimonial == Some(true) && payload.testimonial.is_none() {
        return Err(AtomError::Validation(
            "hasTestimonial is set but no testimonial was given".to_string(),
        ));
    }
    Ok(())
}

fn project_not_found(id: &str) -> AtomError {
    AtomError::NotFound {
        entity: "Project",
        id: id.to_string(),
    }
}

/// Load one project; `NotFound` if there is no record.
pub async fn get_project(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
    project_id: &str,
) -> AtomResult<Project> {
    let data = docs
        .get(&layout.projects_collection, project_id)
        .await?
        .ok_or_else(|| project_not_found(project_id))?;

    Ok(Project::from_stored(StoredDocument {
        id: project_id.to_string(),
        data,
    })?)
}

/// All projects, newest first. Records that fail to decode are skipped.
pub async fn list_projects(docs: &dyn DocumentStore, layout: &StoreLayout) -> AtomResult<Vec<Project>> {
    let query = Query::new().order_by("createdAt", Direction::Descending);
    let stored = docs.query(&layout.projects_collection, &query).await?;
    Ok(decode_projects(stored))
}

/// Decode query results, dropping (and logging) records that do not parse.
pub fn decode_projects(stored: Vec<StoredDocument>) -> Vec<Project> {
    stored
        .into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match Project::from_stored(doc) {
                Ok(project) => Some(project),
                Err(e) => {
                    tracing::warn!(project_id = %id, error = %e, "Failed to parse project, skipping");
                    None
                }
            }
        })
        .collect()
}

/// Create a project, honoring a client supplied id when present.
pub async fn create_project(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
    payload: ProjectPayload,
) -> AtomResult<Project> {
    validate_payload(&payload)?;

    let now = Utc::now();
    let cover_image = payload.effective_cover_image();
    let (has_testimonial, testimonial) = payload.testimonial_fields().unwrap_or((false, None));
    let id = match payload.id.as_deref() {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let project = Project {
        id,
        title: payload.title,
        description: payload.description.unwrap_or_default(),
        location: payload.location.unwrap_or_default(),
        category: payload.category.unwrap_or_default(),
        tags: payload.tags.unwrap_or_default(),
        status: payload.status.unwrap_or_else(|| STATUS_INACTIVE.to_string()),
        cover_image,
        images: payload.images,
        has_testimonial,
        testimonial,
        created_at: now,
        updated_at: now,
    };

    docs.create(&layout.projects_collection, &project.id, to_document(&project)?)
        .await
        .map_err(|e| {
            tracing::error!(project_id = %project.id, error = %e, "Failed to save project");
            AtomError::from(e)
        })?;

    tracing::info!(project_id = %project.id, status = %project.status, "Project created");

    if project.is_active() {
        touch_project_updated_at(docs, layout).await;
    }

    Ok(project)
}

/// Replace a project's editable fields, reaping images the edit dropped.
///
/// Orphaned images are queued for deletion before the record is written and
/// stay queued even if the write fails; the write alone decides the result.
pub async fn update_project(
    docs: &dyn DocumentStore,
    reaper: &Reaper,
    layout: &StoreLayout,
    project_id: &str,
    payload: ProjectPayload,
) -> AtomResult<Project> {
    if project_id.trim().is_empty() {
        return Err(AtomError::Validation("Missing project ID".to_string()));
    }
    validate_payload(&payload)?;

    let old = get_project(docs, layout, project_id).await?;

    let orphans = orphaned_images(&old.images, &payload.images);
    tracing::info!(
        project_id,
        old_count = old.images.len(),
        new_count = payload.images.len(),
        orphaned = orphans.len(),
        "Reconciling project images"
    );
    for image in &orphans {
        reaper.reap_image(project_id, image);
    }

    let now = Utc::now();
    let cover_image = payload.effective_cover_image();
    let testimonial = payload.testimonial_fields();
    let new_status = payload.status.clone();

    let mut fields = Document::new();
    fields.insert("title".to_string(), json!(payload.title));
    if let Some(description) = &payload.description {
        fields.insert("description".to_string(), json!(description));
    }
    if let Some(location) = &payload.location {
        fields.insert("location".to_string(), json!(location));
    }
    if let Some(category) = &payload.category {
        fields.insert("category".to_string(), json!(category));
    }
    if let Some(tags) = &payload.tags {
        fields.insert("tags".to_string(), json!(tags));
    }
    fields.insert("images".to_string(), serde_json::to_value(&payload.images)?);
    fields.insert("coverImage".to_string(), json!(cover_image));
    fields.insert("updatedAt".to_string(), json!(now));
    if let Some(status) = &new_status {
        fields.insert("status".to_string(), json!(status));
    }
    if let Some((has, testimonial)) = &testimonial {
        fields.insert("hasTestimonial".to_string(), json!(has));
        fields.insert("testimonial".to_string(), serde_json::to_value(testimonial)?);
    }

    docs.update_fields(&layout.projects_collection, project_id, fields)
        .await
        .map_err(|e| {
            tracing::error!(project_id, error = %e, "Failed to update project");
            AtomError::from(e)
        })?;

    tracing::info!(project_id, "Project updated");

    if affects_public_catalog(Some(old.status.as_str()), new_status.as_deref()) {
        touch_project_updated_at(docs, layout).await;
    }

    let (has_testimonial, testimonial) =
        testimonial.unwrap_or((old.has_testimonial, old.testimonial));
    Ok(Project {
        id: project_id.to_string(),
        title: payload.title,
        description: payload.description.unwrap_or(old.description),
        location: payload.location.unwrap_or(old.location),
        category: payload.category.unwrap_or(old.category),
        tags: payload.tags.unwrap_or(old.tags),
        status: new_status.unwrap_or(old.status),
        cover_image,
        images: payload.images,
        has_testimonial,
        testimonial,
        created_at: old.created_at,
        updated_at: now,
    })
}

/// Delete a project record and reap every image it owns.
///
/// Reaps are queued before the metadata delete is awaited; only the delete
/// decides the result.
pub async fn delete_project(
    docs: &dyn DocumentStore,
    reaper: &Reaper,
    layout: &StoreLayout,
    project_id: &str,
) -> AtomResult<()> {
    if project_id.trim().is_empty() {
        return Err(AtomError::Validation("Missing project ID".to_string()));
    }

    let project = get_project(docs, layout, project_id).await?;

    for image in &project.images {
        reaper.reap_image(project_id, image);
    }

    docs.delete(&layout.projects_collection, project_id)
        .await
        .map_err(|e| {
            tracing::error!(project_id, error = %e, "Failed to delete project");
            AtomError::from(e)
        })?;

    tracing::info!(project_id, images = project.images.len(), "Project deleted");

    if project.is_active() {
        touch_project_updated_at(docs, layout).await;
    }

    Ok(())
}
