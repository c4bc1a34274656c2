use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::ProjectPayload;
use super::service;
use crate::media::Reaper;
use crate::response::{error, json, no_content, parse_body};
use crate::store::{DocumentStore, StoreLayout};

/// GET /projects
pub async fn handle_list_projects(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
) -> Result<Response<Body>, Error> {
    match service::list_projects(docs, layout).await {
        Ok(projects) => json(StatusCode::OK, &projects),
        Err(e) => error(&e),
    }
}

/// GET /projects/{id}
pub async fn handle_get_project(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
    project_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_project(docs, layout, project_id).await {
        Ok(project) => json(StatusCode::OK, &project),
        Err(e) => error(&e),
    }
}

/// POST /admin/projects
pub async fn handle_create_project(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: ProjectPayload = match parse_body(body) {
        Ok(p) => p,
        Err(e) => return error(&e),
    };

    match service::create_project(docs, layout, payload).await {
        Ok(project) => json(StatusCode::CREATED, &project),
        Err(e) => error(&e),
    }
}

/// PUT /admin/projects/{id}
pub async fn handle_update_project(
    docs: &dyn DocumentStore,
    reaper: &Reaper,
    layout: &StoreLayout,
    project_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: ProjectPayload = match parse_body(body) {
        Ok(p) => p,
        Err(e) => return error(&e),
    };

    match service::update_project(docs, reaper, layout, project_id, payload).await {
        Ok(project) => json(StatusCode::OK, &project),
        Err(e) => error(&e),
    }
}

/// DELETE /admin/projects/{id}
pub async fn handle_delete_project(
    docs: &dyn DocumentStore,
    reaper: &Reaper,
    layout: &StoreLayout,
    project_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_project(docs, reaper, layout, project_id).await {
        Ok(()) => no_content(),
        Err(e) => error(&e),
    }
}
