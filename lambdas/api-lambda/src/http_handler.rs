use garden_atoms::{projects, settings};
use garden_shared::AppState;
use lambda_http::http::header::HeaderValue;
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use std::sync::Arc;

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    resp
}

/// Main Lambda handler - routes public reads and admin writes
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!(%method, path, "API invoked");

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let docs = state.documents.as_ref();
    let layout = &state.layout;
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        // --- PUBLIC ---
        // GET /projects - list projects
        (&Method::GET, ["projects"]) => projects::handle_list_projects(docs, layout).await,
        // GET /projects/{id} - get project
        (&Method::GET, ["projects", project_id]) => {
            projects::handle_get_project(docs, layout, project_id).await
        }
        // GET /settings/website - read settings
        (&Method::GET, ["settings", "website"]) => {
            settings::handle_get_website_settings(docs, layout).await
        }

        // --- ADMIN: PROJECTS ---
        // POST /admin/projects - create project
        (&Method::POST, ["admin", "projects"]) => {
            projects::handle_create_project(docs, layout, body).await
        }
        // PUT /admin/projects/{id} - replace project, reaping dropped images
        (&Method::PUT, ["admin", "projects", project_id]) => {
            projects::handle_update_project(docs, &state.reaper, layout, project_id, body).await
        }
        // DELETE /admin/projects/{id} - delete project and its images
        (&Method::DELETE, ["admin", "projects", project_id]) => {
            projects::handle_delete_project(docs, &state.reaper, layout, project_id).await
        }

        // --- ADMIN: SETTINGS ---
        // PUT /admin/settings/website - merge settings
        (&Method::PUT, ["admin", "settings", "website"]) => {
            settings::handle_update_website_settings(docs, layout, body).await
        }
        // POST /admin/settings/website/publish - write public snapshot
        (&Method::POST, ["admin", "settings", "website", "publish"]) => {
            publish_block::publish_website_handler(docs, state.public_objects.as_ref(), layout).await
        }

        _ => not_found(),
    };

    resp.map(with_cors_headers)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
