use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::UpdateSettingsPayload;
use super::service;
use crate::response::{error, json, parse_body};
use crate::store::{DocumentStore, StoreLayout};

/// GET /settings/website
pub async fn handle_get_website_settings(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
) -> Result<Response<Body>, Error> {
    match service::get_website_settings(docs, layout).await {
        Ok(settings) => json(StatusCode::OK, &settings),
        Err(e) => error(&e),
    }
}

/// PUT /admin/settings/website
pub async fn handle_update_website_settings(
    docs: &dyn DocumentStore,
    layout: &StoreLayout,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateSettingsPayload = match parse_body(body) {
        Ok(p) => p,
        Err(e) => return error(&e),
    };

    if let Err(e) = service::update_website_settings(docs, layout, payload).await {
        return error(&e);
    }

    match service::get_website_settings(docs, layout).await {
        Ok(settings) => json(StatusCode::OK, &settings),
        Err(e) => error(&e),
    }
}
