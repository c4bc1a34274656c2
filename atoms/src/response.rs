use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

use crate::error::AtomError;

/// JSON response with the CORS header every endpoint carries.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn no_content() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Empty)
        .map_err(Box::new)?)
}

pub fn error_status(err: &AtomError) -> StatusCode {
    match err {
        AtomError::NotFound { .. } => StatusCode::NOT_FOUND,
        AtomError::Validation(_) => StatusCode::BAD_REQUEST,
        AtomError::Store(_) | AtomError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a service failure onto a `{"error": ...}` body.
///
/// Internal failures are logged here with their detail and reported with a
/// generic message.
pub fn error(err: &AtomError) -> Result<Response<Body>, Error> {
    let status = error_status(err);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Request failed");
        "Internal server error".to_string()
    } else {
        err.to_string()
    };
    json(status, &serde_json::json!({ "error": message }))
}

/// Parse a request body, reporting malformed JSON as a validation failure.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AtomError> {
    serde_json::from_slice(body)
        .map_err(|e| AtomError::Validation(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_distinguishes_not_found_from_internal() {
        let not_found = AtomError::NotFound { entity: "Project", id: "p1".into() };
        assert_eq!(error_status(&not_found), StatusCode::NOT_FOUND);

        let invalid = AtomError::Validation("title".into());
        assert_eq!(error_status(&invalid), StatusCode::BAD_REQUEST);

        let store = AtomError::Store(crate::error::StoreError::Backend("boom".into()));
        assert_eq!(error_status(&store), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn malformed_body_is_a_validation_failure() {
        let err = parse_body::<serde_json::Value>(b"{not json").unwrap_err();
        assert!(matches!(err, AtomError::Validation(_)));
    }
}
