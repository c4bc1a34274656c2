/// Failure reported by a document or object store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by atom services to the inbound boundary.
///
/// Best-effort side effects (asset reaping, settings touches) never produce
/// one of these; they are logged where they happen.
#[derive(Debug, thiserror::Error)]
pub enum AtomError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AtomResult<T> = Result<T, AtomError>;

impl From<StoreError> for AtomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => AtomError::NotFound { entity: "Record", id },
            other => AtomError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for AtomError {
    fn from(errs: validator::ValidationErrors) -> Self {
        AtomError::Validation(errs.to_string())
    }
}
