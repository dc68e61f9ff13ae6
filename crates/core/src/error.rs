#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with key {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Could not generate a unique {what} after {attempts} attempts")]
    GenerationExhausted { what: &'static str, attempts: u32 },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing property looked up by `key` (id or slug).
    pub fn property_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "Property",
            key: key.to_string(),
        }
    }
}
