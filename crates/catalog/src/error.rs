use coursepath_core::error::CoreError;

/// Errors from loading or querying a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A course or authored graph failed validation.
    #[error("Invalid catalog: {0}")]
    Invalid(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The catalog service returned a non-2xx status code.
    #[error("Catalog API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Request(_) | CatalogError::ApiError { .. } => {
                CoreError::Storage(format!("Catalog unavailable: {err}"))
            }
            other => CoreError::Internal(other.to_string()),
        }
    }
}
