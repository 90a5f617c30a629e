use thiserror::Error;

/// Failures talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote answered, but not with the payload we expected.
    #[error("catalog service error: {0}")]
    Service(String),

    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("favorites storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("favorites could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
