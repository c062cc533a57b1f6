use thiserror::Error;

/// Main error type for sitewright
#[derive(Error, Debug)]
pub enum SiteError {
    /// Missing or invalid credentials / settings. Blocks a pass from starting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure or non-success response from the repository API.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote answered with something we cannot interpret.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The remote rejected a write because the version token was stale or missing.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Model error: {0}")]
    Model(String),

    /// A request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SiteError {
    /// Short category label used in summaries and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            SiteError::Config(_) => "config",
            SiteError::Network(_) => "network",
            SiteError::Protocol(_) => "protocol",
            SiteError::Conflict(_) => "conflict",
            SiteError::Model(_) => "model",
            SiteError::Serialization(_) => "serialization",
        }
    }
}

impl From<reqwest::Error> for SiteError {
    fn from(err: reqwest::Error) -> Self {
        SiteError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SiteError {
    fn from(err: serde_json::Error) -> Self {
        SiteError::Serialization(err.to_string())
    }
}
