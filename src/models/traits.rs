use async_trait::async_trait;

use super::types::GenerationRequest;
use crate::utils::SiteError;

/// Core trait that all model backends must implement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Model: Send + Sync {
    /// Run one structured generation and return the raw JSON text
    async fn generate(&self, request: &GenerationRequest) -> Result<String, SiteError>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
