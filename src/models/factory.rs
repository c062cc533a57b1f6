use tracing::info;

use super::gemini::GeminiModel;
use super::traits::Model;
use crate::app::ModelSettings;
use crate::utils::SiteError;

/// Factory for creating model instances
pub struct ModelFactory;

impl ModelFactory {
    /// Create the configured model for `api_key`
    ///
    /// Fails with a configuration error when the key is empty or malformed;
    /// the agent treats that as "AI client not initialized".
    pub fn create(settings: &ModelSettings, api_key: &str) -> Result<Box<dyn Model>, SiteError> {
        Self::validate_key(api_key)?;
        let model = GeminiModel::new(settings, api_key.trim())?;
        info!(model = %settings.name, "model client initialized");
        Ok(Box::new(model))
    }

    /// A key must be non-empty printable ASCII without whitespace
    pub fn validate_key(api_key: &str) -> Result<(), SiteError> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(SiteError::Config("Gemini API key is not set".to_string()));
        }
        if !key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(SiteError::Config("Invalid Gemini API key format".to_string()));
        }
        Ok(())
    }
}
