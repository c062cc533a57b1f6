use std::sync::Arc;
use tracing::warn;

use crate::app::{Config, Credentials};
use crate::models::{Model, ModelFactory};
use crate::repo::{GitHubRepository, RepoReader, RepoWriter};
use crate::utils::SiteError;

/// Clients a pass runs against, cloned out of the workspace at the start of the pass
#[derive(Clone)]
pub struct Backends {
    pub reader: Arc<dyn RepoReader>,
    pub writer: Arc<dyn RepoWriter>,
    pub model: Arc<dyn Model>,
}

/// Everything the agent needs from the outside world: settings, secrets and the
/// clients built from them. Built once at startup and replaced wholesale whenever
/// the credentials or settings change.
pub struct Workspace {
    config: Config,
    credentials: Credentials,
    reader: Option<Arc<dyn RepoReader>>,
    writer: Option<Arc<dyn RepoWriter>>,
    model: Option<Arc<dyn Model>>,
    /// Why the model client could not be built, if it could not
    model_error: Option<String>,
}

impl Workspace {
    /// Build real GitHub and Gemini clients from settings and credentials
    ///
    /// Never fails: problems are recorded and reported by [`Workspace::backends`]
    /// when a pass tries to start.
    pub fn connect(config: Config, credentials: Credentials) -> Self {
        let (reader, writer) = if credentials.repo_token.trim().is_empty() {
            (None, None)
        } else {
            match GitHubRepository::new(config.repository.clone(), &credentials.repo_token) {
                Ok(repo) => {
                    let repo = Arc::new(repo);
                    (
                        Some(repo.clone() as Arc<dyn RepoReader>),
                        Some(repo as Arc<dyn RepoWriter>),
                    )
                }
                Err(e) => {
                    warn!("repository client not initialized: {}", e);
                    (None, None)
                }
            }
        };

        let (model, model_error) = if credentials.ai_key.trim().is_empty() {
            (None, None)
        } else {
            match ModelFactory::create(&config.model, &credentials.ai_key) {
                Ok(model) => (Some(Arc::<dyn Model>::from(model)), None),
                Err(e) => {
                    warn!("model client not initialized: {}", e);
                    (None, Some(e.to_string()))
                }
            }
        };

        Self {
            config,
            credentials,
            reader,
            writer,
            model,
            model_error,
        }
    }

    /// Assemble a workspace from ready-made clients
    pub fn from_parts(
        config: Config,
        credentials: Credentials,
        reader: Arc<dyn RepoReader>,
        writer: Arc<dyn RepoWriter>,
        model: Arc<dyn Model>,
    ) -> Self {
        Self {
            config,
            credentials,
            reader: Some(reader),
            writer: Some(writer),
            model: Some(model),
            model_error: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Name of the initialized model, if any
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    pub fn model_error(&self) -> Option<&str> {
        self.model_error.as_deref()
    }

    /// Check every precondition of a pass and hand out the clients
    pub fn backends(&self) -> Result<Backends, SiteError> {
        if !self.credentials.is_complete() {
            return Err(SiteError::Config(
                "Please provide both a GitHub token and a Gemini API key.".to_string(),
            ));
        }
        if !self.config.repository.is_configured() {
            return Err(SiteError::Config(
                "Repository owner and name are not configured.".to_string(),
            ));
        }
        let model = match &self.model {
            Some(model) => model.clone(),
            None => {
                let detail = self
                    .model_error
                    .as_deref()
                    .map(|e| format!(" ({})", e))
                    .unwrap_or_default();
                return Err(SiteError::Config(format!(
                    "Gemini AI not initialized. Check your API key.{}",
                    detail
                )));
            }
        };
        match (&self.reader, &self.writer) {
            (Some(reader), Some(writer)) => Ok(Backends {
                reader: reader.clone(),
                writer: writer.clone(),
                model,
            }),
            _ => Err(SiteError::Config(
                "GitHub client not initialized. Check your token.".to_string(),
            )),
        }
    }
}
