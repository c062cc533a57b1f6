use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::state::AgentState;

/// Whether a write replaced an existing file or added a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Created,
    Updated,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAction::Created => f.write_str("created"),
            FileAction::Updated => f.write_str("updated"),
        }
    }
}

/// A file committed during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFile {
    pub path: String,
    pub action: FileAction,
}

/// Progress notifications emitted by the agent, in order, for any front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    StateChanged(AgentState),
    Fetching,
    Fetched { files: usize },
    /// The repository listing was cut short; the model sees a partial site
    Truncated,
    Generating,
    /// The model proposed a file that may not be written
    FileSkipped { name: String, reason: String },
    Committing { files: usize },
    FileWritten(WrittenFile),
    NoChanges { reason: String },
    Completed { files: usize },
    /// Front-ends showing the site should reload this URL
    PreviewReload { url: String },
    Failed { error: String },
}

impl AgentEvent {
    /// Lifecycle chatter that front-ends usually hide
    pub fn is_state_change(&self) -> bool {
        matches!(self, AgentEvent::StateChanged(_))
    }
}

impl fmt::Display for AgentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentEvent::StateChanged(state) => write!(f, "State: {}", state),
            AgentEvent::Fetching => write!(f, "Fetching current website files from GitHub..."),
            AgentEvent::Fetched { files } => write!(f, "Loaded {} file(s) from the repository.", files),
            AgentEvent::Truncated => write!(
                f,
                "Warning: Repository is too large, some files may have been omitted from context."
            ),
            AgentEvent::Generating => write!(f, "Analyzing request and generating code..."),
            AgentEvent::FileSkipped { name, reason } => write!(f, "Skipped: {} ({})", name, reason),
            AgentEvent::Committing { files } => write!(f, "Committing {} file(s) to GitHub...", files),
            AgentEvent::FileWritten(file) => write!(f, "Pushed: {} ({})", file.path, file.action),
            AgentEvent::NoChanges { .. } => write!(
                f,
                "AI did not suggest any file changes. Try rephrasing your request."
            ),
            AgentEvent::Completed { .. } => {
                write!(f, "Updates pushed successfully! Refreshing preview...")
            }
            AgentEvent::PreviewReload { url } => write!(f, "Preview: {}", url),
            AgentEvent::Failed { error } => write!(f, "An error occurred: {}", error),
        }
    }
}

/// Receives every event of every pass
pub type EventCallback = Arc<dyn Fn(&AgentEvent) + Send + Sync>;
