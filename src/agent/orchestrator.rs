use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::events::{AgentEvent, EventCallback, FileAction, WrittenFile};
use super::prompt::build_prompt;
use super::state::AgentState;
use super::validate::validate_response;
use crate::app::{Backends, Workspace};
use crate::models::GenerationRequest;
use crate::utils::SiteError;

/// How a call to [`Agent::handle_request`] ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every proposed file was written
    Completed { written: Vec<WrittenFile> },
    /// The model proposed nothing writable
    NoChanges { reason: String },
    /// The pass stopped; `written` lists what was committed before the error
    Failed {
        error: String,
        kind: String,
        written: Vec<WrittenFile>,
    },
    /// Another pass was in flight, nothing happened
    Busy,
    /// Blank prompt, nothing happened
    Ignored,
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }

    pub fn written(&self) -> &[WrittenFile] {
        match self {
            RunOutcome::Completed { written } | RunOutcome::Failed { written, .. } => written,
            _ => &[],
        }
    }
}

/// Single-pass website editing agent
///
/// One request at a time: read the site, ask the model, write what it proposes.
/// Progress is reported through the event callback.
pub struct Agent {
    workspace: RwLock<Arc<Workspace>>,
    state: Mutex<AgentState>,
    events: EventCallback,
}

/// Marks the pass finished on every exit path, including a dropped future
struct PassGuard<'a> {
    agent: &'a Agent,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.agent.state.lock();
        if state.is_busy() {
            *state = AgentState::Failed;
        }
    }
}

impl Agent {
    pub fn new(workspace: Workspace, events: EventCallback) -> Self {
        Self {
            workspace: RwLock::new(Arc::new(workspace)),
            state: Mutex::new(AgentState::Idle),
            events,
        }
    }

    /// Replace settings, credentials and clients. A running pass keeps the old ones.
    pub fn reconfigure(&self, workspace: Workspace) {
        *self.workspace.write() = Arc::new(workspace);
        debug!("agent workspace replaced");
    }

    pub fn workspace(&self) -> Arc<Workspace> {
        self.workspace.read().clone()
    }

    pub fn state(&self) -> AgentState {
        *self.state.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    fn emit(&self, event: AgentEvent) {
        (self.events)(&event);
    }

    fn transition(&self, next: AgentState) {
        *self.state.lock() = next;
        self.emit(AgentEvent::StateChanged(next));
    }

    /// Run one full pass for `prompt`
    pub async fn handle_request(&self, prompt: &str) -> RunOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return RunOutcome::Ignored;
        }

        // Check-and-set under one lock so two callers can never both start
        let workspace = self.workspace();
        let started = {
            let mut state = self.state.lock();
            if state.is_busy() {
                let current = *state;
                debug!(state = %current, "request refused, a pass is running");
                return RunOutcome::Busy;
            }
            let started = workspace.backends();
            *state = if started.is_ok() {
                AgentState::Reading
            } else {
                AgentState::Failed
            };
            started
        };

        let backends = match started {
            Ok(backends) => backends,
            Err(e) => {
                warn!("pass not started: {}", e);
                self.emit(AgentEvent::StateChanged(AgentState::Failed));
                return self.report_failure(e, Vec::new());
            }
        };

        let _guard = PassGuard { agent: self };
        self.emit(AgentEvent::StateChanged(AgentState::Reading));
        info!(prompt_len = prompt.len(), "pass started");
        self.run_pass(&workspace, backends, prompt).await
    }

    async fn run_pass(&self, workspace: &Workspace, backends: Backends, prompt: &str) -> RunOutcome {
        let config = workspace.config();

        self.emit(AgentEvent::Fetching);
        let snapshot = match backends.reader.list_and_fetch_all().await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(e, Vec::new()),
        };
        if snapshot.is_empty() {
            debug!("repository has no readable files, the model starts from scratch");
        }
        self.emit(AgentEvent::Fetched {
            files: snapshot.len(),
        });
        if snapshot.truncated {
            self.emit(AgentEvent::Truncated);
        }

        self.transition(AgentState::Prompting);
        let full_prompt = build_prompt(&snapshot.files, prompt);

        self.transition(AgentState::AwaitingModel);
        self.emit(AgentEvent::Generating);
        let answer = match backends
            .model
            .generate(&GenerationRequest::change_set(full_prompt))
            .await
        {
            Ok(answer) => answer,
            Err(e) => return self.fail(e, Vec::new()),
        };

        self.transition(AgentState::Validating);
        let validated = validate_response(&answer, &config.repository.reserved_prefix);
        for skipped in validated.skipped {
            warn!(name = %skipped.name, "dropping proposed file: {}", skipped.reason);
            self.emit(AgentEvent::FileSkipped {
                name: skipped.name,
                reason: skipped.reason,
            });
        }
        if validated.files.is_empty() {
            let reason = match validated.parse_error {
                Some(e) => format!("model answer was not a valid change set: {}", e),
                None => "model proposed no files".to_string(),
            };
            info!("no changes: {}", reason);
            self.transition(AgentState::Failed);
            self.emit(AgentEvent::NoChanges {
                reason: reason.clone(),
            });
            return RunOutcome::NoChanges { reason };
        }

        self.transition(AgentState::Writing);
        self.emit(AgentEvent::Committing {
            files: validated.files.len(),
        });
        let mut written = Vec::with_capacity(validated.files.len());
        for change in &validated.files {
            let sha = snapshot.find(&change.name).map(|f| f.sha.as_str());
            let action = if sha.is_some() {
                FileAction::Updated
            } else {
                FileAction::Created
            };
            if let Err(e) = backends.writer.put(&change.name, &change.content, sha).await {
                return self.fail(e, written);
            }
            info!(path = %change.name, %action, "file written");
            let file = WrittenFile {
                path: change.name.clone(),
                action,
            };
            self.emit(AgentEvent::FileWritten(file.clone()));
            written.push(file);
        }

        self.transition(AgentState::Idle);
        self.emit(AgentEvent::Completed {
            files: written.len(),
        });
        if let Some(url) = &config.preview.url {
            self.emit(AgentEvent::PreviewReload {
                url: cache_busted(url, chrono::Utc::now().timestamp_millis()),
            });
        }
        RunOutcome::Completed { written }
    }

    fn fail(&self, error: SiteError, written: Vec<WrittenFile>) -> RunOutcome {
        warn!(kind = error.kind(), written = written.len(), "pass failed: {}", error);
        self.transition(AgentState::Failed);
        self.report_failure(error, written)
    }

    fn report_failure(&self, error: SiteError, written: Vec<WrittenFile>) -> RunOutcome {
        self.emit(AgentEvent::Failed {
            error: error.to_string(),
        });
        RunOutcome::Failed {
            error: error.to_string(),
            kind: error.kind().to_string(),
            written,
        }
    }
}

/// Append `t=<millis>` so the preview bypasses any cache
fn cache_busted(url: &str, millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, separator, millis)
}
