use colored::Colorize;
use std::io::Write;
use std::sync::Arc;

use crate::agent::{AgentEvent, AgentState, EventCallback};
use crate::app::{mask, Workspace};

/// Where progress lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    /// Keeps stdout clean for machine-readable output
    Stderr,
}

/// One colored line per event, or nothing for events hidden at this verbosity
pub fn render_event(event: &AgentEvent, verbose: bool) -> Option<String> {
    let text = event.to_string();
    let line = match event {
        AgentEvent::StateChanged(_) if !verbose => return None,
        AgentEvent::StateChanged(_) | AgentEvent::Fetched { .. } => text.dimmed().to_string(),
        AgentEvent::Truncated | AgentEvent::FileSkipped { .. } | AgentEvent::NoChanges { .. } => {
            text.yellow().to_string()
        }
        AgentEvent::FileWritten(_) => format!("  {}", text.green()),
        AgentEvent::Completed { .. } => text.green().bold().to_string(),
        AgentEvent::PreviewReload { .. } => text.cyan().to_string(),
        AgentEvent::Failed { .. } => text.red().bold().to_string(),
        AgentEvent::Fetching | AgentEvent::Generating | AgentEvent::Committing { .. } => {
            text.blue().to_string()
        }
    };
    Some(line)
}

/// Event callback that prints to the terminal as events arrive
pub fn console_events(stream: Stream, verbose: bool) -> EventCallback {
    Arc::new(move |event: &AgentEvent| {
        let Some(line) = render_event(event, verbose) else {
            return;
        };
        // a closed pipe must not bring the agent down
        let _ = match stream {
            Stream::Stdout => writeln!(std::io::stdout().lock(), "{}", line),
            Stream::Stderr => writeln!(std::io::stderr().lock(), "{}", line),
        };
    })
}

/// Human-readable summary of what a pass would run against
pub fn render_status(workspace: &Workspace, state: Option<AgentState>) -> String {
    let config = workspace.config();
    let credentials = workspace.credentials();
    let repo = &config.repository;

    let mut lines = Vec::new();
    let target = if repo.is_configured() {
        format!("{} (branch {})", repo.slug(), repo.branch).green().to_string()
    } else {
        "not configured".red().to_string()
    };
    lines.push(format!("  Repository:  {}", target));
    lines.push(format!("  Token:       {}", mask(&credentials.repo_token)));
    lines.push(format!("  Gemini key:  {}", mask(&credentials.ai_key)));

    let model = match (workspace.model_name(), workspace.model_error()) {
        (Some(name), _) => name.green().to_string(),
        (None, Some(error)) => format!("{} ({})", "not initialized".red(), error),
        (None, None) => "not initialized".yellow().to_string(),
    };
    lines.push(format!("  Model:       {}", model));
    lines.push(format!(
        "  Preview:     {}",
        config.preview.url.as_deref().unwrap_or("<not set>")
    ));
    if let Some(state) = state {
        lines.push(format!("  Agent:       {}", state));
    }

    let readiness = match workspace.backends() {
        Ok(_) => "[OK] Ready".green().to_string(),
        Err(e) => format!("{} {}", "[WARNING]".yellow(), e),
    };
    lines.push(String::new());
    lines.push(format!("  {}", readiness));
    lines.join("\n")
}
