use serde::Serialize;
use std::time::Instant;

use super::reporter::{console_events, Stream};
use crate::{
    agent::{Agent, RunOutcome},
    app::Workspace,
    cli::OutputFormat,
};

/// Result of a non-interactive run
#[derive(Debug, Serialize)]
pub struct NonInteractiveResult {
    /// The prompt that was executed
    pub prompt: String,
    /// How the pass ended
    pub outcome: RunOutcome,
    /// Metadata about the execution
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ExecutionMetadata {
    /// `owner/name` of the target repository
    pub repository: String,
    /// Model used, if one was initialized
    pub model: Option<String>,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

impl NonInteractiveResult {
    /// The process should exit non-zero
    pub fn failed(&self) -> bool {
        self.outcome.is_failure()
    }
}

/// Non-interactive runner for executing single prompts
pub struct NonInteractiveRunner {
    agent: Agent,
}

impl NonInteractiveRunner {
    /// Progress goes to stdout for text output and to stderr for JSON
    pub fn new(workspace: Workspace, format: OutputFormat, verbose: bool) -> Self {
        let stream = match format {
            OutputFormat::Text => Stream::Stdout,
            OutputFormat::Json => Stream::Stderr,
        };
        Self {
            agent: Agent::new(workspace, console_events(stream, verbose)),
        }
    }

    /// Execute a single prompt and return the result
    pub async fn execute(&self, prompt: String) -> NonInteractiveResult {
        let start_time = Instant::now();
        let outcome = self.agent.handle_request(&prompt).await;

        let workspace = self.agent.workspace();
        NonInteractiveResult {
            prompt,
            outcome,
            metadata: ExecutionMetadata {
                repository: workspace.config().repository.slug(),
                model: workspace.model_name().map(String::from),
                duration_ms: start_time.elapsed().as_millis(),
            },
        }
    }
}

/// Format the result according to the output format
pub fn format_result(result: &NonInteractiveResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)),
        OutputFormat::Text => {
            let mut output = String::from("\n--- Summary ---\n");
            match &result.outcome {
                RunOutcome::Completed { written } => {
                    output.push_str(&format!("Committed {} file(s):\n", written.len()));
                }
                RunOutcome::NoChanges { reason } => {
                    output.push_str(&format!("No changes ({})\n", reason));
                }
                RunOutcome::Failed { error, written, .. } => {
                    output.push_str(&format!("Failed: {}\n", error));
                    if !written.is_empty() {
                        output.push_str(&format!(
                            "Committed before the failure, {} file(s):\n",
                            written.len()
                        ));
                    }
                }
                RunOutcome::Busy => output.push_str("Agent is busy\n"),
                RunOutcome::Ignored => output.push_str("Empty prompt, nothing to do\n"),
            }
            for file in result.outcome.written() {
                output.push_str(&format!("  [{}] {}\n", file.action, file.path));
            }
            output.push_str(&format!(
                "Repository: {} | Model: {} | Duration: {}ms",
                result.metadata.repository,
                result.metadata.model.as_deref().unwrap_or("none"),
                result.metadata.duration_ms
            ));
            output
        }
    }
}
