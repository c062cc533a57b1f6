/// Runtime front-ends - Gateway
mod chat;
mod non_interactive;
mod orchestrator;
mod reporter;

pub use chat::{parse_line, ChatInput, ChatSession};
pub use non_interactive::{format_result, ExecutionMetadata, NonInteractiveResult, NonInteractiveRunner};
pub use orchestrator::Orchestrator;
pub use reporter::{console_events, render_event, render_status, Stream};
