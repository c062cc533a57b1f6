// Gateway module for agent - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod events;
mod orchestrator;
mod prompt;
mod state;
mod validate;

// Public re-exports - the ONLY way to access agent functionality
pub use events::{AgentEvent, EventCallback, FileAction, WrittenFile};
pub use orchestrator::{Agent, RunOutcome};
pub use prompt::{build_prompt, format_corpus};
pub use state::AgentState;
pub use validate::{parse_change_set, validate_response, SkippedFile, Validated};
