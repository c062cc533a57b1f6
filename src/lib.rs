pub mod agent;
pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod repo;
pub mod runtime;
pub mod utils;

pub use agent::{Agent, AgentEvent, AgentState, RunOutcome};
pub use app::{load_config, Config, Workspace};
pub use models::{Model, ModelFactory};
pub use repo::{GitHubRepository, RepoReader, RepoWriter};
pub use utils::SiteError;
