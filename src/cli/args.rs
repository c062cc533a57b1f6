use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitewright")]
#[command(version)]
#[command(about = "Edit a static website hosted on GitHub by describing the change", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SITEWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Non-interactive prompt to execute
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Start a chat session (default)
    Chat,
    /// Show version information
    Version,
    /// Show repository, credential and model status
    Status,
    /// Manage the stored GitHub token and Gemini API key
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsAction {
    /// Store the GitHub token (read from stdin when omitted)
    SetToken { token: Option<String> },
    /// Store the Gemini API key (read from stdin when omitted)
    SetKey { key: Option<String> },
    /// Show masked credentials and where they are stored
    Show,
    /// Remove both stored credentials
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}
