use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use tracing::info;

use super::chat::ChatSession;
use super::non_interactive::{format_result, NonInteractiveRunner};
use crate::{
    app::{load_config, load_config_from, Config, CredentialStore, Workspace},
    cli::{handle_command, Cli},
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        // An explicit --config must load; the default layers fall back to defaults
        let config = if let Some(config_path) = &cli.config {
            load_config_from(config_path)?
        } else {
            match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("{} Failed to load config: {:#}. Using defaults.", "[WARNING]".yellow(), e);
                    Config::default()
                }
            }
        };

        Ok(Self { cli, config })
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<ExitCode> {
        // Handle subcommands
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config).await? {
                return Ok(ExitCode::SUCCESS); // Command handled, exit
            }
            // Continue to chat for Commands::Chat
        }

        let store = CredentialStore::open_default()?;
        info!(
            repository = %self.config.repository.slug(),
            credentials = %store.path().display(),
            "starting"
        );

        if let Some(prompt) = self.cli.prompt.clone() {
            let workspace = Workspace::connect(self.config, store.resolve());
            let runner = NonInteractiveRunner::new(workspace, self.cli.output_format, self.cli.verbose);
            let result = runner.execute(prompt).await;
            println!("{}", format_result(&result, self.cli.output_format));

            // Exit with appropriate code
            return Ok(if result.failed() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }

        ChatSession::new(self.config, store, self.cli.verbose).run().await?;
        Ok(ExitCode::SUCCESS)
    }
}
