use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::{
    app::{get_config_dir, init_config, mask, Config, CredentialStore, Workspace},
    constants::{CONFIG_FILE, GEMINI_API_KEY_ENV, GITHUB_TOKEN_ENV, LOCAL_CONFIG_PATH},
    runtime::render_status,
};

use super::{Commands, CredentialsAction};

/// Handle CLI subcommands
///
/// Returns `false` when the caller should go on to the chat session.
pub async fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing sitewright configuration...");
            let created = init_config()?;
            if created.is_empty() {
                println!("Configuration already present, nothing to do.");
            }
            for path in &created {
                println!("  {} {}", "Created".green(), path.display());
            }
            println!("Edit the configuration to choose your repository.");
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Status => {
            show_status(config)?;
            Ok(true)
        }
        Commands::Credentials { action } => {
            let mut store = CredentialStore::open_default()?;
            handle_credentials(action, &mut store)?;
            Ok(true)
        }
        Commands::Chat => Ok(false), // Continue to chat session
    }
}

/// Show version information
pub fn show_version() {
    println!("sitewright v{}", env!("CARGO_PKG_VERSION"));
    println!("   Describe a change, get it committed to your GitHub-hosted site");
}

fn handle_credentials(action: &CredentialsAction, store: &mut CredentialStore) -> Result<()> {
    match action {
        CredentialsAction::SetToken { token } => {
            let token = secret_or_prompt(token.as_deref(), "GitHub token")?;
            store.set_repo_token(&token)?;
            println!("{} GitHub token saved ({})", "[OK]".green(), mask(&token));
        }
        CredentialsAction::SetKey { key } => {
            let key = secret_or_prompt(key.as_deref(), "Gemini API key")?;
            store.set_ai_key(&key)?;
            println!("{} Gemini API key saved ({})", "[OK]".green(), mask(&key));
        }
        CredentialsAction::Show => {
            let stored = store.stored();
            println!("Credentials file: {}", store.path().display());
            println!("  GitHub token:   {}", mask(&stored.repo_token));
            println!("  Gemini API key: {}", mask(&stored.ai_key));
            let fallbacks = [
                (GITHUB_TOKEN_ENV, &stored.repo_token),
                (GEMINI_API_KEY_ENV, &stored.ai_key),
            ];
            for (name, value) in fallbacks {
                if value.is_empty() && std::env::var(name).is_ok() {
                    println!("  {} is set and will be used", name);
                }
            }
        }
        CredentialsAction::Clear => {
            store.clear()?;
            println!("Stored credentials removed.");
        }
    }
    Ok(())
}

/// Use the given value, or read one line from stdin so secrets stay out of shell history
fn secret_or_prompt(value: Option<&str>, label: &str) -> Result<String> {
    let secret = match value {
        Some(value) => value.to_string(),
        None => {
            eprint!("{}: ", label);
            std::io::stderr().flush()?;
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .with_context(|| format!("Failed to read {}", label))?;
            line
        }
    };
    let secret = secret.trim().to_string();
    if secret.is_empty() {
        bail!("{} must not be empty", label);
    }
    Ok(secret)
}

/// Show configuration and readiness
fn show_status(config: &Config) -> Result<()> {
    println!("sitewright Status:");
    println!();

    let config_path = get_config_dir()?.join(CONFIG_FILE);
    if config_path.exists() {
        println!("  [OK] Configuration: {}", config_path.display());
    } else {
        println!("  [WARNING] Configuration: Not found (using defaults, run `sitewright init`)");
    }
    if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
        println!("  [OK] Project configuration: {}", LOCAL_CONFIG_PATH);
    }

    let store = CredentialStore::open_default()?;
    let workspace = Workspace::connect(config.clone(), store.resolve());
    println!("{}", render_status(&workspace, None));
    println!();
    Ok(())
}
