use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_FILE, DEFAULT_BRANCH, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL,
    DEFAULT_GITHUB_API_URL, DEFAULT_RESERVED_PREFIX, ENV_PREFIX, HTTP_REQUEST_TIMEOUT_SECS,
    LOCAL_CONFIG_PATH, MODEL_REQUEST_TIMEOUT_SECS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Target repository
    #[serde(default)]
    pub repository: RepositorySettings,

    /// Generative model settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Live preview settings
    #[serde(default)]
    pub preview: PreviewSettings,
}

/// Which repository and branch the agent reads from and commits to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// REST API base URL
    pub api_url: String,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Branch that is read and written
    pub branch: String,
    /// Paths starting with this prefix are never read or written
    pub reserved_prefix: String,
    /// Timeout for a single repository request
    pub timeout_secs: u64,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            owner: String::new(),
            name: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl RepositorySettings {
    /// `owner/name`, the form users type and logs print
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn is_configured(&self) -> bool {
        !self.owner.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// Model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// API base URL
    pub endpoint: String,
    /// Model identifier
    pub name: String,
    /// Timeout for one generation call
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            name: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_secs: MODEL_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Preview configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Where the published site can be viewed, e.g. a GitHub Pages URL
    pub url: Option<String>,
}

/// Load configuration from multiple sources
///
/// Layers, later wins: defaults, global `config.toml`, `.sitewright/config.toml`,
/// `SITEWRIGHT_*` environment variables (`__` separates nested keys).
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join(CONFIG_FILE);
    let local_config = PathBuf::from(LOCAL_CONFIG_PATH);

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    extract(figment)
}

/// Load configuration from an explicit file, still honouring environment overrides
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path));
    extract(figment)
}

fn extract(figment: Figment) -> Result<Config> {
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "sitewright") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("sitewright");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join(CONFIG_FILE)
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create the default configuration files that don't exist yet
///
/// Writes the global `config.toml` and `.sitewright/config.toml.example` in the
/// current directory. Returns the files created, empty when all were present.
pub fn init_config() -> Result<Vec<PathBuf>> {
    init_config_in(&get_config_dir()?, Path::new("."))
}

fn init_config_in(config_dir: &Path, project_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    let config_file = config_dir.join(CONFIG_FILE);
    if !config_file.exists() {
        std::fs::create_dir_all(config_dir)?;
        save_config(&Config::default(), Some(config_file.clone()))?;
        created.push(config_file);
    }

    let local_example = project_dir.join(format!("{}.example", LOCAL_CONFIG_PATH));
    if !local_example.exists() {
        if let Some(parent) = local_example.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&local_example, EXAMPLE_PROJECT_CONFIG)
            .with_context(|| format!("Failed to write {}", local_example.display()))?;
        created.push(local_example);
    }

    Ok(created)
}

const EXAMPLE_PROJECT_CONFIG: &str = r#"# sitewright project configuration
# This file overrides global settings for this directory

[repository]
owner = "your-github-user"
name = "your-site"
branch = "main"

[model]
name = "gemini-2.5-flash"

[preview]
url = "https://your-github-user.github.io/your-site/"
"#;
