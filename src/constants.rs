/// Constants module to avoid magic numbers in the codebase

// Repository API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const USER_AGENT: &str = concat!("sitewright/", env!("CARGO_PKG_VERSION"));

/// Paths under this prefix belong to the tool itself: never read into a prompt, never overwritten.
pub const DEFAULT_RESERVED_PREFIX: &str = "dev.";

// Model
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const MODEL_REQUEST_TIMEOUT_SECS: u64 = 600; // full-site rewrites can take minutes

// Credential storage
pub const CREDENTIALS_FILE: &str = "credentials.toml";
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

// Config
pub const CONFIG_FILE: &str = "config.toml";
pub const LOCAL_CONFIG_PATH: &str = ".sitewright/config.toml";
pub const ENV_PREFIX: &str = "SITEWRIGHT_";
