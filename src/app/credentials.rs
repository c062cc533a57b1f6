use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::get_config_dir;
use crate::constants::{CREDENTIALS_FILE, GEMINI_API_KEY_ENV, GITHUB_TOKEN_ENV};

/// The two secrets a pass needs. Empty means "not configured".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub repo_token: String,
    #[serde(default)]
    pub ai_key: String,
}

impl Credentials {
    pub fn new(repo_token: impl Into<String>, ai_key: impl Into<String>) -> Self {
        Self {
            repo_token: repo_token.into(),
            ai_key: ai_key.into(),
        }
    }

    /// Both secrets are present
    pub fn is_complete(&self) -> bool {
        !self.repo_token.trim().is_empty() && !self.ai_key.trim().is_empty()
    }
}

// Never print secrets, even at debug level
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("repo_token", &mask(&self.repo_token))
            .field("ai_key", &mask(&self.ai_key))
            .finish()
    }
}

/// Render a secret for display: `<not set>` or its last four characters
pub fn mask(secret: &str) -> String {
    let secret = secret.trim();
    if secret.is_empty() {
        return "<not set>".to_string();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

/// Credentials persisted to `credentials.toml`, saved on every edit
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    credentials: Credentials,
}

impl CredentialStore {
    /// Path of the store inside the user config directory
    pub fn default_path() -> Result<PathBuf> {
        Ok(get_config_dir()?.join(CREDENTIALS_FILE))
    }

    /// Open the store in the user config directory
    pub fn open_default() -> Result<Self> {
        Self::load(Self::default_path()?)
    }

    /// Load the store from disk. A missing file yields empty credentials.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let credentials = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Credentials::default()
        };
        Ok(Self { path, credentials })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored values exactly as saved
    pub fn stored(&self) -> &Credentials {
        &self.credentials
    }

    /// Stored values, with `GITHUB_TOKEN` / `GEMINI_API_KEY` filling empty slots
    pub fn resolve(&self) -> Credentials {
        let mut resolved = self.credentials.clone();
        if resolved.repo_token.trim().is_empty() {
            resolved.repo_token = std::env::var(GITHUB_TOKEN_ENV).unwrap_or_default();
        }
        if resolved.ai_key.trim().is_empty() {
            resolved.ai_key = std::env::var(GEMINI_API_KEY_ENV).unwrap_or_default();
        }
        resolved
    }

    pub fn set_repo_token(&mut self, token: &str) -> Result<()> {
        self.credentials.repo_token = token.trim().to_string();
        self.save()
    }

    pub fn set_ai_key(&mut self, key: &str) -> Result<()> {
        self.credentials.ai_key = key.trim().to_string();
        self.save()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.credentials = Credentials::default();
        self.save()
    }

    /// Write the store to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.credentials)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::load(dir.path().join("credentials.toml")).unwrap();
        assert_eq!(store.stored(), &Credentials::default());
        assert!(!store.stored().is_complete());
    }

    #[test]
    fn test_every_edit_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.toml");

        let mut store = CredentialStore::load(&path).unwrap();
        store.set_repo_token("  ghp_secret  ").unwrap();

        // reload after a single edit: already on disk
        let reloaded = CredentialStore::load(&path).unwrap();
        assert_eq!(reloaded.stored().repo_token, "ghp_secret");
        assert_eq!(reloaded.stored().ai_key, "");

        store.set_ai_key("AIzaKey").unwrap();
        let reloaded = CredentialStore::load(&path).unwrap();
        assert!(reloaded.stored().is_complete());

        store.clear().unwrap();
        let reloaded = CredentialStore::load(&path).unwrap();
        assert_eq!(reloaded.stored(), &Credentials::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.toml");
        let mut store = CredentialStore::load(&path).unwrap();
        store.set_ai_key("k").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_whitespace_only_is_not_complete() {
        assert!(!Credentials::new("   ", "key").is_complete());
        assert!(!Credentials::new("tok", "").is_complete());
        assert!(Credentials::new("tok", "key").is_complete());
    }

    #[test]
    fn test_mask_and_debug_hide_secrets() {
        assert_eq!(mask(""), "<not set>");
        assert_eq!(mask("ghp_abcdef1234"), "****1234");
        let debug = format!("{:?}", Credentials::new("ghp_abcdef1234", "AIzaXYZW"));
        assert!(!debug.contains("abcdef"));
        assert!(debug.contains("****XYZW"));
    }
}
