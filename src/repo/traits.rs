use async_trait::async_trait;

use super::types::Snapshot;
use crate::utils::SiteError;

/// Reads the current state of the repository
#[async_trait]
pub trait RepoReader: Send + Sync {
    /// List every blob on the branch and fetch its decoded content.
    /// Reserved paths are excluded. A truncated listing still succeeds.
    async fn list_and_fetch_all(&self) -> Result<Snapshot, SiteError>;
}

/// Creates or replaces files in the repository
#[async_trait]
pub trait RepoWriter: Send + Sync {
    /// Upsert `path` with the full `content`.
    /// `sha` must be the blob hash from the latest read, or `None` to create.
    async fn put(&self, path: &str, content: &str, sha: Option<&str>) -> Result<(), SiteError>;
}
