use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::codec::{decode_content, encode_content};
use super::traits::{RepoReader, RepoWriter};
use super::types::{is_reserved, normalize_path, RemoteFile, Snapshot};
use crate::app::RepositorySettings;
use crate::constants::{GITHUB_ACCEPT, GITHUB_API_VERSION, USER_AGENT as SITEWRIGHT_AGENT};
use crate::utils::SiteError;

/// Git trees API response
#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    url: Option<String>,
}

/// Git blobs API response
#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

/// Contents API upsert body
#[derive(Debug, Serialize)]
struct PutContentBody<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// GitHub REST client for one repository and branch
pub struct GitHubRepository {
    client: Client,
    settings: RepositorySettings,
}

impl GitHubRepository {
    /// Build a client that authenticates every request with `token`
    pub fn new(settings: RepositorySettings, token: &str) -> Result<Self, SiteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(SITEWRIGHT_AGENT));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| SiteError::Config("GitHub token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { client, settings })
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.owner,
            self.settings.name
        )
    }

    fn tree_url(&self) -> String {
        format!(
            "{}/git/trees/{}?recursive=1",
            self.repo_url(),
            urlencoding::encode(&self.settings.branch)
        )
    }

    fn contents_url(&self, path: &str) -> String {
        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/contents/{}", self.repo_url(), encoded)
    }

    async fn fetch_blob(&self, entry: &TreeEntry) -> Result<RemoteFile, SiteError> {
        let url = entry
            .url
            .as_deref()
            .ok_or_else(|| SiteError::Protocol(format!("Tree entry {} has no blob url", entry.path)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SiteError::Network(format!("Failed to fetch file {}: {}", entry.path, e)))?;

        if !response.status().is_success() {
            return Err(SiteError::Network(format!(
                "Failed to fetch file {}",
                entry.path
            )));
        }

        let blob: BlobResponse = response.json().await.map_err(|e| {
            SiteError::Protocol(format!("Malformed blob response for {}: {}", entry.path, e))
        })?;

        if blob.encoding != "base64" {
            return Err(SiteError::Protocol(format!(
                "Unexpected encoding for {}: {}",
                entry.path, blob.encoding
            )));
        }

        let content = decode_content(&blob.content).map_err(|e| match e {
            SiteError::Protocol(msg) => SiteError::Protocol(format!("{}: {}", entry.path, msg)),
            other => other,
        })?;

        debug!(path = %entry.path, bytes = content.len(), "fetched blob");

        Ok(RemoteFile {
            path: entry.path.clone(),
            content,
            sha: entry.sha.clone(),
        })
    }
}

#[async_trait]
impl RepoReader for GitHubRepository {
    async fn list_and_fetch_all(&self) -> Result<Snapshot, SiteError> {
        let response = self
            .client
            .get(self.tree_url())
            .send()
            .await
            .map_err(|e| SiteError::Network(format!("GitHub API error fetching tree: {}", e)))?;

        if !response.status().is_success() {
            return Err(SiteError::Network(format!(
                "GitHub API error fetching tree: {}",
                response.status()
            )));
        }

        let listing: TreeResponse = response
            .json()
            .await
            .map_err(|e| SiteError::Protocol(format!("Malformed tree response: {}", e)))?;

        if listing.truncated {
            warn!(repo = %self.settings.slug(), "tree listing truncated by the API");
        }

        let blobs: Vec<&TreeEntry> = listing
            .tree
            .iter()
            .filter(|entry| entry.kind == "blob")
            .filter(|entry| !is_reserved(&entry.path, &self.settings.reserved_prefix))
            .collect();

        info!(
            repo = %self.settings.slug(),
            branch = %self.settings.branch,
            files = blobs.len(),
            "fetching repository files"
        );

        // All fetches run at once; the first failure fails the read
        let files = try_join_all(blobs.into_iter().map(|entry| self.fetch_blob(entry))).await?;

        Ok(Snapshot {
            files,
            truncated: listing.truncated,
        })
    }
}

#[async_trait]
impl RepoWriter for GitHubRepository {
    async fn put(&self, path: &str, content: &str, sha: Option<&str>) -> Result<(), SiteError> {
        // The request URL must name exactly this file inside the repository
        if normalize_path(path).ok().as_deref() != Some(path) {
            return Err(SiteError::Protocol(format!(
                "Refusing to upload to unsafe path {}",
                path
            )));
        }

        let body = PutContentBody {
            message: format!("AI edit: update {}", path),
            content: encode_content(content),
            branch: &self.settings.branch,
            sha,
        };

        let response = self
            .client
            .put(self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| SiteError::Network(format!("Failed to upload {}: {}", path, e)))?;

        if response.status().is_success() {
            info!(path, created = sha.is_none(), "committed file");
            return Ok(());
        }

        Err(upload_error(path, response).await)
    }
}

/// Turn a failed upsert into an error carrying the API's own message
async fn upload_error(path: &str, response: Response) -> SiteError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    let message = format!("Failed to upload {}: {}", path, message);
    match status.as_u16() {
        // 409: sha is stale. 422: sha missing for an existing file, or malformed.
        409 | 422 => SiteError::Conflict(message),
        _ => SiteError::Network(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn settings(server: &MockServer) -> RepositorySettings {
        RepositorySettings {
            api_url: server.base_url(),
            owner: "octo".into(),
            name: "site".into(),
            ..RepositorySettings::default()
        }
    }

    fn repo(server: &MockServer) -> GitHubRepository {
        GitHubRepository::new(settings(server), "tok").unwrap()
    }

    #[tokio::test]
    async fn test_reads_blobs_and_skips_reserved_and_trees() {
        let server = MockServer::start_async().await;

        let tree = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/site/git/trees/main")
                    .query_param("recursive", "1")
                    .header("authorization", "Bearer tok");
                then.status(200).json_body(json!({
                    "sha": "root",
                    "truncated": false,
                    "tree": [
                        {"path": "index.html", "type": "blob", "sha": "abc", "url": server.url("/blobs/abc")},
                        {"path": "css", "type": "tree", "sha": "t1", "url": server.url("/trees/t1")},
                        {"path": "css/style.css", "type": "blob", "sha": "def", "url": server.url("/blobs/def")},
                        {"path": "dev.html", "type": "blob", "sha": "zzz", "url": server.url("/blobs/zzz")}
                    ]
                }));
            })
            .await;
        let index = server
            .mock_async(|when, then| {
                when.method(GET).path("/blobs/abc");
                then.status(200).json_body(json!({
                    "content": encode_content("<h1>Héllo 👋</h1>"),
                    "encoding": "base64"
                }));
            })
            .await;
        let style = server
            .mock_async(|when, then| {
                when.method(GET).path("/blobs/def");
                then.status(200)
                    .json_body(json!({"content": "Ym9keSB7fQ==\n", "encoding": "base64"}));
            })
            .await;
        let reserved = server
            .mock_async(|when, then| {
                when.method(GET).path("/blobs/zzz");
                then.status(200).json_body(json!({"content": "", "encoding": "base64"}));
            })
            .await;

        let snapshot = repo(&server).list_and_fetch_all().await.unwrap();

        tree.assert_async().await;
        index.assert_async().await;
        style.assert_async().await;
        reserved.assert_hits_async(0).await;

        assert!(!snapshot.truncated);
        assert_eq!(
            snapshot.files,
            vec![
                RemoteFile {
                    path: "index.html".into(),
                    content: "<h1>Héllo 👋</h1>".into(),
                    sha: "abc".into(),
                },
                RemoteFile {
                    path: "css/style.css".into(),
                    content: "body {}".into(),
                    sha: "def".into(),
                },
            ]
        );
        assert!(snapshot.files.iter().all(|f| !f.path.starts_with("dev.")));
    }

    #[tokio::test]
    async fn test_truncated_listing_still_returns_files() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/site/git/trees/main");
                then.status(200).json_body(json!({
                    "truncated": true,
                    "tree": [
                        {"path": "index.html", "type": "blob", "sha": "abc", "url": server.url("/blobs/abc")}
                    ]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/blobs/abc");
                then.status(200)
                    .json_body(json!({"content": encode_content("hi"), "encoding": "base64"}));
            })
            .await;

        let snapshot = repo(&server).list_and_fetch_all().await.unwrap();
        assert!(snapshot.truncated);
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_tree_failure_is_network_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/site/git/trees/main");
                then.status(404).json_body(json!({"message": "Not Found"}));
            })
            .await;

        let err = repo(&server).list_and_fetch_all().await.unwrap_err();
        assert!(matches!(err, SiteError::Network(_)));
        assert!(err.to_string().contains("fetching tree"));
    }

    #[tokio::test]
    async fn test_unexpected_encoding_fails_the_read() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/site/git/trees/main");
                then.status(200).json_body(json!({
                    "tree": [
                        {"path": "a.txt", "type": "blob", "sha": "1", "url": server.url("/blobs/1")},
                        {"path": "b.bin", "type": "blob", "sha": "2", "url": server.url("/blobs/2")}
                    ]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/blobs/1");
                then.status(200)
                    .json_body(json!({"content": encode_content("a"), "encoding": "base64"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/blobs/2");
                then.status(200).json_body(json!({"content": "a", "encoding": "utf-8"}));
            })
            .await;

        let err = repo(&server).list_and_fetch_all().await.unwrap_err();
        match err {
            SiteError::Protocol(msg) => assert_eq!(msg, "Unexpected encoding for b.bin: utf-8"),
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blob_failure_fails_the_read() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/site/git/trees/main");
                then.status(200).json_body(json!({
                    "tree": [
                        {"path": "a.txt", "type": "blob", "sha": "1", "url": server.url("/blobs/1")}
                    ]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/blobs/1");
                then.status(500);
            })
            .await;

        let err = repo(&server).list_and_fetch_all().await.unwrap_err();
        assert_eq!(err.to_string(), "Network error: Failed to fetch file a.txt");
    }

    #[tokio::test]
    async fn test_put_update_sends_sha() {
        let server = MockServer::start_async().await;
        let content = "<html><body>Hi ✨</body></html>";
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/repos/octo/site/contents/index.html")
                    .header("authorization", "Bearer tok")
                    .json_body(json!({
                        "message": "AI edit: update index.html",
                        "content": encode_content(content),
                        "branch": "main",
                        "sha": "abc"
                    }));
                then.status(200).json_body(json!({"content": {"sha": "new"}}));
            })
            .await;

        repo(&server).put("index.html", content, Some("abc")).await.unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_create_omits_sha() {
        let server = MockServer::start_async().await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/repos/octo/site/contents/pages/about.html")
                    .json_body(json!({
                        "message": "AI edit: update pages/about.html",
                        "content": encode_content("about"),
                        "branch": "main"
                    }));
                then.status(201).json_body(json!({}));
            })
            .await;

        repo(&server).put("pages/about.html", "about", None).await.unwrap();
        put.assert_async().await;
    }

    #[test]
    fn test_urls() {
        let settings = RepositorySettings {
            api_url: "https://api.example.com/".into(),
            owner: "octo".into(),
            name: "site".into(),
            branch: "feature/x".into(),
            ..RepositorySettings::default()
        };
        let repo = GitHubRepository::new(settings, "tok").unwrap();
        assert_eq!(
            repo.tree_url(),
            "https://api.example.com/repos/octo/site/git/trees/feature%2Fx?recursive=1"
        );
        assert_eq!(
            repo.contents_url("blog/my page.html"),
            "https://api.example.com/repos/octo/site/contents/blog/my%20page.html"
        );
    }

    #[tokio::test]
    async fn test_put_refuses_paths_outside_the_repository() {
        let server = MockServer::start_async().await;
        let any_put = server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(200).json_body(json!({}));
            })
            .await;

        let repo = repo(&server);
        for path in ["../collaborators/evil", "a/../dev.js", "./index.html", "/index.html"] {
            let err = repo.put(path, "x", None).await.unwrap_err();
            assert_eq!(err.kind(), "protocol", "{}", path);
        }
        any_put.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_put_conflict_surfaces_api_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/repos/octo/site/contents/index.html");
                then.status(409)
                    .json_body(json!({"message": "index.html does not match abc"}));
            })
            .await;

        let err = repo(&server)
            .put("index.html", "x", Some("abc"))
            .await
            .unwrap_err();
        match err {
            SiteError::Conflict(msg) => {
                assert_eq!(msg, "Failed to upload index.html: index.html does not match abc")
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_put_other_failure_without_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/repos/octo/site/contents/index.html");
                then.status(403).body("");
            })
            .await;

        let err = repo(&server).put("index.html", "x", None).await.unwrap_err();
        match err {
            SiteError::Network(msg) => assert_eq!(msg, "Failed to upload index.html: Forbidden"),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unprintable_token() {
        let settings = RepositorySettings::default();
        assert!(matches!(
            GitHubRepository::new(settings, "bad\ntoken"),
            Err(SiteError::Config(_))
        ));
    }
}
