use serde::{Deserialize, Serialize};

/// One blob in the repository at the time it was read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Path relative to the repository root, unique within a snapshot
    pub path: String,
    /// Decoded text content
    pub content: String,
    /// Blob hash; must accompany any write that replaces this file
    pub sha: String,
}

/// Everything the reader fetched in one sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub files: Vec<RemoteFile>,
    /// The listing hit the remote's size limit and some entries are missing
    pub truncated: bool,
}

impl Snapshot {
    /// Exact-path lookup
    pub fn find(&self, path: &str) -> Option<&RemoteFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Whether `path` belongs to the tool's own reserved namespace
pub fn is_reserved(path: &str, reserved_prefix: &str) -> bool {
    !reserved_prefix.is_empty() && path.starts_with(reserved_prefix)
}

/// Canonical repository-relative form of a path proposed for writing
///
/// Leading `./` segments are dropped. Absolute paths, backslashes, empty segments
/// and any other `.` or `..` segment are refused with the reason.
pub fn normalize_path(path: &str) -> Result<String, &'static str> {
    let path = path.trim();
    if path.is_empty() {
        return Err("empty file name");
    }
    if path.contains('\\') {
        return Err("backslash in path");
    }
    if path.starts_with('/') {
        return Err("absolute path");
    }

    let mut relative = path;
    while let Some(rest) = relative.strip_prefix("./") {
        relative = rest;
    }
    for segment in relative.split('/') {
        match segment {
            "" => return Err("empty path segment"),
            "." | ".." => return Err("dot segment in path"),
            _ => {}
        }
    }
    Ok(relative.to_string())
}
