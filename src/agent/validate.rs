use tracing::debug;

use crate::models::{ChangeSet, FileChange};
use crate::repo::{is_reserved, normalize_path};

/// A proposed file that will not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// The writable part of a model answer
#[derive(Debug, Default)]
pub struct Validated {
    pub files: Vec<FileChange>,
    pub skipped: Vec<SkippedFile>,
    /// Set when the answer was not a change set at all
    pub parse_error: Option<String>,
}

/// Strip a surrounding Markdown code fence, if any
fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model answer into a change set
pub fn parse_change_set(raw: &str) -> Result<ChangeSet, serde_json::Error> {
    serde_json::from_str(strip_fences(raw))
}

/// Parse the answer and drop every entry that must not be written
pub fn validate_response(raw: &str, reserved_prefix: &str) -> Validated {
    let change_set = match parse_change_set(raw) {
        Ok(change_set) => change_set,
        Err(e) => {
            debug!("model answer is not a change set: {}", e);
            return Validated {
                parse_error: Some(e.to_string()),
                ..Validated::default()
            };
        }
    };

    let mut validated = Validated::default();
    for change in change_set.files {
        let path = match normalize_path(&change.name) {
            Ok(path) => path,
            Err(reason) => {
                validated.skipped.push(SkippedFile {
                    name: change.name,
                    reason: reason.to_string(),
                });
                continue;
            }
        };
        if is_reserved(&path, reserved_prefix) {
            validated.skipped.push(SkippedFile {
                reason: format!("files starting with '{}' are reserved", reserved_prefix),
                name: change.name,
            });
        } else {
            validated.files.push(FileChange {
                name: path,
                content: change.content,
            });
        }
    }
    validated
}
