// Gateway module for the hosted repository - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod codec;
mod github;
mod traits;
mod types;

// Public re-exports - the ONLY way to access repository functionality
pub use codec::{decode_content, encode_content};
pub use github::GitHubRepository;
pub use traits::{RepoReader, RepoWriter};
pub use types::{is_reserved, normalize_path, RemoteFile, Snapshot};
