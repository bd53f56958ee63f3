//! Error types for module synchronization.
//!
//! Covers configuration loading, retrieval of upstream documents, the
//! opt-in header policy check, and writing merged output.

use proto_merge_core::MergeError;
use thiserror::Error;

/// Errors that can occur while syncing modules.
#[derive(Debug, Error)]
pub enum SyncError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client failure outside a single fetch.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A document could not be retrieved.
    #[error("failed to fetch {file} for module '{module}': {reason}")]
    Fetch {
        module: String,
        file: String,
        reason: String,
    },

    /// The document list of a module could not be determined.
    #[error("could not determine proto files for module '{module}': {reason}")]
    Listing { module: String, reason: String },

    /// A requested module is not configured.
    #[error("unknown module '{name}' (valid modules: {valid})")]
    UnknownModule { name: String, valid: String },

    /// Merged documents disagree on a header under the reject policy.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience alias for results with [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;
