//! Error types for policy-checked merges.

use thiserror::Error;

use crate::merge::HeaderField;

/// Errors raised by [`try_merge_documents`](crate::try_merge_documents).
///
/// The plain merge never fails; this only surfaces header disagreements when
/// [`HeaderPolicy::Reject`](crate::HeaderPolicy::Reject) is configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A later document declares a header line different from the first one.
    #[error("module '{module}': document {document} has {field} `{other}`, expected `{first}`")]
    HeaderConflict {
        module: String,
        field: HeaderField,
        /// Index of the disagreeing document in the merge order.
        document: usize,
        first: String,
        other: String,
    },
}

/// Convenience alias for results with [`MergeError`].
pub type Result<T> = std::result::Result<T, MergeError>;
