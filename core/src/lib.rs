//! Line-oriented merge engine for protobuf schema files.
//!
//! A source module spreads its schema over several `.proto` files; this crate
//! folds them into one document per module. It works on lines and brace
//! counts only, with no grammar and no AST, and degrades gracefully on
//! malformed input instead of rejecting it.
//!
//! The passes, leaf first:
//!
//! - [`parse_document`]: splits a document into license, syntax, package
//!   option, package, imports, and body ([`ParsedDocument`]).
//! - [`collect_imports`]: rewrites imports to merged module paths
//!   ([`ImportRewriter`]), drops self-imports, dedupes, and orders them.
//! - [`filter_excluded_definitions`]: removes named messages and RPCs.
//! - [`strip_rpc_annotations`]: removes option annotations from RPC blocks.
//! - [`collapse_empty_rpc_blocks`]: turns empty RPC blocks into one-line
//!   declarations.
//! - [`merge_documents`]: runs everything for one module and returns the
//!   merged text.
//!
//! Configuration is an immutable [`MergeRules`] value plus the module's
//! [`Exclusions`], passed into every call. Nothing is global, so modules can
//! be merged in parallel.
//!
//! # Example
//!
//! ```
//! use proto_merge_core::{Exclusions, MergeRules, merge_documents};
//!
//! let rpc = "\
//! syntax = \"proto3\";
//! package banyandb.stream.v1;
//! import \"google/api/annotations.proto\";
//! import \"banyandb/stream/v1/query.proto\";
//! service StreamService {
//!   rpc Query(QueryRequest) returns (QueryResponse) {
//!     option (google.api.http) = {
//!       post: \"/v1/stream/data\"
//!       body: \"*\"
//!     };
//!   }
//!   rpc DeleteExpiredSegments(DeleteExpiredSegmentsRequest) returns (DeleteExpiredSegmentsResponse);
//! }
//! ";
//!
//! let exclusions = Exclusions::new(Vec::<String>::new(), ["DeleteExpiredSegments"]);
//! let merged = merge_documents(&[rpc], "stream", &exclusions, &MergeRules::default());
//! assert_eq!(
//!     merged,
//!     "\
//! syntax = \"proto3\";
//!
//! package banyandb.stream.v1;
//!
//! service StreamService {
//!   rpc Query(QueryRequest) returns (QueryResponse);
//! }
//! "
//! );
//! ```
//!
//! # Known limitations
//!
//! Brace tracking is a flat counter. Braces inside string literals or comments
//! within a definition block are counted like structural braces.
//!
//! An RPC block that is never closed is only detected when the next `}` is
//! indented less than the opener. Unindented input offers no such signal.

mod annotations;
mod collapse;
mod error;
mod exclude;
mod imports;
mod merge;
mod rules;
mod sections;
mod util;

pub use annotations::strip_rpc_annotations;
pub use collapse::collapse_empty_rpc_blocks;
pub use error::{MergeError, Result};
pub use exclude::filter_excluded_definitions;
pub use imports::{ImportRewriter, collect_imports, rewrite_import};
pub use merge::{
    HeaderConflict, HeaderField, MergeOutcome, clean_body, merge_documents, merge_parsed,
    try_merge_documents,
};
pub use rules::{Exclusions, HeaderPolicy, ImportLayout, MergeRules, SkipRules};
pub use sections::{ParsedDocument, parse_document};
