//! Stripping option annotations from RPC method blocks.
//!
//! Upstream services decorate methods with transport annotations:
//!
//! ```text
//! rpc Query(QueryRequest) returns (QueryResponse) {
//!   option (google.api.http) = {
//!     post: "/v1/measure/data"
//!     body: "*"
//!   };
//! }
//! ```
//!
//! [`strip_rpc_annotations`] removes the statements matching
//! [`SkipRules::option_blocks`] and turns a method left with nothing inside
//! into `rpc Query(QueryRequest) returns (QueryResponse);`.
//!
//! Blocks that never close are not rejected. When another `rpc`, `service`, or
//! `message` starts first, or the input ends, the opener is terminated on its
//! own and scanning resumes without dropping any following line.

use tracing::debug;

use crate::rules::SkipRules;
use crate::util::{
    brace_delta, closes_enclosing_block, is_blank, is_rpc_opener, starts_definition,
    terminate_declaration,
};

/// How the lines after an RPC opener ended.
#[derive(Debug)]
enum BlockEnd<'a> {
    /// A bare `}` at `closer` (offset into the scanned lines).
    Closed {
        kept: Vec<&'a String>,
        annotations: usize,
        closer: usize,
    },
    /// A new definition starts at `at` before any closing line.
    Interrupted { at: usize },
    /// The input ended before any closing line.
    Unterminated,
}

/// Removes annotation statements from multi-line RPC blocks.
///
/// Inner lines that are not annotations, blank lines included, are kept. A
/// block keeping no non-blank line collapses to a terminated declaration and
/// its closing line is consumed. The exception is an opener followed only by
/// a `}` indented less than itself: that `}` closes the enclosing service and
/// stays.
///
/// # Examples
///
/// ```
/// use proto_merge_core::{SkipRules, strip_rpc_annotations};
///
/// let body: Vec<String> = [
///     "service StreamService {",
///     "  rpc Query(QueryRequest) returns (QueryResponse) {",
///     "    option (google.api.http) = {post: \"/v1/stream/data\" body: \"*\"};",
///     "  }",
///     "}",
/// ]
/// .into_iter()
/// .map(String::from)
/// .collect();
///
/// let stripped = strip_rpc_annotations(&body, &SkipRules::default());
/// assert_eq!(
///     stripped,
///     vec![
///         "service StreamService {",
///         "  rpc Query(QueryRequest) returns (QueryResponse);",
///         "}",
///     ]
/// );
/// ```
pub fn strip_rpc_annotations(body: &[String], skip: &SkipRules) -> Vec<String> {
    let mut out = Vec::with_capacity(body.len());
    let mut idx = 0;

    while idx < body.len() {
        let line = &body[idx];
        if !is_rpc_opener(line.trim()) {
            out.push(line.clone());
            idx += 1;
            continue;
        }

        match scan_block(&body[idx + 1..], skip) {
            BlockEnd::Closed {
                kept,
                annotations,
                closer,
            } => {
                let closing = &body[idx + 1 + closer];
                if kept.iter().any(|inner| !is_blank(inner)) {
                    out.push(line.clone());
                    out.extend(kept.into_iter().cloned());
                    out.push(closing.clone());
                } else if annotations == 0 && closes_enclosing_block(line, closing) {
                    // The closer belongs to the enclosing block; leave it in place.
                    debug!(
                        opener = line.trim(),
                        "Rpc block closed by its enclosing block"
                    );
                    out.push(terminate_declaration(line));
                    idx += 1;
                    continue;
                } else {
                    debug!(opener = line.trim(), annotations, "Collapsing rpc block");
                    out.push(terminate_declaration(line));
                }
                idx += closer + 2;
            }
            BlockEnd::Interrupted { at } => {
                debug!(
                    opener = line.trim(),
                    "Rpc block interrupted by a new definition"
                );
                out.push(terminate_declaration(line));
                idx += at + 1;
            }
            BlockEnd::Unterminated => {
                debug!(
                    opener = line.trim(),
                    "Rpc block unterminated at end of input"
                );
                out.push(terminate_declaration(line));
                idx += 1;
            }
        }
    }

    out
}

fn scan_block<'a>(inner: &'a [String], skip: &SkipRules) -> BlockEnd<'a> {
    let mut kept = Vec::new();
    let mut annotations = 0;
    // Brace balance of a multi-line annotation being dropped.
    let mut open_annotation: Option<i64> = None;

    for (offset, line) in inner.iter().enumerate() {
        let trimmed = line.trim();

        if starts_definition(trimmed) {
            return BlockEnd::Interrupted { at: offset };
        }

        if let Some(depth) = open_annotation {
            let depth = depth + brace_delta(trimmed);
            open_annotation = (depth > 0).then_some(depth);
            continue;
        }

        if trimmed == "}" {
            return BlockEnd::Closed {
                kept,
                annotations,
                closer: offset,
            };
        }

        if skip.is_option_block(trimmed) {
            annotations += 1;
            let depth = brace_delta(trimmed);
            open_annotation = (depth > 0).then_some(depth);
            continue;
        }

        kept.push(line);
    }

    BlockEnd::Unterminated
}
