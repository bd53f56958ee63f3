//! Merging the documents of one module into a single schema file.
//!
//! The merged text is laid out as:
//!
//! 1. the first document's license, syntax, package option, and package
//!    lines, each group followed by a blank line;
//! 2. the union of all imports, rewritten and sorted (see
//!    [`collect_imports`]), followed by a blank line;
//! 3. every document's cleaned body in input order, one blank line between
//!    documents that contributed content.
//!
//! Header lines of later documents are ignored. How disagreements between
//! them are reported is governed by [`HeaderPolicy`].
//!
//! # Example
//!
//! ```
//! use proto_merge_core::{Exclusions, MergeRules, merge_documents};
//!
//! let query = "\
//! syntax = \"proto3\";
//! package banyandb.model.v1;
//! import \"banyandb/common/v1/common.proto\";
//! message Tag {
//!   string key = 1;
//! }
//! ";
//! let common = "\
//! syntax = \"proto3\";
//! package banyandb.model.v1;
//! import \"banyandb/model/v1/query.proto\";
//! message FieldValue {
//!   string str = 1;
//! }
//! ";
//!
//! let rules = MergeRules::default();
//! let merged = merge_documents(&[query, common], "model", &Exclusions::default(), &rules);
//! assert_eq!(
//!     merged,
//!     "\
//! syntax = \"proto3\";
//!
//! package banyandb.model.v1;
//!
//! import \"banyandb/v1/banyandb-common.proto\";
//!
//! message Tag {
//!   string key = 1;
//! }
//!
//! message FieldValue {
//!   string str = 1;
//! }
//! "
//! );
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annotations::strip_rpc_annotations;
use crate::collapse::collapse_empty_rpc_blocks;
use crate::error::{MergeError, Result};
use crate::exclude::filter_excluded_definitions;
use crate::imports::collect_imports;
use crate::rules::{Exclusions, HeaderPolicy, MergeRules};
use crate::sections::{ParsedDocument, parse_document};
use crate::util::{is_blank, trim_blank_edges};

/// Header line a later document can disagree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderField {
    Syntax,
    PackageOption,
    Package,
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Syntax => "syntax declaration",
            Self::PackageOption => "package option",
            Self::Package => "package declaration",
        };
        f.write_str(label)
    }
}

/// A header line of a later document that differs from the first document's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConflict {
    pub field: HeaderField,
    /// Index of the disagreeing document in the merge order.
    pub document: usize,
    pub first: String,
    pub other: String,
}

/// Result of [`merge_parsed`]: merged text plus observed header conflicts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    pub header_conflicts: Vec<HeaderConflict>,
}

/// Merges raw document texts of `module` into one schema file.
///
/// Never fails. An empty slice yields an empty string; otherwise the text
/// ends with exactly one `\n`. Header conflicts are logged according to
/// `rules.header_policy` and otherwise discarded.
pub fn merge_documents<S: AsRef<str>>(
    documents: &[S],
    module: &str,
    exclusions: &Exclusions,
    rules: &MergeRules,
) -> String {
    let parsed = parse_all(documents, rules);
    let outcome = merge_parsed(&parsed, module, exclusions, rules);
    report_conflicts(module, &outcome.header_conflicts, rules.header_policy);
    outcome.text
}

/// Like [`merge_documents`], but fails on the first header conflict when
/// `rules.header_policy` is [`HeaderPolicy::Reject`].
///
/// # Errors
///
/// Returns [`MergeError::HeaderConflict`] under the reject policy if a later
/// document declares a different syntax, package option, or package line.
///
/// # Examples
///
/// ```
/// use proto_merge_core::{Exclusions, HeaderPolicy, MergeError, MergeRules, try_merge_documents};
///
/// let rules = MergeRules { header_policy: HeaderPolicy::Reject, ..MergeRules::default() };
/// let docs = ["syntax = \"proto3\";\npackage a.v1;\n", "syntax = \"proto3\";\npackage b.v1;\n"];
///
/// let err = try_merge_documents(&docs, "a", &Exclusions::default(), &rules).unwrap_err();
/// assert!(matches!(err, MergeError::HeaderConflict { document: 1, .. }));
/// ```
pub fn try_merge_documents<S: AsRef<str>>(
    documents: &[S],
    module: &str,
    exclusions: &Exclusions,
    rules: &MergeRules,
) -> Result<String> {
    let parsed = parse_all(documents, rules);
    let outcome = merge_parsed(&parsed, module, exclusions, rules);

    if rules.header_policy == HeaderPolicy::Reject {
        if let Some(conflict) = outcome.header_conflicts.into_iter().next() {
            return Err(MergeError::HeaderConflict {
                module: module.to_string(),
                field: conflict.field,
                document: conflict.document,
                first: conflict.first,
                other: conflict.other,
            });
        }
        return Ok(outcome.text);
    }

    report_conflicts(module, &outcome.header_conflicts, rules.header_policy);
    Ok(outcome.text)
}

/// Merges already parsed documents, returning the text together with the
/// header conflicts found. Conflicts are returned, not logged.
pub fn merge_parsed(
    documents: &[ParsedDocument],
    module: &str,
    exclusions: &Exclusions,
    rules: &MergeRules,
) -> MergeOutcome {
    let Some(first) = documents.first() else {
        return MergeOutcome::default();
    };

    let mut merged: Vec<String> = Vec::new();

    if !first.license.is_empty() {
        merged.extend(first.license.iter().cloned());
        merged.push(String::new());
    }
    for line in [
        &first.syntax_line,
        &first.package_option_line,
        &first.package_line,
    ]
    .into_iter()
    .flatten()
    {
        merged.push(line.clone());
        merged.push(String::new());
    }

    let imports = collect_imports(documents, module, &rules.imports);
    if !imports.is_empty() {
        merged.extend(imports);
        merged.push(String::new());
    }

    let mut contributed = false;
    for (index, doc) in documents.iter().enumerate() {
        let body = clean_body(&doc.body, exclusions, rules);
        if body.is_empty() {
            debug!(module, document = index, "Document contributes no body");
            continue;
        }
        if contributed {
            merged.push(String::new());
        }
        merged.extend(body);
        contributed = true;
    }

    while merged.last().is_some_and(|line| is_blank(line)) {
        merged.pop();
    }

    let mut text = merged.join("\n");
    text.push('\n');

    MergeOutcome {
        text,
        header_conflicts: header_conflicts(documents),
    }
}

/// Runs the body passes on one document body: line skip rules, exclusions,
/// annotation stripping, and empty-block collapsing, with blank edges trimmed.
///
/// # Examples
///
/// ```
/// use proto_merge_core::{Exclusions, MergeRules, clean_body};
///
/// let body: Vec<String> = [
///     "",
///     "option go_package = \"github.com/apache/skywalking-banyandb\";",
///     "service PropertyService {",
///     "  rpc Apply(ApplyRequest) returns (ApplyResponse) {",
///     "  }",
///     "}",
///     "",
/// ]
/// .into_iter()
/// .map(String::from)
/// .collect();
///
/// let cleaned = clean_body(&body, &Exclusions::default(), &MergeRules::default());
/// assert_eq!(
///     cleaned,
///     vec!["service PropertyService {", "  rpc Apply(ApplyRequest) returns (ApplyResponse);", "}"]
/// );
/// ```
pub fn clean_body(body: &[String], exclusions: &Exclusions, rules: &MergeRules) -> Vec<String> {
    let lines: Vec<String> = trim_blank_edges(body)
        .iter()
        .filter(|line| !rules.skip.skips_line(line.trim()))
        .cloned()
        .collect();
    let lines = if exclusions.is_empty() {
        lines
    } else {
        filter_excluded_definitions(&lines, exclusions)
    };
    let lines = strip_rpc_annotations(&lines, &rules.skip);
    let lines = collapse_empty_rpc_blocks(&lines);
    // Removed definitions can leave blank lines at the edges.
    trim_blank_edges(&lines).to_vec()
}

fn parse_all<S: AsRef<str>>(documents: &[S], rules: &MergeRules) -> Vec<ParsedDocument> {
    documents
        .iter()
        .map(|text| parse_document(text.as_ref(), rules))
        .collect()
}

fn header_conflicts(documents: &[ParsedDocument]) -> Vec<HeaderConflict> {
    let Some((first, rest)) = documents.split_first() else {
        return Vec::new();
    };

    let mut conflicts = Vec::new();
    for (offset, doc) in rest.iter().enumerate() {
        if doc.has_empty_header() {
            debug!(
                document = offset + 1,
                "Continuation document without header"
            );
            continue;
        }
        let fields = [
            (HeaderField::Syntax, &first.syntax_line, &doc.syntax_line),
            (
                HeaderField::PackageOption,
                &first.package_option_line,
                &doc.package_option_line,
            ),
            (HeaderField::Package, &first.package_line, &doc.package_line),
        ];
        for (field, expected, found) in fields {
            if let (Some(expected), Some(found)) = (expected, found) {
                if expected.trim() != found.trim() {
                    conflicts.push(HeaderConflict {
                        field,
                        document: offset + 1,
                        first: expected.trim().to_string(),
                        other: found.trim().to_string(),
                    });
                }
            }
        }
    }
    conflicts
}

fn report_conflicts(module: &str, conflicts: &[HeaderConflict], policy: HeaderPolicy) {
    for conflict in conflicts {
        match policy {
            HeaderPolicy::FirstWins => debug!(
                module,
                field = %conflict.field,
                document = conflict.document,
                kept = %conflict.first,
                discarded = %conflict.other,
                "Discarding divergent header line"
            ),
            HeaderPolicy::Warn | HeaderPolicy::Reject => warn!(
                module,
                field = %conflict.field,
                document = conflict.document,
                kept = %conflict.first,
                discarded = %conflict.other,
                "Merged documents disagree on a header line"
            ),
        }
    }
}
