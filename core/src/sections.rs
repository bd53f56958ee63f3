//! Splitting one schema document into header, imports, and body.
//!
//! [`parse_document`] makes a single forward pass. The leading comment block
//! becomes the license; `syntax`, the package-scoped option, and `package`
//! are captured once each; imports are collected separately; everything after
//! the package declaration is body. Lines matching [`SkipRules`] are dropped
//! on the way, including multi-line option blocks tracked by brace balance.
//!
//! [`SkipRules`]: crate::SkipRules

use crate::rules::MergeRules;
use crate::util::{IMPORT_KEYWORD, PACKAGE_KEYWORD, SYNTAX_KEYWORD, brace_delta};

/// One schema document broken into sections. Lines are stored raw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Leading comment block.
    pub license: Vec<String>,
    pub syntax_line: Option<String>,
    /// First package-scoped option, e.g. `option java_package = "...";`.
    pub package_option_line: Option<String>,
    pub package_line: Option<String>,
    /// Import lines in source order, forbidden imports already removed.
    pub imports: Vec<String>,
    /// Remaining lines after the package declaration, in source order.
    pub body: Vec<String>,
}

impl ParsedDocument {
    /// Returns `true` if no header field was captured.
    pub fn has_empty_header(&self) -> bool {
        self.license.is_empty()
            && self.syntax_line.is_none()
            && self.package_option_line.is_none()
            && self.package_line.is_none()
    }
}

/// Parses raw document text into a [`ParsedDocument`].
///
/// Never fails: a document without a license, syntax, or package line simply
/// leaves those fields empty. Body lines are only collected once both the
/// syntax and the package declaration have been seen.
///
/// # Examples
///
/// ```
/// use proto_merge_core::{MergeRules, parse_document};
///
/// let text = "\
/// // Licensed to the Apache Software Foundation (ASF)
///
/// syntax = \"proto3\";
///
/// option java_package = \"org.apache.skywalking.banyandb.common.v1\";
/// option go_package = \"github.com/apache/skywalking-banyandb/api/proto/banyandb/common/v1\";
///
/// package banyandb.common.v1;
///
/// import \"google/protobuf/timestamp.proto\";
///
/// message Group {
///   string name = 1;
/// }
/// ";
///
/// let doc = parse_document(text, &MergeRules::default());
/// assert_eq!(doc.license.len(), 1);
/// assert_eq!(doc.syntax_line.as_deref(), Some("syntax = \"proto3\";"));
/// assert!(doc.package_option_line.unwrap().contains("java_package"));
/// assert_eq!(doc.package_line.as_deref(), Some("package banyandb.common.v1;"));
/// assert_eq!(doc.imports, vec!["import \"google/protobuf/timestamp.proto\";"]);
/// assert!(doc.body.iter().any(|line| line == "message Group {"));
/// assert!(!doc.body.iter().any(|line| line.contains("go_package")));
/// ```
pub fn parse_document(text: &str, rules: &MergeRules) -> ParsedDocument {
    let mut doc = ParsedDocument::default();
    let mut license_done = false;
    // Balance of the option block being dropped, if one is open.
    let mut open_option: Option<i64> = None;
    let mut previous: Option<&str> = None;

    for line in text.lines() {
        let prev = previous.replace(line);
        let trimmed = line.trim();

        if !license_done {
            if is_license_line(trimmed, prev) {
                doc.license.push(line.to_string());
                continue;
            }
            license_done = true;
            if trimmed.is_empty() {
                continue;
            }
        }

        if doc.syntax_line.is_none() {
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with(SYNTAX_KEYWORD) {
                doc.syntax_line = Some(line.to_string());
                continue;
            }
        }

        if !rules.package_option.is_empty() && trimmed.starts_with(rules.package_option.as_str()) {
            if doc.package_option_line.is_none() {
                doc.package_option_line = Some(line.to_string());
            }
            continue;
        }

        if rules.skip.skips_line(trimmed) {
            continue;
        }

        if doc.syntax_line.is_some() {
            if rules.skip.is_option_block(trimmed) {
                let depth = brace_delta(trimmed);
                open_option = (depth > 0).then_some(depth);
                continue;
            }
            if let Some(depth) = open_option {
                let depth = depth + brace_delta(trimmed);
                open_option = (depth > 0).then_some(depth);
                continue;
            }
        }

        if doc.package_line.is_none()
            && doc.syntax_line.is_some()
            && trimmed.starts_with(PACKAGE_KEYWORD)
        {
            doc.package_line = Some(line.to_string());
            continue;
        }

        if trimmed.starts_with(IMPORT_KEYWORD) {
            if !rules.skip.is_forbidden_import(line) {
                doc.imports.push(line.to_string());
            }
            continue;
        }

        if doc.syntax_line.is_some() && doc.package_line.is_some() {
            doc.body.push(line.to_string());
        }
    }

    doc
}

/// Comment lines of the leading license block. A `*` continuation line only
/// counts when the previous raw line opened a block comment.
fn is_license_line(trimmed: &str, previous: Option<&str>) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || (trimmed.starts_with('*') && previous.is_some_and(|prev| prev.contains("/*")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkipRules;

    fn parse(text: &str) -> ParsedDocument {
        parse_document(text, &MergeRules::default())
    }

    #[test]
    fn test_license_block_of_line_comments() {
        let doc = parse(
            "// Licensed to the ASF\n// under one or more agreements.\n\nsyntax = \"proto3\";\n",
        );
        assert_eq!(
            doc.license,
            vec!["// Licensed to the ASF", "// under one or more agreements."]
        );
        assert_eq!(doc.syntax_line.as_deref(), Some("syntax = \"proto3\";"));
    }

    #[test]
    fn test_block_comment_continuation_needs_opener_on_previous_line() {
        let doc = parse("/* Licensed\n * to the ASF\nsyntax = \"proto3\";\n");
        assert_eq!(doc.license, vec!["/* Licensed", " * to the ASF"]);
        assert!(doc.syntax_line.is_some());

        // Without an opener right above, `*` does not continue the license.
        let doc = parse("// header\n* stray\nsyntax = \"proto3\";\n");
        assert_eq!(doc.license, vec!["// header"]);
        assert!(doc.syntax_line.is_some());
    }

    #[test]
    fn test_document_without_license_or_syntax() {
        let doc = parse("message Orphan {\n}\n");
        assert!(doc.has_empty_header());
        assert!(doc.body.is_empty());
        assert!(doc.imports.is_empty());
    }

    #[test]
    fn test_header_fields_first_occurrence_wins() {
        let text = "\
syntax = \"proto3\";
syntax = \"proto2\";
option java_package = \"first\";
option java_package = \"second\";
package a.v1;
package b.v1;
message M {}
";
        let doc = parse(text);
        assert_eq!(doc.syntax_line.as_deref(), Some("syntax = \"proto3\";"));
        assert_eq!(
            doc.package_option_line.as_deref(),
            Some("option java_package = \"first\";")
        );
        assert_eq!(doc.package_line.as_deref(), Some("package a.v1;"));
        // Later package-option lines vanish; a later package line is body.
        assert!(!doc.body.iter().any(|line| line.contains("java_package")));
        assert_eq!(doc.body, vec!["package b.v1;", "message M {}"]);
    }

    #[test]
    fn test_package_requires_syntax() {
        let doc = parse("package early.v1;\nsyntax = \"proto3\";\nmessage M {}\n");
        assert!(doc.package_line.is_none());
        assert!(doc.body.is_empty());
    }

    #[test]
    fn test_forbidden_imports_dropped() {
        let text = "\
syntax = \"proto3\";
package banyandb.measure.v1;
import \"google/api/annotations.proto\";
import \"banyandb/model/v1/query.proto\";
import \"protoc-gen-openapiv2/options/annotations.proto\";
";
        let doc = parse(text);
        assert_eq!(
            doc.imports,
            vec!["import \"banyandb/model/v1/query.proto\";"]
        );
    }

    #[test]
    fn test_multiline_option_block_dropped() {
        let text = "\
syntax = \"proto3\";
package banyandb.measure.v1;
service MeasureService {
  rpc Query(QueryRequest) returns (QueryResponse) {
    option (google.api.http) = {
      post: \"/v1/measure/data\"
      body: \"*\"
    };
  }
}
";
        let doc = parse(text);
        assert_eq!(
            doc.body,
            vec![
                "service MeasureService {",
                "  rpc Query(QueryRequest) returns (QueryResponse) {",
                "  }",
                "}",
            ]
        );
    }

    #[test]
    fn test_single_line_option_block_dropped() {
        let text = "\
syntax = \"proto3\";
package p.v1;
service S {
  rpc Get(A) returns (B) {
    option (google.api.http) = {get: \"/v1/a\"};
  }
}
";
        let doc = parse(text);
        assert!(!doc.body.join("\n").contains("google.api.http"));
        assert_eq!(doc.body.len(), 4);
    }

    #[test]
    fn test_option_block_before_syntax_is_not_tracked() {
        let rules = MergeRules {
            skip: SkipRules {
                option_blocks: vec!["option (custom)".to_string()],
                ..SkipRules::default()
            },
            ..MergeRules::default()
        };
        let doc = parse_document(
            "option (custom) = {\nsyntax = \"proto3\";\npackage p;\nmessage M {}\n",
            &rules,
        );
        assert!(doc.syntax_line.is_some());
        assert_eq!(doc.body, vec!["message M {}"]);
    }

    #[test]
    fn test_line_skip_rules_apply_everywhere() {
        let text = "\
syntax = \"proto3\";
option go_package = \"github.com/x\";
package p.v1;
option (grpc.gateway.protoc_gen_openapiv2.options.openapiv2_swagger) = {};
message M {}
";
        let doc = parse(text);
        assert_eq!(doc.body, vec!["message M {}"]);
    }

    #[test]
    fn test_crlf_input() {
        let text = "// c\r\n\r\nsyntax = \"proto3\";\r\npackage p;\r\nmessage M {}\r\n";
        let doc = parse(text);
        assert_eq!(doc.license, vec!["// c"]);
        assert_eq!(doc.body, vec!["message M {}"]);
    }
}
