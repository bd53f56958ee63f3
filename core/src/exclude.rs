//! Removal of named message and RPC definitions from a body.

use tracing::debug;

use crate::rules::Exclusions;
use crate::util::{MESSAGE_KEYWORD, RPC_KEYWORD, brace_delta, message_name, rpc_name};

/// Drops excluded definitions, nested content included.
///
/// An excluded `message` is skipped until its braces balance again; the
/// closing line goes with it. An excluded `rpc` is dropped alone when it is a
/// `;`-terminated declaration, or skipped like a message when it opens a
/// block. Names are matched on the first identifier after the keyword, so
/// nested definitions sharing an excluded name are not told apart. Names that
/// never occur are ignored.
///
/// # Examples
///
/// ```
/// use proto_merge_core::{Exclusions, filter_excluded_definitions};
///
/// let body: Vec<String> = [
///     "message InternalWriteRequest {",
///     "  uint32 shard_id = 1;",
///     "}",
///     "",
///     "service MeasureService {",
///     "  rpc Write(stream WriteRequest) returns (stream WriteResponse);",
///     "  rpc DeleteExpiredSegments(DeleteExpiredSegmentsRequest) returns (DeleteExpiredSegmentsResponse);",
///     "}",
/// ]
/// .into_iter()
/// .map(String::from)
/// .collect();
///
/// let exclusions = Exclusions::new(["InternalWriteRequest"], ["DeleteExpiredSegments"]);
/// let kept = filter_excluded_definitions(&body, &exclusions);
/// assert_eq!(
///     kept,
///     vec![
///         "",
///         "service MeasureService {",
///         "  rpc Write(stream WriteRequest) returns (stream WriteResponse);",
///         "}",
///     ]
/// );
/// ```
pub fn filter_excluded_definitions(body: &[String], exclusions: &Exclusions) -> Vec<String> {
    if body.is_empty() || exclusions.is_empty() {
        return body.to_vec();
    }

    let mut kept = Vec::with_capacity(body.len());
    // Brace balance of the definition being skipped, if any.
    let mut skipping: Option<i64> = None;

    for line in body {
        let trimmed = line.trim();

        if let Some(depth) = skipping {
            let depth = depth + brace_delta(trimmed);
            skipping = (depth > 0).then_some(depth);
            continue;
        }

        if let Some(name) = message_name(trimmed) {
            if trimmed.starts_with(MESSAGE_KEYWORD) && exclusions.excludes_message(name) {
                debug!(definition = name, "Excluding message definition");
                skipping = open_balance(trimmed);
                continue;
            }
        }

        if let Some(name) = rpc_name(trimmed) {
            if trimmed.starts_with(RPC_KEYWORD) && exclusions.excludes_rpc(name) {
                if trimmed.ends_with(';') {
                    debug!(definition = name, "Excluding rpc declaration");
                    continue;
                }
                if trimmed.contains('{') {
                    debug!(definition = name, "Excluding rpc block");
                    skipping = open_balance(trimmed);
                    continue;
                }
            }
        }

        kept.push(line.clone());
    }

    kept
}

/// Skip state after an excluded opener. A definition whose braces already
/// balance on its own line (`message Foo {}`) ends right there.
fn open_balance(trimmed: &str) -> Option<i64> {
    let depth = brace_delta(trimmed);
    if depth <= 0 && trimmed.contains('{') {
        None
    } else {
        Some(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    fn excluding_messages(names: &[&str]) -> Exclusions {
        Exclusions::new(names.iter().copied(), Vec::<String>::new())
    }

    fn excluding_rpcs(names: &[&str]) -> Exclusions {
        Exclusions::new(Vec::<String>::new(), names.iter().copied())
    }

    #[test]
    fn test_nested_message_removed_completely() {
        let body = lines(
            "\
message Foo {
  message Nested {
    string Foo_field = 1;
  }
  Nested nested = 1;
}
message Keep {
  string id = 1;
}",
        );
        let kept = filter_excluded_definitions(&body, &excluding_messages(&["Foo"]));
        let joined = kept.join("\n");
        assert!(!joined.contains("Foo"));
        assert_eq!(brace_delta(&joined), 0);
        assert_eq!(kept, vec!["message Keep {", "  string id = 1;", "}"]);
    }

    #[test]
    fn test_single_line_rpc_removed() {
        let body = lines(
            "\
service S {
  rpc Bar(Req) returns (Res);
  rpc Baz(Req) returns (Res);
}",
        );
        let kept = filter_excluded_definitions(&body, &excluding_rpcs(&["Bar"]));
        assert!(!kept.join("\n").contains("Bar"));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_block_rpc_removed_with_body() {
        let body = lines(
            "\
service S {
  rpc Bar(Req) returns (Res) {
    option deprecated = true;
  }
  rpc Baz(Req) returns (Res);
}",
        );
        let kept = filter_excluded_definitions(&body, &excluding_rpcs(&["Bar"]));
        assert_eq!(
            kept,
            vec!["service S {", "  rpc Baz(Req) returns (Res);", "}"]
        );
    }

    #[test]
    fn test_self_contained_message_does_not_swallow_next() {
        let body = lines("message Empty {}\nmessage Next {\n  int32 a = 1;\n}");
        let kept = filter_excluded_definitions(&body, &excluding_messages(&["Empty"]));
        assert_eq!(kept, vec!["message Next {", "  int32 a = 1;", "}"]);
    }

    #[test]
    fn test_brace_on_following_line() {
        let body = lines("message Foo\n{\n  int32 a = 1;\n}\nmessage Bar {}");
        let kept = filter_excluded_definitions(&body, &excluding_messages(&["Foo"]));
        assert_eq!(kept, vec!["message Bar {}"]);
    }

    #[test]
    fn test_name_match_is_exact() {
        let body = lines("message FooBar {\n}\nmessage Foo {\n}");
        let kept = filter_excluded_definitions(&body, &excluding_messages(&["Foo"]));
        assert_eq!(kept, vec!["message FooBar {", "}"]);
    }

    #[test]
    fn test_unknown_names_are_a_no_op() {
        let body = lines("message A {\n}\nservice S {\n  rpc B(A) returns (A);\n}");
        let kept = filter_excluded_definitions(&body, &Exclusions::new(["Missing"], ["Gone"]));
        assert_eq!(kept, body);
    }

    #[test]
    fn test_empty_exclusions_return_body_unchanged() {
        let body = lines("message A {\n}");
        let kept = filter_excluded_definitions(&body, &Exclusions::default());
        assert_eq!(kept, body);
    }
}
