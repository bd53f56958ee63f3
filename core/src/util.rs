//! Line classification helpers shared by the merge passes.
//!
//! Every pass works on trimmed lines and a flat brace counter. Braces inside
//! string literals or comments are counted like any other brace; definition
//! blocks in practice never contain them, and the engine does not tokenize.

use regex::Regex;
use std::sync::LazyLock;

pub(crate) const SYNTAX_KEYWORD: &str = "syntax =";
pub(crate) const PACKAGE_KEYWORD: &str = "package ";
pub(crate) const IMPORT_KEYWORD: &str = "import ";
pub(crate) const MESSAGE_KEYWORD: &str = "message ";
pub(crate) const RPC_KEYWORD: &str = "rpc ";
pub(crate) const SERVICE_KEYWORD: &str = "service ";

// SAFETY: These regexes are compile-time constants and are validated by tests.
static MESSAGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^message\s+(\w+)").expect("static regex must compile"));
static RPC_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rpc\s+(\w+)").expect("static regex must compile"));

/// Net brace balance of a line: `{` count minus `}` count.
pub(crate) fn brace_delta(text: &str) -> i64 {
    text.chars().fold(0, |depth, ch| match ch {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// `rpc Name(Req) returns (Res) {` style opener of a method block.
pub(crate) fn is_rpc_opener(trimmed: &str) -> bool {
    trimmed.contains(RPC_KEYWORD) && trimmed.ends_with('{')
}

/// Returns `true` for lines that begin another top-level or service-level
/// definition.
pub(crate) fn starts_definition(trimmed: &str) -> bool {
    trimmed.starts_with(RPC_KEYWORD)
        || trimmed.starts_with(SERVICE_KEYWORD)
        || trimmed.starts_with(MESSAGE_KEYWORD)
}

/// Turns a block opener into a terminated one-line declaration, keeping its
/// indentation: `  rpc A(B) returns (C) {` becomes `  rpc A(B) returns (C);`.
pub(crate) fn terminate_declaration(opener: &str) -> String {
    let head = opener.trim_end().trim_end_matches('{').trim_end();
    format!("{head};")
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Returns `true` if a bare `}` after a block opener sits shallower than the
/// opener, meaning it closes an enclosing block rather than the opener's own.
pub(crate) fn closes_enclosing_block(opener: &str, closer: &str) -> bool {
    indent_width(closer) < indent_width(opener)
}

pub(crate) fn message_name(trimmed: &str) -> Option<&str> {
    MESSAGE_NAME_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub(crate) fn rpc_name(trimmed: &str) -> Option<&str> {
    RPC_NAME_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Slice of `lines` without leading and trailing blank lines.
pub(crate) fn trim_blank_edges(lines: &[String]) -> &[String] {
    let start = lines
        .iter()
        .position(|line| !is_blank(line))
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !is_blank(line))
        .map_or(start, |idx| idx + 1);
    &lines[start..end]
}
