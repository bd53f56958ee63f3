//! Normalization of empty RPC blocks.

use crate::util::{closes_enclosing_block, is_blank, is_rpc_opener, terminate_declaration};

/// Rewrites `rpc ... {` followed only by blank lines and a bare `}` into a
/// single terminated declaration. A `}` indented less than the opener closes
/// an enclosing block and is left alone.
///
/// Runs after exclusion and annotation stripping so blocks emptied by earlier
/// passes end up in the same one-line form.
///
/// # Examples
///
/// ```
/// use proto_merge_core::collapse_empty_rpc_blocks;
///
/// let body: Vec<String> = ["  rpc Write(WriteRequest) returns (WriteResponse) {", "", "  }"]
///     .into_iter()
///     .map(String::from)
///     .collect();
/// assert_eq!(
///     collapse_empty_rpc_blocks(&body),
///     vec!["  rpc Write(WriteRequest) returns (WriteResponse);"]
/// );
/// ```
pub fn collapse_empty_rpc_blocks(body: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(body.len());
    let mut idx = 0;

    while idx < body.len() {
        let line = &body[idx];
        if is_rpc_opener(line.trim()) {
            let next = body[idx + 1..]
                .iter()
                .position(|inner| !is_blank(inner))
                .map(|offset| idx + 1 + offset);
            let own_closer = next.filter(|&closer| {
                body[closer].trim() == "}" && !closes_enclosing_block(line, &body[closer])
            });
            if let Some(closer) = own_closer {
                out.push(terminate_declaration(line));
                idx = closer + 1;
                continue;
            }
        }

        out.push(line.clone());
        idx += 1;
    }

    out
}
