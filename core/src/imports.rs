//! Import rewriting, self-reference removal, and deterministic ordering.

use std::collections::BTreeSet;

use regex::{Captures, Regex};
use tracing::debug;

use crate::rules::ImportLayout;
use crate::sections::ParsedDocument;

/// Rewrites per-file import paths to merged module paths for one layout.
///
/// # Examples
///
/// ```
/// use proto_merge_core::{ImportLayout, ImportRewriter};
///
/// let layout = ImportLayout::default();
/// let rewriter = ImportRewriter::new(&layout);
/// assert_eq!(
///     rewriter.rewrite("import \"banyandb/model/v1/query.proto\";"),
///     "import \"banyandb/v1/banyandb-model.proto\";"
/// );
/// assert!(rewriter.is_self_import("import \"banyandb/v1/banyandb-model.proto\";", "model"));
/// ```
#[derive(Debug)]
pub struct ImportRewriter<'a> {
    layout: &'a ImportLayout,
    pattern: Option<Regex>,
}

impl<'a> ImportRewriter<'a> {
    pub fn new(layout: &'a ImportLayout) -> Self {
        let source = format!(
            r#"{root}/([^/]+)/{version}/[^"]+\.proto"#,
            root = regex::escape(&layout.root),
            version = regex::escape(&layout.version),
        );
        let pattern = match Regex::new(&source) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                debug!(
                    pattern = %source,
                    error = %err,
                    "Import pattern rejected; imports kept verbatim"
                );
                None
            }
        };
        Self { layout, pattern }
    }

    /// Replaces every `<root>/<module>/<version>/<file>.proto` path in the line
    /// with `<root>/<version>/<root>-<module>.proto`. Other text is untouched.
    pub fn rewrite(&self, line: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(line, |caps: &Captures| self.layout.merged_path(&caps[1]))
                .into_owned(),
            None => line.to_string(),
        }
    }

    /// Returns `true` if a rewritten import points at `module`'s own merged file.
    pub fn is_self_import(&self, rewritten: &str, module: &str) -> bool {
        rewritten.contains(&self.layout.merged_path(module))
    }
}

/// Rewrites the paths of one import line. Prefer [`ImportRewriter`] when
/// rewriting many lines with the same layout.
pub fn rewrite_import(line: &str, layout: &ImportLayout) -> String {
    ImportRewriter::new(layout).rewrite(line)
}

/// Unions the imports of all documents into the merged import block.
///
/// Each line is trimmed and rewritten, self-imports of `module` are dropped,
/// duplicates collapse, and the result is ordered by
/// [`ImportLayout::priority_tier`] and then by full line text.
///
/// # Examples
///
/// ```
/// use proto_merge_core::{ImportLayout, ParsedDocument, collect_imports};
///
/// let first = ParsedDocument {
///     imports: vec![
///         "import \"validate/validate.proto\";".into(),
///         "import \"banyandb/measure/v1/write.proto\";".into(),
///     ],
///     ..ParsedDocument::default()
/// };
/// let second = ParsedDocument {
///     imports: vec![
///         "import \"banyandb/common/v1/common.proto\";".into(),
///         "import \"google/protobuf/timestamp.proto\";".into(),
///     ],
///     ..ParsedDocument::default()
/// };
///
/// let imports = collect_imports(&[first, second], "measure", &ImportLayout::default());
/// assert_eq!(
///     imports,
///     vec![
///         "import \"google/protobuf/timestamp.proto\";",
///         "import \"validate/validate.proto\";",
///         "import \"banyandb/v1/banyandb-common.proto\";",
///     ]
/// );
/// ```
pub fn collect_imports(
    documents: &[ParsedDocument],
    module: &str,
    layout: &ImportLayout,
) -> Vec<String> {
    let rewriter = ImportRewriter::new(layout);
    let mut unique: BTreeSet<String> = BTreeSet::new();

    for line in documents.iter().flat_map(|doc| doc.imports.iter()) {
        let rewritten = rewriter.rewrite(line.trim());
        if rewriter.is_self_import(&rewritten, module) {
            debug!(module, import = %rewritten, "Dropping self-import");
            continue;
        }
        unique.insert(rewritten);
    }

    let mut imports: Vec<String> = unique.into_iter().collect();
    imports.sort_by_cached_key(|line| (layout.priority_tier(line), line.clone()));
    imports
}
