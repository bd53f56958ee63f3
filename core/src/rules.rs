//! Immutable configuration consumed by every merge pass.
//!
//! [`MergeRules`] bundles the skip patterns, the package-scoped option
//! keyword, the import layout, and the header policy. [`Exclusions`] names the
//! definitions dropped from one module. Both deserialize from YAML with every
//! field optional; missing fields fall back to the upstream BanyanDB setup.
//!
//! # Example
//!
//! ```
//! use proto_merge_core::{HeaderPolicy, MergeRules};
//!
//! let rules = MergeRules::default();
//! assert_eq!(rules.package_option, "option java_package");
//! assert_eq!(rules.imports.merged_path("measure"), "banyandb/v1/banyandb-measure.proto");
//! assert_eq!(rules.header_policy, HeaderPolicy::FirstWins);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Patterns for lines dropped while parsing and filtering bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipRules {
    /// Trimmed lines starting with any of these are dropped.
    pub line_prefixes: Vec<String>,
    /// Trimmed lines containing any of these are dropped.
    pub line_contains: Vec<String>,
    /// Markers of option statements that may span several lines. The whole
    /// brace-balanced statement is dropped.
    pub option_blocks: Vec<String>,
    /// Import lines containing any of these are dropped.
    pub import_contains: Vec<String>,
}

impl Default for SkipRules {
    fn default() -> Self {
        Self {
            line_prefixes: vec!["option go_package".to_string()],
            line_contains: vec![
                "option (grpc.gateway.protoc_gen_openapiv2.options.openapiv2_swagger)".to_string(),
            ],
            option_blocks: vec!["option (google.api.http)".to_string()],
            import_contains: vec![
                "google/api/annotations.proto".to_string(),
                "protoc-gen-openapiv2/options/annotations.proto".to_string(),
            ],
        }
    }
}

impl SkipRules {
    /// Returns `true` if a trimmed line matches a prefix or substring rule.
    pub fn skips_line(&self, trimmed: &str) -> bool {
        non_empty(&self.line_prefixes).any(|prefix| trimmed.starts_with(prefix))
            || non_empty(&self.line_contains).any(|pattern| trimmed.contains(pattern))
    }

    /// Returns `true` if a trimmed line carries an option-block marker.
    pub fn is_option_block(&self, trimmed: &str) -> bool {
        non_empty(&self.option_blocks).any(|marker| trimmed.contains(marker))
    }

    /// Returns `true` if an import line references a forbidden file.
    pub fn is_forbidden_import(&self, line: &str) -> bool {
        non_empty(&self.import_contains).any(|pattern| line.contains(pattern))
    }
}

fn non_empty(patterns: &[String]) -> impl Iterator<Item = &str> {
    patterns
        .iter()
        .map(String::as_str)
        .filter(|pattern| !pattern.is_empty())
}

/// Naming convention of the merged files and ordering of the import block.
///
/// Imports of the form `<root>/<module>/<version>/<file>.proto` are rewritten
/// to `<root>/<version>/<root>-<module>.proto`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLayout {
    pub root: String,
    pub version: String,
    /// Import families in rank order. An import belongs to the first family
    /// whose substring it contains; imports matching none rank last.
    pub priority: Vec<String>,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            root: "banyandb".to_string(),
            version: "v1".to_string(),
            priority: vec!["google/".to_string(), "validate/".to_string()],
        }
    }
}

impl ImportLayout {
    /// Canonical merged path for a module, e.g. `banyandb/v1/banyandb-common.proto`.
    pub fn merged_path(&self, module: &str) -> String {
        format!(
            "{root}/{version}/{root}-{module}.proto",
            root = self.root,
            version = self.version
        )
    }

    /// Rank of an import line; lower sorts first.
    pub fn priority_tier(&self, line: &str) -> usize {
        self.priority
            .iter()
            .position(|family| line.contains(family.as_str()))
            .unwrap_or(self.priority.len())
    }
}

/// What to do when merged documents disagree on a header line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderPolicy {
    /// Keep the first document's header and discard the rest.
    #[default]
    FirstWins,
    /// Keep the first document's header and log each disagreement.
    Warn,
    /// Treat a disagreement as an error in
    /// [`try_merge_documents`](crate::try_merge_documents).
    Reject,
}

/// Definition names removed from one module's merged output.
///
/// # Examples
///
/// ```
/// use proto_merge_core::Exclusions;
///
/// let exclusions = Exclusions::new(["InternalWriteRequest"], ["DeleteExpiredSegments"]);
/// assert!(exclusions.excludes_message("InternalWriteRequest"));
/// assert!(exclusions.excludes_rpc("DeleteExpiredSegments"));
/// assert!(!exclusions.excludes_rpc("Write"));
/// assert!(Exclusions::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exclusions {
    pub messages: BTreeSet<String>,
    pub rpcs: BTreeSet<String>,
}

impl Exclusions {
    pub fn new<M, R>(messages: M, rpcs: R) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            rpcs: rpcs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.rpcs.is_empty()
    }

    pub fn excludes_message(&self, name: &str) -> bool {
        self.messages.contains(name)
    }

    pub fn excludes_rpc(&self, name: &str) -> bool {
        self.rpcs.contains(name)
    }
}

/// Complete configuration of one merge invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeRules {
    pub skip: SkipRules,
    /// Prefix of the package-scoped option kept in the header.
    pub package_option: String,
    pub imports: ImportLayout,
    pub header_policy: HeaderPolicy,
}

impl Default for MergeRules {
    fn default() -> Self {
        Self {
            skip: SkipRules::default(),
            package_option: "option java_package".to_string(),
            imports: ImportLayout::default(),
            header_policy: HeaderPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_rules_default_patterns() {
        let skip = SkipRules::default();
        assert!(skip.skips_line("option go_package = \"github.com/x\";"));
        assert!(skip.skips_line(
            "option (grpc.gateway.protoc_gen_openapiv2.options.openapiv2_swagger) = {"
        ));
        assert!(!skip.skips_line("option java_package = \"org.apache\";"));
        assert!(skip.is_option_block("option (google.api.http) = {"));
        let annotations = "import \"google/api/annotations.proto\";";
        let timestamp = "import \"google/protobuf/timestamp.proto\";";
        assert!(skip.is_forbidden_import(annotations));
        assert!(!skip.is_forbidden_import(timestamp));
    }

    #[test]
    fn test_empty_patterns_never_match() {
        let skip = SkipRules {
            line_prefixes: vec![String::new()],
            line_contains: vec![String::new()],
            option_blocks: vec![String::new()],
            import_contains: vec![String::new()],
        };
        assert!(!skip.skips_line("message Foo {"));
        assert!(!skip.is_option_block("message Foo {"));
        assert!(!skip.is_forbidden_import("import \"a.proto\";"));
    }

    #[test]
    fn test_priority_tiers() {
        let layout = ImportLayout::default();
        let tier = |path: &str| layout.priority_tier(&format!("import \"{path}\";"));
        assert_eq!(tier("google/protobuf/timestamp.proto"), 0);
        assert_eq!(tier("validate/validate.proto"), 1);
        assert_eq!(tier("banyandb/v1/banyandb-common.proto"), 2);
    }

    #[test]
    fn test_rules_deserialize_partial_yaml() {
        let yaml = r#"
header_policy: reject
imports:
  root: skywalking
skip:
  option_blocks: ["option (x)"]
"#;
        let rules: MergeRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.header_policy, HeaderPolicy::Reject);
        assert_eq!(rules.imports.root, "skywalking");
        assert_eq!(rules.imports.version, "v1");
        assert_eq!(rules.skip.option_blocks, vec!["option (x)"]);
        assert_eq!(rules.skip.line_prefixes, vec!["option go_package"]);
        assert_eq!(rules.package_option, "option java_package");
    }

    #[test]
    fn test_exclusions_deserialize() {
        let yaml = "messages: [A, B]\n";
        let exclusions: Exclusions = serde_yaml::from_str(yaml).unwrap();
        assert!(exclusions.excludes_message("A"));
        assert!(exclusions.rpcs.is_empty());
        assert!(!exclusions.is_empty());
    }
}
