//! Sync configuration: upstream location, output directory, module table,
//! and merge rules.
//!
//! Every field is optional in YAML; anything missing falls back to the
//! built-in BanyanDB setup returned by [`SyncConfig::default`].
//!
//! # Example YAML
//!
//! ```yaml
//! repository: apache/skywalking-banyandb
//! branch: main
//! remote_path: api/proto/banyandb
//! output_dir: proto
//! modules:
//!   common:
//!     files: all
//!   property:
//!     files: [property.proto, rpc.proto]
//!     exclude:
//!       messages: [InternalUpdateRequest, InternalDeleteRequest]
//! rules:
//!   header_policy: warn
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use proto_merge_core::{Exclusions, MergeRules};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Which upstream documents make up a module.
///
/// Serialized as the keyword `all` or as a list of file names.
///
/// # Examples
///
/// ```
/// use proto_merge_sync::FileSelector;
///
/// let all: FileSelector = serde_yaml::from_str("all").unwrap();
/// assert_eq!(all, FileSelector::All);
///
/// let listed: FileSelector = serde_yaml::from_str("[schema.proto, rpc.proto]").unwrap();
/// assert_eq!(listed, FileSelector::Files(vec!["schema.proto".into(), "rpc.proto".into()]));
///
/// assert!(serde_yaml::from_str::<FileSelector>("some").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SelectorRepr", into = "SelectorRepr")]
pub enum FileSelector {
    /// Every `.proto` file the fetcher lists, in sorted order.
    #[default]
    All,
    /// These files, in this order.
    Files(Vec<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    Keyword(String),
    Files(Vec<String>),
}

impl TryFrom<SelectorRepr> for FileSelector {
    type Error = String;

    fn try_from(repr: SelectorRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            SelectorRepr::Keyword(word) if word == "all" => Ok(Self::All),
            SelectorRepr::Keyword(word) => Err(format!(
                "expected `all` or a list of file names, found `{word}`"
            )),
            SelectorRepr::Files(files) => Ok(Self::Files(files)),
        }
    }
}

impl From<FileSelector> for SelectorRepr {
    fn from(selector: FileSelector) -> Self {
        match selector {
            FileSelector::All => Self::Keyword("all".to_string()),
            FileSelector::Files(files) => Self::Files(files),
        }
    }
}

/// Per-module settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSpec {
    pub files: FileSelector,
    /// Definitions dropped from this module's merged output.
    pub exclude: Exclusions,
}

impl ModuleSpec {
    fn listed(files: &[&str]) -> Self {
        Self {
            files: FileSelector::Files(files.iter().map(|f| f.to_string()).collect()),
            exclude: Exclusions::default(),
        }
    }

    fn all_excluding(messages: &[&str], rpcs: &[&str]) -> Self {
        Self {
            files: FileSelector::All,
            exclude: Exclusions::new(messages.iter().copied(), rpcs.iter().copied()),
        }
    }
}

/// Top-level sync configuration.
///
/// # Examples
///
/// ```
/// use proto_merge_sync::{FileSelector, SyncConfig};
///
/// let config = SyncConfig::default();
/// assert_eq!(config.repository, "apache/skywalking-banyandb");
/// assert_eq!(config.modules.len(), 7);
/// assert_eq!(config.modules["common"].files, FileSelector::All);
/// assert!(config.modules["stream"].exclude.excludes_rpc("DeleteExpiredSegments"));
/// assert_eq!(
///     config.output_path("trace"),
///     std::path::Path::new("proto/banyandb/v1/banyandb-trace.proto")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// GitHub `owner/name` of the upstream repository.
    pub repository: String,
    /// Branch or tag to sync from.
    pub branch: String,
    /// Directory holding the module directories, relative to the repository
    /// root.
    pub remote_path: String,
    /// Directory the merged files are written under.
    pub output_dir: PathBuf,
    pub modules: BTreeMap<String, ModuleSpec>,
    pub rules: MergeRules,
}

const DELETE_SEGMENTS_MESSAGES: &[&str] = &[
    "DeleteExpiredSegmentsRequest",
    "DeleteExpiredSegmentsResponse",
    "InternalWriteRequest",
];

impl Default for SyncConfig {
    fn default() -> Self {
        let mut modules = BTreeMap::new();
        modules.insert("common".to_string(), ModuleSpec::default());
        modules.insert(
            "database".to_string(),
            ModuleSpec::listed(&["schema.proto", "rpc.proto"]),
        );
        modules.insert("model".to_string(), ModuleSpec::default());
        modules.insert(
            "property".to_string(),
            ModuleSpec {
                exclude: Exclusions::new(
                    [
                        "InternalUpdateRequest",
                        "InternalDeleteRequest",
                        "InternalQueryResponse",
                        "InternalRepairRequest",
                        "InternalRepairResponse",
                    ],
                    Vec::<String>::new(),
                ),
                ..ModuleSpec::listed(&["property.proto", "rpc.proto"])
            },
        );
        for module in ["measure", "stream", "trace"] {
            modules.insert(
                module.to_string(),
                ModuleSpec::all_excluding(DELETE_SEGMENTS_MESSAGES, &["DeleteExpiredSegments"]),
            );
        }

        Self {
            repository: "apache/skywalking-banyandb".to_string(),
            branch: "main".to_string(),
            remote_path: "api/proto/banyandb".to_string(),
            output_dir: PathBuf::from("proto"),
            modules,
            rules: MergeRules::default(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](SyncError::Io) if the file cannot be read, or
    /// [`Yaml`](SyncError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](SyncError::Io) if the file cannot be written, or
    /// [`Yaml`](SyncError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns the configured modules named in `names`, in name order. An
    /// empty `names` selects every module.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownModule`](SyncError::UnknownModule) for the first name
    /// that is not configured.
    pub fn select_modules(&self, names: &[String]) -> Result<Vec<(String, ModuleSpec)>> {
        if names.is_empty() {
            return Ok(self
                .modules
                .iter()
                .map(|(name, spec)| (name.clone(), spec.clone()))
                .collect());
        }

        let mut selected = BTreeMap::new();
        for name in names {
            let spec = self
                .modules
                .get(name)
                .ok_or_else(|| SyncError::UnknownModule {
                    name: name.clone(),
                    valid: self.module_names().join(", "),
                })?;
            selected.insert(name.clone(), spec.clone());
        }
        Ok(selected.into_iter().collect())
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    /// Destination of a module's merged file.
    pub fn output_path(&self, module: &str) -> PathBuf {
        self.output_dir.join(self.rules.imports.merged_path(module))
    }
}

#[cfg(test)]
mod tests {
    use proto_merge_core::HeaderPolicy;

    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
repository: example/fork
branch: release-0.8
output_dir: generated
modules:
  measure:
    files: [write.proto, rpc.proto]
    exclude:
      messages: [InternalWriteRequest]
      rpcs: [DeleteExpiredSegments]
  model:
    files: all
rules:
  header_policy: reject
"#
    }

    #[test]
    fn test_default_module_table() {
        let config = SyncConfig::default();
        let expected = "common database measure model property stream trace";
        assert_eq!(config.module_names().join(" "), expected);
        assert_eq!(
            config.modules["database"].files,
            FileSelector::Files(vec!["schema.proto".into(), "rpc.proto".into()])
        );
        assert_eq!(config.modules["property"].exclude.messages.len(), 5);
        assert!(config.modules["property"].exclude.rpcs.is_empty());
        for module in ["measure", "stream", "trace"] {
            let exclude = &config.modules[module].exclude;
            assert!(exclude.excludes_message("InternalWriteRequest"));
            assert!(exclude.excludes_rpc("DeleteExpiredSegments"));
        }
        assert!(config.modules["common"].exclude.is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SyncConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.repository, "example/fork");
        assert_eq!(config.branch, "release-0.8");
        assert_eq!(config.remote_path, "api/proto/banyandb");
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert_eq!(config.module_names(), vec!["measure", "model"]);
        assert_eq!(config.rules.header_policy, HeaderPolicy::Reject);
        assert_eq!(config.rules.package_option, "option java_package");
        assert!(config.modules["model"].exclude.is_empty());
    }

    #[test]
    fn test_module_without_fields_selects_all() {
        let config: SyncConfig = serde_yaml::from_str("modules:\n  common: {}\n").unwrap();
        assert_eq!(config.modules["common"], ModuleSpec::default());
    }

    #[test]
    fn test_invalid_file_selector_rejected() {
        let result = serde_yaml::from_str::<SyncConfig>("modules:\n  common:\n    files: every\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_select_modules() {
        let config = SyncConfig::default();
        assert_eq!(config.select_modules(&[]).unwrap().len(), 7);

        let names = ["trace", "common", "trace"].map(String::from);
        let selected = config.select_modules(&names).unwrap();
        let selected: Vec<&str> = selected.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(selected, vec!["common", "trace"]);
    }

    #[test]
    fn test_select_unknown_module() {
        let config = SyncConfig::default();
        let err = config.select_modules(&["metrics".to_string()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown module 'metrics' \
             (valid modules: common, database, measure, model, property, stream, trace)"
        );
    }

    #[test]
    fn test_output_path_follows_layout() {
        let mut config = SyncConfig::default();
        config.output_dir = PathBuf::from("out");
        config.rules.imports.root = "acme".to_string();
        config.rules.imports.version = "v2".to_string();
        assert_eq!(
            config.output_path("stream"),
            PathBuf::from("out/acme/v2/acme-stream.proto")
        );
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.yml");

        let original: SyncConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = SyncConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SyncConfig::load("/nonexistent/sync.yml").unwrap_err();
        assert!(matches!(err, SyncError::Io(_)));
    }
}
