//! Retrieval of upstream module documents.
//!
//! Upstream keeps one directory per module,
//! `<remote_path>/<module>/<version>/*.proto`. [`GithubFetcher`] reads it over
//! HTTP; [`DirectoryFetcher`] reads the same layout from a local checkout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// File names probed when the directory listing API is unavailable.
pub const FALLBACK_FILES: &[&str] = &[
    "rpc.proto",
    "write.proto",
    "query.proto",
    "schema.proto",
    "topn.proto",
    "model.proto",
    "common.proto",
];

const PROTO_EXTENSION: &str = ".proto";
const USER_AGENT: &str = concat!("proto-sync/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of raw module documents. Shared across sync workers.
pub trait ContentFetcher: Send + Sync {
    /// Returns the sorted `.proto` file names of `module`.
    ///
    /// # Errors
    ///
    /// Returns [`Listing`](SyncError::Listing) if no file could be found.
    fn list_files(&self, module: &str) -> Result<Vec<String>>;

    /// Returns the raw text of one document.
    ///
    /// # Errors
    ///
    /// Returns [`Fetch`](SyncError::Fetch) if the document cannot be read.
    fn fetch_file(&self, module: &str, filename: &str) -> Result<String>;
}

/// Entry of a GitHub contents API directory response.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
}

/// Fetches documents from a GitHub repository.
#[derive(Debug, Clone)]
pub struct GithubFetcher {
    client: Client,
    repository: String,
    branch: String,
    remote_path: String,
    version: String,
}

impl GithubFetcher {
    /// Builds a fetcher for the repository, branch, and layout in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Http`](SyncError::Http) if the HTTP client cannot be built.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            repository: config.repository.clone(),
            branch: config.branch.clone(),
            remote_path: config.remote_path.clone(),
            version: config.rules.imports.version.clone(),
        })
    }

    pub fn api_url(&self, module: &str) -> String {
        format!(
            "https://api.github.com/repos/{}/contents/{}/{module}/{}?ref={}",
            self.repository, self.remote_path, self.version, self.branch
        )
    }

    pub fn raw_url(&self, module: &str, filename: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{module}/{}/{filename}",
            self.repository, self.branch, self.remote_path, self.version
        )
    }

    fn list_via_api(&self, module: &str) -> Result<Vec<String>> {
        let entries: Vec<ContentEntry> = self
            .client
            .get(self.api_url(module))
            .header(ACCEPT, "application/vnd.github+json")
            .send()?
            .error_for_status()?
            .json()?;
        Ok(proto_names(entries.into_iter().map(|entry| entry.name)))
    }

    fn probe_fallback_files(&self, module: &str) -> Vec<String> {
        let found = FALLBACK_FILES.iter().filter(|filename| {
            let url = self.raw_url(module, filename);
            match self.client.head(&url).send() {
                Ok(response) => response.status() == StatusCode::OK,
                Err(err) => {
                    debug!(%url, error = %err, "Probe failed");
                    false
                }
            }
        });
        proto_names(found.map(|filename| filename.to_string()))
    }
}

impl ContentFetcher for GithubFetcher {
    fn list_files(&self, module: &str) -> Result<Vec<String>> {
        match self.list_via_api(module) {
            Ok(files) => Ok(files),
            Err(err) => {
                warn!(module, error = %err, "Directory listing failed, probing common file names");
                let files = self.probe_fallback_files(module);
                if files.is_empty() {
                    return Err(SyncError::Listing {
                        module: module.to_string(),
                        reason: format!("listing failed ({err}) and no known file name exists"),
                    });
                }
                Ok(files)
            }
        }
    }

    fn fetch_file(&self, module: &str, filename: &str) -> Result<String> {
        let url = self.raw_url(module, filename);
        debug!(module, %url, "Fetching document");
        let fetch_error = |err: reqwest::Error| SyncError::Fetch {
            module: module.to_string(),
            file: filename.to_string(),
            reason: err.to_string(),
        };
        self.client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(fetch_error)
    }
}

/// Reads documents from a local checkout of the upstream repository.
///
/// # Examples
///
/// ```no_run
/// use proto_merge_sync::{ContentFetcher, DirectoryFetcher, SyncConfig};
///
/// let fetcher = DirectoryFetcher::new("../skywalking-banyandb", &SyncConfig::default());
/// let files = fetcher.list_files("measure").unwrap();
/// let first = fetcher.fetch_file("measure", &files[0]).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
    remote_path: String,
    version: String,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>, config: &SyncConfig) -> Self {
        Self {
            root: root.into(),
            remote_path: config.remote_path.clone(),
            version: config.rules.imports.version.clone(),
        }
    }

    pub fn module_dir(&self, module: &str) -> PathBuf {
        self.root
            .join(&self.remote_path)
            .join(module)
            .join(&self.version)
    }
}

impl ContentFetcher for DirectoryFetcher {
    fn list_files(&self, module: &str) -> Result<Vec<String>> {
        let dir = self.module_dir(module);
        let listing_error = |reason: String| SyncError::Listing {
            module: module.to_string(),
            reason,
        };

        let io_error = |err: std::io::Error| listing_error(format!("{}: {err}", dir.display()));

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            if entry.file_type().is_ok_and(|kind| kind.is_file()) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        let files = proto_names(names);
        if files.is_empty() {
            let reason = format!("no .proto files in {}", dir.display());
            return Err(listing_error(reason));
        }
        Ok(files)
    }

    fn fetch_file(&self, module: &str, filename: &str) -> Result<String> {
        let path = self.module_dir(module).join(filename);
        read_document(&path).map_err(|err| SyncError::Fetch {
            module: module.to_string(),
            file: filename.to_string(),
            reason: err.to_string(),
        })
    }
}

fn read_document(path: &Path) -> std::io::Result<String> {
    debug!(path = %path.display(), "Reading document");
    std::fs::read_to_string(path)
}

/// Keeps `.proto` names, sorted.
fn proto_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut files: Vec<String> = names
        .into_iter()
        .filter(|name| name.ends_with(PROTO_EXTENSION))
        .collect();
    files.sort();
    files
}
