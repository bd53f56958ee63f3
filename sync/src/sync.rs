//! Per-module sync: fetch, merge, compare, write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use proto_merge_core::try_merge_documents;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{FileSelector, ModuleSpec, SyncConfig};
use crate::error::Result;
use crate::fetch::ContentFetcher;

/// State of a module's output file relative to the merged text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// No output file existed.
    Created,
    /// The output file differed from the merged text.
    Updated,
    /// The output file already matched.
    Unchanged,
}

impl SyncStatus {
    pub fn is_change(self) -> bool {
        self != Self::Unchanged
    }
}

/// What happened to one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub module: String,
    /// Documents merged, in merge order.
    pub files: Vec<String>,
    pub output: PathBuf,
    pub status: SyncStatus,
    /// `false` for dry runs and unchanged files.
    pub written: bool,
}

/// Options shared by every module of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute and report without writing.
    pub dry_run: bool,
    /// Worker pool size. `None` or zero uses one worker per module.
    pub jobs: Option<usize>,
}

/// Syncs one module: resolves its file list, fetches and merges the
/// documents, and writes the result if it changed.
///
/// # Errors
///
/// Fails on the first document that cannot be listed or fetched, on a header
/// conflict under the reject policy, and on I/O errors around the output file.
pub fn sync_module(
    module: &str,
    spec: &ModuleSpec,
    fetcher: &dyn ContentFetcher,
    config: &SyncConfig,
    dry_run: bool,
) -> Result<ModuleReport> {
    let files = match &spec.files {
        FileSelector::All => fetcher.list_files(module)?,
        FileSelector::Files(files) => files.clone(),
    };
    debug!(module, files = ?files, "Resolved module files");

    let documents = files
        .iter()
        .map(|filename| fetcher.fetch_file(module, filename))
        .collect::<Result<Vec<String>>>()?;

    if !spec.exclude.is_empty() {
        debug!(
            module,
            messages = spec.exclude.messages.len(),
            rpcs = spec.exclude.rpcs.len(),
            "Applying exclusions"
        );
    }
    let merged = try_merge_documents(&documents, module, &spec.exclude, &config.rules)?;

    let output = config.output_path(module);
    let status = compare_with_existing(&output, &merged)?;
    let written = status.is_change() && !dry_run;
    if written {
        write_output(&output, &merged)?;
    }
    info!(module, status = ?status, written, output = %output.display(), "Module synced");

    Ok(ModuleReport {
        module: module.to_string(),
        files,
        output,
        status,
        written,
    })
}

/// Syncs modules in parallel. One result per module, sorted by module name;
/// a failing module does not stop the others.
///
/// # Errors
///
/// Returns [`ThreadPool`](crate::SyncError::ThreadPool) if the worker pool
/// cannot be built. Per-module failures are in the returned results.
pub fn sync_modules(
    modules: &[(String, ModuleSpec)],
    fetcher: &dyn ContentFetcher,
    config: &SyncConfig,
    options: SyncOptions,
) -> Result<Vec<(String, Result<ModuleReport>)>> {
    use rayon::prelude::*;

    let jobs = options
        .jobs
        .filter(|jobs| *jobs > 0)
        .unwrap_or(modules.len())
        .max(1);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let mut results: Vec<(String, Result<ModuleReport>)> = pool.install(|| {
        modules
            .par_iter()
            .map(|(module, spec)| {
                let result = sync_module(module, spec, fetcher, config, options.dry_run);
                (module.clone(), result)
            })
            .collect()
    });

    // Sort by module name for deterministic output.
    results.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(results)
}

fn compare_with_existing(output: &Path, merged: &str) -> Result<SyncStatus> {
    match std::fs::read_to_string(output) {
        Ok(existing) if existing == merged => Ok(SyncStatus::Unchanged),
        Ok(_) => Ok(SyncStatus::Updated),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(SyncStatus::Created),
        Err(err) => Err(err.into()),
    }
}

fn write_output(output: &Path, merged: &str) -> Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, merged)?;
    Ok(())
}
