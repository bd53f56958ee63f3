//! Synchronization of merged BanyanDB schema files from upstream.
//!
//! Each configured module is fetched from the upstream repository (or a local
//! checkout), merged with [`proto_merge_core`], and written to
//! `<output_dir>/<root>/<version>/<root>-<module>.proto` when its content
//! changed. Modules are independent and run in parallel.
//!
//! # Quick start
//!
//! ```no_run
//! use proto_merge_sync::{DirectoryFetcher, SyncConfig, SyncOptions, sync_modules};
//!
//! let config = SyncConfig::default();
//! let fetcher = DirectoryFetcher::new("../skywalking-banyandb", &config);
//! let modules = config.select_modules(&[]).unwrap();
//!
//! let options = SyncOptions { dry_run: true, jobs: None };
//! for (module, result) in sync_modules(&modules, &fetcher, &config, options).unwrap() {
//!     match result {
//!         Ok(report) => println!("{module}: {:?}", report.status),
//!         Err(err) => eprintln!("{module}: {err}"),
//!     }
//! }
//! ```

mod config;
mod error;
mod fetch;
mod sync;

pub use config::{FileSelector, ModuleSpec, SyncConfig};
pub use error::{Result, SyncError};
pub use fetch::{ContentFetcher, DirectoryFetcher, FALLBACK_FILES, GithubFetcher};
pub use sync::{ModuleReport, SyncOptions, SyncStatus, sync_module, sync_modules};
