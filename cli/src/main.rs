use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use proto_merge_sync::{
    ContentFetcher, DirectoryFetcher, GithubFetcher, ModuleReport, ModuleSpec, SyncConfig,
    SyncError, SyncOptions, SyncStatus, sync_modules,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Summary output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "proto-sync")]
#[command(version)]
#[command(about = "Sync and merge BanyanDB proto modules into one file per module")]
struct Cli {
    /// YAML configuration file (default: built-in BanyanDB module table).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Branch or tag to sync from (default: main).
    #[arg(long)]
    branch: Option<String>,
    /// Sync only this module. Can be given multiple times.
    #[arg(long = "module")]
    modules: Vec<String>,
    /// Preview changes without writing files.
    #[arg(long)]
    dry_run: bool,
    /// Skip the confirmation prompt.
    #[arg(long)]
    force: bool,
    /// Read modules from a local checkout instead of GitHub.
    #[arg(long)]
    source_dir: Option<PathBuf>,
    /// Directory the merged files are written under.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Number of modules synced in parallel (default: one per module).
    #[arg(long)]
    jobs: Option<usize>,
    /// Summary format.
    #[arg(long, default_value = "text")]
    format: SummaryFormat,
    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(&cli)?;
    let modules = config
        .select_modules(&cli.modules)
        .map_err(|e| e.to_string())?;
    let text = cli.format == SummaryFormat::Text;

    if text {
        print_plan(&config, &modules, &cli);
    }

    if !cli.force && !cli.dry_run && !confirm()? {
        println!("Cancelled.");
        return Ok(());
    }

    let fetcher: Box<dyn ContentFetcher> = match &cli.source_dir {
        Some(dir) => Box::new(DirectoryFetcher::new(dir, &config)),
        None => Box::new(
            GithubFetcher::new(&config)
                .map_err(|e| format!("Failed to build HTTP client: {e}"))?,
        ),
    };

    let options = SyncOptions {
        dry_run: cli.dry_run,
        jobs: cli.jobs,
    };
    let results = sync_modules(&modules, fetcher.as_ref(), &config, options)
        .map_err(|e| e.to_string())?;

    if text {
        print_text_summary(&results, cli.dry_run);
    } else {
        print_json_summary(&config, &results, cli.dry_run)?;
    }

    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    if failed > 0 {
        return Err(format!("{failed} of {} module(s) failed", results.len()));
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<SyncConfig, String> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => SyncConfig::default(),
    };
    if let Some(branch) = &cli.branch {
        config.branch = branch.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    Ok(config)
}

fn confirm() -> Result<bool, String> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Proceed with sync?")
        .default(false)
        .interact()
        .map_err(|e| format!("Confirmation prompt failed (use --force to skip it): {e}"))
}

fn print_plan(config: &SyncConfig, modules: &[(String, ModuleSpec)], cli: &Cli) {
    let source = match &cli.source_dir {
        Some(dir) => dir.display().to_string(),
        None => config.repository.clone(),
    };
    let names: Vec<&str> = modules.iter().map(|(name, _)| name.as_str()).collect();
    let mode = if cli.dry_run { "DRY RUN" } else { "LIVE" };

    println!("{}", "=== Proto File Sync ===".bold());
    println!("Source: {source}");
    println!("Branch: {}", config.branch);
    println!("Output: {}", config.output_dir.display());
    println!("Modules: {}", names.join(", "));
    println!("Mode: {mode}");
    println!();
}

fn print_text_summary(results: &[(String, Result<ModuleReport, SyncError>)], dry_run: bool) {
    println!("{}", "=== Summary ===".bold());
    for (module, result) in results {
        match result {
            Ok(report) => {
                let status = match report.status {
                    SyncStatus::Created => "CREATED".green(),
                    SyncStatus::Updated => "UPDATED".yellow(),
                    SyncStatus::Unchanged => "UNCHANGED".normal(),
                };
                println!(
                    "  {module}: {status} {} ({} file(s))",
                    report.output.display(),
                    report.files.len()
                );
            }
            Err(err) => println!("  {module}: {} {err}", "FAILED".red()),
        }
    }
    println!();

    let changed = changed_count(results);
    if dry_run {
        println!(
            "{}",
            format!("Dry run complete. {changed} file(s) would be updated.").blue()
        );
    } else {
        println!(
            "{}",
            format!("Sync complete. {changed} file(s) updated.").green()
        );
    }
}

fn print_json_summary(
    config: &SyncConfig,
    results: &[(String, Result<ModuleReport, SyncError>)],
    dry_run: bool,
) -> Result<(), String> {
    let modules: Vec<serde_json::Value> = results
        .iter()
        .map(|(module, result)| match result {
            Ok(report) => serde_json::to_value(report)
                .unwrap_or_else(|e| error_entry(module, &e)),
            Err(err) => error_entry(module, err),
        })
        .collect();

    let summary = serde_json::json!({
        "repository": config.repository,
        "branch": config.branch,
        "dry_run": dry_run,
        "changed": changed_count(results),
        "failed": results.iter().filter(|(_, result)| result.is_err()).count(),
        "modules": modules,
    });
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| format!("Failed to serialize summary: {e}"))?;
    println!("{json}");
    Ok(())
}

fn error_entry(module: &str, err: &dyn std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "module": module, "error": err.to_string() })
}

fn changed_count(results: &[(String, Result<ModuleReport, SyncError>)]) -> usize {
    results
        .iter()
        .filter(|(_, result)| {
            result
                .as_ref()
                .is_ok_and(|report| report.status.is_change())
        })
        .count()
}
