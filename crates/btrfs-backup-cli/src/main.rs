mod commands;
mod logging;
mod progress;
mod report;

use std::io::{self, Write};
use std::process;

use anyhow::Context;
use btrfs_backup_core::config::load_configuration;
use btrfs_backup_core::executor::{execute_plan, BtrfsExecutor, DryRunExecutor};
use btrfs_backup_core::planner::Operation;
use btrfs_backup_core::{AppConfig, BackupEngine, SilentReporter};
use chrono::Local;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let config = load_configuration(&args.config);

    let verbose = args.verbose
        || config
            .as_ref()
            .map(|config| config.global.default_verbose)
            .unwrap_or(false);
    let _guard = logging::init_logger(verbose);

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration from {}: {}", args.config.display(), err);
            process::exit(1);
        }
    };

    if let Err(err) = run(args, config) {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(args: Cli, config: AppConfig) -> anyhow::Result<()> {
    let dry_run = args.dry_run || config.global.dry_run;

    match args.command {
        Some(Commands::Snapshot { pairs, suffix }) => {
            run_operation(config, Operation::Snapshot, pairs.name(), suffix, dry_run)
        }
        Some(Commands::Backup { pairs }) => {
            run_operation(config, Operation::Backup, pairs.name(), None, dry_run)
        }
        Some(Commands::Purge { pairs }) => {
            run_operation(config, Operation::Purge, pairs.name(), None, dry_run)
        }
        Some(Commands::Sync { pairs }) => {
            run_operation(config, Operation::Sync, pairs.name(), None, dry_run)
        }
        Some(Commands::List { pairs }) => run_list(config, pairs.name()),
        Some(Commands::PrintConfig) => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{}", rendered);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    }
}

fn run_operation(
    config: AppConfig,
    operation: Operation,
    selection: Option<&str>,
    suffix: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let engine = BackupEngine::new(config);
    let options = engine.plan_options(Local::now().naive_local(), suffix);
    let mut stdout = io::stdout().lock();

    if !dry_run {
        let summary = engine
            .run(
                selection,
                operation,
                &options,
                &BtrfsExecutor::new(),
                &CliReporter::new(),
            )
            .with_context(|| format!("{} failed", operation))?;
        report::write_summary(&mut stdout, &summary)?;
        return Ok(());
    }

    info!("{}", "DRY RUN MODE - No changes will be made".yellow());
    for pair in engine.config().select_pairs(selection)? {
        let plan = engine.plan_pair(pair, operation, &options)?;
        report::write_plan(&mut stdout, &plan)?;
        stdout.flush()?;
        execute_plan(&plan, &DryRunExecutor, &SilentReporter)?;
    }
    Ok(())
}

fn run_list(config: AppConfig, selection: Option<&str>) -> anyhow::Result<()> {
    let engine = BackupEngine::new(config);
    let now = Local::now().naive_local();
    let mut stdout = io::stdout().lock();

    for pair in engine.config().select_pairs(selection)? {
        let listing = engine
            .list_pair(pair)
            .with_context(|| format!("Failed to list pair '{}'", pair.name))?;
        report::write_listing(&mut stdout, &listing, now)?;
    }
    Ok(())
}
