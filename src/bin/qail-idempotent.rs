//! qail-idempotent CLI
//!
//! ```bash
//! # rewrite infrastructure/migrations/adapted/*.sql in place
//! qail-idempotent
//!
//! # preview another directory
//! qail-idempotent --dir db/migrations --dry-run
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use qail_idempotent::{Config, IdempotentError, Pipeline, Rewriter, report};

#[derive(Parser)]
#[command(name = "qail-idempotent")]
#[command(about = "Make SQL migrations safe to re-run", long_about = None)]
#[command(version)]
struct Cli {
    /// Migrations directory (overrides the config file)
    #[arg(short, long, env = "QAIL_MIGRATIONS_DIR")]
    dir: Option<PathBuf>,

    /// Config file (default: ./qail-idempotent.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "ERROR:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("QAIL_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.dir {
        config.migrations_dir = dir.clone();
    }
    tracing::debug!(?config, "resolved configuration");

    let pipeline = Pipeline::new(&config.schema).context("Failed to build rewrite rules")?;
    let rewriter = Rewriter::new(pipeline).dry_run(cli.dry_run);

    if !cli.json {
        report::print_header(&config.migrations_dir, cli.dry_run);
    }

    let result = rewriter.run_dir_with(&config.migrations_dir, &config.extension, |file| {
        if !cli.json {
            report::print_file(file, cli.dry_run);
        }
    });

    let summary = match result {
        Ok(summary) => summary,
        Err(IdempotentError::MissingDirectory(dir)) => {
            report::print_missing_directory(&dir);
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err).context("Failed to list migrations"),
    };

    if cli.json {
        println!("{}", report::to_json(&summary)?);
    } else {
        report::print_summary(&summary);
    }

    Ok(ExitCode::SUCCESS)
}
