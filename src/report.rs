//! Console output for a rewrite run.

use colored::*;
use std::path::Path;

use crate::processor::{FileOutcome, FileReport, Summary};

pub fn print_header(dir: &Path, dry_run: bool) {
    if dry_run {
        println!("{}", "Making all migrations idempotent (dry-run)...".cyan().bold());
    } else {
        println!("{}", "Making all migrations idempotent...".cyan().bold());
    }
    println!("Processing migrations in: {}", dir.display().to_string().yellow());
    println!();
}

pub fn print_file(report: &FileReport, dry_run: bool) {
    println!("{}", file_line(report, dry_run));
}

/// One trace line, e.g. `Processing: 001_init.sql ✓ Modified`.
pub fn file_line(report: &FileReport, dry_run: bool) -> String {
    let status = match &report.outcome {
        FileOutcome::Modified { .. } if dry_run => "✓ Would modify".green().to_string(),
        FileOutcome::Modified { .. } => "✓ Modified".green().to_string(),
        FileOutcome::Unchanged => "- No changes needed".dimmed().to_string(),
        FileOutcome::Failed { error } => format!("{} {}", "✗ Error:".red(), error),
    };
    format!("Processing: {} {}", report.name, status)
}

pub fn print_summary(summary: &Summary) {
    println!();
    for line in summary_lines(summary) {
        println!("{}", line);
    }
    println!();
    if summary.dry_run {
        println!("{} Run without --dry-run to write changes.", "💡".yellow());
    } else {
        println!("{}", "Done! All migrations should now be idempotent.".green().bold());
    }
}

pub fn summary_lines(summary: &Summary) -> Vec<String> {
    let mut lines = vec![
        "Summary:".bold().to_string(),
        format!("  Total files: {}", summary.total),
        format!("  Modified: {}", summary.modified.to_string().green()),
        format!("  Unchanged: {}", summary.unchanged),
    ];
    if summary.failed > 0 {
        lines.push(format!("  Errors: {}", summary.failed.to_string().red()));
    }
    lines
}

pub fn print_missing_directory(dir: &Path) {
    eprintln!(
        "{} Migrations directory not found: {}",
        "ERROR:".red().bold(),
        dir.display()
    );
}

pub fn to_json(summary: &Summary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}
