//! File and directory processing.
//!
//! Each migration file is read once, rewritten in memory and written back at
//! most once. Per-file failures are recorded in the [`Summary`] and never stop
//! the batch; only a missing directory or an unreadable listing is fatal.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IdempotentError, Result};
use crate::rules::Pipeline;

/// What happened to a single migration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Content changed (and was written, unless dry-running).
    Modified { rules: Vec<&'static str> },
    Unchanged,
    /// Read, rewrite, or write failed; the file was left as it was.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Aggregate result of a directory run.
///
/// `unchanged` counts every file that was not modified, failed ones included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
}

impl Summary {
    fn record(&mut self, report: FileReport) {
        self.total += 1;
        match report.outcome {
            FileOutcome::Modified { .. } => self.modified += 1,
            FileOutcome::Unchanged => self.unchanged += 1,
            FileOutcome::Failed { .. } => {
                self.unchanged += 1;
                self.failed += 1;
            }
        }
        self.files.push(report);
    }
}

/// Applies a [`Pipeline`] to migration files on disk.
pub struct Rewriter {
    pipeline: Pipeline,
    dry_run: bool,
}

impl Rewriter {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            dry_run: false,
        }
    }

    /// Run the pipeline without writing anything back.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Rewrite one file in place. Returns whether the file was (or, when
    /// dry-running, would be) written.
    pub fn process(&self, path: &Path) -> Result<bool> {
        self.rewrite_file(path).map(|rules| !rules.is_empty())
    }

    /// Returns the names of the rules that changed the file.
    fn rewrite_file(&self, path: &Path) -> Result<Vec<&'static str>> {
        let content = fs::read_to_string(path).map_err(|e| IdempotentError::io(path, e))?;
        let rewritten = self.pipeline.run(&content)?;

        if rewritten.changed() && !self.dry_run {
            fs::write(path, &rewritten.sql).map_err(|e| IdempotentError::io(path, e))?;
        }

        Ok(rewritten.applied)
    }

    /// Process every migration in `dir`, in file-name order.
    pub fn run_dir(&self, dir: &Path, extension: &str) -> Result<Summary> {
        self.run_dir_with(dir, extension, |_| {})
    }

    /// Like [`Rewriter::run_dir`], calling `on_file` as each file finishes.
    pub fn run_dir_with(
        &self,
        dir: &Path,
        extension: &str,
        mut on_file: impl FnMut(&FileReport),
    ) -> Result<Summary> {
        let files = migration_files(dir, extension)?;
        let mut summary = Summary {
            dry_run: self.dry_run,
            ..Summary::default()
        };

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let outcome = match self.rewrite_file(&path) {
                Ok(rules) if rules.is_empty() => FileOutcome::Unchanged,
                Ok(rules) => FileOutcome::Modified { rules },
                Err(err) => {
                    tracing::warn!(file = %name, error = %err, "failed to process migration");
                    FileOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };

            let report = FileReport {
                name,
                path,
                outcome,
            };
            on_file(&report);
            summary.record(report);
        }

        Ok(summary)
    }
}

/// List files in `dir` with the given extension, sorted by file name.
///
/// A path that exists but is not a directory holds no migrations.
pub fn migration_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(IdempotentError::MissingDirectory(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "migrations path is not a directory");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| IdempotentError::io(dir, e))? {
        let path = entry.map_err(|e| IdempotentError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
