//! Error types for the idempotency rewriter.

use std::path::PathBuf;

/// Errors raised while running the rewriter over a migrations directory.
#[derive(Debug, thiserror::Error)]
pub enum IdempotentError {
    /// The configured migrations directory does not exist.
    #[error("Migrations directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// A migration file (or the directory listing) could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rewrite rule rejected the file content.
    #[error("rule '{rule}' failed: {source}")]
    Rule {
        rule: &'static str,
        #[source]
        source: RewriteError,
    },
}

impl IdempotentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IdempotentError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised inside a single rewrite rule.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// A rule pattern could not be compiled.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, IdempotentError>;
