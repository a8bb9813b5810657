//! # qail-idempotent
//!
//! Rewrites SQL migration files so every schema-defining statement is safe
//! to run against a database that already has the object:
//!
//! | Statement        | Rewrite                                         |
//! |------------------|-------------------------------------------------|
//! | `CREATE POLICY`  | preceded by `DROP POLICY IF EXISTS`             |
//! | `CREATE TRIGGER` | preceded by `DROP TRIGGER IF EXISTS`            |
//! | `CREATE TABLE`   | `CREATE TABLE IF NOT EXISTS` (`public.` only)   |
//! | `CREATE INDEX`   | `CREATE [UNIQUE] INDEX IF NOT EXISTS`           |
//! | `CREATE TYPE`    | wrapped in `DO $$ ... duplicate_object ... $$`  |
//!
//! Rewriting is plain text matching; no SQL is parsed and no database is
//! touched. Running the tool on its own output changes nothing.
//!
//! ```
//! use qail_idempotent::Pipeline;
//!
//! let pipeline = Pipeline::new("public").unwrap();
//! let out = pipeline.run("CREATE TABLE public.users (id uuid);").unwrap();
//! assert_eq!(out.sql, "CREATE TABLE IF NOT EXISTS public.users (id uuid);");
//! ```

pub mod config;
pub mod error;
pub mod processor;
pub mod report;
pub mod rules;

pub use config::Config;
pub use error::{ConfigError, IdempotentError, Result, RewriteError};
pub use processor::{FileOutcome, FileReport, Rewriter, Summary};
pub use rules::{Pipeline, RewriteRule, Rewritten};
