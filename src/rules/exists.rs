//! `IF NOT EXISTS` guards for tables and indexes.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::RewriteRule;
use crate::error::RewriteError;

// Postgres grammar: CREATE [UNIQUE] INDEX [CONCURRENTLY] [IF NOT EXISTS] name ON ...
// Any whitespace, newlines included, may separate the keywords.
static INDEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bCREATE\s+(?:UNIQUE\s+)?INDEX\s+(?:CONCURRENTLY\s+)?((?i:IF\s+NOT\s+EXISTS)\s+)?(\S+)",
    )
    .expect("valid index pattern")
});

/// Rewrites `CREATE TABLE <schema>.<name>` to `CREATE TABLE IF NOT EXISTS <schema>.<name>`.
///
/// Only schema-qualified tables are touched; unqualified names and other
/// schemas pass through unchanged.
pub struct TableIfNotExists {
    pattern: Regex,
}

impl TableIfNotExists {
    pub fn new(schema: &str) -> Result<Self, RewriteError> {
        let pattern = Regex::new(&format!(
            r"\bCREATE TABLE ({}\.\S+)",
            regex::escape(schema)
        ))?;
        Ok(Self { pattern })
    }
}

impl RewriteRule for TableIfNotExists {
    fn name(&self) -> &'static str {
        "table_if_not_exists"
    }

    fn apply<'a>(&self, sql: &'a str) -> Result<Cow<'a, str>, RewriteError> {
        Ok(self
            .pattern
            .replace_all(sql, "CREATE TABLE IF NOT EXISTS ${1}"))
    }
}

/// Inserts `IF NOT EXISTS` after `INDEX` in `CREATE [UNIQUE] INDEX <name>`.
///
/// Nameless indexes (`CREATE INDEX ON t (...)`) cannot take the clause and
/// are skipped.
pub struct IndexIfNotExists;

impl RewriteRule for IndexIfNotExists {
    fn name(&self) -> &'static str {
        "index_if_not_exists"
    }

    fn apply<'a>(&self, sql: &'a str) -> Result<Cow<'a, str>, RewriteError> {
        let mut changed = false;
        let out = INDEX_RE.replace_all(sql, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let (Some(start), Some(name)) = (caps.get(0), caps.get(2)) else {
                return whole.to_string();
            };
            if caps.get(1).is_some() || name.as_str().eq_ignore_ascii_case("ON") {
                return whole.to_string();
            }
            changed = true;
            // keep the statement's own spacing; the clause goes right before the name
            let head = &whole[..name.start() - start.start()];
            format!("{head}IF NOT EXISTS {}", name.as_str())
        });

        if changed {
            Ok(Cow::Owned(out.into_owned()))
        } else {
            Ok(Cow::Borrowed(sql))
        }
    }
}
