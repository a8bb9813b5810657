//! Exception-swallowing wrapper for `CREATE TYPE ... AS ENUM`.
//!
//! Postgres has no `CREATE TYPE IF NOT EXISTS`, so each enum definition is
//! wrapped in an anonymous block that ignores `duplicate_object`:
//!
//! ```sql
//! DO $$ BEGIN
//!   CREATE TYPE public.status AS ENUM ('a', 'b');
//! EXCEPTION
//!   WHEN duplicate_object THEN null;
//! END $$;
//! ```
//!
//! The guard is per file: once a file contains [`WRAPPER_MARKER`] anywhere,
//! the rule leaves the whole file alone, including enums that are still
//! unwrapped.
//!
//! A block with no terminating `;` before end of file is left as it is;
//! wrapping it would produce a `DO` block that never closes.

use std::borrow::Cow;

use regex::Regex;

use super::RewriteRule;
use crate::error::RewriteError;

/// Text whose presence anywhere in a file disables the wrapper rule.
pub const WRAPPER_MARKER: &str = "DO $$ BEGIN";

const WRAPPER_EXCEPTION: [&str; 3] = ["EXCEPTION", "  WHEN duplicate_object THEN null;", "END $$;"];

/// Wraps each top-level `CREATE TYPE <schema>.<name> AS ENUM` block.
pub struct EnumTypeWrapper {
    start: Regex,
}

impl EnumTypeWrapper {
    pub fn new(schema: &str) -> Result<Self, RewriteError> {
        let start = Regex::new(&format!(
            r"^CREATE TYPE ({}\.\S+) AS ENUM",
            regex::escape(schema)
        ))?;
        Ok(Self { start })
    }
}

impl RewriteRule for EnumTypeWrapper {
    fn name(&self) -> &'static str {
        "enum_type_wrapper"
    }

    fn apply<'a>(&self, sql: &'a str) -> Result<Cow<'a, str>, RewriteError> {
        if !sql.contains("CREATE TYPE") || sql.contains(WRAPPER_MARKER) {
            return Ok(Cow::Borrowed(sql));
        }

        let lines: Vec<&str> = sql.split('\n').collect();
        let mut out: Vec<Cow<'_, str>> = Vec::with_capacity(lines.len());
        let mut wrapped = 0;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            if !self.start.is_match(line.trim()) {
                out.push(Cow::Borrowed(line));
                i += 1;
                continue;
            }

            let Some(end) = lines[i..].iter().position(|l| l.contains(';')) else {
                tracing::warn!(line = i + 1, "unterminated CREATE TYPE, left unwrapped");
                out.push(Cow::Borrowed(line));
                i += 1;
                continue;
            };
            let end = i + end;

            out.push(Cow::Borrowed(WRAPPER_MARKER));
            out.push(Cow::Owned(format!("  {}", lines[i..=end].join("\n"))));
            out.extend(WRAPPER_EXCEPTION.iter().map(|l| Cow::Borrowed(*l)));

            wrapped += 1;
            i = end + 1;
        }

        if wrapped == 0 {
            return Ok(Cow::Borrowed(sql));
        }

        tracing::trace!(wrapped, "wrapped enum types");
        Ok(Cow::Owned(out.join("\n")))
    }
}
