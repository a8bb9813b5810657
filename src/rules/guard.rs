//! DROP guards for objects that have no `IF NOT EXISTS` form.
//!
//! Postgres cannot `CREATE POLICY IF NOT EXISTS` or `CREATE TRIGGER IF NOT
//! EXISTS`, so the guard is a `DROP ... IF EXISTS` placed right before the
//! CREATE. A guard already sitting in the preceding [`DROP_WINDOW`]
//! characters is left alone.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use super::RewriteRule;
use crate::error::RewriteError;

/// How many characters before a CREATE are searched for an existing DROP.
///
/// A guard whose own text is longer than this (a policy or trigger name of
/// roughly 170+ characters) is never found, so every run inserts it again.
/// The duplicate DROP is harmless since `DROP ... IF EXISTS` is idempotent.
pub const DROP_WINDOW: usize = 200;

static POLICY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"CREATE POLICY "([^"]+)"\s+ON\s+(\S+)"#).expect("valid policy pattern")
});

// The clause between the timing keyword and ON may span lines.
static TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)CREATE TRIGGER (\S+)\s+(?:BEFORE|AFTER|INSTEAD OF)\s+.*?\s+ON\s+(\S+)")
        .expect("valid trigger pattern")
});

/// Inserts `DROP POLICY IF EXISTS "<name>" ON <table>;` before each policy.
pub struct PolicyGuard;

impl RewriteRule for PolicyGuard {
    fn name(&self) -> &'static str {
        "policy_guard"
    }

    fn apply<'a>(&self, sql: &'a str) -> Result<Cow<'a, str>, RewriteError> {
        Ok(insert_drops(sql, &POLICY_RE, |name, table| {
            format!(r#"DROP POLICY IF EXISTS "{name}" ON {table};"#)
        }))
    }
}

/// Inserts `DROP TRIGGER IF EXISTS <name> ON <table>;` before each trigger.
pub struct TriggerGuard;

impl RewriteRule for TriggerGuard {
    fn name(&self) -> &'static str {
        "trigger_guard"
    }

    fn apply<'a>(&self, sql: &'a str) -> Result<Cow<'a, str>, RewriteError> {
        Ok(insert_drops(sql, &TRIGGER_RE, |name, table| {
            format!("DROP TRIGGER IF EXISTS {name} ON {table};")
        }))
    }
}

/// `pattern` must capture the object name as group 1 and the table as group 2.
fn insert_drops<'a>(
    sql: &'a str,
    pattern: &Regex,
    drop_stmt: impl Fn(&str, &str) -> String,
) -> Cow<'a, str> {
    let mut out = String::new();
    let mut last = 0;
    let mut changed = false;

    for caps in pattern.captures_iter(sql) {
        let Some(whole) = caps.get(0) else { continue };
        let guard = drop_stmt(&caps[1], &caps[2]);

        if trailing_window(sql, whole.start(), DROP_WINDOW).contains(&guard) {
            continue;
        }

        tracing::trace!(%guard, "inserting guard");
        out.push_str(&sql[last..whole.start()]);
        out.push_str(&guard);
        out.push('\n');
        last = whole.start();
        changed = true;
    }

    if !changed {
        return Cow::Borrowed(sql);
    }

    out.push_str(&sql[last..]);
    Cow::Owned(out)
}

/// The last `chars` characters of `sql[..end]`.
fn trailing_window(sql: &str, end: usize, chars: usize) -> &str {
    let head = &sql[..end];
    if chars == 0 {
        return "";
    }
    let start = head
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map_or(0, |(idx, _)| idx);
    &head[start..]
}
