//! Rewrite rules that make migration statements safe to re-run.
//!
//! Each rule is a pure text transform. A rule that has nothing to do returns
//! the input borrowed, so callers can tell "unchanged" from "rewritten"
//! without comparing buffers.
//!
//! Rules run in a fixed order, each one seeing the previous rule's output:
//!
//! 1. `policy_guard`: `DROP POLICY IF EXISTS` before `CREATE POLICY`
//! 2. `trigger_guard`: `DROP TRIGGER IF EXISTS` before `CREATE TRIGGER`
//! 3. `table_if_not_exists`: `CREATE TABLE IF NOT EXISTS`
//! 4. `index_if_not_exists`: `CREATE [UNIQUE] INDEX IF NOT EXISTS`
//! 5. `enum_type_wrapper`: `DO $$ BEGIN ... EXCEPTION ... END $$;` around enum types

mod enum_type;
mod exists;
mod guard;

pub use enum_type::{EnumTypeWrapper, WRAPPER_MARKER};
pub use exists::{IndexIfNotExists, TableIfNotExists};
pub use guard::{DROP_WINDOW, PolicyGuard, TriggerGuard};

use std::borrow::Cow;

use crate::error::{IdempotentError, Result, RewriteError};

/// Schema qualifier that table and enum rules are restricted to by default.
pub const DEFAULT_SCHEMA: &str = "public";

/// A single text rewrite over a whole migration file.
pub trait RewriteRule {
    /// Stable identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Rewrite `sql`. Returns `Cow::Borrowed` when nothing changed.
    fn apply<'a>(&self, sql: &'a str) -> std::result::Result<Cow<'a, str>, RewriteError>;
}

/// Output of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub sql: String,
    /// Names of the rules that changed the text, in application order.
    pub applied: Vec<&'static str>,
}

impl Rewritten {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// The ordered set of rules applied to every migration file.
pub struct Pipeline {
    rules: Vec<Box<dyn RewriteRule>>,
}

impl Pipeline {
    /// Build the standard five-rule pipeline for tables and types in `schema`.
    pub fn new(schema: &str) -> std::result::Result<Self, RewriteError> {
        Ok(Self {
            rules: vec![
                Box::new(PolicyGuard),
                Box::new(TriggerGuard),
                Box::new(TableIfNotExists::new(schema)?),
                Box::new(IndexIfNotExists),
                Box::new(EnumTypeWrapper::new(schema)?),
            ],
        })
    }

    /// Build a pipeline from an explicit rule list.
    pub fn from_rules(rules: Vec<Box<dyn RewriteRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Run every rule in order over `sql`.
    pub fn run(&self, sql: &str) -> Result<Rewritten> {
        let mut current = sql.to_string();
        let mut applied = Vec::new();

        for rule in &self.rules {
            let next = rule
                .apply(&current)
                .map_err(|source| IdempotentError::Rule {
                    rule: rule.name(),
                    source,
                })?;

            if let Cow::Owned(next) = next {
                if next != current {
                    tracing::debug!(rule = rule.name(), "rule rewrote content");
                    applied.push(rule.name());
                    current = next;
                }
            }
        }

        Ok(Rewritten {
            sql: current,
            applied,
        })
    }
}
