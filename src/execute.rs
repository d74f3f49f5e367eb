//! Selective execution of a prepared plan.

use crate::error::{Error, Result};
use crate::plan::{AuditPlan, ObjectScript};
use crate::session::Session;
use std::convert::Infallible;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Which parts of a plan to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector {
    /// Audit table only.
    Audit,
    /// Trigger only.
    Trigger,
    /// Both, audit table first.
    #[default]
    Both,
}

impl Selector {
    /// Parse by case-insensitive prefix: `aud*` and `tri*`, anything else is `Both`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_ascii_lowercase();
        if value.starts_with("aud") {
            Selector::Audit
        } else if value.starts_with("tri") {
            Selector::Trigger
        } else {
            Selector::Both
        }
    }

    /// Check if the audit table is selected.
    pub fn includes_audit(&self) -> bool {
        matches!(self, Selector::Audit | Selector::Both)
    }

    /// Check if the trigger is selected.
    pub fn includes_trigger(&self) -> bool {
        matches!(self, Selector::Trigger | Selector::Both)
    }
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Selector::parse(s))
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Objects whose statements were executed, in order.
    pub executed: Vec<String>,
    /// Objects left alone.
    pub skipped: Vec<String>,
    /// Number of statements executed.
    pub statements: usize,
}

impl RunReport {
    /// Check if nothing was executed.
    pub fn is_noop(&self) -> bool {
        self.statements == 0
    }
}

/// Execute the selected parts of `plan` on `session`.
///
/// Statements run in generated order; the first rejected statement aborts the
/// run with `Error::StatementFailed`.
pub async fn run<S: Session>(
    session: &mut S,
    plan: &AuditPlan,
    selector: Selector,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    let parts = [
        (&plan.audit, selector.includes_audit()),
        (&plan.trigger, selector.includes_trigger()),
    ];
    for (script, selected) in parts {
        if !(selected && script.create) {
            debug!(object = %script.name, selected, create = script.create, "skipping");
            report.skipped.push(script.name.to_string());
            continue;
        }
        report.statements += run_script(session, script).await?;
        report.executed.push(script.name.to_string());
    }

    info!(
        table = %plan.table,
        executed = ?report.executed,
        statements = report.statements,
        "audit DDL applied"
    );
    Ok(report)
}

async fn run_script<S: Session>(session: &mut S, script: &ObjectScript) -> Result<usize> {
    for (index, sql) in script.statements.iter().enumerate() {
        debug!(object = %script.name, index, "executing statement");
        if let Err(source) = session.execute(sql).await {
            warn!(object = %script.name, index, error = %source, "statement rejected");
            return Err(Error::StatementFailed {
                object: script.name.to_string(),
                index,
                sql: sql.clone(),
                source: Box::new(source),
            });
        }
    }
    Ok(script.statements.len())
}
