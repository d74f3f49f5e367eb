//! Prepared audit DDL.

use crate::catalog::TableDescription;
use crate::error::Result;
use crate::identifier::QualifiedName;
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// DDL for one generated object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectScript {
    /// Generated object name.
    pub name: QualifiedName,
    /// Statements, in execution order.
    pub statements: Vec<String>,
    /// Whether the statements should be executed at all.
    pub create: bool,
}

impl ObjectScript {
    /// Script that will be executed.
    pub fn create(name: QualifiedName, statements: Vec<String>) -> Self {
        Self {
            name,
            statements,
            create: true,
        }
    }

    /// Placeholder for an object that is left alone.
    pub fn skip(name: QualifiedName) -> Self {
        Self {
            name,
            statements: Vec::new(),
            create: false,
        }
    }
}

/// Result of a successful preparation.
#[derive(Debug, Clone)]
pub struct AuditPlan {
    /// Audited source table.
    pub table: QualifiedName,
    /// Audit table DDL (`create_audit`).
    pub audit: ObjectScript,
    /// Trigger DDL (`create_trigger`).
    pub trigger: ObjectScript,
    /// Catalog description the trigger was generated from.
    pub description: TableDescription,
}

impl AuditPlan {
    /// Whether the audit table will be (re)created.
    pub fn create_audit(&self) -> bool {
        self.audit.create
    }

    /// Whether the trigger will be created.
    pub fn create_trigger(&self) -> bool {
        self.trigger.create
    }

    /// Statements keyed by generated object name.
    ///
    /// The audit table is always present, with an empty list when skipped.
    pub fn bundle(&self) -> BTreeMap<String, &[String]> {
        let mut bundle = BTreeMap::new();
        bundle.insert(self.audit.name.to_string(), self.audit.statements.as_slice());
        bundle.insert(
            self.trigger.name.to_string(),
            self.trigger.statements.as_slice(),
        );
        bundle
    }

    /// Render the plan as a SQL*Plus script stamped with the current time.
    pub fn to_script(&self) -> String {
        self.to_script_at(Local::now().naive_local())
    }

    /// Render the plan as a SQL*Plus script stamped with `generated_at`.
    pub fn to_script_at(&self, generated_at: NaiveDateTime) -> String {
        let mut out = String::new();
        out.push_str(&format!("-- Audit DDL for {}\n", self.table));
        out.push_str(&format!(
            "-- Generated {}\n",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ));

        out.push_str(&format!("\n-- {}\n", self.audit.name));
        if self.audit.create {
            for statement in &self.audit.statements {
                out.push_str(statement);
                out.push_str(";\n");
            }
        } else {
            out.push_str("-- audit table exists, not recreated\n");
        }

        if self.trigger.create {
            out.push_str(&format!("\n-- {}\n", self.trigger.name));
            for statement in &self.trigger.statements {
                out.push_str(statement);
                out.push_str("\n/\n");
            }
        }
        out
    }

    /// Write the script to `writer`.
    pub fn write_script<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.to_script().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Why preparation produced nothing to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No connect string given or configured.
    MissingConnectString,
    /// No table name given or configured.
    MissingTableName,
    /// The source table does not exist.
    TableNotFound { table: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingConnectString => write!(f, "no connect string"),
            SkipReason::MissingTableName => write!(f, "no table name"),
            SkipReason::TableNotFound { table } => write!(f, "table {} not found", table),
        }
    }
}

/// Outcome of `prepare`.
#[derive(Debug, Clone)]
pub enum Preparation {
    /// DDL was generated.
    Ready(AuditPlan),
    /// Nothing to do.
    Skipped(SkipReason),
}

impl Preparation {
    /// The plan, if one was generated.
    pub fn plan(&self) -> Option<&AuditPlan> {
        match self {
            Preparation::Ready(plan) => Some(plan),
            Preparation::Skipped(_) => None,
        }
    }

    /// Consume into the plan, if one was generated.
    pub fn into_plan(self) -> Option<AuditPlan> {
        match self {
            Preparation::Ready(plan) => Some(plan),
            Preparation::Skipped(_) => None,
        }
    }

    /// Check if preparation was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Preparation::Skipped(_))
    }

    /// The skip reason, if skipped.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Preparation::Ready(_) => None,
            Preparation::Skipped(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn plan(create_audit: bool) -> AuditPlan {
        let table = QualifiedName::parse("EMP", "table").unwrap();
        let audit_name = ddl::audit_table_name(&table);
        let audit = if create_audit {
            ObjectScript::create(
                audit_name.clone(),
                ddl::audit_table_statements(&audit_name, &table, false),
            )
        } else {
            ObjectScript::skip(audit_name)
        };
        let trigger = ObjectScript::create(
            ddl::trigger_name(&table),
            vec!["CREATE OR REPLACE TRIGGER TRG$EMP ... END;".to_string()],
        );
        AuditPlan {
            description: TableDescription {
                table: table.clone(),
                column_names: String::new(),
                columns: Vec::new(),
                comments: HashMap::new(),
            },
            table,
            audit,
            trigger,
        }
    }

    #[test]
    fn test_bundle_keeps_skipped_audit() {
        let plan = plan(false);
        let bundle = plan.bundle();
        assert_eq!(bundle.len(), 2);
        assert!(bundle["AUD$EMP"].is_empty());
        assert_eq!(bundle["TRG$EMP"].len(), 1);
        assert!(!plan.create_audit());
        assert!(plan.create_trigger());
    }

    #[test]
    fn test_script_rendering() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let script = plan(true).to_script_at(at);
        assert!(script.starts_with("-- Audit DDL for EMP\n-- Generated 2024-03-01 12:30:00\n"));
        assert!(script.contains("CREATE TABLE AUD$EMP AS SELECT * FROM EMP WHERE 1=0;\n"));
        assert!(script.ends_with("END;\n/\n"));

        let script = plan(false).to_script_at(at);
        assert!(script.contains("-- audit table exists, not recreated"));
        assert!(!script.contains("CREATE TABLE"));
    }

    #[test]
    fn test_write_script() {
        let mut out = Vec::new();
        plan(true).write_script(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("-- TRG$EMP"));
    }

    #[test]
    fn test_preparation_accessors() {
        let skipped = Preparation::Skipped(SkipReason::TableNotFound {
            table: "EMP".to_string(),
        });
        assert!(skipped.is_skipped());
        assert!(skipped.plan().is_none());
        assert_eq!(skipped.skip_reason().unwrap().to_string(), "table EMP not found");

        let ready = Preparation::Ready(plan(true));
        assert!(!ready.is_skipped());
        assert!(ready.into_plan().is_some());
    }
}
