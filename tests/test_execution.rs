//! Integration tests for executing prepared audit DDL.

use oracle_audit_rs::memory::{MemoryCatalog, MemoryColumn};
use oracle_audit_rs::{run, AuditConfig, AuditGenerator, AuditPlan, Error, Selector};

const CONN_STR: &str = "scott/tiger@ORCL";

fn emp_catalog() -> MemoryCatalog {
    let catalog = MemoryCatalog::new("SCOTT");
    catalog.create_table(
        "EMP",
        vec![
            MemoryColumn::number("ID", 10, 0).not_null(),
            MemoryColumn::varchar2("NAME", 50),
            MemoryColumn::date("CREATED_ON"),
        ],
    );
    catalog
}

async fn prepare(generator: &mut AuditGenerator<oracle_audit_rs::memory::MemoryConnector>) -> AuditPlan {
    generator
        .prepare(Some(CONN_STR), Some("EMP"))
        .await
        .unwrap()
        .into_plan()
        .expect("EMP exists")
}

#[tokio::test]
async fn test_execute_both_creates_objects_in_order() {
    let catalog = emp_catalog();
    let mut generator = AuditGenerator::new(catalog.connector(), AuditConfig::new());
    let plan = prepare(&mut generator).await;

    let report = generator.execute(&plan, Selector::Both).await.unwrap();
    assert_eq!(report.executed, vec!["AUD$EMP", "TRG$EMP"]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.statements, 3);

    let statements = catalog.statements();
    assert_eq!(statements.len(), 3);
    assert!(statements[0].starts_with("CREATE TABLE AUD$EMP"));
    assert!(statements[1].starts_with("ALTER TABLE AUD$EMP"));
    assert!(statements[2].starts_with("CREATE OR REPLACE TRIGGER TRG$EMP"));

    assert_eq!(
        catalog.table_columns("AUD$EMP"),
        vec!["ID", "NAME", "CREATED_ON", "AUDIT_ACTION", "AUDIT_DTM", "AUDIT_USER"]
    );
    assert!(catalog.trigger_source("TRG$EMP").is_some());
}

#[tokio::test]
async fn test_selector_restricts_execution() {
    let catalog = emp_catalog();
    let mut generator = AuditGenerator::new(catalog.connector(), AuditConfig::new());
    let plan = prepare(&mut generator).await;

    let report = generator.execute(&plan, Selector::parse("TRIGGER")).await.unwrap();
    assert_eq!(report.executed, vec!["TRG$EMP"]);
    assert_eq!(report.skipped, vec!["AUD$EMP"]);
    assert!(!catalog.has_table("AUD$EMP"));

    let report = generator.execute(&plan, Selector::parse("audit")).await.unwrap();
    assert_eq!(report.executed, vec!["AUD$EMP"]);
    assert!(catalog.has_table("AUD$EMP"));
}

#[tokio::test]
async fn test_rerun_skips_audit_and_reissues_trigger() {
    let catalog = emp_catalog();
    let mut generator = AuditGenerator::new(catalog.connector(), AuditConfig::new());

    let first = prepare(&mut generator).await;
    generator.execute(&first, Selector::Both).await.unwrap();

    let second = prepare(&mut generator).await;
    assert!(!second.create_audit());
    let report = generator.execute(&second, Selector::Both).await.unwrap();
    assert_eq!(report.executed, vec!["TRG$EMP"]);
    assert_eq!(report.skipped, vec!["AUD$EMP"]);
    assert_eq!(report.statements, 1);

    let statements = catalog.statements();
    assert_eq!(statements.len(), 4);
    assert!(statements[3].starts_with("CREATE OR REPLACE TRIGGER TRG$EMP"));

    // Audit-only runs become no-ops once the audit table exists.
    let third = prepare(&mut generator).await;
    let report = generator.execute(&third, Selector::Audit).await.unwrap();
    assert!(report.is_noop());
    assert_eq!(catalog.statements().len(), 4);
}

#[tokio::test]
async fn test_drop_first_recreates_audit_table() {
    let catalog = emp_catalog();
    catalog.create_table("AUD$EMP", vec![MemoryColumn::number("ID", 10, 0)]);
    let config = AuditConfig::new().with_drop_audit_table_first(true);
    let mut generator = AuditGenerator::new(catalog.connector(), config);

    let plan = prepare(&mut generator).await;
    let report = generator.execute(&plan, Selector::Audit).await.unwrap();
    assert_eq!(report.statements, 3);
    assert_eq!(catalog.statements()[0], "DROP TABLE AUD$EMP");
    assert_eq!(catalog.table_columns("AUD$EMP").len(), 6);
}

#[tokio::test]
async fn test_first_rejected_statement_stops_the_run() {
    let catalog = emp_catalog();
    let mut generator = AuditGenerator::new(catalog.connector(), AuditConfig::new());
    let plan = prepare(&mut generator).await;

    // Someone else creates the audit table between prepare and execute.
    catalog.create_table("AUD$EMP", vec![MemoryColumn::number("ID", 10, 0)]);

    let err = generator.execute(&plan, Selector::Both).await.unwrap_err();
    match &err {
        Error::StatementFailed { object, index, sql, .. } => {
            assert_eq!(object, "AUD$EMP");
            assert_eq!(*index, 0);
            assert!(sql.starts_with("CREATE TABLE AUD$EMP"));
        }
        other => panic!("expected StatementFailed, got {:?}", other),
    }
    assert_eq!(err.oracle_code(), Some(955));

    // Neither the ALTER nor the trigger was attempted.
    assert_eq!(catalog.statements().len(), 1);
    assert!(catalog.trigger_source("TRG$EMP").is_none());
}

#[tokio::test]
async fn test_rejected_trigger_reports_failure() {
    let catalog = emp_catalog();
    catalog.reject_statements_containing("CREATE OR REPLACE TRIGGER", 1031, "insufficient privileges");
    let mut generator = AuditGenerator::new(catalog.connector(), AuditConfig::new());
    let plan = prepare(&mut generator).await;

    let err = generator.execute(&plan, Selector::Both).await.unwrap_err();
    assert!(matches!(err, Error::StatementFailed { ref object, .. } if object == "TRG$EMP"));
    assert_eq!(err.oracle_code(), Some(1031));
    assert!(catalog.has_table("AUD$EMP"));
}

#[tokio::test]
async fn test_execute_without_session_fails() {
    let catalog = emp_catalog();
    let mut generator = AuditGenerator::new(catalog.connector(), AuditConfig::new());
    let plan = prepare(&mut generator).await;
    generator.disconnect();

    let err = generator.execute(&plan, Selector::Both).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionFailed { .. }));
}

#[tokio::test]
async fn test_run_on_explicit_session() {
    let catalog = emp_catalog();
    let mut generator = AuditGenerator::new(catalog.connector(), AuditConfig::new());
    let plan = prepare(&mut generator).await;

    let mut session = catalog.session("SCOTT");
    let report = run(&mut session, &plan, Selector::default()).await.unwrap();
    assert_eq!(report.statements, 3);
}
