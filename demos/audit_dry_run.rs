//! Dry run: generate and apply audit DDL against the in-memory catalog.
//!
//! Reads `AUDIT_*` variables from `demos/.env` when present.

use oracle_audit_rs::memory::{MemoryCatalog, MemoryColumn};
use oracle_audit_rs::{AuditConfig, AuditGenerator, Preparation, Selector};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path("demos/.env").ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let catalog = MemoryCatalog::new("SCOTT");
    catalog.create_table(
        "EMP",
        vec![
            MemoryColumn::number("EMPNO", 4, 0).not_null().comment("Employee number"),
            MemoryColumn::varchar2("ENAME", 10),
            MemoryColumn::varchar2("JOB", 9),
            MemoryColumn::date("HIREDATE"),
            MemoryColumn::number("SAL", 7, 2),
        ],
    );

    let mut config = AuditConfig::from_env()?;
    if config.connect_string.is_none() {
        config = config.with_connect_string("scott/tiger@localhost:1521/FREEPDB1");
    }
    let table = config.table_name.clone().unwrap_or_else(|| "EMP".to_string());
    let selector = std::env::var("AUDIT_SELECTOR")
        .map(|s| Selector::parse(&s))
        .unwrap_or_default();

    let mut generator = AuditGenerator::new(catalog.connector(), config);
    match generator.prepare(None, Some(table.as_str())).await? {
        Preparation::Ready(plan) => {
            println!("{}", plan.to_script());
            let report = generator.execute(&plan, selector).await?;
            println!("Executed {} statement(s) for {:?}", report.statements, report.executed);
            println!("Audit columns: {:?}", catalog.table_columns(&plan.audit.name.to_string()));
        }
        Preparation::Skipped(reason) => println!("Nothing to do: {}", reason),
    }
    Ok(())
}
