//! Audit table and trigger DDL generation for Oracle tables.
//!
//! Given a session and a table name, the generator reads the table's columns
//! from the data dictionary and produces two scripts: one creating an
//! `AUD$<TABLE>` shadow table with `audit_action`, `audit_dtm` and
//! `audit_user` columns, and one creating a `TRG$<TABLE>` row trigger that
//! copies every insert, update and delete into it.
//!
//! # Example
//!
//! ```no_run
//! use oracle_audit_rs::{AuditConfig, AuditGenerator, Connector, Preparation, Result, Selector};
//!
//! async fn audit_emp<C: Connector>(connector: C) -> Result<()> {
//!     let config = AuditConfig::from_env()?.with_drop_audit_table_first(true);
//!     let mut generator = AuditGenerator::new(connector, config);
//!
//!     match generator.prepare(None, Some("scott.emp")).await? {
//!         Preparation::Ready(plan) => {
//!             println!("{}", plan.to_script());
//!             generator.execute(&plan, Selector::Both).await?;
//!         }
//!         Preparation::Skipped(reason) => println!("nothing to do: {}", reason),
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod connect;
pub mod ddl;
pub mod error;
pub mod execute;
pub mod generator;
pub mod identifier;
pub mod memory;
pub mod plan;
pub mod session;
pub mod types;

// Re-export main types
pub use catalog::{describe_table, object_exists, ColumnDescriptor, ObjectKind, TableDescription};
pub use config::AuditConfig;
pub use connect::{AppRole, ConnectString, DbKind};
pub use ddl::ColumnFragments;
pub use error::{Error, Result};
pub use execute::{run, RunReport, Selector};
pub use generator::AuditGenerator;
pub use identifier::{validate_identifier, QualifiedName};
pub use plan::{AuditPlan, ObjectScript, Preparation, SkipReason};
pub use session::{Connector, QueryResult, Session};
pub use types::{OracleValue, Row};
