//! Audit generator: catalog facts in, [`AuditPlan`] out.

use crate::catalog::{describe_table, object_exists, ObjectKind};
use crate::config::AuditConfig;
use crate::connect::ConnectString;
use crate::ddl::{self, ColumnFragments};
use crate::error::{Error, Result};
use crate::execute::{self, RunReport, Selector};
use crate::identifier::{validate_identifier, QualifiedName};
use crate::plan::{AuditPlan, ObjectScript, Preparation, SkipReason};
use crate::session::Connector;
use tracing::{debug, info};

struct OpenSession<S> {
    connect_string: String,
    session: S,
}

/// Generates and applies audit DDL.
///
/// The generator owns at most one session, opened lazily by `prepare` and
/// reused while the connect string stays the same.
///
/// # Example
///
/// ```
/// use oracle_audit_rs::memory::{MemoryCatalog, MemoryColumn};
/// use oracle_audit_rs::{AuditConfig, AuditGenerator, Selector};
///
/// # tokio_test::block_on(async {
/// let catalog = MemoryCatalog::new("SCOTT");
/// catalog.create_table("EMP", vec![MemoryColumn::number("ID", 10, 0)]);
///
/// let config = AuditConfig::new().with_connect_string("scott/tiger@ORCL");
/// let mut generator = AuditGenerator::new(catalog.connector(), config);
///
/// let preparation = generator.prepare(None, Some("emp")).await?;
/// let plan = preparation.plan().expect("EMP exists");
/// generator.execute(plan, Selector::Both).await?;
///
/// assert!(catalog.has_table("AUD$EMP"));
/// assert!(catalog.trigger_source("TRG$EMP").is_some());
/// # Ok::<(), oracle_audit_rs::Error>(())
/// # }).unwrap();
/// ```
pub struct AuditGenerator<C: Connector> {
    connector: C,
    config: AuditConfig,
    session: Option<OpenSession<C::Session>>,
}

impl<C: Connector> AuditGenerator<C> {
    /// Create a generator; no session is opened yet.
    pub fn new(connector: C, config: AuditConfig) -> Self {
        Self {
            connector,
            config,
            session: None,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Check if a session is open.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the open session, if any.
    pub fn disconnect(&mut self) {
        if self.session.take().is_some() {
            debug!("session closed");
        }
    }

    /// Generate audit table and trigger DDL for a table.
    ///
    /// Arguments override the configured connect string and table name. A
    /// missing connect string, missing table name or missing source table
    /// yields `Preparation::Skipped`; only a missing connect string or table
    /// name avoids opening a session.
    pub async fn prepare(
        &mut self,
        connect_string: Option<&str>,
        table_name: Option<&str>,
    ) -> Result<Preparation> {
        let Some(connect_string) = resolve(connect_string, self.config.connect_string.as_deref())
        else {
            info!("no connect string, nothing to prepare");
            return Ok(Preparation::Skipped(SkipReason::MissingConnectString));
        };
        let Some(table_name) = resolve(table_name, self.config.table_name.as_deref()) else {
            info!("no table name, nothing to prepare");
            return Ok(Preparation::Skipped(SkipReason::MissingTableName));
        };

        let table = QualifiedName::parse(&table_name, "table_name")?;
        let audit = match &self.config.audit_table_name {
            Some(name) => QualifiedName::parse(name, "audit_table_name")?,
            None => ddl::audit_table_name(&table),
        };
        let trigger = match &self.config.trigger_name {
            Some(name) => QualifiedName::parse(name, "trigger_name")?,
            None => ddl::trigger_name(&table),
        };
        // Derived names grow by a prefix and may exceed the length limit.
        validate_identifier(&audit.name, "audit_table_name")?;
        validate_identifier(&trigger.name, "trigger_name")?;
        let drop_first = self.config.drop_audit_table_first;

        let session = self.session(&connect_string).await?;

        if !object_exists(session, &table.to_string(), ObjectKind::Table).await? {
            info!(table = %table, "source table not found, nothing to prepare");
            return Ok(Preparation::Skipped(SkipReason::TableNotFound {
                table: table.to_string(),
            }));
        }

        let audit_exists = object_exists(session, &audit.to_string(), ObjectKind::Table).await?;
        let audit_script = match (audit_exists, drop_first) {
            (true, false) => {
                info!(audit = %audit, "audit table exists, skipping its creation");
                ObjectScript::skip(audit.clone())
            }
            (true, true) => {
                info!(audit = %audit, "audit table exists, dropping it first");
                ObjectScript::create(
                    audit.clone(),
                    ddl::audit_table_statements(&audit, &table, true),
                )
            }
            (false, _) => {
                debug!(audit = %audit, "audit table will be created");
                ObjectScript::create(
                    audit.clone(),
                    ddl::audit_table_statements(&audit, &table, false),
                )
            }
        };

        let description = describe_table(session, &table.to_string(), None).await?;
        let fragments = ColumnFragments::build(&description.columns);
        let trigger_sql = ddl::trigger_statement(&trigger, &table, &audit, &fragments);
        debug!(trigger = %trigger, columns = description.len(), "trigger generated");

        Ok(Preparation::Ready(AuditPlan {
            table,
            audit: audit_script,
            trigger: ObjectScript::create(trigger, vec![trigger_sql]),
            description,
        }))
    }

    /// Run the selected parts of `plan` on the session opened by `prepare`.
    pub async fn execute(&mut self, plan: &AuditPlan, selector: Selector) -> Result<RunReport> {
        let open = self
            .session
            .as_mut()
            .ok_or_else(|| Error::connection("no open session, prepare a plan first"))?;
        execute::run(&mut open.session, plan, selector).await
    }

    async fn session(&mut self, connect_string: &str) -> Result<&mut C::Session> {
        let reusable =
            matches!(&self.session, Some(open) if open.connect_string == connect_string);
        if !reusable {
            let params = ConnectString::parse(self.config.db_kind, connect_string)?;
            let timeout = self.config.connect_timeout;
            info!(connect = %params, "opening session");
            let session = tokio::time::timeout(timeout, self.connector.connect(&params))
                .await
                .map_err(|_| Error::ConnectionTimeout {
                    target: params.to_string(),
                    timeout,
                })??;
            self.session = Some(OpenSession {
                connect_string: connect_string.to_string(),
                session,
            });
        }
        self.session
            .as_mut()
            .map(|open| &mut open.session)
            .ok_or_else(|| Error::connection("session not open"))
    }
}

/// Non-blank explicit value, else non-blank default.
fn resolve(explicit: Option<&str>, default: Option<&str>) -> Option<String> {
    let non_blank = |v: &&str| !v.trim().is_empty();
    explicit
        .filter(non_blank)
        .or(default.filter(non_blank))
        .map(|v| v.trim().to_string())
}
