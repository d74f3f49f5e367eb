//! Generator configuration.

use crate::connect::DbKind;
use crate::error::{Error, Result};
use std::time::Duration;

/// Environment variable holding the connect string.
pub const ENV_CONNECT_STRING: &str = "AUDIT_CONNECT_STRING";
/// Environment variable holding the database kind (`oracle`, `file`, `odbc`).
pub const ENV_DB_KIND: &str = "AUDIT_DB_KIND";
/// Environment variable holding the default table name.
pub const ENV_TABLE_NAME: &str = "AUDIT_TABLE_NAME";
/// Environment variable overriding the audit table name.
pub const ENV_AUDIT_TABLE: &str = "AUDIT_AUDIT_TABLE";
/// Environment variable overriding the trigger name.
pub const ENV_TRIGGER_NAME: &str = "AUDIT_TRIGGER_NAME";
/// Environment variable enabling drop-before-create of the audit table.
pub const ENV_DROP_FIRST: &str = "AUDIT_DROP_FIRST";
/// Environment variable holding the connect timeout in seconds.
pub const ENV_CONNECT_TIMEOUT: &str = "AUDIT_CONNECT_TIMEOUT_SECS";

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Defaults and overrides used by [`crate::AuditGenerator`].
#[derive(Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Connect string used when `prepare` gets none.
    pub connect_string: Option<String>,
    /// Kind of database the connect string addresses.
    pub db_kind: DbKind,
    /// Table used when `prepare` gets none.
    pub table_name: Option<String>,
    /// Audit table name instead of `AUD$<TABLE>`.
    pub audit_table_name: Option<String>,
    /// Trigger name instead of `TRG$<TABLE>`.
    pub trigger_name: Option<String>,
    /// Drop an existing audit table and recreate it.
    pub drop_audit_table_first: bool,
    /// Upper bound for opening a session.
    pub connect_timeout: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            connect_string: None,
            db_kind: DbKind::Oracle,
            table_name: None,
            audit_table_name: None,
            trigger_name: None,
            drop_audit_table_first: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditConfig")
            .field("connect_string", &self.connect_string.as_ref().map(|_| "***"))
            .field("db_kind", &self.db_kind)
            .field("table_name", &self.table_name)
            .field("audit_table_name", &self.audit_table_name)
            .field("trigger_name", &self.trigger_name)
            .field("drop_audit_table_first", &self.drop_audit_table_first)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl AuditConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default connect string.
    pub fn with_connect_string(mut self, connect_string: impl Into<String>) -> Self {
        self.connect_string = Some(connect_string.into());
        self
    }

    /// Set the database kind.
    pub fn with_db_kind(mut self, db_kind: DbKind) -> Self {
        self.db_kind = db_kind;
        self
    }

    /// Set the default table name.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Override the audit table name.
    pub fn with_audit_table_name(mut self, name: impl Into<String>) -> Self {
        self.audit_table_name = Some(name.into());
        self
    }

    /// Override the trigger name.
    pub fn with_trigger_name(mut self, name: impl Into<String>) -> Self {
        self.trigger_name = Some(name.into());
        self
    }

    /// Drop an existing audit table before recreating it.
    pub fn with_drop_audit_table_first(mut self, drop_first: bool) -> Self {
        self.drop_audit_table_first = drop_first;
        self
    }

    /// Set the connect timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use oracle_audit_rs::AuditConfig;
    /// use std::time::Duration;
    ///
    /// let config = AuditConfig::new().with_connect_timeout(Duration::from_secs(5));
    /// assert_eq!(config.connect_timeout, Duration::from_secs(5));
    /// ```
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Read the `AUDIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a variable lookup; unset or blank variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self {
            connect_string: get(ENV_CONNECT_STRING),
            table_name: get(ENV_TABLE_NAME),
            audit_table_name: get(ENV_AUDIT_TABLE),
            trigger_name: get(ENV_TRIGGER_NAME),
            ..Self::default()
        };

        if let Some(kind) = get(ENV_DB_KIND) {
            config.db_kind = kind.parse().map_err(|_| Error::InvalidConfig {
                key: ENV_DB_KIND.to_string(),
                message: format!("unknown database kind '{}'", kind),
            })?;
        }
        if let Some(flag) = get(ENV_DROP_FIRST) {
            config.drop_audit_table_first = parse_flag(&flag).ok_or_else(|| Error::InvalidConfig {
                key: ENV_DROP_FIRST.to_string(),
                message: format!("expected a boolean, got '{}'", flag),
            })?;
        }
        if let Some(secs) = get(ENV_CONNECT_TIMEOUT) {
            let secs: u64 = secs.trim().parse().map_err(|_| Error::InvalidConfig {
                key: ENV_CONNECT_TIMEOUT.to_string(),
                message: format!("expected seconds, got '{}'", secs),
            })?;
            config.connect_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
