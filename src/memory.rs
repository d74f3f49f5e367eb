//! In-memory Oracle catalog.
//!
//! `MemoryCatalog` keeps tables, column metadata and triggers per owner and
//! answers the dictionary queries issued by [`crate::catalog`]. Sessions apply
//! the DDL shapes the generator emits (CTAS, `ALTER TABLE ... ADD`, `DROP
//! TABLE`, `CREATE OR REPLACE TRIGGER`) and reject everything else with the
//! matching ORA error, which makes it usable for dry runs as well as tests.

use crate::connect::{ConnectString, DbKind};
use crate::error::{Error, Result};
use crate::session::{Connector, QueryResult, Session};
use crate::types::OracleValue;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

static DROP_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*DROP\s+TABLE\s+(\S+?)\s*;?\s*$").expect("drop pattern compiles")
});

static CREATE_TABLE_AS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+TABLE\s+(\S+)\s+AS\s+SELECT\s+\*\s+FROM\s+(\S+)\s+WHERE\s+1\s*=\s*0\s*;?\s*$")
        .expect("ctas pattern compiles")
});

static ALTER_ADD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*ALTER\s+TABLE\s+(\S+)\s+ADD\s*\((.*)\)\s*;?\s*$")
        .expect("alter pattern compiles")
});

static CREATE_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+OR\s+REPLACE\s+TRIGGER\s+(\S+)\s.*?\sON\s+(\S+)\s+FOR\s+EACH\s+ROW\s")
        .expect("trigger pattern compiles")
});

static COLUMN_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*([A-Za-z][A-Za-z0-9_$#]*)\s+([A-Za-z0-9_]+)(?:\s*\(\s*(\d+)(?:\s*,\s*(\d+))?\s*\))?\s*$")
        .expect("column pattern compiles")
});

const COLUMN_FIELDS: [&str; 7] = [
    "COLUMN_NAME",
    "COLUMN_ID",
    "DATA_TYPE",
    "DATA_LENGTH",
    "DATA_PRECISION",
    "DATA_SCALE",
    "NULLABLE",
];

/// Column definition held by the in-memory catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryColumn {
    pub name: String,
    pub data_type: String,
    pub data_length: i64,
    pub data_precision: Option<i64>,
    pub data_scale: Option<i64>,
    pub nullable: bool,
    pub comment: Option<String>,
}

impl MemoryColumn {
    /// Column with an explicit type name and length.
    pub fn new(name: &str, data_type: &str, data_length: i64) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            data_type: data_type.to_ascii_uppercase(),
            data_length,
            data_precision: None,
            data_scale: None,
            nullable: true,
            comment: None,
        }
    }

    /// `NUMBER(precision, scale)`.
    pub fn number(name: &str, precision: i64, scale: i64) -> Self {
        Self {
            data_precision: Some(precision),
            data_scale: Some(scale),
            ..Self::new(name, "NUMBER", 22)
        }
    }

    /// `VARCHAR2(length)`.
    pub fn varchar2(name: &str, length: i64) -> Self {
        Self::new(name, "VARCHAR2", length)
    }

    /// `DATE`.
    pub fn date(name: &str) -> Self {
        Self::new(name, "DATE", 7)
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Attach a column comment.
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

type ObjectKey = (String, String);

#[derive(Debug)]
struct StoredTrigger {
    table: ObjectKey,
    source: String,
}

#[derive(Debug, Default)]
struct CatalogState {
    tables: BTreeMap<ObjectKey, Vec<MemoryColumn>>,
    triggers: BTreeMap<ObjectKey, StoredTrigger>,
    rejections: Vec<(String, u32, String)>,
    statements: Vec<String>,
    queries: usize,
    connections: usize,
}

/// Shared in-memory catalog. Clones see the same state.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    default_owner: String,
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    /// Create an empty catalog; `default_owner` owns unqualified tables.
    pub fn new(default_owner: &str) -> Self {
        Self {
            default_owner: default_owner.to_ascii_uppercase(),
            state: Arc::new(Mutex::new(CatalogState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(&self, owner: &str, name: &str) -> ObjectKey {
        match name.split_once('.') {
            Some((schema, object)) => (schema.to_ascii_uppercase(), object.to_ascii_uppercase()),
            None => (owner.to_ascii_uppercase(), name.to_ascii_uppercase()),
        }
    }

    /// Create a table owned by the default owner.
    pub fn create_table(&self, name: &str, columns: Vec<MemoryColumn>) {
        let owner = self.default_owner.clone();
        self.create_table_in(&owner, name, columns);
    }

    /// Create a table owned by `owner`.
    pub fn create_table_in(&self, owner: &str, name: &str, columns: Vec<MemoryColumn>) {
        let key = self.key(owner, name);
        self.state().tables.insert(key, columns);
    }

    /// Drop a table (and its triggers) outside of any session.
    pub fn drop_table(&self, name: &str) -> bool {
        let key = self.key(&self.default_owner, name);
        let mut state = self.state();
        state.triggers.retain(|_, t| t.table != key);
        state.tables.remove(&key).is_some()
    }

    /// Reject any later statement containing `fragment` with `ORA-<code>`.
    pub fn reject_statements_containing(&self, fragment: &str, code: u32, message: &str) {
        self.state()
            .rejections
            .push((fragment.to_ascii_uppercase(), code, message.to_string()));
    }

    /// Open a session for `user` without going through a connector.
    pub fn session(&self, user: &str) -> MemorySession {
        MemorySession {
            catalog: self.clone(),
            user: user.to_ascii_uppercase(),
        }
    }

    /// Connector handing out sessions on this catalog.
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            catalog: self.clone(),
            refusal: None,
            delay: None,
        }
    }

    /// Check if a table exists (`name` or `owner.name`).
    pub fn has_table(&self, name: &str) -> bool {
        let key = self.key(&self.default_owner, name);
        self.state().tables.contains_key(&key)
    }

    /// Column names of a table, in position order.
    pub fn table_columns(&self, name: &str) -> Vec<String> {
        let key = self.key(&self.default_owner, name);
        self.state()
            .tables
            .get(&key)
            .map(|cols| cols.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Source text of a stored trigger.
    pub fn trigger_source(&self, name: &str) -> Option<String> {
        let key = self.key(&self.default_owner, name);
        self.state().triggers.get(&key).map(|t| t.source.clone())
    }

    /// Every statement submitted through `execute`, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    /// Number of catalog queries answered.
    pub fn query_count(&self) -> usize {
        self.state().queries
    }

    /// Number of sessions opened through a connector.
    pub fn connection_count(&self) -> usize {
        self.state().connections
    }

    fn run_query(&self, user: &str, sql: &str, binds: &[&str]) -> Result<QueryResult> {
        let mut state = self.state();
        state.queries += 1;
        trace!(sql, ?binds, "memory query");

        let upper = sql.to_ascii_uppercase();
        let scoped = upper.contains("ALL_");
        let (owner, rest) = if scoped {
            (bind(binds, 0)?.to_ascii_uppercase(), &binds[1..])
        } else {
            (user.to_string(), binds)
        };

        if upper.contains("TAB_COLUMNS") {
            let key = (owner, bind(rest, 0)?.to_ascii_uppercase());
            let rows = state
                .tables
                .get(&key)
                .map(|cols| {
                    cols.iter()
                        .enumerate()
                        .map(|(idx, c)| {
                            vec![
                                OracleValue::from(c.name.as_str()),
                                OracleValue::from(idx as i64 + 1),
                                OracleValue::from(c.data_type.as_str()),
                                OracleValue::from(c.data_length),
                                OracleValue::from(c.data_precision),
                                OracleValue::from(c.data_scale),
                                OracleValue::from(if c.nullable { "Y" } else { "N" }),
                            ]
                        })
                        .collect()
                })
                .unwrap_or_default();
            return Ok(QueryResult::new(&COLUMN_FIELDS, rows));
        }

        if upper.contains("COL_COMMENTS") {
            let key = (owner, bind(rest, 0)?.to_ascii_uppercase());
            let rows = state
                .tables
                .get(&key)
                .map(|cols| {
                    cols.iter()
                        .map(|c| {
                            vec![
                                OracleValue::from(c.name.as_str()),
                                OracleValue::from(c.comment.clone()),
                            ]
                        })
                        .collect()
                })
                .unwrap_or_default();
            return Ok(QueryResult::new(&["COLUMN_NAME", "COMMENTS"], rows));
        }

        if upper.contains("_OBJECTS") {
            let key = (owner, bind(rest, 0)?.to_ascii_uppercase());
            let found = match bind(rest, 1)?.to_ascii_uppercase().as_str() {
                "TABLE" => state.tables.contains_key(&key),
                "TRIGGER" => state.triggers.contains_key(&key),
                _ => false,
            };
            let rows = if found {
                vec![vec![OracleValue::from(key.1.as_str())]]
            } else {
                Vec::new()
            };
            return Ok(QueryResult::new(&["OBJECT_NAME"], rows));
        }

        Err(Error::oracle(900, "invalid SQL statement"))
    }

    fn run_statement(&self, user: &str, sql: &str) -> Result<()> {
        let mut state = self.state();
        state.statements.push(sql.to_string());
        trace!(sql, "memory execute");

        let upper = sql.to_ascii_uppercase();
        if let Some((_, code, message)) = state
            .rejections
            .iter()
            .find(|(fragment, _, _)| upper.contains(fragment.as_str()))
        {
            return Err(Error::oracle(*code, message.clone()));
        }

        if let Some(caps) = DROP_TABLE.captures(sql) {
            let key = self.key(user, &caps[1]);
            if state.tables.remove(&key).is_none() {
                return Err(table_missing());
            }
            state.triggers.retain(|_, t| t.table != key);
            return Ok(());
        }

        if let Some(caps) = CREATE_TABLE_AS.captures(sql) {
            let target = self.key(user, &caps[1]);
            let source = self.key(user, &caps[2]);
            if state.tables.contains_key(&target) || state.triggers.contains_key(&target) {
                return Err(Error::oracle(955, "name is already used by an existing object"));
            }
            let columns: Vec<MemoryColumn> = state
                .tables
                .get(&source)
                .ok_or_else(table_missing)?
                .iter()
                .map(|c| MemoryColumn {
                    comment: None,
                    ..c.clone()
                })
                .collect();
            state.tables.insert(target, columns);
            return Ok(());
        }

        if let Some(caps) = ALTER_ADD.captures(sql) {
            let key = self.key(user, &caps[1]);
            let additions = parse_column_defs(&caps[2])?;
            let columns = state.tables.get_mut(&key).ok_or_else(table_missing)?;
            for column in additions {
                if columns.iter().any(|c| c.name == column.name) {
                    return Err(Error::oracle(
                        1430,
                        "column being added already exists in table",
                    ));
                }
                columns.push(column);
            }
            return Ok(());
        }

        if let Some(caps) = CREATE_TRIGGER.captures(sql) {
            let key = self.key(user, &caps[1]);
            let table = self.key(user, &caps[2]);
            if !state.tables.contains_key(&table) {
                return Err(table_missing());
            }
            state.triggers.insert(
                key,
                StoredTrigger {
                    table,
                    source: sql.to_string(),
                },
            );
            return Ok(());
        }

        Err(Error::oracle(900, "invalid SQL statement"))
    }
}

fn bind<'a>(binds: &[&'a str], index: usize) -> Result<&'a str> {
    binds
        .get(index)
        .copied()
        .ok_or_else(|| Error::oracle(1008, "not all variables bound"))
}

fn table_missing() -> Error {
    Error::oracle(942, "table or view does not exist")
}

/// Parse `name TYPE[(len[, scale])], ...` from an `ADD (...)` clause.
fn parse_column_defs(defs: &str) -> Result<Vec<MemoryColumn>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in defs.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&defs[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&defs[start..]);

    parts
        .into_iter()
        .map(|part| {
            let caps = COLUMN_DEF
                .captures(part)
                .ok_or_else(|| Error::oracle(902, "invalid datatype"))?;
            let size = caps.get(3).and_then(|m| m.as_str().parse::<i64>().ok());
            let scale = caps.get(4).and_then(|m| m.as_str().parse::<i64>().ok());
            let data_type = caps[2].to_ascii_uppercase();
            let column = match data_type.as_str() {
                "DATE" => MemoryColumn::date(&caps[1]),
                "NUMBER" => match size {
                    Some(p) => MemoryColumn::number(&caps[1], p, scale.unwrap_or(0)),
                    None => MemoryColumn::new(&caps[1], "NUMBER", 22),
                },
                _ => MemoryColumn::new(&caps[1], &data_type, size.unwrap_or(1)),
            };
            Ok(column)
        })
        .collect()
}

/// Session over a [`MemoryCatalog`].
#[derive(Debug, Clone)]
pub struct MemorySession {
    catalog: MemoryCatalog,
    user: String,
}

impl MemorySession {
    /// Connected user (upper-cased).
    pub fn user(&self) -> &str {
        &self.user
    }
}

impl Session for MemorySession {
    async fn query(&mut self, sql: &str, binds: &[&str]) -> Result<QueryResult> {
        self.catalog.run_query(&self.user, sql, binds)
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.catalog.run_statement(&self.user, sql)
    }
}

/// Connector producing [`MemorySession`]s.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    catalog: MemoryCatalog,
    refusal: Option<String>,
    delay: Option<Duration>,
}

impl MemoryConnector {
    /// Refuse every connect attempt with `message`.
    pub fn refusing(mut self, message: &str) -> Self {
        self.refusal = Some(message.to_string());
        self
    }

    /// Wait before completing each connect.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn open(&self, params: &ConnectString) -> Result<MemorySession> {
        if let Some(message) = &self.refusal {
            return Err(Error::connection(message.clone()));
        }
        let user = match (params.kind, &params.user) {
            (DbKind::File, _) | (_, None) => self.catalog.default_owner.clone(),
            (_, Some(user)) => user.to_ascii_uppercase(),
        };
        self.catalog.state().connections += 1;
        Ok(self.catalog.session(&user))
    }
}

impl Connector for MemoryConnector {
    type Session = MemorySession;

    async fn connect(&self, params: &ConnectString) -> Result<MemorySession> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.open(params)
    }
}
