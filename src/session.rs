//! Session and connector traits.
//!
//! A `Connector` opens a `Session` from a parsed connect string; a `Session`
//! issues catalog queries and DDL statements. The generator only needs these
//! two narrow contracts, so any driver can sit behind them.

use crate::connect::ConnectString;
use crate::error::Result;
use crate::types::{OracleValue, Row};
use std::future::Future;
use std::sync::Arc;

/// Result of a query execution.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Column names, in select-list order.
    pub columns: Arc<[String]>,
    /// Rows returned.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Build a result from column names and raw value rows.
    pub fn new(columns: &[&str], rows: Vec<Vec<OracleValue>>) -> Self {
        let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| Row::new(values, Arc::clone(&columns)))
            .collect();
        Self { columns, rows }
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.as_str()).collect()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// An open database session.
///
/// Holding `&mut self` for every call keeps one statement in flight per
/// session.
pub trait Session: Send {
    /// Run a SELECT with positional binds (`:1`, `:2`, ...).
    fn query(
        &mut self,
        sql: &str,
        binds: &[&str],
    ) -> impl Future<Output = Result<QueryResult>> + Send;

    /// Execute a DDL statement.
    ///
    /// Rejections surface as `Error::Oracle`.
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions.
pub trait Connector {
    /// Session type produced by this connector.
    type Session: Session;

    /// Open a ready-to-query session.
    fn connect(
        &self,
        params: &ConnectString,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}
