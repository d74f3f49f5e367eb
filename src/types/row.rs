//! Row type for query results.

use std::sync::Arc;

use super::value::OracleValue;
use crate::error::{Error, Result};

/// A row of query results.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values.
    values: Vec<OracleValue>,
    /// Column names shared by every row of a result set.
    columns: Arc<[String]>,
}

impl Row {
    /// Create a new row with values and shared column names.
    pub fn new(values: Vec<OracleValue>, columns: Arc<[String]>) -> Self {
        Self { values, columns }
    }

    /// Get value by column index (0-based).
    pub fn get(&self, index: usize) -> Option<&OracleValue> {
        self.values.get(index)
    }

    /// Get value by column name (case-insensitive).
    pub fn get_by_name(&self, name: &str) -> Option<&OracleValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a column that must be present.
    pub fn value(&self, name: &str) -> Result<&OracleValue> {
        self.get_by_name(name).ok_or_else(|| Error::ColumnNotFound {
            name: name.to_string(),
        })
    }

    /// Get a non-NULL text column.
    pub fn string(&self, name: &str) -> Result<String> {
        self.opt_string(name)?.ok_or_else(|| Error::NullValue {
            column: name.to_string(),
        })
    }

    /// Get a text column that may be NULL.
    pub fn opt_string(&self, name: &str) -> Result<Option<String>> {
        Ok(self.value(name)?.as_str().map(str::to_string))
    }

    /// Get an integer column that may be NULL.
    pub fn opt_i64(&self, name: &str) -> Result<Option<i64>> {
        self.value(name)?.try_i64()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.as_str()).collect()
    }

    /// Iterate over values.
    pub fn iter(&self) -> impl Iterator<Item = &OracleValue> {
        self.values.iter()
    }
}

impl IntoIterator for Row {
    type Item = OracleValue;
    type IntoIter = std::vec::IntoIter<OracleValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a OracleValue;
    type IntoIter = std::slice::Iter<'a, OracleValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row() -> Row {
        let columns: Arc<[String]> = vec!["COLUMN_NAME".to_string(), "DATA_SCALE".to_string()].into();
        Row::new(
            vec![OracleValue::from("ID"), OracleValue::Null],
            columns,
        )
    }

    #[test]
    fn test_row_access() {
        let row = make_row();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&OracleValue::from("ID")));
        assert_eq!(row.get_by_name("column_name"), row.get_by_name("COLUMN_NAME"));
        assert_eq!(row.string("column_name").unwrap(), "ID");
        assert_eq!(row.opt_i64("DATA_SCALE").unwrap(), None);
        assert_eq!(row.column_names(), vec!["COLUMN_NAME", "DATA_SCALE"]);
    }

    #[test]
    fn test_row_missing_and_null_columns() {
        let row = make_row();
        assert!(matches!(row.value("COMMENTS"), Err(Error::ColumnNotFound { .. })));
        assert!(matches!(row.string("DATA_SCALE"), Err(Error::NullValue { .. })));
    }
}
