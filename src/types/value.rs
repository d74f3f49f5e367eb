//! Oracle value types for query results.

use crate::error::{Error, Result};
use std::fmt;

/// Oracle value enum representing a single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleValue {
    /// NULL value.
    Null,
    /// String value (VARCHAR2, CHAR, etc.).
    String(String),
    /// Number value as string (preserves precision).
    Number(String),
}

impl OracleValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, OracleValue::Null)
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OracleValue::String(s) => Some(s),
            OracleValue::Number(s) => Some(s),
            OracleValue::Null => None,
        }
    }

    /// Try to convert to i64.
    ///
    /// Strings holding digits are accepted as well, since catalog views
    /// expose some numeric attributes as text on older releases.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            OracleValue::Number(s) | OracleValue::String(s) => s.trim().parse().ok(),
            OracleValue::Null => None,
        }
    }

    /// Convert to an optional i64, failing on non-numeric text.
    pub fn try_i64(&self) -> Result<Option<i64>> {
        if self.is_null() {
            return Ok(None);
        }
        self.to_i64()
            .map(Some)
            .ok_or_else(|| Error::type_conversion(format!("'{}' is not an integer", self)))
    }
}

impl From<&str> for OracleValue {
    fn from(value: &str) -> Self {
        OracleValue::String(value.to_string())
    }
}

impl From<String> for OracleValue {
    fn from(value: String) -> Self {
        OracleValue::String(value)
    }
}

impl From<i64> for OracleValue {
    fn from(value: i64) -> Self {
        OracleValue::Number(value.to_string())
    }
}

impl<T: Into<OracleValue>> From<Option<T>> for OracleValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OracleValue::Null, Into::into)
    }
}

impl fmt::Display for OracleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleValue::Null => write!(f, "NULL"),
            OracleValue::String(s) => write!(f, "{}", s),
            OracleValue::Number(n) => write!(f, "{}", n),
        }
    }
}
