//! Error types for audit DDL generation.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for catalog introspection, DDL generation and execution.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid connect string.
    #[error("Invalid connect string: {message}")]
    InvalidConnectString { message: String },

    /// The connector could not produce a session.
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Connecting took longer than the configured timeout.
    #[error("Connection to {target} timed out after {timeout:?}")]
    ConnectionTimeout { target: String, timeout: Duration },

    /// Malformed or missing arguments to a catalog call.
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Identifier rejected before interpolation into SQL text.
    #[error("Invalid identifier for {parameter} '{value}': {reason}")]
    InvalidIdentifier {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Oracle database error.
    #[error("ORA-{code:05}: {message}")]
    Oracle { code: u32, message: String },

    /// A generated DDL statement was rejected; remaining statements were not run.
    #[error("Statement {index} for {object} failed: {source}")]
    StatementFailed {
        object: String,
        index: usize,
        sql: String,
        #[source]
        source: Box<Error>,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    /// Type conversion error.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Null value error.
    #[error("Unexpected NULL value in column {column}")]
    NullValue { column: String },
}

impl Error {
    /// Create a catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create an Oracle database error.
    pub fn oracle(code: u32, message: impl Into<String>) -> Self {
        Self::Oracle {
            code,
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Oracle error code, looking through statement failures.
    pub fn oracle_code(&self) -> Option<u32> {
        match self {
            Error::Oracle { code, .. } => Some(*code),
            Error::StatementFailed { source, .. } => source.oracle_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_error_format() {
        let err = Error::oracle(942, "table or view does not exist");
        assert_eq!(err.to_string(), "ORA-00942: table or view does not exist");
    }

    #[test]
    fn test_statement_failed_exposes_code() {
        let err = Error::StatementFailed {
            object: "AUD$EMP".to_string(),
            index: 0,
            sql: "CREATE TABLE AUD$EMP AS SELECT * FROM EMP WHERE 1=0".to_string(),
            source: Box::new(Error::oracle(955, "name is already used by an existing object")),
        };
        assert_eq!(err.oracle_code(), Some(955));
        assert!(err.to_string().starts_with("Statement 0 for AUD$EMP failed: ORA-00955"));
        assert_eq!(Error::catalog("x").oracle_code(), None);
    }
}
