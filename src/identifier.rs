//! Oracle identifier validation.
//!
//! Object and column names are interpolated into generated DDL as plain
//! text, so every name is checked against the unquoted-identifier rules
//! before it reaches a statement.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Longest identifier accepted (Oracle 12.2+ limit).
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*$").expect("identifier pattern compiles")
});

/// Validate an unquoted Oracle identifier.
///
/// `parameter` names the argument in the error.
pub fn validate_identifier(value: &str, parameter: &str) -> Result<()> {
    let reject = |reason: &str| Error::InvalidIdentifier {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(reject("identifier cannot be empty"));
    }
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(reject("identifier is longer than 128 characters"));
    }
    if !IDENTIFIER.is_match(value) {
        return Err(reject(
            "identifier must start with a letter and contain only letters, digits, _, $ or #",
        ));
    }
    Ok(())
}

/// An optionally schema-qualified object name, upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Owning schema, when given.
    pub schema: Option<String>,
    /// Object name.
    pub name: String,
}

impl QualifiedName {
    /// Parse `name` or `schema.name`.
    pub fn parse(value: &str, parameter: &str) -> Result<Self> {
        let value = value.trim();
        let (schema, name) = match value.split_once('.') {
            Some((schema, name)) => {
                validate_identifier(schema, parameter)?;
                (Some(schema.to_ascii_uppercase()), name)
            }
            None => (None, value),
        };
        validate_identifier(name, parameter)?;
        Ok(Self {
            schema,
            name: name.to_ascii_uppercase(),
        })
    }

    /// A sibling object in the same schema.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            schema: self.schema.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
