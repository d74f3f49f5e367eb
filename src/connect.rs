//! Connect string parsing for the supported database kinds.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Kind of database a connect string addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbKind {
    /// Oracle: `user/password@identifier`.
    #[default]
    Oracle,
    /// Flat-file catalog: a filesystem path.
    File,
    /// ODBC: `user/password@dsn[:approle/approle_password]`.
    Odbc,
}

impl FromStr for DbKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" | "ora" => Ok(DbKind::Oracle),
            "file" | "csv" => Ok(DbKind::File),
            "odbc" => Ok(DbKind::Odbc),
            other => Err(Error::InvalidConnectString {
                message: format!("Unknown database kind: {}", other),
            }),
        }
    }
}

/// Application role activated after an ODBC connect.
#[derive(Clone, PartialEq, Eq)]
pub struct AppRole {
    /// Role name.
    pub name: String,
    /// Role password.
    pub password: String,
}

impl fmt::Debug for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRole")
            .field("name", &self.name)
            .field("password", &"***")
            .finish()
    }
}

/// Parsed connect string.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectString {
    /// Database kind.
    pub kind: DbKind,
    /// User name (absent for file catalogs).
    pub user: Option<String>,
    /// Password (absent for file catalogs).
    pub password: Option<String>,
    /// TNS alias / EZConnect string, ODBC DSN, or file path.
    pub identifier: String,
    /// Optional application role (ODBC only).
    pub app_role: Option<AppRole>,
}

impl ConnectString {
    /// Parse a connect string of the given kind.
    ///
    /// # Example
    ///
    /// ```
    /// use oracle_audit_rs::{ConnectString, DbKind};
    ///
    /// let cs = ConnectString::parse(DbKind::Oracle, "scott/tiger@localhost:1521/FREEPDB1").unwrap();
    /// assert_eq!(cs.user.as_deref(), Some("scott"));
    /// assert_eq!(cs.identifier, "localhost:1521/FREEPDB1");
    /// assert_eq!(cs.to_string(), "scott/***@localhost:1521/FREEPDB1");
    /// ```
    pub fn parse(kind: DbKind, conn_str: &str) -> Result<Self> {
        let conn_str = conn_str.trim();
        if conn_str.is_empty() {
            return Err(Error::InvalidConnectString {
                message: "Connect string is empty".to_string(),
            });
        }

        match kind {
            DbKind::File => Ok(Self {
                kind,
                user: None,
                password: None,
                identifier: conn_str.to_string(),
                app_role: None,
            }),
            DbKind::Oracle => {
                let (user, password, identifier) = split_credentials(conn_str)?;
                Ok(Self {
                    kind,
                    user: Some(user),
                    password: Some(password),
                    identifier,
                    app_role: None,
                })
            }
            DbKind::Odbc => {
                let (user, password, rest) = split_credentials(conn_str)?;
                let (dsn, app_role) = match rest.split_once(':') {
                    Some((dsn, role)) => {
                        let (name, password) =
                            role.split_once('/').ok_or_else(|| Error::InvalidConnectString {
                                message: "Expected application role as approle/approle_password"
                                    .to_string(),
                            })?;
                        if name.is_empty() {
                            return Err(Error::InvalidConnectString {
                                message: "Application role name is empty".to_string(),
                            });
                        }
                        (
                            dsn.to_string(),
                            Some(AppRole {
                                name: name.to_string(),
                                password: password.to_string(),
                            }),
                        )
                    }
                    None => (rest, None),
                };
                if dsn.is_empty() {
                    return Err(Error::InvalidConnectString {
                        message: "ODBC data source name is empty".to_string(),
                    });
                }
                Ok(Self {
                    kind,
                    user: Some(user),
                    password: Some(password),
                    identifier: dsn,
                    app_role,
                })
            }
        }
    }
}

/// Split `user/password@rest`.
fn split_credentials(conn_str: &str) -> Result<(String, String, String)> {
    let (creds, rest) = conn_str
        .rsplit_once('@')
        .ok_or_else(|| Error::InvalidConnectString {
            message: "Expected format: user/password@identifier".to_string(),
        })?;
    let (user, password) = creds
        .split_once('/')
        .ok_or_else(|| Error::InvalidConnectString {
            message: "Expected format: user/password@identifier".to_string(),
        })?;
    if user.is_empty() {
        return Err(Error::InvalidConnectString {
            message: "User name is empty".to_string(),
        });
    }
    if rest.is_empty() {
        return Err(Error::InvalidConnectString {
            message: "Connect identifier is empty".to_string(),
        });
    }
    Ok((user.to_string(), password.to_string(), rest.to_string()))
}

impl fmt::Display for ConnectString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}/***@", user)?;
        }
        write!(f, "{}", self.identifier)?;
        if let Some(role) = &self.app_role {
            write!(f, ":{}/***", role.name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectString")
            .field("kind", &self.kind)
            .field("user", &self.user)
            .field("identifier", &self.identifier)
            .field("app_role", &self.app_role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oracle() {
        let cs = ConnectString::parse(DbKind::Oracle, "scott/tiger@ORCL").unwrap();
        assert_eq!(cs.user.as_deref(), Some("scott"));
        assert_eq!(cs.password.as_deref(), Some("tiger"));
        assert_eq!(cs.identifier, "ORCL");
        assert!(cs.app_role.is_none());
    }

    #[test]
    fn test_parse_oracle_password_with_at_sign() {
        let cs = ConnectString::parse(DbKind::Oracle, "scott/p@ss@ORCL").unwrap();
        assert_eq!(cs.password.as_deref(), Some("p@ss"));
        assert_eq!(cs.identifier, "ORCL");
    }

    #[test]
    fn test_parse_oracle_rejects_malformed() {
        assert!(ConnectString::parse(DbKind::Oracle, "").is_err());
        assert!(ConnectString::parse(DbKind::Oracle, "scott@ORCL").is_err());
        assert!(ConnectString::parse(DbKind::Oracle, "scott/tiger").is_err());
        assert!(ConnectString::parse(DbKind::Oracle, "/tiger@ORCL").is_err());
        assert!(ConnectString::parse(DbKind::Oracle, "scott/tiger@").is_err());
    }

    #[test]
    fn test_parse_odbc_with_app_role() {
        let cs = ConnectString::parse(DbKind::Odbc, "app/secret@SALES:auditor/rolepw").unwrap();
        assert_eq!(cs.identifier, "SALES");
        let role = cs.app_role.as_ref().unwrap();
        assert_eq!(role.name, "auditor");
        assert_eq!(role.password, "rolepw");
        assert_eq!(cs.to_string(), "app/***@SALES:auditor/***");
    }

    #[test]
    fn test_parse_odbc_without_app_role() {
        let cs = ConnectString::parse(DbKind::Odbc, "app/secret@SALES").unwrap();
        assert_eq!(cs.identifier, "SALES");
        assert!(cs.app_role.is_none());
        assert!(ConnectString::parse(DbKind::Odbc, "app/secret@SALES:auditor").is_err());
    }

    #[test]
    fn test_parse_file() {
        let cs = ConnectString::parse(DbKind::File, "/var/lib/catalog").unwrap();
        assert_eq!(cs.identifier, "/var/lib/catalog");
        assert!(cs.user.is_none());
        assert_eq!(cs.to_string(), "/var/lib/catalog");
    }

    #[test]
    fn test_debug_masks_password() {
        let cs = ConnectString::parse(DbKind::Oracle, "scott/tiger@ORCL").unwrap();
        assert!(!format!("{:?}", cs).contains("tiger"));
    }

    #[test]
    fn test_db_kind_from_str() {
        assert_eq!("ORACLE".parse::<DbKind>().unwrap(), DbKind::Oracle);
        assert_eq!("odbc".parse::<DbKind>().unwrap(), DbKind::Odbc);
        assert_eq!("file".parse::<DbKind>().unwrap(), DbKind::File);
        assert!("mysql".parse::<DbKind>().is_err());
    }
}
