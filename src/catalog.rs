//! Catalog introspection: column descriptors and object existence.
//!
//! Unqualified names are resolved through the `USER_*` dictionary views,
//! `schema.name` through the `ALL_*` views filtered by owner.

use crate::error::{Error, Result};
use crate::identifier::{validate_identifier, QualifiedName};
use crate::session::Session;
use crate::types::Row;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// Date format applied to DATE columns.
pub const DATE_FORMAT: &str = "YYYYMMDD.HH24MISS";

/// Display width of a DATE column rendered with [`DATE_FORMAT`].
pub const DATE_WIDTH: i64 = 17;

const USER_COLUMNS_SQL: &str = "SELECT COLUMN_NAME, COLUMN_ID, DATA_TYPE, DATA_LENGTH, \
     DATA_PRECISION, DATA_SCALE, NULLABLE FROM USER_TAB_COLUMNS \
     WHERE TABLE_NAME = :1 ORDER BY COLUMN_ID";

const ALL_COLUMNS_SQL: &str = "SELECT COLUMN_NAME, COLUMN_ID, DATA_TYPE, DATA_LENGTH, \
     DATA_PRECISION, DATA_SCALE, NULLABLE FROM ALL_TAB_COLUMNS \
     WHERE OWNER = :1 AND TABLE_NAME = :2 ORDER BY COLUMN_ID";

const USER_COMMENTS_SQL: &str =
    "SELECT COLUMN_NAME, COMMENTS FROM USER_COL_COMMENTS WHERE TABLE_NAME = :1";

const ALL_COMMENTS_SQL: &str =
    "SELECT COLUMN_NAME, COMMENTS FROM ALL_COL_COMMENTS WHERE OWNER = :1 AND TABLE_NAME = :2";

const USER_OBJECTS_SQL: &str =
    "SELECT OBJECT_NAME FROM USER_OBJECTS WHERE OBJECT_NAME = :1 AND OBJECT_TYPE = :2";

const ALL_OBJECTS_SQL: &str = "SELECT OBJECT_NAME FROM ALL_OBJECTS \
     WHERE OWNER = :1 AND OBJECT_NAME = :2 AND OBJECT_TYPE = :3";

/// Kind of schema object, as named in the `OBJECT_TYPE` catalog column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectKind {
    #[default]
    Table,
    View,
    Trigger,
    Sequence,
    Synonym,
}

impl ObjectKind {
    /// Catalog spelling of the object type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Trigger => "TRIGGER",
            ObjectKind::Sequence => "SEQUENCE",
            ObjectKind::Synonym => "SYNONYM",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One table column as described by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Upper-cased column name.
    pub name: String,
    /// 0-based position (`COLUMN_ID - 1`).
    pub sequence: usize,
    /// Catalog type name, e.g. `NUMBER`, `VARCHAR2`, `DATE`.
    pub sql_type: String,
    /// Precision for numeric columns, declared length otherwise.
    pub width: i64,
    /// Catalog `DATA_LENGTH`.
    pub max_length: i64,
    /// Whether the catalog reports a nonzero precision.
    pub numeric: bool,
    /// Catalog scale, for numeric columns only.
    pub decimal_scale: Option<i64>,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// [`DATE_FORMAT`] for date columns, empty otherwise.
    pub date_format: String,
    /// Column comment, empty when none is recorded.
    pub comment: String,
}

impl ColumnDescriptor {
    /// Check if the column is a date column.
    pub fn is_date(&self) -> bool {
        !self.date_format.is_empty()
    }

    /// Check if the column carries numeric precision.
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    fn from_row(row: &Row, comments: &HashMap<String, String>) -> Result<Self> {
        let name = row.string("COLUMN_NAME")?;
        validate_identifier(&name, "column_name")?;
        if name.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(Error::InvalidIdentifier {
                parameter: "column_name".to_string(),
                value: name,
                reason: "quoted lower-case column names are not supported".to_string(),
            });
        }
        let column_id = row.opt_i64("COLUMN_ID")?.ok_or_else(|| Error::NullValue {
            column: "COLUMN_ID".to_string(),
        })?;
        let sequence = column_id
            .checked_sub(1)
            .and_then(|seq| usize::try_from(seq).ok())
            .ok_or_else(|| {
                Error::catalog(format!("column {} has invalid position {}", name, column_id))
            })?;
        let sql_type = row.string("DATA_TYPE")?;
        let length = row.opt_i64("DATA_LENGTH")?.unwrap_or(0);
        let precision = row.opt_i64("DATA_PRECISION")?;
        let scale = row.opt_i64("DATA_SCALE")?;

        let (mut width, numeric) = match precision {
            Some(p) if p != 0 => (p, true),
            _ => (length, false),
        };
        let decimal_scale = if numeric { scale } else { None };
        let mut max_length = length;
        let mut date_format = String::new();
        if sql_type.to_ascii_lowercase().contains("date") {
            width = DATE_WIDTH;
            max_length = DATE_WIDTH;
            date_format = DATE_FORMAT.to_string();
        }

        let comment = comments
            .get(&name.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            nullable: is_nullable(row.opt_string("NULLABLE")?.as_deref()),
            name,
            sequence,
            sql_type,
            width,
            max_length,
            numeric,
            decimal_scale,
            date_format,
            comment,
        })
    }
}

/// `N` and `NOT NULL` mark mandatory columns; anything else is nullable.
fn is_nullable(flag: Option<&str>) -> bool {
    match flag.map(|f| f.trim().to_ascii_uppercase()) {
        Some(f) => f != "N" && f != "NOT NULL",
        None => true,
    }
}

/// Catalog description of one table.
#[derive(Debug, Clone)]
pub struct TableDescription {
    /// Table that was described.
    pub table: QualifiedName,
    /// Column names joined with commas, in sequence order.
    pub column_names: String,
    /// Columns in sequence order.
    pub columns: Vec<ColumnDescriptor>,
    /// Comments keyed by lower-cased column name.
    pub comments: HashMap<String, String>,
}

impl TableDescription {
    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if no columns were found.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in sequence order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find a column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Name-indexed view of the columns.
    pub fn by_name(&self) -> BTreeMap<&str, &ColumnDescriptor> {
        self.columns.iter().map(|c| (c.name.as_str(), c)).collect()
    }
}

/// Describe the columns of `table_name`, optionally restricted to `column_filter`.
///
/// Sequences always reflect the catalog position, also when a filter drops
/// columns in between.
pub async fn describe_table<S: Session>(
    session: &mut S,
    table_name: &str,
    column_filter: Option<&[&str]>,
) -> Result<TableDescription> {
    if table_name.trim().is_empty() {
        return Err(Error::catalog("describe_table requires a table name"));
    }
    let table = QualifiedName::parse(table_name, "table_name")?;
    debug!(table = %table, "describing table");

    let (columns_result, comments_result) = match &table.schema {
        Some(owner) => {
            let binds = [owner.as_str(), table.name.as_str()];
            (
                session.query(ALL_COLUMNS_SQL, &binds).await?,
                session.query(ALL_COMMENTS_SQL, &binds).await?,
            )
        }
        None => {
            let binds = [table.name.as_str()];
            (
                session.query(USER_COLUMNS_SQL, &binds).await?,
                session.query(USER_COMMENTS_SQL, &binds).await?,
            )
        }
    };

    let mut comments = HashMap::new();
    for row in &comments_result {
        if let Some(comment) = row.opt_string("COMMENTS")? {
            comments.insert(row.string("COLUMN_NAME")?.to_ascii_lowercase(), comment);
        }
    }

    let mut columns = Vec::with_capacity(columns_result.len());
    for row in &columns_result {
        let column = ColumnDescriptor::from_row(row, &comments)?;
        let keep = column_filter.map_or(true, |filter| {
            filter.iter().any(|f| f.eq_ignore_ascii_case(&column.name))
        });
        if keep {
            columns.push(column);
        }
    }
    columns.sort_by_key(|c| c.sequence);

    let column_names = columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    debug!(table = %table, columns = columns.len(), "table described");

    Ok(TableDescription {
        table,
        column_names,
        columns,
        comments,
    })
}

/// Check whether an object of `kind` named `object_name` exists.
pub async fn object_exists<S: Session>(
    session: &mut S,
    object_name: &str,
    kind: ObjectKind,
) -> Result<bool> {
    if object_name.trim().is_empty() {
        return Err(Error::catalog("object_exists requires an object name"));
    }
    let object = QualifiedName::parse(object_name, "object_name")?;

    let result = match &object.schema {
        Some(owner) => {
            session
                .query(
                    ALL_OBJECTS_SQL,
                    &[owner.as_str(), object.name.as_str(), kind.as_str()],
                )
                .await?
        }
        None => {
            session
                .query(USER_OBJECTS_SQL, &[object.name.as_str(), kind.as_str()])
                .await?
        }
    };

    let exists = !result.is_empty();
    debug!(object = %object, kind = %kind, exists, "object lookup");
    Ok(exists)
}
