//! Audit table and trigger DDL assembly.
//!
//! Everything here is pure text generation over already validated names;
//! catalog access and decisions about existing objects live in
//! [`crate::generator`].

use crate::catalog::ColumnDescriptor;
use crate::identifier::QualifiedName;

/// Prefix of generated audit table names.
pub const AUDIT_TABLE_PREFIX: &str = "AUD$";

/// Prefix of generated trigger names.
pub const TRIGGER_PREFIX: &str = "TRG$";

/// Audit columns appended to the audit table, in order.
pub const AUDIT_COLUMNS: [&str; 3] = ["AUDIT_ACTION", "AUDIT_DTM", "AUDIT_USER"];

/// Trigger-local variable holding the operation code.
pub const OPERATION_VARIABLE: &str = "v_operation";

/// Values inserted for the audit columns, matching [`AUDIT_COLUMNS`].
pub const AUDIT_VALUES: [&str; 3] = [OPERATION_VARIABLE, "SYSDATE", "USER"];

const FRAGMENT_INDENT: &str = "            ";

/// Default audit table name for `table`: `AUD$<TABLE>` in the same schema.
pub fn audit_table_name(table: &QualifiedName) -> QualifiedName {
    table.sibling(format!("{}{}", AUDIT_TABLE_PREFIX, table.name))
}

/// Default trigger name for `table`: `TRG$<TABLE>` in the same schema.
pub fn trigger_name(table: &QualifiedName) -> QualifiedName {
    table.sibling(format!("{}{}", TRIGGER_PREFIX, table.name))
}

/// Statements creating the audit table, optionally preceded by a DROP.
pub fn audit_table_statements(
    audit: &QualifiedName,
    table: &QualifiedName,
    drop_first: bool,
) -> Vec<String> {
    let mut statements = Vec::with_capacity(3);
    if drop_first {
        statements.push(format!("DROP TABLE {}", audit));
    }
    statements.push(format!(
        "CREATE TABLE {} AS SELECT * FROM {} WHERE 1=0",
        audit, table
    ));
    statements.push(format!(
        "ALTER TABLE {} ADD (audit_action CHAR(3), audit_dtm DATE, audit_user VARCHAR2(30))",
        audit
    ));
    statements
}

/// Column lists embedded in the trigger body.
///
/// Each list holds one entry per source column followed by the three audit
/// entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFragments {
    /// Audit table column names.
    pub targets: Vec<String>,
    /// `:new.<COLUMN>` references for INSERT and UPDATE.
    pub new_values: Vec<String>,
    /// `:old.<COLUMN>` references for DELETE.
    pub old_values: Vec<String>,
}

impl ColumnFragments {
    /// Build the lists from descriptors, in sequence order.
    pub fn build(columns: &[ColumnDescriptor]) -> Self {
        let mut ordered: Vec<&ColumnDescriptor> = columns.iter().collect();
        ordered.sort_by_key(|c| c.sequence);

        let capacity = ordered.len() + AUDIT_COLUMNS.len();
        let mut targets = Vec::with_capacity(capacity);
        let mut new_values = Vec::with_capacity(capacity);
        let mut old_values = Vec::with_capacity(capacity);

        for column in ordered {
            let name = column.name.to_ascii_uppercase();
            new_values.push(format!(":new.{}", name));
            old_values.push(format!(":old.{}", name));
            targets.push(name);
        }
        targets.extend(AUDIT_COLUMNS.iter().map(|c| c.to_string()));
        for values in [&mut new_values, &mut old_values] {
            values.extend(AUDIT_VALUES.iter().map(|v| v.to_string()));
        }

        Self {
            targets,
            new_values,
            old_values,
        }
    }

    /// Number of entries in each list.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Always false: the audit entries are present even without source columns.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Render entries one per line, indented, comma-separated.
pub fn render_fragment(entries: &[String]) -> String {
    let mut out = String::new();
    let last = entries.len().saturating_sub(1);
    for (idx, entry) in entries.iter().enumerate() {
        out.push_str(FRAGMENT_INDENT);
        out.push_str(entry);
        if idx != last {
            out.push(',');
        }
        out.push('\n');
    }
    out
}

/// The `CREATE OR REPLACE TRIGGER` statement copying every row change of
/// `table` into `audit`.
pub fn trigger_statement(
    trigger: &QualifiedName,
    table: &QualifiedName,
    audit: &QualifiedName,
    fragments: &ColumnFragments,
) -> String {
    let targets = render_fragment(&fragments.targets);
    let new_values = render_fragment(&fragments.new_values);
    let old_values = render_fragment(&fragments.old_values);
    let var = OPERATION_VARIABLE;

    format!(
        "CREATE OR REPLACE TRIGGER {trigger}\n\
         AFTER INSERT OR DELETE OR UPDATE ON {table}\n\
         FOR EACH ROW\n\
         DECLARE\n\
         \x20   {var} VARCHAR2(3);\n\
         BEGIN\n\
         \x20   IF INSERTING THEN\n\
         \x20       {var} := 'INS';\n\
         \x20   ELSIF UPDATING THEN\n\
         \x20       {var} := 'UPD';\n\
         \x20   ELSE\n\
         \x20       {var} := 'DEL';\n\
         \x20   END IF;\n\
         \n\
         \x20   IF INSERTING OR UPDATING THEN\n\
         \x20       INSERT INTO {audit} (\n\
         {targets}\
         \x20       ) VALUES (\n\
         {new_values}\
         \x20       );\n\
         \x20   ELSE\n\
         \x20       INSERT INTO {audit} (\n\
         {targets}\
         \x20       ) VALUES (\n\
         {old_values}\
         \x20       );\n\
         \x20   END IF;\n\
         END;"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, sequence: usize, sql_type: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            sequence,
            sql_type: sql_type.to_string(),
            width: 10,
            max_length: 10,
            numeric: false,
            decimal_scale: None,
            nullable: true,
            date_format: String::new(),
            comment: String::new(),
        }
    }

    fn emp() -> QualifiedName {
        QualifiedName::parse("emp", "table").unwrap()
    }

    #[test]
    fn test_default_names() {
        assert_eq!(audit_table_name(&emp()).to_string(), "AUD$EMP");
        assert_eq!(trigger_name(&emp()).to_string(), "TRG$EMP");

        let scoped = QualifiedName::parse("scott.emp", "table").unwrap();
        assert_eq!(audit_table_name(&scoped).to_string(), "SCOTT.AUD$EMP");
        assert_eq!(trigger_name(&scoped).to_string(), "SCOTT.TRG$EMP");
    }

    #[test]
    fn test_audit_table_statements() {
        let audit = audit_table_name(&emp());
        let statements = audit_table_statements(&audit, &emp(), false);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE AUD$EMP AS SELECT * FROM EMP WHERE 1=0",
                "ALTER TABLE AUD$EMP ADD (audit_action CHAR(3), audit_dtm DATE, audit_user VARCHAR2(30))",
            ]
        );

        let statements = audit_table_statements(&audit, &emp(), true);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0], "DROP TABLE AUD$EMP");
        assert!(statements[1].starts_with("CREATE TABLE AUD$EMP"));
        assert!(statements[2].starts_with("ALTER TABLE AUD$EMP"));
    }

    #[test]
    fn test_fragment_lengths_and_trailing_entries() {
        for n in 0..6 {
            let columns: Vec<_> = (0..n)
                .map(|i| column(&format!("c{}", i), i, "VARCHAR2"))
                .collect();
            let fragments = ColumnFragments::build(&columns);
            assert_eq!(fragments.targets.len(), n + 3);
            assert_eq!(fragments.new_values.len(), n + 3);
            assert_eq!(fragments.old_values.len(), n + 3);
            assert_eq!(fragments.targets[n..].to_vec(), AUDIT_COLUMNS.to_vec());
            assert_eq!(fragments.new_values[n..].to_vec(), AUDIT_VALUES.to_vec());
            assert_eq!(fragments.old_values[n..].to_vec(), AUDIT_VALUES.to_vec());
            assert_eq!(render_fragment(&fragments.targets).lines().count(), n + 3);
        }
    }

    #[test]
    fn test_fragments_follow_sequence_and_upper_case() {
        let columns = vec![
            column("name", 1, "VARCHAR2"),
            column("id", 0, "NUMBER"),
        ];
        let fragments = ColumnFragments::build(&columns);
        assert_eq!(fragments.targets[..2].to_vec(), vec!["ID", "NAME"]);
        assert_eq!(fragments.new_values[0], ":new.ID");
        assert_eq!(fragments.old_values[1], ":old.NAME");
    }

    #[test]
    fn test_render_fragment() {
        let rendered = render_fragment(&["A".to_string(), "B".to_string()]);
        assert_eq!(rendered, "            A,\n            B\n");
        assert_eq!(render_fragment(&[]), "");
    }

    #[test]
    fn test_trigger_statement() {
        let columns = vec![
            column("ID", 0, "NUMBER"),
            column("NAME", 1, "VARCHAR2"),
            column("CREATED_ON", 2, "DATE"),
        ];
        let fragments = ColumnFragments::build(&columns);
        let table = emp();
        let sql = trigger_statement(
            &trigger_name(&table),
            &table,
            &audit_table_name(&table),
            &fragments,
        );

        assert!(sql.starts_with(
            "CREATE OR REPLACE TRIGGER TRG$EMP\nAFTER INSERT OR DELETE OR UPDATE ON EMP\nFOR EACH ROW\n"
        ));
        assert!(sql.contains("    v_operation VARCHAR2(3);\n"));
        assert!(sql.contains("IF INSERTING THEN\n        v_operation := 'INS';"));
        assert!(sql.contains("ELSIF UPDATING THEN\n        v_operation := 'UPD';"));
        assert!(sql.contains("ELSE\n        v_operation := 'DEL';"));
        assert!(sql.contains(
            "            :new.ID,\n            :new.NAME,\n            :new.CREATED_ON,\n            v_operation,\n            SYSDATE,\n            USER\n"
        ));
        assert!(sql.contains(
            "            :old.ID,\n            :old.NAME,\n            :old.CREATED_ON,\n            v_operation,\n            SYSDATE,\n            USER\n"
        ));
        assert_eq!(sql.matches("INSERT INTO AUD$EMP (").count(), 2);
        assert!(sql.contains("            AUDIT_ACTION,\n            AUDIT_DTM,\n            AUDIT_USER\n        ) VALUES ("));
        assert!(sql.ends_with("    END IF;\nEND;"));

        // :new values precede the delete branch.
        let new_pos = sql.find(":new.ID").unwrap();
        let old_pos = sql.find(":old.ID").unwrap();
        assert!(new_pos < old_pos);
    }
}
