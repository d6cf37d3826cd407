//! SQLite DDL Generator
//!
//! SQLite's ALTER TABLE support is the narrowest of the four dialects: only
//! `ADD COLUMN` and renames are native. Column-type/nullability changes are
//! emitted as a best-effort statement with a comment, matching what the
//! driver would actually have to do (rebuild the table under a temporary
//! name, copy rows, drop, rename) — the full rebuild sequence is a
//! Non-goal (no data migration/backfill in the core).

use crate::ddl::{default_literal_text, DdlGenerator};
use crate::dialect::Dialect;
use crate::model::{Column, ColumnType, Constraint, ConstraintKind, DeclaredType, Index, Table};

pub struct SqliteGenerator;

impl SqliteGenerator {
    fn quoted_table(&self, table: &Table) -> String {
        self.quote(&table.name)
    }

    fn quoted_list(&self, names: &[String]) -> String {
        names.iter().map(|n| self.quote(n)).collect::<Vec<_>>().join(", ")
    }

    /// True when this column is the single-column integer-identity primary
    /// key — the one case SQLite expresses inline (`INTEGER PRIMARY KEY
    /// AUTOINCREMENT`) rather than as a table-level constraint.
    fn is_inline_identity_pk(&self, table: &Table, col: &Column) -> bool {
        col.is_identity
            && table
                .primary_key()
                .map(|pk| matches!(&pk.kind, ConstraintKind::PrimaryKey { columns } if columns == &[col.name.clone()]))
                .unwrap_or(false)
    }

    fn column_clause(&self, table: &Table, col: &Column) -> String {
        let name = self.quote(&col.name);
        if self.is_inline_identity_pk(table, col) {
            return format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT");
        }
        let ty = self.map_type(col);
        let mut clause = format!("{name} {ty}");
        if !col.is_nullable {
            clause.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default_value {
            clause.push_str(&format!(" DEFAULT {}", default_literal_text(default, &col.column_type, "1", "0")));
        }
        clause
    }

    fn constraint_clause(&self, table: &Table, c: &Constraint) -> Option<String> {
        if let ConstraintKind::PrimaryKey { columns } = &c.kind
            && columns.len() == 1
            && table
                .get_column(&columns[0])
                .is_some_and(|col| self.is_inline_identity_pk(table, col))
        {
            // Already expressed inline on the column; the table-level
            // constraint would be redundant (and SQLite syntax forbids it
            // alongside an inline AUTOINCREMENT anyway).
            return None;
        }
        Some(match &c.kind {
            ConstraintKind::PrimaryKey { columns } => {
                format!("CONSTRAINT {} PRIMARY KEY ({})", self.quote(&c.name), self.quoted_list(columns))
            }
            ConstraintKind::Unique { columns } => {
                format!("CONSTRAINT {} UNIQUE ({})", self.quote(&c.name), self.quoted_list(columns))
            }
            ConstraintKind::ForeignKey {
                columns,
                referenced_table,
                referenced_columns,
                on_delete,
                on_update,
            } => format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
                self.quote(&c.name),
                self.quoted_list(columns),
                self.quote(referenced_table),
                self.quoted_list(referenced_columns),
                on_delete,
                on_update,
            ),
            ConstraintKind::Check { expression } => {
                format!("CONSTRAINT {} CHECK ({expression})", self.quote(&c.name))
            }
        })
    }
}

impl DdlGenerator for SqliteGenerator {
    fn provider(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn generate_create_table(&self, table: &Table) -> String {
        // Referential actions on foreign keys are emitted here but not
        // enforced unless the connection has run `PRAGMA foreign_keys=ON`
        // — the caller is warned about this separately, not by the
        // generator itself.
        let mut lines: Vec<String> = table.columns.iter().map(|c| self.column_clause(table, c)).collect();
        for c in &table.constraints {
            if let Some(clause) = self.constraint_clause(table, c) {
                lines.push(clause);
            }
        }
        format!("CREATE TABLE {} (\n    {}\n);", self.quoted_table(table), lines.join(",\n    "))
    }

    fn generate_drop_table(&self, table: &Table) -> String {
        format!("DROP TABLE {};", self.quoted_table(table))
    }

    fn generate_create_index(&self, table: &Table, index: &Index) -> String {
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        let cols = index
            .columns
            .iter()
            .map(|c| {
                let dir = if c.descending { " DESC" } else { "" };
                format!("{}{dir}", self.quote(&c.column_name))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let include_comment = match &index.include_columns {
            Some(cols) if !cols.is_empty() => format!(" -- INCLUDE ({}) (not honored on Sqlite)", self.quoted_list(cols)),
            _ => String::new(),
        };
        let wher = match &index.where_expression {
            Some(expr) => format!(" WHERE {expr}"),
            None => String::new(),
        };
        format!(
            "CREATE {unique}INDEX {} ON {} ({cols}){wher};{include_comment}",
            self.quote(&index.name),
            self.quoted_table(table),
        )
    }

    fn generate_drop_index(&self, _table: &Table, index: &Index) -> String {
        format!("DROP INDEX {};", self.quote(&index.name))
    }

    fn generate_alter_add_column(&self, table: &Table, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            self.quoted_table(table),
            self.column_clause(table, column)
        )
    }

    fn generate_alter_drop_column(&self, table: &Table, column: &Column) -> String {
        format!("ALTER TABLE {} DROP COLUMN {};", self.quoted_table(table), self.quote(&column.name))
    }

    fn generate_alter_alter_column(&self, table: &Table, _current: &Column, target: &Column) -> Vec<String> {
        vec![format!(
            "-- SQLite cannot alter a column's type/nullability in place; \
             rebuild required: CREATE new table, copy rows, DROP old, RENAME. \
             Target shape: {}",
            self.column_clause(table, target)
        )]
    }

    fn generate_alter_add_constraint(&self, table: &Table, constraint: &Constraint) -> String {
        match self.constraint_clause(table, constraint) {
            Some(clause) => format!(
                "-- SQLite cannot ADD a table-level constraint in place; rebuild required: {clause}"
            ),
            None => String::new(),
        }
    }

    fn generate_alter_drop_constraint(&self, _table: &Table, constraint: &Constraint) -> String {
        format!(
            "-- SQLite cannot DROP a table-level constraint in place; rebuild required to remove {}",
            self.quote(&constraint.name)
        )
    }

    fn map_type(&self, column: &Column) -> String {
        if let ColumnType::Raw(raw) = &column.column_type {
            return raw.clone();
        }
        let ColumnType::Declared(declared) = &column.column_type else {
            unreachable!()
        };
        match declared {
            DeclaredType::Bool
            | DeclaredType::Int16
            | DeclaredType::Int32
            | DeclaredType::Int64
            | DeclaredType::Byte => "INTEGER".to_string(),
            DeclaredType::Float32 | DeclaredType::Float64 => "REAL".to_string(),
            DeclaredType::Decimal => "NUMERIC".to_string(),
            DeclaredType::String
            | DeclaredType::Text
            | DeclaredType::DateTime
            | DeclaredType::DateTimeOffset
            | DeclaredType::TimeSpan
            | DeclaredType::Guid => "TEXT".to_string(),
            DeclaredType::Binary => "BLOB".to_string(),
            DeclaredType::Json => "TEXT".to_string(),
        }
    }
}
