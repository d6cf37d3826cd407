//! MySQL DDL Generator

use crate::ddl::{default_literal_text, DdlGenerator};
use crate::dialect::Dialect;
use crate::model::{Column, ColumnType, Constraint, ConstraintKind, DeclaredType, Index, IndexKind, Table};

pub struct MySqlGenerator;

impl MySqlGenerator {
    fn quoted_table(&self, table: &Table) -> String {
        // MySQL has no schema-qualified identifiers in the model (capability
        // matrix marks `supports_schemas = false`); schema is ignored here.
        self.quote(&table.name)
    }

    fn quoted_list(&self, names: &[String]) -> String {
        names.iter().map(|n| self.quote(n)).collect::<Vec<_>>().join(", ")
    }

    fn column_clause(&self, col: &Column) -> String {
        let name = self.quote(&col.name);
        let ty = self.map_type(col);
        let mut clause = format!("{name} {ty}");
        if !col.is_nullable {
            clause.push_str(" NOT NULL");
        }
        if col.is_identity {
            clause.push_str(" AUTO_INCREMENT");
        }
        if let Some(default) = &col.default_value {
            clause.push_str(&format!(" DEFAULT {}", default_literal_text(default, &col.column_type, "1", "0")));
        }
        clause
    }

    fn constraint_clause(&self, c: &Constraint) -> String {
        match &c.kind {
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
        }
    }

}

impl DdlGenerator for MySqlGenerator {
    fn provider(&self) -> Dialect {
        Dialect::MySql
    }

    fn generate_create_table(&self, table: &Table) -> String {
        let mut lines: Vec<String> = table.columns.iter().map(|c| self.column_clause(c)).collect();
        for c in &table.constraints {
            lines.push(self.constraint_clause(c));
        }
        format!("CREATE TABLE {} (\n    {}\n);", self.quoted_table(table), lines.join(",\n    "))
    }

    fn generate_drop_table(&self, table: &Table) -> String {
        format!("DROP TABLE {};", self.quoted_table(table))
    }

    fn generate_create_index(&self, table: &Table, index: &Index) -> String {
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        let kind_prefix = match index.kind {
            IndexKind::Spatial => "SPATIAL ",
            IndexKind::FullText => "FULLTEXT ",
            _ => unique,
        };
        let using = match index.kind {
            IndexKind::Hash => " USING HASH",
            _ => "",
        };
        let cols = index
            .columns
            .iter()
            .map(|c| self.quote(&c.column_name))
            .collect::<Vec<_>>()
            .join(", ");
        let include_comment = match &index.include_columns {
            Some(cols) if !cols.is_empty() => format!(" -- INCLUDE ({}) (not honored on MySql)", self.quoted_list(cols)),
            _ => String::new(),
        };
        let where_comment = match &index.where_expression {
            Some(expr) => format!(" -- WHERE {expr} (not honored on MySql)"),
            None => String::new(),
        };
        format!(
            "CREATE {kind_prefix}INDEX {} ON {} ({cols}){using};{include_comment}{where_comment}",
            self.quote(&index.name),
            self.quoted_table(table),
        )
    }

    fn generate_drop_index(&self, table: &Table, index: &Index) -> String {
        format!("DROP INDEX {} ON {};", self.quote(&index.name), self.quoted_table(table))
    }

    fn generate_alter_add_column(&self, table: &Table, column: &Column) -> String {
        format!("ALTER TABLE {} ADD COLUMN {};", self.quoted_table(table), self.column_clause(column))
    }

    fn generate_alter_drop_column(&self, table: &Table, column: &Column) -> String {
        format!("ALTER TABLE {} DROP COLUMN {};", self.quoted_table(table), self.quote(&column.name))
    }

    fn generate_alter_alter_column(&self, table: &Table, _current: &Column, target: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {};",
            self.quoted_table(table),
            self.column_clause(target)
        )]
    }

    fn generate_alter_add_constraint(&self, table: &Table, constraint: &Constraint) -> String {
        format!("ALTER TABLE {} ADD {};", self.quoted_table(table), self.constraint_clause(constraint))
    }

    /// MySQL cannot `DROP CONSTRAINT` a foreign key the way the other
    /// dialects do — it requires the `DROP FOREIGN KEY` spelling.
    fn generate_alter_drop_constraint(&self, table: &Table, constraint: &Constraint) -> String {
        let t = self.quoted_table(table);
        match &constraint.kind {
            ConstraintKind::ForeignKey { .. } => {
                format!("ALTER TABLE {t} DROP FOREIGN KEY {};", self.quote(&constraint.name))
            }
            ConstraintKind::PrimaryKey { .. } => format!("ALTER TABLE {t} DROP PRIMARY KEY;"),
            _ => format!("ALTER TABLE {t} DROP CONSTRAINT {};", self.quote(&constraint.name)),
        }
    }

    fn map_type(&self, column: &Column) -> String {
        if let ColumnType::Raw(raw) = &column.column_type {
            return raw.clone();
        }
        let ColumnType::Declared(declared) = &column.column_type else {
            unreachable!()
        };
        match declared {
            DeclaredType::Bool => "BOOLEAN".to_string(),
            DeclaredType::Int16 => "SMALLINT".to_string(),
            DeclaredType::Int32 => "INT".to_string(),
            DeclaredType::Int64 => "BIGINT".to_string(),
            DeclaredType::Byte => "TINYINT".to_string(),
            DeclaredType::Float32 => "FLOAT".to_string(),
            DeclaredType::Float64 => "DOUBLE".to_string(),
            DeclaredType::Decimal => match (column.precision, column.scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p},{s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => "DECIMAL".to_string(),
            },
            DeclaredType::String => match column.max_length {
                Some(n) if n > 0 => format!("VARCHAR({n})"),
                _ => "TEXT".to_string(),
            },
            DeclaredType::Text => "TEXT".to_string(),
            DeclaredType::DateTime => "DATETIME".to_string(),
            // MySQL has no timezone-aware datetime type; preserved as plain
            // DATETIME, the offset component does not round-trip.
            DeclaredType::DateTimeOffset => "DATETIME".to_string(),
            DeclaredType::TimeSpan => "TIME".to_string(),
            DeclaredType::Guid => "CHAR(36)".to_string(),
            DeclaredType::Binary => match column.max_length {
                Some(n) if n > 0 => format!("VARBINARY({n})"),
                _ => "BLOB".to_string(),
            },
            DeclaredType::Json => "JSON".to_string(),
        }
    }
}
