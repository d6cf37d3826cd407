//! SQL Server DDL Generator

use crate::ddl::{default_literal_text, DdlGenerator};
use crate::dialect::Dialect;
use crate::model::{Column, ColumnType, Constraint, ConstraintKind, DeclaredType, Index, IndexKind, Table};

pub struct SqlServerGenerator;

impl SqlServerGenerator {
    fn quoted_table(&self, table: &Table) -> String {
        match &table.schema {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(&table.name)),
            None => self.quote(&table.name),
        }
    }

    fn quoted_list(&self, names: &[String]) -> String {
        names.iter().map(|n| self.quote(n)).collect::<Vec<_>>().join(", ")
    }

    fn column_clause(&self, col: &Column) -> String {
        let name = self.quote(&col.name);
        let ty = self.map_type(col);
        let mut clause = format!("{name} {ty}");
        if col.is_identity {
            clause.push_str(" IDENTITY(1,1)");
        }
        if !col.is_nullable {
            clause.push_str(" NOT NULL");
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

impl DdlGenerator for SqlServerGenerator {
    fn provider(&self) -> Dialect {
        Dialect::SqlServer
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
        let clustering = if index.is_clustered { "CLUSTERED " } else { "NONCLUSTERED " };
        let cols = index
            .columns
            .iter()
            .map(|c| {
                let dir = if c.descending { " DESC" } else { "" };
                format!("{}{dir}", self.quote(&c.column_name))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let include = match &index.include_columns {
            Some(cols) if !cols.is_empty() => format!(" INCLUDE ({})", self.quoted_list(cols)),
            _ => String::new(),
        };
        let where_comment = match &index.where_expression {
            Some(expr) => format!(" -- WHERE {expr} (filtered indexes honored only on PostgreSql/Sqlite)"),
            None => String::new(),
        };
        format!(
            "CREATE {unique}{clustering}INDEX {} ON {} ({cols}){include};{where_comment}",
            self.quote(&index.name),
            self.quoted_table(table),
        )
    }

    fn generate_drop_index(&self, table: &Table, index: &Index) -> String {
        format!("DROP INDEX {} ON {};", self.quote(&index.name), self.quoted_table(table))
    }

    fn generate_alter_add_column(&self, table: &Table, column: &Column) -> String {
        format!("ALTER TABLE {} ADD {};", self.quoted_table(table), self.column_clause(column))
    }

    fn generate_alter_drop_column(&self, table: &Table, column: &Column) -> String {
        format!("ALTER TABLE {} DROP COLUMN {};", self.quoted_table(table), self.quote(&column.name))
    }

    fn generate_alter_alter_column(&self, table: &Table, current: &Column, target: &Column) -> Vec<String> {
        let t = self.quoted_table(table);
        let name = self.quote(&target.name);
        let mut statements = Vec::new();
        if current.default_value.is_some() {
            statements.push(format!("ALTER TABLE {t} DROP CONSTRAINT DF_{}_{};", table.name, target.name));
        }
        let nullability = if target.is_nullable { "NULL" } else { "NOT NULL" };
        statements.push(format!("ALTER TABLE {t} ALTER COLUMN {name} {} {nullability};", self.map_type(target)));
        if let Some(default) = &target.default_value {
            statements.push(format!(
                "ALTER TABLE {t} ADD CONSTRAINT DF_{}_{} DEFAULT {} FOR {name};",
                table.name,
                target.name,
                default_literal_text(default, &target.column_type, "1", "0")
            ));
        }
        statements
    }

    fn generate_alter_add_constraint(&self, table: &Table, constraint: &Constraint) -> String {
        format!("ALTER TABLE {} ADD {};", self.quoted_table(table), self.constraint_clause(constraint))
    }

    fn generate_alter_drop_constraint(&self, table: &Table, constraint: &Constraint) -> String {
        format!("ALTER TABLE {} DROP CONSTRAINT {};", self.quoted_table(table), self.quote(&constraint.name))
    }

    fn map_type(&self, column: &Column) -> String {
        if let ColumnType::Raw(raw) = &column.column_type {
            return raw.clone();
        }
        let ColumnType::Declared(declared) = &column.column_type else {
            unreachable!()
        };
        match declared {
            DeclaredType::Bool => "BIT".to_string(),
            DeclaredType::Int16 => "SMALLINT".to_string(),
            DeclaredType::Int32 => "INT".to_string(),
            DeclaredType::Int64 => "BIGINT".to_string(),
            DeclaredType::Byte => "TINYINT".to_string(),
            DeclaredType::Float32 => "REAL".to_string(),
            DeclaredType::Float64 => "FLOAT".to_string(),
            DeclaredType::Decimal => match (column.precision, column.scale) {
                (Some(p), Some(s)) => format!("DECIMAL({p},{s})"),
                (Some(p), None) => format!("DECIMAL({p})"),
                _ => "DECIMAL".to_string(),
            },
            DeclaredType::String => match column.max_length {
                Some(n) if n > 0 => format!("NVARCHAR({n})"),
                _ => "NVARCHAR(MAX)".to_string(),
            },
            DeclaredType::Text => "NVARCHAR(MAX)".to_string(),
            DeclaredType::DateTime => "DATETIME2".to_string(),
            DeclaredType::DateTimeOffset => "DATETIMEOFFSET".to_string(),
            DeclaredType::TimeSpan => "TIME".to_string(),
            DeclaredType::Guid => "UNIQUEIDENTIFIER".to_string(),
            DeclaredType::Binary => match column.max_length {
                Some(n) if n > 0 => format!("VARBINARY({n})"),
                _ => "VARBINARY(MAX)".to_string(),
            },
            DeclaredType::Json => "NVARCHAR(MAX)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSpec, IndexColumn};

    fn sample_table() -> Table {
        let id = Column::new(ColumnSpec {
            name: "id".into(),
            column_type: ColumnType::Declared(DeclaredType::Int32),
            max_length: None,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: false,
            is_primary_key: true,
            is_identity: true,
            default_value: None,
            raw_type: None,
        })
        .unwrap();
        Table::new(
            "orders",
            None,
            vec![id],
            vec![],
            vec![Constraint {
                name: "PK_orders".into(),
                kind: ConstraintKind::PrimaryKey {
                    columns: vec!["id".into()],
                },
            }],
        )
        .unwrap()
    }

    #[test]
    fn create_table_emits_identity_inline_and_pk_as_table_constraint() {
        let gen = SqlServerGenerator;
        let sql = gen.generate_create_table(&sample_table());
        assert!(sql.contains("[id] INT IDENTITY(1,1) NOT NULL"));
        assert!(sql.contains("CONSTRAINT [PK_orders] PRIMARY KEY ([id])"));
    }

    #[test]
    fn create_index_strips_where_expression_with_comment() {
        let gen = SqlServerGenerator;
        let table = sample_table();
        let index = Index::new(
            "ix_orders_id",
            false,
            false,
            IndexKind::NonClustered,
            vec![IndexColumn {
                column_name: "id".into(),
                ordinal: 1,
                descending: false,
            }],
            None,
            Some("id > 0".into()),
        )
        .unwrap();
        let sql = gen.generate_create_index(&table, &index);
        assert!(sql.contains("NONCLUSTERED INDEX"));
        assert!(sql.contains("-- WHERE id > 0"));
    }
}
