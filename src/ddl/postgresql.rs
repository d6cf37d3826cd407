//! PostgreSQL DDL Generator

use crate::ddl::{default_literal_text, DdlGenerator};
use crate::dialect::Dialect;
use crate::model::{Column, ColumnType, Constraint, ConstraintKind, DeclaredType, Index, IndexKind, Table};

pub struct PostgreSqlGenerator;

impl PostgreSqlGenerator {
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
        if col.is_identity {
            let ty = match &col.column_type {
                ColumnType::Declared(DeclaredType::Int64) => "BIGSERIAL",
                _ => "SERIAL",
            };
            return format!("{name} {ty}");
        }
        let ty = self.map_type(col);
        let mut clause = format!("{name} {ty}");
        if !col.is_nullable {
            clause.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default_value {
            clause.push_str(&format!(" DEFAULT {}", default_literal_text(default, &col.column_type, "TRUE", "FALSE")));
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

impl DdlGenerator for PostgreSqlGenerator {
    fn provider(&self) -> Dialect {
        Dialect::PostgreSql
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
        let using = format!(" USING {}", access_method(index.kind));
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
        let wher = match &index.where_expression {
            Some(expr) => format!(" WHERE {expr}"),
            None => String::new(),
        };
        format!(
            "CREATE {unique}INDEX {} ON {}{using} ({cols}){include}{wher};",
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
            self.column_clause(column)
        )
    }

    fn generate_alter_drop_column(&self, table: &Table, column: &Column) -> String {
        format!("ALTER TABLE {} DROP COLUMN {};", self.quoted_table(table), self.quote(&column.name))
    }

    fn generate_alter_alter_column(&self, table: &Table, _current: &Column, target: &Column) -> Vec<String> {
        let t = self.quoted_table(table);
        let name = self.quote(&target.name);
        let mut statements = vec![format!(
            "ALTER TABLE {t} ALTER COLUMN {name} TYPE {} USING {name}::{};",
            self.map_type(target),
            self.map_type(target)
        )];
        statements.push(format!(
            "ALTER TABLE {t} ALTER COLUMN {name} {};",
            if target.is_nullable { "DROP NOT NULL" } else { "SET NOT NULL" }
        ));
        match &target.default_value {
            Some(default) => statements.push(format!(
                "ALTER TABLE {t} ALTER COLUMN {name} SET DEFAULT {};",
                default_literal_text(default, &target.column_type, "TRUE", "FALSE")
            )),
            None => statements.push(format!("ALTER TABLE {t} ALTER COLUMN {name} DROP DEFAULT;")),
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
            DeclaredType::Bool => "BOOLEAN".to_string(),
            DeclaredType::Int16 => "SMALLINT".to_string(),
            DeclaredType::Int32 => "INTEGER".to_string(),
            DeclaredType::Int64 => "BIGINT".to_string(),
            DeclaredType::Byte => "SMALLINT".to_string(),
            DeclaredType::Float32 => "REAL".to_string(),
            DeclaredType::Float64 => "DOUBLE PRECISION".to_string(),
            DeclaredType::Decimal => match (column.precision, column.scale) {
                (Some(p), Some(s)) => format!("NUMERIC({p},{s})"),
                (Some(p), None) => format!("NUMERIC({p})"),
                _ => "NUMERIC".to_string(),
            },
            DeclaredType::String => match column.max_length {
                Some(n) if n > 0 => format!("VARCHAR({n})"),
                _ => "TEXT".to_string(),
            },
            DeclaredType::Text => "TEXT".to_string(),
            DeclaredType::DateTime => "TIMESTAMP".to_string(),
            DeclaredType::DateTimeOffset => "TIMESTAMPTZ".to_string(),
            DeclaredType::TimeSpan => "INTERVAL".to_string(),
            DeclaredType::Guid => "UUID".to_string(),
            DeclaredType::Binary => "BYTEA".to_string(),
            DeclaredType::Json => "JSONB".to_string(),
        }
    }
}

fn access_method(kind: IndexKind) -> &'static str {
    match kind {
        IndexKind::BTree => "btree",
        IndexKind::Hash => "hash",
        IndexKind::GIN => "gin",
        IndexKind::GiST => "gist",
        IndexKind::BRIN => "brin",
        IndexKind::SPGiST => "spgist",
        // Not valid on PostgreSQL; the analyzer/validator rejects these
        // before a generator is ever asked to emit them.
        _ => "btree",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSpec, DefaultValue, IndexColumn};

    fn id_column() -> Column {
        Column::new(ColumnSpec {
            name: "id".into(),
            column_type: ColumnType::Declared(DeclaredType::Int64),
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
        .unwrap()
    }

    fn sample_table() -> Table {
        Table::new(
            "orders",
            Some("public".into()),
            vec![id_column()],
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
    fn create_table_uses_bigserial_for_int64_identity() {
        let gen = PostgreSqlGenerator;
        let sql = gen.generate_create_table(&sample_table());
        assert!(sql.contains("\"id\" BIGSERIAL"));
        assert!(sql.contains("CONSTRAINT \"PK_orders\" PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn create_index_uses_using_clause_for_gin() {
        let gen = PostgreSqlGenerator;
        let table = sample_table();
        let index = Index::new(
            "ix_orders_id",
            false,
            false,
            IndexKind::GIN,
            vec![IndexColumn {
                column_name: "id".into(),
                ordinal: 1,
                descending: false,
            }],
            None,
            None,
        )
        .unwrap();
        let sql = gen.generate_create_index(&table, &index);
        assert_eq!(sql, r#"CREATE INDEX "ix_orders_id" ON "public"."orders" USING gin ("id");"#);
    }

    #[test]
    fn map_type_honors_raw_override() {
        let gen = PostgreSqlGenerator;
        let col = Column::new(ColumnSpec {
            name: "payload".into(),
            column_type: ColumnType::Raw("HSTORE".into()),
            max_length: None,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: true,
            is_primary_key: false,
            is_identity: false,
            default_value: None,
            raw_type: None,
        })
        .unwrap();
        assert_eq!(gen.map_type(&col), "HSTORE");
    }

    #[test]
    fn bool_default_literal_renders_as_true_or_false() {
        let gen = PostgreSqlGenerator;
        let active = Column::new(ColumnSpec {
            name: "is_active".into(),
            column_type: ColumnType::Declared(DeclaredType::Bool),
            max_length: None,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: false,
            is_primary_key: false,
            is_identity: false,
            default_value: Some(DefaultValue::Literal("true".into())),
            raw_type: None,
        })
        .unwrap();
        let table = Table::new("widgets", None, vec![active], vec![], vec![]).unwrap();
        assert!(gen.generate_create_table(&table).contains("DEFAULT TRUE"));
    }
}
