//! SQLite Schema Introspector
//!
//! SQLite has no information_schema; its reflection surface is the
//! `PRAGMA` family (`table_info`, `index_list`, `index_info`,
//! `foreign_key_list`) plus `sqlite_master` for the table list. Schema is
//! always ignored, matching the capability matrix (`supports_schemas =
//! false`).

use crate::executor::{Executor, Param, ScalarValue};
use crate::introspect::{IntrospectionError, Introspector};
use crate::model::{
    Column, ColumnSpec, ColumnType, Constraint, ConstraintKind, DeclaredType, DefaultValue, Index, IndexColumn, IndexKind, Table,
};

pub struct SqliteIntrospector;

/// Inverse of [`crate::ddl::sqlite::SqliteGenerator::map_type`]. SQLite's
/// type affinity rules collapse a lot of the canonical vocabulary into a
/// handful of storage classes, so this mapping is necessarily lossy —
/// `TEXT` round-trips as [`DeclaredType::Text`], never as the original
/// `String`/`DateTime`/`Guid` it may have come from.
fn declared_type_from_sqlite(type_name: &str) -> ColumnType {
    match type_name.to_ascii_uppercase().as_str() {
        "INTEGER" => ColumnType::Declared(DeclaredType::Int64),
        "REAL" => ColumnType::Declared(DeclaredType::Float64),
        "NUMERIC" => ColumnType::Declared(DeclaredType::Decimal),
        "TEXT" => ColumnType::Declared(DeclaredType::Text),
        "BLOB" => ColumnType::Declared(DeclaredType::Binary),
        other => ColumnType::Raw(other.to_string()),
    }
}

impl Introspector for SqliteIntrospector {
    fn provider(&self) -> crate::dialect::Dialect {
        crate::dialect::Dialect::Sqlite
    }

    fn resolve_schema(&self, _schema: Option<&str>) -> Option<String> {
        None
    }

    fn get_tables(&self, executor: &mut dyn Executor, _schema: Option<&str>) -> Result<Vec<Table>, IntrospectionError> {
        let sql = "SELECT name AS table_name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";
        let result = executor.query(sql, &[])?;
        let mut tables = Vec::new();
        for row in result {
            let name = row
                .get_str("table_name")
                .ok_or_else(|| IntrospectionError::MalformedMetadata("missing table_name".to_string()))?
                .to_string();
            let columns = self.get_columns(executor, &name, None)?;
            let indexes = self.get_indexes(executor, &name, None)?;
            let constraints = self.get_constraints(executor, &name, None)?;
            let table = Table::new(name, None, columns, indexes, constraints)
                .map_err(|e| IntrospectionError::MalformedMetadata(e.to_string()))?;
            tables.push(table);
        }
        Ok(tables)
    }

    fn get_columns(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<Column>, IntrospectionError> {
        // PRAGMA statements take the table name interpolated (SQLite does
        // not allow binding it as a parameter); `table` always comes from a
        // prior sqlite_master read, never from unsanitized external input.
        let sql = format!("PRAGMA table_info({table})");
        let result = executor.query(&sql, &[])?;
        let single_column_pk = result.iter().filter(|r| r.get_i64("pk").unwrap_or(0) > 0).count() == 1;
        let mut columns = Vec::new();
        for row in &result {
            let name = row
                .get_str("name")
                .ok_or_else(|| IntrospectionError::MalformedMetadata("missing column name".to_string()))?
                .to_string();
            let type_name = row.get_str("type").unwrap_or("TEXT").to_string();
            let not_null = row.get_bool("notnull").unwrap_or(false);
            let is_pk = row.get_i64("pk").unwrap_or(0) > 0;
            let default_value = row.get_str("dflt_value").map(str::to_string);
            // SQLite's "INTEGER PRIMARY KEY" alias for the rowid is the only
            // shape that round-trips as an identity column; a composite PK
            // or a non-INTEGER type never is, even with AUTOINCREMENT set.
            let is_identity =
                is_pk && single_column_pk && matches!(declared_type_from_sqlite(&type_name), ColumnType::Declared(DeclaredType::Int64));
            let column = Column::new(ColumnSpec {
                name,
                column_type: declared_type_from_sqlite(&type_name),
                max_length: None,
                precision: None,
                scale: None,
                collation: None,
                is_nullable: !not_null,
                is_primary_key: is_pk,
                is_identity,
                default_value: if is_identity { None } else { default_value.map(DefaultValue::RawExpression) },
                raw_type: Some(type_name.clone()),
            })
            .map_err(|e| IntrospectionError::MalformedMetadata(e.to_string()))?;
            columns.push(column);
        }
        Ok(columns)
    }

    fn get_indexes(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<Index>, IntrospectionError> {
        let list_sql = format!("PRAGMA index_list({table})");
        let index_list = executor.query(&list_sql, &[])?;
        let mut indexes = Vec::new();
        for entry in index_list {
            let name = entry
                .get_str("name")
                .ok_or_else(|| IntrospectionError::MalformedMetadata("missing index name".to_string()))?
                .to_string();
            // Autogenerated primary-key indexes surface here too; excluded
            // since they are represented as a PrimaryKey constraint, not an index.
            let origin = entry.get_str("origin").unwrap_or("c");
            if origin == "pk" {
                continue;
            }
            let is_unique = entry.get_bool("unique").unwrap_or(false);
            let info_sql = format!("PRAGMA index_info({name})");
            let info = executor.query(&info_sql, &[])?;
            let mut columns = Vec::new();
            for (i, col_row) in info.iter().enumerate() {
                let column_name = col_row
                    .get_str("name")
                    .ok_or_else(|| IntrospectionError::MalformedMetadata("missing index column name".to_string()))?;
                columns.push(IndexColumn {
                    column_name: column_name.to_string(),
                    ordinal: i + 1,
                    descending: false,
                });
            }
            let index = Index::new(name, is_unique, false, IndexKind::BTree, columns, None, None)
                .map_err(|e| IntrospectionError::MalformedMetadata(e.to_string()))?;
            indexes.push(index);
        }
        Ok(indexes)
    }

    fn get_constraints(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<Constraint>, IntrospectionError> {
        let mut constraints = Vec::new();

        let table_info_sql = format!("PRAGMA table_info({table})");
        let table_info = executor.query(&table_info_sql, &[])?;
        let pk_columns: Vec<(i64, String)> = table_info
            .iter()
            .filter_map(|r| {
                let pk = r.get_i64("pk").unwrap_or(0);
                if pk > 0 { r.get_str("name").map(|n| (pk, n.to_string())) } else { None }
            })
            .collect();
        if !pk_columns.is_empty() {
            let mut ordered = pk_columns;
            ordered.sort_by_key(|(pk, _)| *pk);
            constraints.push(Constraint {
                name: format!("PK_{table}"),
                kind: ConstraintKind::PrimaryKey {
                    columns: ordered.into_iter().map(|(_, name)| name).collect(),
                },
            });
        }

        let fk_sql = format!("PRAGMA foreign_key_list({table})");
        let fk_rows = executor.query(&fk_sql, &[])?;
        let mut fk_groups: std::collections::HashMap<i64, Vec<&crate::executor::Row>> = std::collections::HashMap::new();
        for row in &fk_rows {
            fk_groups.entry(row.get_i64("id").unwrap_or(0)).or_default().push(row);
        }
        let mut fk_ids: Vec<i64> = fk_groups.keys().copied().collect();
        fk_ids.sort();
        for id in fk_ids {
            let rows = &fk_groups[&id];
            let referenced_table = rows[0]
                .get_str("table")
                .ok_or_else(|| IntrospectionError::MalformedMetadata("missing foreign key referenced table".to_string()))?
                .to_string();
            let on_delete = rows[0]
                .get_str("on_delete")
                .and_then(crate::model::ReferentialAction::parse)
                .unwrap_or(crate::model::ReferentialAction::NoAction);
            let on_update = rows[0]
                .get_str("on_update")
                .and_then(crate::model::ReferentialAction::parse)
                .unwrap_or(crate::model::ReferentialAction::NoAction);
            let columns: Vec<String> = rows.iter().filter_map(|r| r.get_str("from").map(str::to_string)).collect();
            let referenced_columns: Vec<String> = rows.iter().filter_map(|r| r.get_str("to").map(str::to_string)).collect();
            constraints.push(Constraint {
                name: format!("FK_{table}_{id}"),
                kind: ConstraintKind::ForeignKey {
                    columns,
                    referenced_table,
                    referenced_columns,
                    on_delete,
                    on_update,
                },
            });
        }

        Ok(constraints)
    }

    fn table_exists(&self, executor: &mut dyn Executor, table: &str, _schema: Option<&str>) -> Result<bool, IntrospectionError> {
        let sql = "SELECT 1 AS found FROM sqlite_master WHERE type = 'table' AND name = @table";
        let scalar = executor.execute_scalar(sql, &[Param::new("table", ScalarValue::Text(table.to_string()))])?;
        Ok(scalar.is_some())
    }

    fn column_exists(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        column: &str,
        _schema: Option<&str>,
    ) -> Result<bool, IntrospectionError> {
        let columns = self.get_columns(executor, table, None)?;
        Ok(columns.iter().any(|c| c.name == column))
    }
}
