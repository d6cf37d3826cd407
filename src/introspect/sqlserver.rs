//! SQL Server Schema Introspector
//!
//! `INFORMATION_SCHEMA.TABLES/COLUMNS/KEY_COLUMN_USAGE/
//! REFERENTIAL_CONSTRAINTS/CHECK_CONSTRAINTS` for the relational metadata,
//! `sys.indexes`/`sys.index_columns`/`sys.columns` for index shape and
//! identity detection via `COLUMNPROPERTY(..., 'IsIdentity')`.

use crate::executor::{Executor, Param, ScalarValue};
use crate::introspect::rows::{ColumnRow, ConstraintRow, IndexColumnRow, TableRow};
use crate::introspect::{group_constraint_rows, group_index_rows, IntrospectionError, Introspector};
use crate::model::{Column, ColumnSpec, ColumnType, Constraint, DeclaredType, DefaultValue, Index, IndexKind, Table};

pub struct SqlServerIntrospector;

impl SqlServerIntrospector {
    fn schema_param(&self, schema: Option<&str>) -> String {
        self.resolve_schema(schema).unwrap_or_else(|| "dbo".to_string())
    }
}

/// Inverse of [`crate::ddl::sqlserver::SqlServerGenerator::map_type`].
fn declared_type_from_mssql(type_name: &str) -> ColumnType {
    match type_name.to_ascii_lowercase().as_str() {
        "bit" => ColumnType::Declared(DeclaredType::Bool),
        "smallint" => ColumnType::Declared(DeclaredType::Int16),
        "int" => ColumnType::Declared(DeclaredType::Int32),
        "bigint" => ColumnType::Declared(DeclaredType::Int64),
        "tinyint" => ColumnType::Declared(DeclaredType::Byte),
        "real" => ColumnType::Declared(DeclaredType::Float32),
        "float" => ColumnType::Declared(DeclaredType::Float64),
        "decimal" | "numeric" => ColumnType::Declared(DeclaredType::Decimal),
        "nvarchar" | "varchar" => ColumnType::Declared(DeclaredType::String),
        "datetime2" => ColumnType::Declared(DeclaredType::DateTime),
        "datetimeoffset" => ColumnType::Declared(DeclaredType::DateTimeOffset),
        "time" => ColumnType::Declared(DeclaredType::TimeSpan),
        "uniqueidentifier" => ColumnType::Declared(DeclaredType::Guid),
        "varbinary" => ColumnType::Declared(DeclaredType::Binary),
        other => ColumnType::Raw(other.to_string()),
    }
}

fn index_kind_from_mssql(is_clustered: bool, raw: Option<&str>) -> IndexKind {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("columnstore") => IndexKind::ColumnStore,
        Some("spatial") => IndexKind::Spatial,
        Some("fulltext") => IndexKind::FullText,
        _ if is_clustered => IndexKind::Clustered,
        _ => IndexKind::NonClustered,
    }
}

fn column_from_row(row: ColumnRow) -> Result<Column, IntrospectionError> {
    let raw_type = row.type_name.clone();
    Column::new(ColumnSpec {
        name: row.name,
        column_type: declared_type_from_mssql(&row.type_name),
        max_length: row.max_length,
        precision: row.precision,
        scale: row.scale,
        collation: row.collation,
        is_nullable: row.is_nullable,
        is_primary_key: false,
        is_identity: row.is_identity,
        default_value: if row.is_identity {
            None
        } else {
            row.default_value.map(DefaultValue::RawExpression)
        },
        raw_type: Some(raw_type),
    })
    .map_err(|e| IntrospectionError::MalformedMetadata(e.to_string()))
}

impl Introspector for SqlServerIntrospector {
    fn provider(&self) -> crate::dialect::Dialect {
        crate::dialect::Dialect::SqlServer
    }

    fn resolve_schema(&self, schema: Option<&str>) -> Option<String> {
        Some(schema.map(str::to_string).unwrap_or_else(|| "dbo".to_string()))
    }

    fn get_tables(&self, executor: &mut dyn Executor, schema: Option<&str>) -> Result<Vec<Table>, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT TABLE_NAME AS table_name FROM INFORMATION_SCHEMA.TABLES \
                   WHERE TABLE_SCHEMA = @schema AND TABLE_TYPE = 'BASE TABLE'";
        let result = executor.query(sql, &[Param::new("schema", ScalarValue::Text(schema.clone()))])?;
        let mut tables = Vec::new();
        for row in result {
            let table_row = TableRow::from_row(&row)?;
            let columns = self.get_columns(executor, &table_row.name, Some(&schema))?;
            let indexes = self.get_indexes(executor, &table_row.name, Some(&schema))?;
            let constraints = self.get_constraints(executor, &table_row.name, Some(&schema))?;
            let table = Table::new(table_row.name, Some(schema.clone()), columns, indexes, constraints)
                .map_err(|e| IntrospectionError::MalformedMetadata(e.to_string()))?;
            tables.push(table);
        }
        Ok(tables)
    }

    fn get_columns(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<Column>, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT c.COLUMN_NAME AS column_name, c.DATA_TYPE AS data_type, \
                   c.CHARACTER_MAXIMUM_LENGTH AS character_maximum_length, \
                   c.NUMERIC_PRECISION AS numeric_precision, c.NUMERIC_SCALE AS numeric_scale, \
                   c.COLLATION_NAME AS collation_name, c.IS_NULLABLE AS is_nullable, \
                   c.COLUMN_DEFAULT AS column_default, \
                   COLUMNPROPERTY(OBJECT_ID(@schema + '.' + @table), c.COLUMN_NAME, 'IsIdentity') AS is_identity \
                   FROM INFORMATION_SCHEMA.COLUMNS c \
                   WHERE c.TABLE_SCHEMA = @schema AND c.TABLE_NAME = @table \
                   ORDER BY c.ORDINAL_POSITION";
        let result = executor.query(
            sql,
            &[
                Param::new("schema", ScalarValue::Text(schema)),
                Param::new("table", ScalarValue::Text(table.to_string())),
            ],
        )?;
        result.into_iter().map(|row| column_from_row(ColumnRow::from_row(&row)?)).collect()
    }

    fn get_indexes(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<Index>, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT i.name AS index_name, i.is_unique AS is_unique, \
                   (i.type = 1) AS is_clustered, i.type_desc AS index_kind, \
                   col.name AS column_name, ic.key_ordinal AS ordinal_position, \
                   ic.is_descending_key AS is_descending, i.filter_definition AS filter_definition \
                   FROM sys.indexes i \
                   JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id \
                   JOIN sys.columns col ON col.object_id = ic.object_id AND col.column_id = ic.column_id \
                   JOIN sys.tables t ON t.object_id = i.object_id \
                   JOIN sys.schemas s ON s.schema_id = t.schema_id \
                   WHERE s.name = @schema AND t.name = @table AND i.is_primary_key = 0";
        let result = executor.query(
            sql,
            &[
                Param::new("schema", ScalarValue::Text(schema)),
                Param::new("table", ScalarValue::Text(table.to_string())),
            ],
        )?;
        let column_rows = result.iter().map(IndexColumnRow::from_row).collect::<Result<Vec<_>, _>>()?;
        let clustered_by_index: std::collections::HashMap<String, bool> =
            column_rows.iter().map(|r| (r.index_name.clone(), r.is_clustered)).collect();
        let indexes = group_index_rows(column_rows, |raw| index_kind_from_mssql(false, raw))?;
        Ok(indexes
            .into_iter()
            .map(|mut idx| {
                let is_clustered = clustered_by_index.get(&idx.name).copied().unwrap_or(false);
                idx.is_clustered = is_clustered;
                if !matches!(idx.kind, IndexKind::Spatial | IndexKind::FullText | IndexKind::ColumnStore) {
                    idx.kind = index_kind_from_mssql(is_clustered, None);
                }
                idx
            })
            .collect())
    }

    fn get_constraints(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<Constraint>, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT tc.CONSTRAINT_NAME AS constraint_name, tc.CONSTRAINT_TYPE AS constraint_type, \
                   kcu.COLUMN_NAME AS column_name, fk_ref.TABLE_NAME AS referenced_table, \
                   fk_kcu.COLUMN_NAME AS referenced_column, rc.DELETE_RULE AS delete_rule, \
                   rc.UPDATE_RULE AS update_rule, cc.CHECK_CLAUSE AS check_clause \
                   FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
                   LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
                     ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
                   LEFT JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc \
                     ON rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                   LEFT JOIN INFORMATION_SCHEMA.TABLE_CONSTRAINTS fk_ref \
                     ON fk_ref.CONSTRAINT_NAME = rc.UNIQUE_CONSTRAINT_NAME \
                   LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE fk_kcu \
                     ON fk_kcu.CONSTRAINT_NAME = rc.UNIQUE_CONSTRAINT_NAME \
                   LEFT JOIN INFORMATION_SCHEMA.CHECK_CONSTRAINTS cc \
                     ON cc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                   WHERE tc.TABLE_SCHEMA = @schema AND tc.TABLE_NAME = @table";
        let result = executor.query(
            sql,
            &[
                Param::new("schema", ScalarValue::Text(schema)),
                Param::new("table", ScalarValue::Text(table.to_string())),
            ],
        )?;
        let constraint_rows = result.iter().map(ConstraintRow::from_row).collect::<Result<Vec<_>, _>>()?;
        group_constraint_rows(constraint_rows)
    }

    fn table_exists(&self, executor: &mut dyn Executor, table: &str, schema: Option<&str>) -> Result<bool, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT 1 AS found FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = @schema AND TABLE_NAME = @table";
        let scalar = executor.execute_scalar(
            sql,
            &[
                Param::new("schema", ScalarValue::Text(schema)),
                Param::new("table", ScalarValue::Text(table.to_string())),
            ],
        )?;
        Ok(scalar.is_some())
    }

    fn column_exists(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        column: &str,
        schema: Option<&str>,
    ) -> Result<bool, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT 1 AS found FROM INFORMATION_SCHEMA.COLUMNS \
                   WHERE TABLE_SCHEMA = @schema AND TABLE_NAME = @table AND COLUMN_NAME = @column";
        let scalar = executor.execute_scalar(
            sql,
            &[
                Param::new("schema", ScalarValue::Text(schema)),
                Param::new("table", ScalarValue::Text(table.to_string())),
                Param::new("column", ScalarValue::Text(column.to_string())),
            ],
        )?;
        Ok(scalar.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_type_recognizes_canonical_names() {
        assert_eq!(declared_type_from_mssql("bigint"), ColumnType::Declared(DeclaredType::Int64));
        assert_eq!(declared_type_from_mssql("uniqueidentifier"), ColumnType::Declared(DeclaredType::Guid));
    }

    #[test]
    fn declared_type_falls_back_to_raw_for_unknown() {
        assert_eq!(declared_type_from_mssql("geography"), ColumnType::Raw("geography".to_string()));
    }

    #[test]
    fn index_kind_prefers_explicit_kind_over_clustering_flag() {
        assert_eq!(index_kind_from_mssql(true, Some("spatial")), IndexKind::Spatial);
        assert_eq!(index_kind_from_mssql(true, None), IndexKind::Clustered);
        assert_eq!(index_kind_from_mssql(false, None), IndexKind::NonClustered);
    }

    #[test]
    fn resolve_schema_defaults_to_dbo() {
        let introspector = SqlServerIntrospector;
        assert_eq!(introspector.resolve_schema(None), Some("dbo".to_string()));
    }
}
