//! MySQL Schema Introspector
//!
//! `information_schema.*` views, scoped by `TABLE_SCHEMA = DATABASE()`
//! rather than a caller-named schema — MySQL has no schema-qualified
//! identifiers in this model (capability matrix: `supports_schemas =
//! false`), so the `schema` parameter is always ignored.

use crate::executor::{Executor, Param, ScalarValue};
use crate::introspect::rows::{ColumnRow, ConstraintRow, IndexColumnRow, TableRow};
use crate::introspect::{group_constraint_rows, group_index_rows, IntrospectionError, Introspector};
use crate::model::{Column, ColumnSpec, ColumnType, Constraint, DeclaredType, DefaultValue, Index, IndexKind, Table};

pub struct MySqlIntrospector;

/// Inverse of [`crate::ddl::mysql::MySqlGenerator::map_type`].
fn declared_type_from_mysql(type_name: &str) -> ColumnType {
    match type_name.to_ascii_lowercase().as_str() {
        "tinyint" => ColumnType::Declared(DeclaredType::Byte),
        "smallint" => ColumnType::Declared(DeclaredType::Int16),
        "int" => ColumnType::Declared(DeclaredType::Int32),
        "bigint" => ColumnType::Declared(DeclaredType::Int64),
        "float" => ColumnType::Declared(DeclaredType::Float32),
        "double" => ColumnType::Declared(DeclaredType::Float64),
        "decimal" => ColumnType::Declared(DeclaredType::Decimal),
        "varchar" => ColumnType::Declared(DeclaredType::String),
        "text" | "longtext" | "mediumtext" => ColumnType::Declared(DeclaredType::Text),
        "datetime" => ColumnType::Declared(DeclaredType::DateTime),
        "time" => ColumnType::Declared(DeclaredType::TimeSpan),
        "char" => ColumnType::Declared(DeclaredType::Guid),
        "varbinary" | "blob" => ColumnType::Declared(DeclaredType::Binary),
        "json" => ColumnType::Declared(DeclaredType::Json),
        other => ColumnType::Raw(other.to_string()),
    }
}

fn index_kind_from_mysql(raw: Option<&str>) -> IndexKind {
    match raw.map(str::to_ascii_uppercase).as_deref() {
        Some("FULLTEXT") => IndexKind::FullText,
        Some("SPATIAL") => IndexKind::Spatial,
        Some("HASH") => IndexKind::Hash,
        _ => IndexKind::BTree,
    }
}

fn column_from_row(row: ColumnRow) -> Result<Column, IntrospectionError> {
    let raw_type = row.type_name.clone();
    Column::new(ColumnSpec {
        name: row.name,
        column_type: declared_type_from_mysql(&row.type_name),
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

impl Introspector for MySqlIntrospector {
    fn provider(&self) -> crate::dialect::Dialect {
        crate::dialect::Dialect::MySql
    }

    fn resolve_schema(&self, _schema: Option<&str>) -> Option<String> {
        None
    }

    fn get_tables(&self, executor: &mut dyn Executor, _schema: Option<&str>) -> Result<Vec<Table>, IntrospectionError> {
        let sql = "SELECT TABLE_NAME AS table_name FROM information_schema.tables \
                   WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'";
        let result = executor.query(sql, &[])?;
        let mut tables = Vec::new();
        for row in result {
            let table_row = TableRow::from_row(&row)?;
            let columns = self.get_columns(executor, &table_row.name, None)?;
            let indexes = self.get_indexes(executor, &table_row.name, None)?;
            let constraints = self.get_constraints(executor, &table_row.name, None)?;
            let table = Table::new(table_row.name, None, columns, indexes, constraints)
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
        let sql = "SELECT COLUMN_NAME AS column_name, DATA_TYPE AS data_type, \
                   CHARACTER_MAXIMUM_LENGTH AS character_maximum_length, \
                   NUMERIC_PRECISION AS numeric_precision, NUMERIC_SCALE AS numeric_scale, \
                   COLLATION_NAME AS collation_name, IS_NULLABLE AS is_nullable, \
                   COLUMN_DEFAULT AS column_default, (EXTRA LIKE '%auto_increment%') AS is_identity \
                   FROM information_schema.columns \
                   WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = @table \
                   ORDER BY ORDINAL_POSITION";
        let result = executor.query(sql, &[Param::new("table", ScalarValue::Text(table.to_string()))])?;
        result.into_iter().map(|row| column_from_row(ColumnRow::from_row(&row)?)).collect()
    }

    fn get_indexes(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<Index>, IntrospectionError> {
        let sql = "SELECT INDEX_NAME AS index_name, (NON_UNIQUE = 0) AS is_unique, \
                   FALSE AS is_clustered, INDEX_TYPE AS index_kind, COLUMN_NAME AS column_name, \
                   SEQ_IN_INDEX AS ordinal_position \
                   FROM information_schema.statistics \
                   WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = @table AND INDEX_NAME <> 'PRIMARY'";
        let result = executor.query(sql, &[Param::new("table", ScalarValue::Text(table.to_string()))])?;
        let column_rows = result.iter().map(IndexColumnRow::from_row).collect::<Result<Vec<_>, _>>()?;
        group_index_rows(column_rows, index_kind_from_mysql)
    }

    fn get_constraints(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<Constraint>, IntrospectionError> {
        let sql = "SELECT tc.CONSTRAINT_NAME AS constraint_name, tc.CONSTRAINT_TYPE AS constraint_type, \
                   kcu.COLUMN_NAME AS column_name, kcu.REFERENCED_TABLE_NAME AS referenced_table, \
                   kcu.REFERENCED_COLUMN_NAME AS referenced_column, rc.DELETE_RULE AS delete_rule, \
                   rc.UPDATE_RULE AS update_rule, cc.CHECK_CLAUSE AS check_clause \
                   FROM information_schema.table_constraints tc \
                   LEFT JOIN information_schema.key_column_usage kcu \
                     ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
                   LEFT JOIN information_schema.referential_constraints rc \
                     ON rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME AND rc.CONSTRAINT_SCHEMA = tc.TABLE_SCHEMA \
                   LEFT JOIN information_schema.check_constraints cc \
                     ON cc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME AND cc.CONSTRAINT_SCHEMA = tc.TABLE_SCHEMA \
                   WHERE tc.TABLE_SCHEMA = DATABASE() AND tc.TABLE_NAME = @table";
        let result = executor.query(sql, &[Param::new("table", ScalarValue::Text(table.to_string()))])?;
        let constraint_rows = result.iter().map(ConstraintRow::from_row).collect::<Result<Vec<_>, _>>()?;
        group_constraint_rows(constraint_rows)
    }

    fn table_exists(&self, executor: &mut dyn Executor, table: &str, _schema: Option<&str>) -> Result<bool, IntrospectionError> {
        let sql = "SELECT 1 AS found FROM information_schema.tables WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = @table";
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
        let sql = "SELECT 1 AS found FROM information_schema.columns \
                   WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = @table AND COLUMN_NAME = @column";
        let scalar = executor.execute_scalar(
            sql,
            &[
                Param::new("table", ScalarValue::Text(table.to_string())),
                Param::new("column", ScalarValue::Text(column.to_string())),
            ],
        )?;
        Ok(scalar.is_some())
    }
}
