//! PostgreSQL Schema Introspector
//!
//! `information_schema.*` for tables/columns, `pg_index`/`pg_class`/
//! `pg_attribute`/`pg_am` for index access-method discovery. Identity
//! columns are detected via `column_default LIKE 'nextval%'` (serial/
//! identity sequences).

use crate::executor::{Executor, Param, ScalarValue};
use crate::introspect::rows::{ColumnRow, ConstraintRow, IndexColumnRow, TableRow};
use crate::introspect::{group_constraint_rows, group_index_rows, IntrospectionError, Introspector};
use crate::model::{Column, ColumnSpec, ColumnType, Constraint, DeclaredType, DefaultValue, Index, IndexKind, Table};

pub struct PostgreSqlIntrospector;

impl PostgreSqlIntrospector {
    fn schema_param(&self, schema: Option<&str>) -> String {
        self.resolve_schema(schema).unwrap_or_else(|| "public".to_string())
    }
}

/// Inverse of [`crate::ddl::postgresql::PostgreSqlGenerator::map_type`]:
/// maps a `information_schema.columns.data_type` string back to a
/// canonical [`DeclaredType`], falling back to [`ColumnType::Raw`] when
/// there is no canonical counterpart.
fn declared_type_from_pg(type_name: &str) -> ColumnType {
    match type_name.to_ascii_lowercase().as_str() {
        "boolean" => ColumnType::Declared(DeclaredType::Bool),
        "smallint" => ColumnType::Declared(DeclaredType::Int16),
        "integer" => ColumnType::Declared(DeclaredType::Int32),
        "bigint" => ColumnType::Declared(DeclaredType::Int64),
        "real" => ColumnType::Declared(DeclaredType::Float32),
        "double precision" => ColumnType::Declared(DeclaredType::Float64),
        "numeric" => ColumnType::Declared(DeclaredType::Decimal),
        "character varying" | "varchar" => ColumnType::Declared(DeclaredType::String),
        "text" => ColumnType::Declared(DeclaredType::Text),
        "timestamp without time zone" | "timestamp" => ColumnType::Declared(DeclaredType::DateTime),
        "timestamp with time zone" | "timestamptz" => ColumnType::Declared(DeclaredType::DateTimeOffset),
        "interval" => ColumnType::Declared(DeclaredType::TimeSpan),
        "uuid" => ColumnType::Declared(DeclaredType::Guid),
        "bytea" => ColumnType::Declared(DeclaredType::Binary),
        "jsonb" | "json" => ColumnType::Declared(DeclaredType::Json),
        other => ColumnType::Raw(other.to_string()),
    }
}

fn index_kind_from_pg(access_method: Option<&str>) -> IndexKind {
    match access_method.map(str::to_ascii_lowercase).as_deref() {
        Some("hash") => IndexKind::Hash,
        Some("gin") => IndexKind::GIN,
        Some("gist") => IndexKind::GiST,
        Some("brin") => IndexKind::BRIN,
        Some("spgist") => IndexKind::SPGiST,
        _ => IndexKind::BTree,
    }
}

fn column_from_row(row: ColumnRow) -> Result<Column, IntrospectionError> {
    let is_identity = row.is_identity || row.default_value.as_deref().is_some_and(|d| d.starts_with("nextval"));
    let raw_type = row.type_name.clone();
    Column::new(ColumnSpec {
        name: row.name,
        column_type: declared_type_from_pg(&row.type_name),
        max_length: row.max_length,
        precision: row.precision,
        scale: row.scale,
        collation: row.collation,
        is_nullable: row.is_nullable,
        is_primary_key: false,
        is_identity,
        default_value: if is_identity {
            None
        } else {
            row.default_value.map(DefaultValue::RawExpression)
        },
        raw_type: Some(raw_type),
    })
    .map_err(|e| IntrospectionError::MalformedMetadata(e.to_string()))
}

impl Introspector for PostgreSqlIntrospector {
    fn provider(&self) -> crate::dialect::Dialect {
        crate::dialect::Dialect::PostgreSql
    }

    fn resolve_schema(&self, schema: Option<&str>) -> Option<String> {
        Some(schema.map(str::to_string).unwrap_or_else(|| "public".to_string()))
    }

    fn get_tables(&self, executor: &mut dyn Executor, schema: Option<&str>) -> Result<Vec<Table>, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT table_name FROM information_schema.tables \
                   WHERE table_schema = @schema AND table_type = 'BASE TABLE'";
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
        let sql = "SELECT column_name, data_type, character_maximum_length, numeric_precision, \
                   numeric_scale, collation_name, is_nullable, column_default \
                   FROM information_schema.columns WHERE table_schema = @schema AND table_name = @table \
                   ORDER BY ordinal_position";
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
        let sql = "SELECT ix.relname AS index_name, idx.indisunique AS is_unique, \
                   idx.indisclustered AS is_clustered, am.amname AS index_kind, \
                   att.attname AS column_name, k.ordinal AS ordinal_position, \
                   pg_get_expr(idx.indpred, idx.indrelid) AS filter_definition \
                   FROM pg_index idx \
                   JOIN pg_class ix ON ix.oid = idx.indexrelid \
                   JOIN pg_class t ON t.oid = idx.indrelid \
                   JOIN pg_am am ON am.oid = ix.relam \
                   JOIN pg_namespace n ON n.oid = t.relnamespace \
                   JOIN unnest(idx.indkey) WITH ORDINALITY AS k(attnum, ordinal) ON true \
                   JOIN pg_attribute att ON att.attrelid = t.oid AND att.attnum = k.attnum \
                   WHERE n.nspname = @schema AND t.relname = @table AND NOT idx.indisprimary";
        let result = executor.query(
            sql,
            &[
                Param::new("schema", ScalarValue::Text(schema)),
                Param::new("table", ScalarValue::Text(table.to_string())),
            ],
        )?;
        let column_rows = result.iter().map(IndexColumnRow::from_row).collect::<Result<Vec<_>, _>>()?;
        group_index_rows(column_rows, index_kind_from_pg)
    }

    fn get_constraints(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<Constraint>, IntrospectionError> {
        let schema = self.schema_param(schema);
        let sql = "SELECT tc.constraint_name, tc.constraint_type, kcu.column_name, \
                   ccu.table_name AS referenced_table, ccu.column_name AS referenced_column, \
                   rc.delete_rule, rc.update_rule, cc.check_clause \
                   FROM information_schema.table_constraints tc \
                   LEFT JOIN information_schema.key_column_usage kcu \
                     ON kcu.constraint_name = tc.constraint_name AND kcu.table_schema = tc.table_schema \
                   LEFT JOIN information_schema.referential_constraints rc \
                     ON rc.constraint_name = tc.constraint_name AND rc.constraint_schema = tc.table_schema \
                   LEFT JOIN information_schema.constraint_column_usage ccu \
                     ON ccu.constraint_name = rc.unique_constraint_name \
                   LEFT JOIN information_schema.check_constraints cc \
                     ON cc.constraint_name = tc.constraint_name AND cc.constraint_schema = tc.table_schema \
                   WHERE tc.table_schema = @schema AND tc.table_name = @table";
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
        let sql = "SELECT 1 AS found FROM information_schema.tables WHERE table_schema = @schema AND table_name = @table";
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
        let sql = "SELECT 1 AS found FROM information_schema.columns \
                   WHERE table_schema = @schema AND table_name = @table AND column_name = @column";
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
