//! Schema Introspector family
//!
//! Reads a live database's schema back into the canonical [`Table`] form,
//! issuing parameterized information-schema / system-catalog queries
//! through the caller-supplied [`Executor`]. Dispatched per dialect the
//! same way [`crate::ddl::generator_for`] dispatches DDL generators.

pub mod mysql;
pub mod postgresql;
pub mod rows;
pub mod sqlite;
pub mod sqlserver;

use thiserror::Error;

use crate::dialect::Dialect;
use crate::executor::{Executor, ExecutorError};
use crate::model::{Column, Constraint, Index, Table};

#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("executor failed: {0}")]
    ExecutorFailed(#[from] ExecutorError),

    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),
}

/// Per-dialect reader that reconstructs [`Table`] objects from a live
/// database via an [`Executor`] borrow.
pub trait Introspector {
    fn provider(&self) -> Dialect;

    fn get_tables(&self, executor: &mut dyn Executor, schema: Option<&str>) -> Result<Vec<Table>, IntrospectionError>;

    fn get_columns(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<Column>, IntrospectionError>;

    fn get_indexes(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<Index>, IntrospectionError>;

    fn get_constraints(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<Constraint>, IntrospectionError>;

    fn table_exists(&self, executor: &mut dyn Executor, table: &str, schema: Option<&str>) -> Result<bool, IntrospectionError>;

    fn column_exists(
        &self,
        executor: &mut dyn Executor,
        table: &str,
        column: &str,
        schema: Option<&str>,
    ) -> Result<bool, IntrospectionError>;

    /// The schema to query against when the caller passed `None` (Sqlite/
    /// MySql omit it, PostgreSql substitutes `public`, SqlServer
    /// substitutes `dbo`).
    fn resolve_schema(&self, schema: Option<&str>) -> Option<String> {
        schema.map(str::to_string)
    }
}

pub fn introspector_for(dialect: Dialect) -> Box<dyn Introspector> {
    match dialect {
        Dialect::SqlServer => Box::new(sqlserver::SqlServerIntrospector),
        Dialect::PostgreSql => Box::new(postgresql::PostgreSqlIntrospector),
        Dialect::MySql => Box::new(mysql::MySqlIntrospector),
        Dialect::Sqlite => Box::new(sqlite::SqliteIntrospector),
    }
}

/// Fold `get_indexes` row-per-column results into [`Index`] values, one per
/// distinct `index_name`, preserving first-seen order and sorting each
/// group's columns by ordinal.
pub(crate) fn group_index_rows(
    mut column_rows: Vec<rows::IndexColumnRow>,
    kind_of: impl Fn(Option<&str>) -> crate::model::IndexKind,
) -> Result<Vec<Index>, IntrospectionError> {
    column_rows.sort_by_key(|r| r.ordinal);
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, Vec<rows::IndexColumnRow>> = std::collections::HashMap::new();
    for row in column_rows {
        if !grouped.contains_key(&row.index_name) {
            order.push(row.index_name.clone());
        }
        grouped.entry(row.index_name.clone()).or_default().push(row);
    }
    let mut indexes = Vec::new();
    for name in order {
        let group = &grouped[&name];
        let first = &group[0];
        let columns: Vec<crate::model::IndexColumn> = group
            .iter()
            .enumerate()
            .map(|(i, r)| crate::model::IndexColumn {
                column_name: r.column_name.clone(),
                ordinal: i + 1,
                descending: r.descending,
            })
            .collect();
        let index = Index::new(
            name,
            first.is_unique,
            first.is_clustered,
            kind_of(first.kind_raw.as_deref()),
            columns,
            None,
            first.where_expression.clone(),
        )
        .map_err(|e| IntrospectionError::MalformedMetadata(e.to_string()))?;
        indexes.push(index);
    }
    Ok(indexes)
}

/// Fold `get_constraints` rows into [`Constraint`] values, grouping
/// multi-column primary/unique/foreign keys by shared `constraint_name`.
pub(crate) fn group_constraint_rows(rows: Vec<rows::ConstraintRow>) -> Result<Vec<Constraint>, IntrospectionError> {
    use crate::model::{ConstraintKind, ReferentialAction};

    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, Vec<rows::ConstraintRow>> = std::collections::HashMap::new();
    for row in rows {
        if !grouped.contains_key(&row.name) {
            order.push(row.name.clone());
        }
        grouped.entry(row.name.clone()).or_default().push(row);
    }

    let mut constraints = Vec::new();
    for name in order {
        let group = &grouped[&name];
        let first = &group[0];
        let columns: Vec<String> = group.iter().filter_map(|r| r.column_name.clone()).collect();
        let kind = match first.constraint_type.as_str() {
            "PRIMARY KEY" => ConstraintKind::PrimaryKey { columns },
            "UNIQUE" => ConstraintKind::Unique { columns },
            "FOREIGN KEY" => ConstraintKind::ForeignKey {
                columns,
                referenced_table: first
                    .referenced_table
                    .clone()
                    .ok_or_else(|| IntrospectionError::MalformedMetadata(format!("foreign key '{name}' missing referenced_table")))?,
                referenced_columns: group.iter().filter_map(|r| r.referenced_column.clone()).collect(),
                on_delete: first
                    .on_delete
                    .as_deref()
                    .and_then(ReferentialAction::parse)
                    .unwrap_or(ReferentialAction::NoAction),
                on_update: first
                    .on_update
                    .as_deref()
                    .and_then(ReferentialAction::parse)
                    .unwrap_or(ReferentialAction::NoAction),
            },
            "CHECK" => ConstraintKind::Check {
                expression: first
                    .check_expression
                    .clone()
                    .ok_or_else(|| IntrospectionError::MalformedMetadata(format!("check constraint '{name}' missing expression")))?,
            },
            other => return Err(IntrospectionError::MalformedMetadata(format!("unknown constraint_type '{other}'"))),
        };
        constraints.push(Constraint { name, kind });
    }
    Ok(constraints)
}
