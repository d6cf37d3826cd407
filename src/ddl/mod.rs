//! DDL Generator family
//!
//! One module per dialect implementing [`DdlGenerator`] — the textual
//! emission each produces is dialect-specific, but the migration-script
//! diff/ordering logic in [`diff`] is not: it drives every generator
//! through the same trait, rather than matching on [`Dialect`] a second
//! time at the call site.

pub mod diff;
pub mod mysql;
pub mod postgresql;
pub mod sqlite;
pub mod sqlserver;

use thiserror::Error;

use crate::dialect::Dialect;
use crate::model::{Column, ColumnType, DeclaredType, DefaultValue, Index, IndexKind, Table};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("'{feature}' is not supported for dialect {dialect}")]
    UnsupportedFeatureForDialect { dialect: Dialect, feature: String },
}

/// Errors raised while checking `target` against a chosen dialect's
/// capability matrix, before any SQL is generated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("index '{index}' uses kind {kind} which dialect {dialect} does not support")]
    UnsupportedIndexKindForDialect { dialect: Dialect, index: String, kind: IndexKind },

    #[error("table '{table}' declares a schema but dialect {dialect} does not support schemas")]
    SchemaRequiredButUnsupported { dialect: Dialect, table: String },

    #[error("column '{column}' on table '{table}' has no type mappable on dialect {dialect}")]
    TypeUnmappable { dialect: Dialect, table: String, column: String },
}

/// Check every table against the chosen dialect's capability matrix —
/// index kinds it doesn't support, schemas it can't express. Called by
/// the Synchronizer before generation; the generators themselves never
/// run this (they trust their caller ran it first).
pub fn validate_for_dialect(dialect: Dialect, tables: &[Table]) -> Result<(), ValidationError> {
    let caps = crate::capability::capabilities(dialect);
    for table in tables {
        if table.schema.is_some() && !caps.supports_schemas {
            return Err(ValidationError::SchemaRequiredButUnsupported {
                dialect,
                table: table.full_name(),
            });
        }
        for index in &table.indexes {
            if !crate::capability::validate_index_kind(dialect, index.kind) {
                return Err(ValidationError::UnsupportedIndexKindForDialect {
                    dialect,
                    index: index.name.clone(),
                    kind: index.kind,
                });
            }
        }
    }
    Ok(())
}

/// Common per-dialect contract. `generate_migration_script`
/// is deliberately not a method here — it is a pure function of two schema
/// snapshots with no per-dialect branching of its own, so it lives in
/// [`diff::generate_migration_script`] and calls back into whichever
/// generator the caller selected only for the textual emission step.
pub trait DdlGenerator {
    fn provider(&self) -> Dialect;

    fn generate_create_table(&self, table: &Table) -> String;
    fn generate_drop_table(&self, table: &Table) -> String;
    fn generate_create_index(&self, table: &Table, index: &Index) -> String;
    fn generate_drop_index(&self, table: &Table, index: &Index) -> String;
    fn generate_alter_add_column(&self, table: &Table, column: &Column) -> String;
    fn generate_alter_drop_column(&self, table: &Table, column: &Column) -> String;

    /// May return more than one statement on dialects that require
    /// drop-default-then-alter-then-add-default.
    fn generate_alter_alter_column(&self, table: &Table, current: &Column, target: &Column) -> Vec<String>;

    /// Used by [`diff`] to drop-and-recreate a non-primary-key constraint
    /// that changed shape. Needed to drive constraint diffing through the
    /// same trait object rather than matching on [`Dialect`] a second time
    /// in the diff logic — kept here because the MySql spelling genuinely
    /// differs (`DROP FOREIGN KEY` / `DROP PRIMARY KEY` vs `DROP CONSTRAINT`).
    fn generate_alter_add_constraint(&self, table: &Table, constraint: &crate::model::Constraint) -> String;
    fn generate_alter_drop_constraint(&self, table: &Table, constraint: &crate::model::Constraint) -> String;

    fn map_type(&self, column: &Column) -> String;

    fn validate_index_kind(&self, kind: IndexKind) -> bool {
        crate::capability::validate_index_kind(self.provider(), kind)
    }

    fn quote(&self, identifier: &str) -> String {
        crate::capability::quote_identifier(self.provider(), identifier)
    }
}

/// Render a `DEFAULT` literal for a column, canonicalizing booleans to
/// whatever spelling the dialect actually accepts. A raw expression default
/// (`RawExpression`) is always passed through verbatim — the caller wrote
/// actual SQL there and it is not this function's place to touch it.
/// `true_literal`/`false_literal` are the dialect's own boolean spelling,
/// e.g. `"1"`/`"0"` for SQLite/MySQL/SQL Server, `"TRUE"`/`"FALSE"` for
/// PostgreSQL.
pub(crate) fn default_literal_text(default: &DefaultValue, column_type: &ColumnType, true_literal: &str, false_literal: &str) -> String {
    match default {
        DefaultValue::RawExpression(v) => v.clone(),
        DefaultValue::Literal(v) => {
            if matches!(column_type, ColumnType::Declared(DeclaredType::Bool)) {
                match v.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => return true_literal.to_string(),
                    "false" | "0" => return false_literal.to_string(),
                    _ => {}
                }
            }
            v.clone()
        }
    }
}

/// Look up the generator for a dialect. Mirrors
/// [`crate::introspect::introspector_for`].
pub fn generator_for(dialect: Dialect) -> Box<dyn DdlGenerator> {
    match dialect {
        Dialect::SqlServer => Box::new(sqlserver::SqlServerGenerator),
        Dialect::PostgreSql => Box::new(postgresql::PostgreSqlGenerator),
        Dialect::MySql => Box::new(mysql::MySqlGenerator),
        Dialect::Sqlite => Box::new(sqlite::SqliteGenerator),
    }
}
