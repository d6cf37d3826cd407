//! Bowtie — synchronizes a relational database's schema against a
//! declarative model.
//!
//! A host supplies a set of annotated [`Descriptor`]s describing the
//! desired shape of its schema; the Model Analyzer turns that into a
//! canonical [`Table`] list, the Schema Introspector family reads the
//! live database's current shape through an [`Executor`], the Data-Loss
//! Risk Analyzer compares the two, and the DDL Generator family emits the
//! dialect-specific statements that reconcile them. [`sync::synchronize`]
//! orchestrates all of this end to end.

pub mod analyzer;
pub mod capability;
pub mod config;
pub mod ddl;
pub mod descriptor;
pub mod dialect;
pub mod executor;
pub mod introspect;
pub mod model;
pub mod risk;
pub mod sync;

pub use analyzer::{analyze, AnalysisError, AnalyzeMode};
pub use capability::{capabilities, quote_identifier, validate_index_kind, Capabilities};
pub use config::{Config, ConfigError};
pub use ddl::diff::generate_migration_script;
pub use ddl::{generator_for, validate_for_dialect, DdlGenerator, GenerationError, ValidationError};
pub use descriptor::{
    CheckAnnotation, ColumnAnnotation, DefaultAnnotation, Descriptor, ForeignKeyAnnotation, IndexAnnotation, KeyAnnotation,
    PropertyDescriptor, TableAnnotation, UniqueAnnotation, ValueFamily,
};
pub use dialect::{Dialect, ParseDialectError};
pub use executor::{Executor, ExecutorError, Param, Row, ScalarValue};
pub use introspect::{introspector_for, IntrospectionError, Introspector};
pub use model::{
    Column, ColumnSpec, ColumnType, Constraint, ConstraintKind, DeclaredType, DefaultValue, Index, IndexColumn, IndexKind, ModelError,
    ReferentialAction, Table,
};
pub use risk::{analyze_risk, RiskReport, Severity, Warning, WarningKind};
pub use sync::{synchronize, SyncError, SyncOptions, SyncOutcome};
