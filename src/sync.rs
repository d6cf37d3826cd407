//! Synchronizer
//!
//! Orchestrates a single run end to end: analyze the target model,
//! introspect the live database, gate on data-loss risk, generate the
//! migration script, and execute it. Single-threaded, synchronous-within-
//! a-run — this is the only place in the engine that
//! drives an [`Executor`].

use std::io::Write;

use thiserror::Error;

use crate::analyzer::{analyze, AnalysisError, AnalyzeMode};
use crate::ddl::diff::generate_migration_script;
use crate::ddl::{generator_for, validate_for_dialect, ValidationError};
use crate::descriptor::Descriptor;
use crate::dialect::Dialect;
use crate::executor::{Executor, ExecutorError};
use crate::introspect::{introspector_for, IntrospectionError};
use crate::risk::{analyze_risk, RiskReport};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("introspection failed: {0}")]
    Introspection(#[from] IntrospectionError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("blocked by data-loss risk ({} warning(s)); rerun with force after taking a backup", .0.warnings.len())]
    BlockedByRisk(RiskReport),

    #[error("statement {statement_index} failed: {cause}")]
    StatementFailed {
        statement_index: usize,
        #[source]
        cause: ExecutorError,
    },

    #[error("failed to write migration script to output sink: {0}")]
    OutputSinkFailed(#[source] std::io::Error),
}

/// Options accepted by [`synchronize`].
pub struct SyncOptions {
    pub default_schema: String,
    pub dry_run: bool,
    pub force: bool,
    /// Emit a `GO` batch separator between CREATE TABLE and subsequent
    /// CREATE INDEX statements (SqlServer only); default off.
    pub emit_go_batches: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            default_schema: String::new(),
            dry_run: false,
            force: false,
            emit_go_batches: false,
        }
    }
}

pub struct SyncOutcome {
    pub statements: Vec<String>,
    pub risk_report: Option<RiskReport>,
}

/// Run one synchronization: analyze `descriptors` into the target model,
/// introspect `executor`'s current schema (skipped on `dry_run`), gate on
/// risk, generate the migration script, optionally write it to
/// `output_sink`, then execute each statement in order.
///
/// `log_sink` receives one line per risk warning plus the run's final
/// outcome ("no changes detected" on a no-op diff); `tracing::warn!` is
/// also emitted alongside it, but `log_sink` is the channel a caller can
/// actually capture without installing a subscriber — the core does no
/// implicit global I/O of its own.
pub fn synchronize(
    descriptors: &[Descriptor],
    dialect: Dialect,
    executor: &mut dyn Executor,
    options: &SyncOptions,
    log_sink: &mut dyn Write,
    mut output_sink: Option<&mut dyn Write>,
) -> Result<SyncOutcome, SyncError> {
    let target = analyze(descriptors, AnalyzeMode::Provider, &options.default_schema)?;
    validate_for_dialect(dialect, &target)?;
    let generator = generator_for(dialect);

    if options.dry_run {
        let statements = generate_migration_script(generator.as_ref(), &[], &target);
        if let Some(sink) = output_sink.as_deref_mut() {
            write_script(sink, &statements, dialect, options.emit_go_batches)?;
        }
        return Ok(SyncOutcome {
            statements,
            risk_report: None,
        });
    }

    let introspector = introspector_for(dialect);
    let current = introspector.get_tables(executor, Some(&options.default_schema))?;

    let risk_report = analyze_risk(&current, &target);
    for warning in &risk_report.warnings {
        let icon = match warning.severity {
            crate::risk::Severity::High => "\u{1F534}",
            crate::risk::Severity::Medium => "\u{1F7E1}",
            crate::risk::Severity::Low => "\u{1F7E2}",
            crate::risk::Severity::None => "",
        };
        tracing::warn!(
            kind = %warning.kind,
            severity = %warning.severity,
            table = %warning.table,
            column = warning.column.as_deref().unwrap_or(""),
            "{icon} {} ({})",
            warning.message,
            warning.details
        );
        let _ = writeln!(
            log_sink,
            "[{}] {} ({})",
            warning.severity, warning.message, warning.details
        );
    }

    if risk_report.requires_confirmation && !options.force {
        tracing::warn!("blocked by risk gate; `force` exists but must be combined with an external backup");
        let _ = writeln!(log_sink, "blocked by risk gate; rerun with force after taking a backup");
        return Err(SyncError::BlockedByRisk(risk_report));
    }

    let statements = generate_migration_script(generator.as_ref(), &current, &target);

    if statements.is_empty() {
        tracing::info!("no changes detected");
        let _ = writeln!(log_sink, "no changes detected");
    }

    if let Some(sink) = output_sink.as_deref_mut() {
        write_script(sink, &statements, dialect, options.emit_go_batches)?;
    }

    for (index, statement) in statements.iter().enumerate() {
        if statement.trim().is_empty() {
            continue;
        }
        execute_fragment(executor, statement, dialect, options.emit_go_batches)
            .map_err(|cause| SyncError::StatementFailed { statement_index: index, cause })?;
    }

    Ok(SyncOutcome {
        statements,
        risk_report: Some(risk_report),
    })
}

/// Split a statement on the dialect's batch terminator (`GO` on its own
/// line, SqlServer only, when batching is enabled) and execute every
/// non-blank fragment through the executor in order.
fn execute_fragment(executor: &mut dyn Executor, statement: &str, dialect: Dialect, emit_go_batches: bool) -> Result<(), ExecutorError> {
    if emit_go_batches && dialect == Dialect::SqlServer {
        for fragment in statement.lines().collect::<Vec<_>>().split(|line| line.trim() == "GO") {
            let joined = fragment.join("\n");
            if !joined.trim().is_empty() {
                executor.execute_non_query(&joined, &[])?;
            }
        }
        Ok(())
    } else {
        executor.execute_non_query(statement, &[]).map(|_| ())
    }
}

fn write_script(sink: &mut dyn Write, statements: &[String], dialect: Dialect, emit_go_batches: bool) -> Result<(), SyncError> {
    let mut joined = statements.join(";\n\n");
    if !joined.is_empty() {
        joined.push(';');
    }
    if emit_go_batches && dialect == Dialect::SqlServer {
        joined.push_str("\nGO\n");
    }
    sink.write_all(joined.as_bytes()).map_err(SyncError::OutputSinkFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, PropertyDescriptor, TableAnnotation, ValueFamily};
    use crate::executor::{Param, Row, ScalarValue};

    struct FakeExecutor {
        non_query_calls: Vec<String>,
        next_fail: bool,
    }

    impl Executor for FakeExecutor {
        fn execute_scalar(&mut self, _sql: &str, _params: &[Param]) -> Result<Option<ScalarValue>, ExecutorError> {
            Ok(None)
        }

        fn execute_non_query(&mut self, sql: &str, _params: &[Param]) -> Result<u64, ExecutorError> {
            if self.next_fail {
                return Err("boom".into());
            }
            self.non_query_calls.push(sql.to_string());
            Ok(1)
        }

        fn query(&mut self, _sql: &str, _params: &[Param]) -> Result<Vec<Row>, ExecutorError> {
            Ok(vec![])
        }
    }

    fn widgets_descriptor() -> Descriptor {
        let mut descriptor = Descriptor::new("Widget");
        descriptor.table = Some(TableAnnotation::default());
        descriptor.properties = vec![PropertyDescriptor::new("Id", ValueFamily::Int32)];
        descriptor
    }

    #[test]
    fn dry_run_skips_introspection_and_execution() {
        let descriptors = vec![widgets_descriptor()];
        let mut executor = FakeExecutor {
            non_query_calls: vec![],
            next_fail: false,
        };
        let options = SyncOptions {
            dry_run: true,
            ..Default::default()
        };
        let mut log = Vec::new();
        let outcome = synchronize(&descriptors, Dialect::Sqlite, &mut executor, &options, &mut log, None).unwrap();
        assert!(!outcome.statements.is_empty());
        assert!(outcome.risk_report.is_none());
        assert!(executor.non_query_calls.is_empty());
    }

    #[test]
    fn statement_failure_stops_the_run_and_reports_index() {
        let descriptors = vec![widgets_descriptor()];
        let mut executor = FakeExecutor {
            non_query_calls: vec![],
            next_fail: true,
        };
        let options = SyncOptions::default();
        let mut log = Vec::new();
        let err = synchronize(&descriptors, Dialect::Sqlite, &mut executor, &options, &mut log, None).unwrap_err();
        assert!(matches!(err, SyncError::StatementFailed { statement_index: 0, .. }));
    }

    #[test]
    fn dry_run_writes_generated_script_to_output_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration.sql");

        let descriptors = vec![widgets_descriptor()];
        let mut executor = FakeExecutor {
            non_query_calls: vec![],
            next_fail: false,
        };
        let options = SyncOptions {
            dry_run: true,
            ..Default::default()
        };
        let mut file = std::fs::File::create(&path).unwrap();
        let mut log = Vec::new();
        let outcome = synchronize(&descriptors, Dialect::Sqlite, &mut executor, &options, &mut log, Some(&mut file)).unwrap();
        drop(file);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("CREATE TABLE"));
        assert!(written.trim_end().ends_with(';'));
        assert_eq!(outcome.statements.len(), 1);
    }

    /// An executor whose `query` reflects back exactly the single-table,
    /// single-`INTEGER`-column shape the target below analyzes to, so the
    /// diff against it is empty.
    struct ReflectingExecutor;

    impl Executor for ReflectingExecutor {
        fn execute_scalar(&mut self, _sql: &str, _params: &[Param]) -> Result<Option<ScalarValue>, ExecutorError> {
            Ok(None)
        }

        fn execute_non_query(&mut self, _sql: &str, _params: &[Param]) -> Result<u64, ExecutorError> {
            Ok(0)
        }

        fn query(&mut self, sql: &str, _params: &[Param]) -> Result<Vec<Row>, ExecutorError> {
            if sql.contains("sqlite_master") {
                return Ok(vec![Row::new().set("table_name", ScalarValue::Text("Widget".to_string()))]);
            }
            if sql.contains("table_info") {
                return Ok(vec![Row::new()
                    .set("name", ScalarValue::Text("Id".to_string()))
                    .set("type", ScalarValue::Text("INTEGER".to_string()))
                    .set("notnull", ScalarValue::Int(1))
                    .set("pk", ScalarValue::Int(0))]);
            }
            Ok(vec![])
        }
    }

    #[test]
    fn noop_run_logs_no_changes_detected() {
        let mut descriptor = Descriptor::new("Widget");
        descriptor.table = Some(TableAnnotation::default());
        descriptor.properties.push(PropertyDescriptor::new("Id", ValueFamily::Int64));

        let descriptors = vec![descriptor];
        let options = SyncOptions::default();
        let mut log = Vec::new();
        let mut executor = ReflectingExecutor;
        let outcome = synchronize(&descriptors, Dialect::Sqlite, &mut executor, &options, &mut log, None).unwrap();
        assert!(outcome.statements.is_empty(), "expected a no-op diff, got {:?}", outcome.statements);
        let logged = String::from_utf8(log).unwrap();
        assert!(logged.contains("no changes detected"), "expected a no-op log line, got: {logged}");
    }
}
