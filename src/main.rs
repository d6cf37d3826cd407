//! Bowtie demo binary
//!
//! Not a CLI — the core's boundary has no wire protocol, no CLI, and no
//! persisted state — this wires up `tracing-subscriber`
//! the way a host application would, builds a small descriptor set by hand,
//! and runs the Synchronizer in dry-run mode against it, printing the
//! generated migration script to stdout.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use bowtie::{
    synchronize, ColumnAnnotation, Descriptor, Dialect, KeyAnnotation, PropertyDescriptor, SyncOptions, TableAnnotation, ValueFamily,
};

/// Trivial [`bowtie::Executor`] used only to satisfy `synchronize`'s
/// signature in dry-run mode, where it is never actually called.
struct NullExecutor;

impl bowtie::Executor for NullExecutor {
    fn execute_scalar(&mut self, _sql: &str, _params: &[bowtie::Param]) -> Result<Option<bowtie::ScalarValue>, bowtie::ExecutorError> {
        Ok(None)
    }

    fn execute_non_query(&mut self, _sql: &str, _params: &[bowtie::Param]) -> Result<u64, bowtie::ExecutorError> {
        Ok(0)
    }

    fn query(&mut self, _sql: &str, _params: &[bowtie::Param]) -> Result<Vec<bowtie::Row>, bowtie::ExecutorError> {
        Ok(vec![])
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_path = Path::new("bowtie.toml");
    let config = if config_path.exists() {
        bowtie::Config::from_file(config_path).context("failed to load bowtie.toml")?
    } else {
        tracing::warn!(path = %config_path.display(), "config file not found, using defaults");
        bowtie::Config::default()
    };
    let dialect = config.dialect().context("failed to resolve configured dialect")?;

    let descriptors = vec![widget_descriptor()];
    let options = SyncOptions {
        default_schema: config.default_schema.clone(),
        dry_run: true,
        force: config.force,
        emit_go_batches: config.emit_go_batches,
    };

    let mut executor = NullExecutor;
    let mut log = std::io::stderr();
    let outcome = synchronize(&descriptors, dialect, &mut executor, &options, &mut log, None).context("synchronization failed")?;

    for statement in &outcome.statements {
        println!("{statement};");
    }

    Ok(())
}

fn widget_descriptor() -> Descriptor {
    let mut descriptor = Descriptor::new("Widget");
    descriptor.table = Some(TableAnnotation::default());

    let mut id = PropertyDescriptor::new("Id", ValueFamily::Int32);
    id.key = Some(KeyAnnotation::default());
    descriptor.properties.push(id);

    let mut name = PropertyDescriptor::new("Name", ValueFamily::String);
    name.column = Some(ColumnAnnotation {
        max_length: Some(200),
        ..Default::default()
    });
    descriptor.properties.push(name);

    descriptor
}
