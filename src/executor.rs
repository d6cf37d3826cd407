//! Executor interface
//!
//! The Schema Introspector family and the Synchronizer depend on this
//! minimal query-executor contract and nothing more — no
//! concrete driver crate is named in the core. A host supplies an
//! implementation wrapping whatever driver it already uses (`rusqlite`,
//! `tiberius`, `tokio-postgres`, a MySQL client); the core only ever calls
//! through this trait, boxed as `dyn Executor` the way [`crate::ddl`] and
//! [`crate::introspect`] box their per-dialect families.

use std::collections::HashMap;
use std::error::Error;

/// A bound query parameter. Every dialect here uses `@name` placeholders
/// (the capability matrix's `param_prefix`), so parameters are always
/// named, never positional.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: ScalarValue,
}

impl Param {
    pub fn new(name: impl Into<String>, value: ScalarValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A value bound into a query, or returned as a scalar/column result.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A dialect-agnostic, name-addressable result record. Introspector query
/// code asks for columns by name rather than relying on a driver-specific
/// row type or positional indexing — no duck-typed access survives past
/// this boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(HashMap<String, ScalarValue>);

impl Row {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn set(mut self, column: impl Into<String>, value: ScalarValue) -> Self {
        self.0.insert(column.into(), value);
        self
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        match self.0.get(column) {
            Some(ScalarValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.0.get(column) {
            Some(ScalarValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, column: &str) -> Option<bool> {
        match self.0.get(column) {
            Some(ScalarValue::Bool(b)) => Some(*b),
            Some(ScalarValue::Int(i)) => Some(*i != 0),
            _ => None,
        }
    }
}

/// Type-erased executor failure. The core never downcasts it; it is only
/// ever wrapped as [`crate::introspect::IntrospectionError::ExecutorFailed`]
/// or [`crate::sync::SyncError`] and shown to the caller.
pub type ExecutorError = Box<dyn Error + Send + Sync + 'static>;

/// Minimal synchronous query-executor contract consumed by the core.
/// Single-threaded, synchronous-within-a-run: no `async`
/// method here, matching the scheduling model exactly.
pub trait Executor {
    fn execute_scalar(&mut self, sql: &str, params: &[Param]) -> Result<Option<ScalarValue>, ExecutorError>;

    fn execute_non_query(&mut self, sql: &str, params: &[Param]) -> Result<u64, ExecutorError>;

    fn query(&mut self, sql: &str, params: &[Param]) -> Result<Vec<Row>, ExecutorError>;
}
