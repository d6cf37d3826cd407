//! Analyze a descriptor set, create the table in a real, empty Sqlite
//! database via `rusqlite`, introspect it back, and check the round-tripped
//! model matches modulo Sqlite's known losses (identity spelling,
//! referential-action preservation collapsing to the capability matrix's
//! declared affinity set).

use bowtie::{
    analyze, generator_for, introspector_for, AnalyzeMode, ColumnAnnotation, Descriptor, Dialect, Executor, ExecutorError,
    KeyAnnotation, Param, PropertyDescriptor, Row, ScalarValue, TableAnnotation, ValueFamily,
};
use rusqlite::Connection;
use rusqlite::types::{Value as SqlValue, ValueRef};

struct RusqliteExecutor {
    conn: Connection,
}

fn named_params(params: &[Param]) -> Vec<(String, SqlValue)> {
    params
        .iter()
        .map(|p| {
            let value = match &p.value {
                ScalarValue::Null => SqlValue::Null,
                ScalarValue::Bool(b) => SqlValue::Integer(*b as i64),
                ScalarValue::Int(i) => SqlValue::Integer(*i),
                ScalarValue::Float(f) => SqlValue::Real(*f),
                ScalarValue::Text(s) => SqlValue::Text(s.clone()),
            };
            (format!("@{}", p.name), value)
        })
        .collect()
}

fn value_ref_to_scalar(v: ValueRef<'_>) -> ScalarValue {
    match v {
        ValueRef::Null => ScalarValue::Null,
        ValueRef::Integer(i) => ScalarValue::Int(i),
        ValueRef::Real(f) => ScalarValue::Float(f),
        ValueRef::Text(t) => ScalarValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => ScalarValue::Null,
    }
}

impl Executor for RusqliteExecutor {
    fn execute_scalar(&mut self, sql: &str, params: &[Param]) -> Result<Option<ScalarValue>, ExecutorError> {
        let bound = named_params(params);
        let refs: Vec<(&str, &dyn rusqlite::types::ToSql)> = bound.iter().map(|(n, v)| (n.as_str(), v as &dyn rusqlite::types::ToSql)).collect();
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(refs.as_slice())?;
        if let Some(row) = rows.next()? {
            Ok(Some(value_ref_to_scalar(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    fn execute_non_query(&mut self, sql: &str, params: &[Param]) -> Result<u64, ExecutorError> {
        let bound = named_params(params);
        let refs: Vec<(&str, &dyn rusqlite::types::ToSql)> = bound.iter().map(|(n, v)| (n.as_str(), v as &dyn rusqlite::types::ToSql)).collect();
        Ok(self.conn.execute(sql, refs.as_slice())? as u64)
    }

    fn query(&mut self, sql: &str, params: &[Param]) -> Result<Vec<Row>, ExecutorError> {
        let bound = named_params(params);
        let refs: Vec<(&str, &dyn rusqlite::types::ToSql)> = bound.iter().map(|(n, v)| (n.as_str(), v as &dyn rusqlite::types::ToSql)).collect();
        let mut stmt = self.conn.prepare(sql)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query(refs.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut built = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                built = built.set(name.clone(), value_ref_to_scalar(row.get_ref(i)?));
            }
            out.push(built);
        }
        Ok(out)
    }
}

fn widgets_descriptor() -> Descriptor {
    let mut descriptor = Descriptor::new("Widget");
    descriptor.table = Some(TableAnnotation::default());

    let mut id = PropertyDescriptor::new("Id", ValueFamily::Int32);
    id.key = Some(KeyAnnotation::default());
    descriptor.properties.push(id);

    let mut name = PropertyDescriptor::new("Name", ValueFamily::String);
    name.column = Some(ColumnAnnotation {
        max_length: Some(100),
        ..Default::default()
    });
    descriptor.properties.push(name);

    descriptor
}

#[test]
fn create_table_then_introspect_round_trips_shape() {
    let descriptors = vec![widgets_descriptor()];
    let target = analyze(&descriptors, AnalyzeMode::Provider, "").unwrap();
    assert_eq!(target.len(), 1);

    let conn = Connection::open_in_memory().unwrap();
    let mut executor = RusqliteExecutor { conn };
    let generator = generator_for(Dialect::Sqlite);
    let create_sql = generator.generate_create_table(&target[0]);
    executor.execute_non_query(&create_sql, &[]).unwrap();

    let introspector = introspector_for(Dialect::Sqlite);
    let observed = introspector.get_tables(&mut executor, None).unwrap();

    assert_eq!(observed.len(), 1);
    let table = &observed[0];
    assert_eq!(table.name, "Widget");
    let column_names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert!(column_names.contains(&"Id"));
    assert!(column_names.contains(&"Name"));

    let id_col = table.get_column("Id").unwrap();
    assert!(id_col.is_primary_key);
    assert!(id_col.is_identity);
}

#[test]
fn table_exists_reflects_live_database_state() {
    let conn = Connection::open_in_memory().unwrap();
    let mut executor = RusqliteExecutor { conn };
    let introspector = introspector_for(Dialect::Sqlite);
    assert!(!introspector.table_exists(&mut executor, "Widget", None).unwrap());

    let descriptors = vec![widgets_descriptor()];
    let target = analyze(&descriptors, AnalyzeMode::Provider, "").unwrap();
    let generator = generator_for(Dialect::Sqlite);
    executor.execute_non_query(&generator.generate_create_table(&target[0]), &[]).unwrap();

    assert!(introspector.table_exists(&mut executor, "Widget", None).unwrap());
}
