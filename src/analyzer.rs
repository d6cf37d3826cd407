//! Model Analyzer
//!
//! Turns a sequence of annotated [`Descriptor`]s into the canonical,
//! provider-independent [`Table`] list that the rest of the engine works
//! from. This is the only place that reads the annotation vocabulary;
//! everything downstream (capability matrix, DDL Generator, Introspector,
//! Risk Analyzer) sees nothing but [`crate::model`] types.

use std::collections::HashMap;

use thiserror::Error;

use crate::descriptor::{Descriptor, IndexAnnotation, PropertyDescriptor, UniqueAnnotation};
use crate::model::{
    Column, ColumnSpec, ColumnType, Constraint, ConstraintKind, Index, IndexColumn, IndexKind,
    ModelError, ReferentialAction, Table,
};

/// Whether [`analyze`] is scanning a whole descriptor provider (only
/// `Table`-annotated descriptors participate) or an explicit, caller-chosen
/// list (every non-abstract descriptor participates, annotation or not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeMode {
    Provider,
    ExplicitList,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("duplicate table name '{0}' in analyzer output")]
    DuplicateTable(String),

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("column '{0}' is marked identity but is not a primary-key integer column")]
    InvalidIdentity(String),

    #[error("unknown referential action '{0}' on foreign key '{1}'")]
    UnknownReferentialAction(String, String),

    #[error("unknown index kind '{0}' on index '{1}'")]
    UnknownIndexKind(String, String),

    #[error(transparent)]
    Model(ModelError),
}

/// A [`ModelError`] raised while assembling a single table is translated
/// into the matching [`AnalysisError`] variant where one is named
/// one, and passed through unchanged otherwise (e.g. `IdentityWithDefault`,
/// which has no analyzer-level counterpart).
fn wrap_model_error(e: ModelError) -> AnalysisError {
    match e {
        ModelError::DuplicateColumn(c) => AnalysisError::DuplicateColumn(c),
        ModelError::InvalidIdentity(c) => AnalysisError::InvalidIdentity(c),
        other => AnalysisError::Model(other),
    }
}

/// Analyze a sequence of descriptors into a canonical table list: applies
/// the filtering rules, name derivation, and composite index/key grouping.
pub fn analyze(
    descriptors: &[Descriptor],
    mode: AnalyzeMode,
    default_schema: &str,
) -> Result<Vec<Table>, AnalysisError> {
    let mut tables = Vec::new();
    for descriptor in descriptors {
        if descriptor.is_abstract {
            continue;
        }
        if mode == AnalyzeMode::Provider && descriptor.table.is_none() {
            continue;
        }
        tables.push(analyze_one(descriptor, default_schema)?);
    }

    let mut seen_full_names = std::collections::HashSet::new();
    for table in &tables {
        if !seen_full_names.insert(table.full_name()) {
            return Err(AnalysisError::DuplicateTable(table.full_name()));
        }
    }

    Ok(tables)
}

fn split_schema(table_name: &str, default_schema: &str) -> (Option<String>, String) {
    if let Some((schema, name)) = table_name.split_once('.') {
        (Some(schema.to_string()), name.to_string())
    } else if default_schema.is_empty() {
        (None, table_name.to_string())
    } else {
        (Some(default_schema.to_string()), table_name.to_string())
    }
}

fn analyze_one(descriptor: &Descriptor, default_schema: &str) -> Result<Table, AnalysisError> {
    let table_name = descriptor
        .table
        .as_ref()
        .and_then(|t| t.name.clone())
        .unwrap_or_else(|| descriptor.type_identifier.clone());
    let (schema, name) = split_schema(&table_name, default_schema);

    let live: Vec<&PropertyDescriptor> = descriptor
        .properties
        .iter()
        .filter(|p| p.is_writable && !p.is_computed)
        .collect();

    let mut columns = Vec::with_capacity(live.len());
    let mut column_names = Vec::with_capacity(live.len());
    for p in &live {
        let column = build_column(p)?;
        column_names.push(column.name.clone());
        columns.push(column);
    }

    let indexes = build_indexes(&live, &column_names, &name)?;

    let mut constraints = Vec::new();
    constraints.extend(build_primary_key(&live, &column_names, &name));
    constraints.extend(build_unique_constraints(&live, &column_names, &name));
    constraints.extend(build_foreign_keys(&live, &column_names, &name)?);
    constraints.extend(build_checks(&live, &column_names, &name));

    Table::new(name, schema, columns, indexes, constraints).map_err(wrap_model_error)
}

fn build_column(p: &PropertyDescriptor) -> Result<Column, AnalysisError> {
    let ann = p.column.clone().unwrap_or_default();
    let name = ann.name.clone().unwrap_or_else(|| p.name.clone());
    let column_type = match &ann.type_name {
        Some(raw) => ColumnType::Raw(raw.clone()),
        None => ColumnType::Declared(p.value_family.to_declared_type()),
    };
    let is_nullable = ann.is_nullable.unwrap_or(p.is_optional);
    let is_primary_key = p.key.is_some();
    let is_identity = match &p.key {
        Some(key) => {
            let default_identity = column_type.is_integer_family() && key.order.is_none();
            key.is_identity.unwrap_or(default_identity)
        }
        None => false,
    };
    let default_value = p.default.as_ref().map(|d| {
        if d.is_raw_sql {
            crate::model::DefaultValue::RawExpression(d.value.clone())
        } else {
            crate::model::DefaultValue::Literal(d.value.clone())
        }
    });

    Column::new(ColumnSpec {
        name,
        column_type,
        max_length: ann.max_length,
        precision: ann.precision,
        scale: ann.scale,
        collation: ann.collation.clone(),
        is_nullable,
        is_primary_key,
        is_identity,
        default_value,
        raw_type: ann.type_name.clone(),
    })
    .map_err(wrap_model_error)
}

/// Properties bearing a `PrimaryKey`/`Key` annotation, gathered and sorted
/// by `order` (default 0, ties break by insertion order), into a single
/// `PK_<table>` constraint.
fn build_primary_key(
    live: &[&PropertyDescriptor],
    column_names: &[String],
    table_name: &str,
) -> Option<Constraint> {
    let mut keyed: Vec<(i32, usize)> = live
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.key.as_ref().map(|k| (k.order.unwrap_or(0), i)))
        .collect();
    if keyed.is_empty() {
        return None;
    }
    keyed.sort_by_key(|(order, _)| *order);
    let columns = keyed.into_iter().map(|(_, i)| column_names[i].clone()).collect();
    Some(Constraint {
        name: format!("PK_{table_name}"),
        kind: ConstraintKind::PrimaryKey { columns },
    })
}

struct IndexEntry<'a> {
    column_name: &'a str,
    property_name: &'a str,
    ann: &'a IndexAnnotation,
}

/// Group `Index` annotations sharing a `name` or `group` value into one
/// index apiece; an annotation with neither stands alone.
fn build_indexes(
    live: &[&PropertyDescriptor],
    column_names: &[String],
    table_name: &str,
) -> Result<Vec<Index>, AnalysisError> {
    let mut entries: Vec<IndexEntry> = Vec::new();
    for (i, p) in live.iter().enumerate() {
        for ann in &p.indexes {
            entries.push(IndexEntry {
                column_name: &column_names[i],
                property_name: &p.name,
                ann,
            });
        }
    }

    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, e) in entries.iter().enumerate() {
        let key = e
            .ann
            .name
            .clone()
            .or_else(|| e.ann.group.clone())
            .unwrap_or_else(|| format!("__single__{idx}"));
        if !groups.contains_key(&key) {
            group_order.push(key.clone());
        }
        groups.entry(key).or_default().push(idx);
    }

    let mut indexes = Vec::with_capacity(group_order.len());
    for key in &group_order {
        let member_idxs = &groups[key];
        let mut members = member_idxs.clone();
        members.sort_by_key(|&i| entries[i].ann.order.unwrap_or(0));

        let explicit_name = member_idxs.iter().find_map(|&i| entries[i].ann.name.clone());
        let group_name = member_idxs.iter().find_map(|&i| entries[i].ann.group.clone());
        let name = explicit_name
            .or_else(|| group_name.map(|g| format!("IX_{table_name}_{g}")))
            .unwrap_or_else(|| format!("IX_{table_name}_{}", entries[member_idxs[0]].property_name));

        let is_unique = member_idxs.iter().any(|&i| entries[i].ann.is_unique);

        let kind_str = member_idxs.iter().find_map(|&i| entries[i].ann.kind.clone());
        let kind = match kind_str {
            Some(s) => IndexKind::parse(&s)
                .ok_or_else(|| AnalysisError::UnknownIndexKind(s.clone(), name.clone()))?,
            None => IndexKind::BTree,
        };

        let mut include_columns: Vec<String> = Vec::new();
        for &i in member_idxs {
            for c in &entries[i].ann.include {
                if !include_columns.contains(c) {
                    include_columns.push(c.clone());
                }
            }
        }
        let include_columns = (!include_columns.is_empty()).then_some(include_columns);
        let where_expression = member_idxs.iter().find_map(|&i| entries[i].ann.where_expression.clone());

        let columns: Vec<IndexColumn> = members
            .iter()
            .enumerate()
            .map(|(ord, &i)| IndexColumn {
                column_name: entries[i].column_name.to_string(),
                ordinal: ord + 1,
                descending: entries[i].ann.descending,
            })
            .collect();

        // The annotation vocabulary has no clustered flag; clustering is a
        // DDL Generator concern decided per dialect.
        indexes.push(
            Index::new(name, is_unique, false, kind, columns, include_columns, where_expression)
                .map_err(wrap_model_error)?,
        );
    }

    Ok(indexes)
}

struct UniqueEntry<'a> {
    column_name: &'a str,
    property_name: &'a str,
    ann: &'a UniqueAnnotation,
}

/// Group `Unique` annotations the same way [`build_indexes`] groups `Index`
/// annotations, but into `ConstraintKind::Unique` constraints rather than
/// indexes — the annotation vocabulary keeps the two concepts distinct even
/// though both accept `name`/`group`/`order`.
fn build_unique_constraints(
    live: &[&PropertyDescriptor],
    column_names: &[String],
    table_name: &str,
) -> Vec<Constraint> {
    let mut entries: Vec<UniqueEntry> = Vec::new();
    for (i, p) in live.iter().enumerate() {
        for ann in &p.uniques {
            entries.push(UniqueEntry {
                column_name: &column_names[i],
                property_name: &p.name,
                ann,
            });
        }
    }

    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, e) in entries.iter().enumerate() {
        let key = e
            .ann
            .name
            .clone()
            .or_else(|| e.ann.group.clone())
            .unwrap_or_else(|| format!("__single__{idx}"));
        if !groups.contains_key(&key) {
            group_order.push(key.clone());
        }
        groups.entry(key).or_default().push(idx);
    }

    let mut constraints = Vec::with_capacity(group_order.len());
    for key in &group_order {
        let member_idxs = &groups[key];
        let mut members = member_idxs.clone();
        members.sort_by_key(|&i| entries[i].ann.order.unwrap_or(0));

        let explicit_name = member_idxs.iter().find_map(|&i| entries[i].ann.name.clone());
        let group_name = member_idxs.iter().find_map(|&i| entries[i].ann.group.clone());
        let name = explicit_name
            .or_else(|| group_name.map(|g| format!("UQ_{table_name}_{g}")))
            .unwrap_or_else(|| format!("UQ_{table_name}_{}", entries[member_idxs[0]].property_name));

        let columns = members.iter().map(|&i| entries[i].column_name.to_string()).collect();
        constraints.push(Constraint {
            name,
            kind: ConstraintKind::Unique { columns },
        });
    }

    constraints
}

fn parse_referential_action(
    raw: Option<&str>,
    fk_name: &str,
) -> Result<ReferentialAction, AnalysisError> {
    match raw {
        None => Ok(ReferentialAction::NoAction),
        Some(s) => ReferentialAction::parse(s)
            .ok_or_else(|| AnalysisError::UnknownReferentialAction(s.to_string(), fk_name.to_string())),
    }
}

/// Every property carries at most one `ForeignKey` annotation (unlike
/// `Index`/`Unique`, it is not repeatable), so no grouping is needed.
fn build_foreign_keys(
    live: &[&PropertyDescriptor],
    column_names: &[String],
    table_name: &str,
) -> Result<Vec<Constraint>, AnalysisError> {
    let mut constraints = Vec::new();
    for (i, p) in live.iter().enumerate() {
        let Some(fk) = &p.foreign_key else { continue };
        let column_name = &column_names[i];
        let name = fk
            .name
            .clone()
            .unwrap_or_else(|| format!("FK_{table_name}_{column_name}"));
        let on_delete = parse_referential_action(fk.on_delete.as_deref(), &name)?;
        let on_update = parse_referential_action(fk.on_update.as_deref(), &name)?;
        constraints.push(Constraint {
            name,
            kind: ConstraintKind::ForeignKey {
                columns: vec![column_name.clone()],
                referenced_table: fk.referenced_table.clone(),
                referenced_columns: vec![fk.referenced_column.clone().unwrap_or_else(|| "id".to_string())],
                on_delete,
                on_update,
            },
        });
    }
    Ok(constraints)
}

fn build_checks(live: &[&PropertyDescriptor], column_names: &[String], table_name: &str) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    for (i, p) in live.iter().enumerate() {
        for check in &p.checks {
            let name = check
                .name
                .clone()
                .unwrap_or_else(|| format!("CK_{table_name}_{}", column_names[i]));
            constraints.push(Constraint {
                name,
                kind: ConstraintKind::Check {
                    expression: check.expression.clone(),
                },
            });
        }
    }
    constraints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        ColumnAnnotation, ForeignKeyAnnotation, KeyAnnotation, TableAnnotation, ValueFamily,
    };

    fn descriptor(type_identifier: &str) -> Descriptor {
        Descriptor::new(type_identifier)
    }

    fn id_property() -> PropertyDescriptor {
        let mut p = PropertyDescriptor::new("Id", ValueFamily::Int32);
        p.key = Some(KeyAnnotation::default());
        p
    }

    #[test]
    fn filtering_discards_abstract_descriptors() {
        let mut d = descriptor("Base");
        d.is_abstract = true;
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn filtering_provider_mode_requires_table_annotation() {
        let mut d = descriptor("Widget");
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn filtering_explicit_list_processes_untagged_descriptors() {
        let mut d = descriptor("Widget");
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::ExplicitList, "").unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Widget");
    }

    #[test]
    fn filtering_omits_non_writable_and_computed_properties() {
        let mut d = descriptor("Widget");
        d.properties.push(id_property());
        let mut readonly = PropertyDescriptor::new("ReadOnly", ValueFamily::String);
        readonly.is_writable = false;
        d.properties.push(readonly);
        let mut computed = PropertyDescriptor::new("FullName", ValueFamily::String);
        computed.is_computed = true;
        d.properties.push(computed);

        let tables = analyze(&[d], AnalyzeMode::ExplicitList, "").unwrap();
        assert_eq!(tables[0].columns.len(), 1);
    }

    #[test]
    fn name_defaulting_uses_type_identifier() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        assert_eq!(tables[0].name, "Order");
    }

    #[test]
    fn schema_split_single_dot() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation {
            name: Some("sales.orders".into()),
        });
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        assert_eq!(tables[0].schema.as_deref(), Some("sales"));
        assert_eq!(tables[0].name, "orders");
    }

    #[test]
    fn schema_split_uses_default_schema() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation { name: Some("orders".into()) });
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::Provider, "dbo").unwrap();
        assert_eq!(tables[0].schema.as_deref(), Some("dbo"));
    }

    #[test]
    fn schema_split_empty_default_yields_none() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation { name: Some("orders".into()) });
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        assert_eq!(tables[0].schema, None);
    }

    #[test]
    fn composite_index_grouping_orders_by_ascending_order() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let mut last = PropertyDescriptor::new("LastName", ValueFamily::String);
        last.indexes.push(IndexAnnotation {
            group: Some("name".into()),
            order: Some(2),
            ..Default::default()
        });
        d.properties.push(last);

        let mut first = PropertyDescriptor::new("FirstName", ValueFamily::String);
        first.indexes.push(IndexAnnotation {
            group: Some("name".into()),
            order: Some(1),
            ..Default::default()
        });
        d.properties.push(first);

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        let table = &tables[0];
        assert_eq!(table.indexes.len(), 1);
        let idx = &table.indexes[0];
        assert_eq!(idx.name, "IX_Order_name");
        let names: Vec<&str> = idx.column_names().collect();
        assert_eq!(names, vec!["FirstName", "LastName"]);
    }

    #[test]
    fn primary_key_composition_orders_by_order() {
        let mut d = descriptor("LineItem");
        d.table = Some(TableAnnotation::default());

        let mut order_id = PropertyDescriptor::new("OrderId", ValueFamily::Int32);
        order_id.key = Some(KeyAnnotation {
            order: Some(1),
            is_identity: Some(false),
        });
        d.properties.push(order_id);

        let mut line_no = PropertyDescriptor::new("LineNo", ValueFamily::Int32);
        line_no.key = Some(KeyAnnotation {
            order: Some(2),
            is_identity: Some(false),
        });
        d.properties.push(line_no);

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        let pk = tables[0].primary_key().unwrap();
        match &pk.kind {
            ConstraintKind::PrimaryKey { columns } => {
                assert_eq!(columns, &vec!["OrderId".to_string(), "LineNo".to_string()]);
            }
            other => panic!("expected PrimaryKey, got {other:?}"),
        }
        assert_eq!(pk.name, "PK_LineItem");
    }

    #[test]
    fn single_column_integer_key_defaults_to_identity() {
        let mut d = descriptor("Widget");
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        let id_col = tables[0].get_column("Id").unwrap();
        assert!(id_col.is_identity);
    }

    #[test]
    fn explicit_order_suppresses_identity_default() {
        let mut d = descriptor("LineItem");
        d.table = Some(TableAnnotation::default());
        let mut order_id = PropertyDescriptor::new("OrderId", ValueFamily::Int32);
        order_id.key = Some(KeyAnnotation {
            order: Some(1),
            is_identity: None,
        });
        d.properties.push(order_id);

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        let col = tables[0].get_column("OrderId").unwrap();
        assert!(!col.is_identity);
    }

    #[test]
    fn duplicate_table_name_rejected() {
        let mut a = descriptor("Widget");
        a.table = Some(TableAnnotation { name: Some("items".into()) });
        a.properties.push(id_property());

        let mut b = descriptor("Gadget");
        b.table = Some(TableAnnotation { name: Some("items".into()) });
        b.properties.push(id_property());

        let err = analyze(&[a, b], AnalyzeMode::Provider, "").unwrap_err();
        assert_eq!(err, AnalysisError::DuplicateTable("items".into()));
    }

    #[test]
    fn unknown_referential_action_rejected() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let mut customer_id = PropertyDescriptor::new("CustomerId", ValueFamily::Int32);
        customer_id.foreign_key = Some(ForeignKeyAnnotation {
            referenced_table: "customers".into(),
            referenced_column: None,
            name: None,
            on_delete: Some("explode".into()),
            on_update: None,
        });
        d.properties.push(customer_id);

        let err = analyze(&[d], AnalyzeMode::Provider, "").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::UnknownReferentialAction("explode".into(), "FK_Order_CustomerId".into())
        );
    }

    #[test]
    fn unknown_index_kind_rejected() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let mut notes = PropertyDescriptor::new("Notes", ValueFamily::Text);
        notes.indexes.push(IndexAnnotation {
            kind: Some("bloom".into()),
            ..Default::default()
        });
        d.properties.push(notes);

        let err = analyze(&[d], AnalyzeMode::Provider, "").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::UnknownIndexKind("bloom".into(), "IX_Order_Notes".into())
        );
    }

    #[test]
    fn foreign_key_defaults_referenced_column_to_id() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let mut customer_id = PropertyDescriptor::new("CustomerId", ValueFamily::Int32);
        customer_id.foreign_key = Some(ForeignKeyAnnotation {
            referenced_table: "customers".into(),
            referenced_column: None,
            name: None,
            on_delete: None,
            on_update: None,
        });
        d.properties.push(customer_id);

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        let fk = tables[0]
            .constraints
            .iter()
            .find(|c| matches!(c.kind, ConstraintKind::ForeignKey { .. }))
            .unwrap();
        match &fk.kind {
            ConstraintKind::ForeignKey {
                referenced_columns, on_delete, ..
            } => {
                assert_eq!(referenced_columns, &vec!["id".to_string()]);
                assert_eq!(*on_delete, ReferentialAction::NoAction);
            }
            other => panic!("expected ForeignKey, got {other:?}"),
        }
    }

    #[test]
    fn explicit_column_name_overrides_property_name() {
        let mut d = descriptor("Order");
        d.table = Some(TableAnnotation::default());
        d.properties.push(id_property());

        let mut total = PropertyDescriptor::new("Total", ValueFamily::Decimal);
        total.column = Some(ColumnAnnotation {
            name: Some("total_amount".into()),
            ..Default::default()
        });
        d.properties.push(total);

        let tables = analyze(&[d], AnalyzeMode::Provider, "").unwrap();
        assert!(tables[0].get_column("total_amount").is_some());
    }
}
