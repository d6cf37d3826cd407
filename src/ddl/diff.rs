//! Migration-script construction
//!
//! Dialect-agnostic: a pure function of two schema snapshots that decides
//! *what* to emit and in *what order*; the actual SQL text for each
//! decision comes from whichever [`DdlGenerator`] the caller selected. This
//! split keeps the deterministic ordering independent of any one dialect's
//! string formatting.

use std::collections::HashMap;

use crate::ddl::DdlGenerator;
use crate::model::{Column, Constraint, ConstraintKind, Index, Table};

/// Build the ordered statement list that turns `current` into `target`,
/// fixed order: CREATE TABLE, then CREATE INDEX, then ALTER, then DROP
/// INDEX, then DROP TABLE; within a group, alphabetical by `full_name`
/// (case-insensitive) then by child name.
pub fn generate_migration_script(generator: &dyn DdlGenerator, current: &[Table], target: &[Table]) -> Vec<String> {
    let current_by_name: HashMap<String, &Table> = current.iter().map(|t| (t.full_name(), t)).collect();
    let target_by_name: HashMap<String, &Table> = target.iter().map(|t| (t.full_name(), t)).collect();

    let mut create_table_stmts: Vec<(String, String)> = Vec::new();
    let mut create_index_stmts: Vec<(String, String, String)> = Vec::new();
    let mut alter_stmts: Vec<(String, String, String)> = Vec::new();
    let mut drop_index_stmts: Vec<(String, String, String)> = Vec::new();
    let mut drop_table_stmts: Vec<(String, String)> = Vec::new();

    let mut target_names: Vec<&String> = target_by_name.keys().collect();
    target_names.sort_by_key(|n| n.to_ascii_lowercase());

    for full_name in &target_names {
        let target_table = target_by_name[*full_name];
        match current_by_name.get(*full_name) {
            None => {
                create_table_stmts.push(((*full_name).clone(), generator.generate_create_table(target_table)));
                for index in &target_table.indexes {
                    create_index_stmts.push((
                        (*full_name).clone(),
                        index.name.to_ascii_lowercase(),
                        generator.generate_create_index(target_table, index),
                    ));
                }
            }
            Some(current_table) => {
                let cascaded_indexes =
                    diff_table(generator, current_table, target_table, full_name, &mut alter_stmts, &mut drop_index_stmts);
                for index in &target_table.indexes {
                    let unchanged = current_table.indexes.iter().any(|i| indexes_equal(i, index));
                    let needs_recreate = cascaded_indexes.contains(&index.name.to_ascii_lowercase());
                    if !unchanged || needs_recreate {
                        create_index_stmts.push((
                            (*full_name).clone(),
                            index.name.to_ascii_lowercase(),
                            generator.generate_create_index(target_table, index),
                        ));
                    }
                }
            }
        }
    }

    let mut dropped_names: Vec<&String> = current_by_name
        .keys()
        .filter(|n| !target_by_name.contains_key(n.as_str()))
        .collect();
    dropped_names.sort_by_key(|n| n.to_ascii_lowercase());
    for full_name in dropped_names {
        let table = current_by_name[full_name.as_str()];
        drop_table_stmts.push((full_name.clone(), generator.generate_drop_table(table)));
    }

    create_table_stmts.sort_by(|a, b| a.0.to_ascii_lowercase().cmp(&b.0.to_ascii_lowercase()));
    create_index_stmts.sort_by(|a, b| (a.0.to_ascii_lowercase(), &a.1).cmp(&(b.0.to_ascii_lowercase(), &b.1)));
    alter_stmts.sort_by(|a, b| (a.0.to_ascii_lowercase(), &a.1).cmp(&(b.0.to_ascii_lowercase(), &b.1)));
    drop_index_stmts.sort_by(|a, b| (a.0.to_ascii_lowercase(), &a.1).cmp(&(b.0.to_ascii_lowercase(), &b.1)));
    drop_table_stmts.sort_by(|a, b| a.0.to_ascii_lowercase().cmp(&b.0.to_ascii_lowercase()));

    let mut statements = Vec::new();
    statements.extend(create_table_stmts.into_iter().map(|(_, s)| s));
    statements.extend(create_index_stmts.into_iter().map(|(_, _, s)| s));
    statements.extend(alter_stmts.into_iter().map(|(_, _, s)| s));
    statements.extend(drop_index_stmts.into_iter().map(|(_, _, s)| s));
    statements.extend(drop_table_stmts.into_iter().map(|(_, s)| s));
    statements
}

fn diff_table(
    generator: &dyn DdlGenerator,
    current: &Table,
    target: &Table,
    full_name: &str,
    alter_stmts: &mut Vec<(String, String, String)>,
    drop_index_stmts: &mut Vec<(String, String, String)>,
) -> std::collections::HashSet<String> {
    for target_col in &target.columns {
        match current.get_column(&target_col.name) {
            None => alter_stmts.push((
                full_name.to_string(),
                target_col.name.to_ascii_lowercase(),
                generator.generate_alter_add_column(target, target_col),
            )),
            Some(current_col) => {
                if columns_differ(current_col, target_col) {
                    for stmt in generator.generate_alter_alter_column(target, current_col, target_col) {
                        alter_stmts.push((full_name.to_string(), target_col.name.to_ascii_lowercase(), stmt));
                    }
                }
            }
        }
    }
    for current_col in &current.columns {
        if target.get_column(&current_col.name).is_none() {
            alter_stmts.push((
                full_name.to_string(),
                current_col.name.to_ascii_lowercase(),
                generator.generate_alter_drop_column(current, current_col),
            ));
        }
    }

    let mut already_dropped = std::collections::HashSet::new();
    for current_index in &current.indexes {
        let still_present = target.indexes.iter().any(|i| indexes_equal(i, current_index));
        if !still_present {
            let lower_name = current_index.name.to_ascii_lowercase();
            already_dropped.insert(lower_name.clone());
            drop_index_stmts.push((full_name.to_string(), lower_name, generator.generate_drop_index(current, current_index)));
        }
    }

    diff_constraints(generator, current, target, full_name, alter_stmts);

    // A changed primary key invalidates any index built over the same
    // columns (clustering, uniqueness enforcement) even when that index's
    // own shape is untouched, so it must be dropped and recreated too.
    let mut cascaded = std::collections::HashSet::new();
    if primary_key_changed(current, target) {
        if let Some(old_pk) = current.primary_key() {
            if let ConstraintKind::PrimaryKey { columns: pk_columns } = &old_pk.kind {
                for index in &current.indexes {
                    let overlaps = index.columns.iter().any(|c| pk_columns.contains(&c.column_name));
                    let lower_name = index.name.to_ascii_lowercase();
                    if overlaps && cascaded.insert(lower_name.clone()) && already_dropped.insert(lower_name.clone()) {
                        drop_index_stmts.push((full_name.to_string(), lower_name, generator.generate_drop_index(current, index)));
                    }
                }
            }
        }
    }
    cascaded
}

fn primary_key_changed(current: &Table, target: &Table) -> bool {
    match (current.primary_key(), target.primary_key()) {
        (None, None) => false,
        (Some(_), None) | (None, Some(_)) => true,
        (Some(a), Some(b)) => !constraint_kinds_equal(&a.kind, &b.kind),
    }
}

fn diff_constraints(
    generator: &dyn DdlGenerator,
    current: &Table,
    target: &Table,
    full_name: &str,
    alter_stmts: &mut Vec<(String, String, String)>,
) {
    for target_constraint in &target.constraints {
        let matching = current.constraints.iter().find(|c| c.name == target_constraint.name);
        match matching {
            None => alter_stmts.push((
                full_name.to_string(),
                target_constraint.name.to_ascii_lowercase(),
                generator.generate_alter_add_constraint(target, target_constraint),
            )),
            Some(current_constraint) if !constraints_equal(current_constraint, target_constraint) => {
                alter_stmts.push((
                    full_name.to_string(),
                    target_constraint.name.to_ascii_lowercase(),
                    generator.generate_alter_drop_constraint(current, current_constraint),
                ));
                alter_stmts.push((
                    full_name.to_string(),
                    target_constraint.name.to_ascii_lowercase(),
                    generator.generate_alter_add_constraint(target, target_constraint),
                ));
            }
            Some(_) => {}
        }
    }
    for current_constraint in &current.constraints {
        if !target.constraints.iter().any(|c| c.name == current_constraint.name) {
            alter_stmts.push((
                full_name.to_string(),
                current_constraint.name.to_ascii_lowercase(),
                generator.generate_alter_drop_constraint(current, current_constraint),
            ));
        }
    }
}

/// True when any of declared type, max length, precision, scale,
/// nullability, default value, or collation differs between the two
/// column shapes.
fn columns_differ(current: &Column, target: &Column) -> bool {
    current.column_type != target.column_type
        || current.max_length != target.max_length
        || current.precision != target.precision
        || current.scale != target.scale
        || current.is_nullable != target.is_nullable
        || current.default_value != target.default_value
        || current.collation != target.collation
}

/// Structural equality by `(name, kind, ordered column list, flags)`.
fn indexes_equal(a: &Index, b: &Index) -> bool {
    a.name == b.name
        && a.is_unique == b.is_unique
        && a.is_clustered == b.is_clustered
        && a.kind == b.kind
        && a.columns == b.columns
        && a.include_columns == b.include_columns
        && a.where_expression == b.where_expression
}

fn constraints_equal(a: &Constraint, b: &Constraint) -> bool {
    a.name == b.name && constraint_kinds_equal(&a.kind, &b.kind)
}

fn constraint_kinds_equal(a: &ConstraintKind, b: &ConstraintKind) -> bool {
    a == b
}
