//! Data-Loss Risk Analyzer
//!
//! Pure, deterministic comparison of two schema snapshots. No I/O, no dialect knowledge — this runs on the same `current`/
//! `target` pair the diff in [`crate::ddl::diff`] consumes, and is always
//! run before any statement is generated for execution.

use std::fmt;

use crate::model::{Column, ColumnType, DeclaredType, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    TableDrop,
    ColumnDrop,
    LengthReduction,
    PrecisionReduction,
    DataTypeChange,
    NullabilityChange,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningKind::TableDrop => "TableDrop",
            WarningKind::ColumnDrop => "ColumnDrop",
            WarningKind::LengthReduction => "LengthReduction",
            WarningKind::PrecisionReduction => "PrecisionReduction",
            WarningKind::DataTypeChange => "DataTypeChange",
            WarningKind::NullabilityChange => "NullabilityChange",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub table: String,
    pub column: Option<String>,
    pub message: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RiskReport {
    pub warnings: Vec<Warning>,
    pub has_high: bool,
    pub has_medium: bool,
    pub requires_confirmation: bool,
}

/// Compare `current` against `target` and collect every data-loss risk
/// per a fixed kind/severity classification table. Deterministic:
/// warnings are sorted by severity descending, then by table, then by
/// column.
pub fn analyze_risk(current: &[Table], target: &[Table]) -> RiskReport {
    let mut warnings = Vec::new();

    for current_table in current {
        let full_name = current_table.full_name();
        match target.iter().find(|t| t.full_name() == full_name) {
            None => warnings.push(Warning {
                kind: WarningKind::TableDrop,
                severity: Severity::High,
                table: full_name.clone(),
                column: None,
                message: format!("table '{full_name}' is dropped"),
                details: "present in current schema, absent from target".to_string(),
            }),
            Some(target_table) => warnings.extend(diff_columns(current_table, target_table)),
        }
    }

    warnings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.table.cmp(&b.table))
            .then_with(|| a.column.cmp(&b.column))
    });

    let has_high = warnings.iter().any(|w| w.severity == Severity::High);
    let has_medium = warnings.iter().any(|w| w.severity == Severity::Medium);
    RiskReport {
        warnings,
        has_high,
        has_medium,
        requires_confirmation: has_high || has_medium,
    }
}

fn diff_columns(current: &Table, target: &Table) -> Vec<Warning> {
    let full_name = current.full_name();
    let mut warnings = Vec::new();

    for current_col in &current.columns {
        match target.get_column(&current_col.name) {
            None => warnings.push(Warning {
                kind: WarningKind::ColumnDrop,
                severity: Severity::High,
                table: full_name.clone(),
                column: Some(current_col.name.clone()),
                message: format!("column '{}' is dropped", current_col.name),
                details: "present in current schema, absent from target".to_string(),
            }),
            Some(target_col) => {
                warnings.extend(column_change_warnings(&full_name, current_col, target_col));
            }
        }
    }

    for target_col in &target.columns {
        if current.get_column(&target_col.name).is_none() && !target_col.is_nullable && target_col.default_value.is_none() {
            warnings.push(Warning {
                kind: WarningKind::NullabilityChange,
                severity: Severity::Medium,
                table: full_name.clone(),
                column: Some(target_col.name.clone()),
                message: format!("column '{}' added as non-nullable with no default", target_col.name),
                details: "existing rows have no value to populate this column with".to_string(),
            });
        }
    }

    warnings
}

fn column_change_warnings(table: &str, current: &Column, target: &Column) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let column = Some(current.name.clone());

    if let (Some(cur_len), Some(tgt_len)) = (current.max_length, target.max_length)
        && tgt_len < cur_len
    {
        warnings.push(Warning {
            kind: WarningKind::LengthReduction,
            severity: Severity::High,
            table: table.to_string(),
            column: column.clone(),
            message: format!("column '{}' max_length reduced from {cur_len} to {tgt_len}", current.name),
            details: "values longer than the new length would be truncated or rejected".to_string(),
        });
    }

    let precision_reduced = match (current.precision, target.precision) {
        (Some(cur), Some(tgt)) => tgt < cur,
        _ => false,
    };
    let scale_reduced = match (current.scale, target.scale) {
        (Some(cur), Some(tgt)) => tgt < cur,
        _ => false,
    };
    if precision_reduced || scale_reduced {
        warnings.push(Warning {
            kind: WarningKind::PrecisionReduction,
            severity: Severity::High,
            table: table.to_string(),
            column: column.clone(),
            message: format!("column '{}' numeric precision or scale reduced", current.name),
            details: format!(
                "precision {:?} -> {:?}, scale {:?} -> {:?}",
                current.precision, target.precision, current.scale, target.scale
            ),
        });
    }

    if current.column_type != target.column_type {
        let severity = classify_type_change(&current.column_type, &target.column_type);
        warnings.push(Warning {
            kind: WarningKind::DataTypeChange,
            severity,
            table: table.to_string(),
            column: column.clone(),
            message: format!("column '{}' type changed from {} to {}", current.name, describe(&current.column_type), describe(&target.column_type)),
            details: match severity {
                Severity::High => "narrowing conversion, existing values may not fit the new type".to_string(),
                Severity::Medium => "lossy same-family or unclassified type change".to_string(),
                _ => "widening conversion".to_string(),
            },
        });
    } else if raw_types_differ(&current.raw_type, &target.raw_type) {
        // Two columns can share a canonical DeclaredType (NVARCHAR and
        // VARCHAR both map to String) while the underlying provider type
        // actually narrows — the raw spelling is the only place that shows.
        warnings.push(Warning {
            kind: WarningKind::DataTypeChange,
            severity: Severity::Medium,
            table: table.to_string(),
            column: column.clone(),
            message: format!(
                "column '{}' provider type changed from {} to {}",
                current.name,
                current.raw_type.as_deref().unwrap_or("unknown"),
                target.raw_type.as_deref().unwrap_or("unknown"),
            ),
            details: "same canonical type, but the underlying provider type differs".to_string(),
        });
    }

    if current.is_nullable && !target.is_nullable {
        warnings.push(Warning {
            kind: WarningKind::NullabilityChange,
            severity: Severity::Medium,
            table: table.to_string(),
            column: column.clone(),
            message: format!("column '{}' becomes non-nullable", current.name),
            details: "existing NULL values in this column would violate the new constraint".to_string(),
        });
    }

    warnings
}

/// True only when both sides pin an explicit provider type spelling and
/// those spellings differ. A missing raw type on either side (the common
/// case for a model-derived target column with no explicit type override)
/// carries no information to diff against, so it is never treated as a
/// change.
fn raw_types_differ(current: &Option<String>, target: &Option<String>) -> bool {
    match (current, target) {
        (Some(cur), Some(tgt)) => !cur.eq_ignore_ascii_case(tgt),
        _ => false,
    }
}

fn describe(ty: &ColumnType) -> String {
    match ty {
        ColumnType::Declared(d) => d.to_string(),
        ColumnType::Raw(s) => s.clone(),
    }
}

/// Complete kind/severity classification for `DataTypeChange`: known
/// narrowings are High, known lossy-same-family changes are Medium, known
/// widenings are None, everything else unclassified falls back to Medium.
fn classify_type_change(current: &ColumnType, target: &ColumnType) -> Severity {
    use DeclaredType::*;

    let (ColumnType::Declared(cur), ColumnType::Declared(tgt)) = (current, target) else {
        return Severity::Medium;
    };

    let narrowing = matches!(
        (cur, tgt),
        (String, Int16) | (String, Int32) | (String, Int64)
            | (Decimal, Int16) | (Decimal, Int32) | (Decimal, Int64)
            | (Int64, Int32) | (Int64, Int16) | (Int32, Int16)
            | (DateTime, String) | (DateTimeOffset, String)
            | (Guid, String)
            | (Float32, Int16) | (Float32, Int32)
    );
    if narrowing {
        return Severity::High;
    }

    let lossy_same_family = matches!(
        (cur, tgt),
        (DateTimeOffset, DateTime) | (Float64, Float32)
    );
    if lossy_same_family {
        return Severity::Medium;
    }

    let widening = matches!(
        (cur, tgt),
        (Int16, Int32) | (Int16, Int64) | (Int32, Int64)
            | (Byte, Int16) | (Byte, Int32) | (Byte, Int64)
            | (Byte, Float32) | (Byte, Float64)
            | (Float32, Float64)
    );
    if widening {
        return Severity::None;
    }

    Severity::Medium
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnSpec;

    fn col(name: &str, ty: DeclaredType, nullable: bool, max_length: Option<i64>) -> Column {
        Column::new(ColumnSpec {
            name: name.into(),
            column_type: ColumnType::Declared(ty),
            max_length,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: nullable,
            is_primary_key: false,
            is_identity: false,
            default_value: None,
            raw_type: None,
        })
        .unwrap()
    }

    fn col_with_raw_type(name: &str, ty: DeclaredType, raw_type: &str) -> Column {
        Column::new(ColumnSpec {
            name: name.into(),
            column_type: ColumnType::Declared(ty),
            max_length: None,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: false,
            is_primary_key: false,
            is_identity: false,
            default_value: None,
            raw_type: Some(raw_type.into()),
        })
        .unwrap()
    }

    fn table(name: &str, columns: Vec<Column>) -> Table {
        Table::new(name, None, columns, vec![], vec![]).unwrap()
    }

    #[test]
    fn dropped_table_is_high_severity() {
        let current = vec![table("widgets", vec![col("id", DeclaredType::Int32, false, None)])];
        let report = analyze_risk(&current, &[]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::TableDrop);
        assert_eq!(report.warnings[0].severity, Severity::High);
        assert!(report.requires_confirmation);
    }

    #[test]
    fn dropped_column_is_high_severity() {
        let current = vec![table(
            "widgets",
            vec![col("id", DeclaredType::Int32, false, None), col("notes", DeclaredType::Text, true, None)],
        )];
        let target = vec![table("widgets", vec![col("id", DeclaredType::Int32, false, None)])];
        let report = analyze_risk(&current, &target);
        assert!(report.warnings.iter().any(|w| w.kind == WarningKind::ColumnDrop && w.severity == Severity::High));
    }

    #[test]
    fn length_reduction_is_high_severity() {
        let current = vec![table("widgets", vec![col("name", DeclaredType::String, false, Some(100))])];
        let target = vec![table("widgets", vec![col("name", DeclaredType::String, false, Some(20))])];
        let report = analyze_risk(&current, &target);
        assert_eq!(report.warnings[0].kind, WarningKind::LengthReduction);
        assert_eq!(report.warnings[0].severity, Severity::High);
    }

    #[test]
    fn narrowing_type_change_is_high_severity() {
        let current = vec![table("widgets", vec![col("code", DeclaredType::String, false, None)])];
        let target = vec![table("widgets", vec![col("code", DeclaredType::Int32, false, None)])];
        let report = analyze_risk(&current, &target);
        assert_eq!(report.warnings[0].severity, Severity::High);
    }

    #[test]
    fn nullable_to_non_nullable_is_medium_severity() {
        let current = vec![table("widgets", vec![col("notes", DeclaredType::Text, true, None)])];
        let target = vec![table("widgets", vec![col("notes", DeclaredType::Text, false, None)])];
        let report = analyze_risk(&current, &target);
        assert_eq!(report.warnings[0].kind, WarningKind::NullabilityChange);
        assert_eq!(report.warnings[0].severity, Severity::Medium);
        assert!(report.requires_confirmation && !report.has_high && report.has_medium);
    }

    #[test]
    fn widening_length_increase_produces_no_warning() {
        let current = vec![table("widgets", vec![col("name", DeclaredType::String, false, Some(20))])];
        let target = vec![table("widgets", vec![col("name", DeclaredType::String, false, Some(100))])];
        let report = analyze_risk(&current, &target);
        assert!(report.warnings.is_empty());
        assert!(!report.requires_confirmation);
    }

    #[test]
    fn widening_type_change_produces_no_warning() {
        let current = vec![table("widgets", vec![col("count", DeclaredType::Int16, false, None)])];
        let target = vec![table("widgets", vec![col("count", DeclaredType::Int32, false, None)])];
        let report = analyze_risk(&current, &target);
        assert!(report.warnings.is_empty());
        assert!(!report.requires_confirmation);
    }

    #[test]
    fn float_to_float_narrowing_is_medium_not_high() {
        let current = vec![table("widgets", vec![col("amount", DeclaredType::Float64, false, None)])];
        let target = vec![table("widgets", vec![col("amount", DeclaredType::Float32, false, None)])];
        let report = analyze_risk(&current, &target);
        assert_eq!(report.warnings[0].severity, Severity::Medium);
    }

    #[test]
    fn float_to_int_truncation_is_high_not_medium() {
        let current = vec![table("widgets", vec![col("amount", DeclaredType::Float32, false, None)])];
        let target = vec![table("widgets", vec![col("amount", DeclaredType::Int32, false, None)])];
        let report = analyze_risk(&current, &target);
        assert_eq!(report.warnings[0].severity, Severity::High);
    }

    #[test]
    fn same_canonical_type_but_differing_raw_type_is_flagged() {
        let current = vec![table("widgets", vec![col_with_raw_type("label", DeclaredType::String, "nvarchar")])];
        let target = vec![table("widgets", vec![col_with_raw_type("label", DeclaredType::String, "varchar")])];
        let report = analyze_risk(&current, &target);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::DataTypeChange);
        assert_eq!(report.warnings[0].severity, Severity::Medium);
    }

    #[test]
    fn missing_raw_type_on_either_side_is_never_flagged() {
        let current = vec![table("widgets", vec![col_with_raw_type("label", DeclaredType::String, "nvarchar")])];
        let target = vec![table("widgets", vec![col("label", DeclaredType::String, false, None)])];
        let report = analyze_risk(&current, &target);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn warnings_sorted_by_severity_then_table_then_column() {
        let current = vec![
            table("zebras", vec![col("id", DeclaredType::Int32, false, None)]),
            table(
                "ants",
                vec![col("id", DeclaredType::Int32, false, None), col("name", DeclaredType::String, true, None)],
            ),
        ];
        let target = vec![table("ants", vec![col("id", DeclaredType::Int32, false, None)])];
        let report = analyze_risk(&current, &target);
        // zebras (TableDrop, High) and ants.name (ColumnDrop, High) both
        // High: tie-broken alphabetically by table name.
        assert_eq!(report.warnings[0].table, "ants");
        assert_eq!(report.warnings[1].table, "zebras");
    }
}
