//! Result-row decode helpers shared by the per-dialect introspectors
//!
//! Each dialect issues a different query shape, but every row still
//! decodes down to the same handful of fields before it is folded into a
//! [`crate::model`] type. Keeping that decode step here (rather than
//! duplicated four times) is the only thing these modules share — the
//! query text itself stays dialect-specific.

use crate::executor::Row;
use crate::introspect::IntrospectionError;

fn required_str<'a>(row: &'a Row, column: &str) -> Result<&'a str, IntrospectionError> {
    row.get_str(column)
        .ok_or_else(|| IntrospectionError::MalformedMetadata(format!("missing or non-text column '{column}'")))
}

/// One row of a `get_tables` result: just the bare name.
pub struct TableRow {
    pub name: String,
}

impl TableRow {
    pub fn from_row(row: &Row) -> Result<Self, IntrospectionError> {
        Ok(TableRow {
            name: required_str(row, "table_name")?.to_string(),
        })
    }
}

/// One row of a `get_columns` result, prior to inverse type mapping (which
/// stays dialect-specific since the type vocabularies differ).
pub struct ColumnRow {
    pub name: String,
    pub type_name: String,
    pub max_length: Option<i64>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub collation: Option<String>,
    pub is_nullable: bool,
    pub is_identity: bool,
    pub default_value: Option<String>,
}

impl ColumnRow {
    pub fn from_row(row: &Row) -> Result<Self, IntrospectionError> {
        Ok(ColumnRow {
            name: required_str(row, "column_name")?.to_string(),
            type_name: required_str(row, "data_type")?.to_string(),
            max_length: row.get_i64("character_maximum_length"),
            precision: row.get_i64("numeric_precision").map(|n| n as u32),
            scale: row.get_i64("numeric_scale").map(|n| n as u32),
            collation: row.get_str("collation_name").map(str::to_string),
            is_nullable: row.get_bool("is_nullable").unwrap_or(false),
            is_identity: row.get_bool("is_identity").unwrap_or(false),
            default_value: row.get_str("column_default").map(str::to_string),
        })
    }
}

/// One row of a `get_indexes` result — one per (index, column) pair; the
/// introspector groups these back into [`crate::model::Index`] values.
pub struct IndexColumnRow {
    pub index_name: String,
    pub is_unique: bool,
    pub is_clustered: bool,
    pub kind_raw: Option<String>,
    pub column_name: String,
    pub ordinal: usize,
    pub descending: bool,
    pub where_expression: Option<String>,
}

impl IndexColumnRow {
    pub fn from_row(row: &Row) -> Result<Self, IntrospectionError> {
        Ok(IndexColumnRow {
            index_name: required_str(row, "index_name")?.to_string(),
            is_unique: row.get_bool("is_unique").unwrap_or(false),
            is_clustered: row.get_bool("is_clustered").unwrap_or(false),
            kind_raw: row.get_str("index_kind").map(str::to_string),
            column_name: required_str(row, "column_name")?.to_string(),
            ordinal: row.get_i64("ordinal_position").unwrap_or(1).max(1) as usize,
            descending: row.get_bool("is_descending").unwrap_or(false),
            where_expression: row.get_str("filter_definition").map(str::to_string),
        })
    }
}

/// One row of a `get_constraints` result — shape varies by
/// `constraint_type`, decoded further by each dialect's introspector.
pub struct ConstraintRow {
    pub name: String,
    pub constraint_type: String,
    pub column_name: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    pub check_expression: Option<String>,
}

impl ConstraintRow {
    pub fn from_row(row: &Row) -> Result<Self, IntrospectionError> {
        Ok(ConstraintRow {
            name: required_str(row, "constraint_name")?.to_string(),
            constraint_type: required_str(row, "constraint_type")?.to_string(),
            column_name: row.get_str("column_name").map(str::to_string),
            referenced_table: row.get_str("referenced_table").map(str::to_string),
            referenced_column: row.get_str("referenced_column").map(str::to_string),
            on_delete: row.get_str("delete_rule").map(str::to_string),
            on_update: row.get_str("update_rule").map(str::to_string),
            check_expression: row.get_str("check_clause").map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ScalarValue;

    #[test]
    fn table_row_requires_table_name() {
        let row = Row::new();
        assert!(TableRow::from_row(&row).is_err());
    }

    #[test]
    fn column_row_defaults_missing_flags_to_false() {
        let row = Row::new()
            .set("column_name", ScalarValue::Text("id".into()))
            .set("data_type", ScalarValue::Text("int".into()));
        let decoded = ColumnRow::from_row(&row).unwrap();
        assert!(!decoded.is_nullable);
        assert!(!decoded.is_identity);
    }

    #[test]
    fn index_column_row_clamps_ordinal_to_at_least_one() {
        let row = Row::new()
            .set("index_name", ScalarValue::Text("ix".into()))
            .set("column_name", ScalarValue::Text("id".into()));
        let decoded = IndexColumnRow::from_row(&row).unwrap();
        assert_eq!(decoded.ordinal, 1);
    }
}
