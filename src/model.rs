//! Canonical schema model
//!
//! Provider-independent representation of a database's structure. Both the
//! Model Analyzer and every per-dialect Schema Introspector produce these
//! types; every per-dialect DDL Generator consumes them. Equality is by
//! identity attributes (names), not full structural equality, except where
//! noted — diffing logic in [`crate::ddl::diff`] compares fields directly.

use std::fmt;
use thiserror::Error;

/// Errors raised by the smart constructors in this module. These enforce
/// the structural invariants that do not depend on a target
/// dialect (dialect-dependent invariants, e.g. "clustered indexes require
/// dialect support", are checked later by [`crate::ddl::validate_for_dialect`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{what} name must not be empty")]
    EmptyName { what: &'static str },

    #[error("table must have at least one column")]
    EmptyColumns,

    #[error("duplicate column name '{0}' in table")]
    DuplicateColumn(String),

    #[error("duplicate index name '{0}' in table")]
    DuplicateIndex(String),

    #[error("duplicate constraint name '{0}' in table")]
    DuplicateConstraint(String),

    #[error("table has more than one PRIMARY KEY constraint")]
    MultiplePrimaryKeys,

    #[error("index '{index}' references unknown column '{column}'")]
    UnknownIndexColumn { index: String, column: String },

    #[error("index '{0}' must have at least one column")]
    EmptyIndexColumns(String),

    #[error("index '{0}' column ordinals must be strictly increasing starting from 1")]
    NonIncreasingOrdinal(String),

    #[error("column '{0}' has scale greater than precision")]
    ScaleExceedsPrecision(String),

    #[error("column '{0}' is marked is_identity but is not a primary-key integer column")]
    InvalidIdentity(String),

    #[error("column '{0}' cannot be both is_identity and carry a default value")]
    IdentityWithDefault(String),
}

/// Abstract column type tag. When a host annotation pins a concrete
/// provider type string instead, [`ColumnType::Raw`] is used and passed
/// through the DDL Generator verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    Bool,
    Int16,
    Int32,
    Int64,
    Byte,
    Float32,
    Float64,
    Decimal,
    String,
    Text,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Guid,
    Binary,
    Json,
}

impl DeclaredType {
    /// True for the integer family eligible for `is_identity`.
    pub fn is_integer_family(self) -> bool {
        matches!(
            self,
            DeclaredType::Int16 | DeclaredType::Int32 | DeclaredType::Int64 | DeclaredType::Byte
        )
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclaredType::Bool => "Bool",
            DeclaredType::Int16 => "Int16",
            DeclaredType::Int32 => "Int32",
            DeclaredType::Int64 => "Int64",
            DeclaredType::Byte => "Byte",
            DeclaredType::Float32 => "Float32",
            DeclaredType::Float64 => "Float64",
            DeclaredType::Decimal => "Decimal",
            DeclaredType::String => "String",
            DeclaredType::Text => "Text",
            DeclaredType::DateTime => "DateTime",
            DeclaredType::DateTimeOffset => "DateTimeOffset",
            DeclaredType::TimeSpan => "TimeSpan",
            DeclaredType::Guid => "Guid",
            DeclaredType::Binary => "Binary",
            DeclaredType::Json => "Json",
        };
        f.write_str(s)
    }
}

/// A column's type: either the canonical tag, or a raw provider type string
/// pinned by an explicit annotation and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Declared(DeclaredType),
    Raw(String),
}

impl ColumnType {
    pub fn is_integer_family(&self) -> bool {
        matches!(self, ColumnType::Declared(d) if d.is_integer_family())
    }
}

/// A column default: either a literal bound value or a raw SQL expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    Literal(String),
    RawExpression(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub max_length: Option<i64>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub collation: Option<String>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub default_value: Option<DefaultValue>,
    /// The provider's own type spelling, when known (e.g. `"nvarchar"` vs
    /// `"varchar"`), carried alongside `column_type`. Two columns can share a
    /// canonical [`DeclaredType`] while still differing at this level; the
    /// Risk Analyzer diffs on both so a narrowing within one canonical
    /// bucket (NVARCHAR -> VARCHAR, DATETIME2 -> DATETIME) is still caught.
    pub raw_type: Option<String>,
}

/// Fields accepted by [`Column::new`]. Grouped into one struct because the
/// constructor's invariant checks need every flag at once; a long positional
/// argument list would be unreadable and error-prone at call sites.
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub max_length: Option<i64>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub collation: Option<String>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub default_value: Option<DefaultValue>,
    pub raw_type: Option<String>,
}

impl Column {
    /// Construct a column, enforcing its structural invariants:
    /// `scale <= precision`; `is_identity ⇒ is_primary_key ∧ integer family`;
    /// a column cannot be both `is_identity` and carry a `default_value`.
    pub fn new(spec: ColumnSpec) -> Result<Self, ModelError> {
        if spec.name.is_empty() {
            return Err(ModelError::EmptyName { what: "column" });
        }
        if let (Some(scale), Some(precision)) = (spec.scale, spec.precision)
            && scale > precision
        {
            return Err(ModelError::ScaleExceedsPrecision(spec.name));
        }
        if spec.is_identity {
            if !spec.is_primary_key || !spec.column_type.is_integer_family() {
                return Err(ModelError::InvalidIdentity(spec.name));
            }
            if spec.default_value.is_some() {
                return Err(ModelError::IdentityWithDefault(spec.name));
            }
        }
        Ok(Column {
            name: spec.name,
            column_type: spec.column_type,
            max_length: spec.max_length,
            precision: spec.precision,
            scale: spec.scale,
            collation: spec.collation,
            is_nullable: spec.is_nullable,
            is_primary_key: spec.is_primary_key,
            is_identity: spec.is_identity,
            default_value: spec.default_value,
            raw_type: spec.raw_type,
        })
    }
}

/// One entry in an index's column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub column_name: String,
    pub ordinal: usize,
    pub descending: bool,
}

/// The kinds of index a dialect may support. See [`crate::capability`] for
/// which kinds each dialect accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    BTree,
    Hash,
    GIN,
    GiST,
    BRIN,
    SPGiST,
    Clustered,
    NonClustered,
    ColumnStore,
    Spatial,
    FullText,
}

impl IndexKind {
    /// Parse the annotation-vocabulary spelling of an index kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "btree" => Some(Self::BTree),
            "hash" => Some(Self::Hash),
            "gin" => Some(Self::GIN),
            "gist" => Some(Self::GiST),
            "brin" => Some(Self::BRIN),
            "spgist" => Some(Self::SPGiST),
            "clustered" => Some(Self::Clustered),
            "nonclustered" => Some(Self::NonClustered),
            "columnstore" => Some(Self::ColumnStore),
            "spatial" => Some(Self::Spatial),
            "fulltext" => Some(Self::FullText),
            _ => None,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexKind::BTree => "BTree",
            IndexKind::Hash => "Hash",
            IndexKind::GIN => "GIN",
            IndexKind::GiST => "GiST",
            IndexKind::BRIN => "BRIN",
            IndexKind::SPGiST => "SPGiST",
            IndexKind::Clustered => "Clustered",
            IndexKind::NonClustered => "NonClustered",
            IndexKind::ColumnStore => "ColumnStore",
            IndexKind::Spatial => "Spatial",
            IndexKind::FullText => "FullText",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub is_unique: bool,
    pub is_clustered: bool,
    pub kind: IndexKind,
    pub columns: Vec<IndexColumn>,
    /// Covering columns (`INCLUDE (...)`), honored on SqlServer/PostgreSql only.
    pub include_columns: Option<Vec<String>>,
    /// Filtered-index predicate (`WHERE ...`), honored on PostgreSql/Sqlite only.
    pub where_expression: Option<String>,
}

impl Index {
    /// Construct an index, enforcing non-empty name/columns and strictly
    /// increasing ordinals starting at 1. Whether every `column_name` exists
    /// in the parent table is checked by [`Table::new`], which has the
    /// column list available.
    pub fn new(
        name: impl Into<String>,
        is_unique: bool,
        is_clustered: bool,
        kind: IndexKind,
        columns: Vec<IndexColumn>,
        include_columns: Option<Vec<String>>,
        where_expression: Option<String>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName { what: "index" });
        }
        if columns.is_empty() {
            return Err(ModelError::EmptyIndexColumns(name));
        }
        for (i, col) in columns.iter().enumerate() {
            if col.ordinal != i + 1 {
                return Err(ModelError::NonIncreasingOrdinal(name));
            }
        }
        Ok(Index {
            name,
            is_unique,
            is_clustered,
            kind,
            columns,
            include_columns,
            where_expression,
        })
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.column_name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl ReferentialAction {
    /// Parse the annotation-vocabulary spelling of a referential action.
    /// Unrecognized strings are the caller's responsibility to reject with
    /// [`crate::analyzer::AnalysisError::UnknownReferentialAction`].
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace([' ', '_'], "").as_str() {
            "noaction" => Some(Self::NoAction),
            "cascade" => Some(Self::Cascade),
            "setnull" => Some(Self::SetNull),
            "setdefault" => Some(Self::SetDefault),
            "restrict" => Some(Self::Restrict),
            _ => None,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey {
        columns: Vec<String>,
    },
    ForeignKey {
        columns: Vec<String>,
        referenced_table: String,
        referenced_columns: Vec<String>,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    },
    Unique {
        columns: Vec<String>,
    },
    Check {
        expression: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::PrimaryKey { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub constraints: Vec<Constraint>,
}

impl Table {
    /// Construct a table, enforcing: non-empty name; non-empty, uniquely
    /// named columns; uniquely named indexes whose columns all exist on the
    /// table; uniquely named constraints with at most one `PrimaryKey`.
    pub fn new(
        name: impl Into<String>,
        schema: Option<String>,
        columns: Vec<Column>,
        indexes: Vec<Index>,
        constraints: Vec<Constraint>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName { what: "table" });
        }
        if columns.is_empty() {
            return Err(ModelError::EmptyColumns);
        }

        let mut seen_columns = std::collections::HashSet::new();
        for col in &columns {
            if !seen_columns.insert(col.name.as_str()) {
                return Err(ModelError::DuplicateColumn(col.name.clone()));
            }
        }

        let mut seen_indexes = std::collections::HashSet::new();
        for idx in &indexes {
            if !seen_indexes.insert(idx.name.as_str()) {
                return Err(ModelError::DuplicateIndex(idx.name.clone()));
            }
            for col_name in idx.column_names() {
                if !seen_columns.contains(col_name) {
                    return Err(ModelError::UnknownIndexColumn {
                        index: idx.name.clone(),
                        column: col_name.to_string(),
                    });
                }
            }
        }

        let mut seen_constraints = std::collections::HashSet::new();
        let mut pk_count = 0;
        for c in &constraints {
            if !seen_constraints.insert(c.name.as_str()) {
                return Err(ModelError::DuplicateConstraint(c.name.clone()));
            }
            if c.is_primary_key() {
                pk_count += 1;
            }
        }
        if pk_count > 1 {
            return Err(ModelError::MultiplePrimaryKeys);
        }

        Ok(Table {
            name,
            schema,
            columns,
            indexes,
            constraints,
        })
    }

    /// `schema.name` if a schema is present, else `name`.
    pub fn full_name(&self) -> String {
        match &self.schema {
            Some(s) => format!("{s}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.is_primary_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_col(name: &str) -> Column {
        Column::new(ColumnSpec {
            name: name.to_string(),
            column_type: ColumnType::Declared(DeclaredType::Int32),
            max_length: None,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: false,
            is_primary_key: false,
            is_identity: false,
            default_value: None,
            raw_type: None,
        })
        .unwrap()
    }

    #[test]
    fn scale_exceeds_precision_rejected() {
        let err = Column::new(ColumnSpec {
            name: "amount".into(),
            column_type: ColumnType::Declared(DeclaredType::Decimal),
            max_length: None,
            precision: Some(4),
            scale: Some(6),
            collation: None,
            is_nullable: false,
            is_primary_key: false,
            is_identity: false,
            default_value: None,
            raw_type: None,
        })
        .unwrap_err();
        assert_eq!(err, ModelError::ScaleExceedsPrecision("amount".into()));
    }

    #[test]
    fn identity_requires_primary_key_and_integer_family() {
        let err = Column::new(ColumnSpec {
            name: "id".into(),
            column_type: ColumnType::Declared(DeclaredType::String),
            max_length: None,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: false,
            is_primary_key: true,
            is_identity: true,
            default_value: None,
            raw_type: None,
        })
        .unwrap_err();
        assert_eq!(err, ModelError::InvalidIdentity("id".into()));
    }

    #[test]
    fn identity_and_default_mutually_exclusive() {
        let err = Column::new(ColumnSpec {
            name: "id".into(),
            column_type: ColumnType::Declared(DeclaredType::Int64),
            max_length: None,
            precision: None,
            scale: None,
            collation: None,
            is_nullable: false,
            is_primary_key: true,
            is_identity: true,
            default_value: Some(DefaultValue::Literal("0".into())),
            raw_type: None,
        })
        .unwrap_err();
        assert_eq!(err, ModelError::IdentityWithDefault("id".into()));
    }

    #[test]
    fn table_rejects_duplicate_column_names() {
        let err = Table::new("users", None, vec![int_col("id"), int_col("id")], vec![], vec![])
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateColumn("id".into()));
    }

    #[test]
    fn table_rejects_index_on_unknown_column() {
        let idx = Index::new(
            "ix_users_email",
            false,
            false,
            IndexKind::BTree,
            vec![IndexColumn {
                column_name: "email".into(),
                ordinal: 1,
                descending: false,
            }],
            None,
            None,
        )
        .unwrap();
        let err = Table::new("users", None, vec![int_col("id")], vec![idx], vec![]).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownIndexColumn {
                index: "ix_users_email".into(),
                column: "email".into(),
            }
        );
    }

    #[test]
    fn table_rejects_multiple_primary_keys() {
        let pk1 = Constraint {
            name: "PK_users".into(),
            kind: ConstraintKind::PrimaryKey {
                columns: vec!["id".into()],
            },
        };
        let pk2 = Constraint {
            name: "PK_users_2".into(),
            kind: ConstraintKind::PrimaryKey {
                columns: vec!["id".into()],
            },
        };
        let err =
            Table::new("users", None, vec![int_col("id")], vec![], vec![pk1, pk2]).unwrap_err();
        assert_eq!(err, ModelError::MultiplePrimaryKeys);
    }

    #[test]
    fn full_name_includes_schema_when_present() {
        let t = Table::new("users", Some("public".into()), vec![int_col("id")], vec![], vec![])
            .unwrap();
        assert_eq!(t.full_name(), "public.users");
    }

    #[test]
    fn full_name_omits_schema_when_absent() {
        let t = Table::new("users", None, vec![int_col("id")], vec![], vec![]).unwrap();
        assert_eq!(t.full_name(), "users");
    }

    #[test]
    fn index_rejects_non_increasing_ordinals() {
        let err = Index::new(
            "ix",
            false,
            false,
            IndexKind::BTree,
            vec![
                IndexColumn {
                    column_name: "a".into(),
                    ordinal: 1,
                    descending: false,
                },
                IndexColumn {
                    column_name: "b".into(),
                    ordinal: 3,
                    descending: false,
                },
            ],
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ModelError::NonIncreasingOrdinal("ix".into()));
    }

    #[test]
    fn referential_action_parses_known_spellings() {
        assert_eq!(ReferentialAction::parse("Cascade"), Some(ReferentialAction::Cascade));
        assert_eq!(ReferentialAction::parse("set_null"), Some(ReferentialAction::SetNull));
        assert_eq!(ReferentialAction::parse("NO ACTION"), Some(ReferentialAction::NoAction));
        assert_eq!(ReferentialAction::parse("bogus"), None);
    }
}
