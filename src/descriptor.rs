//! Descriptor shape — the host-reflection boundary
//!
//! Replaces runtime reflection with an explicit descriptor value supplied
//! by the host. A host builds `Descriptor`s from compile-time metadata, a
//! code-generation step, or a manual builder; the Model Analyzer depends
//! only on this shape and knows nothing about how a host discovered it.

/// The value-type family of a property, used for type inference when no
/// explicit type-name is pinned on the column annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFamily {
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

impl ValueFamily {
    pub fn to_declared_type(self) -> crate::model::DeclaredType {
        use crate::model::DeclaredType as D;
        match self {
            ValueFamily::Bool => D::Bool,
            ValueFamily::Int16 => D::Int16,
            ValueFamily::Int32 => D::Int32,
            ValueFamily::Int64 => D::Int64,
            ValueFamily::Byte => D::Byte,
            ValueFamily::Float32 => D::Float32,
            ValueFamily::Float64 => D::Float64,
            ValueFamily::Decimal => D::Decimal,
            ValueFamily::String => D::String,
            ValueFamily::Text => D::Text,
            ValueFamily::DateTime => D::DateTime,
            ValueFamily::DateTimeOffset => D::DateTimeOffset,
            ValueFamily::TimeSpan => D::TimeSpan,
            ValueFamily::Guid => D::Guid,
            ValueFamily::Binary => D::Binary,
            ValueFamily::Json => D::Json,
        }
    }
}

/// `Table(name?)` — on a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableAnnotation {
    pub name: Option<String>,
}

/// `Column(name?, type?, max_length?, precision?, scale?, is_nullable?, collation?)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAnnotation {
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub max_length: Option<i64>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub is_nullable: Option<bool>,
    pub collation: Option<String>,
}

/// `Key` / `ExplicitKey` / `PrimaryKey(order?, is_identity?)` — primary-key
/// participation. The three annotation spellings a host may use all reduce
/// to this shape: presence means participation, fields tune ordering and
/// identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAnnotation {
    pub order: Option<i32>,
    pub is_identity: Option<bool>,
}

/// `Index(name?, group?, order?, is_unique?, kind?, include?, where?, descending?)`
/// — repeatable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexAnnotation {
    pub name: Option<String>,
    pub group: Option<String>,
    pub order: Option<i32>,
    pub is_unique: bool,
    /// Raw annotation-vocabulary spelling (e.g. `"gin"`), resolved to an
    /// [`crate::model::IndexKind`] by the analyzer. Unrecognized spellings
    /// surface as `AnalysisError::UnknownIndexKind`.
    pub kind: Option<String>,
    pub include: Vec<String>,
    pub where_expression: Option<String>,
    pub descending: bool,
}

/// `Unique(name?, group?, order?)` — repeatable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueAnnotation {
    pub name: Option<String>,
    pub group: Option<String>,
    pub order: Option<i32>,
}

/// `ForeignKey(referenced_table, referenced_column?, name?, on_delete?, on_update?)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyAnnotation {
    pub referenced_table: String,
    pub referenced_column: Option<String>,
    pub name: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

/// `CheckConstraint(expression, name?)` — repeatable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckAnnotation {
    pub expression: String,
    pub name: Option<String>,
}

/// `DefaultValue(value, is_raw_sql?)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAnnotation {
    pub value: String,
    pub is_raw_sql: bool,
}

/// One property on a descriptor, with its value family and the annotations
/// attached to it. `Computed` / `Write(false)` are represented as the
/// `is_computed` / `is_writable` flags rather than annotation structs, since
/// they carry no data beyond presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub value_family: ValueFamily,
    /// Whether the property's value type admits absence (maps to nullable
    /// unless overridden by an explicit `ColumnAnnotation::is_nullable`).
    pub is_optional: bool,
    pub is_writable: bool,
    pub is_computed: bool,
    pub column: Option<ColumnAnnotation>,
    pub key: Option<KeyAnnotation>,
    pub indexes: Vec<IndexAnnotation>,
    pub uniques: Vec<UniqueAnnotation>,
    pub foreign_key: Option<ForeignKeyAnnotation>,
    pub checks: Vec<CheckAnnotation>,
    pub default: Option<DefaultAnnotation>,
}

impl PropertyDescriptor {
    /// A minimal, all-defaults property descriptor — convenient for tests
    /// and for hosts that only need to set a couple of fields.
    pub fn new(name: impl Into<String>, value_family: ValueFamily) -> Self {
        Self {
            name: name.into(),
            value_family,
            is_optional: false,
            is_writable: true,
            is_computed: false,
            column: None,
            key: None,
            indexes: Vec::new(),
            uniques: Vec::new(),
            foreign_key: None,
            checks: Vec::new(),
            default: None,
        }
    }
}

/// One annotated record descriptor — the Model Analyzer's unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Unqualified type identifier, used as the default table name.
    pub type_identifier: String,
    pub is_abstract: bool,
    pub table: Option<TableAnnotation>,
    pub properties: Vec<PropertyDescriptor>,
}

impl Descriptor {
    pub fn new(type_identifier: impl Into<String>) -> Self {
        Self {
            type_identifier: type_identifier.into(),
            is_abstract: false,
            table: None,
            properties: Vec::new(),
        }
    }
}
