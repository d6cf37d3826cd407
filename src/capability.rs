//! Provider capability matrix
//!
//! Pure data, no behavior — one entry per dialect describing identifier
//! quoting, parameter placeholder style, schema support, and the set of
//! index kinds that dialect accepts.

use crate::dialect::Dialect;
use crate::model::IndexKind;

#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub quote_open: char,
    pub quote_close: char,
    pub param_prefix: char,
    pub supports_schemas: bool,
    pub default_schema: &'static str,
    pub supported_index_kinds: &'static [IndexKind],
}

const SQLSERVER_INDEX_KINDS: &[IndexKind] = &[
    IndexKind::BTree,
    IndexKind::Clustered,
    IndexKind::NonClustered,
    IndexKind::ColumnStore,
    IndexKind::Spatial,
    IndexKind::FullText,
];

const POSTGRESQL_INDEX_KINDS: &[IndexKind] = &[
    IndexKind::BTree,
    IndexKind::Hash,
    IndexKind::GIN,
    IndexKind::GiST,
    IndexKind::BRIN,
    IndexKind::SPGiST,
    IndexKind::Spatial,
];

const MYSQL_INDEX_KINDS: &[IndexKind] = &[
    IndexKind::BTree,
    IndexKind::Hash,
    IndexKind::Spatial,
    IndexKind::FullText,
];

const SQLITE_INDEX_KINDS: &[IndexKind] = &[IndexKind::BTree];

/// Look up the capability matrix entry for a dialect.
pub fn capabilities(dialect: Dialect) -> Capabilities {
    match dialect {
        Dialect::SqlServer => Capabilities {
            quote_open: '[',
            quote_close: ']',
            param_prefix: '@',
            supports_schemas: true,
            default_schema: "dbo",
            supported_index_kinds: SQLSERVER_INDEX_KINDS,
        },
        Dialect::PostgreSql => Capabilities {
            quote_open: '"',
            quote_close: '"',
            param_prefix: '@',
            supports_schemas: true,
            default_schema: "public",
            supported_index_kinds: POSTGRESQL_INDEX_KINDS,
        },
        Dialect::MySql => Capabilities {
            quote_open: '`',
            quote_close: '`',
            param_prefix: '@',
            supports_schemas: false,
            default_schema: "",
            supported_index_kinds: MYSQL_INDEX_KINDS,
        },
        Dialect::Sqlite => Capabilities {
            quote_open: '[',
            quote_close: ']',
            param_prefix: '@',
            supports_schemas: false,
            default_schema: "",
            supported_index_kinds: SQLITE_INDEX_KINDS,
        },
    }
}

/// Agrees with the capability matrix for every (dialect, kind) pair.
pub fn validate_index_kind(dialect: Dialect, kind: IndexKind) -> bool {
    capabilities(dialect).supported_index_kinds.contains(&kind)
}

/// Quote an identifier using the dialect's quote characters.
pub fn quote_identifier(dialect: Dialect, identifier: &str) -> String {
    let caps = capabilities(dialect);
    format!("{}{}{}", caps.quote_open, identifier, caps.quote_close)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn btree_always_supported() {
        for d in Dialect::all() {
            assert!(validate_index_kind(d, IndexKind::BTree), "{d} should support BTree");
        }
    }

    #[test]
    fn spatial_supported_everywhere_except_sqlite() {
        for d in Dialect::all() {
            let expect = d != Dialect::Sqlite;
            assert_eq!(validate_index_kind(d, IndexKind::Spatial), expect, "{d}");
        }
    }

    #[test]
    fn gin_only_on_postgresql() {
        assert!(validate_index_kind(Dialect::PostgreSql, IndexKind::GIN));
        assert!(!validate_index_kind(Dialect::SqlServer, IndexKind::GIN));
        assert!(!validate_index_kind(Dialect::MySql, IndexKind::GIN));
        assert!(!validate_index_kind(Dialect::Sqlite, IndexKind::GIN));
    }

    #[test]
    fn sqlite_only_supports_btree() {
        for kind in [
            IndexKind::Hash,
            IndexKind::GIN,
            IndexKind::GiST,
            IndexKind::BRIN,
            IndexKind::SPGiST,
            IndexKind::Clustered,
            IndexKind::NonClustered,
            IndexKind::ColumnStore,
            IndexKind::FullText,
        ] {
            assert!(!validate_index_kind(Dialect::Sqlite, kind));
        }
    }

    #[test]
    fn quote_identifier_uses_dialect_quote_chars() {
        assert_eq!(quote_identifier(Dialect::PostgreSql, "orders"), "\"orders\"");
        assert_eq!(quote_identifier(Dialect::MySql, "orders"), "`orders`");
        assert_eq!(quote_identifier(Dialect::SqlServer, "orders"), "[orders]");
        assert_eq!(quote_identifier(Dialect::Sqlite, "orders"), "[orders]");
    }
}
