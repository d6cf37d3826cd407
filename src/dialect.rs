//! The supported target dialects
//!
//! A single sum type keys the lookup tables for the capability matrix, the
//! DDL Generator family, and the Schema Introspector family — replacing the
//! service-locator/per-dialect-instance-registration pattern flagged in
//! a per-dialect trait-object registry with one `match` per concern.

use std::fmt;
use std::str::FromStr;
use strum_macros::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Dialect {
    SqlServer,
    PostgreSql,
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn all() -> impl Iterator<Item = Dialect> {
        use strum::IntoEnumIterator;
        Dialect::iter()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dialect::SqlServer => "sqlserver",
            Dialect::PostgreSql => "postgresql",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown dialect '{0}'")]
pub struct ParseDialectError(String);

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" | "sql_server" => Ok(Dialect::SqlServer),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::PostgreSql),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(ParseDialectError(other.to_string())),
        }
    }
}
