//! Configuration file parsing
//!
//! Reads bowtie.toml configuration files. Carries the knobs the
//! Synchronizer accepts as options: target dialect, default schema, and
//! the dry-run/force/batching toggles.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::dialect::{Dialect, ParseDialectError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("unknown dialect in configuration: {0}")]
    Dialect(#[from] ParseDialectError),
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Target dialect name, parsed via [`Dialect`]'s `FromStr`
    /// (accepts aliases like "postgres"/"mssql").
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Default schema applied to tables that don't declare one. Empty
    /// string on dialects without schema support (MySql, Sqlite).
    #[serde(default)]
    pub default_schema: String,

    /// Generate the migration script against an empty current schema and
    /// skip introspection, the risk gate, and execution entirely.
    #[serde(default)]
    pub dry_run: bool,

    /// Proceed past the data-loss risk gate even when warnings are High
    /// or Medium severity. Does not disable the warnings themselves.
    #[serde(default)]
    pub force: bool,

    /// Emit a `GO` batch separator between generated statements.
    /// SqlServer-only; ignored on every other dialect.
    #[serde(default)]
    pub emit_go_batches: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            default_schema: String::new(),
            dry_run: false,
            force: false,
            emit_go_batches: false,
        }
    }
}

fn default_dialect() -> String {
    "postgresql".to_string()
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the `dialect` field, failing on anything [`Dialect`]'s
    /// `FromStr` doesn't recognize.
    pub fn dialect(&self) -> Result<Dialect, ConfigError> {
        Ok(self.dialect.parse()?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let dialect = self.dialect()?;
        if !self.default_schema.is_empty() {
            let caps = crate::capability::capabilities(dialect);
            if !caps.supports_schemas {
                return Err(ConfigError::Validation(format!(
                    "default_schema is set but dialect '{}' does not support schemas",
                    self.dialect
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_validate(toml_str: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dialect().unwrap(), Dialect::PostgreSql);
    }

    #[test]
    fn accepts_dialect_aliases() {
        let config = parse_and_validate("dialect = \"mssql\"").unwrap();
        assert_eq!(config.dialect().unwrap(), Dialect::SqlServer);
    }

    #[test]
    fn rejects_unknown_dialect() {
        let err = parse_and_validate("dialect = \"oracle\"").unwrap_err();
        assert!(matches!(err, ConfigError::Dialect(_)));
    }

    #[test]
    fn rejects_schema_on_dialect_without_schema_support() {
        let toml = "dialect = \"mysql\"\ndefault_schema = \"app\"";
        let err = parse_and_validate(toml).unwrap_err();
        assert!(err.to_string().contains("does not support schemas"));
    }

    #[test]
    fn empty_default_schema_is_always_valid() {
        let toml = "dialect = \"sqlite\"\ndefault_schema = \"\"";
        assert!(parse_and_validate(toml).is_ok());
    }

    #[test]
    fn dry_run_and_force_default_to_false() {
        let config = Config::default();
        assert!(!config.dry_run);
        assert!(!config.force);
        assert!(!config.emit_go_batches);
    }
}
