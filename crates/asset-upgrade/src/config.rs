//! Driver configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file)
//! is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::version::Version;

/// Package name whose `SerializedVersion` entry is read and stamped
pub const DEFAULT_PACKAGE: &str = "Xenko";

/// Settings for a batch migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    /// Key under `SerializedVersion` holding the recorded version
    pub package: String,

    /// Version to migrate to; the catalog's latest when unset
    pub target_version: Option<Version>,

    /// Treat any unmigrated entry as a failure for that file
    pub strict: bool,

    /// `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,

    /// Migrate in memory without writing files back
    pub dry_run: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            target_version: None,
            strict: false,
            log_filter: "info".to_string(),
            dry_run: false,
        }
    }
}

impl MigrationConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on invalid TOML or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(MigrationConfig::from_toml_str("").unwrap(), MigrationConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let config = MigrationConfig::from_toml_str(
            r#"
            package = "Stride"
            target_version = "3.0.0.0"
            strict = true
            log_filter = "asset_upgrade=debug"
            dry_run = true
            "#,
        )
        .unwrap();

        assert_eq!(config.package, "Stride");
        assert_eq!(config.target_version, Some(Version::new(3, 0, 0)));
        assert!(config.strict);
        assert_eq!(config.log_filter, "asset_upgrade=debug");
        assert!(config.dry_run);
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(matches!(
            MigrationConfig::from_toml_str("strictt = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn bad_version_rejected() {
        assert!(MigrationConfig::from_toml_str(r#"target_version = "three""#).is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strict = true").unwrap();

        let config = MigrationConfig::load(file.path()).unwrap();
        assert!(config.strict);
        assert_eq!(config.package, DEFAULT_PACKAGE);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = MigrationConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
