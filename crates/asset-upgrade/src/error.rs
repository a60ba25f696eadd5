//! Error types for the upgrade pipeline
//!
//! Only catalog mistakes and unusable version pairs are errors. Per-entry
//! failures inside a rule are reported as [`crate::Diagnostic`]s and never
//! reach these types.

use std::path::PathBuf;

use asset_tree::{TreeError, YamlError};

use crate::version::Version;

/// Migration cannot proceed; the asset must not be loaded as if upgraded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalMigrationError {
    /// No registered rule covers part of the requested range
    #[error("no upgrade rule covers {from} -> {to}")]
    ChainGap { from: Version, to: Version },

    /// Recorded version is newer than the target
    #[error("cannot downgrade asset from {recorded} to {target}")]
    Downgrade { recorded: Version, target: Version },

    /// Target lands strictly inside a rule's interval
    #[error("target {target} falls inside rule '{rule}' ({from} -> {to})")]
    TargetMisaligned {
        target: Version,
        rule: &'static str,
        from: Version,
        to: Version,
    },
}

/// Rule catalog registration mistakes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Rule interval is empty or reversed
    #[error("rule '{rule}' has an empty interval {from} -> {to}")]
    EmptyInterval {
        rule: &'static str,
        from: Version,
        to: Version,
    },

    /// Rule registered before an earlier-starting rule
    #[error("rule '{rule}' is registered after '{previous}' but starts earlier")]
    OutOfOrder {
        rule: &'static str,
        previous: &'static str,
    },

    /// Rule interval overlaps its predecessor
    #[error("rule '{rule}' overlaps '{previous}'")]
    Overlap {
        rule: &'static str,
        previous: &'static str,
    },

    /// Two rules share a name
    #[error("duplicate rule name: {0}")]
    DuplicateName(&'static str),
}

/// Unparsable version text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version '{0}'")]
    Invalid(String),
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors migrating one asset file
#[derive(Debug, thiserror::Error)]
pub enum AssetFileError {
    /// Read or write failure
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML could not be parsed or emitted
    #[error("yaml error: {0}")]
    Yaml(#[from] YamlError),

    /// Recorded version missing from the document
    #[error("no SerializedVersion entry for package '{0}'")]
    MissingVersion(String),

    /// Recorded version unparsable
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Version stamping failed on a malformed root
    #[error("cannot stamp version: {0}")]
    Stamp(#[from] TreeError),

    /// Chain could not be resolved
    #[error(transparent)]
    Fatal(#[from] FatalMigrationError),

    /// Strict mode rejected a partially migrated asset
    #[error("{count} entries left unmigrated (strict mode)")]
    Strict { count: usize },
}

impl AssetFileError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
