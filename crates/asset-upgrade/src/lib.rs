//! Asset Upgrade Pipeline
//!
//! Versioned, in-place rewrites of entity hierarchy documents saved by older
//! schema versions.
//!
//! # Core Concepts
//!
//! - [`UpgradeRule`]: One schema transition for a version interval `[from, to)`
//! - [`RuleKind`]: Closed set of rule shapes ([`FieldRelocation`],
//!   [`ScalarToStructured`])
//! - [`UpgradeCatalog`]: Validated, ordered rule list
//! - [`UpgradeChainResolver`]: Picks the rules between two versions and runs
//!   them, refusing chains with gaps
//! - [`MigrationContext`]: Per-pass information and the diagnostics channel
//!
//! Per-entry failures never abort a migration. They are logged, counted and
//! forwarded to a [`DiagnosticSink`]; the rest of the document still migrates.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use asset_tree::yaml;
//! use asset_upgrade::{migrate, CollectingSink, MigrationContext, MigrationOutcome, Version};
//!
//! let mut root = yaml::parse_document(
//!     "Hierarchy:\n  Parts:\n    - Entity:\n        Id: e1\n        Group: Group2\n        Components:\n          m: !ModelComponent {}\n",
//! )
//! .unwrap();
//!
//! let sink = Arc::new(CollectingSink::new());
//! let ctx = MigrationContext::new("Scene.xkscene", Version::with_revision(2, 1, 0, 1), Version::new(3, 1, 0))
//!     .with_sink(sink.clone());
//!
//! let outcome = migrate(&mut root, &ctx).unwrap();
//! assert!(matches!(outcome, MigrationOutcome::Upgraded { diagnostics: 0, .. }));
//! assert!(sink.is_empty());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod batch;
mod catalog;
mod config;
mod context;
mod document;
mod error;
mod resolver;
mod rule;
mod version;

pub use batch::{migrate_file, migrate_files, FileReport};
pub use catalog::{is_well_formed, UpgradeCatalog, ENTITY_HIERARCHY_RULES, RENDER_GROUP_COMPONENTS};
pub use config::{MigrationConfig, DEFAULT_PACKAGE};
pub use context::{CollectingSink, Diagnostic, DiagnosticSink, MigrationContext};
pub use document::{
    read_serialized_version, stamp_serialized_version, EntityScope, EntityWalker, COMPONENTS_KEY, ENTITY_KEY,
    HIERARCHY_KEY, PARTS_KEY, SERIALIZED_VERSION_KEY,
};
pub use error::{AssetFileError, CatalogError, ConfigError, FatalMigrationError, VersionError};
pub use resolver::{migrate, MigrationOutcome, UpgradeChainResolver, UpgradePlan};
pub use rule::{FieldRelocation, RuleKind, ScalarToStructured, UpgradeRule};
pub use version::Version;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        migrate, CollectingSink, Diagnostic, DiagnosticSink, FatalMigrationError, MigrationContext, MigrationOutcome,
        UpgradeCatalog, UpgradeChainResolver, UpgradeRule, Version,
    };
}
