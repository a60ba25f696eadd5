//! File-level migration
//!
//! Reads an asset file, resolves and runs its upgrade chain, stamps the new
//! version and writes it back. Files are independent, so a batch runs them on
//! the rayon pool and reports each one separately.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use asset_tree::yaml;
use rayon::prelude::*;

use crate::config::MigrationConfig;
use crate::context::{CollectingSink, Diagnostic, MigrationContext};
use crate::document::{read_serialized_version, stamp_serialized_version};
use crate::error::AssetFileError;
use crate::resolver::{MigrationOutcome, UpgradeChainResolver};
use crate::version::Version;

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub recorded: Version,
    pub target: Version,
    pub outcome: MigrationOutcome,
    /// Entries left unmigrated
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the file on disk was rewritten
    pub written: bool,
}

/// Migrate one asset file in place
///
/// The target is the configured version, else the catalog's latest. The
/// file is only rewritten when at least one rule ran and `dry_run` is off.
///
/// # Errors
/// Returns [`AssetFileError`] if the file cannot be read, parsed or written,
/// carries no usable version, cannot be upgraded, or (in strict mode) had
/// entries left unmigrated
pub fn migrate_file(
    path: &Path,
    resolver: &UpgradeChainResolver,
    config: &MigrationConfig,
) -> Result<FileReport, AssetFileError> {
    let text = std::fs::read_to_string(path).map_err(|e| AssetFileError::io_error(path, e))?;
    let mut root = yaml::parse_document(&text)?;

    let recorded = read_serialized_version(&root, &config.package)?
        .ok_or_else(|| AssetFileError::MissingVersion(config.package.clone()))?;
    let target = config
        .target_version
        .or_else(|| resolver.catalog().latest_version())
        .unwrap_or(recorded);

    let sink = Arc::new(CollectingSink::new());
    let ctx = MigrationContext::new(path.display().to_string(), recorded, target).with_sink(sink.clone());
    let outcome = resolver.migrate(&mut root, &ctx)?;
    let diagnostics = sink.diagnostics();

    if config.strict && !diagnostics.is_empty() {
        return Err(AssetFileError::Strict {
            count: diagnostics.len(),
        });
    }

    let mut written = false;
    if let MigrationOutcome::Upgraded { .. } = outcome {
        stamp_serialized_version(&mut root, &config.package, target)?;
        if config.dry_run {
            tracing::info!(path = %path.display(), "dry run, not writing");
        } else {
            let text = yaml::emit_document(&root)?;
            std::fs::write(path, text).map_err(|e| AssetFileError::io_error(path, e))?;
            written = true;
        }
    }

    Ok(FileReport {
        path: path.to_path_buf(),
        recorded,
        target,
        outcome,
        diagnostics,
        written,
    })
}

/// Migrate many files in parallel
///
/// Results come back in input order; one file failing does not stop the
/// others.
pub fn migrate_files(
    paths: &[PathBuf],
    resolver: &UpgradeChainResolver,
    config: &MigrationConfig,
) -> Vec<(PathBuf, Result<FileReport, AssetFileError>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = migrate_file(path, resolver, config);
            if let Err(e) = &result {
                tracing::error!(path = %path.display(), "migration failed: {}", e);
            }
            (path.clone(), result)
        })
        .collect()
}
