//! Entity hierarchy document shape
//!
//! Rules reach entities through `Hierarchy.Parts[*].Entity` and components
//! through `Entity.Components`. [`EntityWalker`] performs that navigation and
//! owns the fault-isolation policy: a closure failing on one entity or one
//! component is reported as a diagnostic and the walk moves on.

use asset_tree::{Node, NodePath, TreeError};

use crate::context::{Diagnostic, MigrationContext};
use crate::error::VersionError;
use crate::version::Version;

pub const HIERARCHY_KEY: &str = "Hierarchy";
pub const PARTS_KEY: &str = "Parts";
pub const ENTITY_KEY: &str = "Entity";
pub const COMPONENTS_KEY: &str = "Components";
pub const SERIALIZED_VERSION_KEY: &str = "SerializedVersion";

/// Identity and location of the entity being visited
#[derive(Debug, Clone)]
pub struct EntityScope {
    identity: String,
    path: NodePath,
}

impl EntityScope {
    /// `Id`, else `Name`, else the entity's path
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }
}

/// Fault-isolating traversal of entities and components for one rule
#[derive(Debug, Clone, Copy)]
pub struct EntityWalker<'c> {
    ctx: &'c MigrationContext,
    rule: &'static str,
}

impl<'c> EntityWalker<'c> {
    #[inline]
    #[must_use]
    pub fn new(ctx: &'c MigrationContext, rule: &'static str) -> Self {
        Self { ctx, rule }
    }

    /// Visit every entity of the document
    ///
    /// A document without `Hierarchy.Parts`, or a part without an `Entity`,
    /// has nothing to migrate. A `Parts` node that is not a sequence is
    /// reported once and the walk ends.
    pub fn entities<F>(&self, root: &mut Node, mut visit: F)
    where
        F: FnMut(&mut Node, &EntityScope) -> Result<(), TreeError>,
    {
        let parts_path = NodePath::root().child(HIERARCHY_KEY).child(PARTS_KEY);
        let Some(parts) = root
            .get_mut(HIERARCHY_KEY)
            .and_then(|hierarchy| hierarchy.get_mut(PARTS_KEY))
        else {
            tracing::debug!(rule = self.rule, "document has no entity hierarchy");
            return;
        };

        let parts = match parts.as_sequence_mut() {
            Ok(parts) => parts,
            Err(cause) => {
                self.ctx.report(Diagnostic {
                    rule: self.rule,
                    entity: "<document>".to_string(),
                    component_key: None,
                    component_tag: None,
                    path: parts_path,
                    cause,
                });
                return;
            }
        };

        for (index, design) in parts.iter_mut().enumerate() {
            let Some(entity) = design.get_mut(ENTITY_KEY) else {
                continue;
            };
            let path = parts_path.index(index).child(ENTITY_KEY);
            let scope = EntityScope {
                identity: entity_identity(entity, &path),
                path,
            };
            if let Err(cause) = visit(entity, &scope) {
                self.ctx.report(Diagnostic {
                    rule: self.rule,
                    entity: scope.identity.clone(),
                    component_key: None,
                    component_tag: None,
                    path: scope.path.clone(),
                    cause,
                });
            }
        }
    }

    /// Visit every component of one entity
    ///
    /// Absent `Components` is a no-op.
    ///
    /// # Errors
    /// Returns [`TreeError::TypeMismatch`] if `Components` is not a mapping;
    /// per-component failures are reported, not returned.
    pub fn components<F>(&self, entity: &mut Node, scope: &EntityScope, mut visit: F) -> Result<(), TreeError>
    where
        F: FnMut(&str, &mut Node) -> Result<(), TreeError>,
    {
        let Some(components) = entity.get_mut(COMPONENTS_KEY) else {
            return Ok(());
        };

        for (key, component) in components.as_mapping_mut()?.iter_mut() {
            let tag = component.tag().map(str::to_string);
            if let Err(cause) = visit(key, component) {
                self.ctx.report(Diagnostic {
                    rule: self.rule,
                    entity: scope.identity.clone(),
                    component_key: Some(key.to_string()),
                    component_tag: tag,
                    path: scope.path.child(COMPONENTS_KEY).child(key),
                    cause,
                });
            }
        }
        Ok(())
    }
}

fn entity_identity(entity: &Node, path: &NodePath) -> String {
    ["Id", "Name"]
        .iter()
        .find_map(|key| entity.get(key).and_then(|n| n.as_scalar_text().ok()))
        .map_or_else(|| path.to_string(), str::to_string)
}

/// Version recorded under `SerializedVersion.<package>`
///
/// # Errors
/// Returns [`VersionError`] if the entry exists but does not parse
pub fn read_serialized_version(root: &Node, package: &str) -> Result<Option<Version>, VersionError> {
    let Some(entry) = root
        .get(SERIALIZED_VERSION_KEY)
        .and_then(|versions| versions.get(package))
    else {
        return Ok(None);
    };
    let text = entry
        .as_scalar_text()
        .map_err(|_| VersionError::Invalid(format!("<{}>", entry.kind_name())))?;
    text.parse().map(Some)
}

/// Stamp `SerializedVersion.<package>` after a successful migration
///
/// Creates the `SerializedVersion` mapping if needed. Other packages'
/// entries are left untouched.
///
/// # Errors
/// Returns [`TreeError`] if the root or an existing `SerializedVersion`
/// node is not a mapping
pub fn stamp_serialized_version(root: &mut Node, package: &str, version: Version) -> Result<(), TreeError> {
    if !root.has_key(SERIALIZED_VERSION_KEY) {
        root.set(SERIALIZED_VERSION_KEY, Node::mapping())?;
    }
    let versions = root
        .get_mut(SERIALIZED_VERSION_KEY)
        .ok_or_else(|| TreeError::MissingKey(SERIALIZED_VERSION_KEY.to_string()))?;
    versions.set(package, Node::scalar(version.to_string()))?;
    Ok(())
}
