//! Rule catalog
//!
//! Rules are registered explicitly, in the order the schema changes
//! happened. A catalog is validated when it is built: every interval is
//! non-empty, intervals are sorted and disjoint, and names are unique. The
//! built-in entity hierarchy catalog is additionally checked at compile time.
//!
//! Gaps between intervals are allowed here; they only become an error when a
//! migration has to cross one.

use std::collections::HashSet;

use crate::error::CatalogError;
use crate::rule::{FieldRelocation, RuleKind, ScalarToStructured, UpgradeRule};
use crate::version::Version;

/// Component kinds that host a render group
pub const RENDER_GROUP_COMPONENTS: &[&str] = &[
    "!ModelComponent",
    "!SpriteComponent",
    "!UIComponent",
    "!BackgroundComponent",
    "!SkyboxComponent",
    "!ParticleSystemComponent",
    "!SpriteStudioComponent",
];

/// Entity hierarchy schema history
pub const ENTITY_HIERARCHY_RULES: &[UpgradeRule] = &[
    UpgradeRule::new(
        "MoveRenderGroupInsideComponent",
        "Moves Group from Entity to RenderGroup on the components that support it",
        Version::with_revision(2, 1, 0, 1),
        Version::new(3, 0, 0),
        RuleKind::RelocateField(FieldRelocation {
            source_key: "Group",
            target_key: "RenderGroup",
            accepting_tags: RENDER_GROUP_COMPONENTS,
        }),
    ),
    UpgradeRule::new(
        "CharacterComponentGravityVector3",
        "Turns CharacterComponent.Gravity from a float into a Vector3",
        Version::new(3, 0, 0),
        Version::new(3, 1, 0),
        RuleKind::ScalarToStructured(ScalarToStructured {
            component_tag: "!CharacterComponent",
            field: "Gravity",
            slots: &["X", "Y", "Z"],
            value_slot: "Y",
            default_literal: "0.0",
        }),
    ),
];

const _: () = assert!(
    is_well_formed(ENTITY_HIERARCHY_RULES),
    "entity hierarchy rules must be sorted, disjoint, non-empty and uniquely named"
);

/// Compile-time form of [`UpgradeCatalog::new`]'s checks
#[must_use]
pub const fn is_well_formed(rules: &[UpgradeRule]) -> bool {
    let mut i = 0;
    while i < rules.len() {
        let rule = &rules[i];
        if !rule.from().precedes(&rule.to()) {
            return false;
        }
        if i > 0 && rule.from().precedes(&rules[i - 1].to()) {
            return false;
        }
        let mut j = 0;
        while j < i {
            if str_eq(rules[j].name(), rule.name()) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Validated, ordered list of upgrade rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeCatalog {
    rules: Vec<UpgradeRule>,
}

impl UpgradeCatalog {
    /// Build a catalog from rules in registration order
    ///
    /// # Errors
    /// Returns [`CatalogError`] on an empty interval, a rule that starts
    /// before its predecessor, overlapping intervals, or a duplicate name
    pub fn new(rules: Vec<UpgradeRule>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        for (i, rule) in rules.iter().enumerate() {
            if rule.from() >= rule.to() {
                return Err(CatalogError::EmptyInterval {
                    rule: rule.name(),
                    from: rule.from(),
                    to: rule.to(),
                });
            }
            if !names.insert(rule.name()) {
                return Err(CatalogError::DuplicateName(rule.name()));
            }
            if let Some(previous) = i.checked_sub(1).map(|p| &rules[p]) {
                if rule.from() < previous.from() {
                    return Err(CatalogError::OutOfOrder {
                        rule: rule.name(),
                        previous: previous.name(),
                    });
                }
                if rule.from() < previous.to() {
                    return Err(CatalogError::Overlap {
                        rule: rule.name(),
                        previous: previous.name(),
                    });
                }
            }
        }
        Ok(Self { rules })
    }

    /// Built-in entity hierarchy catalog
    #[must_use]
    pub fn entity_hierarchy() -> Self {
        Self {
            rules: ENTITY_HIERARCHY_RULES.to_vec(),
        }
    }

    /// Rules in ascending interval order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[UpgradeRule] {
        &self.rules
    }

    /// Look up a rule by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UpgradeRule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    /// Version documents have after the last rule
    #[inline]
    #[must_use]
    pub fn latest_version(&self) -> Option<Version> {
        self.rules.last().map(UpgradeRule::to)
    }

    /// Oldest version the catalog can upgrade from
    #[inline]
    #[must_use]
    pub fn earliest_version(&self) -> Option<Version> {
        self.rules.first().map(UpgradeRule::from)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for UpgradeCatalog {
    fn default() -> Self {
        Self::entity_hierarchy()
    }
}
