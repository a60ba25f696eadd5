//! Upgrade rules
//!
//! A rule is one schema transition, registered for a version interval
//! `[from, to)`. The set of rule shapes is closed: [`RuleKind`] lists every
//! kind of rewrite the pipeline knows how to perform, and each catalog entry
//! is a value of one of them.

use asset_tree::{Mapping, Node, OverrideTracker};

use crate::context::MigrationContext;
use crate::document::EntityWalker;
use crate::version::Version;

/// Move a field from each entity onto the components that accept it
///
/// The entity's value and its override annotation are copied to every
/// component whose tag is in `accepting_tags` (more than one component may
/// receive it). The field is removed from the entity even when no component
/// accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRelocation {
    /// Field on the entity
    pub source_key: &'static str,
    /// Field written on each accepting component
    pub target_key: &'static str,
    /// Component tags that can host the field
    pub accepting_tags: &'static [&'static str],
}

impl FieldRelocation {
    /// Whether a component with this tag hosts the field
    #[inline]
    #[must_use]
    pub fn accepts(&self, tag: &str) -> bool {
        self.accepting_tags.iter().any(|accepted| *accepted == tag)
    }

    fn apply(&self, root: &mut Node, walker: EntityWalker<'_>) {
        walker.entities(root, |entity, scope| {
            let Some(value) = entity.get(self.source_key).cloned() else {
                return Ok(());
            };
            let captured = OverrideTracker::capture(entity, self.source_key);

            // Source stays on the entity if its components cannot be walked
            walker.components(entity, scope, |_, component| {
                if !component.tag().is_some_and(|tag| self.accepts(tag)) {
                    return Ok(());
                }
                component.set(self.target_key, value.clone())?;
                OverrideTracker::restore(component, self.target_key, captured)
            })?;
            entity.remove(self.source_key);
            Ok(())
        });
    }
}

/// Replace a scalar component field with a structured value
///
/// For components tagged `component_tag`, the scalar under `field` becomes a
/// mapping with one entry per slot: the old text goes into `value_slot`,
/// `default_literal` into the others. The text is carried through, never
/// reinterpreted. A field that already holds every slot is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarToStructured {
    pub component_tag: &'static str,
    pub field: &'static str,
    /// Slot keys in emission order
    pub slots: &'static [&'static str],
    pub value_slot: &'static str,
    pub default_literal: &'static str,
}

impl ScalarToStructured {
    /// Whether `node` already has the structured shape
    #[must_use]
    pub fn is_structured(&self, node: &Node) -> bool {
        node.as_mapping()
            .is_ok_and(|map| self.slots.iter().all(|slot| map.contains_key(slot)))
    }

    /// Build the structured replacement for a scalar's text
    #[must_use]
    pub fn structure(&self, text: &str) -> Node {
        let map: Mapping = self
            .slots
            .iter()
            .map(|slot| {
                let literal = if *slot == self.value_slot {
                    text
                } else {
                    self.default_literal
                };
                (*slot, Node::scalar(literal))
            })
            .collect();
        Node::from(map)
    }

    fn apply(&self, root: &mut Node, walker: EntityWalker<'_>) {
        walker.entities(root, |entity, scope| {
            walker.components(entity, scope, |_, component| {
                if component.tag() != Some(self.component_tag) {
                    return Ok(());
                }
                let Some(old) = component.get(self.field) else {
                    return Ok(());
                };
                if self.is_structured(old) {
                    return Ok(());
                }
                let structured = self.structure(old.as_scalar_text()?);
                component.set(self.field, structured)?;
                Ok(())
            })
        });
    }
}

/// Closed set of rule shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    RelocateField(FieldRelocation),
    ScalarToStructured(ScalarToStructured),
}

/// One schema transition, eligible for documents in `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeRule {
    name: &'static str,
    description: &'static str,
    from: Version,
    to: Version,
    kind: RuleKind,
}

impl UpgradeRule {
    /// Create rule
    #[inline]
    #[must_use]
    pub const fn new(
        name: &'static str,
        description: &'static str,
        from: Version,
        to: Version,
        kind: RuleKind,
    ) -> Self {
        Self {
            name,
            description,
            from,
            to,
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// First version whose documents need this rule
    #[inline]
    #[must_use]
    pub const fn from(&self) -> Version {
        self.from
    }

    /// Version documents have after this rule
    #[inline]
    #[must_use]
    pub const fn to(&self) -> Version {
        self.to
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Whether a document at `version` is within this rule's interval
    #[inline]
    #[must_use]
    pub fn covers(&self, version: Version) -> bool {
        self.from <= version && version < self.to
    }

    /// Rewrite the document in place
    ///
    /// Never fails as a whole: entries that cannot be migrated are reported
    /// through the context and left as they were.
    pub fn apply(&self, root: &mut Node, ctx: &MigrationContext) {
        let walker = EntityWalker::new(ctx, self.name);
        match &self.kind {
            RuleKind::RelocateField(rule) => rule.apply(root, walker),
            RuleKind::ScalarToStructured(rule) => rule.apply(root, walker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CollectingSink;
    use crate::document::{COMPONENTS_KEY, ENTITY_KEY, HIERARCHY_KEY, PARTS_KEY};
    use asset_tree::OverrideState;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const RELOCATE: FieldRelocation = FieldRelocation {
        source_key: "Group",
        target_key: "RenderGroup",
        accepting_tags: &["!ModelComponent", "!SpriteComponent"],
    };

    const GRAVITY: ScalarToStructured = ScalarToStructured {
        component_tag: "!CharacterComponent",
        field: "Gravity",
        slots: &["X", "Y", "Z"],
        value_slot: "Y",
        default_literal: "0.0",
    };

    fn rule(kind: RuleKind) -> UpgradeRule {
        UpgradeRule::new("TestRule", "test", Version::new(1, 0, 0), Version::new(2, 0, 0), kind)
    }

    fn document(entity: Node) -> Node {
        Node::mapping().with_entry(
            HIERARCHY_KEY,
            Node::mapping().with_entry(
                PARTS_KEY,
                Node::sequence(vec![Node::mapping().with_entry(ENTITY_KEY, entity)]),
            ),
        )
    }

    fn entity(root: &Node) -> &Node {
        root.get(HIERARCHY_KEY).unwrap().get(PARTS_KEY).unwrap().as_sequence().unwrap()[0]
            .get(ENTITY_KEY)
            .unwrap()
    }

    fn component<'a>(root: &'a Node, key: &str) -> &'a Node {
        entity(root).get(COMPONENTS_KEY).unwrap().get(key).unwrap()
    }

    fn ctx() -> (MigrationContext, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        let ctx = MigrationContext::new("test", Version::new(1, 0, 0), Version::new(2, 0, 0))
            .with_sink(sink.clone());
        (ctx, sink)
    }

    #[test]
    fn relocation_moves_value_and_override() {
        let mut root = document(
            Node::mapping()
                .with_overridden_entry("Group", Node::scalar("42"), OverrideState::New)
                .with_entry(
                    COMPONENTS_KEY,
                    Node::mapping().with_entry("m", Node::mapping().with_tag("!ModelComponent")),
                ),
        );
        let (ctx, sink) = ctx();
        rule(RuleKind::RelocateField(RELOCATE)).apply(&mut root, &ctx);

        let model = component(&root, "m");
        assert_eq!(model.get("RenderGroup"), Some(&Node::scalar("42")));
        assert_eq!(model.get_override("RenderGroup"), Some(OverrideState::New));
        assert_eq!(model.tag(), Some("!ModelComponent"));
        assert!(!entity(&root).has_key("Group"));
        assert!(sink.is_empty());
    }

    #[test]
    fn relocation_without_override_sets_none() {
        let mut root = document(
            Node::mapping().with_entry("Group", Node::scalar("Group1")).with_entry(
                COMPONENTS_KEY,
                Node::mapping().with_entry("s", Node::mapping().with_tag("!SpriteComponent")),
            ),
        );
        let (ctx, _) = ctx();
        rule(RuleKind::RelocateField(RELOCATE)).apply(&mut root, &ctx);

        let sprite = component(&root, "s");
        assert_eq!(sprite.get("RenderGroup"), Some(&Node::scalar("Group1")));
        assert_eq!(sprite.get_override("RenderGroup"), None);
    }

    #[test]
    fn relocation_skips_entity_without_field() {
        let original = document(Node::mapping().with_entry(
            COMPONENTS_KEY,
            Node::mapping().with_entry("m", Node::mapping().with_tag("!ModelComponent")),
        ));
        let mut root = original.clone();
        let (ctx, _) = ctx();
        rule(RuleKind::RelocateField(RELOCATE)).apply(&mut root, &ctx);
        assert_eq!(root, original);
    }

    #[test]
    fn relocation_removes_field_when_entity_has_no_components() {
        let mut root = document(
            Node::mapping()
                .with_entry("Id", Node::scalar("e1"))
                .with_overridden_entry("Group", Node::scalar("Group3"), OverrideState::Sealed),
        );
        let (ctx, sink) = ctx();
        rule(RuleKind::RelocateField(RELOCATE)).apply(&mut root, &ctx);
        assert!(!entity(&root).has_key("Group"));
        assert_eq!(entity(&root).get_override("Group"), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn relocation_keeps_field_when_components_malformed() {
        let original = document(
            Node::mapping()
                .with_entry("Id", Node::scalar("e2"))
                .with_overridden_entry("Group", Node::scalar("Group1"), OverrideState::New)
                .with_entry(COMPONENTS_KEY, Node::sequence(vec![Node::scalar("m")])),
        );
        let mut root = original.clone();
        let (ctx, sink) = ctx();
        rule(RuleKind::RelocateField(RELOCATE)).apply(&mut root, &ctx);

        assert_eq!(root, original);
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].entity, "e2");
        assert_eq!(diagnostics[0].component_key, None);
    }

    #[test]
    fn scalar_becomes_structured() {
        let mut root = document(Node::mapping().with_entry(
            COMPONENTS_KEY,
            Node::mapping().with_entry(
                "c",
                Node::mapping()
                    .with_tag("!CharacterComponent")
                    .with_entry("StepHeight", Node::scalar("0.1"))
                    .with_overridden_entry("Gravity", Node::scalar("9.8"), OverrideState::New)
                    .with_entry("MaxSlope", Node::scalar("45")),
            ),
        ));
        let (ctx, sink) = ctx();
        rule(RuleKind::ScalarToStructured(GRAVITY)).apply(&mut root, &ctx);

        let character = component(&root, "c");
        let gravity = character.get("Gravity").unwrap();
        let slots: Vec<_> = gravity
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_scalar_text().unwrap().to_string()))
            .collect();
        assert_eq!(
            slots,
            vec![
                ("X".to_string(), "0.0".to_string()),
                ("Y".to_string(), "9.8".to_string()),
                ("Z".to_string(), "0.0".to_string()),
            ]
        );
        let keys: Vec<_> = character.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["StepHeight", "Gravity", "MaxSlope"]);
        assert_eq!(character.get_override("Gravity"), Some(OverrideState::New));
        assert!(sink.is_empty());
    }

    #[test]
    fn structured_value_is_not_rewrapped() {
        let migrated = GRAVITY.structure("-10.0");
        let original = document(Node::mapping().with_entry(
            COMPONENTS_KEY,
            Node::mapping().with_entry(
                "c",
                Node::mapping()
                    .with_tag("!CharacterComponent")
                    .with_entry("Gravity", migrated),
            ),
        ));
        let mut root = original.clone();
        let (ctx, sink) = ctx();
        rule(RuleKind::ScalarToStructured(GRAVITY)).apply(&mut root, &ctx);
        assert_eq!(root, original);
        assert!(sink.is_empty());
    }

    #[test]
    fn scalar_rule_skips_component_without_field() {
        let original = document(Node::mapping().with_entry(
            COMPONENTS_KEY,
            Node::mapping().with_entry(
                "c",
                Node::mapping()
                    .with_tag("!CharacterComponent")
                    .with_entry("StepHeight", Node::scalar("0.1")),
            ),
        ));
        let mut root = original.clone();
        let (ctx, sink) = ctx();
        rule(RuleKind::ScalarToStructured(GRAVITY)).apply(&mut root, &ctx);
        assert_eq!(root, original);
        assert!(!component(&root, "c").has_key("Gravity"));
        assert!(sink.is_empty());
    }

    #[test]
    fn unexpected_gravity_shape_is_reported() {
        let mut root = document(Node::mapping().with_entry("Id", Node::scalar("e9")).with_entry(
            COMPONENTS_KEY,
            Node::mapping().with_entry(
                "c",
                Node::mapping()
                    .with_tag("!CharacterComponent")
                    .with_entry("Gravity", Node::sequence(vec![Node::scalar("1")])),
            ),
        ));
        let (ctx, sink) = ctx();
        rule(RuleKind::ScalarToStructured(GRAVITY)).apply(&mut root, &ctx);

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "TestRule");
        assert_eq!(diagnostics[0].entity, "e9");
        assert_eq!(diagnostics[0].component_tag.as_deref(), Some("!CharacterComponent"));
    }

    #[test]
    fn covers_is_half_open() {
        let r = rule(RuleKind::ScalarToStructured(GRAVITY));
        assert!(r.covers(Version::new(1, 0, 0)));
        assert!(r.covers(Version::new(1, 9, 9)));
        assert!(!r.covers(Version::new(2, 0, 0)));
        assert!(!r.covers(Version::new(0, 9, 0)));
    }
}
