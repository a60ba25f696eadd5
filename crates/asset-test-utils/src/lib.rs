//! Testing utilities for the asset upgrade workspace
//!
//! Document builders shaped like saved entity hierarchy assets, plus
//! accessors for asserting on migrated trees.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use asset_tree::{Node, OverrideState};
use asset_upgrade::{
    CollectingSink, MigrationContext, Version, COMPONENTS_KEY, ENTITY_KEY, HIERARCHY_KEY, PARTS_KEY,
    SERIALIZED_VERSION_KEY,
};

/// Version the oldest built-in rule starts from
pub const LEGACY_VERSION: Version = Version::with_revision(2, 1, 0, 1);

/// Version between the two built-in rules
pub const RENDER_GROUP_VERSION: Version = Version::new(3, 0, 0);

/// Version after every built-in rule
pub const CURRENT_VERSION: Version = Version::new(3, 1, 0);

/// Empty component carrying `tag`
pub fn component(tag: &str) -> Node {
    Node::mapping().with_tag(tag)
}

/// Character component with a scalar gravity
pub fn character_component(gravity: &str) -> Node {
    component("!CharacterComponent")
        .with_entry("StepHeight", Node::scalar("0.1"))
        .with_entry("Gravity", Node::scalar(gravity))
        .with_entry("MaxSlope", Node::scalar("45"))
}

/// Entity builder
#[derive(Debug, Clone)]
pub struct EntityBuilder {
    node: Node,
    components: Option<Node>,
}

impl EntityBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            node: Node::mapping()
                .with_entry("Id", Node::scalar(id))
                .with_entry("Name", Node::scalar(format!("Entity {id}"))),
            components: None,
        }
    }

    /// Legacy entity-level render group
    #[must_use]
    pub fn group(mut self, value: &str) -> Self {
        self.node.set("Group", Node::scalar(value)).unwrap();
        self
    }

    /// Legacy entity-level render group with an override annotation
    #[must_use]
    pub fn overridden_group(mut self, value: &str, state: OverrideState) -> Self {
        self = self.group(value);
        self.node.set_override("Group", state).unwrap();
        self
    }

    #[must_use]
    pub fn component(mut self, key: &str, component: Node) -> Self {
        self.components
            .get_or_insert_with(Node::mapping)
            .set(key, component)
            .unwrap();
        self
    }

    /// Arbitrary node in place of the `Components` mapping
    #[must_use]
    pub fn raw_components(mut self, components: Node) -> Self {
        self.components = Some(components);
        self
    }

    pub fn build(self) -> Node {
        match self.components {
            Some(components) => self.node.with_entry(COMPONENTS_KEY, components),
            None => self.node,
        }
    }
}

pub fn entity(id: &str) -> EntityBuilder {
    EntityBuilder::new(id)
}

/// Scene-shaped document holding `entities`, stamped with `version`
pub fn hierarchy_document(entities: Vec<Node>, version: Version) -> Node {
    let parts = entities
        .into_iter()
        .map(|entity| Node::mapping().with_entry(ENTITY_KEY, entity))
        .collect();
    Node::mapping()
        .with_tag("!SceneAsset")
        .with_entry("Id", Node::scalar("00000000-0000-0000-0000-000000000001"))
        .with_entry(
            SERIALIZED_VERSION_KEY,
            Node::mapping().with_entry("Xenko", Node::scalar(version.to_string())),
        )
        .with_entry(
            HIERARCHY_KEY,
            Node::mapping()
                .with_entry("RootParts", Node::sequence(Vec::new()))
                .with_entry(PARTS_KEY, Node::sequence(parts)),
        )
}

/// Entity at position `index` of `Hierarchy.Parts`
pub fn entity_at(root: &Node, index: usize) -> &Node {
    let parts = root
        .get(HIERARCHY_KEY)
        .and_then(|h| h.get(PARTS_KEY))
        .expect("document has Hierarchy.Parts");
    parts.as_sequence().expect("Parts is a sequence")[index]
        .get(ENTITY_KEY)
        .expect("part has an Entity")
}

/// Component `key` of `entity`
pub fn component_of<'a>(entity: &'a Node, key: &str) -> &'a Node {
    entity
        .get(COMPONENTS_KEY)
        .and_then(|components| components.get(key))
        .unwrap_or_else(|| panic!("component {key} present"))
}

/// Scalar text of `node[key]`
pub fn scalar_at<'a>(node: &'a Node, key: &str) -> &'a str {
    node.get(key)
        .and_then(|value| value.as_scalar_text().ok())
        .unwrap_or_else(|| panic!("scalar at {key}"))
}

/// Context with a collecting sink attached
pub fn test_context(recorded: Version, target: Version) -> (MigrationContext, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let ctx = MigrationContext::new("Test.xkscene", recorded, target).with_sink(sink.clone());
    (ctx, sink)
}
