//! Tree nodes and the late-bound accessor over them
//!
//! A [`Node`] is a tagged sum of mapping, sequence and scalar. Nothing in here
//! knows what a valid asset looks like; callers navigate with fallible
//! projections and keyed reads that return `None` when the shape differs.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;

use crate::error::TreeError;
use crate::overrides::OverrideState;

/// Node kind without payload, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKindName {
    Mapping,
    Sequence,
    Scalar,
}

impl Display for NodeKindName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// How a scalar is written back out
///
/// `Quoted` marks text that reads as null, a boolean or a number but was
/// authored as a string, so emission must keep it a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    #[default]
    Plain,
    Quoted,
}

/// Payload of a tree node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Ordered keyed children plus per-key override annotations
    Mapping(Mapping),
    /// Ordered children
    Sequence(Vec<Node>),
    /// Literal text of a primitive value
    Scalar(String),
}

impl NodeKind {
    /// Kind name for diagnostics
    #[inline]
    #[must_use]
    pub fn name(&self) -> NodeKindName {
        match self {
            Self::Mapping(_) => NodeKindName::Mapping,
            Self::Sequence(_) => NodeKindName::Sequence,
            Self::Scalar(_) => NodeKindName::Scalar,
        }
    }
}

/// Document tree node
///
/// The optional tag is the only type information the tree carries; rules
/// recognise component kinds by it (e.g. `!ModelComponent`).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: Option<String>,
    kind: NodeKind,
    style: ScalarStyle,
}

impl Node {
    /// Create an untagged node
    #[inline]
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            tag: None,
            kind,
            style: ScalarStyle::Plain,
        }
    }

    /// Empty untagged mapping
    #[inline]
    #[must_use]
    pub fn mapping() -> Self {
        Self::new(NodeKind::Mapping(Mapping::new()))
    }

    /// Untagged sequence
    #[inline]
    #[must_use]
    pub fn sequence(items: Vec<Node>) -> Self {
        Self::new(NodeKind::Sequence(items))
    }

    /// Untagged scalar
    #[inline]
    #[must_use]
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Scalar(text.into()))
    }

    /// Untagged scalar that is always written as a string
    #[inline]
    #[must_use]
    pub fn quoted_scalar(text: impl Into<String>) -> Self {
        Self {
            style: ScalarStyle::Quoted,
            ..Self::scalar(text)
        }
    }

    /// Builder: attach a tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builder: append an entry (mapping nodes only, ignored otherwise)
    #[inline]
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: Node) -> Self {
        if let NodeKind::Mapping(map) = &mut self.kind {
            map.insert(key, value);
        }
        self
    }

    /// Builder: append an entry carrying an override annotation
    #[inline]
    #[must_use]
    pub fn with_overridden_entry(
        mut self,
        key: impl Into<String>,
        value: Node,
        state: OverrideState,
    ) -> Self {
        if let NodeKind::Mapping(map) = &mut self.kind {
            let key = key.into();
            map.insert(key.clone(), value);
            map.set_override(&key, state);
        }
        self
    }

    /// Type discriminator, if any
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Replace the tag
    ///
    /// Only rules that intentionally retype a node should call this.
    #[inline]
    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
    }

    /// Payload
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Emission style; always `Plain` for collections
    #[inline]
    #[must_use]
    pub fn scalar_style(&self) -> ScalarStyle {
        self.style
    }

    /// Payload kind name
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> NodeKindName {
        self.kind.name()
    }

    #[inline]
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_))
    }

    #[inline]
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::Sequence(_))
    }

    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar(_))
    }

    /// Project to mapping
    ///
    /// # Errors
    /// Returns [`TreeError::TypeMismatch`] if the node is not a mapping
    #[inline]
    pub fn as_mapping(&self) -> Result<&Mapping, TreeError> {
        match &self.kind {
            NodeKind::Mapping(map) => Ok(map),
            other => Err(TreeError::type_mismatch(NodeKindName::Mapping, other.name())),
        }
    }

    /// Project to mutable mapping
    ///
    /// # Errors
    /// Returns [`TreeError::TypeMismatch`] if the node is not a mapping
    #[inline]
    pub fn as_mapping_mut(&mut self) -> Result<&mut Mapping, TreeError> {
        match &mut self.kind {
            NodeKind::Mapping(map) => Ok(map),
            other => Err(TreeError::type_mismatch(NodeKindName::Mapping, other.name())),
        }
    }

    /// Project to sequence
    ///
    /// # Errors
    /// Returns [`TreeError::TypeMismatch`] if the node is not a sequence
    #[inline]
    pub fn as_sequence(&self) -> Result<&[Node], TreeError> {
        match &self.kind {
            NodeKind::Sequence(items) => Ok(items),
            other => Err(TreeError::type_mismatch(NodeKindName::Sequence, other.name())),
        }
    }

    /// Project to mutable sequence
    ///
    /// # Errors
    /// Returns [`TreeError::TypeMismatch`] if the node is not a sequence
    #[inline]
    pub fn as_sequence_mut(&mut self) -> Result<&mut Vec<Node>, TreeError> {
        match &mut self.kind {
            NodeKind::Sequence(items) => Ok(items),
            other => Err(TreeError::type_mismatch(NodeKindName::Sequence, other.name())),
        }
    }

    /// Project to scalar text
    ///
    /// # Errors
    /// Returns [`TreeError::TypeMismatch`] if the node is not a scalar
    #[inline]
    pub fn as_scalar_text(&self) -> Result<&str, TreeError> {
        match &self.kind {
            NodeKind::Scalar(text) => Ok(text),
            other => Err(TreeError::type_mismatch(NodeKindName::Scalar, other.name())),
        }
    }

    /// Child by key; `None` when absent or when this node is not a mapping
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        match &self.kind {
            NodeKind::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Mutable child by key; `None` when absent or not a mapping
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Mapping(map) => map.get_mut(key),
            _ => None,
        }
    }

    /// Check for a key; always `false` on non-mapping nodes
    #[inline]
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a child, keeping its position if the key already exists
    ///
    /// Returns the replaced child. The key's override annotation is untouched.
    ///
    /// # Errors
    /// Returns [`TreeError::NotAMapping`] if this node is not a mapping
    pub fn set(&mut self, key: impl Into<String>, value: Node) -> Result<Option<Node>, TreeError> {
        match &mut self.kind {
            NodeKind::Mapping(map) => Ok(map.insert(key, value)),
            other => Err(TreeError::NotAMapping {
                key: key.into(),
                actual: other.name(),
            }),
        }
    }

    /// Remove a child and its override annotation
    ///
    /// Returns `None` when absent or when this node is not a mapping.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        match &mut self.kind {
            NodeKind::Mapping(map) => map.remove(key),
            _ => None,
        }
    }

    /// Override annotation for a key
    #[inline]
    #[must_use]
    pub fn get_override(&self, key: &str) -> Option<OverrideState> {
        match &self.kind {
            NodeKind::Mapping(map) => map.override_of(key),
            _ => None,
        }
    }

    /// Attach an override annotation to an existing key
    ///
    /// # Errors
    /// - [`TreeError::NotAMapping`] if this node is not a mapping
    /// - [`TreeError::MissingKey`] if the key is absent
    pub fn set_override(&mut self, key: &str, state: OverrideState) -> Result<(), TreeError> {
        let map = match &mut self.kind {
            NodeKind::Mapping(map) => map,
            other => {
                return Err(TreeError::NotAMapping {
                    key: key.to_string(),
                    actual: other.name(),
                })
            }
        };
        if map.set_override(key, state) {
            Ok(())
        } else {
            Err(TreeError::MissingKey(key.to_string()))
        }
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Self::new(NodeKind::Mapping(map))
    }
}

/// Insertion-ordered mapping with per-key override annotations
///
/// Annotations live beside the entries, keyed by the same field key, so a
/// key never carries an annotation after it has been removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<String, Node>,
    overrides: IndexMap<String, OverrideState>,
}

impl Mapping {
    /// Create empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace; an existing key keeps its position
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: Node) -> Option<Node> {
        self.entries.insert(key.into(), value)
    }

    /// Remove an entry and its annotation, preserving the order of the rest
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.overrides.shift_remove(key);
        self.entries.shift_remove(key)
    }

    /// Rename a key in place, carrying its override annotation along
    ///
    /// An existing entry under `to` is replaced. Returns `false` if `from`
    /// is absent.
    pub fn rename_key(&mut self, from: &str, to: impl Into<String>) -> bool {
        let to = to.into();
        if from == to {
            return self.entries.contains_key(from);
        }
        let Some((mut index, _, value)) = self.entries.shift_remove_full(from) else {
            return false;
        };
        let state = self.overrides.shift_remove(from);
        if let Some(existing) = self.entries.get_index_of(&to) {
            if existing < index {
                index -= 1;
            }
            self.remove(&to);
        }
        self.entries.shift_insert(index, to.clone(), value);
        if let Some(state) = state {
            self.overrides.insert(to, state);
        }
        true
    }

    /// Keys in document order
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in document order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable entries in document order
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Override annotation for a key
    #[inline]
    #[must_use]
    pub fn override_of(&self, key: &str) -> Option<OverrideState> {
        self.overrides.get(key).copied()
    }

    /// Annotate an existing key; returns `false` if the key is absent
    #[inline]
    pub fn set_override(&mut self, key: &str, state: OverrideState) -> bool {
        if !self.entries.contains_key(key) {
            return false;
        }
        self.overrides.insert(key.to_string(), state);
        true
    }

    /// Drop an annotation, returning it
    #[inline]
    pub fn clear_override(&mut self, key: &str) -> Option<OverrideState> {
        self.overrides.shift_remove(key)
    }

    /// All annotations
    #[inline]
    pub fn overrides(&self) -> impl Iterator<Item = (&str, OverrideState)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::mapping()
            .with_entry("Id", Node::scalar("e1"))
            .with_overridden_entry("Group", Node::scalar("Group2"), OverrideState::New)
            .with_entry("Name", Node::scalar("Box"))
    }

    #[test]
    fn get_and_has_key() {
        let node = sample();
        assert_eq!(node.get("Name").unwrap().as_scalar_text().unwrap(), "Box");
        assert!(node.has_key("Group"));
        assert!(!node.has_key("Missing"));
    }

    #[test]
    fn get_on_scalar_is_absent() {
        let node = Node::scalar("1");
        assert!(node.get("anything").is_none());
        assert!(!node.has_key("anything"));
    }

    #[test]
    fn projections_fail_with_type_mismatch() {
        let node = Node::scalar("1");
        assert_eq!(
            node.as_sequence(),
            Err(TreeError::type_mismatch(NodeKindName::Sequence, NodeKindName::Scalar))
        );
        assert!(matches!(
            Node::mapping().as_scalar_text(),
            Err(TreeError::TypeMismatch { expected: NodeKindName::Scalar, .. })
        ));
        assert!(Node::sequence(vec![]).as_mapping().is_err());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut node = sample();
        let old = node.set("Group", Node::scalar("Group3")).unwrap();
        assert_eq!(old, Some(Node::scalar("Group2")));
        let keys: Vec<_> = node.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["Id", "Group", "Name"]);
        assert_eq!(node.get_override("Group"), Some(OverrideState::New));
    }

    #[test]
    fn set_appends_new_key() {
        let mut node = sample();
        node.set("Extra", Node::scalar("x")).unwrap();
        let keys: Vec<_> = node.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, vec!["Id", "Group", "Name", "Extra"]);
    }

    #[test]
    fn set_on_sequence_fails() {
        let mut node = Node::sequence(vec![]);
        let err = node.set("k", Node::scalar("v")).unwrap_err();
        assert!(matches!(err, TreeError::NotAMapping { .. }));
    }

    #[test]
    fn remove_preserves_order_and_drops_override() {
        let mut node = sample();
        let removed = node.remove("Group");
        assert_eq!(removed, Some(Node::scalar("Group2")));
        let map = node.as_mapping().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Id", "Name"]);
        assert_eq!(map.overrides().count(), 0);
        assert_eq!(node.get_override("Group"), None);
    }

    #[test]
    fn set_override_requires_key() {
        let mut node = sample();
        assert_eq!(
            node.set_override("Missing", OverrideState::Sealed),
            Err(TreeError::MissingKey("Missing".to_string()))
        );
        node.set_override("Name", OverrideState::Sealed).unwrap();
        assert_eq!(node.get_override("Name"), Some(OverrideState::Sealed));
    }

    #[test]
    fn rename_key_keeps_position_and_override() {
        let mut map = sample().as_mapping().unwrap().clone();
        assert!(map.rename_key("Group", "RenderGroup"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Id", "RenderGroup", "Name"]);
        assert_eq!(map.override_of("RenderGroup"), Some(OverrideState::New));
        assert_eq!(map.override_of("Group"), None);
    }

    #[test]
    fn rename_missing_key_is_noop() {
        let mut map = sample().as_mapping().unwrap().clone();
        assert!(!map.rename_key("Absent", "Other"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn rename_onto_existing_key_replaces_it() {
        let mut map = sample().as_mapping().unwrap().clone();
        assert!(map.rename_key("Name", "Id"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Group", "Id"]);
        assert_eq!(map.get("Id"), Some(&Node::scalar("Box")));
    }

    #[test]
    fn tags_survive_clone_and_set() {
        let component = Node::mapping().with_tag("!ModelComponent");
        let mut parent = Node::mapping();
        parent.set("c1", component).unwrap();
        assert_eq!(parent.get("c1").unwrap().tag(), Some("!ModelComponent"));
    }

    #[test]
    fn quoted_scalar_keeps_text_and_style() {
        let node = Node::quoted_scalar("123");
        assert_eq!(node.as_scalar_text().unwrap(), "123");
        assert_eq!(node.scalar_style(), ScalarStyle::Quoted);
        assert_eq!(Node::scalar("123").scalar_style(), ScalarStyle::Plain);
        assert_ne!(node, Node::scalar("123"));
    }

    #[test]
    fn mapping_from_iter() {
        let map: Mapping = vec![("X", Node::scalar("0.0")), ("Y", Node::scalar("1.0"))]
            .into_iter()
            .collect();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["X", "Y"]);
    }
}
