//! Override annotations and the capture/restore protocol
//!
//! An override annotation records where a field's value came from: inherited
//! from a base template, explicitly set by an author, or sealed against
//! further inheritance. Any edit that moves a field to a new key must carry
//! the annotation across with [`OverrideTracker`], or author customisation is
//! silently lost.

use std::fmt::{self, Display, Formatter};

use crate::error::TreeError;
use crate::node::Node;

/// Provenance of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverrideState {
    /// Inherited from the base
    #[default]
    Base,
    /// Explicitly set by the author
    New,
    /// Sealed: derived assets must not override it
    Sealed,
    /// Explicitly set and sealed
    NewSealed,
}

impl OverrideState {
    /// Whether the author explicitly set the value
    #[inline]
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Self::New | Self::NewSealed)
    }

    /// Whether the value is sealed
    #[inline]
    #[must_use]
    pub fn is_sealed(self) -> bool {
        matches!(self, Self::Sealed | Self::NewSealed)
    }

    /// Key postfix used by the serialized form (`Key*`, `Key!`, `Key*!`)
    #[inline]
    #[must_use]
    pub fn postfix(self) -> &'static str {
        match self {
            Self::Base => "",
            Self::New => "*",
            Self::Sealed => "!",
            Self::NewSealed => "*!",
        }
    }

    /// Split a serialized key into the bare key and its annotation
    ///
    /// Keys without a postfix come back as [`OverrideState::Base`].
    #[must_use]
    pub fn split_key(raw: &str) -> (&str, Self) {
        if let Some(bare) = raw.strip_suffix("*!") {
            (bare, Self::NewSealed)
        } else if let Some(bare) = raw.strip_suffix('*') {
            (bare, Self::New)
        } else if let Some(bare) = raw.strip_suffix('!') {
            (bare, Self::Sealed)
        } else {
            (raw, Self::Base)
        }
    }
}

impl Display for OverrideState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Base => "base",
            Self::New => "new",
            Self::Sealed => "sealed",
            Self::NewSealed => "new+sealed",
        };
        f.write_str(name)
    }
}

/// Two-step capture/restore of override annotations
///
/// `capture` must run before the source key is removed or replaced; `restore`
/// runs once the value has been written under its new key. A `None` capture
/// means no explicit annotation existed and restoring it is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideTracker;

impl OverrideTracker {
    /// Read the annotation for `key` on `node`
    #[inline]
    #[must_use]
    pub fn capture(node: &Node, key: &str) -> Option<OverrideState> {
        node.get_override(key)
    }

    /// Re-attach a captured annotation to `key` on `node`
    ///
    /// # Errors
    /// Returns [`TreeError::NotAMapping`] or [`TreeError::MissingKey`] when a
    /// captured state cannot be attached. A `None` state never fails.
    #[inline]
    pub fn restore(node: &mut Node, key: &str, state: Option<OverrideState>) -> Result<(), TreeError> {
        match state {
            Some(state) => node.set_override(key, state),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_key_postfixes() {
        assert_eq!(OverrideState::split_key("Group*"), ("Group", OverrideState::New));
        assert_eq!(OverrideState::split_key("Group!"), ("Group", OverrideState::Sealed));
        assert_eq!(OverrideState::split_key("Group*!"), ("Group", OverrideState::NewSealed));
        assert_eq!(OverrideState::split_key("Group"), ("Group", OverrideState::Base));
    }

    #[test]
    fn postfix_round_trips_through_split() {
        for state in [
            OverrideState::Base,
            OverrideState::New,
            OverrideState::Sealed,
            OverrideState::NewSealed,
        ] {
            let raw = format!("Field{}", state.postfix());
            assert_eq!(OverrideState::split_key(&raw), ("Field", state));
        }
    }

    #[test]
    fn flags() {
        assert!(OverrideState::NewSealed.is_new());
        assert!(OverrideState::NewSealed.is_sealed());
        assert!(!OverrideState::Base.is_new());
        assert!(!OverrideState::New.is_sealed());
    }

    #[test]
    fn capture_then_restore_on_new_key() {
        let mut entity = Node::mapping().with_overridden_entry(
            "Group",
            Node::scalar("Group5"),
            OverrideState::New,
        );
        let captured = OverrideTracker::capture(&entity, "Group");
        let value = entity.remove("Group").unwrap();

        let mut component = Node::mapping().with_tag("!ModelComponent");
        component.set("RenderGroup", value).unwrap();
        OverrideTracker::restore(&mut component, "RenderGroup", captured).unwrap();

        assert_eq!(component.get_override("RenderGroup"), Some(OverrideState::New));
        assert_eq!(entity.get_override("Group"), None);
    }

    #[test]
    fn restore_none_is_noop() {
        let mut node = Node::mapping();
        OverrideTracker::restore(&mut node, "Absent", None).unwrap();
        assert_eq!(node.get_override("Absent"), None);
    }

    #[test]
    fn restore_onto_missing_key_fails() {
        let mut node = Node::mapping();
        let result = OverrideTracker::restore(&mut node, "Absent", Some(OverrideState::Sealed));
        assert_eq!(result, Err(TreeError::MissingKey("Absent".to_string())));
    }
}
