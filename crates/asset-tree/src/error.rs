//! Error types for tree navigation and the YAML bridge

use crate::node::NodeKindName;

/// Errors raised by fallible tree projections and keyed writes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Node is not of the kind the caller projected it to
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: NodeKindName,
        actual: NodeKindName,
    },

    /// Keyed write attempted on a node that is not a mapping
    #[error("cannot write key '{key}' on a {actual} node")]
    NotAMapping { key: String, actual: NodeKindName },

    /// Key expected to exist on a mapping is absent
    #[error("missing key: {0}")]
    MissingKey(String),
}

impl TreeError {
    /// Create type mismatch error
    #[inline]
    #[must_use]
    pub fn type_mismatch(expected: NodeKindName, actual: NodeKindName) -> Self {
        Self::TypeMismatch { expected, actual }
    }
}

/// Errors converting between YAML values and tree nodes
#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    /// Mapping key is a collection; only scalar keys are addressable
    #[error("unsupported mapping key: {0}")]
    UnsupportedKey(String),

    /// Override postfix left an empty key behind
    #[error("empty mapping key after override postfix '{0}'")]
    EmptyKey(String),

    /// Parse or emit failure in serde_yaml
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
