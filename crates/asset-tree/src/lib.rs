//! Asset Document Trees
//!
//! Loosely-typed, tagged document trees with override annotations, the data
//! that asset upgrade rules navigate and rewrite.
//!
//! # Core Concepts
//!
//! - [`Node`]: Tagged sum of mapping, sequence and scalar
//! - [`Mapping`]: Insertion-ordered entries plus per-key [`OverrideState`]
//! - [`OverrideTracker`]: Capture/restore protocol for relocated fields
//! - [`NodePath`]: Node location reported with diagnostics
//! - [`yaml`]: Conversion to and from `serde_yaml` values
//!
//! # Example
//!
//! ```rust
//! use asset_tree::{Node, OverrideState, OverrideTracker};
//!
//! let mut entity = Node::mapping()
//!     .with_overridden_entry("Group", Node::scalar("Group2"), OverrideState::New);
//!
//! let captured = OverrideTracker::capture(&entity, "Group");
//! let value = entity.remove("Group").unwrap();
//!
//! let mut component = Node::mapping().with_tag("!ModelComponent");
//! component.set("RenderGroup", value).unwrap();
//! OverrideTracker::restore(&mut component, "RenderGroup", captured).unwrap();
//!
//! assert_eq!(component.get_override("RenderGroup"), Some(OverrideState::New));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod node;
mod overrides;
mod path;

pub mod yaml;

pub use error::{TreeError, YamlError};
pub use node::{Mapping, Node, NodeKind, NodeKindName, ScalarStyle};
pub use overrides::{OverrideState, OverrideTracker};
pub use path::{NodePath, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
