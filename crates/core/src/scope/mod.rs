//! Named scopes and deferred references
//!
//! A [`Container`] is a symbol table mapping names to children, optionally
//! chained to a parent container so lookups fall back outwards like lexical
//! scopes. A [`Reference`] names a child of a container and resolves to it
//! lazily, which lets object graphs be built in two phases: create and
//! register every node first, then let cross-references resolve on first use.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use teaspoon_core::scope::{GenericContainer, GenericReference};
//!
//! let root = Arc::new(GenericContainer::new());
//! root.add("alice", alice);
//!
//! let scope = Arc::new(GenericContainer::new().with_parent(root.clone()));
//! let reference = GenericReference::with_context(scope, "alice");
//! assert!(reference.resolve().is_some());
//! ```

mod container;
mod reference;

use std::sync::Arc;

pub use container::{Container, Scope, DEFAULT_CAPACITY};
pub use reference::{Reference, ReferenceState, UnboundPolicy};

use crate::object::Object;

/// Shared handle to a typed object, the child type of untyped containers
pub type ObjectRef = Arc<dyn Object>;

/// Container of arbitrary objects
pub type GenericContainer = Container<ObjectRef>;

/// Reference into a [`GenericContainer`]
pub type GenericReference = Reference<ObjectRef>;
