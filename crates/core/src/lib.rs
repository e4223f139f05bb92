//! Teaspoon - run-time reflection kernel
//!
//! Types describe themselves at run time through [`TypeDescriptor`]s kept in
//! a [`TypeRegistry`]: name, description, single base, ordered fields, and
//! the operations needed to build, inspect and cast instances without
//! knowing their static type.
//!
//! # Modules
//!
//! - [`types`] - descriptors, the registry, pointer/array/field views
//! - [`object`] - the [`Reflect`] handle and the [`Object`] root
//! - [`scope`] - parent-chained containers and lazily resolved references
//! - [`inspect`] - diagnostic dump of object graphs
//! - [`config`] - TOML configuration
//! - [`globals`] - optional process-wide registry
//!
//! # Example
//!
//! ```ignore
//! use teaspoon_core::{ObjectBase, Reflect, TypeRegistry};
//!
//! #[derive(Reflect, Default)]
//! #[reflect(name = "Actor", description = "actor")]
//! struct Actor {
//!     #[reflect(base)]
//!     base: ObjectBase,
//!     #[reflect(default = 100)]
//!     health: i32,
//! }
//!
//! let mut registry = TypeRegistry::with_builtins();
//! let actor = registry.ensure::<Actor>()?;
//! let instance = registry.create_instance(actor)?;
//! println!("{}", teaspoon_core::inspect::Inspector::new(&registry).object(instance.as_ref()));
//! ```

// Allow the crate to refer to itself as `teaspoon_core` for proc macro compatibility
extern crate self as teaspoon_core;

pub mod config;
pub mod error;
pub mod globals;
pub mod inspect;
pub mod logging;
pub mod object;
pub mod scope;
pub mod types;

// Re-export commonly used items
pub use config::{ConfigError, ConfigResult, ReflectConfig};
pub use error::{ReflectError, ReflectResult};
pub use globals::{init_registry, registry, try_registry};
pub use inspect::{object_hierarchy, write_object_hierarchy, Inspector};
pub use object::{Object, ObjectBase, Reflect};
pub use scope::{
    Container, GenericContainer, GenericReference, ObjectRef, Reference, ReferenceState, Scope,
    UnboundPolicy,
};
pub use types::{
    Described, FieldBuilder, FieldType, TypeBuilder, TypeDescriptor, TypeFlags, TypeKey,
    TypeRegistry,
};

// Re-export the derive macro; it shares the trait's name in the macro namespace
pub use teaspoon_macros::Reflect;
