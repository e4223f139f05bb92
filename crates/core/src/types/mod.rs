//! Type descriptors and the type registry
//!
//! Every reflectable type is represented by a [`TypeDescriptor`] stored in a
//! [`TypeRegistry`]. Descriptors form a single-inheritance forest rooted at
//! the empty `Type`; pointers, arrays and fields are descriptors too, with
//! extra operations exposed through [`PointerType`], [`ArrayType`] and
//! [`FieldType`] views.
//!
//! # Example
//!
//! ```ignore
//! use teaspoon_core::types::TypeRegistry;
//!
//! let mut registry = TypeRegistry::with_builtins();
//! let actor = registry.ensure_family::<Actor>()?;
//!
//! let instance = registry.create_instance(actor)?;
//! let health = registry.get_field_by_name(actor, "health").unwrap();
//! let value = registry.field(health).unwrap().get(instance.as_ref());
//! ```

mod builder;
mod builtin;
mod descriptor;
mod field;
mod hierarchy;
mod registry;
mod variant;

pub use builder::{FieldBuilder, TypeBuilder};
pub use descriptor::{
    name_hash, ArrayOps, ConstructFn, DefaultFn, FieldOps, FormatFn, Getter, GetterMut,
    PointerOps, TypeDescriptor, TypeFlags, TypeKey, Upcast, Variant,
};
pub use field::FieldType;
pub use registry::TypeRegistry;
pub use variant::{ArrayType, Indirect, PointerType, Sequence};

use crate::error::ReflectResult;
use crate::object::Reflect;

/// Types that know how to register their own descriptor
///
/// Implemented for the built-in types and generated by
/// `#[derive(Reflect)]`. Use [`TypeRegistry::ensure`] rather than calling
/// `describe` directly, so each type is registered once.
pub trait Described: Reflect {
    /// Register the descriptor of `Self` and its fields
    ///
    /// Implementations register `Self` before ensuring their field types,
    /// so self-referential types terminate.
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey>;
}
