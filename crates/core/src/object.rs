//! Reflectable values and typed objects
//!
//! Every value the kernel can hand around implements [`Reflect`], which is
//! the opaque instance handle used by casts, field accessors and the
//! inspector. Values whose type hierarchy is rooted in `Object` also
//! implement [`Object`]: they embed an [`ObjectBase`] carrying the key of
//! their own descriptor, so the live type can be read from the instance
//! instead of being assumed by the caller.
//!
//! # Example
//!
//! ```ignore
//! use teaspoon_core::{ObjectBase, Reflect};
//!
//! #[derive(Reflect, Default)]
//! #[reflect(name = "Actor", description = "actor")]
//! pub struct Actor {
//!     #[reflect(base)]
//!     base: ObjectBase,
//!
//!     #[reflect(default = 100)]
//!     health: i32,
//! }
//!
//! let actor = registry.create::<Actor>()?;
//! assert!(actor.is(&registry, registry.object_type()));
//! ```

use std::any::Any;

use slotmap::Key;

use crate::types::{TypeKey, TypeRegistry};

/// Opaque handle to reflectable storage
///
/// Implemented for scalars, `String`, the standard pointer and sequence
/// types, and every `#[derive(Reflect)]` struct.
pub trait Reflect: Any {
    /// Borrow as `Any` for checked downcasts
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `Any` for checked downcasts
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert a boxed value into a boxed `Any`
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Object view of this value, if its type is rooted in `Object`
    fn as_object(&self) -> Option<&dyn Object> {
        None
    }

    /// Mutable object view of this value
    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }

    /// Descriptor key stored in the instance itself
    ///
    /// `None` for plain values, whose type is fixed by context, and for
    /// objects that have not been bound yet.
    fn live_type(&self) -> Option<TypeKey> {
        self.as_object()
            .and_then(|object| object.object_base().bound_key())
    }
}

/// Base of all typed instances
pub trait Object: Reflect {
    /// The embedded header holding the descriptor key
    fn object_base(&self) -> &ObjectBase;

    /// Mutable access to the embedded header
    fn object_base_mut(&mut self) -> &mut ObjectBase;

    /// Upcast to the reflection handle
    fn as_reflect(&self) -> &dyn Reflect;

    /// Key of the most-derived descriptor of this instance
    ///
    /// # Panics
    /// Panics if the instance was built without going through its descriptor.
    fn object_type(&self) -> TypeKey {
        self.object_base().type_key()
    }

    /// Check whether this instance is-a `other`
    fn is(&self, registry: &TypeRegistry, other: TypeKey) -> bool {
        registry.is(self.object_type(), other)
    }

    /// Destroy this instance through its descriptor
    ///
    /// The box is dropped as its most-derived type, so fields and bases are
    /// released along with it.
    ///
    /// # Panics
    /// Panics if the instance was never bound.
    fn destroy(self: Box<Self>, registry: &TypeRegistry) {
        registry.released(self.object_type());
    }
}

/// Storage of the root `Object` type
///
/// The descriptor key starts out null and is bound exactly once by
/// [`TypeRegistry::create_instance`].
#[derive(Debug, Clone, Default)]
pub struct ObjectBase {
    type_key: TypeKey,
}

impl ObjectBase {
    /// Bind this instance to its descriptor
    ///
    /// # Panics
    /// Panics if the instance is already bound; an object's type never changes.
    pub fn bind(&mut self, key: TypeKey) {
        if !self.type_key.is_null() {
            panic!(
                "object already bound to {:?}, refusing rebind to {:?}",
                self.type_key, key
            );
        }
        self.type_key = key;
    }

    /// Descriptor key of this instance
    ///
    /// # Panics
    /// Panics if the instance was never bound. This means the object was built
    /// directly instead of through `TypeRegistry::create_instance`.
    pub fn type_key(&self) -> TypeKey {
        if self.type_key.is_null() {
            panic!("object has no type descriptor; create it through TypeRegistry::create_instance");
        }
        self.type_key
    }

    /// Whether a descriptor has been bound
    pub fn is_bound(&self) -> bool {
        !self.type_key.is_null()
    }

    /// Descriptor key, `None` while unbound
    pub fn bound_key(&self) -> Option<TypeKey> {
        self.is_bound().then_some(self.type_key)
    }

    pub(crate) fn raw_type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub(crate) fn raw_type_key_mut(&mut self) -> &mut TypeKey {
        &mut self.type_key
    }
}

impl Reflect for ObjectBase {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_object(&self) -> Option<&dyn Object> {
        Some(self)
    }

    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        Some(self)
    }
}

impl Object for ObjectBase {
    fn object_base(&self) -> &ObjectBase {
        self
    }

    fn object_base_mut(&mut self) -> &mut ObjectBase {
        self
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_by_default() {
        let base = ObjectBase::default();
        assert!(!base.is_bound());
        assert!(base.bound_key().is_none());
        assert!(base.live_type().is_none());
    }

    #[test]
    #[should_panic(expected = "no type descriptor")]
    fn test_unbound_type_key_is_fatal() {
        let base = ObjectBase::default();
        let _ = base.type_key();
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_rebind_is_fatal() {
        let registry = TypeRegistry::new();
        let mut base = ObjectBase::default();
        base.bind(registry.object_type());
        base.bind(registry.root());
    }

    #[test]
    fn test_bound_object_reports_type() {
        let registry = TypeRegistry::new();
        let mut base = ObjectBase::default();
        base.bind(registry.object_type());

        assert!(base.is_bound());
        assert_eq!(base.object_type(), registry.object_type());
        assert_eq!(base.live_type(), Some(registry.object_type()));
        assert!(base.is(&registry, registry.root()));
    }
}
