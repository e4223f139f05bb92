//! Declarative descriptor construction
//!
//! [`TypeBuilder`] collects everything a descriptor needs before it is handed
//! to [`TypeRegistry::register`](super::TypeRegistry::register), and
//! [`FieldBuilder`] does the same for a field of an already registered owner.
//! Typed accessors are erased here so the registry only ever deals with
//! `dyn Reflect`.
//!
//! # Example
//!
//! ```ignore
//! let base = registry.object_type();
//! let key = registry.register(
//!     TypeBuilder::concrete::<Actor>("Actor", "actor")
//!         .inherits::<Actor, ObjectBase>(base, |a| &a.base, |a| &mut a.base),
//! )?;
//!
//! let value = registry.ensure::<i32>()?;
//! registry.register_field(
//!     FieldBuilder::<Actor, i32>::new(key, "health", value, |a| &a.health, |a| &mut a.health)
//!         .default_value(|| 100),
//! )?;
//! ```

use std::any::TypeId;

use super::descriptor::{
    ArrayOps, ConstructFn, FieldOps, FormatFn, PointerOps, TypeFlags, TypeKey, Upcast, Variant,
};
use super::variant::{Indirect, Sequence};
use crate::object::Reflect;

// Pins closures to the higher-ranked signature of `Getter`/`GetterMut`
fn getter<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Reflect) -> Option<&'a dyn Reflect>,
{
    f
}

fn getter_mut<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut dyn Reflect) -> Option<&'a mut dyn Reflect>,
{
    f
}

fn construct_default<T: Reflect + Default>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

/// Pending type descriptor
pub struct TypeBuilder {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) base: Option<TypeKey>,
    pub(crate) size: Option<usize>,
    pub(crate) flags: TypeFlags,
    pub(crate) rust_type: Option<TypeId>,
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) upcast: Option<Upcast>,
    pub(crate) formatter: Option<FormatFn>,
    pub(crate) variant: Variant,
}

impl TypeBuilder {
    /// Abstract type without storage or Rust binding
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            base: None,
            size: Some(0),
            flags: TypeFlags::empty(),
            rust_type: None,
            construct: None,
            upcast: None,
            formatter: None,
            variant: Variant::Plain,
        }
    }

    /// Abstract type backed by the Rust type `T`
    pub fn of<T: Reflect>(name: impl Into<String>, description: impl Into<String>) -> Self {
        let mut builder = Self::new(name, description);
        builder.rust_type = Some(TypeId::of::<T>());
        builder.size = Some(std::mem::size_of::<T>());
        builder
    }

    /// Concrete type backed by `T`, instantiated through `T::default()`
    pub fn concrete<T: Reflect + Default>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut builder = Self::of::<T>(name, description);
        builder.construct = Some(construct_default::<T>);
        builder
    }

    /// Bind a Rust type without giving the descriptor storage
    ///
    /// Used for interface types such as trait objects.
    pub fn bind<T: ?Sized + 'static>(mut self) -> Self {
        self.rust_type = Some(TypeId::of::<T>());
        self
    }

    /// Set the direct parent
    ///
    /// Defaults to the root type, or to the abstract `Pointer`/`Array` for
    /// pointer and array builders.
    pub fn base(mut self, base: TypeKey) -> Self {
        self.base = Some(base);
        self
    }

    /// Set the parent and the path from `T`'s storage to the parent's
    ///
    /// # Arguments
    /// * `base` - Descriptor of the embedded parent
    /// * `get` - Borrow the parent storage out of a `T`
    /// * `get_mut` - Mutable counterpart of `get`
    pub fn inherits<T: Reflect, B: Reflect>(
        mut self,
        base: TypeKey,
        get: fn(&T) -> &B,
        get_mut: fn(&mut T) -> &mut B,
    ) -> Self {
        self.base = Some(base);
        self.upcast = Some(Upcast {
            get: Box::new(getter(move |value| {
                value
                    .as_any()
                    .downcast_ref::<T>()
                    .map(|derived| get(derived) as &dyn Reflect)
            })),
            get_mut: Box::new(getter_mut(move |value| {
                value
                    .as_any_mut()
                    .downcast_mut::<T>()
                    .map(|derived| get_mut(derived) as &mut dyn Reflect)
            })),
        });
        self
    }

    /// Leaf formatter used by the inspector
    pub fn formatter(mut self, formatter: FormatFn) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Make this descriptor a pointer to `pointee`
    pub fn pointer<P: Indirect>(mut self, pointee: TypeKey) -> Self {
        self.variant = Variant::Pointer(PointerOps::of::<P>(pointee));
        self
    }

    /// Make this descriptor an array of `member`
    pub fn array<A: Sequence>(mut self, member: TypeKey) -> Self {
        self.variant = Variant::Array(ArrayOps::of::<A>(member));
        self
    }

    pub(crate) fn flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub(crate) fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }
}

/// Pending field descriptor for owner `O` holding a `V`
pub struct FieldBuilder<O, V> {
    pub(crate) owner: TypeKey,
    pub(crate) name: String,
    pub(crate) value_type: TypeKey,
    get: fn(&O) -> &V,
    get_mut: fn(&mut O) -> &mut V,
    default: Option<Box<dyn Fn() -> V + Send + Sync>>,
    readonly: bool,
}

impl<O: Reflect, V: Reflect> FieldBuilder<O, V> {
    /// Describe field `name` of `owner`
    ///
    /// # Arguments
    /// * `owner` - Descriptor of `O`, already registered
    /// * `name` - Field name, unique within the owner
    /// * `value_type` - Descriptor of `V`
    /// * `get` / `get_mut` - Borrow the field out of an `O`
    pub fn new(
        owner: TypeKey,
        name: impl Into<String>,
        value_type: TypeKey,
        get: fn(&O) -> &V,
        get_mut: fn(&mut O) -> &mut V,
    ) -> Self {
        Self {
            owner,
            name: name.into(),
            value_type,
            get,
            get_mut,
            default: None,
            readonly: false,
        }
    }

    /// Value written by `create_instance` and `set_default_value`
    pub fn default_value(mut self, value: impl Fn() -> V + Send + Sync + 'static) -> Self {
        self.default = Some(Box::new(value));
        self
    }

    /// Refuse mutable access through reflection
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub(crate) fn into_ops(self) -> FieldOps {
        let get = self.get;
        let get_mut = self.get_mut;
        let set_default = self.default.map(|default| {
            Box::new(move |value: &mut dyn Reflect| {
                match value.as_any_mut().downcast_mut::<O>() {
                    Some(owner) => {
                        *get_mut(owner) = default();
                        true
                    }
                    None => false,
                }
            }) as Box<dyn Fn(&mut dyn Reflect) -> bool + Send + Sync>
        });

        FieldOps {
            owner: self.owner,
            name: self.name,
            get: Box::new(getter(move |value| {
                value
                    .as_any()
                    .downcast_ref::<O>()
                    .map(|owner| get(owner) as &dyn Reflect)
            })),
            get_mut: Box::new(getter_mut(move |value| {
                value
                    .as_any_mut()
                    .downcast_mut::<O>()
                    .map(|owner| get_mut(owner) as &mut dyn Reflect)
            })),
            set_default,
            readonly: self.readonly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectBase;

    #[derive(Default)]
    struct Probe {
        base: ObjectBase,
        level: i32,
    }

    impl Reflect for Probe {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
            self
        }
    }

    #[test]
    fn test_new_is_storage_less() {
        let builder = TypeBuilder::new("Shape", "shape");
        assert_eq!(builder.size, Some(0));
        assert!(builder.rust_type.is_none());
        assert!(builder.construct.is_none());
    }

    #[test]
    fn test_concrete_binds_rust_type() {
        let builder = TypeBuilder::concrete::<Probe>("Probe", "probe");
        assert_eq!(builder.rust_type, Some(TypeId::of::<Probe>()));
        assert_eq!(builder.size, Some(std::mem::size_of::<Probe>()));
        assert!(builder.construct.is_some());
    }

    #[test]
    fn test_inherits_upcasts_to_base_storage() {
        let builder = TypeBuilder::of::<Probe>("Probe", "probe").inherits::<Probe, ObjectBase>(
            TypeKey::default(),
            |p| &p.base,
            |p| &mut p.base,
        );
        let upcast = builder.upcast.expect("upcast set");
        let probe = Probe::default();

        let base = (upcast.get)(&probe).unwrap();
        assert!(base.as_any().is::<ObjectBase>());
        assert!((upcast.get)(&7i32).is_none());
    }

    #[test]
    fn test_field_ops_access_and_default() {
        let field = FieldBuilder::<Probe, i32>::new(
            TypeKey::default(),
            "level",
            TypeKey::default(),
            |p| &p.level,
            |p| &mut p.level,
        )
        .default_value(|| 9);
        let ops = field.into_ops();
        let mut probe = Probe::default();

        assert!((ops.set_default.as_ref().unwrap())(&mut probe));
        assert_eq!(probe.level, 9);

        let value = (ops.get)(&probe).unwrap();
        assert_eq!(value.as_any().downcast_ref::<i32>(), Some(&9));
        assert!(!ops.readonly);
    }
}
