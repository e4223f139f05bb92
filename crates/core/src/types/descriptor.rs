//! Type descriptor model
//!
//! A [`TypeDescriptor`] is the metadata node standing in for one type. The
//! operations that differ between kinds of types (pointer dereference,
//! element access, field storage access) live in [`Variant`]; everything
//! else is shared.

use std::any::TypeId;
use std::fmt;

use bitflags::bitflags;
use slotmap::new_key_type;

use super::TypeRegistry;
use crate::object::Reflect;

new_key_type! {
    /// Handle for a registered type descriptor
    pub struct TypeKey;
}

/// FNV-1a 32-bit hash of a descriptor name
///
/// `#[derive(Reflect)]` emits the same value as `NAME_HASH`.
pub const fn name_hash(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash: u32 = 0x811c9dc5;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(0x01000193);
        i += 1;
    }
    hash
}

bitflags! {
    /// Capabilities derived when a descriptor is registered
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TypeFlags: u32 {
        /// Descriptor cannot build instances
        const ABSTRACT = 0x01;
        /// Type is-a `Object`
        const OBJECT = 0x02;
        /// Type is-a `Pointer`
        const POINTER = 0x04;
        /// Type is-a `Array`
        const ARRAY = 0x08;
        /// Descriptor describes a field of an owner type
        const FIELD = 0x10;
        /// Field storage is not writable through reflection
        const READONLY = 0x20;
    }
}

impl TypeFlags {
    /// Flags a derived descriptor takes over from its base
    pub(crate) const INHERITED: TypeFlags = TypeFlags::OBJECT
        .union(TypeFlags::POINTER)
        .union(TypeFlags::ARRAY);
}

/// Builds a default, unbound instance
pub type ConstructFn = fn() -> Box<dyn Reflect>;

/// Renders a leaf value for diagnostics
pub type FormatFn = fn(&TypeRegistry, &dyn Reflect) -> Option<String>;

/// Projects an instance onto a part of its storage
pub type Getter =
    Box<dyn for<'a> Fn(&'a dyn Reflect) -> Option<&'a dyn Reflect> + Send + Sync>;

/// Mutable counterpart of [`Getter`]
pub type GetterMut =
    Box<dyn for<'a> Fn(&'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> + Send + Sync>;

/// Writes a configured default into owner storage
pub type DefaultFn = Box<dyn Fn(&mut dyn Reflect) -> bool + Send + Sync>;

/// Accessors from a derived type's storage to its base's storage
pub struct Upcast {
    pub(crate) get: Getter,
    pub(crate) get_mut: GetterMut,
}

/// Pointer capability: one level of indirection
pub struct PointerOps {
    pub(crate) pointee: Option<TypeKey>,
    pub(crate) deref: fn(&dyn Reflect) -> Option<&dyn Reflect>,
    pub(crate) deref_mut: fn(&mut dyn Reflect) -> Option<&mut dyn Reflect>,
}

/// Array capability: counted, indexed elements
pub struct ArrayOps {
    pub(crate) member: Option<TypeKey>,
    pub(crate) count: fn(&dyn Reflect) -> usize,
    pub(crate) at: fn(&dyn Reflect, usize) -> Option<&dyn Reflect>,
    pub(crate) at_mut: fn(&mut dyn Reflect, usize) -> Option<&mut dyn Reflect>,
}

/// Field capability: storage access inside an owner instance
pub struct FieldOps {
    pub(crate) owner: TypeKey,
    pub(crate) name: String,
    pub(crate) get: Getter,
    pub(crate) get_mut: GetterMut,
    pub(crate) set_default: Option<DefaultFn>,
    pub(crate) readonly: bool,
}

/// Kind-specific operations of a descriptor
pub enum Variant {
    /// No extra operations
    Plain,
    /// Pointer to another type
    Pointer(PointerOps),
    /// Sequence of another type
    Array(ArrayOps),
    /// Field of an owner type
    Field(FieldOps),
}

impl Variant {
    fn kind(&self) -> &'static str {
        match self {
            Variant::Plain => "plain",
            Variant::Pointer(_) => "pointer",
            Variant::Array(_) => "array",
            Variant::Field(_) => "field",
        }
    }
}

/// Metadata node for one type
///
/// Descriptors are owned by a [`TypeRegistry`] and never removed; they are
/// referred to by [`TypeKey`].
pub struct TypeDescriptor {
    pub(crate) key: TypeKey,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) base: Option<TypeKey>,
    pub(crate) fields: Vec<TypeKey>,
    pub(crate) size: Option<usize>,
    pub(crate) flags: TypeFlags,
    pub(crate) hash: u32,
    pub(crate) rust_type: Option<TypeId>,
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) upcast: Option<Upcast>,
    pub(crate) formatter: Option<FormatFn>,
    pub(crate) variant: Variant,
}

impl TypeDescriptor {
    /// Registry key of this descriptor
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable label
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Direct parent, `None` for the root
    pub fn base(&self) -> Option<TypeKey> {
        self.base
    }

    /// Fields declared directly on this type, in declaration order
    pub fn fields(&self) -> &[TypeKey] {
        &self.fields
    }

    /// Capability flags
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// FNV-1a hash of the name
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Rust type bound to this descriptor, if any
    pub fn rust_type(&self) -> Option<TypeId> {
        self.rust_type
    }

    /// Whether `create_instance` refuses this type
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// Whether this descriptor describes a field
    pub fn is_field(&self) -> bool {
        self.flags.contains(TypeFlags::FIELD)
    }

    pub(crate) fn field_ops(&self) -> Option<&FieldOps> {
        match &self.variant {
            Variant::Field(ops) => Some(ops),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("base", &self.base)
            .field("fields", &self.fields)
            .field("flags", &self.flags)
            .field("kind", &self.variant.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_hash() {
        const OBJECT: u32 = name_hash("Object");
        assert_eq!(name_hash(""), 0x811c9dc5);
        assert_eq!(name_hash("a"), 0xe40c292c);
        assert_eq!(name_hash("foobar"), 0xbf9cf968);
        assert_ne!(OBJECT, name_hash("Object.type"));
    }

    #[test]
    fn test_inherited_flags() {
        assert!(TypeFlags::INHERITED.contains(TypeFlags::OBJECT));
        assert!(TypeFlags::INHERITED.contains(TypeFlags::POINTER));
        assert!(TypeFlags::INHERITED.contains(TypeFlags::ARRAY));
        assert!(!TypeFlags::INHERITED.contains(TypeFlags::ABSTRACT));
        assert!(!TypeFlags::INHERITED.contains(TypeFlags::FIELD));
    }

    #[test]
    fn test_descriptor_debug_names_kind() {
        let registry = TypeRegistry::new();
        let pointer = registry.get(registry.pointer_type()).unwrap();
        let rendered = format!("{:?}", pointer);
        assert!(rendered.contains("\"Pointer\""));
        assert!(rendered.contains("pointer"));
    }
}
