//! Append-only type registry
//!
//! The registry owns every descriptor ever registered, in registration order.
//! It is built explicitly at start-up, seeded with the kernel types, and then
//! extended through [`TypeBuilder`], [`FieldBuilder`] or
//! [`ensure`](TypeRegistry::ensure). Descriptors are never removed, so a
//! [`TypeKey`] handed out once stays valid for the registry's lifetime.
//!
//! Field lookups by name are memoized in a concurrent map keyed by owner and
//! field name, so repeated lookups from shared (`&self`) contexts stay cheap.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = TypeRegistry::with_builtins();
//! let actor = registry.ensure::<Actor>()?;
//!
//! assert!(registry.is(actor, registry.object_type()));
//! let health = registry.get_field_by_name(actor, "health").unwrap();
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use super::builder::{FieldBuilder, TypeBuilder};
use super::descriptor::{name_hash, ArrayOps, PointerOps, TypeDescriptor, TypeFlags, TypeKey, Variant};
use super::field::FieldType;
use super::variant::{ArrayType, PointerType};
use super::{builtin, Described};
use crate::error::{ReflectError, ReflectResult};
use crate::object::{Object, ObjectBase, Reflect};

/// Ordered store of every type descriptor
pub struct TypeRegistry {
    types: SlotMap<TypeKey, TypeDescriptor>,
    order: Vec<TypeKey>,
    by_rust_type: HashMap<TypeId, TypeKey>,
    /// (owner, field name) -> field descriptor
    field_cache: DashMap<(TypeKey, String), TypeKey>,
    root: TypeKey,
    pointer: TypeKey,
    array: TypeKey,
    object: TypeKey,
}

impl TypeRegistry {
    /// Registry holding only the kernel types
    ///
    /// Seeds the root `Type`, the abstract `Pointer` and `Array`, the
    /// `TypeKey` handle and `Object` with its read-only `type` field.
    pub fn new() -> Self {
        let mut registry = Self {
            types: SlotMap::with_key(),
            order: Vec::new(),
            by_rust_type: HashMap::new(),
            field_cache: DashMap::new(),
            root: TypeKey::default(),
            pointer: TypeKey::default(),
            array: TypeKey::default(),
            object: TypeKey::default(),
        };

        registry.root = registry.insert(TypeBuilder::new("Type", "type"));
        registry.pointer = registry.insert(
            TypeBuilder::new("Pointer", "abstract pointer")
                .base(registry.root)
                .variant(Variant::Pointer(PointerOps::opaque())),
        );
        registry.array = registry.insert(
            TypeBuilder::new("Array", "abstract array")
                .base(registry.root)
                .variant(Variant::Array(ArrayOps::opaque())),
        );

        let handle = registry.insert(builtin::type_key_builder().base(registry.root));
        registry.object = registry.insert(
            TypeBuilder::concrete::<ObjectBase>("Object", "typed object")
                .base(registry.root)
                .flags(TypeFlags::OBJECT),
        );
        registry.insert_field(
            FieldBuilder::<ObjectBase, TypeKey>::new(
                registry.object,
                "type",
                handle,
                ObjectBase::raw_type_key,
                ObjectBase::raw_type_key_mut,
            )
            .readonly(),
        );

        debug!("Type registry created with {} kernel types", registry.len());
        registry
    }

    /// Registry holding the kernel types plus scalars, `String` and the
    /// descriptor type itself
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        if let Err(e) = builtin::register_builtins(&mut registry) {
            warn!("Failed to register builtin types: {}", e);
        }
        registry
    }

    // ========================================================================
    // Well-known types
    // ========================================================================

    /// The root `Type`, base of every hierarchy
    pub fn root(&self) -> TypeKey {
        self.root
    }

    /// The `Object` type
    pub fn object_type(&self) -> TypeKey {
        self.object
    }

    /// The abstract `Pointer` type
    pub fn pointer_type(&self) -> TypeKey {
        self.pointer
    }

    /// The abstract `Array` type
    pub fn array_type(&self) -> TypeKey {
        self.array
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a new descriptor
    ///
    /// # Arguments
    /// * `builder` - The pending descriptor. Without an explicit base it is
    ///   parented to the root, or to `Pointer`/`Array` for those variants.
    ///
    /// # Returns
    /// The key of the new descriptor, or an error if the base is unknown or
    /// the bound Rust type already has a descriptor.
    pub fn register(&mut self, mut builder: TypeBuilder) -> ReflectResult<TypeKey> {
        let base = builder.base.unwrap_or(match builder.variant {
            Variant::Pointer(_) => self.pointer,
            Variant::Array(_) => self.array,
            _ => self.root,
        });
        if !self.types.contains_key(base) {
            return Err(ReflectError::UnknownBase(builder.name));
        }
        if let Some(existing) = builder.rust_type.and_then(|id| self.by_rust_type.get(&id)) {
            return Err(ReflectError::AlreadyDescribed {
                existing: self.types[*existing].name.clone(),
                name: builder.name,
            });
        }

        builder.base = Some(base);
        Ok(self.insert(builder))
    }

    /// Register a field of an existing owner type
    ///
    /// The field descriptor is named `Owner.field`, described by the field
    /// name and based on the value type, and is appended to the owner's
    /// field list.
    pub fn register_field<O: Reflect, V: Reflect>(
        &mut self,
        field: FieldBuilder<O, V>,
    ) -> ReflectResult<TypeKey> {
        if !self.types.contains_key(field.owner) {
            return Err(ReflectError::UnknownOwner(field.name));
        }
        if !self.types.contains_key(field.value_type) {
            return Err(ReflectError::UnknownBase(field.name));
        }
        Ok(self.insert_field(field))
    }

    /// Descriptor of `T`, registering it on first use
    pub fn ensure<T: Described>(&mut self) -> ReflectResult<TypeKey> {
        match self.key_of::<T>() {
            Some(key) => Ok(key),
            None => T::describe(self),
        }
    }

    /// Register `T` together with its pointer and array companions
    ///
    /// Covers `T`, `Option<Box<T>>`, `Vec<T>`, `Option<Box<Vec<T>>>`,
    /// `Vec<Option<Box<T>>>` and `Option<Box<Vec<Option<Box<T>>>>>`.
    ///
    /// # Returns
    /// The key of `T`'s own descriptor.
    pub fn ensure_family<T: Described>(&mut self) -> ReflectResult<TypeKey> {
        let key = self.ensure::<T>()?;
        self.ensure::<Option<Box<T>>>()?;
        self.ensure::<Vec<T>>()?;
        self.ensure::<Option<Box<Vec<T>>>>()?;
        self.ensure::<Vec<Option<Box<T>>>>()?;
        self.ensure::<Option<Box<Vec<Option<Box<T>>>>>>()?;
        Ok(key)
    }

    fn insert(&mut self, builder: TypeBuilder) -> TypeKey {
        let mut flags = builder.flags;
        if let Some(base) = builder.base.and_then(|base| self.types.get(base)) {
            flags |= base.flags & TypeFlags::INHERITED;
        }
        if builder.construct.is_none() {
            flags |= TypeFlags::ABSTRACT;
        }
        match &builder.variant {
            Variant::Pointer(_) => flags |= TypeFlags::POINTER,
            Variant::Array(_) => flags |= TypeFlags::ARRAY,
            Variant::Field(ops) => {
                flags |= TypeFlags::FIELD;
                if ops.readonly {
                    flags |= TypeFlags::READONLY;
                }
            }
            Variant::Plain => {}
        }

        let hash = name_hash(&builder.name);
        let rust_type = builder.rust_type;
        let key = self.types.insert_with_key(|key| TypeDescriptor {
            key,
            name: builder.name,
            description: builder.description,
            base: builder.base,
            fields: Vec::new(),
            size: builder.size,
            flags,
            hash,
            rust_type,
            construct: builder.construct,
            upcast: builder.upcast,
            formatter: builder.formatter,
            variant: builder.variant,
        });
        self.order.push(key);
        if let Some(id) = rust_type {
            self.by_rust_type.insert(id, key);
        }

        debug!(
            "Registered type {} ({:?}, flags={:?})",
            self.types[key].name, key, flags
        );
        key
    }

    fn insert_field<O: Reflect, V: Reflect>(&mut self, field: FieldBuilder<O, V>) -> TypeKey {
        let owner = field.owner;
        let name = format!("{}.{}", self.types[owner].name, field.name);
        let description = field.name.clone();
        let value_type = field.value_type;

        let mut builder = TypeBuilder::new(name, description)
            .base(value_type)
            .variant(Variant::Field(field.into_ops()));
        builder.size = None;

        let key = self.insert(builder);
        if let Some(descriptor) = self.types.get_mut(owner) {
            descriptor.fields.push(key);
        }
        self.field_cache.clear();
        key
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Descriptor bound to the Rust type `T`
    pub fn key_of<T: ?Sized + 'static>(&self) -> Option<TypeKey> {
        self.by_rust_type.get(&TypeId::of::<T>()).copied()
    }

    /// Descriptor for `key`
    pub fn get(&self, key: TypeKey) -> Option<&TypeDescriptor> {
        self.types.get(key)
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty (never true once constructed)
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> + '_ {
        self.order.iter().map(move |key| &self.types[*key])
    }

    /// Direct parent of `key`
    pub fn base(&self, key: TypeKey) -> Option<TypeKey> {
        self.types.get(key).and_then(|descriptor| descriptor.base)
    }

    /// `key` followed by each of its ancestors up to the root
    pub fn ancestors(&self, key: TypeKey) -> impl Iterator<Item = TypeKey> + '_ {
        let start = self.types.contains_key(key).then_some(key);
        std::iter::successors(start, move |current| self.base(*current))
    }

    /// Whether `key` is `other` or derives from it
    pub fn is(&self, key: TypeKey, other: TypeKey) -> bool {
        self.ancestors(key).any(|ancestor| ancestor == other)
    }

    /// `key` itself when it is-a `target`
    pub fn cast_type(&self, key: TypeKey, target: TypeKey) -> Option<TypeKey> {
        self.is(key, target).then_some(key)
    }

    /// First descriptor named `name`, in registration order
    pub fn find_by_name(&self, name: &str) -> Option<TypeKey> {
        self.order
            .iter()
            .copied()
            .find(|key| self.types[*key].name == name)
    }

    /// First descriptor described as `description`, in registration order
    pub fn find_by_description(&self, description: &str) -> Option<TypeKey> {
        self.order
            .iter()
            .copied()
            .find(|key| self.types[*key].description == description)
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Field `name` of `key`, searching the closest ancestor first
    pub fn get_field_by_name(&self, key: TypeKey, name: &str) -> Option<TypeKey> {
        let owner = self.types.get(key)?;
        let cache_key = (key, name.to_string());

        if let Some(field) = self.field_cache.get(&cache_key).map(|entry| *entry) {
            trace!("Field cache hit for {}.{}", owner.name, name);
            return Some(field);
        }

        let found = self.ancestors(key).find_map(|ancestor| {
            self.types[ancestor].fields.iter().copied().find(|field| {
                self.types[*field]
                    .field_ops()
                    .is_some_and(|ops| ops.name == name)
            })
        })?;

        trace!("Resolved field {}.{} -> {:?}", owner.name, name, found);
        self.field_cache.insert(cache_key, found);
        Some(found)
    }

    /// Fields declared directly on `key`, in declaration order
    pub fn fields(&self, key: TypeKey) -> impl Iterator<Item = FieldType<'_>> + '_ {
        self.types
            .get(key)
            .map(|descriptor| descriptor.fields.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |field| self.field(*field))
    }

    /// Field view of a field descriptor
    pub fn field(&self, key: TypeKey) -> Option<FieldType<'_>> {
        let ops = self.types.get(key)?.field_ops()?;
        Some(FieldType {
            registry: self,
            key,
            ops,
        })
    }

    // ========================================================================
    // Variants
    // ========================================================================

    /// Pointer view of `key`, when it is-a `Pointer`
    pub fn pointer(&self, key: TypeKey) -> Option<PointerType<'_>> {
        if !self.is(key, self.pointer) {
            return None;
        }
        self.ancestors(key)
            .find_map(|ancestor| match &self.types[ancestor].variant {
                Variant::Pointer(ops) => Some(PointerType { key, ops }),
                _ => None,
            })
    }

    /// Array view of `key`, when it is-a `Array`
    pub fn array(&self, key: TypeKey) -> Option<ArrayType<'_>> {
        if !self.is(key, self.array) {
            return None;
        }
        self.ancestors(key)
            .find_map(|ancestor| match &self.types[ancestor].variant {
                Variant::Array(ops) => Some(ArrayType { key, ops }),
                _ => None,
            })
    }

    /// Render a leaf value with the closest formatter along the chain
    pub fn format_leaf(&self, key: TypeKey, value: &dyn Reflect) -> Option<String> {
        let formatter = self
            .ancestors(key)
            .find_map(|ancestor| self.types[ancestor].formatter)?;
        formatter(self, value)
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Size in bytes of instances of `key`
    ///
    /// Inherited along the base chain; the root, storage-less abstract types
    /// and unknown keys report 0.
    pub fn size_of(&self, key: TypeKey) -> usize {
        self.ancestors(key)
            .find_map(|ancestor| self.types[ancestor].size)
            .unwrap_or(0)
    }

    /// Build a new instance of `key`
    ///
    /// The instance is default-constructed, bound to `key` if it is an
    /// object, then every field default is applied, ancestors first and in
    /// declaration order.
    ///
    /// # Returns
    /// The new instance, or `AbstractType` for abstract and field
    /// descriptors.
    pub fn create_instance(&self, key: TypeKey) -> ReflectResult<Box<dyn Reflect>> {
        let descriptor = self
            .types
            .get(key)
            .ok_or_else(|| ReflectError::UnknownType(format!("{:?}", key)))?;
        let construct = descriptor
            .construct
            .ok_or_else(|| ReflectError::AbstractType(descriptor.name.clone()))?;

        let mut instance = construct();
        if let Some(object) = instance.as_object_mut() {
            object.object_base_mut().bind(key);
        }

        let mut chain: Vec<TypeKey> = self.ancestors(key).collect();
        chain.reverse();
        for ancestor in chain {
            for field in self.fields(ancestor) {
                field.set_default_value_from(instance.as_mut(), key);
            }
        }

        debug!("Created instance of {}", descriptor.name);
        Ok(instance)
    }

    /// Build a new instance of the Rust type `T`
    pub fn create<T: Reflect>(&self) -> ReflectResult<Box<T>> {
        let name = std::any::type_name::<T>();
        let key = self
            .key_of::<T>()
            .ok_or_else(|| ReflectError::UnknownType(name.to_string()))?;
        self.create_instance(key)?
            .into_any()
            .downcast::<T>()
            .map_err(|_| ReflectError::UnknownType(name.to_string()))
    }

    /// Destroy an instance through its live descriptor
    ///
    /// Dropping the box runs the most-derived type's drop glue, which
    /// releases every field and base in turn.
    ///
    /// # Panics
    /// Panics if `instance` is an object that was never bound.
    pub fn destroy(&self, instance: Box<dyn Reflect>) {
        match instance.as_object() {
            Some(object) => self.released(object.object_type()),
            None => trace!("Destroying untyped value"),
        }
        drop(instance);
    }

    pub(crate) fn released(&self, key: TypeKey) {
        match self.types.get(key) {
            Some(descriptor) => debug!("Destroying instance of {}", descriptor.name),
            None => warn!("Destroying instance of unknown type {:?}", key),
        }
    }

    // ========================================================================
    // Casts
    // ========================================================================

    /// Storage of `target` inside `value`
    ///
    /// Objects start from their live type; plain values start from `from`.
    /// Each descriptor's upcast accessor is applied until `target` is
    /// reached.
    ///
    /// # Panics
    /// Panics if `value` is an object that was never bound to its descriptor.
    pub fn upcast_from<'v>(
        &self,
        value: &'v dyn Reflect,
        from: TypeKey,
        target: TypeKey,
    ) -> Option<&'v dyn Reflect> {
        let start = start_type(value, from);
        if !self.is(start, target) {
            return None;
        }

        let mut current = value;
        for key in self.ancestors(start) {
            if key == target {
                return Some(current);
            }
            if let Some(upcast) = &self.types[key].upcast {
                current = (upcast.get)(current)?;
            }
        }
        None
    }

    /// Mutable counterpart of [`upcast_from`](Self::upcast_from)
    pub fn upcast_from_mut<'v>(
        &self,
        value: &'v mut dyn Reflect,
        from: TypeKey,
        target: TypeKey,
    ) -> Option<&'v mut dyn Reflect> {
        let start = start_type(&*value, from);
        if !self.is(start, target) {
            return None;
        }

        let mut current = value;
        for key in self.ancestors(start) {
            if key == target {
                return Some(current);
            }
            if let Some(upcast) = &self.types[key].upcast {
                current = (upcast.get_mut)(current)?;
            }
        }
        None
    }

    /// Storage of `target` inside an object, or a plain value of type `target`
    pub fn upcast<'v>(&self, value: &'v dyn Reflect, target: TypeKey) -> Option<&'v dyn Reflect> {
        self.upcast_from(value, target, target)
    }

    /// Mutable counterpart of [`upcast`](Self::upcast)
    pub fn upcast_mut<'v>(
        &self,
        value: &'v mut dyn Reflect,
        target: TypeKey,
    ) -> Option<&'v mut dyn Reflect> {
        self.upcast_from_mut(value, target, target)
    }

    /// View `value` as a `T`
    ///
    /// Objects succeed when their live type is-a `T`'s descriptor; plain
    /// values succeed when they are a `T`.
    ///
    /// # Panics
    /// Panics if `value` is an object that was never bound to its descriptor.
    pub fn cast<'v, T: Reflect>(&self, value: &'v dyn Reflect) -> Option<&'v T> {
        if value.as_object().is_some() {
            let target = self.key_of::<T>()?;
            self.upcast(value, target)?.as_any().downcast_ref::<T>()
        } else {
            value.as_any().downcast_ref::<T>()
        }
    }

    /// Mutable counterpart of [`cast`](Self::cast)
    pub fn cast_mut<'v, T: Reflect>(&self, value: &'v mut dyn Reflect) -> Option<&'v mut T> {
        if value.as_object().is_some() {
            let target = self.key_of::<T>()?;
            self.upcast_mut(value, target)?
                .as_any_mut()
                .downcast_mut::<T>()
        } else {
            value.as_any_mut().downcast_mut::<T>()
        }
    }

    /// Object view of `value` when its live type is-a `target`
    pub fn cast_object<'v>(&self, value: &'v dyn Reflect, target: TypeKey) -> Option<&'v dyn Object> {
        let object = value.as_object()?;
        self.is(object.object_type(), target).then_some(object)
    }
}

/// Type an upcast starts from: the live type of objects, `from` otherwise
fn start_type(value: &dyn Reflect, from: TypeKey) -> TypeKey {
    match value.as_object() {
        Some(object) => object.object_type(),
        None => from,
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.order.len())
            .field("cached_fields", &self.field_cache.len())
            .finish()
    }
}
