//! Field descriptor view

use super::descriptor::{FieldOps, TypeKey};
use super::TypeRegistry;
use crate::object::Reflect;

/// A field descriptor together with the registry it lives in
///
/// Owner instances are accepted as their most-derived storage; the view
/// walks the owner's upcasts to reach the declaring type before touching
/// the field.
#[derive(Clone, Copy)]
pub struct FieldType<'r> {
    pub(crate) registry: &'r TypeRegistry,
    pub(crate) key: TypeKey,
    pub(crate) ops: &'r FieldOps,
}

impl<'r> FieldType<'r> {
    /// Key of the field descriptor
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Field name as declared
    pub fn name(&self) -> &'r str {
        &self.ops.name
    }

    /// Declaring type
    pub fn owner(&self) -> TypeKey {
        self.ops.owner
    }

    /// Descriptor of the stored value
    pub fn value_type(&self) -> TypeKey {
        self.registry
            .base(self.key)
            .unwrap_or_else(|| self.registry.root())
    }

    /// Whether reflection refuses mutable access
    pub fn is_readonly(&self) -> bool {
        self.ops.readonly
    }

    /// Field storage inside `owner`, whose static type is the declaring type
    pub fn get<'v>(&self, owner: &'v dyn Reflect) -> Option<&'v dyn Reflect> {
        self.get_from(owner, self.ops.owner)
    }

    /// Field storage inside `owner`
    ///
    /// # Arguments
    /// * `owner` - Instance storage, an object or a plain value
    /// * `static_type` - Type of `owner` when it carries no live type
    ///
    /// # Returns
    /// `None` when the owner is not-a the declaring type.
    pub fn get_from<'v>(
        &self,
        owner: &'v dyn Reflect,
        static_type: TypeKey,
    ) -> Option<&'v dyn Reflect> {
        let storage = self
            .registry
            .upcast_from(owner, static_type, self.ops.owner)?;
        (self.ops.get)(storage)
    }

    /// Mutable field storage, `None` for read-only fields
    pub fn get_mut<'v>(&self, owner: &'v mut dyn Reflect) -> Option<&'v mut dyn Reflect> {
        self.get_mut_from(owner, self.ops.owner)
    }

    /// Mutable counterpart of [`get_from`](Self::get_from)
    pub fn get_mut_from<'v>(
        &self,
        owner: &'v mut dyn Reflect,
        static_type: TypeKey,
    ) -> Option<&'v mut dyn Reflect> {
        if self.ops.readonly {
            return None;
        }
        let storage = self
            .registry
            .upcast_from_mut(owner, static_type, self.ops.owner)?;
        (self.ops.get_mut)(storage)
    }

    /// Reset the field to its configured default
    ///
    /// # Returns
    /// Whether a default exists and was written.
    pub fn set_default_value(&self, owner: &mut dyn Reflect) -> bool {
        self.set_default_value_from(owner, self.ops.owner)
    }

    /// Reset the field inside an owner of static type `static_type`
    pub fn set_default_value_from(&self, owner: &mut dyn Reflect, static_type: TypeKey) -> bool {
        let Some(set_default) = &self.ops.set_default else {
            return false;
        };
        match self
            .registry
            .upcast_from_mut(owner, static_type, self.ops.owner)
        {
            Some(storage) => set_default(storage),
            None => false,
        }
    }
}
