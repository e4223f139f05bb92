//! Pointer and array descriptor variants
//!
//! Generic traversal code asks the registry whether a descriptor is a
//! pointer or an array and gets back a view exposing the variant's
//! operations. The operations are resolved from the closest descriptor in
//! the base chain, so a field whose value type is a pointer behaves as a
//! pointer too.

use std::collections::VecDeque;
use std::sync::Arc;

use super::descriptor::{ArrayOps, PointerOps, TypeKey};
use crate::object::Reflect;

/// Types that point at one other reflectable value
pub trait Indirect: Reflect {
    /// The pointee, `None` when null
    fn target(&self) -> Option<&dyn Reflect>;

    /// Mutable pointee, `None` when null or shared
    fn target_mut(&mut self) -> Option<&mut dyn Reflect>;
}

/// Types holding a counted run of reflectable elements
pub trait Sequence: Reflect {
    /// Number of elements
    fn count(&self) -> usize;

    /// Element at `index`, `None` when out of range
    fn at(&self, index: usize) -> Option<&dyn Reflect>;

    /// Mutable element at `index`
    fn at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;
}

impl<T: Reflect> Indirect for Box<T> {
    fn target(&self) -> Option<&dyn Reflect> {
        Some(&**self)
    }

    fn target_mut(&mut self) -> Option<&mut dyn Reflect> {
        Some(&mut **self)
    }
}

impl<T: Reflect> Indirect for Option<Box<T>> {
    fn target(&self) -> Option<&dyn Reflect> {
        self.as_deref().map(|value| value as &dyn Reflect)
    }

    fn target_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_deref_mut().map(|value| value as &mut dyn Reflect)
    }
}

impl<T: Reflect> Indirect for Arc<T> {
    fn target(&self) -> Option<&dyn Reflect> {
        Some(&**self)
    }

    fn target_mut(&mut self) -> Option<&mut dyn Reflect> {
        Arc::get_mut(self).map(|value| value as &mut dyn Reflect)
    }
}

impl<T: Reflect> Indirect for Option<Arc<T>> {
    fn target(&self) -> Option<&dyn Reflect> {
        self.as_deref().map(|value| value as &dyn Reflect)
    }

    fn target_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut()
            .and_then(Arc::get_mut)
            .map(|value| value as &mut dyn Reflect)
    }
}

impl<T: Reflect> Sequence for Vec<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn at(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(|value| value as &dyn Reflect)
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|value| value as &mut dyn Reflect)
    }
}

impl<T: Reflect> Sequence for VecDeque<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn at(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(|value| value as &dyn Reflect)
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|value| value as &mut dyn Reflect)
    }
}

impl<T: Reflect, const N: usize> Sequence for [T; N] {
    fn count(&self) -> usize {
        N
    }

    fn at(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(|value| value as &dyn Reflect)
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|value| value as &mut dyn Reflect)
    }
}

fn deref_of<P: Indirect>(value: &dyn Reflect) -> Option<&dyn Reflect> {
    value.as_any().downcast_ref::<P>()?.target()
}

fn deref_mut_of<P: Indirect>(value: &mut dyn Reflect) -> Option<&mut dyn Reflect> {
    value.as_any_mut().downcast_mut::<P>()?.target_mut()
}

fn count_of<A: Sequence>(value: &dyn Reflect) -> usize {
    value
        .as_any()
        .downcast_ref::<A>()
        .map_or(0, |sequence| sequence.count())
}

fn at_of<A: Sequence>(value: &dyn Reflect, index: usize) -> Option<&dyn Reflect> {
    value.as_any().downcast_ref::<A>()?.at(index)
}

fn at_mut_of<A: Sequence>(value: &mut dyn Reflect, index: usize) -> Option<&mut dyn Reflect> {
    value.as_any_mut().downcast_mut::<A>()?.at_mut(index)
}

fn opaque_deref(_value: &dyn Reflect) -> Option<&dyn Reflect> {
    None
}

fn opaque_deref_mut(_value: &mut dyn Reflect) -> Option<&mut dyn Reflect> {
    None
}

fn opaque_count(_value: &dyn Reflect) -> usize {
    0
}

fn opaque_at(_value: &dyn Reflect, _index: usize) -> Option<&dyn Reflect> {
    None
}

fn opaque_at_mut(_value: &mut dyn Reflect, _index: usize) -> Option<&mut dyn Reflect> {
    None
}

impl PointerOps {
    pub(crate) fn of<P: Indirect>(pointee: TypeKey) -> Self {
        Self {
            pointee: Some(pointee),
            deref: deref_of::<P>,
            deref_mut: deref_mut_of::<P>,
        }
    }

    /// Operations of the abstract `Pointer` type
    pub(crate) fn opaque() -> Self {
        Self {
            pointee: None,
            deref: opaque_deref,
            deref_mut: opaque_deref_mut,
        }
    }
}

impl ArrayOps {
    pub(crate) fn of<A: Sequence>(member: TypeKey) -> Self {
        Self {
            member: Some(member),
            count: count_of::<A>,
            at: at_of::<A>,
            at_mut: at_mut_of::<A>,
        }
    }

    /// Operations of the abstract `Array` type
    pub(crate) fn opaque() -> Self {
        Self {
            member: None,
            count: opaque_count,
            at: opaque_at,
            at_mut: opaque_at_mut,
        }
    }
}

/// Pointer view of a descriptor
#[derive(Clone, Copy)]
pub struct PointerType<'r> {
    pub(crate) key: TypeKey,
    pub(crate) ops: &'r PointerOps,
}

impl<'r> PointerType<'r> {
    /// The descriptor this view was obtained for
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Descriptor of the pointee, `None` for the abstract `Pointer`
    pub fn dereferenced(&self) -> Option<TypeKey> {
        self.ops.pointee
    }

    /// Follow the pointer, `None` when null
    pub fn deref<'v>(&self, value: &'v dyn Reflect) -> Option<&'v dyn Reflect> {
        (self.ops.deref)(value)
    }

    /// Follow the pointer mutably
    pub fn deref_mut<'v>(&self, value: &'v mut dyn Reflect) -> Option<&'v mut dyn Reflect> {
        (self.ops.deref_mut)(value)
    }
}

/// Array view of a descriptor
#[derive(Clone, Copy)]
pub struct ArrayType<'r> {
    pub(crate) key: TypeKey,
    pub(crate) ops: &'r ArrayOps,
}

impl<'r> ArrayType<'r> {
    /// The descriptor this view was obtained for
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Descriptor of the elements, `None` for the abstract `Array`
    pub fn member_type(&self) -> Option<TypeKey> {
        self.ops.member
    }

    /// Number of elements in `value`
    pub fn count(&self, value: &dyn Reflect) -> usize {
        (self.ops.count)(value)
    }

    /// Element storage at `index`, `None` when out of range
    pub fn child_at<'v>(&self, value: &'v dyn Reflect, index: usize) -> Option<&'v dyn Reflect> {
        (self.ops.at)(value, index)
    }

    /// Mutable element storage at `index`
    pub fn child_at_mut<'v>(
        &self,
        value: &'v mut dyn Reflect,
        index: usize,
    ) -> Option<&'v mut dyn Reflect> {
        (self.ops.at_mut)(value, index)
    }
}
