//! Descriptors for Rust's own types
//!
//! Scalars and `String` are leaf types with a formatter. The standard smart
//! pointers and collections are described generically, named after their
//! element type:
//!
//! | Rust type        | Name             | Description        |
//! |------------------|------------------|--------------------|
//! | `Option<Box<T>>` | `{T}Ptr`         | `{T}*`             |
//! | `Box<T>`         | `{T}Box`         | `boxed {T}`        |
//! | `Arc<T>`         | `{T}Shared`      | `shared {T}`       |
//! | `Option<Arc<T>>` | `{T}SharedPtr`   | `shared {T}*`      |
//! | `Vec<T>`         | `{T}Array`       | `{T} array`        |
//! | `VecDeque<T>`    | `{T}Deque`       | `{T} deque`        |
//! | `[T; N]`         | `{T}Array{N}`    | `{T} array[N]`     |

use std::any::Any;
use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::Arc;

use slotmap::Key;

use super::builder::{FieldBuilder, TypeBuilder};
use super::descriptor::{TypeDescriptor, TypeKey};
use super::{Described, TypeRegistry};
use crate::error::{ReflectError, ReflectResult};
use crate::object::{ObjectBase, Reflect};

// ============================================================================
// Formatters
// ============================================================================

fn format_display<T: Reflect + Display>(_: &TypeRegistry, value: &dyn Reflect) -> Option<String> {
    value.as_any().downcast_ref::<T>().map(ToString::to_string)
}

fn format_quoted(_: &TypeRegistry, value: &dyn Reflect) -> Option<String> {
    value
        .as_any()
        .downcast_ref::<String>()
        .map(|text| format!("\"{}\"", text))
}

fn format_type_key(registry: &TypeRegistry, value: &dyn Reflect) -> Option<String> {
    let key = value.as_any().downcast_ref::<TypeKey>()?;
    if key.is_null() {
        return Some("(null)".to_string());
    }
    registry.get(*key).map(|descriptor| descriptor.name().to_string())
}

// ============================================================================
// Leaf types
// ============================================================================

macro_rules! impl_reflect {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn Any {
                    self
                }

                fn into_any(self: Box<Self>) -> Box<dyn Any> {
                    self
                }
            }
        )*
    };
}

macro_rules! impl_reflect_value {
    ($($ty:ty => $description:literal),* $(,)?) => {
        $(
            impl_reflect!($ty);

            impl Described for $ty {
                fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
                    registry.register(
                        TypeBuilder::concrete::<$ty>(stringify!($ty), $description)
                            .formatter(format_display::<$ty>),
                    )
                }
            }
        )*
    };
}

impl_reflect_value! {
    bool => "boolean",
    char => "character",
    i8 => "8-bit integer",
    i16 => "16-bit integer",
    i32 => "32-bit integer",
    i64 => "64-bit integer",
    isize => "pointer-sized integer",
    u8 => "8-bit unsigned integer",
    u16 => "16-bit unsigned integer",
    u32 => "32-bit unsigned integer",
    u64 => "64-bit unsigned integer",
    usize => "pointer-sized unsigned integer",
    f32 => "32-bit float",
    f64 => "64-bit float",
}

impl_reflect!(String, TypeKey, TypeDescriptor);

impl Described for String {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        registry.register(TypeBuilder::concrete::<String>("String", "text").formatter(format_quoted))
    }
}

pub(crate) fn type_key_builder() -> TypeBuilder {
    TypeBuilder::concrete::<TypeKey>("TypeKey", "type handle").formatter(format_type_key)
}

impl Described for TypeKey {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        registry.register(type_key_builder())
    }
}

impl Described for ObjectBase {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        Ok(registry.object_type())
    }
}

impl Described for TypeDescriptor {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        let key = registry.register(TypeBuilder::of::<TypeDescriptor>(
            "TypeDescriptor",
            "type instance",
        ))?;

        let text = registry.ensure::<String>()?;
        let keys = registry.ensure::<Vec<TypeKey>>()?;
        registry.register_field(
            FieldBuilder::<TypeDescriptor, String>::new(
                key,
                "name",
                text,
                |d| &d.name,
                |d| &mut d.name,
            )
            .readonly(),
        )?;
        registry.register_field(
            FieldBuilder::<TypeDescriptor, String>::new(
                key,
                "description",
                text,
                |d| &d.description,
                |d| &mut d.description,
            )
            .readonly(),
        )?;
        registry.register_field(
            FieldBuilder::<TypeDescriptor, Vec<TypeKey>>::new(
                key,
                "fields",
                keys,
                |d| &d.fields,
                |d| &mut d.fields,
            )
            .readonly(),
        )?;
        Ok(key)
    }
}

/// Register every leaf type plus the descriptor type
pub(crate) fn register_builtins(registry: &mut TypeRegistry) -> ReflectResult<()> {
    registry.ensure::<bool>()?;
    registry.ensure::<char>()?;
    registry.ensure::<i8>()?;
    registry.ensure::<i16>()?;
    registry.ensure::<i32>()?;
    registry.ensure::<i64>()?;
    registry.ensure::<isize>()?;
    registry.ensure::<u8>()?;
    registry.ensure::<u16>()?;
    registry.ensure::<u32>()?;
    registry.ensure::<u64>()?;
    registry.ensure::<usize>()?;
    registry.ensure::<f32>()?;
    registry.ensure::<f64>()?;
    registry.ensure::<String>()?;
    registry.ensure::<TypeDescriptor>()?;
    Ok(())
}

// ============================================================================
// Pointers and collections
// ============================================================================

macro_rules! impl_reflect_generic {
    ($([$($param:tt)*] $ty:ty),* $(,)?) => {
        $(
            impl<$($param)*> Reflect for $ty {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn Any {
                    self
                }

                fn into_any(self: Box<Self>) -> Box<dyn Any> {
                    self
                }
            }
        )*
    };
}

impl_reflect_generic! {
    [T: Reflect] Box<T>,
    [T: Reflect] Arc<T>,
    [T: Reflect] Option<T>,
    [T: Reflect] Vec<T>,
    [T: Reflect] VecDeque<T>,
    [T: Reflect, const N: usize] [T; N],
}

/// Describe wrapper `W` around `T`, naming it from `T`'s descriptor
fn describe_wrapper<W: Reflect, T: Described>(
    registry: &mut TypeRegistry,
    build: impl FnOnce(TypeKey, &TypeDescriptor) -> TypeBuilder,
) -> ReflectResult<TypeKey> {
    let inner = registry.ensure::<T>()?;
    // Describing `T` can reach `W` again through a self-referential field
    if let Some(key) = registry.key_of::<W>() {
        return Ok(key);
    }

    let descriptor = registry
        .get(inner)
        .ok_or_else(|| ReflectError::UnknownType(std::any::type_name::<T>().to_string()))?;
    let builder = build(inner, descriptor);
    registry.register(builder)
}

impl<T: Described> Described for Option<Box<T>> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        describe_wrapper::<Self, T>(registry, |inner, d| {
            TypeBuilder::concrete::<Self>(format!("{}Ptr", d.name()), format!("{}*", d.description()))
                .pointer::<Self>(inner)
        })
    }
}

impl<T: Described> Described for Box<T> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        describe_wrapper::<Self, T>(registry, |inner, d| {
            TypeBuilder::of::<Self>(format!("{}Box", d.name()), format!("boxed {}", d.description()))
                .pointer::<Self>(inner)
        })
    }
}

impl<T: Described> Described for Arc<T> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        describe_wrapper::<Self, T>(registry, |inner, d| {
            TypeBuilder::of::<Self>(
                format!("{}Shared", d.name()),
                format!("shared {}", d.description()),
            )
            .pointer::<Self>(inner)
        })
    }
}

impl<T: Described> Described for Option<Arc<T>> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        describe_wrapper::<Self, T>(registry, |inner, d| {
            TypeBuilder::concrete::<Self>(
                format!("{}SharedPtr", d.name()),
                format!("shared {}*", d.description()),
            )
            .pointer::<Self>(inner)
        })
    }
}

impl<T: Described> Described for Vec<T> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        describe_wrapper::<Self, T>(registry, |inner, d| {
            TypeBuilder::concrete::<Self>(
                format!("{}Array", d.name()),
                format!("{} array", d.description()),
            )
            .array::<Self>(inner)
        })
    }
}

impl<T: Described> Described for VecDeque<T> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        describe_wrapper::<Self, T>(registry, |inner, d| {
            TypeBuilder::concrete::<Self>(
                format!("{}Deque", d.name()),
                format!("{} deque", d.description()),
            )
            .array::<Self>(inner)
        })
    }
}

impl<T: Described, const N: usize> Described for [T; N] {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        describe_wrapper::<Self, T>(registry, |inner, d| {
            TypeBuilder::of::<Self>(
                format!("{}Array{}", d.name(), N),
                format!("{} array[{}]", d.description(), N),
            )
            .array::<Self>(inner)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_builtins_registers_leaves() {
        let registry = TypeRegistry::with_builtins();
        for name in ["bool", "i32", "u64", "f64", "String", "TypeDescriptor"] {
            assert!(registry.find_by_name(name).is_some(), "missing {}", name);
        }
        assert_eq!(registry.find_by_description("text"), registry.key_of::<String>());
    }

    #[test]
    fn test_wrapper_names() {
        let mut registry = TypeRegistry::new();
        let cases = [
            (registry.ensure::<Option<Box<String>>>().unwrap(), "StringPtr", "text*"),
            (registry.ensure::<Box<u8>>().unwrap(), "u8Box", "boxed 8-bit unsigned integer"),
            (registry.ensure::<Arc<bool>>().unwrap(), "boolShared", "shared boolean"),
            (registry.ensure::<Option<Arc<i8>>>().unwrap(), "i8SharedPtr", "shared 8-bit integer*"),
            (registry.ensure::<Vec<String>>().unwrap(), "StringArray", "text array"),
            (registry.ensure::<VecDeque<char>>().unwrap(), "charDeque", "character deque"),
            (registry.ensure::<[f32; 4]>().unwrap(), "f32Array4", "32-bit float array[4]"),
        ];

        for (key, name, description) in cases {
            let descriptor = registry.get(key).unwrap();
            assert_eq!(descriptor.name(), name);
            assert_eq!(descriptor.description(), description);
        }
    }

    #[test]
    fn test_wrappers_are_parented_to_variants() {
        let mut registry = TypeRegistry::new();
        let pointer = registry.ensure::<Option<Box<i32>>>().unwrap();
        let array = registry.ensure::<Vec<i32>>().unwrap();

        assert_eq!(registry.base(pointer), Some(registry.pointer_type()));
        assert_eq!(registry.base(array), Some(registry.array_type()));
        assert!(!registry.get(pointer).unwrap().is_abstract());
        let boxed = registry.ensure::<Box<i32>>().unwrap();
        assert!(registry.get(boxed).unwrap().is_abstract());
    }

    #[test]
    fn test_leaf_formatters() {
        let registry = TypeRegistry::with_builtins();
        let text = registry.key_of::<String>().unwrap();
        let int = registry.key_of::<i32>().unwrap();
        let float = registry.key_of::<f64>().unwrap();

        assert_eq!(
            registry.format_leaf(text, &String::from("hi")),
            Some("\"hi\"".to_string())
        );
        assert_eq!(registry.format_leaf(int, &-3i32), Some("-3".to_string()));
        assert_eq!(registry.format_leaf(float, &1.5f64), Some("1.5".to_string()));
        assert_eq!(registry.format_leaf(int, &1.5f64), None);
        assert_eq!(registry.format_leaf(registry.root(), &1i32), None);
    }

    #[test]
    fn test_type_key_formats_as_name() {
        let registry = TypeRegistry::new();
        let handle = registry.key_of::<TypeKey>().unwrap();
        let object = registry.object_type();

        assert_eq!(registry.format_leaf(handle, &object), Some("Object".to_string()));
        assert_eq!(
            registry.format_leaf(handle, &TypeKey::default()),
            Some("(null)".to_string())
        );
    }

    #[test]
    fn test_descriptor_fields_are_reflected() {
        let registry = TypeRegistry::with_builtins();
        let ty = registry.key_of::<TypeDescriptor>().unwrap();
        let descriptor = registry.get(registry.object_type()).unwrap();

        let name = registry
            .field(registry.get_field_by_name(ty, "name").unwrap())
            .unwrap();
        let value = name.get(descriptor).unwrap();
        assert_eq!(value.as_any().downcast_ref::<String>().unwrap(), "Object");
        assert!(name.is_readonly());
    }
}
