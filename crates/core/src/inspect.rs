//! Diagnostic dump of object graphs
//!
//! Walks an instance using nothing but its descriptors and prints one line
//! per value, indented four spaces per level:
//!
//! ```text
//! actor
//!     type = Actor
//!     health = 100
//!     name = "bob"
//!     inventory
//!         item
//!             type = Item
//! ```
//!
//! Pointers are followed one level, objects print with their live type
//! rather than the declared one, leaves print through their formatter,
//! arrays list their elements and everything else lists its fields along
//! the base chain, closest type first.

use std::fmt::{self, Write};

use tracing::trace;

use crate::config::InspectConfig;
use crate::object::Reflect;
use crate::types::{TypeKey, TypeRegistry};

/// Levels printed when no limit is configured
pub const DEFAULT_MAX_DEPTH: usize = 10;

const INDENT_STEP: usize = 4;

const MISSING_TYPE: &str =
    "Error: type = (null). create objects through TypeRegistry::create_instance";

/// Write the value tree of `value`, described by `ty`, to `out`
///
/// # Arguments
/// * `ty` - Declared type of `value`; `None` prints an error line
/// * `value` - Instance storage, `None` for a null value
/// * `max_depth` - Number of levels printed before the walk stops
pub fn write_object_hierarchy<W: Write>(
    out: &mut W,
    registry: &TypeRegistry,
    ty: Option<TypeKey>,
    value: Option<&dyn Reflect>,
    max_depth: usize,
) -> fmt::Result {
    Walker {
        registry,
        max_depth,
    }
    .write(out, ty, value, 0)
}

/// The value tree of `value` as a string
pub fn object_hierarchy(
    registry: &TypeRegistry,
    ty: Option<TypeKey>,
    value: Option<&dyn Reflect>,
    max_depth: usize,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_object_hierarchy(&mut out, registry, ty, value, max_depth);
    out
}

/// Inspector bound to a registry and a depth limit
#[derive(Debug, Clone, Copy)]
pub struct Inspector<'r> {
    registry: &'r TypeRegistry,
    max_depth: usize,
}

impl<'r> Inspector<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_config(registry: &'r TypeRegistry, config: &InspectConfig) -> Self {
        Self {
            registry,
            max_depth: config.max_depth,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Dump an object using its own live type
    pub fn object(&self, value: &dyn Reflect) -> String {
        object_hierarchy(self.registry, value.live_type(), Some(value), self.max_depth)
    }

    /// Dump a value of declared type `ty`
    pub fn value(&self, ty: TypeKey, value: &dyn Reflect) -> String {
        object_hierarchy(self.registry, Some(ty), Some(value), self.max_depth)
    }

    pub fn write<W: Write>(
        &self,
        out: &mut W,
        ty: Option<TypeKey>,
        value: Option<&dyn Reflect>,
    ) -> fmt::Result {
        write_object_hierarchy(out, self.registry, ty, value, self.max_depth)
    }
}

struct Walker<'r> {
    registry: &'r TypeRegistry,
    max_depth: usize,
}

impl Walker<'_> {
    fn write<W: Write>(
        &self,
        out: &mut W,
        ty: Option<TypeKey>,
        value: Option<&dyn Reflect>,
        depth: usize,
    ) -> fmt::Result {
        if depth >= self.max_depth {
            trace!("Inspection stopped at depth {}", depth);
            return Ok(());
        }

        let Some(descriptor) = ty.and_then(|key| self.registry.get(key)) else {
            return writeln!(out, "{}", MISSING_TYPE);
        };

        write!(out, "{:indent$}", "", indent = depth * INDENT_STEP)?;
        out.write_str(descriptor.description())?;

        let (ty, value) = self.resolve(descriptor.key(), value);
        let Some(value) = value else {
            return out.write_str(" = (null)\n");
        };
        if value.as_object().is_some() && value.live_type().is_none() {
            return writeln!(out, " = {}", MISSING_TYPE);
        }

        if let Some(text) = self.registry.format_leaf(ty, value) {
            return writeln!(out, " = {}", text);
        }
        out.write_char('\n')?;

        if let Some(array) = self.registry.array(ty) {
            let Some(member) = array.member_type() else {
                return Ok(());
            };
            for index in 0..array.count(value) {
                let (child_ty, child) = self.resolve(member, array.child_at(value, index));
                self.write(out, Some(child_ty), child, depth + 1)?;
            }
            return Ok(());
        }

        for ancestor in self.registry.ancestors(ty) {
            for field in self.registry.fields(ancestor) {
                let child = field.get_from(value, ty);
                self.write(out, Some(field.key()), child, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Follow one pointer level, then let an object's live type take over
    fn resolve<'v>(
        &self,
        ty: TypeKey,
        value: Option<&'v dyn Reflect>,
    ) -> (TypeKey, Option<&'v dyn Reflect>) {
        let (ty, value) = match self.registry.pointer(ty) {
            Some(pointer) => (
                pointer.dereferenced().unwrap_or(ty),
                value.and_then(|value| pointer.deref(value)),
            ),
            None => (ty, value),
        };

        match value.and_then(|value| value.live_type()) {
            Some(live) if self.registry.is(ty, self.registry.object_type()) => (live, value),
            _ => (ty, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectBase;

    #[test]
    fn test_missing_type_prints_error() {
        let registry = TypeRegistry::new();
        let text = object_hierarchy(&registry, None, None, DEFAULT_MAX_DEPTH);
        assert!(text.starts_with("Error: type = (null)"));
    }

    #[test]
    fn test_scalar_leaf() {
        let mut registry = TypeRegistry::new();
        let int = registry.ensure::<i32>().unwrap();
        let text = Inspector::new(&registry).value(int, &42i32);
        assert_eq!(text, "32-bit integer = 42\n");
    }

    #[test]
    fn test_string_leaf_is_quoted() {
        let mut registry = TypeRegistry::new();
        let key = registry.ensure::<String>().unwrap();
        let text = Inspector::new(&registry).value(key, &String::from("bob"));
        assert_eq!(text, "text = \"bob\"\n");
    }

    #[test]
    fn test_object_prints_type_field() {
        let registry = TypeRegistry::new();
        let mut base = ObjectBase::default();
        base.bind(registry.object_type());

        let text = Inspector::new(&registry).object(&base);
        assert_eq!(text, "typed object\n    type = Object\n");
    }

    #[test]
    fn test_array_elements() {
        let mut registry = TypeRegistry::new();
        let key = registry.ensure::<Vec<i32>>().unwrap();
        let text = Inspector::new(&registry).value(key, &vec![1, 2, 3]);
        assert_eq!(
            text,
            concat!(
                "32-bit integer array\n",
                "    32-bit integer = 1\n",
                "    32-bit integer = 2\n",
                "    32-bit integer = 3\n",
            )
        );
    }

    #[test]
    fn test_pointer_followed_once() {
        let mut registry = TypeRegistry::new();
        let key = registry.ensure::<Option<Box<i32>>>().unwrap();
        let inspector = Inspector::new(&registry);

        assert_eq!(inspector.value(key, &Some(Box::new(7))), "32-bit integer* = 7\n");
        assert_eq!(inspector.value(key, &None::<Box<i32>>), "32-bit integer* = (null)\n");
    }

    #[test]
    fn test_pointer_array_members() {
        let mut registry = TypeRegistry::new();
        let key = registry.ensure::<Vec<Option<Box<i32>>>>().unwrap();
        let value = vec![Some(Box::new(1)), None];

        let text = Inspector::new(&registry).value(key, &value);
        assert_eq!(
            text,
            concat!(
                "32-bit integer* array\n",
                "    32-bit integer = 1\n",
                "    32-bit integer = (null)\n",
            )
        );
    }

    #[test]
    fn test_unbound_member_prints_error() {
        let mut registry = TypeRegistry::new();
        let key = registry.ensure::<Vec<ObjectBase>>().unwrap();
        let text = Inspector::new(&registry).value(key, &vec![ObjectBase::default()]);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("    typed object = Error: type = (null)"));
    }

    #[test]
    fn test_max_depth() {
        let registry = TypeRegistry::new();
        let mut base = ObjectBase::default();
        base.bind(registry.object_type());

        let inspector = Inspector::new(&registry);
        assert_eq!(inspector.with_max_depth(1).object(&base), "typed object\n");
        assert_eq!(inspector.with_max_depth(0).object(&base), "");
    }

    #[test]
    fn test_depth_from_config() {
        let registry = TypeRegistry::new();
        let config = InspectConfig { max_depth: 1 };
        let mut base = ObjectBase::default();
        base.bind(registry.object_type());

        let text = Inspector::from_config(&registry, &config).object(&base);
        assert_eq!(text, "typed object\n");
    }
}
