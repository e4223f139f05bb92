//! Type hierarchy listing
//!
//! Prints every registered descriptor as a tree: each line holds the type
//! name followed by the descriptions of its own fields, and children are
//! listed in registration order, indented four more spaces than their base.
//! Field descriptors show up under their value type.
//!
//! ```text
//!     Type
//!         TypeKey
//!             Object.type
//!         Object ( type )
//!             Actor ( health name )
//! ```

use std::fmt::{self, Write};

use super::descriptor::TypeKey;
use super::TypeRegistry;

const INDENT_STEP: usize = 4;

impl TypeRegistry {
    /// Write the full type hierarchy to `out`
    pub fn write_hierarchy<W: Write>(&self, out: &mut W) -> fmt::Result {
        self.write_children(out, None, INDENT_STEP)
    }

    /// The full type hierarchy as a string
    pub fn hierarchy(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_hierarchy(&mut out);
        out
    }

    fn write_children<W: Write>(
        &self,
        out: &mut W,
        parent: Option<TypeKey>,
        indent: usize,
    ) -> fmt::Result {
        for descriptor in self.iter() {
            if descriptor.base() != parent {
                continue;
            }
            write!(out, "{:indent$}{} ", "", descriptor.name(), indent = indent)?;
            if !descriptor.fields().is_empty() {
                out.write_str("( ")?;
                for field in descriptor.fields() {
                    if let Some(field) = self.get(*field) {
                        write!(out, "{} ", field.description())?;
                    }
                }
                out.write_char(')')?;
            }
            out.write_char('\n')?;
            self.write_children(out, Some(descriptor.key()), indent + INDENT_STEP)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldBuilder, TypeBuilder};

    #[test]
    fn test_kernel_hierarchy() {
        let registry = TypeRegistry::new();
        let expected = concat!(
            "    Type \n",
            "        Pointer \n",
            "        Array \n",
            "        TypeKey \n",
            "            Object.type \n",
            "        Object ( type )\n",
        );
        assert_eq!(registry.hierarchy(), expected);
    }

    #[test]
    fn test_children_in_registration_order() {
        let mut registry = TypeRegistry::new();
        let object = registry.object_type();
        let int = registry.ensure::<i32>().unwrap();
        let animal = registry
            .register(TypeBuilder::new("Animal", "animal").base(object))
            .unwrap();
        registry
            .register(TypeBuilder::new("Dog", "dog").base(animal))
            .unwrap();
        registry
            .register(TypeBuilder::new("Cat", "cat").base(animal))
            .unwrap();
        registry
            .register_field(FieldBuilder::<i32, i32>::new(
                animal,
                "legs",
                int,
                |v| v,
                |v| v,
            ))
            .unwrap();

        let listing = registry.hierarchy();
        let lines: Vec<&str> = listing.lines().collect();
        let animal_line = lines
            .iter()
            .position(|line| line.trim_start().starts_with("Animal ("))
            .unwrap();

        assert_eq!(lines[animal_line], "            Animal ( legs )");
        assert_eq!(lines[animal_line + 1], "                Dog ");
        assert_eq!(lines[animal_line + 2], "                Cat ");
        assert!(lines.contains(&"        i32 "));
        assert!(lines.contains(&"            Animal.legs "));
    }
}
