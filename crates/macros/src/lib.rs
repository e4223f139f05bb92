//! Teaspoon Proc Macros
//!
//! This crate provides `#[derive(Reflect)]`, which describes a struct to a
//! `teaspoon_core::TypeRegistry`.
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
//!
//!     #[reflect(rename = "label", default = "nobody")]
//!     name: String,
//!
//!     #[reflect(skip)]
//!     scratch: Vec<u8>,
//! }
//!
//! // Generated:
//! // - Actor::NAME, Actor::DESCRIPTION, Actor::NAME_HASH
//! // - impl Reflect for Actor
//! // - impl Object for Actor (delegating to `base`)
//! // - impl Described for Actor (registers Actor under Object, then its fields)
//! ```
//!
//! # Attributes
//!
//! ## Struct Attributes
//!
//! - `#[reflect(name = "Name")]` - Descriptor name. Defaults to the struct name.
//! - `#[reflect(description = "text")]` - Description. Defaults to the name.
//! - `#[reflect(abstract_type)]` - Register without a constructor.
//!
//! ## Field Attributes
//!
//! - `#[reflect(base)]` - Embedded parent object; the struct inherits its type.
//! - `#[reflect(skip)]` - Don't describe this field.
//! - `#[reflect(rename = "name")]` - Reflected field name.
//! - `#[reflect(default = expr)]` - Value applied when instances are created.
//! - `#[reflect(readonly)]` - Refuse mutable access through reflection.

mod parse;
mod reflect_class;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for reflectable structs
///
/// # Generated Code
///
/// - `NAME`, `DESCRIPTION` and `NAME_HASH` constants
/// - A `Reflect` implementation
/// - An `Object` implementation when a field is marked `base`
/// - A `Described` implementation registering the struct and its fields
///
/// Every described field type must itself implement `Described`. Concrete
/// structs must implement `Default`; mark the struct `abstract_type` to opt
/// out of construction through the registry.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    reflect_class::derive_reflect(input).into()
}
