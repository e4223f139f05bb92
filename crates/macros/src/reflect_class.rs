//! Reflect derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Expr, ExprLit, Lit};

use crate::parse::{parse_reflect_class, DefaultExpr, ReflectClassArgs, ReflectFieldArgs};

/// FNV-1a 32-bit hash (compile-time computation in proc macro)
const fn fnv1a_32(data: &[u8]) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
    const FNV_PRIME: u32 = 0x01000193;

    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < data.len() {
        hash ^= data[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Generate the Reflect implementation
pub fn derive_reflect(input: DeriveInput) -> TokenStream {
    match parse_reflect_class(&input) {
        Ok(args) => generate_impl(args),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: ReflectClassArgs) -> TokenStream {
    if !args.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &args.generics,
            "Reflect cannot be derived for generic structs; implement Described by hand",
        )
        .to_compile_error();
    }

    let struct_name = &args.ident;
    let type_name = args.type_name();
    let description = args.type_description();
    let name_hash = fnv1a_32(type_name.as_bytes());

    let fields = match &args.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return syn::Error::new_spanned(struct_name, "Reflect can only be derived for structs")
                .to_compile_error()
        }
    };

    let bases: Vec<&ReflectFieldArgs> = fields.iter().filter(|f| f.base).collect();
    if bases.len() > 1 {
        return syn::Error::new_spanned(
            struct_name,
            "Reflect supports a single #[reflect(base)] field",
        )
        .to_compile_error();
    }
    let base = bases.first().copied();

    let reflect_impl = generate_reflect_impl(struct_name, base);
    let object_impl = base.map(|base| generate_object_impl(struct_name, base));
    let described_impl = generate_described_impl(&args, fields, base);

    quote! {
        impl #struct_name {
            /// Registered descriptor name
            pub const NAME: &'static str = #type_name;

            /// Registered descriptor description
            pub const DESCRIPTION: &'static str = #description;

            /// FNV-1a hash of the descriptor name
            pub const NAME_HASH: u32 = #name_hash;
        }

        #reflect_impl
        #object_impl
        #described_impl
    }
}

fn generate_reflect_impl(
    struct_name: &syn::Ident,
    base: Option<&ReflectFieldArgs>,
) -> TokenStream {
    let object_view = if base.is_some() {
        quote! {
            fn as_object(&self) -> ::std::option::Option<&dyn ::teaspoon_core::object::Object> {
                ::std::option::Option::Some(self)
            }

            fn as_object_mut(
                &mut self,
            ) -> ::std::option::Option<&mut dyn ::teaspoon_core::object::Object> {
                ::std::option::Option::Some(self)
            }
        }
    } else {
        quote! {}
    };

    quote! {
        impl ::teaspoon_core::object::Reflect for #struct_name {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::boxed::Box<Self>,
            ) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            #object_view
        }
    }
}

fn generate_object_impl(struct_name: &syn::Ident, base: &ReflectFieldArgs) -> TokenStream {
    let base_ident = &base.ident;

    quote! {
        impl ::teaspoon_core::object::Object for #struct_name {
            fn object_base(&self) -> &::teaspoon_core::object::ObjectBase {
                ::teaspoon_core::object::Object::object_base(&self.#base_ident)
            }

            fn object_base_mut(&mut self) -> &mut ::teaspoon_core::object::ObjectBase {
                ::teaspoon_core::object::Object::object_base_mut(&mut self.#base_ident)
            }

            fn as_reflect(&self) -> &dyn ::teaspoon_core::object::Reflect {
                self
            }
        }
    }
}

fn generate_described_impl(
    args: &ReflectClassArgs,
    fields: &[ReflectFieldArgs],
    base: Option<&ReflectFieldArgs>,
) -> TokenStream {
    let struct_name = &args.ident;

    let builder = if args.abstract_type {
        quote! { ::teaspoon_core::types::TypeBuilder::of::<Self>(Self::NAME, Self::DESCRIPTION) }
    } else {
        quote! { ::teaspoon_core::types::TypeBuilder::concrete::<Self>(Self::NAME, Self::DESCRIPTION) }
    };

    let register = match base {
        Some(base) => {
            let base_ident = &base.ident;
            let base_ty = &base.ty;
            quote! {
                let base = registry.ensure::<#base_ty>()?;
                let key = registry.register(
                    #builder.inherits::<Self, #base_ty>(
                        base,
                        |object| &object.#base_ident,
                        |object| &mut object.#base_ident,
                    ),
                )?;
            }
        }
        None => quote! {
            let key = registry.register(#builder)?;
        },
    };

    let field_registrations = fields
        .iter()
        .filter(|f| f.is_described())
        .map(generate_field_registration);

    quote! {
        impl ::teaspoon_core::types::Described for #struct_name {
            fn describe(
                registry: &mut ::teaspoon_core::types::TypeRegistry,
            ) -> ::teaspoon_core::error::ReflectResult<::teaspoon_core::types::TypeKey> {
                #register
                #(#field_registrations)*
                ::std::result::Result::Ok(key)
            }
        }
    }
}

fn generate_field_registration(field: &ReflectFieldArgs) -> TokenStream {
    let field_ident = &field.ident;
    let field_ty = &field.ty;
    let field_name = field.field_name();

    let default = field.default.as_ref().map(|DefaultExpr(expr)| {
        let value = default_value(expr);
        quote! { .default_value(|| #value) }
    });
    let readonly = field.readonly.then(|| quote! { .readonly() });

    quote! {
        {
            let value = registry.ensure::<#field_ty>()?;
            registry.register_field(
                ::teaspoon_core::types::FieldBuilder::<Self, #field_ty>::new(
                    key,
                    #field_name,
                    value,
                    |object| &object.#field_ident,
                    |object| &mut object.#field_ident,
                )
                #default
                #readonly,
            )?;
        }
    }
}

/// String literals convert into the field type; anything else is used as is
fn default_value(expr: &Expr) -> TokenStream {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(_), ..
        }) => quote! { ::std::convert::From::from(#expr) },
        _ => quote! { #expr },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_32() {
        assert_eq!(fnv1a_32(b""), 0x811c9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c292c);
    }

    #[test]
    fn test_rejects_generics() {
        let input: DeriveInput = syn::parse_quote! {
            struct Holder<T> {
                value: T,
            }
        };
        let output = derive_reflect(input).to_string();
        assert!(output.contains("compile_error"));
    }

    #[test]
    fn test_rejects_two_bases() {
        let input: DeriveInput = syn::parse_quote! {
            struct Twice {
                #[reflect(base)]
                a: ObjectBase,
                #[reflect(base)]
                b: ObjectBase,
            }
        };
        let output = derive_reflect(input).to_string();
        assert!(output.contains("single"));
    }

    #[test]
    fn test_generates_described() {
        let input: DeriveInput = syn::parse_quote! {
            #[reflect(name = "Actor", description = "actor")]
            struct Actor {
                #[reflect(base)]
                base: ObjectBase,
                #[reflect(default = 100, readonly)]
                health: i32,
                #[reflect(skip)]
                cache: u32,
            }
        };
        let output = derive_reflect(input).to_string();
        assert!(output.contains("Described for Actor"));
        assert!(output.contains("Object for Actor"));
        assert!(output.contains("\"health\""));
        assert!(output.contains("readonly"));
        assert!(!output.contains("\"cache\""));
    }
}
