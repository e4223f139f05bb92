//! Attribute parsing for the Reflect derive macro

use darling::{FromDeriveInput, FromField, FromMeta};
use syn::{DeriveInput, Expr, Generics, Ident, Type};

/// Parsed #[reflect(...)] attributes on the struct
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(reflect), supports(struct_named))]
pub struct ReflectClassArgs {
    /// Struct identifier
    pub ident: Ident,

    /// Struct generics, rejected during generation
    pub generics: Generics,

    /// Struct fields
    pub data: darling::ast::Data<(), ReflectFieldArgs>,

    /// Descriptor name (defaults to the struct name)
    #[darling(default)]
    pub name: Option<String>,

    /// Descriptor description (defaults to the descriptor name)
    #[darling(default)]
    pub description: Option<String>,

    /// Register without a constructor; the struct need not be `Default`
    #[darling(default)]
    pub abstract_type: bool,
}

impl ReflectClassArgs {
    pub fn type_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.ident.to_string())
    }

    pub fn type_description(&self) -> String {
        self.description.clone().unwrap_or_else(|| self.type_name())
    }
}

/// Default value expression, taken verbatim
///
/// String literals are kept as literals rather than parsed as code, so
/// `default = "bob"` means the text `bob`.
#[derive(Debug, Clone)]
pub struct DefaultExpr(pub Expr);

impl FromMeta for DefaultExpr {
    fn from_expr(expr: &Expr) -> darling::Result<Self> {
        Ok(Self(expr.clone()))
    }
}

/// Parsed #[reflect(...)] attributes on a field
#[derive(Debug, FromField)]
#[darling(attributes(reflect))]
pub struct ReflectFieldArgs {
    /// Field identifier
    pub ident: Option<Ident>,

    /// Field type
    pub ty: Type,

    /// Field holds the embedded parent object
    #[darling(default)]
    pub base: bool,

    /// Field is not described
    #[darling(default)]
    pub skip: bool,

    /// Reflected field name (defaults to the Rust field name)
    #[darling(default)]
    pub rename: Option<String>,

    /// Value applied when instances are created
    #[darling(default)]
    pub default: Option<DefaultExpr>,

    /// Refuse mutable access through reflection
    #[darling(default)]
    pub readonly: bool,
}

impl ReflectFieldArgs {
    /// Check if this field gets its own field descriptor
    pub fn is_described(&self) -> bool {
        !self.base && !self.skip
    }

    /// Name the field is registered under
    pub fn field_name(&self) -> String {
        match (&self.rename, &self.ident) {
            (Some(rename), _) => rename.clone(),
            (None, Some(ident)) => ident.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// Parse a DeriveInput into ReflectClassArgs
pub fn parse_reflect_class(input: &DeriveInput) -> darling::Result<ReflectClassArgs> {
    ReflectClassArgs::from_derive_input(input)
}
