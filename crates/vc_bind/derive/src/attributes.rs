//! Parsing of `#[bind(...)]` attributes.

use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Ident, LitStr};

pub(crate) const BIND_ATTRIBUTE_NAME: &str = "bind";

/// How a derived struct is instantiated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum CreatorKind {
    /// `Default::default()`, then one setter call per property.
    #[default]
    Default,
    /// A creator taking every non-skipped field as a named argument.
    Properties,
}

fn for_each_bind_attr(
    attrs: &[Attribute],
    mut parse: impl FnMut(ParseNestedMeta<'_>) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs {
        if attr.path().is_ident(BIND_ATTRIBUTE_NAME) {
            attr.parse_nested_meta(&mut parse)?;
        }
    }
    Ok(())
}

/// `NamingStrategy` variant spelled by `rename_all`.
fn naming_variant(lit: &LitStr) -> syn::Result<Ident> {
    let variant = match lit.value().as_str() {
        "camelCase" => "LowerCamelCase",
        "PascalCase" => "UpperCamelCase",
        "snake_case" => "SnakeCase",
        "kebab-case" => "KebabCase",
        "SCREAMING_SNAKE_CASE" => "ShoutySnakeCase",
        "lowercase" => "LowerCase",
        _ => {
            return Err(syn::Error::new(
                lit.span(),
                "expected one of `camelCase`, `PascalCase`, `snake_case`, `kebab-case`, \
                 `SCREAMING_SNAKE_CASE`, `lowercase`",
            ));
        }
    };
    Ok(Ident::new(variant, lit.span()))
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// Container attributes.
#[derive(Debug, Default)]
pub(crate) struct TypeAttributes {
    /// Type name, the Rust identifier by default.
    pub name: Option<LitStr>,
    pub creator: CreatorKind,
    /// Span of an explicit `creator`, for errors on enums.
    pub creator_span: Option<Span>,
    pub ignore_unknown: bool,
    pub rename_all: Option<Ident>,
    pub type_id: Option<LitStr>,
    pub ignore: Vec<LitStr>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for_each_bind_attr(attrs, |meta| {
            if meta.path.is_ident("name") {
                parsed.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("creator") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.creator = match lit.value().as_str() {
                    "default" => CreatorKind::Default,
                    "properties" => CreatorKind::Properties,
                    _ => {
                        return Err(syn::Error::new(
                            lit.span(),
                            "expected `default` or `properties`",
                        ));
                    }
                };
                parsed.creator_span = Some(lit.span());
            } else if meta.path.is_ident("ignore_unknown") {
                parsed.ignore_unknown = true;
            } else if meta.path.is_ident("rename_all") {
                parsed.rename_all = Some(naming_variant(&meta.value()?.parse()?)?);
            } else if meta.path.is_ident("type_id") {
                parsed.type_id = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("ignore") {
                parsed.ignore.push(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown container attribute"));
            }
            Ok(())
        })?;
        Ok(parsed)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// Field and variant attributes.
#[derive(Debug, Default)]
pub(crate) struct FieldAttributes {
    pub rename: Option<LitStr>,
    pub skip: Option<Span>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for_each_bind_attr(attrs, |meta| {
            if meta.path.is_ident("rename") {
                parsed.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("skip") {
                parsed.skip = Some(meta.path.span());
            } else {
                return Err(meta.error("unknown field attribute"));
            }
            Ok(())
        })?;
        Ok(parsed)
    }
}
