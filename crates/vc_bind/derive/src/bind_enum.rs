use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DataEnum, DeriveInput, Fields, LitStr};

use crate::attributes::{FieldAttributes, TypeAttributes};
use crate::common::BindMeta;

pub(crate) fn impl_enum(ast: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream> {
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "`Bind` enums cannot be generic",
        ));
    }
    let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;
    if let Some(span) = attrs.creator_span {
        return Err(syn::Error::new(span, "enums have no creators"));
    }
    if attrs.rename_all.is_some()
        || attrs.ignore_unknown
        || attrs.type_id.is_some()
        || !attrs.ignore.is_empty()
    {
        return Err(syn::Error::new_spanned(
            &ast.ident,
            "enums accept only the `name` container attribute",
        ));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.ident,
            "`Bind` enums need at least one variant",
        ));
    }

    let mut variants = Vec::with_capacity(data.variants.len());
    let mut names = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "`Bind` supports unit variants only",
            ));
        }
        let variant_attrs = FieldAttributes::parse_attrs(&variant.attrs)?;
        if let Some(span) = variant_attrs.skip {
            return Err(syn::Error::new(span, "variants cannot be skipped"));
        }
        names.push(
            variant_attrs
                .rename
                .unwrap_or_else(|| LitStr::new(&variant.ident.unraw().to_string(), variant.ident.span())),
        );
        variants.push(&variant.ident);
    }

    let meta = BindMeta::new(ast, &attrs);
    let vc_bind = meta.vc_bind_path();
    let exports = meta.exports();
    let typed = meta.impl_typed(quote!(enumeration));
    let auto_register = meta.auto_register();
    let ident = &ast.ident;
    let indices = 0..variants.len();
    let to_value = variants.iter().zip(&names).enumerate().map(|(index, (variant, name))| {
        quote!(Self::#variant => #exports::enum_to_value::<Self>(#index, #name))
    });

    Ok(quote! {
        #typed

        impl #vc_bind::ToValue for #ident {
            fn to_value(&self) -> #vc_bind::Value {
                match self {
                    #( #to_value, )*
                }
            }
        }

        impl #vc_bind::FromValue for #ident {
            fn from_value(value: #vc_bind::Value) -> ::core::result::Result<Self, #vc_bind::BindError> {
                const NAMES: &[&str] = &[#( #names ),*];
                match #exports::enum_index::<Self>(&value, NAMES)? {
                    #( #indices => ::core::result::Result::Ok(Self::#variants), )*
                    _ => ::core::result::Result::Err(#exports::unknown_constant::<Self>(&value)),
                }
            }
        }

        impl #exports::Bindable for #ident {
            fn bind_model() -> ::core::option::Option<#exports::BindModel> {
                ::core::option::Option::Some(#exports::BindModel::Enum(
                    #exports::EnumModel::of::<Self>([#( #names ),*]),
                ))
            }
        }

        #auto_register
    })
}
