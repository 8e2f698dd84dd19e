use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DataStruct, DeriveInput, Fields, Ident, LitStr, Type};

use crate::attributes::{CreatorKind, FieldAttributes, TypeAttributes};
use crate::common::BindMeta;

/// A named field of a derived struct.
struct BindField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    /// Member name, before renames and naming strategies.
    member: LitStr,
    attrs: FieldAttributes,
}

impl BindField<'_> {
    #[inline]
    fn is_skipped(&self) -> bool {
        self.attrs.skip.is_some()
    }
}

pub(crate) fn impl_struct(ast: &DeriveInput, data: &DataStruct) -> syn::Result<TokenStream> {
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &ast.ident,
            "`Bind` supports structs with named fields only",
        ));
    };

    if let Some(lifetime) = ast.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "`Bind` types cannot borrow, lifetime parameters are not supported",
        ));
    }

    let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;
    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(ident) = &field.ident else { continue };
        fields.push(BindField {
            ident,
            ty: &field.ty,
            member: LitStr::new(&ident.unraw().to_string(), ident.span()),
            attrs: FieldAttributes::parse_attrs(&field.attrs)?,
        });
    }

    let meta = BindMeta::new(ast, &attrs);
    let vc_bind = meta.vc_bind_path();
    let exports = meta.exports();
    let typed = meta.impl_typed(quote!(bean));
    let (impl_generics, ty_generics, where_clause) = meta.split_generics();
    let ident = &ast.ident;

    let model = class_model(&meta, &attrs, &fields);
    let dependencies = fields
        .iter()
        .filter(|field| !field.is_skipped())
        .map(|field| field.ty);
    let auto_register = meta.auto_register();

    Ok(quote! {
        #typed

        impl #impl_generics #vc_bind::ToValue for #ident #ty_generics #where_clause {
            #[inline]
            fn to_value(&self) -> #vc_bind::Value {
                #vc_bind::Value::Object(#exports::Object::new(::core::clone::Clone::clone(self)))
            }
        }

        impl #impl_generics #vc_bind::FromValue for #ident #ty_generics #where_clause {
            #[inline]
            fn from_value(value: #vc_bind::Value) -> ::core::result::Result<Self, #vc_bind::BindError> {
                #exports::object_from_value::<Self>(value)
            }
        }

        impl #impl_generics #exports::Bindable for #ident #ty_generics #where_clause {
            fn bind_model() -> ::core::option::Option<#exports::BindModel> {
                ::core::option::Option::Some(#exports::BindModel::Class(#model))
            }

            fn register_dependencies(registry: &mut #exports::ClassRegistry) {
                #( registry.register::<#dependencies>(); )*
            }
        }

        #auto_register
    })
}

/// The `ClassModel` builder chain.
fn class_model(meta: &BindMeta<'_>, attrs: &TypeAttributes, fields: &[BindField<'_>]) -> TokenStream {
    let exports = meta.exports();
    let creator = match attrs.creator {
        CreatorKind::Default => quote! {
            .default_creator(<Self as ::core::default::Default>::default)
        },
        CreatorKind::Properties => properties_creator(meta, fields),
    };

    let members = fields.iter().filter(|field| !field.is_skipped()).map(|field| {
        let BindField { ident, ty, member, .. } = field;
        let rename = field.attrs.rename.as_ref().map(|name| quote!(.rename(#member, #name)));
        quote! {
            .field(
                #member,
                |this: &Self| &this.#ident,
                |this: &mut Self, value: #ty| this.#ident = value,
            )
            #rename
        }
    });

    let naming = attrs
        .rename_all
        .as_ref()
        .map(|strategy| quote!(.naming(#exports::NamingStrategy::#strategy)));
    let ignore_unknown = attrs.ignore_unknown.then(|| quote!(.ignore_unknown()));
    let type_id = attrs.type_id.as_ref().map(|id| quote!(.type_id(#id)));
    let ignored = attrs.ignore.iter();

    quote! {
        #exports::ClassModel::builder::<Self>()
            #creator
            #( #members )*
            #( .ignore(#ignored) )*
            #naming
            #ignore_unknown
            #type_id
            .build()
    }
}

/// A creator taking each non-skipped field, in declaration order.
fn properties_creator(meta: &BindMeta<'_>, fields: &[BindField<'_>]) -> TokenStream {
    let exports = meta.exports();
    let creator_name = LitStr::new(&format!("{}::new", meta.name().value()), meta.name().span());

    let params = fields.iter().filter(|field| !field.is_skipped()).map(|field| {
        let BindField { ty, member, .. } = field;
        quote!(.param::<#ty>(#member))
    });

    let mut inits = Vec::with_capacity(fields.len());
    let mut index = 0_usize;
    for field in fields {
        let ident = field.ident;
        if field.is_skipped() {
            inits.push(quote!(#ident: ::core::default::Default::default()));
        } else {
            inits.push(quote!(#ident: args.take(#index)?));
            index += 1;
        }
    }

    quote! {
        .creator(
            #exports::CreatorSpec::new(#creator_name) #( #params )* .properties(),
            |args| ::core::result::Result::Ok(Self { #( #inits, )* }),
        )
    }
}
