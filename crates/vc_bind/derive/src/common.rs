use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DeriveInput, Generics, ImplGenerics, LitStr, TypeGenerics, WhereClause, parse_quote};

use crate::attributes::TypeAttributes;

/// What every derived impl needs: paths, the bound name and the generics.
pub(crate) struct BindMeta<'a> {
    ast: &'a DeriveInput,
    vc_bind_path: syn::Path,
    exports: TokenStream,
    name: LitStr,
    /// The input generics, each type parameter bounded by `BindParam`.
    generics: Generics,
}

impl<'a> BindMeta<'a> {
    pub fn new(ast: &'a DeriveInput, attrs: &TypeAttributes) -> Self {
        let vc_bind_path = crate::path::vc_bind();
        let exports = crate::path::macro_exports_(&vc_bind_path);
        let name = attrs
            .name
            .clone()
            .unwrap_or_else(|| LitStr::new(&ast.ident.unraw().to_string(), ast.ident.span()));

        let mut generics = ast.generics.clone();
        let params: Vec<_> = generics.type_params().map(|param| param.ident.clone()).collect();
        if !params.is_empty() {
            let where_clause = generics.make_where_clause();
            for param in params {
                where_clause
                    .predicates
                    .push(parse_quote!(#param: #exports::BindParam));
            }
        }

        Self {
            ast,
            vc_bind_path,
            exports,
            name,
            generics,
        }
    }

    #[inline]
    pub fn vc_bind_path(&self) -> &syn::Path {
        &self.vc_bind_path
    }

    /// `vc_bind::__macro_exports`
    #[inline]
    pub fn exports(&self) -> &TokenStream {
        &self.exports
    }

    #[inline]
    pub fn name(&self) -> &LitStr {
        &self.name
    }

    #[inline]
    pub fn split_generics(&self) -> (ImplGenerics<'_>, TypeGenerics<'_>, Option<&WhereClause>) {
        self.generics.split_for_impl()
    }

    /// `Typed`, through `TypeDescriptor::#constructor` for plain types.
    ///
    /// Generic types carry their parameters' descriptors.
    pub fn impl_typed(&self, constructor: TokenStream) -> TokenStream {
        let vc_bind = &self.vc_bind_path;
        let exports = &self.exports;
        let ident = &self.ast.ident;
        let name = &self.name;
        let (impl_generics, ty_generics, where_clause) = self.split_generics();

        let params: Vec<_> = self.ast.generics.type_params().map(|param| &param.ident).collect();
        let descriptor = if params.is_empty() {
            quote!(#vc_bind::TypeDescriptor::#constructor(#name))
        } else {
            quote! {
                #exports::generic_bean(
                    #name,
                    [#( <#params as #vc_bind::Typed>::type_descriptor() ),*],
                )
            }
        };

        quote! {
            impl #impl_generics #vc_bind::Typed for #ident #ty_generics #where_clause {
                #[inline]
                fn type_descriptor() -> #vc_bind::TypeDescriptor {
                    #descriptor
                }
            }
        }
    }

    #[inline]
    pub fn auto_register(&self) -> TokenStream {
        crate::auto_register::auto_register_impl(
            &self.vc_bind_path,
            &self.ast.ident,
            &self.ast.generics,
        )
    }
}
