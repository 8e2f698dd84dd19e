use proc_macro2::TokenStream;
#[cfg(feature = "auto_register")]
use quote::quote;
use syn::{Generics, Ident};

/// Submits `ident` to `ClassRegistry::auto_register`.
///
/// Generic types are skipped, they have no single descriptor to register.
#[cfg(feature = "auto_register")]
pub(crate) fn auto_register_impl(
    vc_bind_path: &syn::Path,
    ident: &Ident,
    generics: &Generics,
) -> TokenStream {
    if !generics.params.is_empty() {
        return TokenStream::new();
    }
    let auto_register_ = crate::path::auto_register_(vc_bind_path);
    quote! {
        #auto_register_::inventory::submit! {
            #auto_register_::__AutoRegisterFunc(
                <#ident as #auto_register_::__RegisterType>::__register
            )
        }
    }
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn auto_register_impl(_: &syn::Path, _: &Ident, _: &Generics) -> TokenStream {
    TokenStream::new()
}
