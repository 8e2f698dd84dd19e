//! Paths of the items generated code refers to.

use proc_macro2::TokenStream;
use quote::quote;

/// The path of `vc_bind` as seen from the invoking crate.
///
/// Reads the invoking crate's manifest, so it is resolved once per
/// invocation and passed around.
pub(crate) fn vc_bind() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_bind"))
}

#[inline(always)]
pub(crate) fn macro_exports_(vc_bind_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_bind_path::__macro_exports
    }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(vc_bind_path: &syn::Path) -> TokenStream {
    quote! {
        #vc_bind_path::__macro_exports::auto_register
    }
}
