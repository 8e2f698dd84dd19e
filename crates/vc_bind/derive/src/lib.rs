//! Derive macro of `vc_bind`, see [`Bind`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{Data, DeriveInput, parse_macro_input};

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod auto_register;
mod bind_enum;
mod bind_struct;
mod common;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Bind Derivation
///
/// `#[derive(Bind)]` implements `Typed`, `ToValue`, `FromValue` and
/// `Bindable`, so the type can be registered in a `ClassRegistry`.
///
/// ## Structs
///
/// Structs must have named fields and implement `Clone`, `Debug`, `Send`
/// and `Sync`. Every field is a property, read and written directly.
///
/// ```rust, ignore
/// #[derive(Bind, Clone, Debug, Default)]
/// #[bind(rename_all = "camelCase", ignore_unknown)]
/// struct Account {
///     user_id: u64,
///     #[bind(rename = "mail")]
///     email: String,
///     #[bind(skip)]
///     session: Option<String>,
/// }
/// ```
///
/// By default an instance is made with `Default::default()` and filled
/// property by property. With `#[bind(creator = "properties")]` the
/// non-skipped fields become the named arguments of a creator instead, and
/// `Default` is only needed by the skipped fields.
///
/// Container attributes:
///
/// - `name = "..."`: the type name, the identifier by default.
/// - `creator = "default" | "properties"`
/// - `ignore_unknown`: skip unknown properties instead of failing.
/// - `rename_all = "..."`: naming strategy of members without `rename`,
///   one of `camelCase`, `PascalCase`, `snake_case`, `kebab-case`,
///   `SCREAMING_SNAKE_CASE`, `lowercase`.
/// - `ignore = "..."`: a property dropped silently, may be repeated.
/// - `type_id = "..."`: id written when the type appears under an
///   abstract declaration.
///
/// Field attributes: `rename = "..."` and `skip`.
///
/// Type parameters must be bindable themselves; the descriptor of
/// `Page<User>` carries `User`'s.
///
/// ## Enums
///
/// Enums must have unit variants only, each bound by name. Variants accept
/// `rename`.
///
/// ```rust, ignore
/// #[derive(Bind, Clone, Copy, Debug)]
/// enum Level {
///     Low,
///     #[bind(rename = "HIGH")]
///     High,
/// }
/// ```
///
/// ## Auto Register
///
/// With the `auto_register` feature, non-generic types are submitted to
/// `ClassRegistry::auto_register`.
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let result = match &ast.data {
        Data::Struct(data) => bind_struct::impl_struct(&ast, data),
        Data::Enum(data) => bind_enum::impl_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast.ident,
            "`Bind` cannot be derived for unions",
        )),
    };

    match result {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
