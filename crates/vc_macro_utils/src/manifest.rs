use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

const UMBRELLA_NAME: &str = "vc_databind";
const WORKSPACE_PREFIX: &str = "vc_";

/// The `Cargo.toml` of the crate invoking a macro.
///
/// Generated code must name the workspace crates the way the invoking crate
/// can reach them, which depends on what it depends on.
///
/// # Example
///
/// ```rust
/// # use vc_macro_utils::Manifest;
/// let path: syn::Path = Manifest::shared(|m| m.get_crate_path("vc_bind"));
/// ```
///
/// # Resolution rules
///
/// 1. A crate listed in `dependencies` is named `::crate_name`.
/// 2. A `vc_` crate reached through the umbrella crate `vc_databind` is
///    named `::vc_databind::short_name` (`vc_bind` becomes
///    `::vc_databind::bind`).
/// 3. Rules 1 and 2 are repeated for `dev-dependencies`.
/// 4. Anything else falls back to `::crate_name`.
///
/// A crate naming itself from its own tests should declare
/// `extern crate self as crate_name;` so that rule 4 holds there too.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

impl Manifest {
    #[inline(never)]
    fn manifest_path() -> PathBuf {
        let Some(dir) = env::var_os("CARGO_MANIFEST_DIR") else {
            panic!("CARGO_MANIFEST_DIR is not set, macros must be expanded by cargo");
        };
        let path = PathBuf::from(dir).join("Cargo.toml");
        assert!(path.exists(), "no cargo manifest at {}", path.display());
        path
    }

    #[inline(never)]
    fn modified_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified()).ok()
    }

    #[inline(never)]
    fn read(path: &Path) -> Document<Box<str>> {
        let text = std::fs::read_to_string(path)
            .unwrap_or_else(|err| panic!("cannot read {}: {err}", path.display()))
            .into_boxed_str();
        Document::parse(text)
            .unwrap_or_else(|err| panic!("cannot parse {}: {err}", path.display()))
    }

    fn parse_path(path: &str) -> syn::Path {
        syn::parse_str(path).unwrap_or_else(|err| panic!("`{path}` is not a path: {err}"))
    }

    fn find_in(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::parse_path(&format!("::{name}")));
        }
        let short = name.strip_prefix(WORKSPACE_PREFIX)?;
        deps.contains_key(UMBRELLA_NAME)
            .then(|| Self::parse_path(&format!("::{UMBRELLA_NAME}::{short}")))
    }

    /// The path of crate `name` as seen from the invoking crate.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        ["dependencies", "dev-dependencies"]
            .into_iter()
            .filter_map(|table| match self.manifest.get(table) {
                Some(Item::Table(deps)) => Self::find_in(deps, name),
                _ => None,
            })
            .next()
            .unwrap_or_else(|| Self::parse_path(&format!("::{name}")))
    }

    /// Runs `func` on the invoking crate's manifest.
    ///
    /// Manifests are parsed once per path and kept until the file changes.
    /// Callers should still resolve their paths once per macro invocation.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let path = Self::manifest_path();
        let modified_time = Self::modified_time(&path).unwrap_or(SystemTime::UNIX_EPOCH);

        {
            let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(manifest) = manifests.get(&path)
                && manifest.modified_time == modified_time
            {
                return func(manifest);
            }
        }

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);
        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);
        result
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;

    fn manifest(text: &str) -> Manifest {
        Manifest {
            manifest: Document::parse(Box::<str>::from(text)).unwrap(),
            modified_time: SystemTime::UNIX_EPOCH,
        }
    }

    fn resolve(text: &str, name: &str) -> String {
        manifest(text)
            .get_crate_path(name)
            .to_token_stream()
            .to_string()
            .replace(' ', "")
    }

    #[test]
    fn direct_dependency() {
        assert_eq!(resolve("[dependencies]\nvc_bind = \"0.0\"\n", "vc_bind"), "::vc_bind");
    }

    #[test]
    fn through_umbrella() {
        let text = "[dependencies]\nvc_databind = \"0.0\"\n";
        assert_eq!(resolve(text, "vc_bind"), "::vc_databind::bind");
        assert_eq!(resolve(text, "serde"), "::serde");
    }

    #[test]
    fn dev_dependencies() {
        let text = "[dev-dependencies]\nvc_databind = \"0.0\"\n";
        assert_eq!(resolve(text, "vc_token"), "::vc_databind::token");
    }
}
