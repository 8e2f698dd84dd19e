use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use arc_swap::ArcSwap;
use parking_lot::ReentrantMutex;

use crate::codec::CodecSlot;
use crate::error::BindError;
use crate::hash::HashMap;
use crate::types::TypeDescriptor;

// -----------------------------------------------------------------------------
// Entry

enum Entry<C: ?Sized> {
    Ready(Arc<C>),
    /// A definition error, served again until the cache is flushed.
    Failed(BindError),
}

impl<C: ?Sized> Clone for Entry<C> {
    #[inline]
    fn clone(&self) -> Self {
        match self {
            Self::Ready(codec) => Self::Ready(codec.clone()),
            Self::Failed(err) => Self::Failed(err.clone()),
        }
    }
}

impl<C: ?Sized> Entry<C> {
    #[inline]
    fn into_slot(self) -> Result<CodecSlot<C>, BindError> {
        match self {
            Self::Ready(codec) => Ok(CodecSlot::Strong(codec)),
            Self::Failed(err) => Err(err),
        }
    }
}

struct BuildState<C: ?Sized> {
    depth: usize,
    /// Shells published to the thread building them, not yet linked.
    in_progress: HashMap<TypeDescriptor, Arc<C>>,
    /// Finished entries awaiting the end of the outermost build.
    built: Vec<(TypeDescriptor, Entry<C>)>,
}

impl<C: ?Sized> Default for BuildState<C> {
    fn default() -> Self {
        Self {
            depth: 0,
            in_progress: HashMap::default(),
            built: Vec::new(),
        }
    }
}

/// One level of a build.
///
/// Leaving the level, normally or by unwinding out of a user creator or
/// module callback, drops the unfinished shell and publishes once the
/// outermost level is left.
struct BuildScope<'a, C: ?Sized> {
    cache: &'a CodecCache<C>,
    state: &'a RefCell<BuildState<C>>,
    ty: &'a TypeDescriptor,
}

impl<'a, C: ?Sized> BuildScope<'a, C> {
    fn enter(cache: &'a CodecCache<C>, state: &'a RefCell<BuildState<C>>, ty: &'a TypeDescriptor) -> Self {
        state.borrow_mut().depth += 1;
        Self { cache, state, ty }
    }
}

impl<C: ?Sized> Drop for BuildScope<'_, C> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.in_progress.remove(self.ty).is_some() {
            log::debug!("build of `{}` was abandoned", self.ty);
        }
        state.depth -= 1;
        if state.depth == 0 {
            self.cache.publish(&mut state);
        }
    }
}

// -----------------------------------------------------------------------------
// CodecCache

/// Cache of resolved codecs of one family.
///
/// Lookups read an immutable snapshot and never lock. Builds are serialized
/// by a reentrant lock: a codec linking its properties resolves them on the
/// same thread, and a property whose type is still being built gets a weak
/// reference to the unfinished shell. Entries finished during a build become
/// visible to other threads all at once, when the outermost build returns.
pub struct CodecCache<C: ?Sized> {
    published: ArcSwap<HashMap<TypeDescriptor, Entry<C>>>,
    build: ReentrantMutex<RefCell<BuildState<C>>>,
}

impl<C: ?Sized> Default for CodecCache<C> {
    fn default() -> Self {
        Self {
            published: ArcSwap::from_pointee(HashMap::default()),
            build: ReentrantMutex::new(RefCell::new(BuildState::default())),
        }
    }
}

impl<C: ?Sized> CodecCache<C> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of published entries, failures included.
    #[inline]
    pub fn len(&self) -> usize {
        self.published.load().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn lookup(&self, ty: &TypeDescriptor) -> Option<Entry<C>> {
        self.published.load().get(ty).cloned()
    }

    /// The codec of `ty`, building it on a miss.
    ///
    /// `build` creates the unlinked shell; definition errors it returns are
    /// cached. `link` runs once the shell is visible to reentrant lookups,
    /// and its errors are not cached: the failing nested type caches its own.
    pub fn resolve(
        &self,
        ty: &TypeDescriptor,
        build: impl FnOnce() -> Result<Arc<C>, BindError>,
        link: impl FnOnce(&Arc<C>) -> Result<(), BindError>,
    ) -> Result<CodecSlot<C>, BindError> {
        if let Some(entry) = self.lookup(ty) {
            return entry.into_slot();
        }

        let guard = self.build.lock();
        if let Some(entry) = self.lookup(ty) {
            return entry.into_slot();
        }
        {
            let state = guard.borrow();
            if let Some(shell) = state.in_progress.get(ty) {
                log::trace!("`{ty}` is still being built, linking it weakly");
                return Ok(CodecSlot::Cyclic {
                    codec: Arc::downgrade(shell),
                    ty: ty.clone(),
                });
            }
            if let Some((_, entry)) = state.built.iter().find(|(built, _)| built == ty) {
                return entry.clone().into_slot();
            }
        }

        log::debug!("building codec for `{ty}`");
        let scope = BuildScope::enter(self, &guard, ty);

        // The state is never borrowed across `build` or `link`, both reenter.
        match build() {
            Ok(shell) => {
                scope.state.borrow_mut().in_progress.insert(ty.clone(), shell.clone());
                link(&shell)?;
                let mut state = scope.state.borrow_mut();
                state.in_progress.remove(ty);
                state.built.push((ty.clone(), Entry::Ready(shell.clone())));
                Ok(CodecSlot::Strong(shell))
            }
            Err(err) => {
                if err.is_definition_error() {
                    log::debug!("caching failure of `{ty}`: {err}");
                    scope
                        .state
                        .borrow_mut()
                        .built
                        .push((ty.clone(), Entry::Failed(err.clone())));
                }
                Err(err)
            }
        }
    }

    /// Makes every entry finished by the outermost build visible.
    fn publish(&self, state: &mut BuildState<C>) {
        if state.built.is_empty() {
            return;
        }
        let built = core::mem::take(&mut state.built);
        let count = built.len();
        let mut snapshot = HashMap::clone(&self.published.load());
        snapshot.extend(built);
        self.published.store(Arc::new(snapshot));
        log::debug!("published {count} codec(s), {} cached", self.len());
    }

    /// Drops every published entry.
    ///
    /// Codecs still referenced elsewhere stay usable. Weak references to
    /// flushed codecs are resolved again on their next use.
    pub fn flush(&self) {
        let _guard = self.build.lock();
        self.published.store(Arc::new(HashMap::default()));
    }
}

impl<C: ?Sized> fmt::Debug for CodecCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let published = self.published.load();
        f.debug_struct("CodecCache")
            .field("types", &published.keys().collect::<Vec<_>>())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;
    use core::sync::atomic::{AtomicUsize, Ordering};

    type Cache = CodecCache<TypeDescriptor>;

    fn node() -> TypeDescriptor {
        TypeDescriptor::bean("Node")
    }

    #[test]
    fn builds_once() {
        let cache = Cache::new();
        let builds = AtomicUsize::new(0);
        for _ in 0..3 {
            let slot = cache
                .resolve(
                    &node(),
                    || {
                        builds.fetch_add(1, Ordering::Relaxed);
                        Ok(Arc::new(node()))
                    },
                    |_| Ok(()),
                )
                .unwrap();
            assert!(!slot.is_cyclic());
        }
        assert_eq!(builds.load(Ordering::Relaxed), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reentrant_lookup_is_weak() {
        let cache = Cache::new();
        let slot = cache
            .resolve(
                &node(),
                || Ok(Arc::new(node())),
                |_| {
                    let inner = cache.resolve(&node(), || unreachable!(), |_| unreachable!())?;
                    assert!(inner.is_cyclic());
                    // Not visible outside the build yet.
                    assert!(cache.is_empty());
                    Ok(())
                },
            )
            .unwrap();
        assert!(!slot.is_cyclic());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn nested_builds_publish_together() {
        let cache = Cache::new();
        let leaf = TypeDescriptor::scalar(ScalarKind::I32);
        cache
            .resolve(
                &node(),
                || Ok(Arc::new(node())),
                |_| {
                    cache.resolve(&leaf, || Ok(Arc::new(leaf.clone())), |_| Ok(()))?;
                    assert!(cache.is_empty());
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn definition_errors_are_cached_until_flush() {
        let cache = Cache::new();
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::Relaxed);
            Err(BindError::invalid_definition(&node(), "broken"))
        };
        assert!(cache.resolve(&node(), build, |_| Ok(())).is_err());
        assert!(cache.resolve(&node(), build, |_| Ok(())).is_err());
        assert_eq!(builds.load(Ordering::Relaxed), 1);

        cache.flush();
        assert!(cache.resolve(&node(), build, |_| Ok(())).is_err());
        assert_eq!(builds.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn panicking_builds_leave_the_cache_usable() {
        let cache = Cache::new();
        let leaf = TypeDescriptor::scalar(ScalarKind::I32);
        let unwound = std::panic::catch_unwind(core::panic::AssertUnwindSafe(|| {
            cache.resolve(
                &node(),
                || Ok(Arc::new(node())),
                |_| {
                    cache.resolve(&leaf, || Ok(Arc::new(leaf.clone())), |_| Ok(()))?;
                    panic!("creator blew up");
                },
            )
        }));
        assert!(unwound.is_err());
        // The nested codec finished before the panic and is published.
        assert_eq!(cache.len(), 1);

        let slot = cache.resolve(&node(), || Ok(Arc::new(node())), |_| Ok(())).unwrap();
        assert!(!slot.is_cyclic());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn link_errors_are_not_cached() {
        let cache = Cache::new();
        let err = cache
            .resolve(
                &node(),
                || Ok(Arc::new(node())),
                |_| Err(BindError::custom("link failed")),
            )
            .unwrap_err();
        assert!(!err.is_definition_error());
        assert!(cache.is_empty());

        let slot = cache.resolve(&node(), || Ok(Arc::new(node())), |_| Ok(()));
        assert!(slot.is_ok());
    }
}
