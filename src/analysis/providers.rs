//! The built-in providers: an in-memory class set, an adapter over
//! any class byte source, and the caching decorator the others are
//! meant to be wrapped in.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::warn;

use crate::analysis::{ClassInfo, InheritanceProvider};
use crate::class;
use crate::source::ClassSource;

/// A shared registry of already-built class snapshots.
#[derive(Debug, Default)]
pub struct ClassSet {
    classes: RwLock<HashMap<String, Arc<ClassInfo>>>,
}

impl ClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a snapshot under its own name, replacing any earlier
    /// snapshot of that name.
    pub fn add(&self, info: Arc<ClassInfo>) {
        self.classes
            .write()
            .insert(info.name().to_owned(), info);
    }

    pub fn get(&self, class_name: &str) -> Option<Arc<ClassInfo>> {
        self.classes.read().get(class_name).cloned()
    }

    pub fn has(&self, class_name: &str) -> bool {
        self.classes.read().contains_key(class_name)
    }

    pub fn names(&self) -> Vec<String> {
        self.classes.read().keys().cloned().collect()
    }
}

/// Provides classes out of an explicit, in-memory [`ClassSet`].
#[derive(Debug)]
pub struct ClassSetInheritanceProvider {
    classes: Arc<ClassSet>,
}

impl ClassSetInheritanceProvider {
    pub fn new(classes: Arc<ClassSet>) -> Self {
        Self { classes }
    }
}

impl InheritanceProvider for ClassSetInheritanceProvider {
    fn provide(&self, class_name: &str) -> Option<Arc<ClassInfo>> {
        self.classes.get(class_name)
    }

    fn provide_with_hint(&self, class_name: &str, hint: &dyn Any) -> Option<Arc<ClassInfo>> {
        // an already-resolved snapshot needs no lookup at all
        if let Some(info) = hint.downcast_ref::<Arc<ClassInfo>>() {
            return Some(Arc::clone(info));
        }
        self.provide(class_name)
    }
}

/// Provides classes by loading bytes from a [`ClassSource`] and
/// decoding their declared facts.
///
/// Unreadable or corrupt class files are reported as unknown, so a
/// resolution walk over a damaged classpath degrades to a partial
/// result instead of failing.
pub struct ClassSourceInheritanceProvider<S> {
    source: S,
}

impl<S: ClassSource> ClassSourceInheritanceProvider<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: ClassSource> InheritanceProvider for ClassSourceInheritanceProvider<S> {
    fn provide(&self, class_name: &str) -> Option<Arc<ClassInfo>> {
        let bytes = self.source.class_bytes(class_name)?;
        let raw = match class::read_class(&bytes) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(class = class_name, %err, "discarding unreadable class file");
                return None;
            }
        };
        match ClassInfo::of_class(&raw) {
            Ok(info) => Some(Arc::new(info)),
            Err(err) => {
                warn!(class = class_name, %err, "discarding class with bad descriptor");
                None
            }
        }
    }
}

/// Caches another provider's answers, including the negative ones.
///
/// Each distinct class name hits the wrapped provider at most once
/// per decorator instance; concurrent requests for a name that is not
/// cached yet share a single fetch.
pub struct CachingInheritanceProvider<P> {
    inner: P,
    cache: DashMap<String, Arc<OnceCell<Option<Arc<ClassInfo>>>>>,
}

impl<P: InheritanceProvider> CachingInheritanceProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn fetch(
        &self,
        class_name: &str,
        load: impl FnOnce() -> Option<Arc<ClassInfo>>,
    ) -> Option<Arc<ClassInfo>> {
        // clone the cell out so the map shard lock is released before
        // the (possibly slow) load runs
        let cell = Arc::clone(self.cache.entry(class_name.to_owned()).or_default().value());
        cell.get_or_init(load).clone()
    }
}

impl<P: InheritanceProvider> InheritanceProvider for CachingInheritanceProvider<P> {
    fn provide(&self, class_name: &str) -> Option<Arc<ClassInfo>> {
        self.fetch(class_name, || self.inner.provide(class_name))
    }

    fn provide_with_hint(&self, class_name: &str, hint: &dyn Any) -> Option<Arc<ClassInfo>> {
        self.fetch(class_name, || {
            self.inner.provide_with_hint(class_name, hint)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingProvider {
        classes: HashMap<String, Arc<ClassInfo>>,
        fetches: AtomicUsize,
    }

    impl CountingProvider {
        fn new(classes: impl IntoIterator<Item = ClassInfo>) -> Self {
            Self {
                classes: classes
                    .into_iter()
                    .map(|info| (info.name().to_owned(), Arc::new(info)))
                    .collect(),
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl InheritanceProvider for CountingProvider {
        fn provide(&self, class_name: &str) -> Option<Arc<ClassInfo>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.classes.get(class_name).cloned()
        }
    }

    fn empty_class(name: &str) -> ClassInfo {
        ClassInfo::new(name, false, "", Vec::new(), HashMap::new(), HashMap::new())
    }

    #[test]
    fn class_set_provider() {
        let set = Arc::new(ClassSet::new());
        set.add(Arc::new(empty_class("a/Foo")));

        let provider = ClassSetInheritanceProvider::new(Arc::clone(&set));
        assert_eq!(provider.provide("a/Foo").unwrap().name(), "a/Foo");
        assert!(provider.provide("a/Bar").is_none());

        // classes registered later are visible through the provider
        set.add(Arc::new(empty_class("a/Bar")));
        assert!(provider.provide("a/Bar").is_some());
    }

    #[test]
    fn class_set_hint_skips_lookup() {
        let provider = ClassSetInheritanceProvider::new(Arc::new(ClassSet::new()));
        let resolved: Arc<ClassInfo> = Arc::new(empty_class("a/Foo"));

        let provided = provider.provide_with_hint("a/Foo", &resolved).unwrap();
        assert!(Arc::ptr_eq(&provided, &resolved));

        // an unrecognised hint falls back to the name lookup
        assert!(provider.provide_with_hint("a/Foo", &"nonsense").is_none());
    }

    #[test]
    fn caching_fetches_at_most_once() {
        let provider = CountingProvider::new([empty_class("a/Foo")]).cached();

        assert!(provider.provide("a/Foo").is_some());
        assert!(provider.provide("a/Foo").is_some());
        assert_eq!(provider.inner().fetches(), 1);
    }

    #[test]
    fn negative_results_are_cached() {
        let provider = CountingProvider::new([]).cached();

        assert!(provider.provide("a/Missing").is_none());
        assert!(provider.provide("a/Missing").is_none());
        assert_eq!(provider.inner().fetches(), 1);
    }

    #[test]
    fn source_provider_decodes_and_tolerates_corruption() {
        struct OneClassSource;

        impl ClassSource for OneClassSource {
            fn class_bytes(&self, class_name: &str) -> Option<Vec<u8>> {
                match class_name {
                    "java/lang/Object" => Some(object_class_bytes()),
                    "a/Corrupt" => Some(vec![0xde, 0xad]),
                    _ => None,
                }
            }
        }

        fn object_class_bytes() -> Vec<u8> {
            let mut bytes = vec![0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 52];
            // pool: [1] Utf8 "java/lang/Object", [2] Class -> 1
            bytes.extend_from_slice(&3u16.to_be_bytes());
            bytes.push(1);
            bytes.extend_from_slice(&16u16.to_be_bytes());
            bytes.extend_from_slice(b"java/lang/Object");
            bytes.push(7);
            bytes.extend_from_slice(&1u16.to_be_bytes());
            // flags, this, super=0, no interfaces/fields/methods/attrs
            for value in [0x0021u16, 2, 0, 0, 0, 0, 0] {
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            bytes
        }

        let provider = ClassSourceInheritanceProvider::new(OneClassSource);

        let object = provider.provide("java/lang/Object").unwrap();
        assert_eq!(object.name(), "java/lang/Object");
        assert_eq!(object.super_name(), "");

        assert!(provider.provide("a/Corrupt").is_none());
        assert!(provider.provide("a/Missing").is_none());
    }
}
