//! Scope-keyed and single-instance caches for resolver objects.
//!
//! Resolvers (options, locators, resource imports) are expensive to build
//! and logically belong to a declaring scope, not to an individual page
//! object, so two pages built from the same origin share one resolver.
//! Ownership sits in the cache itself: callers get shared [`Rc`] handles
//! back and never construct behind the cache's back.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::result::PaginaResult;

/// Scope-keyed cache: at most one instance per key.
///
/// `get_or_create` is idempotent — a second call with an equal key
/// returns the same handle and the builder does not run again. A builder
/// failure stores nothing, so the key stays buildable.
#[derive(Debug, Default)]
pub struct Flyweight<K, V> {
    slots: RefCell<HashMap<K, Rc<V>>>,
}

impl<K: Eq + Hash, V> Flyweight<K, V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// Return the cached instance for `key`, building it on first use.
    ///
    /// The builder must not call back into the cache for the same key;
    /// the slot is only recorded after the builder returns successfully.
    pub fn get_or_create<F>(&self, key: K, build: F) -> PaginaResult<Rc<V>>
    where
        F: FnOnce() -> PaginaResult<V>,
    {
        if let Some(existing) = self.slots.borrow().get(&key) {
            return Ok(Rc::clone(existing));
        }
        let built = Rc::new(build()?);
        let _ = self.slots.borrow_mut().insert(key, Rc::clone(&built));
        Ok(built)
    }

    /// Whether an instance is cached under `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.slots.borrow().contains_key(key)
    }

    /// Number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

/// Single-instance cache: at most one instance for the holder's lifetime.
#[derive(Debug, Default)]
pub struct Singleton<V> {
    slot: RefCell<Option<Rc<V>>>,
}

impl<V> Singleton<V> {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }

    /// Return the instance, building it on first use. Same idempotence
    /// and failure contract as [`Flyweight::get_or_create`].
    pub fn get_or_create<F>(&self, build: F) -> PaginaResult<Rc<V>>
    where
        F: FnOnce() -> PaginaResult<V>,
    {
        if let Some(existing) = self.slot.borrow().as_ref() {
            return Ok(Rc::clone(existing));
        }
        let built = Rc::new(build()?);
        *self.slot.borrow_mut() = Some(Rc::clone(&built));
        Ok(built)
    }

    /// The instance, if it was already built.
    #[must_use]
    pub fn get(&self) -> Option<Rc<V>> {
        self.slot.borrow().as_ref().map(Rc::clone)
    }

    /// Whether the instance was built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::PaginaError;

    mod flyweight_tests {
        use super::*;

        #[test]
        fn test_same_key_shares_one_instance() {
            let cache: Flyweight<String, Vec<u32>> = Flyweight::new();
            let mut builds = 0;
            let first = cache
                .get_or_create("pages.login".to_string(), || {
                    builds += 1;
                    Ok(vec![1, 2, 3])
                })
                .unwrap();
            let second = cache
                .get_or_create("pages.login".to_string(), || {
                    builds += 1;
                    Ok(vec![9, 9, 9])
                })
                .unwrap();
            assert!(Rc::ptr_eq(&first, &second));
            assert_eq!(builds, 1);
            assert_eq!(*second, vec![1, 2, 3]);
        }

        #[test]
        fn test_distinct_keys_build_separately() {
            let cache: Flyweight<&'static str, u32> = Flyweight::new();
            let a = cache.get_or_create("a", || Ok(1)).unwrap();
            let b = cache.get_or_create("b", || Ok(2)).unwrap();
            assert!(!Rc::ptr_eq(&a, &b));
            assert_eq!(cache.len(), 2);
        }

        #[test]
        fn test_builder_failure_is_not_cached() {
            let cache: Flyweight<&'static str, u32> = Flyweight::new();
            let err = cache.get_or_create("k", || {
                Err(PaginaError::Browser {
                    message: "boom".to_string(),
                })
            });
            assert!(err.is_err());
            assert!(!cache.contains(&"k"));
            // Key stays buildable after the failure.
            let ok = cache.get_or_create("k", || Ok(7)).unwrap();
            assert_eq!(*ok, 7);
        }
    }

    mod singleton_tests {
        use super::*;

        #[test]
        fn test_builds_exactly_once() {
            let single: Singleton<String> = Singleton::new();
            let mut builds = 0;
            let first = single
                .get_or_create(|| {
                    builds += 1;
                    Ok("registry".to_string())
                })
                .unwrap();
            let second = single.get_or_create(|| Ok("other".to_string())).unwrap();
            assert!(Rc::ptr_eq(&first, &second));
            assert_eq!(builds, 1);
            assert!(single.is_initialized());
        }

        #[test]
        fn test_failure_leaves_slot_empty() {
            let single: Singleton<u32> = Singleton::new();
            let err = single.get_or_create(|| {
                Err(PaginaError::Browser {
                    message: "no".to_string(),
                })
            });
            assert!(err.is_err());
            assert!(!single.is_initialized());
            assert!(single.get().is_none());
        }
    }
}
