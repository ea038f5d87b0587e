//! Cache registry - central management for all caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::{CacheConfig, TypedCache};

/// Central registry for managing multiple typed caches.
///
/// Repositories create and look up their caches by name, so two
/// repositories sharing a collection also share one cache.
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

/// Internal cache entry storing a type-erased cache.
struct CacheEntry {
    cache: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new typed cache and register it.
    ///
    /// # Panics
    /// Panics if a cache with the same name but different types already exists.
    pub fn create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let cache = TypedCache::new(name, config);

        let mut caches = self.caches.write().unwrap();

        if let Some(existing) = caches.get(name) {
            let expected_type = TypeId::of::<TypedCache<K, V>>();
            if existing.type_id != expected_type {
                panic!(
                    "Cache '{}' already exists with different types: expected {}, got {}",
                    name,
                    std::any::type_name::<TypedCache<K, V>>(),
                    existing.type_name
                );
            }
            return existing
                .cache
                .downcast_ref::<TypedCache<K, V>>()
                .unwrap()
                .clone();
        }

        debug!("Creating cache: {}", name);

        caches.insert(
            name.to_string(),
            CacheEntry {
                cache: Box::new(cache.clone()),
                type_id: TypeId::of::<TypedCache<K, V>>(),
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );

        cache
    }

    /// Get an existing cache by name.
    ///
    /// # Panics
    /// Panics if the cache exists but with different types.
    pub fn get<K, V>(&self, name: &str) -> Option<TypedCache<K, V>>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let caches = self.caches.read().unwrap();

        caches.get(name).map(|entry| {
            let expected_type = TypeId::of::<TypedCache<K, V>>();
            if entry.type_id != expected_type {
                panic!(
                    "Cache '{}' type mismatch: expected {}, got {}",
                    name,
                    std::any::type_name::<TypedCache<K, V>>(),
                    entry.type_name
                );
            }
            entry
                .cache
                .downcast_ref::<TypedCache<K, V>>()
                .unwrap()
                .clone()
        })
    }

    /// Get an existing cache or create a new one if it doesn't exist.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> TypedCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        if let Some(cache) = self.get(name) {
            return cache;
        }
        self.create(name, config)
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read().unwrap();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}
