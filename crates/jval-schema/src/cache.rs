//! # Compiled Schema Cache
//!
//! Compiled schemas keyed by the identifier callers use. Each key owns a
//! slot guarded by its own mutex: the first caller for an identifier
//! compiles while later callers for the same identifier wait on the slot
//! and reuse the result. Callers for other identifiers are not blocked.
//!
//! A failed compilation drops its slot again, so the next call retries and
//! identifiers that never compile do not accumulate.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::compiler::CompiledSchema;

type Slot = Arc<Mutex<Option<Arc<CompiledSchema>>>>;

/// Thread-safe map from schema identifier to compiled schema.
#[derive(Debug, Default)]
pub struct SchemaCache {
    slots: DashMap<String, Slot>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled schema for `identifier`, if one is cached.
    pub fn get(&self, identifier: &str) -> Option<Arc<CompiledSchema>> {
        // Clone the slot out so the map shard is not held while waiting on
        // a slot that is being filled.
        let slot = self.slots.get(identifier).map(|entry| Arc::clone(entry.value()))?;
        let cached = slot.lock().clone();
        tracing::trace!(identifier, hit = cached.is_some(), "schema cache lookup");
        cached
    }

    /// The cached schema for `identifier`, or the result of `build`, which
    /// is cached when it succeeds. `build` runs at most once at a time per
    /// identifier.
    ///
    /// # Errors
    ///
    /// Whatever `build` returns; nothing is cached in that case.
    pub fn get_or_try_insert_with<E>(
        &self,
        identifier: &str,
        build: impl FnOnce() -> Result<CompiledSchema, E>,
    ) -> Result<Arc<CompiledSchema>, E> {
        let slot = Arc::clone(self.slots.entry(identifier.to_string()).or_default().value());
        let mut guard = slot.lock();
        if let Some(schema) = guard.as_ref() {
            tracing::trace!(identifier, "schema compiled by another caller");
            return Ok(Arc::clone(schema));
        }
        match build() {
            Ok(schema) => {
                let schema = Arc::new(schema);
                *guard = Some(Arc::clone(&schema));
                tracing::debug!(identifier, "schema cached");
                Ok(schema)
            }
            Err(e) => {
                drop(guard);
                // A slot another caller is filling right now stays.
                self.slots
                    .remove_if(identifier, |_, entry| entry.try_lock().is_some_and(|s| s.is_none()));
                tracing::trace!(identifier, "schema build failed, slot dropped");
                Err(e)
            }
        }
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the cached schema for `identifier`.
    pub fn remove(&self, identifier: &str) {
        self.slots.remove(identifier);
    }

    /// Drop every cached schema.
    pub fn clear(&self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    use serde_json::json;

    fn schema() -> CompiledSchema {
        CompiledSchema::from_value(json!({"type": "string"})).unwrap()
    }

    #[test]
    fn caches_successful_builds() {
        let cache = SchemaCache::new();
        assert!(cache.get("a.json").is_none());
        let built = cache
            .get_or_try_insert_with("a.json", || Ok::<_, ()>(schema()))
            .unwrap();
        let again = cache
            .get_or_try_insert_with("a.json", || -> Result<CompiledSchema, ()> {
                panic!("must not rebuild")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&built, &again));
        assert!(cache.get("a.json").is_some_and(|s| Arc::ptr_eq(&s, &built)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = SchemaCache::new();
        let err = cache.get_or_try_insert_with("bad.json", || Err("broken"));
        assert_eq!(err.unwrap_err(), "broken");
        assert!(cache.get("bad.json").is_none());
        assert!(cache.is_empty());
        assert!(cache.slots.is_empty());
        assert!(cache
            .get_or_try_insert_with("bad.json", || Ok::<_, ()>(schema()))
            .is_ok());
    }

    #[test]
    fn failing_identifiers_do_not_accumulate() {
        let cache = SchemaCache::new();
        for i in 0..100 {
            let id = format!("broken-{i}.json");
            assert!(cache.get_or_try_insert_with(&id, || Err::<CompiledSchema, _>("no")).is_err());
        }
        assert_eq!(cache.slots.len(), 0);
        cache.get_or_try_insert_with("ok.json", || Ok::<_, ()>(schema())).unwrap();
        assert_eq!(cache.slots.len(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let cache = SchemaCache::new();
        for id in ["a", "b"] {
            cache.get_or_try_insert_with(id, || Ok::<_, ()>(schema())).unwrap();
        }
        cache.remove("a");
        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_first_use_builds_once() {
        let cache = SchemaCache::new();
        let builds = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    cache
                        .get_or_try_insert_with("shared.json", || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, ()>(schema())
                        })
                        .unwrap();
                });
            }
        });
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
