//! Bounded LRU grammar cache shared across contexts.
//!
//! Values are `Arc<Grammar>`: eviction drops only the cache's reference, so
//! an in-flight decode that already resolved its grammar keeps a valid one.
//! The mutex guards only the table bookkeeping — grammar extraction and
//! decoding never run under it.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use parking_lot::Mutex;
use tracing::debug;
use trellis_core::{ContextName, Grammar};

use crate::fingerprint::Fingerprint;

/// Default number of cache slots.
pub const DEFAULT_CAPACITY: usize = 5;

/// Provenance of a cached grammar: which context's adaptation state it was
/// extracted against, and that state's version at extraction time.
///
/// Entries stay keyed by sentence fingerprint and are shared across
/// contexts; the tag exists so state-mutating commands can invalidate
/// exactly the grammars their context's old state produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheTag {
    /// Context whose state the grammar was extracted against.
    pub origin: ContextName,
    /// Adaptation-state version at extraction time.
    pub version: u64,
}

struct Entry {
    grammar: Arc<Grammar>,
    tag: CacheTag,
    last_used: u64,
}

struct Inner {
    entries: HashMap<Fingerprint, Entry>,
    clock: u64,
}

/// Bounded associative store of per-sentence grammars with LRU eviction.
pub struct GrammarCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl GrammarCache {
    /// Create a cache with `capacity` slots. Zero disables caching
    /// (every `get` misses, `put` is a no-op).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                clock: 0,
            }),
        }
    }

    /// Configured slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Look up the grammar for a fingerprint, marking it most-recently-used
    /// on a hit.
    pub fn get(&self, fp: &Fingerprint) -> Option<Arc<Grammar>> {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let clock = inner.clock;
        match inner.entries.get_mut(fp) {
            Some(entry) => {
                entry.last_used = clock;
                counter!("grammar_cache_hits").increment(1);
                Some(Arc::clone(&entry.grammar))
            }
            None => {
                counter!("grammar_cache_misses").increment(1);
                None
            }
        }
    }

    /// Insert or replace the grammar for a fingerprint, evicting the
    /// least-recently-used entry first when at capacity.
    pub fn put(&self, fp: Fingerprint, grammar: Arc<Grammar>, tag: CacheTag) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let clock = inner.clock;

        if !inner.entries.contains_key(&fp) && inner.entries.len() >= self.capacity {
            // Linear scan: capacity is tiny (default 5)
            if let Some(victim) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| *k)
            {
                let _ = inner.entries.remove(&victim);
                counter!("grammar_cache_evictions").increment(1);
                debug!(fingerprint = %victim, "evicted least-recently-used grammar");
            }
        }

        let _ = inner.entries.insert(
            fp,
            Entry {
                grammar,
                tag,
                last_used: clock,
            },
        );
    }

    /// Remove all entries whose tag matches `predicate`.
    ///
    /// Called when a command advances a context's adaptation state: grammars
    /// extracted against that context's earlier versions are stale.
    pub fn invalidate<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CacheTag) -> bool,
    {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !predicate(&entry.tag));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(removed, "invalidated stale grammar cache entries");
        }
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::Rule;

    fn grammar(tag: &str) -> Arc<Grammar> {
        Arc::new(Grammar::new(vec![Rule::new(tag, tag, 1.0)]))
    }

    fn tag(ctx: &str, version: u64) -> CacheTag {
        CacheTag {
            origin: ContextName::from(ctx),
            version,
        }
    }

    #[test]
    fn get_after_put_is_hit() {
        let cache = GrammarCache::new(5);
        let fp = Fingerprint::of("hello");
        cache.put(fp, grammar("g"), tag("", 0));
        assert!(cache.get(&fp).is_some());
    }

    #[test]
    fn miss_on_unknown_fingerprint() {
        let cache = GrammarCache::new(5);
        assert!(cache.get(&Fingerprint::of("never seen")).is_none());
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let cache = GrammarCache::new(3);
        for i in 0..10 {
            cache.put(Fingerprint::of(&format!("s{i}")), grammar("g"), tag("", 0));
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn evicts_exactly_least_recently_used() {
        let cache = GrammarCache::new(2);
        let a = Fingerprint::of("a");
        let b = Fingerprint::of("b");
        let c = Fingerprint::of("c");
        cache.put(a, grammar("a"), tag("", 0));
        cache.put(b, grammar("b"), tag("", 0));
        // Touch `a`, making `b` the LRU
        let _ = cache.get(&a);
        cache.put(c, grammar("c"), tag("", 0));

        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn replace_same_key_does_not_evict() {
        let cache = GrammarCache::new(2);
        let a = Fingerprint::of("a");
        let b = Fingerprint::of("b");
        cache.put(a, grammar("a1"), tag("", 0));
        cache.put(b, grammar("b"), tag("", 0));
        cache.put(a, grammar("a2"), tag("", 1));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&b).is_some());
    }

    #[test]
    fn eviction_leaves_inflight_arc_valid() {
        let cache = GrammarCache::new(1);
        let a = Fingerprint::of("a");
        cache.put(a, grammar("a"), tag("", 0));
        let held = cache.get(&a).unwrap();
        cache.put(Fingerprint::of("b"), grammar("b"), tag("", 0));

        assert!(cache.get(&a).is_none());
        // The borrower's grammar is untouched by the eviction
        assert_eq!(held.rules()[0].source, "a");
    }

    #[test]
    fn invalidate_by_origin_and_version() {
        let cache = GrammarCache::new(5);
        cache.put(Fingerprint::of("a"), grammar("a"), tag("ctx1", 1));
        cache.put(Fingerprint::of("b"), grammar("b"), tag("ctx1", 2));
        cache.put(Fingerprint::of("c"), grammar("c"), tag("ctx2", 1));

        let removed =
            cache.invalidate(|t| t.origin == ContextName::from("ctx1") && t.version < 2);
        assert_eq!(removed, 1);
        assert!(cache.get(&Fingerprint::of("a")).is_none());
        assert!(cache.get(&Fingerprint::of("b")).is_some());
        assert!(cache.get(&Fingerprint::of("c")).is_some());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = GrammarCache::new(5);
        cache.put(Fingerprint::of("a"), grammar("a"), tag("", 0));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let cache = GrammarCache::new(0);
        let fp = Fingerprint::of("a");
        cache.put(fp, grammar("a"), tag("", 0));
        assert!(cache.get(&fp).is_none());
        assert!(cache.is_empty());
    }
}
