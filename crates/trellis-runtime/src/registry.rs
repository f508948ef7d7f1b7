//! Name → context registry with lazy, exactly-once creation.
//!
//! `DashMap::entry` holds the shard lock across the check-and-insert, so
//! concurrent resolution of the same name creates exactly one context.
//! Per-context execution is not synchronized through the registry at all —
//! callers clone the `Arc` and leave.

use std::sync::Arc;

use dashmap::DashMap;
use metrics::gauge;
use tracing::debug;
use trellis_core::ContextName;

use crate::context::TranslationContext;

/// Registry of live translation contexts.
#[derive(Default)]
pub struct ContextRegistry {
    contexts: DashMap<ContextName, Arc<TranslationContext>>,
}

impl ContextRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the context for `name`, creating it with empty adaptation
    /// state on first reference.
    pub fn resolve(&self, name: &ContextName) -> Arc<TranslationContext> {
        let ctx = self
            .contexts
            .entry(name.clone())
            .or_insert_with(|| {
                debug!(context = %name, "context created");
                Arc::new(TranslationContext::new(name.clone()))
            })
            .clone();
        gauge!("translation_contexts_active").set(self.contexts.len() as f64);
        ctx
    }

    /// Look up without creating.
    #[must_use]
    pub fn get(&self, name: &ContextName) -> Option<Arc<TranslationContext>> {
        self.contexts.get(name).map(|entry| Arc::clone(&entry))
    }

    /// Remove a context. In-flight operations hold their own `Arc` and
    /// finish normally; the next `resolve` recreates the name empty.
    pub fn remove(&self, name: &ContextName) -> bool {
        let removed = self.contexts.remove(name).is_some();
        if removed {
            debug!(context = %name, "context dropped");
            gauge!("translation_contexts_active").set(self.contexts.len() as f64);
        }
        removed
    }

    /// Names of all live contexts.
    #[must_use]
    pub fn names(&self) -> Vec<ContextName> {
        self.contexts.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no contexts exist yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_creates_lazily() {
        let registry = ContextRegistry::new();
        assert!(registry.is_empty());
        let _ = registry.resolve(&ContextName::from("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_returns_same_instance() {
        let registry = ContextRegistry::new();
        let first = registry.resolve(&ContextName::from("a"));
        let second = registry.resolve(&ContextName::from("a"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn distinct_names_distinct_contexts() {
        let registry = ContextRegistry::new();
        let a = registry.resolve(&ContextName::from("a"));
        let b = registry.resolve(&ContextName::from("b"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn get_does_not_create() {
        let registry = ContextRegistry::new();
        assert!(registry.get(&ContextName::from("a")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_then_resolve_recreates() {
        let registry = ContextRegistry::new();
        let old = registry.resolve(&ContextName::from("a"));
        assert!(registry.remove(&ContextName::from("a")));
        let fresh = registry.resolve(&ContextName::from("a"));
        assert!(!Arc::ptr_eq(&old, &fresh));
    }

    #[test]
    fn remove_unknown_is_false() {
        let registry = ContextRegistry::new();
        assert!(!registry.remove(&ContextName::from("ghost")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_resolution_creates_exactly_one() {
        let registry = Arc::new(ContextRegistry::new());
        let name = ContextName::from("contested");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let name = name.clone();
                tokio::spawn(async move { registry.resolve(&name) })
            })
            .collect();

        let mut contexts = Vec::new();
        for handle in handles {
            contexts.push(handle.await.unwrap());
        }
        assert_eq!(registry.len(), 1);
        assert!(contexts.iter().all(|c| Arc::ptr_eq(c, &contexts[0])));
    }
}
