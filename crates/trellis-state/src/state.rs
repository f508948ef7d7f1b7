//! Per-context incremental model overlay.
//!
//! An [`AdaptationState`] accumulates what a context has learned since the
//! static model was loaded: reference translations (translation memory) and
//! feature-weight updates. Decodes read it; only commands mutate it, and the
//! owning context serializes both, so no locking happens here.
//!
//! The `version` counter increments on every successful mutation and is the
//! anchor for grammar-cache invalidation: a cached grammar extracted at
//! version `v` is stale once the state reaches `v + 1`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::StateError;

/// The incremental adaptation overlay for one translation context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptationState {
    version: u64,
    weights: BTreeMap<String, f64>,
    memory: BTreeMap<String, String>,
    pairs_learned: u64,
}

impl AdaptationState {
    /// Fresh, empty state (version 0).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic mutation counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Feature-weight overlay applied to grammar scores at decode time.
    #[must_use]
    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    /// Most recent reference target for a source phrase, if one was learned.
    #[must_use]
    pub fn lookup(&self, source: &str) -> Option<&str> {
        self.memory.get(source).map(String::as_str)
    }

    /// Total reference pairs learned (including overwrites).
    #[must_use]
    pub fn pairs_learned(&self) -> u64 {
        self.pairs_learned
    }

    /// Whether nothing has been learned or updated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty() && self.memory.is_empty()
    }

    /// Learn a reference translation pair. The most recent target for a
    /// source wins.
    pub fn learn(&mut self, source: &str, target: &str) -> Result<(), StateError> {
        let source = source.trim();
        let target = target.trim();
        if source.is_empty() || target.is_empty() {
            return Err(StateError::InvalidReference(format!(
                "'{source}' ||| '{target}'"
            )));
        }
        let _ = self.memory.insert(source.to_owned(), target.to_owned());
        self.pairs_learned += 1;
        self.version += 1;
        Ok(())
    }

    /// Accumulate feature-weight deltas.
    ///
    /// Atomic: every value is validated before any is applied, so a bad
    /// update changes nothing.
    pub fn update_weights(&mut self, updates: &[(String, f64)]) -> Result<(), StateError> {
        for (name, value) in updates {
            if !value.is_finite() {
                return Err(StateError::InvalidWeight {
                    name: name.clone(),
                    value: *value,
                });
            }
        }
        for (name, value) in updates {
            *self.weights.entry(name.clone()).or_insert(0.0) += value;
        }
        self.version += 1;
        Ok(())
    }

    /// Discard everything learned, keeping the version monotonic.
    pub fn reset(&mut self) {
        self.weights.clear();
        self.memory.clear();
        self.pairs_learned = 0;
        self.version += 1;
    }

    /// Serialize to bytes. `restore(snapshot())` reproduces a state that
    /// decodes identically.
    pub fn snapshot(&self) -> Result<Vec<u8>, StateError> {
        serde_json::to_vec(self).map_err(|e| StateError::Corrupt(e.to_string()))
    }

    /// Replace this state with a previously snapshotted one.
    ///
    /// Atomic: a corrupt snapshot leaves the current state unchanged. The
    /// version never moves backwards, so cache entries tagged with versions
    /// from before the restore stay invalidatable.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<(), StateError> {
        let mut restored: Self =
            serde_json::from_slice(bytes).map_err(|e| StateError::Corrupt(e.to_string()))?;
        restored.version = restored.version.max(self.version + 1);
        *self = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn new_state_is_empty_at_version_zero() {
        let state = AdaptationState::new();
        assert!(state.is_empty());
        assert_eq!(state.version(), 0);
        assert_eq!(state.pairs_learned(), 0);
    }

    #[test]
    fn learn_stores_pair_and_bumps_version() {
        let mut state = AdaptationState::new();
        state.learn("hello", "bonjour").unwrap();
        assert_eq!(state.lookup("hello"), Some("bonjour"));
        assert_eq!(state.version(), 1);
    }

    #[test]
    fn learn_latest_target_wins() {
        let mut state = AdaptationState::new();
        state.learn("hello", "salut").unwrap();
        state.learn("hello", "bonjour").unwrap();
        assert_eq!(state.lookup("hello"), Some("bonjour"));
        assert_eq!(state.pairs_learned(), 2);
    }

    #[test]
    fn learn_rejects_empty_sides() {
        let mut state = AdaptationState::new();
        assert_matches!(state.learn("", "x"), Err(StateError::InvalidReference(_)));
        assert_matches!(state.learn("x", "  "), Err(StateError::InvalidReference(_)));
        assert_eq!(state.version(), 0);
        assert!(state.is_empty());
    }

    #[test]
    fn update_weights_accumulates() {
        let mut state = AdaptationState::new();
        state
            .update_weights(&[("lm".into(), 0.5), ("tm".into(), -0.25)])
            .unwrap();
        state.update_weights(&[("lm".into(), 0.5)]).unwrap();
        assert!((state.weights()["lm"] - 1.0).abs() < f64::EPSILON);
        assert!((state.weights()["tm"] + 0.25).abs() < f64::EPSILON);
        assert_eq!(state.version(), 2);
    }

    #[test]
    fn update_weights_is_atomic_on_bad_value() {
        let mut state = AdaptationState::new();
        let err = state.update_weights(&[("ok".into(), 1.0), ("bad".into(), f64::NAN)]);
        assert_matches!(err, Err(StateError::InvalidWeight { .. }));
        // Nothing applied, version untouched
        assert!(state.weights().is_empty());
        assert_eq!(state.version(), 0);
    }

    #[test]
    fn reset_clears_but_advances_version() {
        let mut state = AdaptationState::new();
        state.learn("a", "b").unwrap();
        state.update_weights(&[("lm".into(), 1.0)]).unwrap();
        let v = state.version();
        state.reset();
        assert!(state.is_empty());
        assert_eq!(state.version(), v + 1);
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut state = AdaptationState::new();
        state.learn("hello", "bonjour").unwrap();
        state.update_weights(&[("lm".into(), 0.5)]).unwrap();

        let bytes = state.snapshot().unwrap();
        let mut restored = AdaptationState::new();
        restored.restore(&bytes).unwrap();

        assert_eq!(restored.lookup("hello"), Some("bonjour"));
        assert_eq!(restored.weights(), state.weights());
        assert_eq!(restored.pairs_learned(), state.pairs_learned());
    }

    #[test]
    fn restore_corrupt_leaves_state_unchanged() {
        let mut state = AdaptationState::new();
        state.learn("a", "b").unwrap();
        let err = state.restore(b"not json at all");
        assert_matches!(err, Err(StateError::Corrupt(_)));
        assert_eq!(state.lookup("a"), Some("b"));
    }

    #[test]
    fn restore_keeps_version_monotonic() {
        let mut old = AdaptationState::new();
        old.learn("a", "b").unwrap();
        let snap = old.snapshot().unwrap(); // version 1

        let mut current = AdaptationState::new();
        for i in 0..5 {
            current.learn(&format!("s{i}"), "t").unwrap();
        }
        assert_eq!(current.version(), 5);
        current.restore(&snap).unwrap();
        assert!(current.version() > 5);
        assert_eq!(current.lookup("a"), Some("b"));
    }
}
