//! Per-sentence translation grammar.
//!
//! A [`Grammar`] is the set of scored rewrite rules the engine extracted for
//! one source sentence. The session layer treats it as opaque and immutable:
//! grammars are built once, shared behind `Arc`, and never mutated after
//! insertion into the cache. Eviction only drops the cache's reference, so
//! an in-flight decode holding the `Arc` is unaffected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scored translation rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Source-side phrase.
    pub source: String,
    /// Target-side phrase.
    pub target: String,
    /// Named feature values (log-domain scores in the reference engine).
    pub features: BTreeMap<String, f64>,
}

impl Rule {
    /// Create a rule with a single `weight` feature.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        let mut features = BTreeMap::new();
        let _ = features.insert("weight".to_owned(), weight);
        Self {
            source: source.into(),
            target: target.into(),
            features,
        }
    }

    /// Dot product of this rule's features against a weight overlay.
    ///
    /// Features absent from the overlay use their stored value with a unit
    /// weight, so an empty overlay scores the rule by its own features.
    #[must_use]
    pub fn score(&self, overlay: &BTreeMap<String, f64>) -> f64 {
        self.features
            .iter()
            .map(|(name, value)| value * overlay.get(name).copied().unwrap_or(1.0))
            .sum()
    }
}

/// An immutable per-sentence grammar.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    rules: Vec<Rule>,
}

impl Grammar {
    /// Build a grammar from extracted rules.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// All rules, in extraction order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the grammar has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose source side matches `source` exactly.
    pub fn rules_for(&self, source: &str) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.source == source)
    }
}
