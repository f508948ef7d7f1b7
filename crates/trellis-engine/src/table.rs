//! Deterministic reference engine backed by a phrase table.
//!
//! Stands in for a full statistical decoder behind the [`Engine`] trait so
//! the binary and the test suite run end to end. The config directory holds
//! an optional `phrase_table.txt` with `source ||| target ||| weight` lines.
//!
//! Decoding is greedy and fully deterministic: a learned reference for the
//! whole sentence wins outright, then each token takes its learned target,
//! then the best-scoring grammar rule under the context's weight overlay,
//! then passes through unchanged. Ties break lexicographically on the
//! target so repeated runs are byte-identical.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};
use trellis_core::{Grammar, Rule};
use trellis_state::AdaptationState;

use crate::engine::Engine;
use crate::errors::EngineError;

const TABLE_FILE: &str = "phrase_table.txt";

/// Phrase-table reference engine.
#[derive(Debug)]
pub struct TableEngine {
    rules: HashMap<String, Vec<Rule>>,
    temp_dir: PathBuf,
    closed: AtomicBool,
}

impl TableEngine {
    /// Load the engine's static model from `config_dir`.
    ///
    /// The directory must exist; the phrase table inside it is optional
    /// (an empty table means every token passes through).
    pub fn load(config_dir: &Path, temp_dir: &Path) -> Result<Self, EngineError> {
        if !config_dir.is_dir() {
            return Err(EngineError::Init(format!(
                "config directory not found: {}",
                config_dir.display()
            )));
        }

        let table_path = config_dir.join(TABLE_FILE);
        let rules = if table_path.is_file() {
            let text = std::fs::read_to_string(&table_path)
                .map_err(|e| EngineError::Init(format!("{}: {e}", table_path.display())))?;
            Self::parse_table(&text)?
        } else {
            HashMap::new()
        };

        info!(
            config_dir = %config_dir.display(),
            sources = rules.len(),
            "table engine loaded"
        );
        Ok(Self {
            rules,
            temp_dir: temp_dir.to_owned(),
            closed: AtomicBool::new(false),
        })
    }

    /// Scratch directory handed to the engine at startup.
    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn parse_table(text: &str) -> Result<HashMap<String, Vec<Rule>>, EngineError> {
        let mut rules: HashMap<String, Vec<Rule>> = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split("|||").map(str::trim).collect();
            let (source, target, weight) = match fields.as_slice() {
                [source, target] => (*source, *target, 1.0),
                [source, target, weight] => {
                    let weight: f64 = weight.parse().map_err(|_| {
                        EngineError::Init(format!(
                            "{TABLE_FILE}:{}: bad weight '{weight}'",
                            lineno + 1
                        ))
                    })?;
                    (*source, *target, weight)
                }
                _ => {
                    return Err(EngineError::Init(format!(
                        "{TABLE_FILE}:{}: expected 2 or 3 fields",
                        lineno + 1
                    )));
                }
            };
            if source.is_empty() || target.is_empty() {
                return Err(EngineError::Init(format!(
                    "{TABLE_FILE}:{}: empty phrase",
                    lineno + 1
                )));
            }
            rules
                .entry(source.to_owned())
                .or_default()
                .push(Rule::new(source, target, weight));
        }
        Ok(rules)
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(EngineError::Closed);
        }
        Ok(())
    }

    /// Best target for `token` from the grammar under the state's weight
    /// overlay. Ties break on the target string.
    fn best_target<'a>(
        grammar: &'a Grammar,
        state: &AdaptationState,
        token: &str,
    ) -> Option<&'a str> {
        grammar
            .rules_for(token)
            .map(|rule| (rule.score(state.weights()), rule))
            .max_by(|(sa, ra), (sb, rb)| {
                sa.partial_cmp(sb)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| rb.target.cmp(&ra.target))
            })
            .map(|(_, rule)| rule.target.as_str())
    }
}

#[async_trait]
impl Engine for TableEngine {
    async fn extract_grammar(&self, sentence: &str) -> Result<Grammar, EngineError> {
        self.ensure_open()?;
        let mut rules = Vec::new();
        for token in sentence.split_whitespace() {
            if let Some(matches) = self.rules.get(token) {
                rules.extend(matches.iter().cloned());
            }
        }
        // Whole-sentence phrases participate too
        if sentence.contains(' ') {
            if let Some(matches) = self.rules.get(sentence.trim()) {
                rules.extend(matches.iter().cloned());
            }
        }
        debug!(rules = rules.len(), "grammar extracted");
        Ok(Grammar::new(rules))
    }

    async fn translate(
        &self,
        sentence: &str,
        grammar: &Grammar,
        state: &AdaptationState,
    ) -> Result<String, EngineError> {
        self.ensure_open()?;
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Err(EngineError::Decode("empty sentence".into()));
        }

        // A learned reference for the full sentence wins outright
        if let Some(target) = state.lookup(sentence) {
            return Ok(target.to_owned());
        }

        let hypothesis: Vec<&str> = sentence
            .split_whitespace()
            .map(|token| {
                state
                    .lookup(token)
                    .or_else(|| Self::best_target(grammar, state, token))
                    .unwrap_or(token)
            })
            .collect();
        Ok(hypothesis.join(" "))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("table engine closed");
        }
    }
}
