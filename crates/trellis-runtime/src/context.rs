//! One translation context: serial execution against owned adaptation state.
//!
//! All operations addressed to a context funnel through its state mutex.
//! `tokio::sync::Mutex` wakes waiters in FIFO order, so operations execute
//! strictly in submission order with no bespoke queue task, while contexts
//! with different names proceed fully in parallel. The mutex is held for the
//! whole operation — that *is* the serialization contract, not a defect:
//! later decodes must see earlier commands' adaptation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, instrument};
use trellis_core::ContextName;
use trellis_engine::{Engine, EngineError};
use trellis_grammar::{CacheTag, Fingerprint, GrammarCache};
use trellis_state::{AdaptationState, StateStore};

use crate::errors::RuntimeError;
use crate::protocol::{Command, DecodeRequest};

/// A named translation context and its adaptation state.
pub struct TranslationContext {
    name: ContextName,
    state: tokio::sync::Mutex<AdaptationState>,
}

impl TranslationContext {
    /// Create a context with empty adaptation state.
    #[must_use]
    pub fn new(name: ContextName) -> Self {
        Self {
            name,
            state: tokio::sync::Mutex::new(AdaptationState::new()),
        }
    }

    /// The context's name.
    #[must_use]
    pub fn name(&self) -> &ContextName {
        &self.name
    }

    /// Translate one sentence.
    ///
    /// Resolves the grammar through the shared cache (building it via the
    /// engine on a miss), then decodes with this context's current state.
    /// Engine failures and timeouts surface per-request; the context stays
    /// usable.
    #[instrument(skip_all, fields(context = %self.name))]
    pub async fn decode(
        &self,
        request: &DecodeRequest,
        cache: &GrammarCache,
        engine: &dyn Engine,
        engine_timeout: Duration,
    ) -> Result<String, RuntimeError> {
        let state = self.state.lock().await;

        let fingerprint = Fingerprint::of(&request.sentence);
        let grammar = match cache.get(&fingerprint) {
            Some(grammar) => grammar,
            None => {
                let built = bounded(engine_timeout, engine.extract_grammar(&request.sentence))
                    .await?
                    .map_err(|e| RuntimeError::Decode(e.to_string()))?;
                let grammar = Arc::new(built);
                cache.put(
                    fingerprint,
                    Arc::clone(&grammar),
                    CacheTag {
                        origin: self.name.clone(),
                        version: state.version(),
                    },
                );
                grammar
            }
        };

        let hypothesis = bounded(
            engine_timeout,
            engine.translate(&request.sentence, &grammar, &state),
        )
        .await?
        .map_err(|e| RuntimeError::Decode(e.to_string()))?;

        debug!(fingerprint = %fingerprint, "decoded");
        Ok(hypothesis)
    }

    /// Apply a state command.
    ///
    /// Atomic with respect to this context's state; mutating commands then
    /// invalidate shared cache entries extracted against this context's
    /// earlier state versions. Saves go through `store`, which serializes
    /// writes to the shared state file across contexts.
    #[instrument(skip_all, fields(context = %self.name, verb = command.verb()))]
    pub async fn apply(
        &self,
        command: &Command,
        cache: &GrammarCache,
        store: &StateStore,
        state_file: Option<&Path>,
    ) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().await;

        match command {
            Command::Learn { source, target } => state.learn(source, target)?,
            Command::UpdateWeights { updates } => state.update_weights(updates)?,
            Command::Reset => state.reset(),
            Command::Save { path } => {
                let path = path.as_deref().or(state_file).ok_or(RuntimeError::NoStatePath)?;
                store.save(path, self.name.as_str(), &state)?;
            }
            Command::Load { path } => {
                let path = path.as_deref().or(state_file).ok_or(RuntimeError::NoStatePath)?;
                let contexts = trellis_state::file::read_contexts(path)?;
                // Prefer this context's entry, fall back to the sole default
                // entry (single-context files)
                let loaded = contexts
                    .get(self.name.as_str())
                    .or_else(|| contexts.get(""))
                    .ok_or_else(|| {
                        RuntimeError::State(trellis_state::StateError::Corrupt(format!(
                            "no state for context {} in {}",
                            self.name,
                            path.display()
                        )))
                    })?;
                let bytes = loaded.snapshot()?;
                state.restore(&bytes)?;
            }
            // Registry-level commands never reach the context
            Command::Drop | Command::ClearCache => {}
        }

        if command.mutates_state() {
            let origin = self.name.clone();
            let current = state.version();
            let _ = cache.invalidate(|tag| tag.origin == origin && tag.version < current);
        }
        Ok(())
    }

    /// Replace the adaptation state wholesale (startup state-file load).
    pub async fn install_state(&self, loaded: &AdaptationState) -> Result<(), RuntimeError> {
        let bytes = loaded.snapshot()?;
        let mut state = self.state.lock().await;
        state.restore(&bytes)?;
        Ok(())
    }

    /// Snapshot the current adaptation state.
    pub async fn snapshot_state(&self) -> AdaptationState {
        self.state.lock().await.clone()
    }
}

fn map_timeout(engine_timeout: Duration) -> RuntimeError {
    RuntimeError::DecodeTimeout {
        seconds: engine_timeout.as_secs(),
    }
}

async fn bounded<T>(
    engine_timeout: Duration,
    call: impl Future<Output = Result<T, EngineError>>,
) -> Result<Result<T, EngineError>, RuntimeError> {
    timeout(engine_timeout, call)
        .await
        .map_err(|_| map_timeout(engine_timeout))
}
