//! Session manager — top-level dispatch over contexts, cache, and engine.
//!
//! Owns the one [`ContextRegistry`] and the one [`GrammarCache`] for the
//! process lifetime. Every input line goes through [`SessionManager::handle_line`]:
//! parse, resolve the target context, execute. Per-line errors never abort
//! the serving loop or other contexts.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::counter;
use tracing::{info, instrument, warn};
use trellis_core::ContextName;
use trellis_engine::Engine;
use trellis_grammar::GrammarCache;
use trellis_state::StateStore;

use crate::errors::RuntimeError;
use crate::protocol::{self, Command, Operation};
use crate::registry::ContextRegistry;

/// Session-level configuration.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Tokenize input and detokenize hypotheses around each decode.
    pub normalize: bool,
    /// Bound on each engine call (grammar extraction, translation).
    pub decode_timeout: Duration,
    /// Grammar cache capacity (slots).
    pub cache_size: usize,
    /// State file loaded at startup and used by path-less save/load.
    pub state_file: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            normalize: false,
            decode_timeout: Duration::from_secs(60),
            cache_size: trellis_grammar::cache::DEFAULT_CAPACITY,
            state_file: None,
        }
    }
}

/// Top-level orchestrator for one serving process.
pub struct SessionManager {
    registry: ContextRegistry,
    cache: GrammarCache,
    store: StateStore,
    engine: Arc<dyn Engine>,
    options: SessionOptions,
    closed: AtomicBool,
}

impl SessionManager {
    /// Create a session manager around an initialized engine handle.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, options: SessionOptions) -> Self {
        Self {
            registry: ContextRegistry::new(),
            cache: GrammarCache::new(options.cache_size),
            store: StateStore::new(),
            engine,
            options,
            closed: AtomicBool::new(false),
        }
    }

    /// The shared grammar cache.
    #[must_use]
    pub fn cache(&self) -> &GrammarCache {
        &self.cache
    }

    /// The context registry.
    #[must_use]
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Load the configured state file into contexts, before accepting input.
    ///
    /// A multi-context file populates each named context; the empty name is
    /// the default context. No configured file is a no-op.
    pub async fn load_initial_state(&self) -> Result<(), RuntimeError> {
        let Some(path) = self.options.state_file.as_deref() else {
            return Ok(());
        };
        let contexts = trellis_state::file::read_contexts(path)?;
        info!(path = %path.display(), contexts = contexts.len(), "loading persisted state");
        for (name, state) in &contexts {
            let ctx = self.registry.resolve(&ContextName::from(name.as_str()));
            ctx.install_state(state).await?;
        }
        Ok(())
    }

    /// Handle one input line for the given context (out-of-band addressing;
    /// `None` is the default context).
    ///
    /// Returns `Some(hypothesis)` for a decode request, `None` for a
    /// command. All errors are local to this line.
    #[instrument(skip(self, line), fields(context = %ContextName::from_opt(context)))]
    pub async fn handle_line(
        &self,
        line: &str,
        context: Option<&str>,
    ) -> Result<Option<String>, RuntimeError> {
        let name = ContextName::from_opt(context);
        match protocol::parse_line(line)? {
            Operation::Decode(request) => {
                counter!("decode_requests").increment(1);
                let hypothesis = self.decode(&request.sentence, &name).await?;
                Ok(Some(hypothesis))
            }
            Operation::Command(command) => {
                counter!("commands").increment(1);
                self.command(&command, &name).await?;
                Ok(None)
            }
        }
    }

    /// Translate one sentence in the named context.
    pub async fn decode(&self, sentence: &str, name: &ContextName) -> Result<String, RuntimeError> {
        let ctx = self.registry.resolve(name);
        if self.options.normalize {
            let tokenized = trellis_engine::normalize::tokenize(sentence);
            let request = protocol::DecodeRequest {
                sentence: tokenized,
            };
            let hypothesis = ctx
                .decode(
                    &request,
                    &self.cache,
                    self.engine.as_ref(),
                    self.options.decode_timeout,
                )
                .await?;
            Ok(trellis_engine::normalize::detokenize(&hypothesis))
        } else {
            let request = protocol::DecodeRequest {
                sentence: sentence.to_owned(),
            };
            ctx.decode(
                &request,
                &self.cache,
                self.engine.as_ref(),
                self.options.decode_timeout,
            )
            .await
        }
    }

    /// Execute a command against the named context.
    pub async fn command(&self, command: &Command, name: &ContextName) -> Result<(), RuntimeError> {
        match command {
            Command::ClearCache => {
                self.cache.clear();
                info!("grammar cache cleared");
                Ok(())
            }
            Command::Drop => {
                // In-flight holders of the Arc finish; the name is recreated
                // empty on next use
                if self.registry.remove(name) {
                    let dropped = name.clone();
                    let _ = self.cache.invalidate(|tag| tag.origin == dropped);
                } else {
                    warn!(context = %name, "drop for unknown context ignored");
                }
                Ok(())
            }
            _ => {
                let ctx = self.registry.resolve(name);
                ctx.apply(
                    command,
                    &self.cache,
                    &self.store,
                    self.options.state_file.as_deref(),
                )
                .await
            }
        }
    }

    /// Release the engine handle. Idempotent; called from every exit path
    /// and again from `Drop` as a backstop.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("session manager closing engine handle");
            self.engine.close();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close();
    }
}
