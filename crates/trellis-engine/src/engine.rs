//! The `Engine` trait — the decoding engine as an external collaborator.
//!
//! The session layer only ever sees this interface: extract a grammar for a
//! sentence, translate a sentence given a grammar and the context's
//! adaptation state, release the handle at shutdown. The engine's internal
//! search and scoring are out of scope.

use async_trait::async_trait;
use trellis_core::Grammar;
use trellis_state::AdaptationState;

use crate::errors::EngineError;

/// Decoding engine interface.
///
/// Implementations must be safe to call concurrently: independent contexts
/// decode in parallel against one shared engine handle.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Build the per-sentence translation grammar.
    ///
    /// Grammars derive from the static model and the sentence text, not from
    /// per-context state, which is what makes cross-context cache sharing
    /// sound.
    async fn extract_grammar(&self, sentence: &str) -> Result<Grammar, EngineError>;

    /// Produce a hypothesis for `sentence` using `grammar` and the calling
    /// context's adaptation state.
    async fn translate(
        &self,
        sentence: &str,
        grammar: &Grammar,
        state: &AdaptationState,
    ) -> Result<String, EngineError>;

    /// Release the engine handle. Must be idempotent; later calls to the
    /// decode methods fail with [`EngineError::Closed`].
    fn close(&self);
}
