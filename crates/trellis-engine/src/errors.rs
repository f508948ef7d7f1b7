//! Engine error types.

/// Errors from the decoding engine boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine failed to initialize (fatal at startup).
    #[error("Engine initialization failed: {0}")]
    Init(String),

    /// Grammar extraction failed for a sentence.
    #[error("Grammar extraction failed: {0}")]
    Extraction(String),

    /// The engine failed to produce a hypothesis.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The engine handle was already closed.
    #[error("Engine is closed")]
    Closed,
}

impl EngineError {
    /// Error category string for diagnostics.
    pub fn category(&self) -> &str {
        match self {
            Self::Init(_) => "init",
            Self::Extraction(_) => "extraction",
            Self::Decode(_) => "decode",
            Self::Closed => "closed",
        }
    }
}
