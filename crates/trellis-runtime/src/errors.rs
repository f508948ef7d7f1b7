//! Runtime error taxonomy.
//!
//! Every variant is local to one line's processing: errors are reported on
//! the diagnostic channel and the serving loop, the context, and every
//! other context continue. Only engine initialization failure (surfaced
//! before a `SessionManager` exists) is fatal to the process.

use crate::protocol::ParseError;
use trellis_state::StateError;

/// Errors from handling one input line.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The line was a malformed command. Reported, line skipped.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The engine failed to produce a hypothesis (includes grammar
    /// extraction failures).
    #[error("Decode error: {0}")]
    Decode(String),

    /// The engine call exceeded the configured bound.
    #[error("Decode timed out after {seconds}s")]
    DecodeTimeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },

    /// Applying, saving, or loading adaptation state failed. The state is
    /// left unchanged.
    #[error(transparent)]
    State(#[from] StateError),

    /// A save/load command had no path and no state file is configured.
    #[error("No state file path given or configured")]
    NoStatePath,
}

impl RuntimeError {
    /// Error category string for diagnostics.
    pub fn category(&self) -> &str {
        match self {
            Self::Parse(_) => "parse",
            Self::Decode(_) => "decode",
            Self::DecodeTimeout { .. } => "decode_timeout",
            Self::State(_) => "state",
            Self::NoStatePath => "no_state_path",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_timeout_display() {
        let err = RuntimeError::DecodeTimeout { seconds: 60 };
        assert_eq!(err.to_string(), "Decode timed out after 60s");
        assert_eq!(err.category(), "decode_timeout");
    }

    #[test]
    fn parse_error_is_transparent() {
        let err = RuntimeError::from(ParseError::UnknownCommand("frobnicate".into()));
        assert!(err.to_string().contains("frobnicate"));
        assert_eq!(err.category(), "parse");
    }

    #[test]
    fn state_error_converts() {
        let err = RuntimeError::from(StateError::Corrupt("bad".into()));
        assert_eq!(err.category(), "state");
    }
}
