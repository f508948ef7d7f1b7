//! Adaptation-state error types.

/// Errors from applying, snapshotting, or restoring adaptation state.
///
/// Every failing operation leaves the state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A reference pair had an empty source or target side.
    #[error("Invalid reference pair: {0}")]
    InvalidReference(String),

    /// A weight update carried a non-finite value.
    #[error("Invalid weight for feature '{name}': {value}")]
    InvalidWeight {
        /// Feature name.
        name: String,
        /// The rejected value.
        value: f64,
    },

    /// A snapshot could not be produced or parsed.
    #[error("Corrupt state: {0}")]
    Corrupt(String),

    /// State file I/O failure.
    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),
}

impl StateError {
    /// Error category string for diagnostics.
    pub fn category(&self) -> &str {
        match self {
            Self::InvalidReference(_) => "invalid_reference",
            Self::InvalidWeight { .. } => "invalid_weight",
            Self::Corrupt(_) => "corrupt",
            Self::Io(_) => "io",
        }
    }
}
