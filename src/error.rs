//! Error types for the sieve engine.
//!
//! Configuration problems surface from `setup`; everything per-frame is total
//! once a configuration has been accepted.

/// Errors reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SieveError {
    /// The configuration was rejected by `setup`.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with it.
        reason: String,
    },

    /// A frame operation was called before any successful `setup`.
    #[error("engine used before setup")]
    NotInitialized,
}

impl SieveError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SieveError>;
