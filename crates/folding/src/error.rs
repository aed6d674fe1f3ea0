use autofold_topic_model::TopicModelError;
use thiserror::Error;

/// Result type for folding operations
pub type Result<T> = std::result::Result<T, FoldError>;

/// Errors that abort a folding run
#[derive(Error, Debug)]
pub enum FoldError {
    /// Rejected settings, detected before any computation starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Region tree violates nesting or cost invariants
    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// An oracle produced a value outside its domain
    #[error("Numeric domain error: {0}")]
    NumericDomain(String),

    /// Topic model failure (load, lookup or query)
    #[error(transparent)]
    TopicModel(#[from] TopicModelError),
}

impl FoldError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a structural inconsistency error
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::StructuralInconsistency(msg.into())
    }

    /// Create a numeric domain error
    pub fn numeric(msg: impl Into<String>) -> Self {
        Self::NumericDomain(msg.into())
    }
}
