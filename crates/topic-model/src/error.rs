use thiserror::Error;

/// Result type for topic model operations
pub type Result<T> = std::result::Result<T, TopicModelError>;

/// Errors raised while training, querying or persisting a topic model
#[derive(Error, Debug)]
pub enum TopicModelError {
    /// Persisted model is missing, corrupt or of another schema
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A computation left its valid numeric domain
    #[error("Numeric domain error: {0}")]
    NumericDomain(String),

    /// Project name not present in the corpus
    #[error("Unknown project: {0}")]
    UnknownProject(String),

    /// File path not present in the project
    #[error("Unknown document '{file}' in project '{project}'")]
    UnknownDocument { project: String, file: String },

    /// Node id beyond the file's node count
    #[error("Node {node} out of range for '{file}' ({count} nodes)")]
    NodeOutOfRange {
        file: String,
        node: usize,
        count: usize,
    },

    /// Invalid configuration or query argument
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TopicModelError {
    /// Create a model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a numeric domain error
    pub fn numeric(msg: impl Into<String>) -> Self {
        Self::NumericDomain(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
