use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Extractor error: {0}")]
    ExtractorError(#[from] autofold_extractor::ExtractorError),

    #[error("Invalid projects root: {0}")]
    InvalidPath(String),

    #[error("Parser thread panicked while processing {0}")]
    WorkerPanic(String),

    #[error("No source files found under {0}")]
    EmptyCorpus(String),
}
