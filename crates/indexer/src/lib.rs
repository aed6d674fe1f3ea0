//! # Autofold Indexer
//!
//! Turns a directory of projects into a topic-model corpus.
//!
//! ## Pipeline
//!
//! ```text
//! Projects root
//!     │
//!     ├──> ProjectScanner (one project per subdirectory)
//!     │
//!     ├──> FileScanner (.gitignore aware, sorted by path)
//!     │      └─> Source files
//!     │
//!     ├──> RegionExtractor (scoped worker threads)
//!     │      └─> one term sentence per region
//!     │
//!     └──> CorpusBuilder (sequential interning)
//!            └─> Corpus + LoadStats
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use autofold_extractor::ExtractorConfig;
//! use autofold_indexer::CorpusLoader;
//!
//! let (corpus, stats) = CorpusLoader::new(ExtractorConfig::default())
//!     .load("/path/to/projects")
//!     .unwrap();
//! println!("Loaded {} files, {} nodes", stats.files, corpus.sentence_count());
//! ```

mod error;
mod loader;
mod scanner;
mod stats;

pub use error::{IndexerError, Result};
pub use loader::CorpusLoader;
pub use scanner::{FileScanner, ProjectDir, ProjectScanner, SourceFile};
pub use stats::LoadStats;
