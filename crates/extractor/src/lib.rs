//! # Autofold Extractor
//!
//! Turns a source file into the ordered region list the folding engine and
//! the topic model consume.
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Tree-sitter Parsing → AST
//!     │
//!     ├──> Region Collection
//!     │    ├─> function, type and block bodies
//!     │    ├─> doc comments, docstrings, block comments
//!     │    └─> runs of imports and fields
//!     │
//!     └──> Region Tree
//!          ├─> pre-order sort, innermost-parent linking
//!          ├─> identifier / comment terms → innermost region
//!          └─> ExtractedFile { regions, line index }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use autofold_extractor::{extract, ExtractorConfig, Language};
//!
//! let code = "fn process_data(input: &str) -> String {\n    input.trim().to_uppercase()\n}\n";
//! let file = extract(code, Language::Rust, &ExtractorConfig::default()).unwrap();
//!
//! assert_eq!(file.regions().len(), 2);
//! assert_eq!(file.file_terms().count("process"), 1);
//! ```

mod analyzer;
mod config;
mod error;
mod language;
mod tokenizer;
mod types;

pub use analyzer::{extract, RegionExtractor};
pub use config::ExtractorConfig;
pub use error::{ExtractorError, Result};
pub use language::Language;
pub use tokenizer::{split_identifier, Tokenizer};
pub use types::ExtractedFile;
