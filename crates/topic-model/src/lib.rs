//! # Autofold Topic Model
//!
//! Five-topic hierarchical model of source-code vocabulary, trained by
//! collapsed Gibbs sampling.
//!
//! Every token of every foldable node is explained by one of:
//! - three corpus-wide **background** topics,
//! - the **content** topic of its project,
//! - the **document** topic of its file.
//!
//! ## Architecture
//!
//! ```text
//! TermAlphabet (Arc, append-only)
//!     │
//!     ├──> CorpusBuilder ──> Corpus
//!     │                      Project → Document → Sentence (one per node id)
//!     │
//!     ├──> GibbsSampler
//!     │    ├─> initialize (uniform random topics)
//!     │    ├─> sweep × iterations (cumulative-weight draw)
//!     │    ├─> HyperparameterEstimator (MacKay & Peto | Minka)
//!     │    └─> final argmax sweep
//!     │
//!     └──> TopicModel
//!          ├─> phi_hat / theta_hat / log_likelihood
//!          ├─> DivergenceQuery (KLDivFile | KLDivProj | KLDivFileMinusProj)
//!          ├─> salient_files
//!          └─> save / load (JSON, schema_version)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use autofold_topic_model::{
//!     train_model, CorpusBuilder, KlDivergenceKind, SamplerConfig, TermAlphabet,
//! };
//! use std::sync::Arc;
//!
//! let mut builder = CorpusBuilder::new(Arc::new(TermAlphabet::new()));
//! builder
//!     .begin_project("demo")
//!     .add_document("lib.rs", vec![vec!["parse", "token"], vec!["token", "stream"]]);
//! let model = train_model(builder.build(), &SamplerConfig::for_quick_run(7), None).unwrap();
//!
//! let kl = model
//!     .kl_divergence(KlDivergenceKind::File, 2, "demo", "lib.rs", &[0, 1])
//!     .unwrap();
//! assert!(kl.is_finite());
//! ```

mod alphabet;
mod config;
mod corpus;
mod divergence;
mod error;
mod hyperparams;
mod model;
mod persist;
mod sampler;
mod topic;

pub use alphabet::TermAlphabet;
pub use config::{EstimatorKind, SamplerConfig, DEFAULT_ALPHA, DEFAULT_BETA};
pub use corpus::{Corpus, CorpusBuilder, Document, Project, Sentence};
pub use divergence::{DivergenceQuery, EmpiricalDistribution, KlDivergenceKind, SalientFile};
pub use error::{Result, TopicModelError};
pub use hyperparams::{
    AlphaStatistics, BetaStatistics, FixedPoint, HyperparameterEstimator, MacKayPeto, Minka,
    ALPHA_TOLERANCE, BETA_TOLERANCE, MAX_FIXED_POINT_SWEEPS,
};
pub use model::{TopicModel, TopicSummary};
pub use persist::MODEL_SCHEMA_VERSION;
pub use sampler::{train_model, GibbsSampler};
pub use topic::{Topic, TopicId, TopicTables, N_BACKGROUND, N_TOPICS};
