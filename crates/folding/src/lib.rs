//! # Autofold Folding
//!
//! Budgeted, adaptive, greedy unfolding of a source file's region tree.
//!
//! Revealing a nested region forces every folded ancestor open, so a
//! node's cost is recomputed each round relative to what is already
//! revealed.
//!
//! ## Architecture
//!
//! ```text
//! Vec<Region> (pre-order, from the extractor)
//!     │
//!     └──> FoldableTree::from_regions (validate nesting, unique costs)
//!              │
//!              └──> UnfoldEngine::run(policy)
//!                   loop:
//!                     traverse_lines_greedy ─> (node, reveal cost)
//!                     Policy::score(node, cost, &RevealContext)
//!                     │  ├─ ProfitPerCost(Cosine | TopicDivergence)
//!                     │  ├─ ShallowestFirst
//!                     │  ├─ LargestFirst
//!                     │  └─ JavadocsFirst
//!                     spend budget, reveal winner + ancestors
//!                   └──> FoldOutcome (revealed, folded, folded_lines)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use autofold_folding::{fold, Policy};
//! use autofold_protocol::{CharRange, LineSpan, Region, RegionKind};
//!
//! let regions = vec![
//!     Region::new(CharRange::new(0, 199), LineSpan::new(1, 10), None, RegionKind::Root)
//!         .with_terms(["main", "args"]),
//!     Region::new(CharRange::new(60, 139), LineSpan::new(4, 7), Some(0), RegionKind::Block)
//!         .with_terms(["loop"]),
//! ];
//!
//! let outcome = fold(regions, 6, &Policy::LargestFirst).unwrap();
//! assert_eq!(outcome.spent(), 6);
//! assert_eq!(outcome.folded(), vec![CharRange::new(60, 139)]);
//! ```

mod engine;
mod error;
mod policy;
mod settings;
mod tree;
mod vsm;

pub use engine::{fold, FoldOutcome, RevealedNode, UnfoldEngine};
pub use error::{FoldError, Result};
pub use policy::{Policy, ProfitOracle, RevealContext};
pub use settings::{budget_for_compression, FoldSettings, PolicyKind, TopicTarget};
pub use tree::{FoldableNode, FoldableTree, NodeId};
pub use vsm::{TermVector, TfScheme};
