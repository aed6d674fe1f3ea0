//! Value types shared between the extractor, the topic model and the folding engine.
//!
//! A parsed file is described as an ordered list of [`Region`]s in pre-order:
//! region 0 covers the whole file, every other region names its enclosing
//! region by index and owns the terms no more specific region claimed.

use serde::{Deserialize, Serialize};

mod lines;
mod terms;

pub use lines::{LineIndex, LineSpan};
pub use terms::TermBag;

/// Inclusive byte range inside one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharRange {
    pub start: usize,
    pub end: usize,
}

impl CharRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Range covering `[start, end)` in half-open byte terms.
    ///
    /// An empty half-open span collapses onto its start offset.
    pub fn from_half_open(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.saturating_sub(1).max(start),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &CharRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// True when `self` ends strictly before `other` starts.
    pub fn precedes(&self, other: &CharRange) -> bool {
        self.end < other.start
    }
}

/// Syntactic role of a region, used by the documentation-first heuristic and
/// for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// The whole file.
    Root,
    /// Any other nested block.
    Block,
    /// Body of a class, struct, trait, impl, interface or enum.
    TypeBody,
    /// Body of a function, method or constructor.
    FunctionBody,
    /// Doc comment or docstring.
    Documentation,
    /// Plain block comment, or a run of line comments.
    Comment,
    /// Run of consecutive import statements.
    Imports,
    /// Run of consecutive field declarations.
    Fields,
}

impl RegionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::Root => "root",
            RegionKind::Block => "block",
            RegionKind::TypeBody => "type_body",
            RegionKind::FunctionBody => "function_body",
            RegionKind::Documentation => "documentation",
            RegionKind::Comment => "comment",
            RegionKind::Imports => "imports",
            RegionKind::Fields => "fields",
        }
    }
}

/// One foldable region of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub range: CharRange,
    pub lines: LineSpan,
    /// Index of the enclosing region; `None` only for the root.
    pub parent: Option<usize>,
    pub kind: RegionKind,
    /// Terms owned by this region and by none of its descendants.
    pub terms: TermBag,
}

impl Region {
    pub fn new(range: CharRange, lines: LineSpan, parent: Option<usize>, kind: RegionKind) -> Self {
        Self {
            range,
            lines,
            parent,
            kind,
            terms: TermBag::new(),
        }
    }

    #[must_use]
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for term in terms {
            self.terms.add(term);
        }
        self
    }
}
