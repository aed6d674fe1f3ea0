use crate::language::Language;
use autofold_protocol::{LineIndex, Region, TermBag};

/// Regions and line table of one parsed file.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub(crate) language: Language,
    pub(crate) regions: Vec<Region>,
    pub(crate) line_index: LineIndex,
}

impl ExtractedFile {
    pub fn language(&self) -> Language {
        self.language
    }

    /// Regions in pre-order; index 0 is the whole file.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn line_count(&self) -> usize {
        self.line_index.line_count()
    }

    /// Every term of the file, whichever region owns it.
    pub fn file_terms(&self) -> TermBag {
        let mut bag = TermBag::new();
        for region in &self.regions {
            bag.merge(&region.terms);
        }
        bag
    }
}
