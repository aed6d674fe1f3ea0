use crate::error::{IndexerError, Result};
use crate::scanner::{FileScanner, ProjectScanner, SourceFile};
use crate::stats::LoadStats;
use autofold_extractor::{ExtractorConfig, Language, RegionExtractor};
use autofold_topic_model::{Corpus, CorpusBuilder, TermAlphabet};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Terms of one parsed file, one sentence per region in node-id order.
#[derive(Debug, Clone)]
struct ParsedFile {
    sentences: Vec<Vec<String>>,
    lines: usize,
    language: Language,
}

/// Builds a topic-model corpus from a directory of projects.
///
/// Files are parsed on scoped worker threads; terms are interned
/// afterwards on the calling thread in project and path order, so term ids
/// do not depend on scheduling.
pub struct CorpusLoader {
    config: ExtractorConfig,
    workers: usize,
}

impl CorpusLoader {
    pub fn new(config: ExtractorConfig) -> Self {
        let workers = thread::available_parallelism().map_or(1, |n| n.get());
        Self { config, workers }
    }

    /// Cap the number of parser threads (at least one)
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Load every project under `root` into a corpus with a fresh alphabet.
    pub fn load(&self, root: impl AsRef<Path>) -> Result<(Corpus, LoadStats)> {
        self.load_into(root, Arc::new(TermAlphabet::new()))
    }

    /// Load every project under `root`, interning into `alphabet`.
    pub fn load_into(
        &self,
        root: impl AsRef<Path>,
        alphabet: Arc<TermAlphabet>,
    ) -> Result<(Corpus, LoadStats)> {
        let root = root.as_ref();
        let started = Instant::now();
        log::info!("Loading corpus from {}", root.display());

        let mut stats = LoadStats::new();
        let mut builder = CorpusBuilder::new(alphabet);

        for project in ProjectScanner::new(root).scan()? {
            let files = FileScanner::new(&project.path)
                .max_file_bytes(self.config.max_file_bytes)
                .scan();
            let parsed = self.parse_all(&files);

            let mut begun = false;
            for (file, result) in files.iter().zip(parsed) {
                match result {
                    Ok(parsed) => {
                        if !begun {
                            builder.begin_project(project.name.clone());
                            stats.projects += 1;
                            begun = true;
                        }
                        let tokens = parsed.sentences.iter().map(Vec::len).sum();
                        stats.add_file(
                            parsed.language.as_str(),
                            parsed.lines,
                            parsed.sentences.len(),
                            tokens,
                        );
                        builder.add_document(file.relative.clone(), parsed.sentences);
                    }
                    Err(e) => {
                        log::warn!("Skipping {}: {e}", file.path.display());
                        stats.add_skipped(format!("{}/{}", project.name, file.relative));
                    }
                }
            }
            if !begun {
                log::debug!("Project {} has no parsable files", project.name);
            }
        }

        if stats.files == 0 {
            return Err(IndexerError::EmptyCorpus(root.display().to_string()));
        }

        stats.time_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "Loaded {} files from {} projects: {} nodes, {} tokens, {} skipped ({} ms)",
            stats.files,
            stats.projects,
            stats.nodes,
            stats.tokens,
            stats.skipped.len(),
            stats.time_ms
        );
        Ok((builder.build(), stats))
    }

    /// Parse `files` in parallel, returning results in input order.
    fn parse_all(&self, files: &[SourceFile]) -> Vec<Result<ParsedFile>> {
        if files.is_empty() {
            return Vec::new();
        }
        let chunk_size = files.len().div_ceil(self.workers);

        thread::scope(|scope| {
            let handles: Vec<_> = files
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.parse_chunk(chunk)))
                .collect();

            let mut results = Vec::with_capacity(files.len());
            for (handle, chunk) in handles.into_iter().zip(files.chunks(chunk_size)) {
                match handle.join() {
                    Ok(parsed) => results.extend(parsed),
                    Err(_) => results.extend(chunk.iter().map(|file| {
                        Err(IndexerError::WorkerPanic(file.path.display().to_string()))
                    })),
                }
            }
            results
        })
    }

    fn parse_chunk(&self, files: &[SourceFile]) -> Vec<Result<ParsedFile>> {
        let mut extractors: HashMap<Language, RegionExtractor> = HashMap::new();
        files
            .iter()
            .map(|file| {
                let source = std::fs::read_to_string(&file.path)?;
                let extractor = match extractors.entry(file.language) {
                    std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                    std::collections::hash_map::Entry::Vacant(entry) => {
                        entry.insert(RegionExtractor::new(file.language, self.config.clone())?)
                    }
                };
                log::debug!("Processing file: {}", file.path.display());
                let extracted = extractor.extract(&source)?;
                let sentences = extracted
                    .regions()
                    .iter()
                    .map(|region| region.terms.occurrences().map(str::to_string).collect())
                    .collect();
                Ok(ParsedFile {
                    sentences,
                    lines: extracted.line_count(),
                    language: file.language,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sentences_align_with_regions() {
        let temp = tempdir().unwrap();
        let project = temp.path().join("demo");
        fs::create_dir_all(&project).unwrap();
        fs::write(
            project.join("lib.rs"),
            "fn parse(input: &str) {\n    let token = input;\n}\n",
        )
        .unwrap();

        let (corpus, stats) = CorpusLoader::new(ExtractorConfig::default())
            .with_workers(2)
            .load(temp.path())
            .unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.nodes, 2);
        let document = &corpus.projects()[0].documents()[0];
        assert_eq!(document.path(), "lib.rs");
        assert_eq!(document.sentences().len(), 2);
        assert_eq!(document.sentences()[1].tokens().len(), 2);
    }

    #[test]
    fn empty_root_is_an_error() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("empty")).unwrap();
        let err = CorpusLoader::new(ExtractorConfig::default())
            .load(temp.path())
            .unwrap_err();
        assert!(matches!(err, IndexerError::EmptyCorpus(_)));
    }
}
