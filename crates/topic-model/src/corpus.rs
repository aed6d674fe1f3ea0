use crate::alphabet::TermAlphabet;
use crate::topic::N_TOPICS;
use std::sync::Arc;

/// Token sequence of one foldable node, plus its sampling state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sentence {
    pub(crate) tokens: Vec<u32>,
    pub(crate) topics: Vec<u8>,
    pub(crate) topic_counts: [u32; N_TOPICS],
}

impl Sentence {
    pub fn new(tokens: Vec<u32>) -> Self {
        Self {
            topics: vec![0; tokens.len()],
            tokens,
            topic_counts: [0; N_TOPICS],
        }
    }

    pub fn tokens(&self) -> &[u32] {
        &self.tokens
    }

    /// Current topic index of every token.
    pub fn topics(&self) -> &[u8] {
        &self.topics
    }

    pub fn topic_counts(&self) -> &[u32; N_TOPICS] {
        &self.topic_counts
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// One source file: its sentences indexed by node id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) path: String,
    pub(crate) sentences: Vec<Sentence>,
}

impl Document {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub(crate) name: String,
    pub(crate) documents: Vec<Document>,
}

impl Project {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_index(&self, path: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.path == path)
    }
}

/// Training text: projects of files of node sentences over a shared alphabet.
#[derive(Debug, Clone)]
pub struct Corpus {
    alphabet: Arc<TermAlphabet>,
    pub(crate) projects: Vec<Project>,
}

impl Corpus {
    pub fn alphabet(&self) -> &Arc<TermAlphabet> {
        &self.alphabet
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project_index(&self, name: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.name == name)
    }

    pub fn document_count(&self) -> usize {
        self.projects.iter().map(|p| p.documents.len()).sum()
    }

    pub fn sentence_count(&self) -> usize {
        self.documents().map(|d| d.sentences.len()).sum()
    }

    pub fn token_count(&self) -> usize {
        self.documents().map(Document::token_count).sum()
    }

    pub(crate) fn documents(&self) -> impl Iterator<Item = &Document> {
        self.projects.iter().flat_map(|p| p.documents.iter())
    }

    pub(crate) fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.documents().flat_map(|d| d.sentences.iter())
    }

    pub(crate) fn from_parts(alphabet: Arc<TermAlphabet>, projects: Vec<Project>) -> Self {
        Self { alphabet, projects }
    }
}

/// Incrementally assembles a [`Corpus`], interning terms as they arrive.
///
/// Sentences are kept even when empty so that sentence index and node id
/// stay aligned.
#[derive(Debug)]
pub struct CorpusBuilder {
    alphabet: Arc<TermAlphabet>,
    projects: Vec<Project>,
}

impl CorpusBuilder {
    pub fn new(alphabet: Arc<TermAlphabet>) -> Self {
        Self {
            alphabet,
            projects: Vec::new(),
        }
    }

    /// Starts a new project; following documents belong to it.
    pub fn begin_project(&mut self, name: impl Into<String>) -> &mut Self {
        self.projects.push(Project {
            name: name.into(),
            documents: Vec::new(),
        });
        self
    }

    /// Adds a document to the current project, one sentence per node.
    ///
    /// Starts an unnamed project if none was begun.
    pub fn add_document<N, T, S>(&mut self, path: impl Into<String>, nodes: N) -> &mut Self
    where
        N: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sentences = nodes
            .into_iter()
            .map(|terms| {
                let tokens = terms
                    .into_iter()
                    .map(|term| self.alphabet.intern(term.as_ref()))
                    .collect();
                Sentence::new(tokens)
            })
            .collect();
        if self.projects.is_empty() {
            self.begin_project("default");
        }
        if let Some(project) = self.projects.last_mut() {
            project.documents.push(Document {
                path: path.into(),
                sentences,
            });
        }
        self
    }

    pub fn build(self) -> Corpus {
        Corpus::from_parts(self.alphabet, self.projects)
    }
}
