use crate::alphabet::TermAlphabet;
use crate::corpus::{Corpus, Document, Project, Sentence};
use crate::error::{Result, TopicModelError};
use crate::model::TopicModel;
use crate::topic::{Topic, TopicTables, N_BACKGROUND, N_TOPICS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

pub const MODEL_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedModel {
    schema_version: u32,
    vocab_size: usize,
    vocabulary: Vec<String>,
    alpha: [f64; N_TOPICS],
    beta: [f64; N_TOPICS],
    projects: Vec<PersistedProject>,
    background: Vec<PersistedTopic>,
    content: Vec<PersistedTopic>,
    document: Vec<Vec<PersistedTopic>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedProject {
    name: String,
    files: Vec<PersistedFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedFile {
    path: String,
    nodes: Vec<PersistedNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedNode {
    tokens: Vec<u32>,
    topics: Vec<u8>,
}

/// Sparse `(token, count)` pairs in ascending token order.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTopic {
    counts: Vec<(u32, u32)>,
}

impl From<&Topic> for PersistedTopic {
    fn from(topic: &Topic) -> Self {
        let mut counts: Vec<(u32, u32)> = topic.counts().iter().map(|(&t, &c)| (t, c)).collect();
        counts.sort_unstable();
        Self { counts }
    }
}

impl PersistedTopic {
    fn into_topic(self, vocab_size: usize) -> Result<Topic> {
        let mut counts = HashMap::with_capacity(self.counts.len());
        for (token, count) in self.counts {
            if token as usize >= vocab_size {
                return Err(TopicModelError::model_load(format!(
                    "topic token {token} outside vocabulary of {vocab_size}"
                )));
            }
            if count > 0 {
                counts.insert(token, count);
            }
        }
        Ok(Topic::from_counts(counts))
    }
}

impl TopicModel {
    /// Writes the model as JSON through a temporary sibling file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let persisted = PersistedModel {
            schema_version: MODEL_SCHEMA_VERSION,
            vocab_size: self.vocab_size,
            vocabulary: self.alphabet().terms(),
            alpha: self.alpha,
            beta: self.beta,
            projects: self
                .corpus
                .projects
                .iter()
                .map(|project| PersistedProject {
                    name: project.name.clone(),
                    files: project
                        .documents
                        .iter()
                        .map(|document| PersistedFile {
                            path: document.path.clone(),
                            nodes: document
                                .sentences
                                .iter()
                                .map(|s| PersistedNode {
                                    tokens: s.tokens.clone(),
                                    topics: s.topics.clone(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
            background: self.tables.background.iter().map(PersistedTopic::from).collect(),
            content: self.tables.content.iter().map(PersistedTopic::from).collect(),
            document: self
                .tables
                .document
                .iter()
                .map(|files| files.iter().map(PersistedTopic::from).collect())
                .collect(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &persisted)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Reads a model written by [`save`](Self::save) into a fresh alphabet.
    ///
    /// Any failure (missing file, corrupt JSON, schema mismatch,
    /// inconsistent tables) is reported as [`TopicModelError::ModelLoad`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TopicModelError::model_load(format!("cannot open {}: {e}", path.display()))
        })?;
        let persisted: PersistedModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| TopicModelError::model_load(format!("corrupt model {}: {e}", path.display())))?;
        if persisted.schema_version != MODEL_SCHEMA_VERSION {
            return Err(TopicModelError::model_load(format!(
                "Unsupported model schema_version {} (expected {MODEL_SCHEMA_VERSION})",
                persisted.schema_version
            )));
        }
        Self::from_persisted(persisted)
    }

    fn from_persisted(persisted: PersistedModel) -> Result<Self> {
        let vocab_size = persisted.vocab_size;
        if persisted.vocabulary.len() < vocab_size {
            return Err(TopicModelError::model_load(format!(
                "vocabulary has {} terms, model expects {vocab_size}",
                persisted.vocabulary.len()
            )));
        }
        for (k, (&a, &b)) in persisted.alpha.iter().zip(&persisted.beta).enumerate() {
            if !(a.is_finite() && a > 0.0 && b.is_finite() && b > 0.0) {
                return Err(TopicModelError::model_load(format!(
                    "hyperparameters of topic {k} are not positive: alpha={a} beta={b}"
                )));
            }
        }
        if persisted.background.len() != N_BACKGROUND
            || persisted.content.len() != persisted.projects.len()
            || persisted.document.len() != persisted.projects.len()
        {
            return Err(TopicModelError::model_load("topic tables do not match project list"));
        }

        let mut projects = Vec::with_capacity(persisted.projects.len());
        for (project, files) in persisted.projects.into_iter().zip(&persisted.document) {
            if project.files.len() != files.len() {
                return Err(TopicModelError::model_load(format!(
                    "project '{}' lists {} files but {} document topics",
                    project.name,
                    project.files.len(),
                    files.len()
                )));
            }
            let mut documents = Vec::with_capacity(project.files.len());
            for file in project.files {
                let mut sentences = Vec::with_capacity(file.nodes.len());
                for node in file.nodes {
                    sentences.push(restore_sentence(&file.path, node, vocab_size)?);
                }
                documents.push(Document {
                    path: file.path,
                    sentences,
                });
            }
            projects.push(Project {
                name: project.name,
                documents,
            });
        }

        let mut background: [Topic; N_BACKGROUND] = Default::default();
        for (slot, topic) in background.iter_mut().zip(persisted.background) {
            *slot = topic.into_topic(vocab_size)?;
        }
        let content = persisted
            .content
            .into_iter()
            .map(|t| t.into_topic(vocab_size))
            .collect::<Result<Vec<_>>>()?;
        let document = persisted
            .document
            .into_iter()
            .map(|files| {
                files
                    .into_iter()
                    .map(|t| t.into_topic(vocab_size))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let alphabet = Arc::new(TermAlphabet::from_terms(persisted.vocabulary));
        Ok(Self {
            corpus: Corpus::from_parts(alphabet, projects),
            tables: TopicTables {
                background,
                content,
                document,
            },
            alpha: persisted.alpha,
            beta: persisted.beta,
            vocab_size,
        })
    }
}

fn restore_sentence(path: &str, node: PersistedNode, vocab_size: usize) -> Result<Sentence> {
    if node.tokens.len() != node.topics.len() {
        return Err(TopicModelError::model_load(format!(
            "node in '{path}' has {} tokens but {} assignments",
            node.tokens.len(),
            node.topics.len()
        )));
    }
    let mut topic_counts = [0u32; N_TOPICS];
    for (&token, &topic) in node.tokens.iter().zip(&node.topics) {
        if token as usize >= vocab_size || topic as usize >= N_TOPICS {
            return Err(TopicModelError::model_load(format!(
                "node in '{path}' references token {token} / topic {topic} out of range"
            )));
        }
        topic_counts[topic as usize] += 1;
    }
    Ok(Sentence {
        tokens: node.tokens,
        topics: node.topics,
        topic_counts,
    })
}
