use crate::error::{IndexerError, Result};
use autofold_extractor::Language;
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// A project directory under the projects root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDir {
    pub name: String,
    pub path: PathBuf,
}

/// Lists the immediate subdirectories of a root, one project each
pub struct ProjectScanner {
    root: PathBuf,
}

impl ProjectScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Projects sorted by name; hidden and ignored directories are skipped
    pub fn scan(&self) -> Result<Vec<ProjectDir>> {
        if !self.root.is_dir() {
            return Err(IndexerError::InvalidPath(self.root.display().to_string()));
        }

        let mut projects = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || is_ignored_name(&name) {
                continue;
            }
            projects.push(ProjectDir {
                name,
                path: entry.path(),
            });
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));

        log::info!("Found {} projects under {}", projects.len(), self.root.display());
        Ok(projects)
    }
}

/// A parsable source file inside a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated
    pub relative: String,
    pub language: Language,
}

/// Scanner for finding source files in a project
pub struct FileScanner {
    root: PathBuf,
    max_file_bytes: u64,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_bytes: 0,
        }
    }

    /// Skip files larger than `bytes` (0 = no limit)
    #[must_use]
    pub fn max_file_bytes(mut self, bytes: usize) -> Self {
        self.max_file_bytes = bytes as u64;
        self
    }

    /// Scan directory for source files (.gitignore aware), sorted by
    /// relative path
    pub fn scan(&self) -> Vec<SourceFile> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false);
        builder.filter_entry(move |entry| !FileScanner::is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    let language = Language::from_path(path);
                    if !language.supports_ast() {
                        continue;
                    }

                    if self.max_file_bytes > 0 {
                        if let Ok(meta) = entry.metadata() {
                            if meta.len() > self.max_file_bytes {
                                log::debug!(
                                    "Skipping large file {} ({} bytes > {})",
                                    path.display(),
                                    meta.len(),
                                    self.max_file_bytes
                                );
                                continue;
                            }
                        }
                    }

                    let Some(relative) = Self::relative_path(path, &self.root) else {
                        continue;
                    };
                    files.push(SourceFile {
                        path: path.to_path_buf(),
                        relative,
                        language,
                    });
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        log::debug!("Found {} source files in {}", files.len(), self.root.display());
        files
    }

    fn relative_path(path: &Path, root: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn is_ignored_scope(path: &Path, root: &Path) -> bool {
        if let Ok(relative) = path.strip_prefix(root) {
            for component in relative.components() {
                if let std::path::Component::Normal(name) = component {
                    if is_ignored_name(&name.to_string_lossy()) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn is_ignored_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    IGNORED_SCOPES.iter().any(|ignored| *ignored == lowered)
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    // caches / builds
    ".cache",
    "node_modules",
    "build",
    "dist",
    "target",
    ".venv",
    "__pycache__",
    // vendored code
    "vendor",
    "third_party",
    "third-party",
];
