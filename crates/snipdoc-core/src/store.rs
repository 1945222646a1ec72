//! Local document store with per-file undo history.
//!
//! The store owns the canonical documents directory and one [`UndoHistory`]
//! per resolved file path. Each history sits behind its own mutex, and every
//! mutation of a file (append, undo, create) holds that mutex from load to
//! persist, so two requests on the same file never interleave while requests
//! on different files run in parallel. Reads take no lock: files are replaced
//! by rename, so a reader sees either the old or the new document.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::docx::{DocxDocument, DocxError};
use crate::error::DocError;
use crate::history::UndoHistory;
use crate::naming::{is_managed, normalize_file_name};

/// Result of a successful append.
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    pub path: PathBuf,
    /// History length for the file after the append.
    pub undo_depth: usize,
}

/// Result of a successful undo.
#[derive(Debug, Clone)]
pub struct UndoOutcome {
    pub path: PathBuf,
    pub removed: String,
    pub remaining: usize,
}

type Slot = Arc<Mutex<UndoHistory>>;

pub struct DocumentStore {
    root: PathBuf,
    slots: DashMap<PathBuf, Slot>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("root", &self.root)
            .field("tracked_files", &self.slots.len())
            .finish()
    }
}

fn lock(slot: &Mutex<UndoHistory>) -> MutexGuard<'_, UndoHistory> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open a document, reporting a vanished file as not found.
fn open_existing(path: &Path, file_name: &str) -> Result<DocxDocument, DocError> {
    match DocxDocument::open(path) {
        Ok(doc) => Ok(doc),
        Err(DocxError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DocError::NotFound(file_name.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

impl DocumentStore {
    /// Open (creating if needed) the canonical documents directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DocError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let root = std::fs::canonicalize(&root)?;
        tracing::info!(root = %root.display(), "document store ready");
        Ok(Self {
            root,
            slots: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `name` inside the canonical directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, DocError> {
        Ok(self.root.join(normalize_file_name(name)?))
    }

    fn slot(&self, path: &Path) -> Slot {
        Arc::clone(self.slots.entry(path.to_path_buf()).or_default().value())
    }

    /// Resolve a caller-chosen directory, refusing anything outside the root.
    fn subdirectory(&self, dir: &Path) -> Result<PathBuf, DocError> {
        let invalid = || DocError::validation(format!("Invalid directory: {}", dir.display()));

        let joined = self.root.join(dir);
        let escapes = joined
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::CurDir));
        if escapes || !joined.starts_with(&self.root) {
            return Err(invalid());
        }

        std::fs::create_dir_all(&joined)?;
        // A symlink inside the root may still point elsewhere.
        let resolved = std::fs::canonicalize(&joined)?;
        if !resolved.starts_with(&self.root) {
            tracing::warn!(dir = %dir.display(), "directory resolves outside the store");
            return Err(invalid());
        }
        Ok(resolved)
    }

    /// Names of the managed documents in the canonical directory, sorted.
    pub fn list(&self) -> Result<Vec<String>, DocError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_managed(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Full text of a document, paragraphs joined with `\n`.
    pub fn read_text(&self, name: &str) -> Result<String, DocError> {
        let file_name = normalize_file_name(name)?;
        let path = self.root.join(&file_name);
        tracing::debug!(file = %file_name, "reading document");
        Ok(open_existing(&path, &file_name)?.text())
    }

    /// Create an empty document. Fails if the file already exists.
    pub fn create(&self, name: &str) -> Result<PathBuf, DocError> {
        let file_name = normalize_file_name(name)?;
        let path = self.root.join(&file_name);
        if path.exists() {
            tracing::warn!(file = %file_name, "create rejected, file exists");
            return Err(DocError::AlreadyExists(file_name));
        }

        let slot = self.slot(&path);
        let mut history = lock(&slot);
        match DocxDocument::new().save_new(&path) {
            Ok(()) => {}
            Err(DocxError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(DocError::AlreadyExists(file_name));
            }
            Err(e) => return Err(e.into()),
        }

        // Anything recorded for an earlier file at this path is meaningless now.
        history.clear();
        tracing::info!(file = %file_name, "created document");
        Ok(path)
    }

    /// Append `text` as a new paragraph, creating the document if absent.
    ///
    /// `dir` selects a subdirectory of the canonical directory (relative, or
    /// absolute under the root) and is created if missing. The text is
    /// recorded in the file's undo history only once the document has been
    /// written.
    pub fn append(
        &self,
        name: &str,
        text: &str,
        dir: Option<&Path>,
    ) -> Result<AppendOutcome, DocError> {
        if text.is_empty() {
            return Err(DocError::validation("No text provided"));
        }
        let file_name = normalize_file_name(name)?;
        let dir = match dir {
            Some(dir) => self.subdirectory(dir)?,
            None => self.root.clone(),
        };
        let path = dir.join(&file_name);

        let slot = self.slot(&path);
        let mut history = lock(&slot);

        let mut doc = if path.exists() {
            open_existing(&path, &file_name)?
        } else {
            DocxDocument::new()
        };
        let stored = doc.append_paragraph(text);
        doc.save(&path)?;
        history.push(stored);

        tracing::info!(
            path = %path.display(),
            chars = text.chars().count(),
            undo_depth = history.len(),
            "appended paragraph"
        );
        Ok(AppendOutcome {
            path,
            undo_depth: history.len(),
        })
    }

    /// Remove the most recently appended paragraph of a document.
    ///
    /// The paragraph is located by scanning from the end of the document for
    /// the first paragraph whose text equals the last history entry. If none
    /// matches, nothing changes.
    pub fn undo(&self, name: &str) -> Result<UndoOutcome, DocError> {
        let file_name = normalize_file_name(name)?;
        let path = self.root.join(&file_name);
        if !path.exists() {
            return Err(DocError::NotFound(file_name));
        }

        // Nothing was ever appended here, so there is no slot to lock.
        let Some(slot) = self.slots.get(&path).map(|s| Arc::clone(s.value())) else {
            return Err(DocError::NothingToUndo);
        };
        let mut history = lock(&slot);
        let Some(last) = history.last().map(str::to_owned) else {
            return Err(DocError::NothingToUndo);
        };

        let mut doc = open_existing(&path, &file_name)?;
        if doc.paragraph_count() == 0 {
            return Err(DocError::DocumentEmpty);
        }
        if !doc.remove_last_matching(&last) {
            tracing::warn!(file = %file_name, "last appended text no longer in document");
            return Err(DocError::UndoTextMissing);
        }
        doc.save(&path)?;
        history.pop();

        tracing::info!(file = %file_name, remaining = history.len(), "undid last append");
        Ok(UndoOutcome {
            path,
            removed: last,
            remaining: history.len(),
        })
    }

    /// Number of undoable appends recorded for `name` in the canonical directory.
    pub fn undo_depth(&self, name: &str) -> Result<usize, DocError> {
        Ok(self.history(name)?.len())
    }

    /// Recorded appends for `name`, oldest first.
    pub fn history(&self, name: &str) -> Result<Vec<String>, DocError> {
        let path = self.resolve(name)?;
        let slot = match self.slots.get(&path) {
            Some(slot) => Arc::clone(slot.value()),
            None => return Ok(Vec::new()),
        };
        let entries = lock(&slot).entries();
        Ok(entries)
    }
}
