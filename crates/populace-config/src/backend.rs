//! Storage backends for [`ConfigDocument`]s.
//!
//! A backend maps a `(world, namespace)` pair to one document. The policy
//! engine never touches files directly; it only sees the [`StoreBackend`]
//! trait, so hosts can plug in their own persistence.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::document::ConfigDocument;
use crate::ConfigError;

/// Subdirectory (per world) holding entity override documents.
pub const ENTITY_SUBDIR: &str = "entities";

/// File extension for store documents.
pub const DOCUMENT_EXTENSION: &str = "json";

// ---------------------------------------------------------------------------
// StoreBackend
// ---------------------------------------------------------------------------

/// Loads and saves store documents keyed by `(world, namespace)`.
pub trait StoreBackend {
    /// Load the document for `(world, namespace)`.
    ///
    /// A document that does not exist yet is not an error: implementations
    /// return an empty document.
    fn load(&mut self, world: &str, namespace: &str) -> Result<ConfigDocument, ConfigError>;

    /// Persist the document for `(world, namespace)`, replacing any previous
    /// contents.
    fn save(&mut self, world: &str, namespace: &str, document: &ConfigDocument)
        -> Result<(), ConfigError>;
}

// ---------------------------------------------------------------------------
// FileBackend
// ---------------------------------------------------------------------------

/// JSON files under a root directory:
/// `<root>/<world>/entities/<namespace>.json`.
///
/// A document that exists but cannot be parsed is renamed to
/// `<namespace>.json.corrupt` and treated as empty, so the next save writes a
/// clean file without destroying the user's edits.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `root`. Nothing is touched on disk until
    /// the first load or save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `(world, namespace)`.
    pub fn document_path(&self, world: &str, namespace: &str) -> PathBuf {
        self.root
            .join(world)
            .join(ENTITY_SUBDIR)
            .join(format!("{namespace}.{DOCUMENT_EXTENSION}"))
    }

    fn quarantine(path: &Path) {
        let mut aside = path.as_os_str().to_owned();
        aside.push(".corrupt");
        if let Err(e) = fs::rename(path, &aside) {
            warn!(path = %path.display(), error = %e, "could not move corrupt store document aside");
        }
    }
}

impl StoreBackend for FileBackend {
    fn load(&mut self, world: &str, namespace: &str) -> Result<ConfigDocument, ConfigError> {
        let path = self.document_path(world, namespace);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "store document not found -- starting empty");
                return Ok(ConfigDocument::new());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        match ConfigDocument::from_json(&text) {
            Ok(document) => Ok(document),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "store document is corrupt -- moving it aside and starting empty"
                );
                Self::quarantine(&path);
                Ok(ConfigDocument::new())
            }
        }
    }

    fn save(
        &mut self,
        world: &str,
        namespace: &str,
        document: &ConfigDocument,
    ) -> Result<(), ConfigError> {
        let path = self.document_path(world, namespace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = document.to_json().map_err(ConfigError::Serialize)?;
        fs::write(&path, json).map_err(|source| ConfigError::Write { path, source })
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Keeps documents in memory. Used by tests and by hosts that manage
/// persistence themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    documents: BTreeMap<(String, String), ConfigDocument>,
    save_count: usize,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a single record, creating the document if needed.
    pub fn with_record(
        mut self,
        world: &str,
        namespace: &str,
        section: &str,
        key: &str,
        value: &str,
    ) -> Self {
        self.documents
            .entry((world.to_owned(), namespace.to_owned()))
            .or_default()
            .set(section, key, value);
        self
    }

    /// The stored document for `(world, namespace)`, if one was ever saved
    /// or seeded.
    pub fn document(&self, world: &str, namespace: &str) -> Option<&ConfigDocument> {
        self.documents.get(&(world.to_owned(), namespace.to_owned()))
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are held.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of [`save`](StoreBackend::save) calls served.
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&mut self, world: &str, namespace: &str) -> Result<ConfigDocument, ConfigError> {
        let mut document = self.document(world, namespace).cloned().unwrap_or_default();
        document.mark_clean();
        Ok(document)
    }

    fn save(
        &mut self,
        world: &str,
        namespace: &str,
        document: &ConfigDocument,
    ) -> Result<(), ConfigError> {
        let mut stored = document.clone();
        stored.mark_clean();
        self.documents
            .insert((world.to_owned(), namespace.to_owned()), stored);
        self.save_count += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
