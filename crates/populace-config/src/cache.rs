//! Per-rebuild document cache.
//!
//! During a registry rebuild every entity kind looks up its overrides in the
//! global and world documents of its namespace. [`StoreCache`] loads each
//! `(world, namespace)` document from the backend the first time it is
//! requested, hands out mutable access for the rest of the rebuild, and saves
//! every cached document exactly once in [`flush`](StoreCache::flush).

use std::collections::BTreeMap;

use tracing::{debug, error};

use crate::backend::StoreBackend;
use crate::document::ConfigDocument;
use crate::ConfigError;

/// Hook applied to every document handed out by the cache.
pub type DocumentInitializer<'b> = Box<dyn Fn(&mut ConfigDocument) + 'b>;

#[derive(Debug)]
struct CachedDocument {
    document: ConfigDocument,
    /// `false` when the backend failed to read the document. Such documents
    /// are served empty but never saved, so an unreadable file is not
    /// clobbered.
    writable: bool,
}

/// Outcome of [`StoreCache::flush`].
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Number of documents written.
    pub saved: usize,
    /// Documents skipped because they could not be read in the first place.
    pub skipped: usize,
    /// Save failures (the flush continues past them).
    pub errors: Vec<ConfigError>,
}

/// Lazily loaded, write-once-at-the-end view over a [`StoreBackend`].
pub struct StoreCache<'b> {
    backend: &'b mut dyn StoreBackend,
    documents: BTreeMap<(String, String), CachedDocument>,
    initializer: Option<DocumentInitializer<'b>>,
}

impl<'b> StoreCache<'b> {
    /// Create an empty cache over `backend`.
    pub fn new(backend: &'b mut dyn StoreBackend) -> Self {
        Self {
            backend,
            documents: BTreeMap::new(),
            initializer: None,
        }
    }

    /// Run `init` on every document handed out by
    /// [`document`](Self::document). The hook must be idempotent.
    pub fn with_initializer(mut self, init: impl Fn(&mut ConfigDocument) + 'b) -> Self {
        self.initializer = Some(Box::new(init));
        self
    }

    /// Mutable access to the document for `(world, namespace)`, loading it on
    /// first use.
    ///
    /// A backend read failure is logged and yields an empty, read-only
    /// document; it is never propagated.
    pub fn document(&mut self, world: &str, namespace: &str) -> &mut ConfigDocument {
        let backend = &mut *self.backend;
        let cached = self
            .documents
            .entry((world.to_owned(), namespace.to_owned()))
            .or_insert_with(|| match backend.load(world, namespace) {
                Ok(document) => {
                    debug!(world, namespace, records = document.record_count(), "loaded store document");
                    CachedDocument { document, writable: true }
                }
                Err(e) => {
                    error!(world, namespace, error = %e, "failed to load store document -- using defaults");
                    CachedDocument {
                        document: ConfigDocument::new(),
                        writable: false,
                    }
                }
            });

        if let Some(init) = &self.initializer {
            init(&mut cached.document);
        }
        &mut cached.document
    }

    /// Number of documents currently cached.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents have been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Save every cached document and release the cache.
    pub fn flush(self) -> FlushReport {
        let mut report = FlushReport::default();
        for ((world, namespace), cached) in self.documents {
            if !cached.writable {
                report.skipped += 1;
                continue;
            }
            match self.backend.save(&world, &namespace, &cached.document) {
                Ok(()) => report.saved += 1,
                Err(e) => {
                    error!(world = %world, namespace = %namespace, error = %e, "failed to save store document");
                    report.errors.push(e);
                }
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
