//! Populace Config -- Section-scoped key/value store for spawn overrides.
//!
//! This crate provides the persistence adapter used by the Populace policy
//! engine. Override records are plain strings addressed by a *section* and a
//! *key*, grouped into one [`ConfigDocument`](document::ConfigDocument) per
//! `(world, namespace)` pair.
//!
//! # Modules
//!
//! - [`document`]: The in-memory document (sections, comments, records).
//! - [`namespace`]: Inference of the namespace an entity kind belongs to.
//! - [`backend`]: Where documents live ([`FileBackend`](backend::FileBackend)
//!   for JSON files on disk, [`MemoryBackend`](backend::MemoryBackend) for
//!   tests and embedding).
//! - [`cache`]: The per-rebuild cache that loads documents lazily and saves
//!   every one of them exactly once on flush.
//!
//! # Example
//!
//! ```
//! use populace_config::backend::MemoryBackend;
//! use populace_config::cache::StoreCache;
//!
//! let mut backend = MemoryBackend::new();
//! {
//!     let mut cache = StoreCache::new(&mut backend);
//!     let doc = cache.document("Master", "Vanilla");
//!     doc.get_or_insert("creaturesettings.livinghandler", "Zombie", "MONSTER|true|false|false");
//!     cache.flush();
//! }
//! assert_eq!(
//!     backend.document("Master", "Vanilla").and_then(|d| d.get("creaturesettings.livinghandler", "Zombie")),
//!     Some("MONSTER|true|false|false")
//! );
//! ```

#![deny(unsafe_code)]

pub mod backend;
pub mod cache;
pub mod document;
pub mod namespace;

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading or saving store documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading a document from disk failed.
    #[error("failed to read store document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a document to disk failed.
    #[error("failed to write store document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document on disk is not valid JSON for a [`ConfigDocument`](document::ConfigDocument).
    #[error("failed to parse store document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a document failed.
    #[error("failed to serialize store document: {0}")]
    Serialize(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::backend::{FileBackend, MemoryBackend, StoreBackend};
    pub use crate::cache::StoreCache;
    pub use crate::document::{ConfigDocument, ConfigSection};
    pub use crate::namespace::{infer_namespace, BUILTIN_NAMESPACE};
    pub use crate::ConfigError;
}
