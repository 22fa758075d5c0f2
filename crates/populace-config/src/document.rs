//! Section-scoped string records.
//!
//! A [`ConfigDocument`] is the in-memory form of one store file: a set of
//! named sections, each holding an optional comment and a sorted map of
//! `key -> raw record`. Section names are case-insensitive and always stored
//! lowercase, so `"CreatureSettings.LivingHandler"` and
//! `"creaturesettings.livinghandler"` address the same section.
//!
//! `BTreeMap` is used throughout so that saved documents have a stable,
//! diff-friendly ordering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single named section of a [`ConfigDocument`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    /// Free-form description shown to users editing the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Raw records keyed by entry name.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

/// One persisted store document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    sections: BTreeMap<String, ConfigSection>,
    #[serde(skip)]
    dirty: bool,
}

fn section_key(section: &str) -> String {
    section.to_ascii_lowercase()
}

impl ConfigDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a raw record without inserting anything.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section_key(section))
            .and_then(|s| s.entries.get(key))
            .map(String::as_str)
    }

    /// Return the record stored under `section`/`key`, inserting `default`
    /// first if no record exists.
    pub fn get_or_insert(&mut self, section: &str, key: &str, default: &str) -> String {
        let entries = &mut self.sections.entry(section_key(section)).or_default().entries;
        if let Some(existing) = entries.get(key) {
            return existing.clone();
        }
        entries.insert(key.to_owned(), default.to_owned());
        self.dirty = true;
        default.to_owned()
    }

    /// Overwrite (or create) the record stored under `section`/`key`.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        let value = value.into();
        let entries = &mut self.sections.entry(section_key(section)).or_default().entries;
        if entries.get(key) != Some(&value) {
            entries.insert(key.to_owned(), value);
            self.dirty = true;
        }
    }

    /// Remove a record, returning its previous value.
    pub fn remove(&mut self, section: &str, key: &str) -> Option<String> {
        let removed = self
            .sections
            .get_mut(&section_key(section))
            .and_then(|s| s.entries.remove(key));
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Attach a user-facing comment to a section, creating it if needed.
    pub fn set_comment(&mut self, section: &str, comment: impl Into<String>) {
        let comment = Some(comment.into());
        let entry = self.sections.entry(section_key(section)).or_default();
        if entry.comment != comment {
            entry.comment = comment;
            self.dirty = true;
        }
    }

    /// The section with the given name, if present.
    pub fn section(&self, section: &str) -> Option<&ConfigSection> {
        self.sections.get(&section_key(section))
    }

    /// Iterate over `(section name, section)` pairs in sorted order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &ConfigSection)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Total number of records across all sections.
    pub fn record_count(&self) -> usize {
        self.sections.values().map(|s| s.entries.len()).sum()
    }

    /// Whether the document was modified since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the modification flag. Called by backends after a save.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON. The result is clean.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION: &str = "CreatureSettings.LivingHandler";

    #[test]
    fn get_or_insert_materializes_default_once() {
        let mut doc = ConfigDocument::new();
        assert_eq!(doc.get_or_insert(SECTION, "Zombie", "A"), "A");
        assert!(doc.is_dirty());
        doc.mark_clean();

        // A second call returns the stored record, not the new default.
        assert_eq!(doc.get_or_insert(SECTION, "Zombie", "B"), "A");
        assert!(!doc.is_dirty());
    }

    #[test]
    fn section_names_are_case_insensitive() {
        let mut doc = ConfigDocument::new();
        doc.set(SECTION, "Zombie", "x");
        assert_eq!(doc.get("creaturesettings.livinghandler", "Zombie"), Some("x"));
        assert!(doc.section("CREATURESETTINGS.LIVINGHANDLER").is_some());
    }

    #[test]
    fn setting_identical_value_keeps_document_clean() {
        let mut doc = ConfigDocument::new();
        doc.set(SECTION, "Zombie", "x");
        doc.mark_clean();
        doc.set(SECTION, "Zombie", "x");
        assert!(!doc.is_dirty());
        doc.set(SECTION, "Zombie", "y");
        assert!(doc.is_dirty());
    }

    #[test]
    fn comments_survive_json() {
        let mut doc = ConfigDocument::new();
        doc.set_comment(SECTION, "Editable Format: A|B");
        doc.set(SECTION, "Zombie", "x");

        let json = doc.to_json().unwrap();
        let restored = ConfigDocument::from_json(&json).unwrap();
        assert_eq!(
            restored.section(SECTION).and_then(|s| s.comment.as_deref()),
            Some("Editable Format: A|B")
        );
        assert_eq!(restored.get(SECTION, "Zombie"), Some("x"));
        assert!(!restored.is_dirty());
    }

    #[test]
    fn remove_reports_previous_value() {
        let mut doc = ConfigDocument::new();
        doc.set(SECTION, "Zombie", "x");
        assert_eq!(doc.remove(SECTION, "Zombie"), Some("x".to_owned()));
        assert_eq!(doc.remove(SECTION, "Zombie"), None);
        assert_eq!(doc.record_count(), 0);
    }
}
