//! Spawn entries: per (entity kind, biome) density parameters.

use serde::{Deserialize, Serialize};

/// Pack size (group radius) given to every derived entry.
pub const DEFAULT_PACK_SIZE: u32 = 4;

/// How often, relatively, one entity kind is picked in a biome, and how many
/// individuals spawn per pack.
///
/// Entries are immutable once built. An entry with `weight == 0` only exists
/// transiently as a "does not spawn here" placeholder and is never installed
/// into a category's table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawSpawnEntry")]
pub struct SpawnEntry {
    entity_kind: String,
    biome: String,
    weight: u32,
    pack_size: u32,
    min_group: u32,
    max_group: u32,
}

/// Wire shape of [`SpawnEntry`]; deserialized entries go through
/// [`SpawnEntry::new`] so the group bounds stay ordered.
#[derive(Deserialize)]
struct RawSpawnEntry {
    entity_kind: String,
    biome: String,
    weight: u32,
    pack_size: u32,
    min_group: u32,
    max_group: u32,
}

impl From<RawSpawnEntry> for SpawnEntry {
    fn from(raw: RawSpawnEntry) -> Self {
        Self::new(
            &raw.entity_kind,
            &raw.biome,
            raw.weight,
            raw.pack_size,
            raw.min_group,
            raw.max_group,
        )
    }
}

impl SpawnEntry {
    /// Build an entry. If `min_group > max_group`, `max_group` is raised to
    /// `min_group`.
    pub fn new(
        entity_kind: &str,
        biome: &str,
        weight: u32,
        pack_size: u32,
        min_group: u32,
        max_group: u32,
    ) -> Self {
        Self {
            entity_kind: entity_kind.to_owned(),
            biome: biome.to_owned(),
            weight,
            pack_size,
            min_group,
            max_group: max_group.max(min_group),
        }
    }

    /// The zero-weight placeholder used when the host has no baseline entry.
    pub fn placeholder(entity_kind: &str, biome: &str) -> Self {
        Self::new(entity_kind, biome, 0, DEFAULT_PACK_SIZE, 0, DEFAULT_PACK_SIZE)
    }

    pub fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    pub fn biome(&self) -> &str {
        &self.biome
    }

    /// Relative pick weight within the biome's table.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Group radius used when placing a pack.
    pub fn pack_size(&self) -> u32 {
        self.pack_size
    }

    pub fn min_group(&self) -> u32 {
        self.min_group
    }

    /// Always `>= min_group()`.
    pub fn max_group(&self) -> u32 {
        self.max_group
    }

    /// Whether this entry may be installed into a spawn table.
    pub fn is_spawnable(&self) -> bool {
        self.weight > 0
    }

    /// Canonical record encoding: `weight|packSize|minGroup|maxGroup`.
    pub fn encode(&self, delimiter: char) -> String {
        format!(
            "{}{d}{}{d}{}{d}{}",
            self.weight,
            self.pack_size,
            self.min_group,
            self.max_group,
            d = delimiter
        )
    }
}
