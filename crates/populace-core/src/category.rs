//! Creature categories and the registry that owns their spawn tables.
//!
//! A [`CreatureCategory`] is a coarse classification (monster, passive
//! creature, ambient, water creature) that decides which host baseline table
//! applies to an entity kind and which per-biome spawn table its entries land
//! in. Categories are identified by an uppercase [`CategoryId`]; the reserved
//! id [`CategoryId::NONE`] means "no category" and is never registered.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spawn::SpawnEntry;
use crate::CoreError;

// ---------------------------------------------------------------------------
// CategoryId
// ---------------------------------------------------------------------------

/// Uppercase identifier of a creature category.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(String);

impl CategoryId {
    /// Reserved id for entity kinds that belong to no category.
    pub const NONE: &'static str = "NONE";
    pub const MONSTER: &'static str = "MONSTER";
    pub const CREATURE: &'static str = "CREATURE";
    pub const AMBIENT: &'static str = "AMBIENT";
    pub const WATERCREATURE: &'static str = "WATERCREATURE";

    /// Build an id, normalizing to uppercase and trimming whitespace.
    pub fn new(id: &str) -> Self {
        Self(id.trim().to_ascii_uppercase())
    }

    /// The `NONE` id.
    pub fn none() -> Self {
        Self(Self::NONE.to_owned())
    }

    /// Whether this is the `NONE` id.
    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategoryId({})", self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// NativeCategory
// ---------------------------------------------------------------------------

/// The host's own classification of an entity kind.
///
/// Hosts classify entity kinds into these tags and keep one baseline spawn
/// table per tag. Each tag corresponds to the built-in category of the same
/// name; custom categories have no native counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NativeCategory {
    Monster,
    Creature,
    Ambient,
    WaterCreature,
}

impl NativeCategory {
    /// Every native tag, in probe order.
    pub const ALL: [NativeCategory; 4] = [
        NativeCategory::Monster,
        NativeCategory::Creature,
        NativeCategory::Ambient,
        NativeCategory::WaterCreature,
    ];

    /// The category id this tag maps to.
    pub fn category_id(self) -> CategoryId {
        CategoryId::new(match self {
            NativeCategory::Monster => CategoryId::MONSTER,
            NativeCategory::Creature => CategoryId::CREATURE,
            NativeCategory::Ambient => CategoryId::AMBIENT,
            NativeCategory::WaterCreature => CategoryId::WATERCREATURE,
        })
    }

    /// The native tag for a category id, if the category is one of the
    /// built-in ones.
    pub fn from_category_id(id: &CategoryId) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.category_id() == *id)
    }
}

// ---------------------------------------------------------------------------
// CreatureCategory
// ---------------------------------------------------------------------------

/// A registered category and its per-biome spawn tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureCategory {
    id: CategoryId,
    /// Maximum population per 256 loaded chunks (see
    /// [`cap_for_area`](Self::cap_for_area)).
    spawn_cap: u32,
    /// Biome -> entries, in insertion order.
    spawns: BTreeMap<String, Vec<SpawnEntry>>,
}

impl CreatureCategory {
    /// Chunk area the spawn cap is expressed for.
    pub const CAP_AREA_CHUNKS: u32 = 256;

    /// Create a category with empty spawn tables.
    pub fn new(id: &str, spawn_cap: u32) -> Self {
        Self {
            id: CategoryId::new(id),
            spawn_cap,
            spawns: BTreeMap::new(),
        }
    }

    /// The category id.
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    /// Population cap per [`CAP_AREA_CHUNKS`](Self::CAP_AREA_CHUNKS) chunks.
    pub fn spawn_cap(&self) -> u32 {
        self.spawn_cap
    }

    /// Population cap scaled to `loaded_chunks` chunks.
    pub fn cap_for_area(&self, loaded_chunks: u32) -> u32 {
        let scaled =
            u64::from(self.spawn_cap) * u64::from(loaded_chunks) / u64::from(Self::CAP_AREA_CHUNKS);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// The spawn table for `biome` (empty if none).
    pub fn spawn_list(&self, biome: &str) -> &[SpawnEntry] {
        self.spawns.get(biome).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over `(biome, entries)` pairs in biome order.
    pub fn spawn_tables(&self) -> impl Iterator<Item = (&str, &[SpawnEntry])> {
        self.spawns.iter().map(|(b, e)| (b.as_str(), e.as_slice()))
    }

    /// Total number of installed entries across all biomes.
    pub fn entry_count(&self) -> usize {
        self.spawns.values().map(Vec::len).sum()
    }

    /// Drop every spawn table.
    pub fn reset_spawns(&mut self) {
        self.spawns.clear();
    }

    /// Append an entry to its biome's table. Zero-weight entries are refused.
    fn add_spawn(&mut self, entry: SpawnEntry) -> bool {
        if entry.weight() == 0 {
            return false;
        }
        self.spawns.entry(entry.biome().to_owned()).or_default().push(entry);
        true
    }
}

// ---------------------------------------------------------------------------
// CreatureTypeRegistry
// ---------------------------------------------------------------------------

/// The fixed set of creature categories for one loaded world.
///
/// Categories keep registration order, which is also the order reports and
/// iteration use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RegisteredCategories")]
pub struct CreatureTypeRegistry {
    categories: Vec<CreatureCategory>,
    #[serde(skip)]
    index: HashMap<CategoryId, usize>,
}

/// Wire shape of [`CreatureTypeRegistry`]: the categories alone, with the
/// lookup index rebuilt on the way in.
#[derive(Deserialize)]
struct RegisteredCategories {
    categories: Vec<CreatureCategory>,
}

impl From<RegisteredCategories> for CreatureTypeRegistry {
    fn from(wire: RegisteredCategories) -> Self {
        let index = wire
            .categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self {
            categories: wire.categories,
            index,
        }
    }
}

impl CreatureTypeRegistry {
    /// Create a registry with no categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the four built-in categories with their
    /// default spawn caps.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (id, cap) in [
            (CategoryId::MONSTER, 70),
            (CategoryId::CREATURE, 10),
            (CategoryId::AMBIENT, 15),
            (CategoryId::WATERCREATURE, 5),
        ] {
            registry
                .register(CreatureCategory::new(id, cap))
                .unwrap_or_else(|e| unreachable!("built-in categories are distinct: {e}"));
        }
        registry
    }

    /// Register a category.
    ///
    /// # Errors
    ///
    /// [`CoreError::DuplicateCategory`] if the id is already registered, and
    /// [`CoreError::ReservedCategory`] for the `NONE` id.
    pub fn register(&mut self, category: CreatureCategory) -> Result<(), CoreError> {
        if category.id.is_none() {
            return Err(CoreError::ReservedCategory);
        }
        if self.index.contains_key(&category.id) {
            return Err(CoreError::DuplicateCategory {
                id: category.id.to_string(),
            });
        }
        self.index.insert(category.id.clone(), self.categories.len());
        self.categories.push(category);
        Ok(())
    }

    /// Look up a category by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&CreatureCategory> {
        self.index
            .get(&CategoryId::new(id))
            .map(|&i| &self.categories[i])
    }

    /// Look up a category by id, failing with [`CoreError::UnknownCategory`].
    pub fn require(&self, id: &str) -> Result<&CreatureCategory, CoreError> {
        self.get(id).ok_or_else(|| CoreError::UnknownCategory {
            id: id.to_owned(),
            registered: self.registered_ids(),
        })
    }

    /// Whether `id` names a registered category.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&CategoryId::new(id))
    }

    /// `id` if registered, otherwise `NONE`.
    pub fn resolve_or_none(&self, id: &str) -> CategoryId {
        let id = CategoryId::new(id);
        if self.index.contains_key(&id) {
            id
        } else {
            CategoryId::none()
        }
    }

    /// Iterate over categories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CreatureCategory> {
        self.categories.iter()
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no categories are registered.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Clear the spawn tables of every category.
    pub fn reset_spawns(&mut self) {
        for category in &mut self.categories {
            category.reset_spawns();
        }
    }

    /// Install `entry` into the table of `category`.
    ///
    /// Returns `false` (and installs nothing) if the category is unknown or
    /// the entry has zero weight.
    pub fn add_spawn(&mut self, category: &CategoryId, entry: SpawnEntry) -> bool {
        match self.index.get(category) {
            Some(&i) => self.categories[i].add_spawn(entry),
            None => false,
        }
    }

    /// Total number of installed entries across all categories.
    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(CreatureCategory::entry_count).sum()
    }

    /// Comma-separated list of registered ids, for error messages.
    pub fn registered_ids(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(weight: u32, biome: &str) -> SpawnEntry {
        SpawnEntry::new("mod1.Zombie", biome, weight, 4, 1, 3)
    }

    #[test]
    fn category_ids_are_uppercased() {
        assert_eq!(CategoryId::new(" monster ").as_str(), "MONSTER");
        assert!(CategoryId::new("none").is_none());
    }

    #[test]
    fn native_categories_round_trip_through_ids() {
        for native in NativeCategory::ALL {
            assert_eq!(NativeCategory::from_category_id(&native.category_id()), Some(native));
        }
        assert_eq!(NativeCategory::from_category_id(&CategoryId::new("UNDERGROUND")), None);
    }

    #[test]
    fn defaults_register_builtin_categories_in_order() {
        let registry = CreatureTypeRegistry::with_defaults();
        let ids: Vec<&str> = registry.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, ["MONSTER", "CREATURE", "AMBIENT", "WATERCREATURE"]);
        assert!(registry.contains("monster"));
        assert!(!registry.contains("NONE"));
    }

    #[test]
    fn duplicate_and_reserved_ids_are_rejected() {
        let mut registry = CreatureTypeRegistry::with_defaults();
        assert!(matches!(
            registry.register(CreatureCategory::new("Monster", 1)),
            Err(CoreError::DuplicateCategory { .. })
        ));
        assert!(matches!(
            registry.register(CreatureCategory::new("none", 1)),
            Err(CoreError::ReservedCategory)
        ));
    }

    #[test]
    fn unknown_ids_collapse_to_none() {
        let registry = CreatureTypeRegistry::with_defaults();
        assert_eq!(registry.resolve_or_none("ambient").as_str(), "AMBIENT");
        assert!(registry.resolve_or_none("UNDERGROUND").is_none());
        assert!(matches!(
            registry.require("UNDERGROUND"),
            Err(CoreError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn zero_weight_entries_are_never_installed() {
        let mut registry = CreatureTypeRegistry::with_defaults();
        let monster = CategoryId::new(CategoryId::MONSTER);
        assert!(!registry.add_spawn(&monster, entry(0, "Plains")));
        assert!(registry.add_spawn(&monster, entry(10, "Plains")));
        assert!(!registry.add_spawn(&CategoryId::none(), entry(10, "Plains")));

        let table = registry.get("MONSTER").unwrap().spawn_list("Plains");
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].weight(), 10);
        assert_eq!(registry.entry_count(), 1);
    }

    #[test]
    fn reset_clears_every_table() {
        let mut registry = CreatureTypeRegistry::with_defaults();
        let monster = CategoryId::new(CategoryId::MONSTER);
        registry.add_spawn(&monster, entry(5, "Plains"));
        registry.add_spawn(&monster, entry(5, "Desert"));
        registry.reset_spawns();
        assert_eq!(registry.entry_count(), 0);
    }

    #[test]
    fn spawn_cap_scales_with_area() {
        let category = CreatureCategory::new("MONSTER", 70);
        assert_eq!(category.cap_for_area(256), 70);
        assert_eq!(category.cap_for_area(289), 79);
        assert_eq!(category.cap_for_area(0), 0);
    }

    #[test]
    fn spawn_cap_saturates_instead_of_wrapping() {
        let category = CreatureCategory::new("MONSTER", u32::MAX);
        assert_eq!(category.cap_for_area(u32::MAX), u32::MAX);
        assert_eq!(category.cap_for_area(512), u32::MAX);
    }

    #[test]
    fn deserialized_registry_answers_lookups() {
        let mut registry = CreatureTypeRegistry::with_defaults();
        registry.add_spawn(&CategoryId::new(CategoryId::AMBIENT), entry(5, "Swamp"));
        let json = serde_json::to_string(&registry).unwrap();
        let mut restored: CreatureTypeRegistry = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.get("ambient").unwrap().spawn_list("Swamp").len(), 1);
        assert!(restored.contains("WATERCREATURE"));
        assert!(matches!(
            restored.register(CreatureCategory::new("MONSTER", 1)),
            Err(CoreError::DuplicateCategory { .. })
        ));
        assert!(restored.add_spawn(&CategoryId::new(CategoryId::MONSTER), entry(3, "Plains")));
    }
}
