//! Interfaces the host simulation implements.
//!
//! The policy engine never sees the host's entity or world types. It only
//! talks to these traits:
//!
//! - [`HostWorld`]: registered entity kinds, biomes, native classification and
//!   baseline spawn tables. Consumed once per rebuild.
//! - [`LiveEntity`]: a living entity at tick time (kind, position, age, and
//!   the typed age-reset mutator).
//! - [`SpawnSite`]: location probes for a prospective spawn.
//!
//! [`StaticHost`] and [`EntityRecord`] are plain-data implementations used by
//! tests, benchmarks and hosts that precompute their tables.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use populace_core::category::NativeCategory;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by the host.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    /// The host could not instantiate a sample entity to probe its category.
    #[error("cannot instantiate a sample of '{entity_kind}': {reason}")]
    SampleUnavailable { entity_kind: String, reason: String },
}

// ---------------------------------------------------------------------------
// HostWorld
// ---------------------------------------------------------------------------

/// An entity kind as registered with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub entity_kind: String,
    /// Whether the kind is a living entity (only living kinds get policies).
    pub living: bool,
    /// Whether the kind is an abstract base that can never be instantiated.
    pub abstract_kind: bool,
}

/// One row of a host baseline spawn table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSpawn {
    pub entity_kind: String,
    pub weight: u32,
    pub min_group: u32,
    pub max_group: u32,
}

/// The host world, as seen during a registry rebuild.
pub trait HostWorld {
    /// Name of the loaded world. Selects the per-world override layer.
    fn world_name(&self) -> &str;

    /// Every entity kind registered with the host.
    fn registered_entities(&self) -> Vec<EntityDescriptor>;

    /// Every biome entity kinds may spawn in.
    fn biomes(&self) -> Vec<String>;

    /// Native categories of an instantiated sample of `entity_kind`, most
    /// specific first.
    fn classify_sample(&self, entity_kind: &str) -> Result<Vec<NativeCategory>, HostError>;

    /// Native categories derived from the kind's type alone. Used when no
    /// sample can be instantiated.
    fn classify_type(&self, entity_kind: &str) -> Vec<NativeCategory>;

    /// The host's baseline spawn list for `biome` and `category`, in table
    /// order.
    fn baseline_spawns(&self, biome: &str, category: NativeCategory) -> Vec<BaselineSpawn>;
}

/// Entity kinds eligible for a policy: living, non-abstract, in host
/// registration order.
pub fn eligible_entity_kinds(host: &dyn HostWorld) -> Vec<String> {
    host.registered_entities()
        .into_iter()
        .filter(|e| e.living && !e.abstract_kind)
        .map(|e| {
            info!(entity_kind = %e.entity_kind, "found entity kind");
            e.entity_kind
        })
        .collect()
}

// ---------------------------------------------------------------------------
// LiveEntity
// ---------------------------------------------------------------------------

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// A living entity at tick time.
pub trait LiveEntity {
    /// The entity kind, as used for policy lookup.
    fn entity_kind(&self) -> &str;

    fn position(&self) -> Position;

    /// Ticks since the entity's despawn-age counter was last reset.
    fn age(&self) -> u32;

    /// Reset the despawn-age counter to zero.
    fn reset_age(&mut self);
}

/// A plain-data [`LiveEntity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_kind: String,
    pub position: Position,
    pub age: u32,
}

impl EntityRecord {
    pub fn new(entity_kind: &str, position: Position, age: u32) -> Self {
        Self {
            entity_kind: entity_kind.to_owned(),
            position,
            age,
        }
    }
}

impl LiveEntity for EntityRecord {
    fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    fn position(&self) -> Position {
        self.position
    }

    fn age(&self) -> u32 {
        self.age
    }

    fn reset_age(&mut self) {
        self.age = 0;
    }
}

// ---------------------------------------------------------------------------
// SpawnSite
// ---------------------------------------------------------------------------

/// Location probes for a prospective spawn of one entity.
pub trait SpawnSite {
    /// The entity's own placement rule (light level, ground block, ...).
    fn native_location_check(&self) -> bool;

    /// Whether the entity's bounding box is free of blocks.
    fn bounds_clear(&self) -> bool;

    /// Whether the bounding box intersects other entities.
    fn collides(&self) -> bool;

    /// Whether the bounding box touches any liquid.
    fn in_liquid(&self) -> bool;
}

// ---------------------------------------------------------------------------
// StaticHost
// ---------------------------------------------------------------------------

/// A [`HostWorld`] backed by precomputed tables.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    world_name: String,
    entities: Vec<EntityDescriptor>,
    biomes: Vec<String>,
    /// Kinds missing here fail sample instantiation.
    sample_tags: HashMap<String, Vec<NativeCategory>>,
    type_tags: HashMap<String, Vec<NativeCategory>>,
    baselines: BTreeMap<(String, NativeCategory), Vec<BaselineSpawn>>,
}

impl StaticHost {
    /// An empty host world named `world_name`.
    pub fn new(world_name: &str) -> Self {
        Self {
            world_name: world_name.to_owned(),
            ..Self::default()
        }
    }

    /// Add a biome.
    pub fn with_biome(mut self, biome: &str) -> Self {
        self.biomes.push(biome.to_owned());
        self
    }

    /// Add a living kind whose samples and type both classify as `tags`.
    pub fn with_living(mut self, entity_kind: &str, tags: &[NativeCategory]) -> Self {
        self.push_entity(entity_kind, true, false);
        self.sample_tags.insert(entity_kind.to_owned(), tags.to_vec());
        self.type_tags.insert(entity_kind.to_owned(), tags.to_vec());
        self
    }

    /// Add a living kind that cannot be instantiated; only its type-level
    /// classification (`type_tags`) is available.
    pub fn with_unsampleable(mut self, entity_kind: &str, type_tags: &[NativeCategory]) -> Self {
        self.push_entity(entity_kind, true, false);
        self.type_tags.insert(entity_kind.to_owned(), type_tags.to_vec());
        self
    }

    /// Add a registered kind with explicit flags and no classification.
    pub fn with_entity(mut self, entity_kind: &str, living: bool, abstract_kind: bool) -> Self {
        self.push_entity(entity_kind, living, abstract_kind);
        self
    }

    /// Append a row to the baseline table of `(biome, category)`.
    pub fn with_baseline(
        mut self,
        biome: &str,
        category: NativeCategory,
        entity_kind: &str,
        weight: u32,
        min_group: u32,
        max_group: u32,
    ) -> Self {
        self.baselines
            .entry((biome.to_owned(), category))
            .or_default()
            .push(BaselineSpawn {
                entity_kind: entity_kind.to_owned(),
                weight,
                min_group,
                max_group,
            });
        self
    }

    fn push_entity(&mut self, entity_kind: &str, living: bool, abstract_kind: bool) {
        self.entities.push(EntityDescriptor {
            entity_kind: entity_kind.to_owned(),
            living,
            abstract_kind,
        });
    }
}

impl HostWorld for StaticHost {
    fn world_name(&self) -> &str {
        &self.world_name
    }

    fn registered_entities(&self) -> Vec<EntityDescriptor> {
        self.entities.clone()
    }

    fn biomes(&self) -> Vec<String> {
        self.biomes.clone()
    }

    fn classify_sample(&self, entity_kind: &str) -> Result<Vec<NativeCategory>, HostError> {
        self.sample_tags
            .get(entity_kind)
            .cloned()
            .ok_or_else(|| HostError::SampleUnavailable {
                entity_kind: entity_kind.to_owned(),
                reason: "no sample registered".to_owned(),
            })
    }

    fn classify_type(&self, entity_kind: &str) -> Vec<NativeCategory> {
        self.type_tags.get(entity_kind).cloned().unwrap_or_default()
    }

    fn baseline_spawns(&self, biome: &str, category: NativeCategory) -> Vec<BaselineSpawn> {
        self.baselines
            .get(&(biome.to_owned(), category))
            .cloned()
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
