//! Owned spawn state of one loaded world.
//!
//! [`WorldSpawnState`] owns the [`CreatureTypeRegistry`] and the
//! [`LivingHandlerRegistry`]. It is created when a world loads and replaced
//! wholesale when the next one loads; tick-time consumers borrow it
//! immutably, and [`rebuild`](WorldSpawnState::rebuild) takes `&mut self`.
//!
//! ```
//! use populace_config::backend::MemoryBackend;
//! use populace_core::category::NativeCategory;
//! use populace_engine::prelude::*;
//!
//! let host = StaticHost::new("Overworld")
//!     .with_biome("Plains")
//!     .with_living("mod1.Zombie", &[NativeCategory::Monster])
//!     .with_baseline("Plains", NativeCategory::Monster, "mod1.Zombie", 100, 2, 4);
//!
//! let mut store = MemoryBackend::new();
//! let (state, report) = WorldSpawnState::load(EngineSettings::default(), &host, &mut store);
//!
//! assert_eq!(report.entries_installed, 1);
//! assert_eq!(state.spawn_list("MONSTER", "Plains")[0].weight(), 100);
//! ```

use rand::RngCore;
use serde::Serialize;

use populace_config::backend::StoreBackend;
use populace_config::ConfigError;
use populace_core::category::CreatureTypeRegistry;
use populace_core::policy::LivingPolicy;
use populace_core::spawn::SpawnEntry;

use crate::counter::{CategoryFilter, PopulationCounter, PopulationSnapshot};
use crate::despawn::{nearest_observer_distance_sq, DespawnDecision};
use crate::host::{eligible_entity_kinds, HostWorld, LiveEntity, Position, SpawnSite};
use crate::registry::{LivingHandlerRegistry, RebuildReport};
use crate::settings::EngineSettings;

/// Both registries of one loaded world.
#[derive(Debug)]
pub struct WorldSpawnState {
    categories: CreatureTypeRegistry,
    living: LivingHandlerRegistry,
}

impl WorldSpawnState {
    /// Build the state for `host`'s world with the built-in categories.
    pub fn load(
        settings: EngineSettings,
        host: &dyn HostWorld,
        backend: &mut dyn StoreBackend,
    ) -> (Self, RebuildReport) {
        Self::load_with_categories(settings, CreatureTypeRegistry::with_defaults(), host, backend)
    }

    /// Build the state with a caller-supplied category set.
    pub fn load_with_categories(
        settings: EngineSettings,
        categories: CreatureTypeRegistry,
        host: &dyn HostWorld,
        backend: &mut dyn StoreBackend,
    ) -> (Self, RebuildReport) {
        let mut state = Self {
            categories,
            living: LivingHandlerRegistry::new(settings),
        };
        let report = state.rebuild(host, backend);
        (state, report)
    }

    /// Rediscover entity kinds and rebuild every policy and spawn table.
    pub fn rebuild(&mut self, host: &dyn HostWorld, backend: &mut dyn StoreBackend) -> RebuildReport {
        let kinds = eligible_entity_kinds(host);
        let biomes = host.biomes();
        self.living
            .rebuild(&mut self.categories, &kinds, &biomes, host, backend)
    }

    pub fn categories(&self) -> &CreatureTypeRegistry {
        &self.categories
    }

    pub fn living(&self) -> &LivingHandlerRegistry {
        &self.living
    }

    /// Mutable access to the living registry, e.g. to register capabilities
    /// before a [`rebuild`](Self::rebuild).
    pub fn living_mut(&mut self) -> &mut LivingHandlerRegistry {
        &mut self.living
    }

    pub fn policy(&self, entity_kind: &str) -> Option<&LivingPolicy> {
        self.living.policy(entity_kind)
    }

    /// Installed entries of `category` in `biome`. Empty for unknown
    /// categories.
    pub fn spawn_list(&self, category: &str, biome: &str) -> &[SpawnEntry] {
        self.categories
            .get(category)
            .map(|c| c.spawn_list(biome))
            .unwrap_or(&[])
    }

    pub fn can_spawn_here(&self, entity_kind: &str, site: &dyn SpawnSite) -> bool {
        self.living.can_spawn_here(entity_kind, site)
    }

    /// Run one despawn evaluation for `entity` against `observers`.
    pub fn despawn(
        &self,
        entity: &mut dyn LiveEntity,
        observers: &[Position],
        rng: &mut dyn RngCore,
    ) -> DespawnDecision {
        let nearest = nearest_observer_distance_sq(entity.position(), observers);
        self.living.despawn_entity(entity, nearest, rng)
    }

    /// Population tallies of `entities`.
    pub fn snapshot<E: LiveEntity>(
        &self,
        entities: &[E],
        observers: &[Position],
        filter: &CategoryFilter,
    ) -> PopulationSnapshot {
        PopulationCounter::new(&self.categories, &self.living).snapshot(entities, observers, filter)
    }

    /// BLAKE3 hex digest of every spawn table and policy.
    ///
    /// Equal fingerprints mean two rebuilds produced identical state.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        #[derive(Serialize)]
        struct Fingerprinted<'a> {
            categories: &'a CreatureTypeRegistry,
            policies: Vec<(&'a str, &'a LivingPolicy)>,
        }

        let state = Fingerprinted {
            categories: &self.categories,
            policies: self.living.iter().collect(),
        };
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, &state).map_err(ConfigError::Serialize)?;
        Ok(hasher.finalize().to_hex().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EntityRecord, StaticHost};
    use populace_config::backend::MemoryBackend;
    use populace_core::category::NativeCategory;

    fn host() -> StaticHost {
        StaticHost::new("Overworld")
            .with_biome("Plains")
            .with_living("Cow", &[NativeCategory::Creature])
            .with_baseline("Plains", NativeCategory::Creature, "Cow", 8, 4, 4)
    }

    #[test]
    fn fingerprint_is_hex_digest() {
        let mut store = MemoryBackend::new();
        let (state, _) = WorldSpawnState::load(EngineSettings::default(), &host(), &mut store);
        let fingerprint = state.fingerprint().unwrap();
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_tracks_spawn_tables() {
        let mut store = MemoryBackend::new();
        let (mut state, _) = WorldSpawnState::load(EngineSettings::default(), &host(), &mut store);
        let before = state.fingerprint().unwrap();

        let empty = StaticHost::new("Overworld").with_biome("Plains");
        state.rebuild(&empty, &mut store);
        assert_ne!(state.fingerprint().unwrap(), before);
    }

    #[test]
    fn spawn_list_of_unknown_category_is_empty() {
        let mut store = MemoryBackend::new();
        let (state, _) = WorldSpawnState::load(EngineSettings::default(), &host(), &mut store);
        assert_eq!(state.spawn_list("creature", "Plains").len(), 1);
        assert!(state.spawn_list("DRAGON", "Plains").is_empty());
    }

    #[test]
    fn despawn_uses_nearest_observer() {
        let mut store = MemoryBackend::new();
        let (state, _) = WorldSpawnState::load(EngineSettings::default(), &host(), &mut store);
        let mut cow = EntityRecord::new("Cow", Position::new(10.0, 0.0, 0.0), 900);
        let observers = [Position::new(500.0, 0.0, 0.0), Position::new(0.0, 0.0, 0.0)];
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        assert_eq!(state.despawn(&mut cow, &observers, &mut rng), DespawnDecision::ResetAge);
        assert_eq!(cow.age, 0);
    }
}
