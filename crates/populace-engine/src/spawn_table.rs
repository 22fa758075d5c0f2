//! Per-biome spawn table construction.
//!
//! For each `(entity kind, biome)` pair, [`SpawnTableBuilder`] derives a
//! baseline entry from the host's native table, folds it through the global
//! and world override layers, and keeps it only if its weight is positive.
//! Without that filter every known entity kind would occupy a zero-chance
//! slot in every biome.

use tracing::debug;

use populace_config::cache::StoreCache;
use populace_config::namespace::infer_namespace;
use populace_core::category::NativeCategory;
use populace_core::policy::LivingPolicy;
use populace_core::resolve::PolicyResolver;
use populace_core::spawn::{SpawnEntry, DEFAULT_PACK_SIZE};

use crate::host::HostWorld;

/// Entries produced for one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltTable {
    /// Entries with positive weight, in biome order.
    pub entries: Vec<SpawnEntry>,
    /// Number of resolved entries discarded for zero weight.
    pub dropped: usize,
}

/// Builds spawn entries for one rebuild pass.
pub struct SpawnTableBuilder<'a> {
    host: &'a dyn HostWorld,
    /// Override layers (store world names), applied in order.
    layers: [&'a str; 2],
}

impl<'a> SpawnTableBuilder<'a> {
    pub fn new(host: &'a dyn HostWorld, global_layer: &'a str, world_layer: &'a str) -> Self {
        Self {
            host,
            layers: [global_layer, world_layer],
        }
    }

    /// The host's baseline entry for `policy`'s kind in `biome`.
    ///
    /// Looks the kind up in the host table of the native category matching
    /// the policy's category. A kind absent from that table (or a category
    /// with no native counterpart) yields a zero-weight placeholder.
    pub fn derive_baseline(&self, biome: &str, policy: &LivingPolicy) -> SpawnEntry {
        let kind = policy.entity_kind();
        NativeCategory::from_category_id(policy.category())
            .and_then(|native| {
                self.host
                    .baseline_spawns(biome, native)
                    .into_iter()
                    .find(|b| b.entity_kind == kind)
            })
            .map(|b| SpawnEntry::new(kind, biome, b.weight, DEFAULT_PACK_SIZE, b.min_group, b.max_group))
            .unwrap_or_else(|| SpawnEntry::placeholder(kind, biome))
    }

    /// Resolve the entry for `policy`'s kind in every biome.
    pub fn build(
        &self,
        policy: &LivingPolicy,
        biomes: &[String],
        resolver: &mut PolicyResolver<'_>,
        cache: &mut StoreCache<'_>,
    ) -> BuiltTable {
        let namespace = infer_namespace(policy.entity_kind());
        let mut table = BuiltTable::default();

        for biome in biomes {
            let mut entry = self.derive_baseline(biome, policy);
            for layer in self.layers {
                entry = resolver.apply_entry_layer(entry, cache.document(layer, &namespace));
            }

            if entry.is_spawnable() {
                table.entries.push(entry);
            } else {
                debug!(
                    entity_kind = %policy.entity_kind(),
                    biome = %biome,
                    "not adding spawn entry with zero weight"
                );
                table.dropped += 1;
            }
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;
    use populace_config::backend::MemoryBackend;
    use populace_core::category::CreatureTypeRegistry;
    use populace_core::resolve::{spawn_list_section, DEFAULT_DELIMITER};

    fn host() -> StaticHost {
        StaticHost::new("Overworld")
            .with_biome("Plains")
            .with_biome("Desert")
            .with_living("mod1.Zombie", &[NativeCategory::Monster])
            .with_baseline("Plains", NativeCategory::Monster, "mod1.Zombie", 100, 2, 4)
            .with_baseline("Desert", NativeCategory::Creature, "mod1.Zombie", 50, 1, 1)
    }

    fn biomes() -> Vec<String> {
        vec!["Plains".to_owned(), "Desert".to_owned()]
    }

    #[test]
    fn baseline_copies_native_row() {
        let categories = CreatureTypeRegistry::with_defaults();
        let host = host();
        let builder = SpawnTableBuilder::new(&host, "Master", "Overworld");
        let policy = LivingPolicy::new("mod1.Zombie", "MONSTER", true, false, false, &categories);

        let entry = builder.derive_baseline("Plains", &policy);
        assert_eq!(entry, SpawnEntry::new("mod1.Zombie", "Plains", 100, DEFAULT_PACK_SIZE, 2, 4));

        // Present only in another category's table: placeholder.
        assert!(!builder.derive_baseline("Desert", &policy).is_spawnable());
    }

    #[test]
    fn zero_weight_entries_are_dropped() {
        let categories = CreatureTypeRegistry::with_defaults();
        let host = host();
        let builder = SpawnTableBuilder::new(&host, "Master", "Overworld");
        let policy = LivingPolicy::new("mod1.Zombie", "MONSTER", true, false, false, &categories);

        let mut backend = MemoryBackend::new();
        let mut cache = StoreCache::new(&mut backend);
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let table = builder.build(&policy, &biomes(), &mut resolver, &mut cache);

        assert_eq!(table.entries.len(), 1);
        assert_eq!(table.entries[0].biome(), "Plains");
        assert_eq!(table.dropped, 1);
    }

    #[test]
    fn world_layer_can_enable_a_biome() {
        let categories = CreatureTypeRegistry::with_defaults();
        let host = host();
        let builder = SpawnTableBuilder::new(&host, "Master", "Overworld");
        let policy = LivingPolicy::new("mod1.Zombie", "MONSTER", true, false, false, &categories);

        let mut backend = MemoryBackend::new().with_record(
            "Overworld",
            "mod1",
            &spawn_list_section("Desert"),
            "mod1.Zombie",
            "7|4|1|2",
        );
        let mut cache = StoreCache::new(&mut backend);
        let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
        let table = builder.build(&policy, &biomes(), &mut resolver, &mut cache);

        assert_eq!(table.entries.len(), 2);
        assert_eq!(table.entries[1], SpawnEntry::new("mod1.Zombie", "Desert", 7, 4, 1, 2));
        assert_eq!(table.dropped, 0);
    }

    #[test]
    fn custom_category_has_no_baseline() {
        let mut categories = CreatureTypeRegistry::with_defaults();
        categories
            .register(populace_core::category::CreatureCategory::new("UNDERGROUND", 20))
            .unwrap();
        let host = host();
        let builder = SpawnTableBuilder::new(&host, "Master", "Overworld");
        let policy = LivingPolicy::new("mod1.Zombie", "UNDERGROUND", true, false, false, &categories);
        assert_eq!(builder.derive_baseline("Plains", &policy), SpawnEntry::placeholder("mod1.Zombie", "Plains"));
    }
}
