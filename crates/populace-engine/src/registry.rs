//! Entity kind -> resolved living policy.
//!
//! [`LivingHandlerRegistry::rebuild`] is the world-load pass that turns the
//! host's entity kinds and the override store into policies and spawn tables:
//!
//! 1. Clear every policy and every category's spawn tables.
//! 2. For each entity kind, classify it (sample first, type-level fallback),
//!    build the default policy, and resolve it through the global layer and
//!    then the world layer.
//! 3. For kinds whose policy spawns in a real category, build per-biome
//!    entries and install the ones with positive weight.
//! 4. Resolve living-group policies.
//! 5. Save every touched store document once.
//!
//! A rebuild never fails. Damaged records are repaired, unclassifiable kinds
//! fall back to `NONE`, and store errors are logged and reported in
//! [`RebuildReport`].

use std::collections::BTreeMap;

use rand::RngCore;
use tracing::{debug, info, warn};

use populace_config::backend::StoreBackend;
use populace_config::cache::StoreCache;
use populace_config::document::ConfigDocument;
use populace_config::namespace::infer_namespace;
use populace_config::ConfigError;
use populace_core::category::{CategoryId, CreatureTypeRegistry};
use populace_core::policy::LivingPolicy;
use populace_core::resolve::{
    living_handler_comment, spawn_list_comment, PolicyResolver, LIVING_HANDLER_SECTION,
    SPAWN_LIST_SECTION,
};
use populace_core::spawn::SpawnEntry;

use crate::capability::{CapabilityRegistry, LivingCapability};
use crate::despawn::{DespawnDecision, DespawnEvaluator};
use crate::host::{HostWorld, LiveEntity, SpawnSite};
use crate::settings::EngineSettings;
use crate::spawn_table::SpawnTableBuilder;

// ---------------------------------------------------------------------------
// RebuildReport
// ---------------------------------------------------------------------------

/// Summary of one [`LivingHandlerRegistry::rebuild`] pass.
#[derive(Debug, Default)]
pub struct RebuildReport {
    /// World whose override layer was applied.
    pub world: String,
    /// Entity kinds that received a policy.
    pub kinds_registered: usize,
    /// Of those, kinds whose spawn tables were generated.
    pub kinds_spawning: usize,
    /// Kinds whose sample could not be instantiated.
    pub sample_fallbacks: usize,
    /// Living groups that received a policy.
    pub groups_registered: usize,
    /// Spawn entries installed into category tables.
    pub entries_installed: usize,
    /// Resolved spawn entries dropped for zero weight.
    pub entries_dropped: usize,
    /// Override records rewritten because they were damaged.
    pub records_repaired: usize,
    /// Store documents saved at the end of the pass.
    pub documents_saved: usize,
    /// Store save failures.
    pub store_errors: Vec<ConfigError>,
}

// ---------------------------------------------------------------------------
// LivingHandlerRegistry
// ---------------------------------------------------------------------------

/// Resolved policies for one loaded world, plus the capabilities and despawn
/// thresholds used to apply them.
#[derive(Debug)]
pub struct LivingHandlerRegistry {
    settings: EngineSettings,
    capabilities: CapabilityRegistry,
    evaluator: DespawnEvaluator,
    policies: BTreeMap<String, LivingPolicy>,
    group_policies: BTreeMap<String, LivingPolicy>,
    /// Entity kind -> groups it belongs to (only groups with a policy).
    memberships: BTreeMap<String, Vec<String>>,
}

impl LivingHandlerRegistry {
    /// An empty registry. Call [`rebuild`](Self::rebuild) to populate it.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            evaluator: DespawnEvaluator::new(settings.despawn),
            settings,
            capabilities: CapabilityRegistry::new(),
            policies: BTreeMap::new(),
            group_policies: BTreeMap::new(),
            memberships: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn evaluator(&self) -> &DespawnEvaluator {
        &self.evaluator
    }

    /// Register a named capability. Returns `false` if one was replaced.
    pub fn register_capability(&mut self, name: &str, capability: Box<dyn LivingCapability>) -> bool {
        self.capabilities.register(name, capability)
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Rebuild every policy and spawn table for `entity_kinds` x `biomes`.
    ///
    /// Blocking and exclusive: nothing may consult the registries until it
    /// returns.
    pub fn rebuild(
        &mut self,
        categories: &mut CreatureTypeRegistry,
        entity_kinds: &[String],
        biomes: &[String],
        host: &dyn HostWorld,
        backend: &mut dyn StoreBackend,
    ) -> RebuildReport {
        self.policies.clear();
        self.group_policies.clear();
        self.memberships.clear();
        categories.reset_spawns();

        let world = host.world_name().to_owned();
        let mut report = RebuildReport {
            world: world.clone(),
            ..RebuildReport::default()
        };

        let delimiter = self.settings.delimiter;
        let mut cache = StoreCache::new(backend).with_initializer(move |doc: &mut ConfigDocument| {
            doc.set_comment(LIVING_HANDLER_SECTION, living_handler_comment(delimiter));
            doc.set_comment(SPAWN_LIST_SECTION, spawn_list_comment(delimiter));
        });

        let pending = {
            let categories: &CreatureTypeRegistry = categories;
            let mut resolver = PolicyResolver::new(categories, delimiter);
            let builder = SpawnTableBuilder::new(host, &self.settings.global_layer, &world);
            let mut pending: Vec<(CategoryId, SpawnEntry)> = Vec::new();

            for kind in entity_kinds {
                if self.policies.contains_key(kind) {
                    continue;
                }

                let provisional = self.classify(kind, host, categories, &mut report);
                let default = LivingPolicy::default_for(kind, &provisional, categories);
                let policy = self.resolve_layers(default, &world, &mut resolver, &mut cache);

                if policy.generates_spawns() {
                    let table = builder.build(&policy, biomes, &mut resolver, &mut cache);
                    report.kinds_spawning += 1;
                    report.entries_dropped += table.dropped;
                    pending.extend(table.entries.into_iter().map(|e| (policy.category().clone(), e)));
                } else {
                    debug!(
                        entity_kind = %kind,
                        should_spawn = policy.should_spawn(),
                        category = %policy.category(),
                        "not generating spawn entries"
                    );
                }
                self.policies.insert(kind.clone(), policy);
            }
            report.kinds_registered = self.policies.len();

            self.resolve_groups(&world, &mut resolver, &mut cache);
            report.groups_registered = self.group_policies.len();
            report.records_repaired = resolver.repaired_records();
            pending
        };

        for (category, entry) in pending {
            info!(
                entity_kind = %entry.entity_kind(),
                category = %category,
                biome = %entry.biome(),
                weight = entry.weight(),
                "adding spawn entry"
            );
            if categories.add_spawn(&category, entry) {
                report.entries_installed += 1;
            }
        }

        self.check_capability_assignments();

        let flush = cache.flush();
        report.documents_saved = flush.saved;
        report.store_errors = flush.errors;

        info!(
            world = %report.world,
            kinds = report.kinds_registered,
            spawning = report.kinds_spawning,
            entries = report.entries_installed,
            repaired = report.records_repaired,
            "living handler registry rebuilt"
        );
        report
    }

    /// Provisional category for `kind`: the first native tag the host reports
    /// that names a registered category.
    fn classify(
        &self,
        kind: &str,
        host: &dyn HostWorld,
        categories: &CreatureTypeRegistry,
        report: &mut RebuildReport,
    ) -> CategoryId {
        let tags = match host.classify_sample(kind) {
            Ok(tags) => tags,
            Err(e) => {
                warn!(entity_kind = %kind, error = %e, "falling back to type-level classification");
                report.sample_fallbacks += 1;
                host.classify_type(kind)
            }
        };
        tags.into_iter()
            .map(|native| native.category_id())
            .find(|id| categories.contains(id.as_str()))
            .unwrap_or_else(CategoryId::none)
    }

    fn resolve_layers(
        &self,
        default: LivingPolicy,
        world: &str,
        resolver: &mut PolicyResolver<'_>,
        cache: &mut StoreCache<'_>,
    ) -> LivingPolicy {
        let namespace = infer_namespace(default.entity_kind());
        let mut policy = default;
        for layer in [self.settings.global_layer.as_str(), world] {
            policy = resolver.apply_policy_layer(policy, cache.document(layer, &namespace));
        }
        policy
    }

    fn resolve_groups(
        &mut self,
        world: &str,
        resolver: &mut PolicyResolver<'_>,
        cache: &mut StoreCache<'_>,
    ) {
        for (group, members) in &self.settings.groups {
            let Some(seed) = members.iter().find_map(|m| self.policies.get(m)) else {
                debug!(group = %group, "no member of living group is registered -- skipping");
                continue;
            };
            let policy = self.resolve_layers(seed.rekeyed(group), world, resolver, cache);
            for member in members.iter().filter(|m| self.policies.contains_key(*m)) {
                self.memberships
                    .entry(member.clone())
                    .or_default()
                    .push(group.clone());
            }
            self.group_policies.insert(group.clone(), policy);
        }
    }

    fn check_capability_assignments(&self) {
        for (kind, name) in &self.settings.capabilities {
            if !self.capabilities.contains(name) {
                warn!(
                    entity_kind = %kind,
                    capability = %name,
                    "unknown living capability -- the standard one will be used"
                );
            }
        }
    }

    // -- lookups ------------------------------------------------------------

    /// The resolved policy of `entity_kind`.
    pub fn policy(&self, entity_kind: &str) -> Option<&LivingPolicy> {
        self.policies.get(entity_kind)
    }

    /// The resolved policy of a living group.
    pub fn group_policy(&self, group: &str) -> Option<&LivingPolicy> {
        self.group_policies.get(group)
    }

    /// Every policy that applies to `entity_kind`: its own first, then those
    /// of the groups containing it.
    pub fn policies_for(&self, entity_kind: &str) -> Vec<&LivingPolicy> {
        let own = self.policies.get(entity_kind);
        let groups = self
            .memberships
            .get(entity_kind)
            .into_iter()
            .flatten()
            .filter_map(|g| self.group_policies.get(g));
        own.into_iter().chain(groups).collect()
    }

    /// Iterate over `(entity kind, policy)` pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LivingPolicy)> {
        self.policies.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Number of entity kinds with a policy.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// The capability assigned to `entity_kind`.
    pub fn capability_for(&self, entity_kind: &str) -> &dyn LivingCapability {
        self.settings
            .capabilities
            .get(entity_kind)
            .and_then(|name| self.capabilities.get(name))
            .unwrap_or_else(|| self.capabilities.standard())
    }

    // -- tick-time decisions --------------------------------------------------

    /// Whether an entity of `entity_kind` may spawn at `site`. Unknown kinds
    /// never spawn through the policy engine.
    pub fn can_spawn_here(&self, entity_kind: &str, site: &dyn SpawnSite) -> bool {
        self.policy(entity_kind)
            .is_some_and(|policy| self.capability_for(entity_kind).validate_location(policy, site))
    }

    /// Run the despawn state machine for `entity`. Kinds without a policy are
    /// left to the host and always persist.
    pub fn despawn_entity(
        &self,
        entity: &mut dyn LiveEntity,
        nearest_observer_sq: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> DespawnDecision {
        let kind = entity.entity_kind().to_owned();
        match self.policy(&kind) {
            Some(policy) => self.capability_for(&kind).evaluate_despawn(
                policy,
                &self.evaluator,
                entity,
                nearest_observer_sq,
                rng,
            ),
            None => DespawnDecision::Persist,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
