//! Named per-kind behaviors for location checks and despawning.
//!
//! Entity kinds that need custom placement or culling rules are assigned a
//! [`LivingCapability`] by name in
//! [`EngineSettings::capabilities`](crate::settings::EngineSettings::capabilities).
//! Unassigned kinds use the built-in [`StandardCapability`].

use std::collections::BTreeMap;
use std::fmt;

use rand::RngCore;
use tracing::warn;

use populace_core::policy::LivingPolicy;

use crate::despawn::{DespawnDecision, DespawnEvaluator};
use crate::host::{LiveEntity, SpawnSite};

/// Name under which [`StandardCapability`] is registered.
pub const STANDARD_CAPABILITY: &str = "standard";

/// Location and despawn behavior for the entity kinds it is assigned to.
///
/// Every method has a default implementation matching
/// [`StandardCapability`], so an implementation only overrides what differs.
/// A capability that changes [`evaluate_despawn`](Self::evaluate_despawn)
/// should change [`is_despawn_eligible`](Self::is_despawn_eligible) to match,
/// since population reports count through the latter.
pub trait LivingCapability: fmt::Debug {
    /// Whether `site` is a valid spawn location.
    ///
    /// Policies with `use_custom_location_check` defer to the entity's own
    /// rule; all others use the generic clear-bounds check.
    fn validate_location(&self, policy: &LivingPolicy, site: &dyn SpawnSite) -> bool {
        if policy.use_custom_location_check() {
            site.native_location_check()
        } else {
            site.bounds_clear() && !site.collides() && !site.in_liquid()
        }
    }

    /// Decide whether `entity` despawns this pass.
    fn evaluate_despawn(
        &self,
        policy: &LivingPolicy,
        evaluator: &DespawnEvaluator,
        entity: &mut dyn LiveEntity,
        nearest_observer_sq: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> DespawnDecision {
        evaluator.evaluate(policy, entity, nearest_observer_sq, rng)
    }

    /// Whether an entity of `age` would currently be eligible to despawn,
    /// without drawing or mutating anything.
    fn is_despawn_eligible(
        &self,
        policy: &LivingPolicy,
        evaluator: &DespawnEvaluator,
        age: u32,
        nearest_observer_sq: Option<f64>,
    ) -> bool {
        evaluator.is_despawn_eligible(policy, age, nearest_observer_sq)
    }
}

/// The default capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCapability;

impl LivingCapability for StandardCapability {}

/// Registry of named capabilities. Always contains
/// [`STANDARD_CAPABILITY`].
#[derive(Debug)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Box<dyn LivingCapability>>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityRegistry {
    /// A registry holding only the standard capability.
    pub fn new() -> Self {
        let mut capabilities: BTreeMap<String, Box<dyn LivingCapability>> = BTreeMap::new();
        capabilities.insert(STANDARD_CAPABILITY.to_owned(), Box::new(StandardCapability));
        Self { capabilities }
    }

    /// Register `capability` under `name`.
    ///
    /// Returns `false` if an earlier capability with the same name was
    /// replaced.
    pub fn register(&mut self, name: &str, capability: Box<dyn LivingCapability>) -> bool {
        match self.capabilities.insert(name.to_owned(), capability) {
            Some(previous) => {
                warn!(
                    name,
                    previous = ?previous,
                    "living capability was registered twice -- replacing the earlier one"
                );
                false
            }
            None => true,
        }
    }

    /// The capability registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn LivingCapability> {
        self.capabilities.get(name).map(Box::as_ref)
    }

    /// The standard capability.
    pub fn standard(&self) -> &dyn LivingCapability {
        self.get(STANDARD_CAPABILITY).unwrap_or(&StandardCapability)
    }

    /// Whether a capability is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
