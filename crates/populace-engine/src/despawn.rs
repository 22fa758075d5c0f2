//! Per-tick despawn decisions.
//!
//! [`DespawnEvaluator::evaluate`] is invoked once per entity per despawn pass.
//! It keeps no state between calls; everything it needs is the entity's
//! policy, the entity's age counter, the squared distance to the nearest
//! observer and a random source:
//!
//! 1. `force_despawn` policies despawn unconditionally.
//! 2. With no observer, the entity is treated as infinitely far away.
//! 3. Old (`age > age_threshold`) and far (`d² > far_distance_sq`) entities
//!    despawn with probability `1 / chance_denominator`.
//! 4. Entities near an observer (`d² < far_distance_sq`) have their age
//!    counter reset, whatever else happens.
//! 5. Otherwise nothing changes.
//!
//! The random draw happens only for entities past the age threshold, so the
//! random stream consumed by a pass depends only on which entities are old.

use rand::Rng;

use populace_core::policy::LivingPolicy;

use crate::host::{LiveEntity, Position};
use crate::settings::DespawnSettings;

/// Outcome of one despawn evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DespawnDecision {
    /// Remove the entity from the world.
    Despawn,
    /// The entity is near an observer; its age counter was reset to zero.
    ResetAge,
    /// Nothing happened.
    Persist,
}

/// Squared distance from `position` to the closest of `observers`, or `None`
/// if there are no observers.
pub fn nearest_observer_distance_sq(position: Position, observers: &[Position]) -> Option<f64> {
    observers
        .iter()
        .map(|o| position.distance_sq(o))
        .min_by(f64::total_cmp)
}

/// The despawn state machine, parameterized by [`DespawnSettings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DespawnEvaluator {
    settings: DespawnSettings,
}

impl Default for DespawnEvaluator {
    fn default() -> Self {
        Self::new(DespawnSettings::default())
    }
}

impl DespawnEvaluator {
    pub fn new(settings: DespawnSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DespawnSettings {
        &self.settings
    }

    /// Decide the fate of `entity` for this pass.
    ///
    /// Resets the entity's age counter whenever it is near an observer.
    pub fn evaluate<E, R>(
        &self,
        policy: &LivingPolicy,
        entity: &mut E,
        nearest_observer_sq: Option<f64>,
        rng: &mut R,
    ) -> DespawnDecision
    where
        E: LiveEntity + ?Sized,
        R: Rng + ?Sized,
    {
        if policy.force_despawn() {
            return DespawnDecision::Despawn;
        }

        let distance_sq = nearest_observer_sq.unwrap_or(f64::INFINITY);
        let far = distance_sq > self.settings.far_distance_sq;

        if entity.age() > self.settings.age_threshold && self.roll(rng) && far {
            DespawnDecision::Despawn
        } else if distance_sq < self.settings.far_distance_sq {
            entity.reset_age();
            DespawnDecision::ResetAge
        } else {
            DespawnDecision::Persist
        }
    }

    /// Whether an entity of `age` currently satisfies the culling criteria,
    /// ignoring the random draw. Never mutates anything.
    pub fn is_despawn_eligible(
        &self,
        policy: &LivingPolicy,
        age: u32,
        nearest_observer_sq: Option<f64>,
    ) -> bool {
        if policy.force_despawn() {
            return true;
        }
        let distance_sq = nearest_observer_sq.unwrap_or(f64::INFINITY);
        age > self.settings.age_threshold && distance_sq > self.settings.far_distance_sq
    }

    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_range(0..self.settings.chance_denominator.max(1)) == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
