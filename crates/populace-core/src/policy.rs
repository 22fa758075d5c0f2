//! Resolved per-entity-kind spawn/despawn policy.

use serde::{Deserialize, Serialize};

use crate::category::{CategoryId, CreatureTypeRegistry};

/// The resolved `(category, should_spawn, force_despawn, location check)`
/// tuple for one entity kind (or living group).
///
/// Policies are immutable. A registry rebuild replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivingPolicy {
    entity_kind: String,
    category: CategoryId,
    should_spawn: bool,
    force_despawn: bool,
    use_custom_location_check: bool,
}

impl LivingPolicy {
    /// Build a policy. A category not registered in `categories` collapses to
    /// `NONE`.
    pub fn new(
        entity_kind: &str,
        category: &str,
        should_spawn: bool,
        force_despawn: bool,
        use_custom_location_check: bool,
        categories: &CreatureTypeRegistry,
    ) -> Self {
        Self {
            entity_kind: entity_kind.to_owned(),
            category: categories.resolve_or_none(category),
            should_spawn,
            force_despawn,
            use_custom_location_check,
        }
    }

    /// The default policy for a freshly discovered entity kind: spawns, is
    /// not force-despawned, uses the generic location check.
    pub fn default_for(
        entity_kind: &str,
        category: &CategoryId,
        categories: &CreatureTypeRegistry,
    ) -> Self {
        Self::new(entity_kind, category.as_str(), true, false, false, categories)
    }

    /// Same flags and category, different key. Used to seed living-group
    /// policies from a member kind.
    pub fn rekeyed(&self, entity_kind: &str) -> Self {
        Self {
            entity_kind: entity_kind.to_owned(),
            ..self.clone()
        }
    }

    pub fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    pub fn category(&self) -> &CategoryId {
        &self.category
    }

    pub fn should_spawn(&self) -> bool {
        self.should_spawn
    }

    pub fn force_despawn(&self) -> bool {
        self.force_despawn
    }

    pub fn use_custom_location_check(&self) -> bool {
        self.use_custom_location_check
    }

    /// Whether spawn tables should be generated for this policy.
    pub fn generates_spawns(&self) -> bool {
        self.should_spawn && !self.category.is_none()
    }

    /// Whether the policy places its entity in `category`. Never true for
    /// `NONE`.
    pub fn is_of_category(&self, category: &CategoryId) -> bool {
        !self.category.is_none() && self.category == *category
    }

    /// Canonical record encoding:
    /// `CATEGORY|shouldSpawn|forceDespawn|useCustomLocationCheck`.
    pub fn encode(&self, delimiter: char) -> String {
        format!(
            "{}{d}{}{d}{}{d}{}",
            self.category,
            self.should_spawn,
            self.force_despawn,
            self.use_custom_location_check,
            d = delimiter
        )
    }
}
