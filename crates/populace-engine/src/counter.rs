//! Live population tallies.
//!
//! [`PopulationCounter::snapshot`] groups live entities by creature category
//! and entity kind. An entity's applicable policies are its kind's own policy
//! plus the policy of every living group containing the kind; each entity
//! counts at most once per category even when several of those policies name
//! the same category.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use populace_core::category::{CategoryId, CreatureCategory, CreatureTypeRegistry};

use crate::despawn::nearest_observer_distance_sq;
use crate::host::{LiveEntity, Position};
use crate::registry::LivingHandlerRegistry;
use crate::ReportError;

// ---------------------------------------------------------------------------
// CategoryFilter
// ---------------------------------------------------------------------------

/// Which categories a snapshot covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every registered category.
    All,
    /// One registered category.
    Only(CategoryId),
}

impl CategoryFilter {
    /// Wildcard accepted by [`parse`](Self::parse).
    pub const WILDCARD: &'static str = "*";

    /// Parse a user-supplied category name. `*` selects every category.
    ///
    /// # Errors
    ///
    /// [`ReportError::UnknownCategory`] if `name` is neither the wildcard nor
    /// a registered category.
    pub fn parse(name: &str, categories: &CreatureTypeRegistry) -> Result<Self, ReportError> {
        let name = name.trim();
        if name == Self::WILDCARD {
            return Ok(Self::All);
        }
        categories
            .get(name)
            .map(|c| Self::Only(c.id().clone()))
            .ok_or_else(|| ReportError::UnknownCategory {
                name: name.to_owned(),
                registered: categories.registered_ids(),
            })
    }

    pub fn matches(&self, id: &CategoryId) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == id,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// A total count and how many of those are despawn-eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub despawnable: usize,
}

impl Tally {
    fn record(&mut self, despawnable: bool) {
        self.total += 1;
        if despawnable {
            self.despawnable += 1;
        }
    }

    pub fn all_despawnable(&self) -> bool {
        self.despawnable == self.total
    }
}

/// Counts for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPopulation {
    pub id: CategoryId,
    pub tally: Tally,
    /// Per entity kind, sorted by kind.
    pub kinds: BTreeMap<String, Tally>,
}

impl CategoryPopulation {
    fn new(id: CategoryId) -> Self {
        Self {
            id,
            tally: Tally::default(),
            kinds: BTreeMap::new(),
        }
    }

    fn record(&mut self, entity_kind: &str, despawnable: bool) {
        self.tally.record(despawnable);
        self.kinds
            .entry(entity_kind.to_owned())
            .or_default()
            .record(despawnable);
    }
}

/// `MONSTER: 4 of 5 despawnable. [2]Skeleton, [2/3]mod1.Zombie`
///
/// Kinds are listed in byte order, so uppercase names sort first.
impl fmt::Display for CategoryPopulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.id)?;
        if self.tally.all_despawnable() {
            write!(f, "{}", self.tally.despawnable)?;
        } else {
            write!(f, "{} of {}", self.tally.despawnable, self.tally.total)?;
        }
        write!(f, " despawnable.")?;

        for (i, (kind, tally)) in self.kinds.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            if tally.all_despawnable() {
                write!(f, "[{}]{kind}", tally.total)?;
            } else {
                write!(f, "[{}/{}]{kind}", tally.despawnable, tally.total)?;
            }
        }
        Ok(())
    }
}

/// Population of one world, per matched category in registry order.
/// Categories with no live entities are present with zero counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationSnapshot {
    pub categories: Vec<CategoryPopulation>,
}

impl PopulationSnapshot {
    /// Counts for the category `id` (case-insensitive).
    pub fn category(&self, id: &str) -> Option<&CategoryPopulation> {
        let id = CategoryId::new(id);
        self.categories.iter().find(|c| c.id == id)
    }

    /// Sum of totals over every matched category.
    pub fn total(&self) -> usize {
        self.categories.iter().map(|c| c.tally.total).sum()
    }

    /// Sum of despawn-eligible counts over every matched category.
    pub fn despawnable(&self) -> usize {
        self.categories.iter().map(|c| c.tally.despawnable).sum()
    }

    /// Per entity kind, summed over categories.
    pub fn kind_totals(&self) -> BTreeMap<&str, Tally> {
        let mut totals: BTreeMap<&str, Tally> = BTreeMap::new();
        for (kind, tally) in self.categories.iter().flat_map(|c| c.kinds.iter()) {
            let sum = totals.entry(kind.as_str()).or_default();
            sum.total += tally.total;
            sum.despawnable += tally.despawnable;
        }
        totals
    }

    /// Whether `category` may still spawn over an area of `loaded_chunks`.
    /// A category missing from the snapshot counts as empty.
    pub fn below_cap(&self, category: &CreatureCategory, loaded_chunks: u32) -> bool {
        let live = self
            .categories
            .iter()
            .find(|c| c.id == *category.id())
            .map_or(0, |c| c.tally.total);
        live < category.cap_for_area(loaded_chunks) as usize
    }
}

impl fmt::Display for PopulationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, category) in self.categories.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{category}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PopulationCounter
// ---------------------------------------------------------------------------

/// Read-only aggregation over live entities.
#[derive(Debug, Clone, Copy)]
pub struct PopulationCounter<'a> {
    categories: &'a CreatureTypeRegistry,
    living: &'a LivingHandlerRegistry,
}

impl<'a> PopulationCounter<'a> {
    pub fn new(categories: &'a CreatureTypeRegistry, living: &'a LivingHandlerRegistry) -> Self {
        Self { categories, living }
    }

    /// Tally `entities` for every category matched by `filter`.
    ///
    /// Entities whose kind has no policy are ignored. Despawn eligibility is
    /// judged by the kind's [`LivingCapability`](crate::capability::LivingCapability)
    /// against the nearest of `observers`, without any random draw.
    pub fn snapshot<E: LiveEntity>(
        &self,
        entities: &[E],
        observers: &[Position],
        filter: &CategoryFilter,
    ) -> PopulationSnapshot {
        let mut categories: Vec<CategoryPopulation> = self
            .categories
            .iter()
            .filter(|c| filter.matches(c.id()))
            .map(|c| CategoryPopulation::new(c.id().clone()))
            .collect();
        let evaluator = self.living.evaluator();

        for entity in entities {
            let kind = entity.entity_kind();
            let policies = self.living.policies_for(kind);
            if policies.is_empty() {
                continue;
            }
            let nearest = nearest_observer_distance_sq(entity.position(), observers);
            let capability = self.living.capability_for(kind);

            let mut counted: HashSet<&CategoryId> = HashSet::new();
            for policy in policies {
                let Some(population) = categories.iter_mut().find(|c| policy.is_of_category(&c.id)) else {
                    continue;
                };
                if !counted.insert(policy.category()) {
                    continue;
                }
                let despawnable =
                    capability.is_despawn_eligible(policy, evaluator, entity.age(), nearest);
                population.record(kind, despawnable);
            }
        }

        PopulationSnapshot { categories }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
