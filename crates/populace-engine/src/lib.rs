//! Populace Engine -- Spawn/despawn policy orchestration for a host world.
//!
//! This crate builds on [`populace_core`] and [`populace_config`] to turn a
//! host's entity kinds, biomes and baseline spawn tables into resolved
//! per-kind policies and per-biome spawn tables, then answers the tick-time
//! questions: may this entity spawn here, does it despawn now, and what does
//! the live population look like.
//!
//! # Quick Start
//!
//! ```
//! use populace_config::backend::MemoryBackend;
//! use populace_core::category::NativeCategory;
//! use populace_engine::prelude::*;
//!
//! let host = StaticHost::new("Overworld")
//!     .with_biome("Plains")
//!     .with_living("Cow", &[NativeCategory::Creature])
//!     .with_baseline("Plains", NativeCategory::Creature, "Cow", 8, 4, 4);
//!
//! // Overrides live in the store; this one stops cows from spawning.
//! let mut store = MemoryBackend::new().with_record(
//!     "Master",
//!     "Vanilla",
//!     LIVING_HANDLER_SECTION,
//!     "Cow",
//!     "CREATURE|false|false|false",
//! );
//!
//! let (state, report) = WorldSpawnState::load(EngineSettings::default(), &host, &mut store);
//! assert_eq!(report.kinds_registered, 1);
//! assert!(!state.policy("Cow").unwrap().should_spawn());
//! assert!(state.spawn_list("CREATURE", "Plains").is_empty());
//! ```

#![deny(unsafe_code)]

pub mod capability;
pub mod counter;
pub mod despawn;
pub mod host;
pub mod logging;
pub mod registry;
pub mod report;
pub mod settings;
pub mod spawn_table;
pub mod state;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use populace_core;

/// Re-export the store crate for convenience.
pub use populace_config;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Rejections of a composition request. These are user errors, reported
/// back to whoever asked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// No online player has this name.
    #[error("player '{player}' not found")]
    PlayerNotFound { player: String },

    /// The category name is neither `*` nor a registered category.
    #[error("unknown creature category '{name}'. Registered categories: [{registered}]")]
    UnknownCategory { name: String, registered: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the core prelude.
    pub use populace_core::prelude::*;

    pub use crate::capability::{CapabilityRegistry, LivingCapability, StandardCapability};
    pub use crate::counter::{CategoryFilter, CategoryPopulation, PopulationCounter, PopulationSnapshot, Tally};
    pub use crate::despawn::{nearest_observer_distance_sq, DespawnDecision, DespawnEvaluator};
    pub use crate::host::{
        eligible_entity_kinds, BaselineSpawn, EntityDescriptor, EntityRecord, HostError, HostWorld,
        LiveEntity, Position, SpawnSite, StaticHost,
    };
    pub use crate::logging::init_logging;
    pub use crate::registry::{LivingHandlerRegistry, RebuildReport};
    pub use crate::report::{composition, CompositionReport, CompositionRequest, PlayerWorld, PopulationSource};
    pub use crate::settings::{DespawnSettings, EngineSettings, DEFAULT_GLOBAL_LAYER};
    pub use crate::spawn_table::{BuiltTable, SpawnTableBuilder};
    pub use crate::state::WorldSpawnState;
    pub use crate::ReportError;

    // Store types for convenient access.
    pub use populace_config::backend::{FileBackend, MemoryBackend, StoreBackend};
    pub use populace_config::ConfigError;
}
