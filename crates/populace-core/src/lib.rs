//! Populace Core -- Creature categories, policies, spawn entries and the
//! layered override resolver.
//!
//! This crate holds the data model of the Populace policy engine. Everything
//! here is plain data plus the [`PolicyResolver`](resolve::PolicyResolver)
//! that merges built-in defaults with user override records; the host-facing
//! orchestration lives in `populace-engine`.
//!
//! # Quick Start
//!
//! ```
//! use populace_core::prelude::*;
//! use populace_config::document::ConfigDocument;
//!
//! let categories = CreatureTypeRegistry::with_defaults();
//! let default = LivingPolicy::new("mod1.Zombie", "MONSTER", true, false, false, &categories);
//!
//! let mut global = ConfigDocument::new();
//! global.set(LIVING_HANDLER_SECTION, "mod1.Zombie", "MONSTER|false|false|true");
//!
//! let mut resolver = PolicyResolver::new(&categories, DEFAULT_DELIMITER);
//! let policy = resolver.resolve_policy(default, &mut [&mut global]);
//!
//! assert!(!policy.should_spawn());
//! assert!(policy.use_custom_location_check());
//! ```

#![deny(unsafe_code)]

pub mod category;
pub mod policy;
pub mod resolve;
pub mod spawn;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by category registration and lookup.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A category with this id is already registered.
    #[error("creature category '{id}' is already registered")]
    DuplicateCategory { id: String },

    /// `NONE` is reserved and cannot be registered.
    #[error("creature category 'NONE' is reserved")]
    ReservedCategory,

    /// The id does not name a registered category.
    #[error("unknown creature category '{id}'. Registered categories: [{registered}]")]
    UnknownCategory { id: String, registered: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::category::{CategoryId, CreatureCategory, CreatureTypeRegistry, NativeCategory};
    pub use crate::policy::LivingPolicy;
    pub use crate::resolve::{
        spawn_list_section, OverrideLayer, PolicyResolver, DEFAULT_DELIMITER,
        LIVING_HANDLER_SECTION, RECORD_FIELDS, SPAWN_LIST_SECTION,
    };
    pub use crate::spawn::{SpawnEntry, DEFAULT_PACK_SIZE};
    pub use crate::CoreError;
}
