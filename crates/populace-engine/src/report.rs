//! Population composition reports for a player's world.

use std::fmt;

use serde::Serialize;

use crate::counter::{CategoryFilter, PopulationSnapshot};
use crate::host::{LiveEntity, Position};
use crate::state::WorldSpawnState;
use crate::ReportError;

/// The entities and observers loaded in one player's world.
#[derive(Debug, Clone, Copy)]
pub struct PlayerWorld<'a, E> {
    pub entities: &'a [E],
    pub observers: &'a [Position],
}

/// Locates players and the world they are in.
pub trait PopulationSource {
    type Entity: LiveEntity;

    /// The world `player` is in, or `None` if no such player is online.
    fn player_world(&self, player: &str) -> Option<PlayerWorld<'_, Self::Entity>>;
}

/// "Composition of category C (or all) in player P's world."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionRequest {
    pub player: String,
    /// Category name, or `*` / `None` for every category.
    pub category: Option<String>,
}

impl CompositionRequest {
    /// Every category around `player`.
    pub fn all(player: &str) -> Self {
        Self {
            player: player.to_owned(),
            category: None,
        }
    }

    /// One category around `player`.
    pub fn category(player: &str, category: &str) -> Self {
        Self {
            player: player.to_owned(),
            category: Some(category.to_owned()),
        }
    }
}

/// Result of a composition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionReport {
    pub player: String,
    pub snapshot: PopulationSnapshot,
}

impl fmt::Display for CompositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.snapshot)
    }
}

/// Answer `request` against `state`.
///
/// # Errors
///
/// [`ReportError::PlayerNotFound`] if `source` does not know the player, and
/// [`ReportError::UnknownCategory`] for an unknown category name. The player
/// is looked up first.
pub fn composition<S: PopulationSource>(
    state: &WorldSpawnState,
    source: &S,
    request: &CompositionRequest,
) -> Result<CompositionReport, ReportError> {
    let world = source
        .player_world(&request.player)
        .ok_or_else(|| ReportError::PlayerNotFound {
            player: request.player.clone(),
        })?;
    let filter = CategoryFilter::parse(
        request.category.as_deref().unwrap_or(CategoryFilter::WILDCARD),
        state.categories(),
    )?;

    Ok(CompositionReport {
        player: request.player.clone(),
        snapshot: state.snapshot(world.entities, world.observers, &filter),
    })
}
