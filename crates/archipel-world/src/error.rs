//! Error types for the `archipel-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use archipel_types::{CityId, IslandId, PlayerId, Resource, TransportId};

/// Errors that can occur while building or querying the world arena.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A city was not found in the arena.
    #[error("city not found: {0}")]
    CityNotFound(CityId),

    /// A player was not found in the arena.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// An island was not found in the arena.
    #[error("island not found: {0}")]
    IslandNotFound(IslandId),

    /// No resource site of that kind exists on the island.
    #[error("no {resource:?} site on island {island}")]
    SiteNotFound {
        /// The island searched.
        island: IslandId,
        /// The resource the site would yield.
        resource: Resource,
    },

    /// A transport was not found in the active set.
    #[error("transport not found: {0}")]
    TransportNotFound(TransportId),

    /// A city was inserted twice.
    #[error("duplicate city id: {0}")]
    DuplicateCity(CityId),

    /// An island was inserted twice.
    #[error("duplicate island id: {0}")]
    DuplicateIsland(IslandId),

    /// A player was inserted twice.
    #[error("duplicate player id: {0}")]
    DuplicatePlayer(PlayerId),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
