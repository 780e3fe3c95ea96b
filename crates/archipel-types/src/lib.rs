//! Shared type definitions for the Archipel simulation.
//!
//! This crate is the single source of truth for the entities and the wire
//! vocabulary used across the workspace. Every value that enters the
//! simulation (a snapshot file, a command body) is parsed into these types
//! exactly once.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers for all entities
//! - [`enums`] -- Resources, buildings, lifecycle states, satisfaction factors
//! - [`structs`] -- Entity records and the full world snapshot

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BuildingCategory, BuildingKind, BuildingStatus, NotificationKind, Research, Resource,
    ResourceTier, SatisfactionFactor, ShipKind, TaxRate, TransportState, UnitKind, Workplace,
};
pub use ids::{CityId, IslandId, NotificationId, PlayerId, TransportId};
pub use structs::{
    Building, BuildingEffect, CITY_SLOT_COUNT, City, Coordinates, Island, Notification, Player,
    PopulationReport, ResourceSite, SatisfactionFactors, Transport, WorldSnapshot,
};
