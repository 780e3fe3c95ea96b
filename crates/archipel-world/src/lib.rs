//! Static rule tables and the world arena for the Archipel simulation.
//!
//! This crate holds everything the engines consult but never compute:
//! what each resource, building level, site level and research costs and
//! grants, bundled into an immutable [`Rules`] value, plus the [`World`]
//! arena holding every mutable entity by id.
//!
//! # Modules
//!
//! - [`building`] -- Building definitions, level lookups, slot categories.
//! - [`error`] -- Error types for arena operations.
//! - [`research`] -- Research costs and effects.
//! - [`resource`] -- Resource capacities, starting stocks, capped stock
//!   arithmetic.
//! - [`rules`] -- The [`Rules`] bundle and balance constants.
//! - [`site`] -- Resource site level tables.
//! - [`starting_world`] -- Default four-island archipelago.
//! - [`world`] -- The [`World`] arena and snapshot conversion.

pub mod building;
pub mod error;
pub mod research;
pub mod resource;
pub mod rules;
pub mod site;
pub mod starting_world;
pub mod world;

// Re-export primary types at crate root.
pub use building::{BuildingDefinition, BuildingLevel, BuildingTable, slot_category};
pub use error::WorldError;
pub use research::{ResearchDefinition, ResearchEffect, ResearchTable};
pub use resource::{ResourceDefinition, ResourceTable, add_capped, clamp_stock};
pub use rules::{Balance, Rules};
pub use site::{MAX_SITE_LEVEL, SiteLevel, SiteTable};
pub use starting_world::{create_starting_world, fresh_city, fresh_site};
pub use world::World;
