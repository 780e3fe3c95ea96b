//! Core entity structs for the Archipel simulation.
//!
//! Covers the mutable records (`City`, `Building`, `Player`, `Transport`,
//! `ResourceSite`, `Island`, `Notification`) and the [`WorldSnapshot`]
//! plain-data tree used for persistence and full-state polling.
//!
//! These types are the single deserialization boundary: anything entering
//! the simulation is parsed into them once, and internal code works on
//! the typed values only.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{
    BuildingKind, BuildingStatus, NotificationKind, Research, Resource, SatisfactionFactor,
    ShipKind, TaxRate, TransportState, UnitKind,
};
use crate::ids::{CityId, IslandId, NotificationId, PlayerId, TransportId};

/// Number of building slots in every city.
pub const CITY_SLOT_COUNT: usize = 10;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Integer map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Coordinates {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
}

impl Coordinates {
    /// Build a coordinate pair.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// Stat bonuses granted by one level of a building.
///
/// Every field defaults to zero or empty, so a missing or unknown effect
/// degrades to "no effect" instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingEffect {
    /// Town hall: population growth per second at neutral satisfaction.
    pub population_growth: Decimal,
    /// Town hall: citizens fed without cereal (currently unused by the
    /// food balance).
    pub food_capacity: u32,
    /// Town hall: maximum population.
    pub population_capacity: u32,
    /// Windmill: citizens fed by the windmill.
    pub food_supply: u32,
    /// Windmill: highest cereal multiplier the owner may select.
    pub cereal_consumption_multiplier: u32,
    /// Academy: research points per assigned worker per second.
    pub research_points_per_worker: Decimal,
    /// Academy: maximum workers.
    pub max_workers: u32,
    /// Warehouse: extra storage capacity per resource.
    pub storage: BTreeMap<Resource, u32>,
    /// Warehouse: storage protected from pillage, reported only.
    pub secure_storage: BTreeMap<Resource, u32>,
    /// Barracks: unit trained at this level.
    pub unit_production: Option<UnitKind>,
    /// Port: ship class built at this level.
    pub ship_production: Option<ShipKind>,
    /// Port: loading speed.
    pub loading_speed: u32,
    /// Wall: defense points.
    pub defense: u32,
    /// Sawmill and mine: production bonus percentage per resource.
    pub resource_bonus: BTreeMap<Resource, u32>,
    /// Embassy: maximum number of colonies.
    pub max_colonies: u32,
    /// Architect's workshop: construction cost reduction percentage.
    pub cost_reduction: u32,
    /// Architect's workshop: construction time reduction percentage.
    pub time_reduction: u32,
    /// Baths: citizens kept clean.
    pub cleanliness_capacity: u32,
    /// Baths: satisfaction bonus.
    pub satisfaction_bonus: u32,
}

/// A building occupying one city slot.
///
/// Remaining construction time is never stored; it is derived from
/// `started_at` and `duration_secs` against the current time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Which static definition this building follows.
    pub kind: BuildingKind,
    /// Current level (1-based; an empty slot holds no building at all).
    pub level: u32,
    /// Lifecycle status.
    pub status: BuildingStatus,
    /// Effect currently applied.
    #[serde(default)]
    pub effect: BuildingEffect,
    /// Pre-upgrade effect kept while an upgrade is in progress.
    #[serde(default)]
    pub previous_effect: BuildingEffect,
    /// When the current construction started.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Construction duration in seconds.
    #[serde(default)]
    pub duration_secs: u64,
    /// Slot index inside the owning city.
    pub slot: usize,
    /// The city that owns this slot.
    pub city: CityId,
}

// ---------------------------------------------------------------------------
// Cities
// ---------------------------------------------------------------------------

/// Named bonus and malus contributions to satisfaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SatisfactionFactors {
    /// Positive contributions.
    pub bonus: BTreeMap<SatisfactionFactor, u32>,
    /// Negative contributions.
    pub malus: BTreeMap<SatisfactionFactor, u32>,
}

impl SatisfactionFactors {
    /// Sum of all bonus values.
    pub fn total_bonus(&self) -> u32 {
        self.bonus.values().fold(0_u32, |acc, v| acc.saturating_add(*v))
    }

    /// Sum of all malus values.
    pub fn total_malus(&self) -> u32 {
        self.malus.values().fold(0_u32, |acc, v| acc.saturating_add(*v))
    }
}

/// Diagnostic figures from the last population update of a city.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationReport {
    /// Cereal required this tick.
    pub cereal_needed: Decimal,
    /// Citizens fed by the town hall.
    pub nourished_by_town_hall: Decimal,
    /// Citizens fed by windmills.
    pub nourished_by_windmill: Decimal,
    /// Citizens fed by cereal.
    pub unfed: Decimal,
    /// Town hall plus windmill nourishment.
    pub total_food_supply: Decimal,
    /// Population change per second applied this tick.
    pub growth: Decimal,
    /// Cleanliness capacity relative to population, in percent.
    pub hygiene_percent: u32,
}

/// A city on an island.
///
/// Cities are never deleted; a city without an owner stays colonizable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Stable identifier.
    pub id: CityId,
    /// Display name.
    pub name: String,
    /// Owning player, `None` when the city is free to claim.
    #[serde(default)]
    pub owner: Option<PlayerId>,
    /// Island the city stands on.
    pub island: IslandId,
    /// Map position.
    pub coordinates: Coordinates,
    /// Building slots, some empty.
    pub slots: Vec<Option<Building>>,
    /// Resource stocks (gold included).
    #[serde(default)]
    pub stock: BTreeMap<Resource, Decimal>,
    /// Total population, free and working.
    #[serde(default)]
    pub population: Decimal,
    /// Workers on each island site.
    #[serde(default)]
    pub workers: BTreeMap<Resource, u32>,
    /// Workers in the academy.
    #[serde(default)]
    pub academy_workers: u32,
    /// Effective storage capacity per resource, refreshed every tick.
    #[serde(default)]
    pub storage_capacity: BTreeMap<Resource, Decimal>,
    /// Research production bonus percentage per resource.
    #[serde(default)]
    pub research_bonus: BTreeMap<Resource, u32>,
    /// Satisfaction contributions.
    #[serde(default)]
    pub satisfaction_factors: SatisfactionFactors,
    /// Satisfaction score, 0 to 100.
    #[serde(default)]
    pub satisfaction: u32,
    /// Whether the city suffers from plague.
    #[serde(default)]
    pub has_plague: bool,
    /// Selected tax band.
    #[serde(default)]
    pub tax_rate: TaxRate,
    /// Selected windmill cereal multiplier.
    #[serde(default = "default_windmill_multiplier")]
    pub windmill_multiplier: u32,
    /// Diagnostics from the last population update.
    #[serde(default)]
    pub population_report: PopulationReport,
}

const fn default_windmill_multiplier() -> u32 {
    1
}

impl City {
    /// Stock of a resource, zero when absent.
    pub fn stock_of(&self, resource: Resource) -> Decimal {
        self.stock.get(&resource).copied().unwrap_or(Decimal::ZERO)
    }

    /// Workers on the site of a resource, zero when absent.
    pub fn workers_on(&self, resource: Resource) -> u32 {
        self.workers.get(&resource).copied().unwrap_or(0)
    }

    /// Workers across all sites plus the academy.
    pub fn assigned_workers(&self) -> u32 {
        self.workers
            .values()
            .fold(self.academy_workers, |acc, w| acc.saturating_add(*w))
    }

    /// Population not assigned to any workplace, never negative.
    pub fn free_population(&self) -> Decimal {
        let free = self
            .population
            .saturating_sub(Decimal::from(self.assigned_workers()));
        free.max(Decimal::ZERO)
    }

    /// Iterate over occupied slots.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.slots.iter().flatten()
    }

    /// Iterate over complete buildings of a kind.
    pub fn complete_buildings(&self, kind: BuildingKind) -> impl Iterator<Item = &Building> {
        self.buildings()
            .filter(move |b| b.kind == kind && b.status == BuildingStatus::Complete)
    }

    /// The building in a slot, if any.
    pub fn building_at(&self, slot: usize) -> Option<&Building> {
        self.slots.get(slot).and_then(Option::as_ref)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier.
    pub id: PlayerId,
    /// Login name, unique.
    pub username: String,
    /// Plaintext credential.
    pub credential: String,
    /// Premium currency.
    pub diamonds: u64,
    /// Ships owned.
    pub ships: u32,
    /// Ships currently in port; never exceeds `ships`.
    pub ships_available: u32,
    /// Research point balance.
    pub research_points: Decimal,
    /// Unlocked research.
    #[serde(default)]
    pub unlocked_research: BTreeSet<Research>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

/// A shipment of goods between two cities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    /// Identifier unique within the active set.
    pub id: TransportId,
    /// City the cargo leaves from.
    pub source: CityId,
    /// City the cargo is delivered to.
    pub destination: CityId,
    /// Goods carried.
    pub cargo: BTreeMap<Resource, u32>,
    /// Ships committed.
    pub ships: u32,
    /// Player sending the goods.
    pub source_player: PlayerId,
    /// Player receiving the goods, if the destination has one.
    #[serde(default)]
    pub destination_player: Option<PlayerId>,
    /// Loading time in seconds.
    pub loading_secs: u64,
    /// One-way sailing time in seconds.
    pub travel_secs: u64,
    /// Seconds left in the current state.
    pub remaining_secs: u64,
    /// Current state.
    pub state: TransportState,
    /// Whether cargo and ships were already taken from the source.
    #[serde(default)]
    pub resources_deducted: bool,
    /// When the transport was cancelled, if it was.
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Islands and resource sites
// ---------------------------------------------------------------------------

/// An island hosting cities and shared resource sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    /// Stable identifier.
    pub id: IslandId,
    /// Display name.
    pub name: String,
    /// Map position.
    pub coordinates: Coordinates,
    /// The island's base-tier resource.
    pub base_resource: Resource,
    /// The island's advanced resource.
    pub advanced_resource: Resource,
    /// Cities standing on the island.
    pub cities: Vec<CityId>,
}

/// An island extraction site shared by every city on the island.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSite {
    /// Island hosting the site.
    pub island: IslandId,
    /// Resource the site yields.
    pub resource: Resource,
    /// Current level, 1 to 10.
    pub level: u32,
    /// Donations per city toward the next level; reset on level-up.
    #[serde(default)]
    pub donations: BTreeMap<CityId, BTreeMap<Resource, u32>>,
    /// Every donation ever made per city; never reset.
    #[serde(default)]
    pub history: BTreeMap<CityId, BTreeMap<Resource, u64>>,
    /// When the fully funded upgrade started.
    #[serde(default)]
    pub upgrade_started_at: Option<DateTime<Utc>>,
}

impl ResourceSite {
    /// Total donated toward the current level for one resource.
    pub fn donated(&self, resource: Resource) -> u32 {
        self.donations
            .values()
            .filter_map(|ledger| ledger.get(&resource))
            .fold(0_u32, |acc, v| acc.saturating_add(*v))
    }

    /// Total ever donated of one resource across all cities.
    pub fn historical_total(&self, resource: Resource) -> u64 {
        self.history
            .values()
            .filter_map(|ledger| ledger.get(&resource))
            .fold(0_u64, |acc, v| acc.saturating_add(*v))
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A message delivered to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable identifier.
    pub id: NotificationId,
    /// Human-readable text.
    pub message: String,
    /// Category.
    pub kind: NotificationKind,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Whether the player has read it.
    pub read: bool,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The full plain-data world tree.
///
/// Served to polling clients and written by the snapshot store. There is
/// no version negotiation: a snapshot that fails to parse is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// When the snapshot was taken.
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
    /// Simulated seconds elapsed since the world was created.
    #[serde(default)]
    pub tick: u64,
    /// Every player.
    #[serde(default)]
    pub players: Vec<Player>,
    /// Every island.
    #[serde(default)]
    pub islands: Vec<Island>,
    /// Every city.
    #[serde(default)]
    pub cities: Vec<City>,
    /// Every resource site.
    #[serde(default)]
    pub sites: Vec<ResourceSite>,
    /// Active transports.
    #[serde(default)]
    pub transports: Vec<Transport>,
    /// Notifications per player.
    #[serde(default)]
    pub notifications: BTreeMap<PlayerId, Vec<Notification>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_city() -> City {
        City {
            id: CityId::new(),
            name: String::from("Port Royal"),
            owner: None,
            island: IslandId::new(),
            coordinates: Coordinates::new(3, 4),
            slots: vec![None; CITY_SLOT_COUNT],
            stock: BTreeMap::new(),
            population: Decimal::from(40),
            workers: BTreeMap::new(),
            academy_workers: 0,
            storage_capacity: BTreeMap::new(),
            research_bonus: BTreeMap::new(),
            satisfaction_factors: SatisfactionFactors::default(),
            satisfaction: 50,
            has_plague: false,
            tax_rate: TaxRate::Low,
            windmill_multiplier: 1,
            population_report: PopulationReport::default(),
        }
    }

    #[test]
    fn missing_stock_defaults_to_zero() {
        let city = make_city();
        assert_eq!(city.stock_of(Resource::Marble), Decimal::ZERO);
        assert_eq!(city.workers_on(Resource::Wood), 0);
    }

    #[test]
    fn free_population_subtracts_all_workplaces() {
        let mut city = make_city();
        city.workers.insert(Resource::Wood, 10);
        city.workers.insert(Resource::Stone, 5);
        city.academy_workers = 5;
        assert_eq!(city.assigned_workers(), 20);
        assert_eq!(city.free_population(), Decimal::from(20));
    }

    #[test]
    fn free_population_never_negative() {
        let mut city = make_city();
        city.workers.insert(Resource::Wood, 100);
        assert_eq!(city.free_population(), Decimal::ZERO);
    }

    #[test]
    fn factor_totals() {
        let mut factors = SatisfactionFactors::default();
        factors.bonus.insert(SatisfactionFactor::Taxes, 30);
        factors.bonus.insert(SatisfactionFactor::Hygiene, 5);
        factors.malus.insert(SatisfactionFactor::Famine, 40);
        assert_eq!(factors.total_bonus(), 35);
        assert_eq!(factors.total_malus(), 40);
    }

    #[test]
    fn city_roundtrips_through_json() {
        let city = make_city();
        let json = serde_json::to_string(&city).ok();
        assert!(json.is_some());
        let back: Result<City, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(back.ok(), Some(city));
    }

    #[test]
    fn empty_snapshot_parses() {
        let snap: Result<WorldSnapshot, _> = serde_json::from_str("{}");
        assert!(snap.is_ok());
    }
}
