//! Enumeration types for the Archipel simulation.
//!
//! Resources, buildings, lifecycle states and the named satisfaction
//! factors. All enums serialize as `snake_case` strings except
//! [`TaxRate`], which travels as its numeric band (1, 2 or 3).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A stockable resource held by a city.
///
/// Thirteen resources are harvested by workers on island sites; gold is
/// produced by the free population through taxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    // --- Base tier ---
    /// Lumber from the island forest.
    Wood,
    /// Quarried stone.
    Stone,
    /// Iron ore.
    Iron,
    /// Papyrus from the reed ponds.
    Papyrus,
    /// Cereal, the food staple consumed by the population.
    Cereal,

    // --- Intermediate tier ---
    /// Horses from the ranch.
    Horse,
    /// Marble blocks.
    Marble,
    /// Glass from the glassworks.
    Glass,
    /// Meat from pastures.
    Meat,

    // --- Advanced tier ---
    /// Coal from the coal mine.
    Coal,
    /// Gunpowder from the laboratory.
    Gunpowder,
    /// Spices from the spice garden.
    Spices,
    /// Cotton from the cotton field.
    Cotton,

    // --- Currency ---
    /// Gold, produced by taxing the free population.
    Gold,
}

impl Resource {
    /// Every resource, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Wood,
        Self::Stone,
        Self::Iron,
        Self::Papyrus,
        Self::Cereal,
        Self::Horse,
        Self::Marble,
        Self::Glass,
        Self::Meat,
        Self::Coal,
        Self::Gunpowder,
        Self::Spices,
        Self::Cotton,
        Self::Gold,
    ];

    /// Resources that workers can harvest on an island site.
    pub const HARVESTABLE: [Self; 13] = [
        Self::Wood,
        Self::Stone,
        Self::Iron,
        Self::Papyrus,
        Self::Cereal,
        Self::Horse,
        Self::Marble,
        Self::Glass,
        Self::Meat,
        Self::Coal,
        Self::Gunpowder,
        Self::Spices,
        Self::Cotton,
    ];

    /// The tier of a harvestable resource, `None` for gold.
    pub const fn tier(self) -> Option<ResourceTier> {
        match self {
            Self::Wood | Self::Stone | Self::Iron | Self::Papyrus | Self::Cereal => {
                Some(ResourceTier::Base)
            }
            Self::Horse | Self::Marble | Self::Glass | Self::Meat => {
                Some(ResourceTier::Intermediate)
            }
            Self::Coal | Self::Gunpowder | Self::Spices | Self::Cotton => {
                Some(ResourceTier::Advanced)
            }
            Self::Gold => None,
        }
    }

    /// Whether workers can be assigned to harvest this resource.
    pub const fn is_harvestable(self) -> bool {
        self.tier().is_some()
    }

    /// Name of the island site that yields this resource.
    pub const fn site_name(self) -> &'static str {
        match self {
            Self::Wood => "forest",
            Self::Stone => "quarry",
            Self::Iron => "iron_mine",
            Self::Papyrus => "papyrus_pond",
            Self::Cereal => "grain_field",
            Self::Horse => "horse_ranch",
            Self::Marble => "marble_mine",
            Self::Glass => "glassworks",
            Self::Meat => "pasture",
            Self::Coal => "coal_mine",
            Self::Gunpowder => "gunpowder_lab",
            Self::Spices => "spice_garden",
            Self::Cotton => "cotton_field",
            Self::Gold => "treasury",
        }
    }
}

/// Progression tier of a harvestable resource.
///
/// Warehouse storage bonuses are granted per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTier {
    /// Wood, stone, iron, papyrus, cereal.
    Base,
    /// Horse, marble, glass, meat.
    Intermediate,
    /// Coal, gunpowder, spices, cotton.
    Advanced,
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// A type of building that can occupy a city slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Sets population growth and population capacity.
    TownHall,
    /// Feeds part of the population and scales cereal consumption.
    Windmill,
    /// Converts assigned workers into research points.
    Academy,
    /// Raises storage capacity per resource tier.
    Warehouse,
    /// Trains military units.
    Barracks,
    /// Builds ships and sets loading speed.
    Port,
    /// Raises city defense.
    Wall,
    /// Boosts wood production.
    Sawmill,
    /// Boosts stone, iron, cereal and papyrus production.
    Mine,
    /// Raises the colony limit.
    Embassy,
    /// Reduces construction cost and time in the city.
    ArchitectWorkshop,
    /// Provides cleanliness capacity and a satisfaction bonus.
    Baths,
}

impl BuildingKind {
    /// Every building kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::TownHall,
        Self::Windmill,
        Self::Academy,
        Self::Warehouse,
        Self::Barracks,
        Self::Port,
        Self::Wall,
        Self::Sawmill,
        Self::Mine,
        Self::Embassy,
        Self::ArchitectWorkshop,
        Self::Baths,
    ];
}

/// The slot category a building must be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    /// Ordinary city slots.
    General,
    /// Fortification slots.
    Defensive,
    /// Harbour slots.
    Marine,
}

/// Lifecycle status of a building in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingStatus {
    /// Under construction; start timestamp and duration are set.
    InProgress,
    /// Finished; the effect of the current level applies.
    Complete,
    /// Construction abandoned.
    Cancelled,
}

/// Military unit trained by a barracks level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Foot soldiers.
    Infantry,
    /// Ranged units.
    Archers,
    /// Mounted units.
    Cavalry,
}

/// Ship class produced by a port level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipKind {
    /// Basic cargo ship.
    Transport,
    /// Larger trading vessel.
    Merchant,
    /// Armed vessel.
    Warship,
}

// ---------------------------------------------------------------------------
// Transports
// ---------------------------------------------------------------------------

/// State of a shipment between two cities.
///
/// Delivery is implicit: a delivered transport leaves the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// Queued behind other shipments at the same port.
    Waiting,
    /// Cargo and ships committed, loading in port.
    Loading,
    /// Sailing toward the destination.
    InTransit,
    /// Ships sailing back to the source city.
    Returning,
    /// Cancelled before departure (terminal).
    Cancelled,
}

// ---------------------------------------------------------------------------
// Cities
// ---------------------------------------------------------------------------

/// Tax band chosen by the city owner.
///
/// The band multiplies gold income and grants a fixed satisfaction bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaxRate {
    /// Band 1: one gold per free citizen.
    #[default]
    Low,
    /// Band 2: two gold per free citizen.
    Medium,
    /// Band 3: three gold per free citizen.
    High,
}

impl TaxRate {
    /// Gold produced per free citizen per second.
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Satisfaction bonus granted by this band.
    pub const fn satisfaction_bonus(self) -> u32 {
        match self {
            Self::Low => 30,
            Self::Medium => 20,
            Self::High => 10,
        }
    }
}

impl TryFrom<u8> for TaxRate {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            other => Err(format!("tax rate must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<TaxRate> for u8 {
    fn from(rate: TaxRate) -> Self {
        match rate {
            TaxRate::Low => 1,
            TaxRate::Medium => 2,
            TaxRate::High => 3,
        }
    }
}

/// A named contribution to a city's satisfaction score.
///
/// Each factor is stored either in the bonus or the malus mapping of
/// [`SatisfactionFactors`](crate::structs::SatisfactionFactors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionFactor {
    /// Cereal shortage (malus).
    Famine,
    /// Crowding penalty (malus).
    Population,
    /// Active plague (malus).
    Plague,
    /// Tax band (bonus).
    Taxes,
    /// Generous windmill rations (bonus).
    Windmill,
    /// Bath houses (bonus).
    Baths,
    /// Hygiene above 100 percent (bonus).
    Hygiene,
}

/// Where a city sends its workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workplace {
    /// The city's academy, producing research points.
    Academy,
    /// The island site yielding the given resource.
    Site(Resource),
}

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

/// A research a player can unlock with research points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Research {
    /// Unlocks barracks and walls.
    Agriculture,
    /// Unlocks mines.
    Mining,
    /// Unlocks the architect's workshop.
    Architecture,
    /// Allows finishing nearly-complete constructions instantly.
    ConstructionPlans,
    /// Raises wood production in every owned city.
    Forestry,
    /// Raises stone production in every owned city.
    Masonry,
}

impl Research {
    /// Every research, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Agriculture,
        Self::Mining,
        Self::Architecture,
        Self::ConstructionPlans,
        Self::Forestry,
        Self::Masonry,
    ];
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Category of a player notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A construction finished.
    Construction,
    /// A transport arrived or was cancelled.
    Transport,
    /// A research was unlocked.
    Research,
    /// Anything else (site upgrades, admin messages).
    Info,
}
