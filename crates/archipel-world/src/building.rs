//! Building definitions: categories, research gates, and per-level cost,
//! construction time and effect.
//!
//! - [`definition`] returns the static definition of each [`BuildingKind`]
//! - [`BuildingTable`] bundles the definitions and answers level lookups,
//!   degrading to an empty effect when a level is missing
//! - [`slot_category`] maps a city slot index to the category it accepts

use std::collections::BTreeMap;

use archipel_types::{
    BuildingCategory, BuildingEffect, BuildingKind, Research, Resource, ResourceTier, ShipKind,
    UnitKind,
};
use rust_decimal::Decimal;

/// Highest slot index reserved for defensive buildings.
const LAST_DEFENSIVE_SLOT: usize = 1;
/// Highest slot index reserved for marine buildings.
const LAST_MARINE_SLOT: usize = 3;

/// Cost, construction time and effect of one building level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingLevel {
    /// Resources required to build or upgrade to this level.
    pub cost: BTreeMap<Resource, u32>,
    /// Construction time in seconds.
    pub construction_secs: u64,
    /// Effect applied once this level is complete.
    pub effect: BuildingEffect,
}

/// Static definition of a building kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingDefinition {
    /// The kind described.
    pub kind: BuildingKind,
    /// Slot category the building must be placed in.
    pub category: BuildingCategory,
    /// Research the owner must have unlocked before building.
    pub required_research: Option<Research>,
    /// Maximum number of buildings of this kind per city, if limited.
    pub max_count: Option<u32>,
    /// Levels in ascending order; index 0 is level 1.
    pub levels: Vec<BuildingLevel>,
}

impl BuildingDefinition {
    /// Highest reachable level.
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX)
    }

    /// Details of a 1-based level.
    pub fn level(&self, level: u32) -> Option<&BuildingLevel> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.levels.get(index)
    }
}

fn level(
    cost: &[(Resource, u32)],
    construction_secs: u64,
    effect: BuildingEffect,
) -> BuildingLevel {
    BuildingLevel {
        cost: cost.iter().copied().collect(),
        construction_secs,
        effect,
    }
}

/// Per-resource amounts where every harvestable resource of a tier gets
/// the same figure.
fn by_tier(base: u32, intermediate: u32, advanced: u32) -> BTreeMap<Resource, u32> {
    Resource::HARVESTABLE
        .into_iter()
        .filter_map(|r| {
            let amount = match r.tier()? {
                ResourceTier::Base => base,
                ResourceTier::Intermediate => intermediate,
                ResourceTier::Advanced => advanced,
            };
            Some((r, amount))
        })
        .collect()
}

fn mine_bonus(percent: u32) -> BTreeMap<Resource, u32> {
    [Resource::Stone, Resource::Iron, Resource::Cereal, Resource::Papyrus]
        .into_iter()
        .map(|r| (r, percent))
        .collect()
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Return the canonical definition for a given [`BuildingKind`].
#[allow(clippy::too_many_lines)] // One arm per building kind; the table reads best in one place.
pub fn definition(kind: BuildingKind) -> BuildingDefinition {
    use Resource::{Iron, Papyrus, Stone, Wood};

    let (category, required_research, levels) = match kind {
        BuildingKind::TownHall => (
            BuildingCategory::General,
            None,
            vec![
                level(&[(Wood, 100), (Stone, 50)], 6, BuildingEffect {
                    population_growth: Decimal::new(12, 1), // 1.2
                    food_capacity: 50,
                    population_capacity: 100,
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 200), (Stone, 100)], 15, BuildingEffect {
                    population_growth: Decimal::new(33, 1), // 3.3
                    food_capacity: 65,
                    population_capacity: 220,
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 400), (Stone, 200)], 16, BuildingEffect {
                    population_growth: Decimal::new(45, 1), // 4.5
                    food_capacity: 80,
                    population_capacity: 300,
                    ..BuildingEffect::default()
                }),
            ],
        ),
        BuildingKind::Windmill => (
            BuildingCategory::General,
            None,
            [(120, 80, 2, 10, 2), (240, 160, 4, 20, 3), (480, 320, 36, 40, 4)]
                .into_iter()
                .map(|(wood, stone, secs, supply, multiplier)| {
                    level(&[(Wood, wood), (Stone, stone)], secs, BuildingEffect {
                        food_supply: supply,
                        cereal_consumption_multiplier: multiplier,
                        ..BuildingEffect::default()
                    })
                })
                .collect(),
        ),
        BuildingKind::Academy => (
            BuildingCategory::General,
            None,
            [
                (150, 50, 5, Decimal::ONE, 25),
                (300, 100, 13, Decimal::new(15, 1), 50),
                (600, 200, 18, Decimal::TWO, 75),
            ]
            .into_iter()
            .map(|(wood, papyrus, secs, per_worker, max_workers)| {
                level(&[(Wood, wood), (Papyrus, papyrus)], secs, BuildingEffect {
                    research_points_per_worker: per_worker,
                    max_workers,
                    ..BuildingEffect::default()
                })
            })
            .collect(),
        ),
        BuildingKind::Warehouse => (
            BuildingCategory::General,
            None,
            vec![
                level(&[(Wood, 100), (Stone, 50)], 10, BuildingEffect {
                    storage: by_tier(1000, 500, 100),
                    secure_storage: by_tier(100, 50, 10),
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 200), (Stone, 100)], 20, BuildingEffect {
                    storage: by_tier(2000, 1500, 500),
                    secure_storage: by_tier(1000, 500, 50),
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 400), (Stone, 200)], 30, BuildingEffect {
                    storage: by_tier(3000, 2500, 1000),
                    secure_storage: by_tier(2000, 1000, 100),
                    ..BuildingEffect::default()
                }),
            ],
        ),
        BuildingKind::Barracks => (
            BuildingCategory::Defensive,
            Some(Research::Agriculture),
            [
                (150, 100, 15, UnitKind::Infantry),
                (300, 200, 25, UnitKind::Archers),
                (600, 400, 35, UnitKind::Cavalry),
            ]
            .into_iter()
            .map(|(wood, stone, secs, unit)| {
                level(&[(Wood, wood), (Stone, stone)], secs, BuildingEffect {
                    unit_production: Some(unit),
                    ..BuildingEffect::default()
                })
            })
            .collect(),
        ),
        BuildingKind::Port => (
            BuildingCategory::Marine,
            None,
            [
                (200, 150, 2, ShipKind::Transport, 10),
                (400, 300, 3, ShipKind::Merchant, 14),
                (800, 600, 4, ShipKind::Warship, 19),
            ]
            .into_iter()
            .map(|(wood, stone, secs, ship, speed)| {
                level(&[(Wood, wood), (Stone, stone)], secs, BuildingEffect {
                    ship_production: Some(ship),
                    loading_speed: speed,
                    ..BuildingEffect::default()
                })
            })
            .collect(),
        ),
        BuildingKind::Wall => (
            BuildingCategory::Defensive,
            Some(Research::Agriculture),
            [(200, 150, 15, 50), (400, 300, 25, 100), (800, 600, 35, 150)]
                .into_iter()
                .map(|(wood, stone, secs, defense)| {
                    level(&[(Wood, wood), (Stone, stone)], secs, BuildingEffect {
                        defense,
                        ..BuildingEffect::default()
                    })
                })
                .collect(),
        ),
        BuildingKind::Sawmill => (
            BuildingCategory::General,
            None,
            [(150, 100, 5, 10), (300, 200, 10, 20), (600, 400, 35, 30)]
                .into_iter()
                .map(|(wood, stone, secs, percent)| {
                    level(&[(Wood, wood), (Stone, stone)], secs, BuildingEffect {
                        resource_bonus: BTreeMap::from([(Wood, percent)]),
                        ..BuildingEffect::default()
                    })
                })
                .collect(),
        ),
        BuildingKind::Mine => (
            BuildingCategory::General,
            Some(Research::Mining),
            vec![
                level(&[(Wood, 200), (Stone, 150)], 5, BuildingEffect {
                    resource_bonus: mine_bonus(10),
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 400), (Stone, 300), (Iron, 100)], 10, BuildingEffect {
                    resource_bonus: mine_bonus(20),
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 800), (Stone, 600), (Iron, 200)], 45, BuildingEffect {
                    resource_bonus: mine_bonus(30),
                    ..BuildingEffect::default()
                }),
            ],
        ),
        BuildingKind::Embassy => (
            BuildingCategory::General,
            None,
            vec![
                level(&[(Wood, 200), (Stone, 150)], 5, BuildingEffect {
                    max_colonies: 2,
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 100), (Stone, 100), (Iron, 100)], 10, BuildingEffect {
                    max_colonies: 3,
                    ..BuildingEffect::default()
                }),
                level(&[(Wood, 100), (Stone, 100), (Iron, 100)], 5, BuildingEffect {
                    max_colonies: 4,
                    ..BuildingEffect::default()
                }),
            ],
        ),
        BuildingKind::ArchitectWorkshop => (
            BuildingCategory::General,
            Some(Research::Architecture),
            [(120, 100, 10, 10), (240, 200, 15, 20), (480, 400, 20, 30)]
                .into_iter()
                .map(|(wood, stone, secs, percent)| {
                    level(&[(Wood, wood), (Stone, stone)], secs, BuildingEffect {
                        cost_reduction: percent,
                        time_reduction: percent,
                        ..BuildingEffect::default()
                    })
                })
                .collect(),
        ),
        BuildingKind::Baths => (
            BuildingCategory::General,
            None,
            [(100, 50, 5, 50, 5), (200, 100, 10, 150, 10), (400, 200, 15, 200, 15)]
                .into_iter()
                .map(|(wood, stone, secs, clean, satisfaction)| {
                    level(&[(Wood, wood), (Stone, stone)], secs, BuildingEffect {
                        cleanliness_capacity: clean,
                        satisfaction_bonus: satisfaction,
                        ..BuildingEffect::default()
                    })
                })
                .collect(),
        ),
    };

    BuildingDefinition {
        kind,
        category,
        required_research,
        max_count: None,
        levels,
    }
}

/// The category a city slot accepts.
///
/// Slots 0-1 are defensive, 2-3 marine, everything after general.
pub const fn slot_category(slot: usize) -> BuildingCategory {
    if slot <= LAST_DEFENSIVE_SLOT {
        BuildingCategory::Defensive
    } else if slot <= LAST_MARINE_SLOT {
        BuildingCategory::Marine
    } else {
        BuildingCategory::General
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Lookup table of every building definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingTable {
    definitions: BTreeMap<BuildingKind, BuildingDefinition>,
}

impl BuildingTable {
    /// The table of the live game.
    pub fn standard() -> Self {
        Self::from_definitions(BuildingKind::ALL.into_iter().map(definition))
    }

    /// Build a table from explicit definitions.
    pub fn from_definitions(definitions: impl IntoIterator<Item = BuildingDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    /// Definition of a kind, `None` when the kind is not buildable here.
    pub fn get(&self, kind: BuildingKind) -> Option<&BuildingDefinition> {
        self.definitions.get(&kind)
    }

    /// Details of one level of a kind.
    pub fn level(&self, kind: BuildingKind, level: u32) -> Option<&BuildingLevel> {
        self.get(kind)?.level(level)
    }

    /// Effect of a kind at a level, empty when the level is unknown.
    pub fn effect(&self, kind: BuildingKind, level: u32) -> BuildingEffect {
        if let Some(details) = self.level(kind, level) {
            details.effect.clone()
        } else {
            tracing::warn!(?kind, level, "No level details, falling back to empty effect");
            BuildingEffect::default()
        }
    }
}

impl Default for BuildingTable {
    fn default() -> Self {
        Self::standard()
    }
}
