//! Default starting archipelago.
//!
//! Four islands, each with three unowned cities and three resource sites
//! (forest, the island's base resource, the island's advanced resource).
//! Every city starts with the standard stocks, forty free citizens and a
//! finished level-1 town hall, so its population has room to live.

use std::collections::BTreeMap;

use archipel_types::{
    Building, BuildingEffect, BuildingKind, BuildingStatus, CITY_SLOT_COUNT, City, CityId,
    Coordinates, Island, IslandId, PopulationReport, Resource, ResourceSite, SatisfactionFactors,
    TaxRate,
};
use rust_decimal::Decimal;

use crate::error::WorldError;
use crate::resource::STARTING_POPULATION;
use crate::rules::Rules;
use crate::world::World;

/// Slot holding the town hall of a fresh city.
pub const TOWN_HALL_SLOT: usize = 4;

struct IslandSeed {
    name: &'static str,
    coordinates: Coordinates,
    base_resource: Resource,
    advanced_resource: Resource,
    cities: [(&'static str, Coordinates); 3],
}

const SEEDS: [IslandSeed; 4] = [
    IslandSeed {
        name: "Stonehaven",
        coordinates: Coordinates::new(10, 10),
        base_resource: Resource::Stone,
        advanced_resource: Resource::Marble,
        cities: [
            ("Greywall", Coordinates::new(8, 9)),
            ("Quarrytown", Coordinates::new(11, 12)),
            ("Saltmarsh", Coordinates::new(13, 8)),
        ],
    },
    IslandSeed {
        name: "Ironreach",
        coordinates: Coordinates::new(40, 12),
        base_resource: Resource::Iron,
        advanced_resource: Resource::Coal,
        cities: [
            ("Forgeport", Coordinates::new(38, 10)),
            ("Cinderbay", Coordinates::new(41, 14)),
            ("Anvil Rock", Coordinates::new(43, 11)),
        ],
    },
    IslandSeed {
        name: "Reedmoor",
        coordinates: Coordinates::new(15, 45),
        base_resource: Resource::Papyrus,
        advanced_resource: Resource::Spices,
        cities: [
            ("Inkwater", Coordinates::new(13, 44)),
            ("Lotus Quay", Coordinates::new(16, 47)),
            ("Pepperhold", Coordinates::new(18, 43)),
        ],
    },
    IslandSeed {
        name: "Goldfield",
        coordinates: Coordinates::new(50, 50),
        base_resource: Resource::Cereal,
        advanced_resource: Resource::Glass,
        cities: [
            ("Harvest Point", Coordinates::new(48, 49)),
            ("Millbrook", Coordinates::new(51, 52)),
            ("Sandglass", Coordinates::new(53, 48)),
        ],
    },
];

/// Build an unowned city with the standard starting state.
pub fn fresh_city(rules: &Rules, name: &str, island: IslandId, coordinates: Coordinates) -> City {
    let id = CityId::new();
    let mut slots = vec![None; CITY_SLOT_COUNT];
    if let Some(slot) = slots.get_mut(TOWN_HALL_SLOT) {
        *slot = Some(Building {
            kind: BuildingKind::TownHall,
            level: 1,
            status: BuildingStatus::Complete,
            effect: rules.buildings.effect(BuildingKind::TownHall, 1),
            previous_effect: BuildingEffect::default(),
            started_at: None,
            duration_secs: 0,
            slot: TOWN_HALL_SLOT,
            city: id,
        });
    }

    City {
        id,
        name: name.to_owned(),
        owner: None,
        island,
        coordinates,
        slots,
        stock: rules.resources.starting_stock(),
        population: Decimal::from(STARTING_POPULATION),
        workers: BTreeMap::new(),
        academy_workers: 0,
        storage_capacity: BTreeMap::new(),
        research_bonus: rules.resources.starting_research_bonus(),
        satisfaction_factors: SatisfactionFactors::default(),
        satisfaction: rules.balance.base_satisfaction,
        has_plague: false,
        tax_rate: TaxRate::Low,
        windmill_multiplier: 1,
        population_report: PopulationReport::default(),
    }
}

/// A level-1 site with empty ledgers.
pub fn fresh_site(island: IslandId, resource: Resource) -> ResourceSite {
    ResourceSite {
        island,
        resource,
        level: 1,
        donations: BTreeMap::new(),
        history: BTreeMap::new(),
        upgrade_started_at: None,
    }
}

/// Create the default archipelago.
///
/// # Errors
///
/// Returns a [`WorldError`] if an entity cannot be inserted, which only
/// happens on an id collision.
pub fn create_starting_world(rules: &Rules) -> Result<World, WorldError> {
    let mut world = World::new();

    for seed in &SEEDS {
        let island_id = IslandId::new();
        world.add_island(Island {
            id: island_id,
            name: seed.name.to_owned(),
            coordinates: seed.coordinates,
            base_resource: seed.base_resource,
            advanced_resource: seed.advanced_resource,
            cities: Vec::new(),
        })?;

        for resource in [Resource::Wood, seed.base_resource, seed.advanced_resource] {
            world.insert_site(fresh_site(island_id, resource));
        }

        for (name, coordinates) in seed.cities {
            world.add_city(fresh_city(rules, name, island_id, coordinates))?;
        }
    }

    tracing::info!(
        islands = world.islands().count(),
        cities = world.cities().count(),
        sites = world.sites().count(),
        "Starting world created"
    );
    Ok(world)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starting_world_has_four_islands_of_three_cities() {
        let world = create_starting_world(&Rules::standard()).unwrap();
        assert_eq!(world.islands().count(), 4);
        assert_eq!(world.cities().count(), 12);
        for island in world.islands() {
            assert_eq!(island.cities.len(), 3);
        }
    }

    #[test]
    fn every_island_has_three_sites() {
        let world = create_starting_world(&Rules::standard()).unwrap();
        assert_eq!(world.sites().count(), 12);
        for island in world.islands() {
            assert!(world.site(island.id, Resource::Wood).is_some());
            assert!(world.site(island.id, island.base_resource).is_some());
            assert!(world.site(island.id, island.advanced_resource).is_some());
        }
    }

    #[test]
    fn starting_cities_are_unowned_with_town_hall() {
        let world = create_starting_world(&Rules::standard()).unwrap();
        for city in world.cities() {
            assert!(city.owner.is_none());
            assert_eq!(city.population, Decimal::from(40));
            assert_eq!(city.complete_buildings(BuildingKind::TownHall).count(), 1);
            assert_eq!(city.stock_of(Resource::Wood), Decimal::from(1500));
            assert_eq!(city.stock_of(Resource::Gold), Decimal::from(80));
        }
    }
}
