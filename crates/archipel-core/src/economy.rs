//! Resource engine: production, storage caps, gold and research points.
//!
//! [`update_city`] advances one city by `dt` seconds: the population
//! update first, then gold from the free population, then every
//! harvestable resource, then a final clamp of every stock into
//! `[0, capacity]`. [`update_research_points`] credits each player for the
//! academies of the cities they own.

use archipel_types::{BuildingKind, City, PlayerId, Resource, Workplace};
use archipel_world::{Rules, World, add_capped, clamp_stock};
use rust_decimal::Decimal;
use tracing::debug;

use crate::population;

/// Per-tick production totals of one city.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityProduction {
    /// Gold collected from taxes.
    pub gold: Decimal,
    /// Units added per harvested resource.
    pub harvested: std::collections::BTreeMap<Resource, Decimal>,
    /// Whether the population update ran.
    pub population_updated: bool,
}

/// Effective storage capacity of a resource: the default plus the storage
/// of every finished warehouse at its level.
pub fn storage_capacity(rules: &Rules, city: &City, resource: Resource) -> Decimal {
    city.complete_buildings(BuildingKind::Warehouse)
        .map(|b| rules.buildings.effect(BuildingKind::Warehouse, b.level))
        .filter_map(|effect| effect.storage.get(&resource).copied())
        .fold(rules.resources.default_capacity(resource), |acc, extra| {
            acc.saturating_add(Decimal::from(extra))
        })
}

/// Production bonus percentage granted by finished buildings.
pub fn building_bonus(city: &City, resource: Resource) -> u32 {
    city.buildings()
        .filter(|b| b.status == archipel_types::BuildingStatus::Complete)
        .filter_map(|b| b.effect.resource_bonus.get(&resource).copied())
        .fold(0_u32, u32::saturating_add)
}

/// Units of `resource` produced per second by the city's workers.
pub fn production_rate(rules: &Rules, city: &City, resource: Resource) -> Decimal {
    let workers = Decimal::from(city.workers_on(resource));
    let building = Decimal::from(building_bonus(city, resource));
    let research = Decimal::from(city.research_bonus.get(&resource).copied().unwrap_or(0));
    let percent = |p: Decimal| {
        Decimal::ONE.saturating_add(p.checked_div(Decimal::ONE_HUNDRED).unwrap_or(Decimal::ZERO))
    };
    workers
        .saturating_mul(rules.resources.base_rate(resource))
        .saturating_mul(percent(building))
        .saturating_mul(percent(research))
}

/// Advance one city by `dt` seconds.
pub fn update_city(
    rules: &Rules,
    city: &mut City,
    order: &[Workplace],
    dt: Decimal,
) -> CityProduction {
    let mut production = CityProduction {
        population_updated: population::update_city(rules, city, order, dt).is_some(),
        ..CityProduction::default()
    };

    city.storage_capacity = Resource::ALL
        .into_iter()
        .map(|r| (r, storage_capacity(rules, city, r)))
        .collect();
    let capacity = |city: &City, r: Resource| {
        city.storage_capacity
            .get(&r)
            .copied()
            .unwrap_or(Decimal::ZERO)
    };

    // Gold from taxes on the free population.
    let gold_cap = capacity(city, Resource::Gold);
    let gold = city
        .free_population()
        .saturating_mul(Decimal::from(city.tax_rate.multiplier()))
        .saturating_mul(dt);
    let stock = city.stock.entry(Resource::Gold).or_insert(Decimal::ZERO);
    production.gold = add_capped(stock, gold, gold_cap);

    // Harvested resources.
    for resource in Resource::HARVESTABLE {
        if city.workers_on(resource) == 0 {
            continue;
        }
        let rate = production_rate(rules, city, resource);
        let cap = capacity(city, resource);
        let stock = city.stock.entry(resource).or_insert(Decimal::ZERO);
        let added = add_capped(stock, rate.saturating_mul(dt), cap);
        if added > Decimal::ZERO {
            production.harvested.insert(resource, added);
        }
    }

    // Stocks pushed out of range by a command come back into range.
    for resource in Resource::ALL {
        let cap = capacity(city, resource);
        let clamped = city
            .stock
            .get_mut(&resource)
            .is_some_and(|stock| clamp_stock(stock, cap));
        if clamped {
            debug!(city = %city.id, ?resource, "Stock clamped to capacity");
        }
    }

    production
}

/// Advance every city by `dt` seconds.
///
/// Returns the number of cities whose population was updated.
pub fn update_all(rules: &Rules, world: &mut World, dt: Decimal) -> usize {
    let mut populated = 0_usize;
    for id in world.city_ids() {
        let order = world
            .city(id)
            .map(|c| population::removal_order(world.island(c.island)))
            .unwrap_or_default();
        let updated = world
            .city_mut(id)
            .is_some_and(|city| update_city(rules, city, &order, dt).population_updated);
        if updated {
            populated = populated.saturating_add(1);
        }
    }
    populated
}

/// Research points a city's academy produces per second.
pub fn academy_output(city: &City) -> Decimal {
    city.complete_buildings(BuildingKind::Academy)
        .next()
        .map_or(Decimal::ZERO, |academy| {
            Decimal::from(city.academy_workers)
                .saturating_mul(academy.effect.research_points_per_worker)
        })
}

/// Credit every player with the research points of their academies.
///
/// Returns the points credited per player.
pub fn update_research_points(
    world: &mut World,
    dt: Decimal,
) -> std::collections::BTreeMap<PlayerId, Decimal> {
    let mut credited = std::collections::BTreeMap::new();
    for player in world.player_ids() {
        let points = world
            .cities_of(player)
            .into_iter()
            .filter_map(|id| world.city(id))
            .map(academy_output)
            .fold(Decimal::ZERO, Decimal::saturating_add)
            .saturating_mul(dt);
        if points <= Decimal::ZERO {
            continue;
        }
        if let Some(p) = world.player_mut(player) {
            p.research_points = p.research_points.saturating_add(points);
            credited.insert(player, points);
        }
    }
    credited
}
