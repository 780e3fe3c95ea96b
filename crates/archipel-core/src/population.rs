//! Population engine: food balance, satisfaction, hygiene, plague and
//! growth for one city per tick.
//!
//! The update runs in a fixed order:
//!
//! 1. Split the population between town hall rations, windmill rations
//!    and citizens who must eat cereal.
//! 2. Refresh the windmill, baths, hygiene and plague factors. The tax
//!    bonus is left to the tax rate command.
//! 3. Eat cereal, or fall into famine when the granary cannot cover it.
//! 4. Apply the crowding malus and recompute satisfaction.
//! 5. Grow or shrink toward the town hall capacity.
//! 6. Release workers the new population can no longer staff.
//!
//! Cities without an owner are left untouched.

use archipel_types::{
    BuildingKind, BuildingStatus, City, Island, PopulationReport, Resource, SatisfactionFactor,
    Workplace,
};
use archipel_world::Rules;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

/// Population at or below which the crowding malus is capped.
const CROWDING_SOFT_LIMIT: u32 = 80;
/// Largest crowding malus for a small city.
const CROWDING_SOFT_CAP: u32 = 8;

/// Convert a non-negative decimal to `u32`, rounding down and saturating.
pub(crate) fn floor_u32(value: Decimal) -> u32 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value.floor().to_u32().unwrap_or(u32::MAX)
}

/// Order in which workplaces lose workers when the population shrinks:
/// the academy, the forest, then the island's advanced and base sites.
pub fn removal_order(island: Option<&Island>) -> Vec<Workplace> {
    let mut order = vec![Workplace::Academy, Workplace::Site(Resource::Wood)];
    if let Some(island) = island {
        order.push(Workplace::Site(island.advanced_resource));
        order.push(Workplace::Site(island.base_resource));
    }
    order
}

/// Population growth per second and population capacity granted by the
/// city's town halls.
///
/// A town hall being upgraded still counts at the level it is leaving,
/// and a new one counts as level 1.
pub fn town_hall_figures(rules: &Rules, city: &City) -> (Decimal, Decimal) {
    city.buildings()
        .filter(|b| b.kind == BuildingKind::TownHall)
        .fold((Decimal::ZERO, Decimal::ZERO), |(growth, cap), b| {
            let level = if b.status == BuildingStatus::InProgress {
                b.level.saturating_sub(1)
            } else {
                b.level
            };
            let effect = rules.buildings.effect(BuildingKind::TownHall, level.max(1));
            (
                growth.saturating_add(effect.population_growth),
                cap.saturating_add(Decimal::from(effect.population_capacity)),
            )
        })
}

/// Highest cereal multiplier the city's finished windmills allow, at least 1.
pub fn max_windmill_multiplier(city: &City) -> u32 {
    city.complete_buildings(BuildingKind::Windmill)
        .map(|b| b.effect.cereal_consumption_multiplier)
        .max()
        .unwrap_or(1)
        .max(1)
}

/// Hygiene percentage: cleanliness capacity over population.
pub fn hygiene_percent(population: Decimal, cleanliness: u32) -> u32 {
    if population <= Decimal::ZERO {
        return 100;
    }
    let ratio = Decimal::from(cleanliness)
        .saturating_mul(Decimal::ONE_HUNDRED)
        .checked_div(population.max(Decimal::ONE))
        .unwrap_or(Decimal::ZERO);
    floor_u32(ratio)
}

/// Hygiene of a city from the cleanliness of its finished baths.
pub fn city_hygiene(city: &City) -> u32 {
    let cleanliness = city
        .complete_buildings(BuildingKind::Baths)
        .fold(0_u32, |acc, b| acc.saturating_add(b.effect.cleanliness_capacity));
    hygiene_percent(city.population, cleanliness)
}

/// Crowding malus for a population.
pub const fn crowding_malus(population: u32) -> u32 {
    let tenth = population / 10;
    if population <= CROWDING_SOFT_LIMIT {
        if tenth < CROWDING_SOFT_CAP { tenth } else { CROWDING_SOFT_CAP }
    } else {
        tenth
    }
}

/// Satisfaction from a base score and factor totals, clamped to 0..=100.
pub fn satisfaction(base: u32, bonus: u32, malus: u32) -> u32 {
    let score = i64::from(base)
        .saturating_add(i64::from(bonus))
        .saturating_sub(i64::from(malus))
        .clamp(0, 100);
    u32::try_from(score).unwrap_or(0)
}

fn set_factor(
    factors: &mut std::collections::BTreeMap<SatisfactionFactor, u32>,
    factor: SatisfactionFactor,
    value: Option<u32>,
) {
    match value {
        Some(v) => {
            factors.insert(factor, v);
        }
        None => {
            factors.remove(&factor);
        }
    }
}

/// Take up to `excess` workers off the city's workplaces, following
/// `order` first and then any other site. Returns how many were removed.
pub fn release_workers(city: &mut City, excess: u32, order: &[Workplace]) -> u32 {
    let mut left = excess;
    let mut visit = order.to_vec();
    visit.extend(
        city.workers
            .keys()
            .map(|r| Workplace::Site(*r))
            .filter(|w| !order.contains(w))
            .collect::<Vec<_>>(),
    );

    for workplace in visit {
        if left == 0 {
            break;
        }
        let slot = match workplace {
            Workplace::Academy => &mut city.academy_workers,
            Workplace::Site(resource) => match city.workers.get_mut(&resource) {
                Some(w) => w,
                None => continue,
            },
        };
        let taken = (*slot).min(left);
        *slot = slot.saturating_sub(taken);
        left = left.saturating_sub(taken);
    }
    city.workers.retain(|_, w| *w > 0);
    excess.saturating_sub(left)
}

/// Run one population update of `dt` seconds.
///
/// Returns the diagnostic report, or `None` when the city was skipped.
pub fn update_city(
    rules: &Rules,
    city: &mut City,
    order: &[Workplace],
    dt: Decimal,
) -> Option<PopulationReport> {
    let population = city.population;
    if city.owner.is_none() || population < Decimal::ZERO {
        return None;
    }
    let balance = &rules.balance;

    // Food balance.
    let food_limit = balance.food_limit;
    let windmill_supply = Decimal::from(
        city.complete_buildings(BuildingKind::Windmill)
            .fold(0_u32, |acc, b| acc.saturating_add(b.effect.food_supply)),
    );
    let nourished_by_town_hall = population.min(food_limit);
    let to_feed = population.saturating_sub(food_limit).max(Decimal::ZERO);
    let nourished_by_windmill = to_feed.min(windmill_supply);
    let unfed = to_feed.saturating_sub(windmill_supply).max(Decimal::ZERO);

    let max_multiplier = max_windmill_multiplier(city);
    let multiplier = city.windmill_multiplier.clamp(1, max_multiplier);
    let cereal_needed = Decimal::from(multiplier)
        .saturating_mul(balance.cereal_per_citizen)
        .saturating_mul(unfed);

    // Bonus factors.
    let windmill_bonus = if max_multiplier > 1 {
        balance
            .windmill_bonus_max
            .saturating_mul(multiplier.saturating_sub(1))
            .checked_div(max_multiplier.saturating_sub(1))
            .filter(|b| *b > 0)
    } else {
        None
    };
    let baths: Vec<_> = city.complete_buildings(BuildingKind::Baths).collect();
    let baths_bonus = (!baths.is_empty()).then(|| {
        baths
            .iter()
            .fold(0_u32, |acc, b| acc.saturating_add(b.effect.satisfaction_bonus))
    });
    let cleanliness = baths
        .iter()
        .fold(0_u32, |acc, b| acc.saturating_add(b.effect.cleanliness_capacity));
    let hygiene = hygiene_percent(population, cleanliness);

    let bonus = &mut city.satisfaction_factors.bonus;
    set_factor(bonus, SatisfactionFactor::Windmill, windmill_bonus);
    set_factor(bonus, SatisfactionFactor::Baths, baths_bonus);
    set_factor(
        bonus,
        SatisfactionFactor::Hygiene,
        (hygiene > 100).then_some(balance.hygiene_bonus),
    );

    // Plague breaks out on poor hygiene and only a cure clears it.
    if hygiene < balance.plague_threshold_percent && !city.has_plague {
        debug!(city = %city.id, hygiene, "Plague broke out");
        city.has_plague = true;
    }
    let plague = city.has_plague.then_some(balance.plague_malus);
    set_factor(
        &mut city.satisfaction_factors.malus,
        SatisfactionFactor::Plague,
        plague,
    );

    // Cereal.
    let cereal = city.stock_of(Resource::Cereal);
    let famine = if cereal > Decimal::ZERO && cereal >= cereal_needed {
        city.stock
            .insert(Resource::Cereal, cereal.saturating_sub(cereal_needed));
        None
    } else {
        city.stock.insert(Resource::Cereal, Decimal::ZERO);
        Some(balance.famine_malus)
    };
    set_factor(
        &mut city.satisfaction_factors.malus,
        SatisfactionFactor::Famine,
        famine,
    );

    // Crowding and final score.
    set_factor(
        &mut city.satisfaction_factors.malus,
        SatisfactionFactor::Population,
        Some(crowding_malus(floor_u32(population))),
    );
    city.satisfaction = satisfaction(
        balance.base_satisfaction,
        city.satisfaction_factors.total_bonus(),
        city.satisfaction_factors.total_malus(),
    );

    // Growth.
    let (base_growth, capacity) = town_hall_figures(rules, city);
    let neutral = Decimal::from(balance.base_satisfaction);
    let modifier = Decimal::from(city.satisfaction)
        .saturating_sub(neutral)
        .checked_div(neutral)
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::NEGATIVE_ONE, Decimal::ONE);
    let growth = base_growth.saturating_mul(modifier);
    let new_population = population
        .saturating_add(growth.saturating_mul(dt))
        .clamp(Decimal::ZERO, capacity.max(Decimal::ZERO));
    city.population = new_population;

    // Workers the population can no longer staff.
    let assigned = Decimal::from(city.assigned_workers());
    if assigned > new_population {
        let excess = assigned.saturating_sub(new_population).ceil();
        let released = release_workers(city, excess.to_u32().unwrap_or(u32::MAX), order);
        debug!(city = %city.id, released, "Workers released after population loss");
    }

    let report = PopulationReport {
        cereal_needed,
        nourished_by_town_hall,
        nourished_by_windmill,
        unfed,
        total_food_supply: nourished_by_town_hall.saturating_add(nourished_by_windmill),
        growth,
        hygiene_percent: hygiene,
    };
    city.population_report = report.clone();
    Some(report)
}
