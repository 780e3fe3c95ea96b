//! One simulated second of world time.
//!
//! [`run_tick`] advances every engine in a fixed order:
//!
//! 1. **Economy** -- population, gold, harvested resources and storage
//!    caps for every city, then research points for every player.
//! 2. **Transports** -- every active shipment moves one second along.
//! 3. **Construction** -- finished buildings flip to `Complete`.
//! 4. **Sites** -- finished site upgrades gain their level.
//!
//! A phase never fails: missing table entries degrade to zero effect and
//! dangling ids are skipped, so a tick always completes.

use archipel_world::{Rules, World};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::transport::TransportReport;
use crate::{construction, economy, sites, transport};

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Cities whose population was updated.
    pub cities_updated: usize,
    /// Research points credited across all players.
    pub research_points: Decimal,
    /// What happened to transports.
    pub transports: TransportReport,
    /// Constructions completed.
    pub constructions_completed: usize,
    /// Sites that gained a level.
    pub sites_upgraded: usize,
}

/// Run one simulated second.
pub fn run_tick(rules: &Rules, world: &mut World, now: DateTime<Utc>) -> TickSummary {
    let tick = world.advance_tick();
    let dt = Decimal::ONE;

    let cities_updated = economy::update_all(rules, world, dt);
    let research_points = economy::update_research_points(world, dt)
        .into_values()
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let transports = transport::update_all(rules, world, 1, now);
    let constructions_completed = construction::sweep(rules, world, now);
    let sites_upgraded = sites::advance_all(rules, world, now);

    let summary = TickSummary {
        tick,
        cities_updated,
        research_points,
        transports,
        constructions_completed,
        sites_upgraded,
    };
    if constructions_completed > 0 || sites_upgraded > 0 || transports.delivered > 0 {
        info!(
            tick,
            constructions_completed,
            sites_upgraded,
            delivered = transports.delivered,
            "Tick completed"
        );
    } else {
        debug!(tick, cities_updated, "Tick completed");
    }
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use archipel_types::{BuildingKind, BuildingStatus, CityId, Resource};
    use archipel_world::create_starting_world;
    use chrono::Duration;

    use super::*;
    use crate::commands;

    fn make_world() -> (Rules, World, CityId) {
        let rules = Rules::standard();
        let mut world = create_starting_world(&rules).unwrap();
        let city = *world.city_ids().first().unwrap();
        let player = commands::join(&rules, &mut world, "tester", "pw", Utc::now()).unwrap();
        commands::claim_city(&mut world, player, city).unwrap();
        (rules, world, city)
    }

    #[test]
    fn tick_counter_advances() {
        let (rules, mut world, _) = make_world();
        let now = Utc::now();
        assert_eq!(run_tick(&rules, &mut world, now).tick, 1);
        assert_eq!(run_tick(&rules, &mut world, now).tick, 2);
        assert_eq!(world.tick(), 2);
    }

    #[test]
    fn only_owned_cities_are_populated() {
        let (rules, mut world, _) = make_world();
        let summary = run_tick(&rules, &mut world, Utc::now());
        assert_eq!(summary.cities_updated, 1);
    }

    #[test]
    fn stocks_stay_within_capacity() {
        let (rules, mut world, city) = make_world();
        world
            .city_mut(city)
            .unwrap()
            .workers
            .insert(Resource::Wood, 8);
        for _ in 0..120 {
            run_tick(&rules, &mut world, Utc::now());
            let c = world.city(city).unwrap();
            for (resource, stock) in &c.stock {
                let capacity = economy::storage_capacity(&rules, c, *resource);
                assert!(*stock >= Decimal::ZERO && *stock <= capacity, "{resource:?} = {stock}");
            }
            let workers = Decimal::from(c.assigned_workers());
            assert!(workers <= c.population);
        }
    }

    #[test]
    fn construction_finishes_within_tick() {
        let (rules, mut world, city) = make_world();
        let start = Utc::now();
        let player = world.city(city).unwrap().owner.unwrap();
        let windmill = BuildingKind::Windmill;
        construction::build_or_upgrade(&rules, &mut world, player, city, 6, windmill, start)
            .unwrap();

        let early = run_tick(&rules, &mut world, start + Duration::seconds(1));
        assert_eq!(early.constructions_completed, 0);
        let late = run_tick(&rules, &mut world, start + Duration::seconds(600));
        assert_eq!(late.constructions_completed, 1);
        let building = world.city(city).unwrap().building_at(6).unwrap();
        assert_eq!(building.status, BuildingStatus::Complete);
    }
}
