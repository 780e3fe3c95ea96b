//! Construction state machine for building slots.
//!
//! A successful build or upgrade puts the slot `InProgress` with a start
//! time and a duration. Remaining time is always derived from the clock,
//! never stored. The per-tick [`sweep`] flips finished constructions to
//! `Complete` and refreshes their effect from the building table; a
//! building that is already complete is never touched again, so sweeping
//! twice in the same second is harmless.
//!
//! While an upgrade runs the building keeps the effect of its previous
//! level, which is what lets an architect's workshop keep discounting
//! other constructions during its own upgrade.

use std::collections::BTreeMap;

use archipel_types::{
    Building, BuildingEffect, BuildingKind, BuildingStatus, City, CityId, NotificationKind,
    PlayerId, Research, Resource,
};
use archipel_world::{Rules, World, slot_category};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CommandError;
use crate::notifications;

/// Seconds left before a construction finishes.
///
/// Zero unless the building is in progress with a start time and a
/// positive duration.
pub fn remaining_secs(building: &Building, now: DateTime<Utc>) -> u64 {
    let Some(started) = building.started_at else {
        return 0;
    };
    if building.status != BuildingStatus::InProgress || building.duration_secs == 0 {
        return 0;
    }
    let elapsed = u64::try_from(now.signed_duration_since(started).num_seconds()).unwrap_or(0);
    building.duration_secs.saturating_sub(elapsed)
}

/// Cost and time reduction percentages from the city's architect's
/// workshops. A workshop being upgraded still counts at its old level.
pub fn architect_reductions(city: &City) -> (u32, u32) {
    city.buildings()
        .filter(|b| b.kind == BuildingKind::ArchitectWorkshop)
        .filter_map(|b| match b.status {
            BuildingStatus::Complete => Some(&b.effect),
            BuildingStatus::InProgress => Some(&b.previous_effect),
            BuildingStatus::Cancelled => None,
        })
        .fold((0_u32, 0_u32), |(cost, time), effect| {
            (
                cost.saturating_add(effect.cost_reduction),
                time.saturating_add(effect.time_reduction),
            )
        })
}

/// Apply a percentage reduction, never going below 1.
pub fn reduce(value: u64, percent: u32) -> u64 {
    let keep = u64::from(100_u32.saturating_sub(percent));
    value
        .saturating_mul(keep)
        .checked_div(100)
        .unwrap_or(0)
        .max(1)
}

/// What a validated build or upgrade will do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOrder {
    /// Building kind.
    pub kind: BuildingKind,
    /// Level the building will reach.
    pub level: u32,
    /// Resources charged, after reductions.
    pub cost: BTreeMap<Resource, u32>,
    /// Construction time in seconds, after reductions.
    pub duration_secs: u64,
}

/// Check a build or upgrade without changing anything.
pub fn plan(
    rules: &Rules,
    world: &World,
    player: PlayerId,
    city_id: CityId,
    slot: usize,
    kind: BuildingKind,
) -> Result<BuildOrder, CommandError> {
    let account = world
        .player(player)
        .ok_or(CommandError::PlayerNotFound(player))?;
    let city = world
        .city(city_id)
        .ok_or(CommandError::CityNotFound(city_id))?;
    if city.owner != Some(player) {
        return Err(CommandError::NotOwner(city_id));
    }
    let definition = rules
        .buildings
        .get(kind)
        .ok_or(CommandError::UnknownBuilding(kind))?;
    if let Some(research) = definition
        .required_research
        .filter(|r| !account.unlocked_research.contains(r))
    {
        return Err(CommandError::ResearchRequired(research));
    }
    if slot >= city.slots.len() {
        return Err(CommandError::InvalidSlot(slot));
    }

    let current_level = match city.building_at(slot) {
        Some(existing) if existing.kind != kind => {
            return Err(CommandError::SlotOccupied {
                slot,
                occupant: existing.kind,
            });
        }
        Some(existing) if existing.status == BuildingStatus::InProgress => {
            return Err(CommandError::ConstructionInProgress(slot));
        }
        Some(existing) => existing.level,
        None => {
            let expected = slot_category(slot);
            if definition.category != expected {
                return Err(CommandError::WrongSlotCategory { slot, expected });
            }
            if let Some(max) = definition.max_count {
                let count = city.buildings().filter(|b| b.kind == kind).count();
                if u32::try_from(count).unwrap_or(u32::MAX) >= max {
                    return Err(CommandError::MaxCountReached(kind));
                }
            }
            0
        }
    };

    if current_level >= definition.max_level() {
        return Err(CommandError::MaxLevelReached(kind));
    }
    let level = current_level.saturating_add(1);
    let details = definition
        .level(level)
        .ok_or(CommandError::MissingLevel { kind, level })?;

    let (cost_cut, time_cut) = architect_reductions(city);
    let cost: BTreeMap<Resource, u32> = details
        .cost
        .iter()
        .map(|(r, amount)| {
            let reduced = if cost_cut == 0 {
                *amount
            } else {
                u32::try_from(reduce(u64::from(*amount), cost_cut)).unwrap_or(u32::MAX)
            };
            (*r, reduced)
        })
        .collect();
    let duration_secs = if time_cut == 0 {
        details.construction_secs
    } else {
        reduce(details.construction_secs, time_cut)
    };

    ensure_affordable(city, &cost)?;

    Ok(BuildOrder {
        kind,
        level,
        cost,
        duration_secs,
    })
}

/// Fail with the first cost line the city cannot pay.
pub fn ensure_affordable(city: &City, cost: &BTreeMap<Resource, u32>) -> Result<(), CommandError> {
    for (resource, amount) in cost {
        let required = Decimal::from(*amount);
        let available = city.stock_of(*resource);
        if available < required {
            return Err(CommandError::InsufficientResources {
                resource: *resource,
                required,
                available,
            });
        }
    }
    Ok(())
}

/// Deduct a cost the caller has already checked.
fn spend(city: &mut City, cost: &BTreeMap<Resource, u32>) {
    for (resource, amount) in cost {
        let stock = city.stock.entry(*resource).or_insert(Decimal::ZERO);
        *stock = stock.saturating_sub(Decimal::from(*amount));
    }
}

/// Start building or upgrading the building in a slot.
pub fn build_or_upgrade(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    city_id: CityId,
    slot: usize,
    kind: BuildingKind,
    now: DateTime<Utc>,
) -> Result<BuildOrder, CommandError> {
    let order = plan(rules, world, player, city_id, slot, kind)?;
    let city = world
        .city_mut(city_id)
        .ok_or(CommandError::CityNotFound(city_id))?;
    // Re-checked right before the deduction so the charge is all or nothing.
    ensure_affordable(city, &order.cost)?;
    spend(city, &order.cost);

    let carried = city
        .building_at(slot)
        .map(|b| b.effect.clone())
        .unwrap_or_default();
    let cell = city
        .slots
        .get_mut(slot)
        .ok_or(CommandError::InvalidSlot(slot))?;
    *cell = Some(Building {
        kind,
        level: order.level,
        status: BuildingStatus::InProgress,
        effect: carried.clone(),
        previous_effect: carried,
        started_at: Some(now),
        duration_secs: order.duration_secs,
        slot,
        city: city_id,
    });

    info!(
        city = %city_id,
        ?kind,
        level = order.level,
        duration_secs = order.duration_secs,
        "Construction started"
    );
    Ok(order)
}

/// Lower a building by one level, or clear the slot at level 1.
///
/// Returns `false` when the slot is empty, the city is unknown or the
/// player does not own it. Lowering an upgrade in progress also stops it.
pub fn destroy(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    city_id: CityId,
    slot: usize,
) -> bool {
    let Some(city) = world.city_mut(city_id) else {
        return false;
    };
    if city.owner != Some(player) {
        return false;
    }
    let Some(cell) = city.slots.get_mut(slot) else {
        return false;
    };
    let Some(building) = cell.as_mut() else {
        return false;
    };

    if building.level > 1 {
        building.level = building.level.saturating_sub(1);
        building.effect = rules.buildings.effect(building.kind, building.level);
        building.previous_effect = BuildingEffect::default();
        building.status = BuildingStatus::Complete;
        building.started_at = None;
        building.duration_secs = 0;
        debug!(city = %city_id, slot, level = building.level, "Building lowered");
    } else {
        *cell = None;
        debug!(city = %city_id, slot, "Building removed");
    }
    true
}

/// Finish the construction in a slot and notify the owner.
///
/// Returns `false` if there is nothing in progress there.
pub fn complete(
    rules: &Rules,
    world: &mut World,
    city_id: CityId,
    slot: usize,
    now: DateTime<Utc>,
) -> bool {
    let Some(city) = world.city_mut(city_id) else {
        return false;
    };
    let owner = city.owner;
    let city_name = city.name.clone();
    let Some(building) = city.slots.get_mut(slot).and_then(Option::as_mut) else {
        return false;
    };
    if building.status != BuildingStatus::InProgress {
        return false;
    }

    building.status = BuildingStatus::Complete;
    building.effect = rules.buildings.effect(building.kind, building.level);
    building.previous_effect = BuildingEffect::default();
    building.started_at = None;
    building.duration_secs = 0;
    let (kind, level) = (building.kind, building.level);

    info!(city = %city_id, ?kind, level, "Construction completed");
    if let Some(owner) = owner {
        notifications::notify(
            world,
            owner,
            NotificationKind::Construction,
            format!("Construction of {kind:?} level {level} finished in {city_name}."),
            now,
        );
    }
    true
}

/// Complete every construction whose time has run out.
///
/// Returns the number of buildings completed.
pub fn sweep(rules: &Rules, world: &mut World, now: DateTime<Utc>) -> usize {
    let due: Vec<(CityId, usize)> = world
        .cities()
        .flat_map(|city| {
            city.buildings()
                .filter(|b| b.status == BuildingStatus::InProgress && remaining_secs(b, now) == 0)
                .map(|b| (city.id, b.slot))
                .collect::<Vec<_>>()
        })
        .collect();

    due.into_iter()
        .filter(|(city, slot)| complete(rules, world, *city, *slot, now))
        .count()
}

/// Finish a nearly complete construction at once.
///
/// Needs the construction-plans research and at most a few seconds left.
pub fn complete_instantly(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    city_id: CityId,
    slot: usize,
    now: DateTime<Utc>,
) -> Result<(), CommandError> {
    let account = world
        .player(player)
        .ok_or(CommandError::PlayerNotFound(player))?;
    if !account.unlocked_research.contains(&Research::ConstructionPlans) {
        return Err(CommandError::ResearchRequired(Research::ConstructionPlans));
    }
    let city = world
        .city(city_id)
        .ok_or(CommandError::CityNotFound(city_id))?;
    if city.owner != Some(player) {
        return Err(CommandError::NotOwner(city_id));
    }
    let building = city.building_at(slot).ok_or(CommandError::EmptySlot(slot))?;
    if building.status != BuildingStatus::InProgress {
        return Err(CommandError::NotUnderConstruction(slot));
    }
    let remaining = remaining_secs(building, now);
    let threshold = rules.balance.instant_completion_secs;
    if remaining == 0 || remaining > threshold {
        return Err(CommandError::TooFarFromCompletion {
            remaining,
            threshold,
        });
    }

    complete(rules, world, city_id, slot, now);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use archipel_types::{Coordinates, Island, IslandId, Player};
    use archipel_world::fresh_city;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    const GENERAL_SLOT: usize = 6;

    struct Fixture {
        rules: Rules,
        world: World,
        player: PlayerId,
        city: CityId,
    }

    fn make_fixture() -> Fixture {
        let rules = Rules::standard();
        let mut world = World::new();
        let player = PlayerId::new();
        world
            .add_player(Player {
                id: player,
                username: String::from("builder"),
                credential: String::from("pw"),
                diamonds: 100,
                ships: 1,
                ships_available: 1,
                research_points: Decimal::ZERO,
                unlocked_research: BTreeSet::new(),
                created_at: Utc::now(),
            })
            .unwrap();
        let island = IslandId::new();
        world
            .add_island(Island {
                id: island,
                name: String::from("Isle"),
                coordinates: Coordinates::new(0, 0),
                base_resource: Resource::Stone,
                advanced_resource: Resource::Marble,
                cities: Vec::new(),
            })
            .unwrap();
        let mut city = fresh_city(&rules, "Buildtown", island, Coordinates::new(0, 0));
        city.owner = Some(player);
        let city_id = city.id;
        world.add_city(city).unwrap();
        Fixture {
            rules,
            world,
            player,
            city: city_id,
        }
    }

    fn build(
        f: &mut Fixture,
        slot: usize,
        kind: BuildingKind,
        now: DateTime<Utc>,
    ) -> Result<BuildOrder, CommandError> {
        build_or_upgrade(&f.rules, &mut f.world, f.player, f.city, slot, kind, now)
    }

    fn building(f: &Fixture, slot: usize) -> Building {
        f.world.city(f.city).unwrap().building_at(slot).cloned().unwrap()
    }

    #[test]
    fn remaining_time_is_derived_from_the_clock() {
        let mut f = make_fixture();
        let now = Utc::now();
        build(&mut f, GENERAL_SLOT, BuildingKind::Baths, now).unwrap();
        let b = building(&f, GENERAL_SLOT);
        assert_eq!(remaining_secs(&b, now), 5);
        assert_eq!(remaining_secs(&b, now + Duration::seconds(3)), 2);
        assert_eq!(remaining_secs(&b, now + Duration::seconds(30)), 0);
    }

    #[test]
    fn elapsed_construction_completes_on_sweep() {
        let mut f = make_fixture();
        let now = Utc::now();
        let city = f.world.city_mut(f.city).unwrap();
        *city.slots.get_mut(GENERAL_SLOT).unwrap() = Some(Building {
            kind: BuildingKind::Sawmill,
            level: 2,
            status: BuildingStatus::InProgress,
            effect: f.rules.buildings.effect(BuildingKind::Sawmill, 1),
            previous_effect: f.rules.buildings.effect(BuildingKind::Sawmill, 1),
            started_at: Some(now - Duration::seconds(11)),
            duration_secs: 10,
            slot: GENERAL_SLOT,
            city: f.city,
        });

        assert_eq!(remaining_secs(&building(&f, GENERAL_SLOT), now), 0);
        assert_eq!(sweep(&f.rules, &mut f.world, now), 1);

        let b = building(&f, GENERAL_SLOT);
        assert_eq!(b.status, BuildingStatus::Complete);
        assert_eq!(b.effect, f.rules.buildings.effect(BuildingKind::Sawmill, 2));
        assert_eq!(b.previous_effect, BuildingEffect::default());
        assert_eq!(b.started_at, None);
        assert_eq!(crate::notifications::unread_count(&f.world, f.player, None), 1);

        // A second sweep in the same second changes nothing.
        assert_eq!(sweep(&f.rules, &mut f.world, now), 0);
        assert_eq!(crate::notifications::unread_count(&f.world, f.player, None), 1);
    }

    #[test]
    fn build_charges_cost_and_keeps_old_effect() {
        let mut f = make_fixture();
        let now = Utc::now();
        let order = build(&mut f, 4, BuildingKind::TownHall, now).unwrap();
        assert_eq!(order.level, 2);
        assert_eq!(order.duration_secs, 15);

        let city = f.world.city(f.city).unwrap();
        assert_eq!(city.stock_of(Resource::Wood), dec!(1300));
        assert_eq!(city.stock_of(Resource::Stone), dec!(2900));
        let b = building(&f, 4);
        assert_eq!(b.status, BuildingStatus::InProgress);
        assert_eq!(b.effect, f.rules.buildings.effect(BuildingKind::TownHall, 1));
        assert_eq!(b.previous_effect, b.effect);
    }

    #[test]
    fn refuses_foreign_city() {
        let mut f = make_fixture();
        let stranger = PlayerId::new();
        let result = build_or_upgrade(
            &f.rules,
            &mut f.world,
            stranger,
            f.city,
            GENERAL_SLOT,
            BuildingKind::Baths,
            Utc::now(),
        );
        assert!(matches!(result, Err(CommandError::PlayerNotFound(_))));

        f.world.city_mut(f.city).unwrap().owner = None;
        let result = build(&mut f, GENERAL_SLOT, BuildingKind::Baths, Utc::now());
        assert!(matches!(result, Err(CommandError::NotOwner(_))));
    }

    #[test]
    fn refuses_without_research() {
        let mut f = make_fixture();
        let result = build(&mut f, GENERAL_SLOT, BuildingKind::Mine, Utc::now());
        assert!(matches!(result, Err(CommandError::ResearchRequired(Research::Mining))));

        f.world
            .player_mut(f.player)
            .unwrap()
            .unlocked_research
            .insert(Research::Mining);
        assert!(build(&mut f, GENERAL_SLOT, BuildingKind::Mine, Utc::now()).is_ok());
    }

    #[test]
    fn refuses_wrong_slot_category_and_occupied_slot() {
        let mut f = make_fixture();
        let result = build(&mut f, 0, BuildingKind::Baths, Utc::now());
        assert!(matches!(result, Err(CommandError::WrongSlotCategory { slot: 0, .. })));

        let result = build(&mut f, 4, BuildingKind::Baths, Utc::now());
        assert!(matches!(
            result,
            Err(CommandError::SlotOccupied { occupant: BuildingKind::TownHall, .. })
        ));

        let result = build(&mut f, 42, BuildingKind::Baths, Utc::now());
        assert!(matches!(result, Err(CommandError::InvalidSlot(42))));
    }

    #[test]
    fn port_goes_in_marine_slot() {
        let mut f = make_fixture();
        assert!(build(&mut f, 2, BuildingKind::Port, Utc::now()).is_ok());
    }

    #[test]
    fn refuses_past_max_level() {
        let mut f = make_fixture();
        let city = f.world.city_mut(f.city).unwrap();
        city.slots.get_mut(4).unwrap().as_mut().unwrap().level = 3;
        let result = build(&mut f, 4, BuildingKind::TownHall, Utc::now());
        assert!(matches!(result, Err(CommandError::MaxLevelReached(BuildingKind::TownHall))));
    }

    #[test]
    fn unaffordable_build_changes_nothing() {
        let mut f = make_fixture();
        f.world
            .city_mut(f.city)
            .unwrap()
            .stock
            .insert(Resource::Wood, dec!(10));
        let before = f.world.clone();
        let result = build(&mut f, GENERAL_SLOT, BuildingKind::Baths, Utc::now());
        assert!(matches!(
            result,
            Err(CommandError::InsufficientResources { resource: Resource::Wood, .. })
        ));
        assert_eq!(f.world, before);
    }

    #[test]
    fn upgrade_in_progress_is_refused() {
        let mut f = make_fixture();
        let now = Utc::now();
        build(&mut f, GENERAL_SLOT, BuildingKind::Baths, now).unwrap();
        let result = build(&mut f, GENERAL_SLOT, BuildingKind::Baths, now);
        assert!(matches!(result, Err(CommandError::ConstructionInProgress(_))));
    }

    #[test]
    fn workshop_discounts_cost_and_time() {
        let mut f = make_fixture();
        let city = f.world.city_mut(f.city).unwrap();
        *city.slots.get_mut(5).unwrap() = Some(Building {
            kind: BuildingKind::ArchitectWorkshop,
            level: 2,
            status: BuildingStatus::Complete,
            effect: f.rules.buildings.effect(BuildingKind::ArchitectWorkshop, 2),
            previous_effect: BuildingEffect::default(),
            started_at: None,
            duration_secs: 0,
            slot: 5,
            city: f.city,
        });

        let order = plan(&f.rules, &f.world, f.player, f.city, 4, BuildingKind::TownHall).unwrap();
        // Level 2 town hall: wood 200, stone 100, 15 s, all cut by 20 %.
        assert_eq!(order.cost.get(&Resource::Wood), Some(&160));
        assert_eq!(order.cost.get(&Resource::Stone), Some(&80));
        assert_eq!(order.duration_secs, 12);
    }

    #[test]
    fn workshop_under_upgrade_uses_previous_effect() {
        let mut f = make_fixture();
        let city = f.world.city_mut(f.city).unwrap();
        *city.slots.get_mut(5).unwrap() = Some(Building {
            kind: BuildingKind::ArchitectWorkshop,
            level: 2,
            status: BuildingStatus::InProgress,
            effect: f.rules.buildings.effect(BuildingKind::ArchitectWorkshop, 1),
            previous_effect: f.rules.buildings.effect(BuildingKind::ArchitectWorkshop, 1),
            started_at: Some(Utc::now()),
            duration_secs: 15,
            slot: 5,
            city: f.city,
        });
        assert_eq!(architect_reductions(f.world.city(f.city).unwrap()), (10, 10));
    }

    #[test]
    fn reduction_never_reaches_zero() {
        assert_eq!(reduce(5, 90), 1);
        assert_eq!(reduce(5, 150), 1);
        assert_eq!(reduce(200, 30), 140);
    }

    #[test]
    fn destroy_lowers_then_removes() {
        let mut f = make_fixture();
        let city = f.world.city_mut(f.city).unwrap();
        city.slots.get_mut(4).unwrap().as_mut().unwrap().level = 2;

        assert!(destroy(&f.rules, &mut f.world, f.player, f.city, 4));
        let b = building(&f, 4);
        assert_eq!(b.level, 1);
        assert_eq!(b.effect, f.rules.buildings.effect(BuildingKind::TownHall, 1));

        assert!(destroy(&f.rules, &mut f.world, f.player, f.city, 4));
        assert!(f.world.city(f.city).unwrap().building_at(4).is_none());
        assert!(!destroy(&f.rules, &mut f.world, f.player, f.city, 4));
    }

    #[test]
    fn destroy_refuses_other_players() {
        let mut f = make_fixture();
        assert!(!destroy(&f.rules, &mut f.world, PlayerId::new(), f.city, 4));
        assert!(f.world.city(f.city).unwrap().building_at(4).is_some());
    }

    #[test]
    fn instant_completion_needs_research_and_threshold() {
        let mut f = make_fixture();
        let now = Utc::now();
        build(&mut f, 4, BuildingKind::TownHall, now).unwrap();

        let result = complete_instantly(&f.rules, &mut f.world, f.player, f.city, 4, now);
        assert!(matches!(result, Err(CommandError::ResearchRequired(_))));

        f.world
            .player_mut(f.player)
            .unwrap()
            .unlocked_research
            .insert(Research::ConstructionPlans);
        let result = complete_instantly(&f.rules, &mut f.world, f.player, f.city, 4, now);
        assert!(matches!(
            result,
            Err(CommandError::TooFarFromCompletion { remaining: 15, threshold: 8 })
        ));

        let later = now + Duration::seconds(10);
        complete_instantly(&f.rules, &mut f.world, f.player, f.city, 4, later).unwrap();
        let b = building(&f, 4);
        assert_eq!(b.status, BuildingStatus::Complete);
        assert_eq!(b.effect.population_capacity, 220);
    }
}
