//! Resource site donations and upgrades.
//!
//! A site collects donations from the cities on its island toward the
//! cost of its next level. Once every cost line is covered the upgrade
//! timer starts; when it runs out the site gains a level and the
//! per-level ledger is emptied. The cumulative history is never reset.
//!
//! Upgrades finish lazily: on the next donation, the next info query, or
//! the per-tick timer pass, whichever comes first.

use std::collections::{BTreeMap, BTreeSet};

use archipel_types::{CityId, IslandId, NotificationKind, PlayerId, Resource, ResourceSite};
use archipel_world::{Rules, World};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::CommandError;
use crate::notifications;

/// Result of an accepted donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationOutcome {
    /// Always `true`; refusals are reported as errors.
    pub success: bool,
    /// Amount actually taken from the city, after capping.
    pub accepted: u32,
    /// Whether the site gained a level during this call.
    pub upgraded: bool,
    /// Site level after the donation.
    pub current_level: u32,
    /// Whether an upgrade timer is running.
    pub upgrade_in_progress: bool,
    /// Seconds left on the upgrade timer.
    pub upgrade_remaining_time: u64,
}

/// Workers one city keeps on a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteWorkers {
    /// City id.
    pub city: CityId,
    /// City name.
    pub name: String,
    /// City owner.
    pub owner: Option<PlayerId>,
    /// Workers assigned.
    pub workers: u32,
}

/// Everything a client shows about a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteInfo {
    /// Island hosting the site.
    pub island: IslandId,
    /// Resource harvested.
    pub resource: Resource,
    /// Current level.
    pub level: u32,
    /// Workers one city may assign now.
    pub max_workers_per_city: u32,
    /// Workers one city may assign after the next upgrade.
    pub next_max_workers_per_city: Option<u32>,
    /// Donations needed for the next level.
    pub upgrade_cost: BTreeMap<Resource, u32>,
    /// Upgrade duration in seconds.
    pub upgrade_time: u64,
    /// Donations toward the current level.
    pub donations: BTreeMap<CityId, BTreeMap<Resource, u32>>,
    /// Every donation ever made.
    pub history: BTreeMap<CityId, BTreeMap<Resource, u64>>,
    /// Workers per city on the island.
    pub workers: Vec<SiteWorkers>,
    /// Whether an upgrade timer is running.
    pub upgrade_in_progress: bool,
    /// Seconds left on the upgrade timer.
    pub upgrade_remaining_time: u64,
}

/// Seconds left on a site's upgrade timer, zero when none runs.
pub fn remaining_secs(rules: &Rules, site: &ResourceSite, now: DateTime<Utc>) -> u64 {
    let Some(started) = site.upgrade_started_at else {
        return 0;
    };
    let duration = rules
        .sites
        .level(site.resource, site.level)
        .map_or(0, |l| l.upgrade_secs);
    let elapsed = u64::try_from(now.signed_duration_since(started).num_seconds()).unwrap_or(0);
    duration.saturating_sub(elapsed)
}

/// Whether the donations cover every cost line of the current level.
pub fn fully_funded(rules: &Rules, site: &ResourceSite) -> bool {
    rules
        .sites
        .level(site.resource, site.level)
        .is_some_and(|l| {
            !l.upgrade_cost.is_empty()
                && l.upgrade_cost
                    .iter()
                    .all(|(r, cost)| site.donated(*r) >= *cost)
        })
}

/// Finish an upgrade whose timer has run out.
///
/// Returns `true` if the site gained a level. Owners of cities on the
/// island are notified.
pub fn finish_upgrade_if_due(
    rules: &Rules,
    world: &mut World,
    island: IslandId,
    resource: Resource,
    now: DateTime<Utc>,
) -> bool {
    let Some(site) = world.site_mut(island, resource) else {
        return false;
    };
    if site.upgrade_started_at.is_none() || remaining_secs(rules, site, now) > 0 {
        return false;
    }
    site.level = site.level.saturating_add(1);
    site.donations.clear();
    site.upgrade_started_at = None;
    let level = site.level;

    info!(%island, ?resource, level, "Resource site upgraded");
    let island_name = world.island(island).map(|i| i.name.clone()).unwrap_or_default();
    let owners: Vec<PlayerId> = world
        .island(island)
        .map(|i| i.cities.clone())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| world.city(id).and_then(|c| c.owner))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    for owner in owners {
        notifications::notify(
            world,
            owner,
            NotificationKind::Info,
            format!(
                "The {} of {island_name} reached level {level}.",
                resource.site_name()
            ),
            now,
        );
    }
    true
}

/// Run the upgrade timers of every site. Returns how many levelled up.
pub fn advance_all(rules: &Rules, world: &mut World, now: DateTime<Utc>) -> usize {
    world
        .site_keys()
        .into_iter()
        .filter(|(island, resource)| finish_upgrade_if_due(rules, world, *island, *resource, now))
        .count()
}

/// Donate `amount` of `donated` from `city` to the site of `site_resource`
/// on the city's island.
///
/// The amount is capped at what the level still needs; the city is only
/// charged for the accepted part.
#[allow(clippy::too_many_arguments)]
pub fn donate(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    city_id: CityId,
    island: IslandId,
    site_resource: Resource,
    donated: Resource,
    amount: u32,
    now: DateTime<Utc>,
) -> Result<DonationOutcome, CommandError> {
    let city = world
        .city(city_id)
        .ok_or(CommandError::CityNotFound(city_id))?;
    if city.owner != Some(player) {
        return Err(CommandError::NotOwner(city_id));
    }
    if city.island != island {
        return Err(CommandError::NotOnIsland(city_id));
    }
    if world.site(island, site_resource).is_none() {
        return Err(CommandError::SiteNotFound {
            island,
            resource: site_resource,
        });
    }
    if amount == 0 {
        return Err(CommandError::ZeroAmount);
    }

    let mut upgraded = finish_upgrade_if_due(rules, world, island, site_resource, now);

    let site = world
        .site(island, site_resource)
        .ok_or(CommandError::SiteNotFound {
            island,
            resource: site_resource,
        })?;
    let required = rules
        .sites
        .level(site_resource, site.level)
        .and_then(|l| l.upgrade_cost.get(&donated).copied())
        .ok_or(CommandError::NotRequired(donated))?;
    let missing = required.saturating_sub(site.donated(donated));
    if missing == 0 {
        return Err(CommandError::AlreadyFunded(donated));
    }
    let accepted = amount.min(missing);

    let available = world
        .city(city_id)
        .map_or(Decimal::ZERO, |c| c.stock_of(donated));
    if available < Decimal::from(accepted) {
        return Err(CommandError::InsufficientResources {
            resource: donated,
            required: Decimal::from(accepted),
            available,
        });
    }

    // Validated; apply.
    if let Some(city) = world.city_mut(city_id) {
        let stock = city.stock.entry(donated).or_insert(Decimal::ZERO);
        *stock = stock.saturating_sub(Decimal::from(accepted));
    }
    if let Some(site) = world.site_mut(island, site_resource) {
        let ledger = site.donations.entry(city_id).or_default().entry(donated).or_insert(0);
        *ledger = ledger.saturating_add(accepted);
        let history = site.history.entry(city_id).or_default().entry(donated).or_insert(0);
        *history = history.saturating_add(u64::from(accepted));
    }
    info!(city = %city_id, %island, site = ?site_resource, ?donated, accepted, "Donation received");

    upgraded |= finish_upgrade_if_due(rules, world, island, site_resource, now);

    if let Some(site) = world
        .site_mut(island, site_resource)
        .filter(|s| s.upgrade_started_at.is_none() && fully_funded(rules, s))
    {
        site.upgrade_started_at = Some(now);
        info!(%island, site = ?site_resource, level = site.level, "Site upgrade started");
    }

    let site = world
        .site(island, site_resource)
        .ok_or(CommandError::SiteNotFound {
            island,
            resource: site_resource,
        })?;
    Ok(DonationOutcome {
        success: true,
        accepted,
        upgraded,
        current_level: site.level,
        upgrade_in_progress: site.upgrade_started_at.is_some(),
        upgrade_remaining_time: remaining_secs(rules, site, now),
    })
}

/// Describe a site, finishing a due upgrade first.
pub fn site_info(
    rules: &Rules,
    world: &mut World,
    island: IslandId,
    resource: Resource,
    now: DateTime<Utc>,
) -> Result<SiteInfo, CommandError> {
    finish_upgrade_if_due(rules, world, island, resource, now);
    let site = world
        .site(island, resource)
        .ok_or(CommandError::SiteNotFound { island, resource })?;
    let current = rules.sites.level(resource, site.level);

    let workers = world
        .island(island)
        .map(|i| i.cities.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(|id| world.city(*id))
        .map(|c| SiteWorkers {
            city: c.id,
            name: c.name.clone(),
            owner: c.owner,
            workers: c.workers_on(resource),
        })
        .collect();

    Ok(SiteInfo {
        island,
        resource,
        level: site.level,
        max_workers_per_city: current.map_or(0, |l| l.max_workers_per_city),
        next_max_workers_per_city: rules
            .sites
            .level(resource, site.level.saturating_add(1))
            .map(|l| l.max_workers_per_city),
        upgrade_cost: current.map(|l| l.upgrade_cost.clone()).unwrap_or_default(),
        upgrade_time: current.map_or(0, |l| l.upgrade_secs),
        donations: site.donations.clone(),
        history: site.history.clone(),
        workers,
        upgrade_in_progress: site.upgrade_started_at.is_some(),
        upgrade_remaining_time: remaining_secs(rules, site, now),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use archipel_types::{Coordinates, Island};
    use archipel_world::{fresh_city, fresh_site};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    struct Fixture {
        rules: Rules,
        world: World,
        player: PlayerId,
        island: IslandId,
        city: CityId,
    }

    fn make_fixture() -> Fixture {
        let rules = Rules::standard();
        let mut world = World::new();
        let island = IslandId::new();
        world
            .add_island(Island {
                id: island,
                name: String::from("Verdant"),
                coordinates: Coordinates::new(0, 0),
                base_resource: Resource::Stone,
                advanced_resource: Resource::Marble,
                cities: Vec::new(),
            })
            .unwrap();
        world.insert_site(fresh_site(island, Resource::Wood));
        world.insert_site(fresh_site(island, Resource::Stone));
        let player = PlayerId::new();
        let mut city = fresh_city(&rules, "Donor", island, Coordinates::new(0, 0));
        city.owner = Some(player);
        let city_id = city.id;
        world.add_city(city).unwrap();
        Fixture {
            rules,
            world,
            player,
            island,
            city: city_id,
        }
    }

    fn offer(
        f: &mut Fixture,
        site: Resource,
        donated: Resource,
        amount: u32,
        now: DateTime<Utc>,
    ) -> Result<DonationOutcome, CommandError> {
        let (player, city, island) = (f.player, f.city, f.island);
        donate(&f.rules, &mut f.world, player, city, island, site, donated, amount, now)
    }

    fn give(f: &mut Fixture, resource: Resource, amount: Decimal) {
        f.world.city_mut(f.city).unwrap().stock.insert(resource, amount);
    }

    #[test]
    fn excess_donation_is_not_charged() {
        let mut f = make_fixture();
        let now = Utc::now();
        // The stone quarry needs wood 100 and stone 200 for level 2.
        give(&mut f, Resource::Wood, dec!(500));
        let outcome = offer(&mut f, Resource::Stone, Resource::Wood, 150, now).unwrap();
        assert_eq!(outcome.accepted, 100);
        assert_eq!(f.world.city(f.city).unwrap().stock_of(Resource::Wood), dec!(400));
        let site = f.world.site(f.island, Resource::Stone).unwrap();
        assert_eq!(site.donated(Resource::Wood), 100);
        assert!(!outcome.upgrade_in_progress);

        let outcome = offer(&mut f, Resource::Stone, Resource::Stone, 200, now).unwrap();
        assert!(outcome.upgrade_in_progress);
        assert_eq!(outcome.upgrade_remaining_time, 4);
        assert_eq!(outcome.current_level, 1);
    }

    #[test]
    fn single_resource_level_starts_timer() {
        let mut f = make_fixture();
        let now = Utc::now();
        give(&mut f, Resource::Wood, dec!(1000));
        let outcome = offer(&mut f, Resource::Wood, Resource::Wood, 150, now).unwrap();
        // Forest level 1 needs 200 wood.
        assert_eq!(outcome.accepted, 150);
        assert!(!outcome.upgrade_in_progress);

        let outcome = offer(&mut f, Resource::Wood, Resource::Wood, 150, now).unwrap();
        assert_eq!(outcome.accepted, 50);
        assert!(outcome.upgrade_in_progress);
        assert_eq!(outcome.upgrade_remaining_time, 5);
        assert_eq!(f.world.city(f.city).unwrap().stock_of(Resource::Wood), dec!(800));
    }

    #[test]
    fn funded_resource_is_refused() {
        let mut f = make_fixture();
        let now = Utc::now();
        give(&mut f, Resource::Wood, dec!(1000));
        offer(&mut f, Resource::Stone, Resource::Wood, 100, now).unwrap();
        let result = offer(&mut f, Resource::Stone, Resource::Wood, 10, now);
        assert!(matches!(result, Err(CommandError::AlreadyFunded(Resource::Wood))));
    }

    #[test]
    fn resource_outside_cost_is_refused() {
        let mut f = make_fixture();
        let result = offer(&mut f, Resource::Wood, Resource::Iron, 10, Utc::now());
        assert!(matches!(result, Err(CommandError::NotRequired(Resource::Iron))));
    }

    #[test]
    fn insufficient_stock_changes_nothing() {
        let mut f = make_fixture();
        give(&mut f, Resource::Wood, dec!(20));
        let before = f.world.clone();
        let result = offer(&mut f, Resource::Wood, Resource::Wood, 50, Utc::now());
        assert!(matches!(result, Err(CommandError::InsufficientResources { .. })));
        assert_eq!(f.world, before);
    }

    #[test]
    fn foreign_city_cannot_donate() {
        let mut f = make_fixture();
        let (stranger, city, island) = (PlayerId::new(), f.city, f.island);
        let wood = Resource::Wood;
        let now = Utc::now();
        let result = donate(&f.rules, &mut f.world, stranger, city, island, wood, wood, 50, now);
        assert!(matches!(result, Err(CommandError::NotOwner(_))));
        let elsewhere = IslandId::new();
        let result = donate(&f.rules, &mut f.world, f.player, city, elsewhere, wood, wood, 50, now);
        assert!(matches!(result, Err(CommandError::NotOnIsland(_))));
    }

    #[test]
    fn upgrade_completes_and_history_survives() {
        let mut f = make_fixture();
        let now = Utc::now();
        give(&mut f, Resource::Wood, dec!(1000));
        offer(&mut f, Resource::Wood, Resource::Wood, 200, now).unwrap();

        let later = now + Duration::seconds(6);
        let info = site_info(&f.rules, &mut f.world, f.island, Resource::Wood, later).unwrap();
        assert_eq!(info.level, 2);
        assert!(info.donations.is_empty());
        assert!(!info.upgrade_in_progress);
        assert_eq!(info.upgrade_cost.get(&Resource::Wood), Some(&300));
        let site = f.world.site(f.island, Resource::Wood).unwrap();
        assert_eq!(site.historical_total(Resource::Wood), 200);

        offer(&mut f, Resource::Wood, Resource::Wood, 100, later).unwrap();
        let site = f.world.site(f.island, Resource::Wood).unwrap();
        assert_eq!(site.historical_total(Resource::Wood), 300);
        assert_eq!(site.donated(Resource::Wood), 100);
    }

    #[test]
    fn timer_pass_upgrades_and_notifies() {
        let mut f = make_fixture();
        let now = Utc::now();
        give(&mut f, Resource::Wood, dec!(1000));
        offer(&mut f, Resource::Wood, Resource::Wood, 200, now).unwrap();

        assert_eq!(advance_all(&f.rules, &mut f.world, now + Duration::seconds(2)), 0);
        assert_eq!(advance_all(&f.rules, &mut f.world, now + Duration::seconds(5)), 1);
        assert_eq!(f.world.site(f.island, Resource::Wood).unwrap().level, 2);
        assert_eq!(
            notifications::unread_count(&f.world, f.player, Some(NotificationKind::Info)),
            1
        );
    }

    #[test]
    fn info_lists_workers_per_city() {
        let mut f = make_fixture();
        f.world.city_mut(f.city).unwrap().workers.insert(Resource::Wood, 6);
        let info = site_info(&f.rules, &mut f.world, f.island, Resource::Wood, Utc::now()).unwrap();
        assert_eq!(info.max_workers_per_city, 8);
        assert_eq!(info.next_max_workers_per_city, Some(12));
        assert_eq!(info.workers.len(), 1);
        assert_eq!(info.workers.first().map(|w| w.workers), Some(6));
    }

    #[test]
    fn top_level_site_accepts_nothing() {
        let mut f = make_fixture();
        f.world.site_mut(f.island, Resource::Wood).unwrap().level = 10;
        give(&mut f, Resource::Wood, dec!(1000));
        let result = offer(&mut f, Resource::Wood, Resource::Wood, 10, Utc::now());
        assert!(matches!(result, Err(CommandError::NotRequired(_))));
    }
}
