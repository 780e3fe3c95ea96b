//! Player commands that are not owned by a single engine.
//!
//! Accounts, city management, workers, ships and the plague cure. Every
//! command checks everything it needs first and only then mutates, so an
//! error leaves the world exactly as it was.

use std::collections::BTreeSet;

use archipel_types::{
    BuildingKind, CityId, Player, PlayerId, Resource, SatisfactionFactor, TaxRate, Workplace,
};
use archipel_world::{Rules, World};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CommandError;
use crate::population::{city_hygiene, floor_u32};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Build a new player account with the starting allowance.
pub fn new_player(rules: &Rules, username: &str, credential: &str, now: DateTime<Utc>) -> Player {
    let balance = &rules.balance;
    Player {
        id: PlayerId::new(),
        username: username.to_owned(),
        credential: credential.to_owned(),
        diamonds: balance.starting_diamonds,
        ships: balance.starting_ships,
        ships_available: balance.starting_ships,
        research_points: Decimal::ZERO,
        unlocked_research: BTreeSet::new(),
        created_at: now,
    }
}

/// Log in, creating the account on first use.
///
/// # Errors
///
/// Fails on an empty username or when the credential does not match the
/// existing account.
pub fn join(
    rules: &Rules,
    world: &mut World,
    username: &str,
    credential: &str,
    now: DateTime<Utc>,
) -> Result<PlayerId, CommandError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CommandError::EmptyUsername);
    }
    if let Some(existing) = world.player_by_username(username) {
        if existing.credential != credential {
            warn!(username, "Rejected login");
            return Err(CommandError::WrongCredential(username.to_owned()));
        }
        return Ok(existing.id);
    }
    let player = new_player(rules, username, credential, now);
    let id = player.id;
    world.add_player(player)?;
    info!(%id, username, "Player created");
    Ok(id)
}

/// Credit diamonds to a player. Returns the new balance.
///
/// # Errors
///
/// Fails when the player is unknown.
pub fn add_diamonds(world: &mut World, player: PlayerId, amount: u64) -> Result<u64, CommandError> {
    let account = world
        .player_mut(player)
        .ok_or(CommandError::PlayerNotFound(player))?;
    account.diamonds = account.diamonds.saturating_add(amount);
    Ok(account.diamonds)
}

// ---------------------------------------------------------------------------
// Cities
// ---------------------------------------------------------------------------

fn owned_city(world: &World, player: PlayerId, city: CityId) -> Result<(), CommandError> {
    let found = world.city(city).ok_or(CommandError::CityNotFound(city))?;
    if found.owner == Some(player) {
        Ok(())
    } else {
        Err(CommandError::NotOwner(city))
    }
}

/// Take an unowned city. Claiming one's own city again is accepted.
///
/// # Errors
///
/// Fails when the player or city is unknown or another player owns it.
pub fn claim_city(world: &mut World, player: PlayerId, city: CityId) -> Result<(), CommandError> {
    if world.player(player).is_none() {
        return Err(CommandError::PlayerNotFound(player));
    }
    let target = world
        .city_mut(city)
        .ok_or(CommandError::CityNotFound(city))?;
    match target.owner {
        Some(owner) if owner != player => Err(CommandError::CityTaken),
        Some(_) => Ok(()),
        None => {
            target.owner = Some(player);
            info!(%city, %player, "City claimed");
            Ok(())
        }
    }
}

/// Rename a city.
///
/// # Errors
///
/// Fails on an empty name or when the player does not own the city.
pub fn rename_city(
    world: &mut World,
    player: PlayerId,
    city: CityId,
    name: &str,
) -> Result<(), CommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::EmptyName);
    }
    owned_city(world, player, city)?;
    if let Some(target) = world.city_mut(city) {
        target.name = name.to_owned();
    }
    Ok(())
}

/// Select a tax band. The satisfaction bonus changes immediately.
///
/// # Errors
///
/// Fails when the player does not own the city.
pub fn set_tax_rate(
    world: &mut World,
    player: PlayerId,
    city: CityId,
    rate: TaxRate,
) -> Result<(), CommandError> {
    owned_city(world, player, city)?;
    if let Some(target) = world.city_mut(city) {
        target.tax_rate = rate;
        target
            .satisfaction_factors
            .bonus
            .insert(SatisfactionFactor::Taxes, rate.satisfaction_bonus());
    }
    Ok(())
}

/// Select the windmill cereal multiplier, at least 1.
///
/// The value is stored as chosen and clamped to the windmill's maximum
/// when the population is updated.
///
/// # Errors
///
/// Fails when the player does not own the city.
pub fn set_windmill_multiplier(
    world: &mut World,
    player: PlayerId,
    city: CityId,
    multiplier: u32,
) -> Result<u32, CommandError> {
    owned_city(world, player, city)?;
    let multiplier = multiplier.max(1);
    if let Some(target) = world.city_mut(city) {
        target.windmill_multiplier = multiplier;
    }
    Ok(multiplier)
}

/// Outcome of a plague cure attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CureOutcome {
    /// Whether the plague is gone.
    pub cured: bool,
    /// Gold charged, whatever the outcome.
    pub cost: Decimal,
}

/// Attempt to cure a city's plague.
///
/// The gold is spent even when the cure fails.
///
/// # Errors
///
/// Fails when the player does not own the city, the city has no plague,
/// hygiene is under 100 percent, or gold is short.
pub fn cure_plague(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    city: CityId,
    rng: &mut impl Rng,
) -> Result<CureOutcome, CommandError> {
    owned_city(world, player, city)?;
    let target = world.city(city).ok_or(CommandError::CityNotFound(city))?;
    if !target.has_plague {
        return Err(CommandError::NoPlague);
    }
    let hygiene = city_hygiene(target);
    if hygiene < 100 {
        return Err(CommandError::HygieneTooLow(hygiene));
    }
    let cost = target
        .population
        .saturating_mul(Decimal::from(rules.balance.cure_gold_per_citizen));
    let gold = target.stock_of(Resource::Gold);
    if gold < cost {
        return Err(CommandError::InsufficientResources {
            resource: Resource::Gold,
            required: cost,
            available: gold,
        });
    }

    let cured = rng.random_range(0..100_u32) < rules.balance.cure_success_percent;
    if let Some(target) = world.city_mut(city) {
        target
            .stock
            .insert(Resource::Gold, gold.saturating_sub(cost));
        if cured {
            target.has_plague = false;
            target
                .satisfaction_factors
                .malus
                .remove(&SatisfactionFactor::Plague);
        }
    }
    info!(%city, cured, %cost, "Plague cure attempted");
    Ok(CureOutcome { cured, cost })
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// Put workers on a site of the city's island or in its academy.
///
/// The request is clamped to the workplace's capacity and to the free
/// population plus the workers already there. Returns the count assigned.
///
/// # Errors
///
/// Fails when the player does not own the city, the resource has no site
/// on the island, or the academy is missing.
pub fn assign_workers(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    city: CityId,
    workplace: Workplace,
    requested: u32,
) -> Result<u32, CommandError> {
    owned_city(world, player, city)?;
    let target = world.city(city).ok_or(CommandError::CityNotFound(city))?;

    let (capacity, current) = match workplace {
        Workplace::Site(resource) => {
            if !resource.is_harvestable() {
                return Err(CommandError::NotHarvestable(resource));
            }
            let site = world
                .site(target.island, resource)
                .ok_or(CommandError::SiteNotFound {
                    island: target.island,
                    resource,
                })?;
            (
                rules.sites.max_workers_per_city(resource, site.level),
                target.workers_on(resource),
            )
        }
        Workplace::Academy => {
            let academy = target
                .complete_buildings(BuildingKind::Academy)
                .next()
                .ok_or(CommandError::NoAcademy)?;
            (academy.effect.max_workers, target.academy_workers)
        }
    };
    let free = floor_u32(target.free_population()).saturating_add(current);
    let assigned = requested.min(capacity).min(free);

    if let Some(target) = world.city_mut(city) {
        match workplace {
            Workplace::Site(resource) => {
                if assigned == 0 {
                    target.workers.remove(&resource);
                } else {
                    target.workers.insert(resource, assigned);
                }
            }
            Workplace::Academy => target.academy_workers = assigned,
        }
    }
    info!(%city, ?workplace, requested, assigned, "Workers assigned");
    Ok(assigned)
}

// ---------------------------------------------------------------------------
// Ships
// ---------------------------------------------------------------------------

/// Gold price of the next ship for a player owning `ships`.
///
/// The second ship costs the base price; each further one costs half as
/// much again as the previous.
pub fn ship_price(rules: &Rules, ships: u32) -> Decimal {
    let step = Decimal::new(15, 1);
    (1..ships.max(1))
        .fold(Decimal::from(rules.balance.ship_base_price), |price, _| {
            price.saturating_mul(step)
        })
        .floor()
}

/// Result of a ship purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShipPurchase {
    /// Gold paid.
    pub price: Decimal,
    /// Ships owned afterwards.
    pub ships: u32,
}

/// Buy a ship with gold from one of the player's cities.
///
/// # Errors
///
/// Fails when the player is unknown, does not own the city, or lacks gold.
pub fn buy_ship(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    city: CityId,
) -> Result<ShipPurchase, CommandError> {
    let account = world
        .player(player)
        .ok_or(CommandError::PlayerNotFound(player))?;
    let price = ship_price(rules, account.ships);
    owned_city(world, player, city)?;
    let gold = world
        .city(city)
        .map_or(Decimal::ZERO, |c| c.stock_of(Resource::Gold));
    if gold < price {
        return Err(CommandError::InsufficientResources {
            resource: Resource::Gold,
            required: price,
            available: gold,
        });
    }

    if let Some(target) = world.city_mut(city) {
        target
            .stock
            .insert(Resource::Gold, gold.saturating_sub(price));
    }
    let ships = world.player_mut(player).map_or(0, |account| {
        account.ships = account.ships.saturating_add(1);
        account.ships_available = account.ships_available.saturating_add(1);
        account.ships
    });
    info!(%player, %price, ships, "Ship bought");
    Ok(ShipPurchase { price, ships })
}
