//! Transport state machine.
//!
//! A shipment moves through `Waiting -> Loading -> InTransit -> Returning`
//! and leaves the active set once its ships are home. A port loads one
//! shipment at a time: a new transport queues behind every transport of
//! the same source city still waiting or loading.
//!
//! Cargo and ships are taken from the source exactly once, guarded by
//! [`Transport::resources_deducted`]: at creation when the port is free,
//! otherwise when the transport leaves the queue. A queued transport
//! reserves nothing, so on leaving the queue its cargo is cut down to the
//! stock left at the source, and it is cancelled if its ships are no
//! longer in port.

use std::collections::BTreeMap;

use archipel_types::{
    CityId, NotificationKind, PlayerId, Resource, Transport, TransportId, TransportState,
};
use archipel_world::{Rules, World, add_capped};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::economy::storage_capacity;
use crate::error::CommandError;
use crate::notifications;
use crate::population::floor_u32;

/// A player's request to ship goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportRequest {
    /// City the goods leave from.
    pub source: CityId,
    /// City receiving the goods.
    pub destination: CityId,
    /// Goods to ship.
    #[serde(default)]
    pub cargo: BTreeMap<Resource, u32>,
    /// Ships to commit.
    pub ships: u32,
    /// Loading time in seconds.
    pub loading_secs: u64,
    /// One-way sailing time in seconds.
    pub travel_secs: u64,
}

/// What one pass over the active transports did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportReport {
    /// Transports that started loading after queueing.
    pub loaded: usize,
    /// Transports that set sail.
    pub departed: usize,
    /// Cargoes delivered.
    pub delivered: usize,
    /// Transports whose ships came home and left the active set.
    pub finished: usize,
    /// Queued transports dropped because their ships had left the port.
    pub cancelled: usize,
}

/// Create a transport from a city the player owns.
///
/// # Errors
///
/// Fails when a city or the player is unknown, the player does not own
/// the source, the source lacks a cargo line, or too few ships are in port.
pub fn create(
    world: &mut World,
    player: PlayerId,
    request: TransportRequest,
) -> Result<Transport, CommandError> {
    let account = world
        .player(player)
        .ok_or(CommandError::PlayerNotFound(player))?;
    let source = world
        .city(request.source)
        .ok_or(CommandError::CityNotFound(request.source))?;
    let destination = world
        .city(request.destination)
        .ok_or(CommandError::CityNotFound(request.destination))?;
    if source.owner != Some(player) {
        return Err(CommandError::NotOwner(request.source));
    }
    for (resource, amount) in &request.cargo {
        let available = source.stock_of(*resource);
        if available < Decimal::from(*amount) {
            return Err(CommandError::InsufficientResources {
                resource: *resource,
                required: Decimal::from(*amount),
                available,
            });
        }
    }
    if request.ships == 0 || account.ships_available < request.ships {
        return Err(CommandError::NotEnoughShips {
            required: request.ships.max(1),
            available: account.ships_available,
        });
    }

    let queued: Vec<u64> = world
        .transports()
        .filter(|t| {
            t.source == request.source
                && matches!(t.state, TransportState::Waiting | TransportState::Loading)
        })
        .map(|t| t.remaining_secs)
        .collect();

    let mut transport = Transport {
        id: world.next_transport_id(),
        source: request.source,
        destination: request.destination,
        cargo: request
            .cargo
            .into_iter()
            .filter(|(_, amount)| *amount > 0)
            .collect(),
        ships: request.ships,
        source_player: player,
        destination_player: destination.owner,
        loading_secs: request.loading_secs,
        travel_secs: request.travel_secs,
        remaining_secs: request.loading_secs,
        state: TransportState::Loading,
        resources_deducted: false,
        cancelled_at: None,
    };

    if queued.is_empty() {
        take_from_source(world, &mut transport);
    } else {
        transport.state = TransportState::Waiting;
        transport.remaining_secs = queued.iter().fold(0_u64, |acc, s| acc.saturating_add(*s));
    }

    info!(
        id = %transport.id,
        source = %transport.source,
        destination = %transport.destination,
        ships = transport.ships,
        state = ?transport.state,
        "Transport created"
    );
    world.insert_transport(transport.clone());
    Ok(transport)
}

/// Take cargo and ships from the source, once.
///
/// Each cargo line is cut down to the whole units left in stock. Returns
/// `false` and touches nothing when fewer ships than needed are in port.
fn take_from_source(world: &mut World, transport: &mut Transport) -> bool {
    if transport.resources_deducted {
        return true;
    }
    let in_port = world
        .player(transport.source_player)
        .map_or(0, |account| account.ships_available);
    if in_port < transport.ships {
        return false;
    }
    match world.city_mut(transport.source) {
        Some(city) => {
            for (resource, amount) in &mut transport.cargo {
                let stock = city.stock.entry(*resource).or_insert(Decimal::ZERO);
                *amount = (*amount).min(floor_u32(*stock));
                *stock = stock.saturating_sub(Decimal::from(*amount));
            }
        }
        None => transport.cargo.clear(),
    }
    transport.cargo.retain(|_, amount| *amount > 0);
    if let Some(account) = world.player_mut(transport.source_player) {
        account.ships_available = account.ships_available.saturating_sub(transport.ships);
    }
    transport.resources_deducted = true;
    true
}

/// Move a queued transport to the loading dock, or drop it when its ships
/// are gone. Returns whether it is now loading.
fn leave_queue(world: &mut World, transport: &mut Transport, now: DateTime<Utc>) -> bool {
    let requested = transport.cargo.clone();
    if !take_from_source(world, transport) {
        world.remove_transport(transport.id);
        notifications::notify(
            world,
            transport.source_player,
            NotificationKind::Transport,
            "Your transport was cancelled: not enough ships in port.",
            now,
        );
        info!(id = %transport.id, ships = transport.ships, "Queued transport dropped");
        return false;
    }
    if transport.cargo != requested {
        let goods = cargo_summary(&transport.cargo);
        notifications::notify(
            world,
            transport.source_player,
            NotificationKind::Transport,
            format!("Your transport is loading with what was left in stock ({goods})."),
            now,
        );
        debug!(id = %transport.id, "Queued cargo cut down to stock");
    }
    transport.state = TransportState::Loading;
    transport.remaining_secs = transport.loading_secs;
    true
}

/// Add goods to a city without exceeding its storage.
fn credit(rules: &Rules, world: &mut World, city_id: CityId, goods: &BTreeMap<Resource, u32>) {
    let Some(city) = world.city_mut(city_id) else {
        return;
    };
    for (resource, amount) in goods {
        let capacity = storage_capacity(rules, city, *resource);
        let stock = city.stock.entry(*resource).or_insert(Decimal::ZERO);
        add_capped(stock, Decimal::from(*amount), capacity);
    }
}

fn return_ships(world: &mut World, transport: &Transport) {
    if let Some(account) = world.player_mut(transport.source_player) {
        account.ships_available = account
            .ships_available
            .saturating_add(transport.ships)
            .min(account.ships);
    }
}

fn has_plague(world: &World, city: CityId) -> bool {
    world.city(city).is_some_and(|c| c.has_plague)
}

fn infect(world: &mut World, city: CityId) {
    if let Some(c) = world.city_mut(city).filter(|c| !c.has_plague) {
        c.has_plague = true;
        info!(city = %c.id, "Plague carried in by ship");
    }
}

fn cargo_summary(cargo: &BTreeMap<Resource, u32>) -> String {
    if cargo.is_empty() {
        return String::from("nothing");
    }
    cargo
        .iter()
        .map(|(r, n)| format!("{r:?}: {n}").to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

fn city_name(world: &World, city: CityId) -> String {
    world.city(city).map(|c| c.name.clone()).unwrap_or_default()
}

/// Unload the cargo at its destination and tell both players.
fn deliver(rules: &Rules, world: &mut World, transport: &Transport, now: DateTime<Utc>) {
    credit(rules, world, transport.destination, &transport.cargo);
    if has_plague(world, transport.source) {
        infect(world, transport.destination);
    }

    let from = city_name(world, transport.source);
    let to = city_name(world, transport.destination);
    let goods = cargo_summary(&transport.cargo);
    notifications::notify(
        world,
        transport.source_player,
        NotificationKind::Transport,
        format!("Transport from {from} to {to} ({goods}) has arrived."),
        now,
    );
    if let Some(receiver) = transport.destination_player {
        notifications::notify(
            world,
            receiver,
            NotificationKind::Transport,
            format!("You received a transport from {from} ({goods})."),
            now,
        );
    }
}

/// Advance every active transport by `dt_secs` simulated seconds.
///
/// A transport changes state at most once per call.
pub fn update_all(
    rules: &Rules,
    world: &mut World,
    dt_secs: u64,
    now: DateTime<Utc>,
) -> TransportReport {
    let mut report = TransportReport::default();
    for id in world.transport_ids() {
        let Some(mut transport) = world.transport(id).cloned() else {
            continue;
        };
        transport.remaining_secs = transport.remaining_secs.saturating_sub(dt_secs);
        if transport.remaining_secs > 0 {
            world.insert_transport(transport);
            continue;
        }

        match transport.state {
            TransportState::Waiting => {
                if !leave_queue(world, &mut transport, now) {
                    report.cancelled = report.cancelled.saturating_add(1);
                    continue;
                }
                report.loaded = report.loaded.saturating_add(1);
            }
            TransportState::Loading => {
                transport.state = TransportState::InTransit;
                transport.remaining_secs = transport.travel_secs;
                report.departed = report.departed.saturating_add(1);
            }
            TransportState::InTransit => {
                deliver(rules, world, &transport, now);
                report.delivered = report.delivered.saturating_add(1);
                let own_port = world
                    .city(transport.destination)
                    .is_some_and(|c| c.owner == Some(transport.source_player));
                if own_port {
                    return_ships(world, &transport);
                    world.remove_transport(id);
                    report.finished = report.finished.saturating_add(1);
                    debug!(%id, "Transport delivered to own city");
                    continue;
                }
                transport.state = TransportState::Returning;
                transport.remaining_secs = transport.travel_secs;
            }
            TransportState::Returning => {
                // A cancelled voyage never reached the destination.
                if transport.cancelled_at.is_none() && has_plague(world, transport.destination) {
                    infect(world, transport.source);
                }
                return_ships(world, &transport);
                world.remove_transport(id);
                report.finished = report.finished.saturating_add(1);
                debug!(%id, "Ships back in port");
                continue;
            }
            TransportState::Cancelled => {
                world.remove_transport(id);
                continue;
            }
        }
        debug!(
            %id,
            state = ?transport.state,
            remaining = transport.remaining_secs,
            "Transport advanced"
        );
        world.insert_transport(transport);
    }
    report
}

/// Cancel a transport.
///
/// Before departure the cargo and ships go back to the source and the
/// transport leaves the active set. At sea the ships turn around and sail
/// back for as long as they have already sailed, at least one second; the
/// cargo is lost. Returns the state the transport ends in.
///
/// # Errors
///
/// Fails when the transport is unknown, belongs to another player, or is
/// already returning or cancelled.
pub fn cancel(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    id: TransportId,
    now: DateTime<Utc>,
) -> Result<TransportState, CommandError> {
    let mut transport = world
        .transport(id)
        .cloned()
        .ok_or(CommandError::TransportNotFound(id))?;
    if transport.source_player != player {
        return Err(CommandError::NotOwner(transport.source));
    }

    match transport.state {
        TransportState::Returning | TransportState::Cancelled => Err(CommandError::CannotCancel {
            id,
            state: transport.state,
        }),
        TransportState::Waiting | TransportState::Loading => {
            if transport.resources_deducted {
                credit(rules, world, transport.source, &transport.cargo);
                return_ships(world, &transport);
            }
            world.remove_transport(id);
            notifications::notify(
                world,
                player,
                NotificationKind::Transport,
                "Your transport was cancelled.",
                now,
            );
            info!(%id, "Transport cancelled in port");
            Ok(TransportState::Cancelled)
        }
        TransportState::InTransit => {
            let sailed = transport.travel_secs.saturating_sub(transport.remaining_secs);
            transport.state = TransportState::Returning;
            transport.remaining_secs = sailed.max(1);
            transport.cancelled_at = Some(now);
            world.insert_transport(transport);
            notifications::notify(
                world,
                player,
                NotificationKind::Transport,
                "Your transport was cancelled: your ships are turning back.",
                now,
            );
            info!(%id, "Transport turned back at sea");
            Ok(TransportState::Returning)
        }
    }
}

/// Transports a player sends or receives.
pub fn for_player(world: &World, player: PlayerId) -> Vec<Transport> {
    world
        .transports()
        .filter(|t| t.source_player == player || t.destination_player == Some(player))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use archipel_types::{Coordinates, Island, Player};
    use archipel_world::fresh_city;
    use rust_decimal_macros::dec;

    use super::*;

    struct Fixture {
        rules: Rules,
        world: World,
        alice: PlayerId,
        bob: PlayerId,
        home: CityId,
        colony: CityId,
        foreign: CityId,
    }

    fn make_player(name: &str, ships: u32) -> Player {
        Player {
            id: PlayerId::new(),
            username: name.to_owned(),
            credential: String::from("pw"),
            diamonds: 0,
            ships,
            ships_available: ships,
            research_points: Decimal::ZERO,
            unlocked_research: std::collections::BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    fn make_fixture() -> Fixture {
        let rules = Rules::standard();
        let mut world = World::new();
        let island = archipel_types::IslandId::new();
        world
            .add_island(Island {
                id: island,
                name: String::from("Haven"),
                coordinates: Coordinates::new(0, 0),
                base_resource: Resource::Iron,
                advanced_resource: Resource::Glass,
                cities: Vec::new(),
            })
            .unwrap();
        let alice = make_player("alice", 3);
        let bob = make_player("bob", 1);
        let (alice_id, bob_id) = (alice.id, bob.id);
        world.add_player(alice).unwrap();
        world.add_player(bob).unwrap();

        let [home, colony, foreign] =
            [("Home", alice_id), ("Colony", alice_id), ("Market", bob_id)].map(|(name, owner)| {
                let mut city = fresh_city(&rules, name, island, Coordinates::new(0, 0));
                city.owner = Some(owner);
                city.stock.insert(Resource::Wood, dec!(1000));
                city.stock.insert(Resource::Stone, dec!(500));
                let id = city.id;
                world.add_city(city).unwrap();
                id
            });
        Fixture {
            rules,
            world,
            alice: alice_id,
            bob: bob_id,
            home,
            colony,
            foreign,
        }
    }

    fn request(source: CityId, destination: CityId, wood: u32, ships: u32) -> TransportRequest {
        TransportRequest {
            source,
            destination,
            cargo: BTreeMap::from([(Resource::Wood, wood)]),
            ships,
            loading_secs: 5,
            travel_secs: 3,
        }
    }

    fn run(f: &mut Fixture, seconds: u64) {
        for _ in 0..seconds {
            update_all(&f.rules, &mut f.world, 1, Utc::now());
        }
    }

    fn wood(f: &Fixture, city: CityId) -> Decimal {
        f.world.city(city).unwrap().stock_of(Resource::Wood)
    }

    fn ships_available(f: &Fixture, player: PlayerId) -> u32 {
        f.world.player(player).unwrap().ships_available
    }

    #[test]
    fn free_port_loads_and_deducts_at_once() {
        let mut f = make_fixture();
        let t = create(&mut f.world, f.alice, request(f.home, f.colony, 200, 2)).unwrap();
        assert_eq!(t.state, TransportState::Loading);
        assert_eq!(t.remaining_secs, 5);
        assert!(t.resources_deducted);
        assert_eq!(t.id, TransportId(1));
        assert_eq!(wood(&f, f.home), dec!(800));
        assert_eq!(ships_available(&f, f.alice), 1);
    }

    #[test]
    fn busy_port_queues_behind_remaining_time() {
        let mut f = make_fixture();
        create(&mut f.world, f.alice, request(f.home, f.colony, 100, 1)).unwrap();
        run(&mut f, 2);
        let queued = create(&mut f.world, f.alice, request(f.home, f.colony, 100, 2)).unwrap();
        assert_eq!(queued.state, TransportState::Waiting);
        assert_eq!(queued.remaining_secs, 3);
        assert!(!queued.resources_deducted);
        assert_eq!(wood(&f, f.home), dec!(900));

        run(&mut f, 3);
        let loading = f.world.transport(queued.id).unwrap();
        assert_eq!(loading.state, TransportState::Loading);
        assert_eq!(loading.remaining_secs, 5);
        assert!(loading.resources_deducted);
        assert_eq!(wood(&f, f.home), dec!(800));
        assert_eq!(ships_available(&f, f.alice), 0);
    }

    #[test]
    fn queued_cargo_is_cut_to_remaining_stock() {
        let mut f = make_fixture();
        create(&mut f.world, f.alice, request(f.home, f.colony, 10, 1)).unwrap();
        let second = create(&mut f.world, f.alice, request(f.home, f.colony, 900, 1)).unwrap();
        let third = create(&mut f.world, f.alice, request(f.home, f.colony, 900, 1)).unwrap();
        assert_eq!(wood(&f, f.home), dec!(990));

        // The stock is spent elsewhere while both wait.
        f.world
            .city_mut(f.home)
            .unwrap()
            .stock
            .insert(Resource::Wood, Decimal::ZERO);
        run(&mut f, 5);
        let loading = f.world.transport(second.id).unwrap();
        assert_eq!(loading.state, TransportState::Loading);
        assert!(loading.cargo.is_empty());

        run(&mut f, 20);
        assert!(f.world.transport(third.id).is_none());
        assert_eq!(wood(&f, f.home), Decimal::ZERO);
        assert_eq!(wood(&f, f.colony), dec!(1010));
        assert_eq!(ships_available(&f, f.alice), 3);
    }

    #[test]
    fn queued_cargo_keeps_what_is_left() {
        let mut f = make_fixture();
        create(&mut f.world, f.alice, request(f.home, f.colony, 100, 1)).unwrap();
        let queued = create(&mut f.world, f.alice, request(f.home, f.colony, 500, 1)).unwrap();
        f.world
            .city_mut(f.home)
            .unwrap()
            .stock
            .insert(Resource::Wood, dec!(300.5));
        run(&mut f, 5);
        let loading = f.world.transport(queued.id).unwrap();
        assert_eq!(loading.cargo.get(&Resource::Wood), Some(&300));
        assert_eq!(wood(&f, f.home), dec!(0.5));
    }

    #[test]
    fn queued_transport_without_ships_is_dropped() {
        let mut f = make_fixture();
        create(&mut f.world, f.alice, request(f.home, f.colony, 10, 1)).unwrap();
        let queued = create(&mut f.world, f.alice, request(f.home, f.colony, 10, 2)).unwrap();
        // The colony's free port takes the last two ships first.
        create(&mut f.world, f.alice, request(f.colony, f.home, 10, 2)).unwrap();
        assert_eq!(ships_available(&f, f.alice), 0);

        let report = update_all(&f.rules, &mut f.world, 5, Utc::now());
        assert_eq!(report.cancelled, 1);
        assert!(f.world.transport(queued.id).is_none());
        assert_eq!(wood(&f, f.home), dec!(990));
        assert_eq!(
            notifications::unread_count(&f.world, f.alice, Some(NotificationKind::Transport)),
            1
        );
    }

    #[test]
    fn queue_sums_every_waiting_transport() {
        let mut f = make_fixture();
        f.world.player_mut(f.alice).unwrap().ships_available = 3;
        create(&mut f.world, f.alice, request(f.home, f.colony, 10, 1)).unwrap();
        let second = create(&mut f.world, f.alice, request(f.home, f.colony, 10, 1)).unwrap();
        let third = create(&mut f.world, f.alice, request(f.home, f.colony, 10, 1)).unwrap();
        assert_eq!(second.remaining_secs, 5);
        assert_eq!(third.remaining_secs, 10);
    }

    #[test]
    fn own_destination_never_returns() {
        let mut f = make_fixture();
        let t = create(&mut f.world, f.alice, request(f.home, f.colony, 200, 1)).unwrap();
        let mut states = Vec::new();
        for _ in 0..10 {
            update_all(&f.rules, &mut f.world, 1, Utc::now());
            if let Some(current) = f.world.transport(t.id) {
                states.push(current.state);
            }
        }
        assert!(!states.contains(&TransportState::Returning));
        assert!(f.world.transport(t.id).is_none());
        assert_eq!(wood(&f, f.colony), dec!(1200));
        assert_eq!(ships_available(&f, f.alice), 3);
    }

    #[test]
    fn foreign_destination_always_returns() {
        let mut f = make_fixture();
        let t = create(&mut f.world, f.alice, request(f.home, f.foreign, 200, 1)).unwrap();
        assert_eq!(t.destination_player, Some(f.bob));
        run(&mut f, 8);
        let returning = f.world.transport(t.id).unwrap();
        assert_eq!(returning.state, TransportState::Returning);
        assert_eq!(returning.remaining_secs, 3);
        assert_eq!(wood(&f, f.foreign), dec!(1200));
        assert_eq!(ships_available(&f, f.alice), 2);
        assert_eq!(
            notifications::unread_count(&f.world, f.bob, Some(NotificationKind::Transport)),
            1
        );

        run(&mut f, 3);
        assert!(f.world.transport(t.id).is_none());
        assert_eq!(ships_available(&f, f.alice), 3);
    }

    #[test]
    fn plague_travels_both_ways() {
        let mut f = make_fixture();
        f.world.city_mut(f.home).unwrap().has_plague = true;
        create(&mut f.world, f.alice, request(f.home, f.foreign, 10, 1)).unwrap();
        run(&mut f, 8);
        assert!(f.world.city(f.foreign).unwrap().has_plague);

        let mut f = make_fixture();
        f.world.city_mut(f.foreign).unwrap().has_plague = true;
        create(&mut f.world, f.alice, request(f.home, f.foreign, 10, 1)).unwrap();
        run(&mut f, 8);
        assert!(!f.world.city(f.home).unwrap().has_plague);
        run(&mut f, 3);
        assert!(f.world.city(f.home).unwrap().has_plague);
    }

    #[test]
    fn delivery_respects_storage() {
        let mut f = make_fixture();
        f.world.city_mut(f.colony).unwrap().stock.insert(Resource::Wood, dec!(1700));
        create(&mut f.world, f.alice, request(f.home, f.colony, 500, 1)).unwrap();
        run(&mut f, 8);
        assert_eq!(wood(&f, f.colony), dec!(1800));
    }

    #[test]
    fn cancel_in_port_refunds() {
        let mut f = make_fixture();
        let t = create(&mut f.world, f.alice, request(f.home, f.colony, 300, 2)).unwrap();
        let state = cancel(&f.rules, &mut f.world, f.alice, t.id, Utc::now()).unwrap();
        assert_eq!(state, TransportState::Cancelled);
        assert!(f.world.transport(t.id).is_none());
        assert_eq!(wood(&f, f.home), dec!(1000));
        assert_eq!(ships_available(&f, f.alice), 3);
    }

    #[test]
    fn cancel_while_waiting_refunds_nothing() {
        let mut f = make_fixture();
        create(&mut f.world, f.alice, request(f.home, f.colony, 100, 1)).unwrap();
        let queued = create(&mut f.world, f.alice, request(f.home, f.colony, 100, 1)).unwrap();
        cancel(&f.rules, &mut f.world, f.alice, queued.id, Utc::now()).unwrap();
        assert_eq!(wood(&f, f.home), dec!(900));
        assert_eq!(ships_available(&f, f.alice), 2);
    }

    #[test]
    fn cancel_at_sea_turns_back() {
        let mut f = make_fixture();
        let t = create(&mut f.world, f.alice, request(f.home, f.foreign, 100, 1)).unwrap();
        run(&mut f, 7);
        assert_eq!(f.world.transport(t.id).unwrap().state, TransportState::InTransit);
        let state = cancel(&f.rules, &mut f.world, f.alice, t.id, Utc::now()).unwrap();
        assert_eq!(state, TransportState::Returning);
        let back = f.world.transport(t.id).unwrap();
        assert_eq!(back.remaining_secs, 2);
        assert!(back.cancelled_at.is_some());
        assert_eq!(wood(&f, f.foreign), dec!(1000));

        let again = cancel(&f.rules, &mut f.world, f.alice, t.id, Utc::now());
        assert!(matches!(again, Err(CommandError::CannotCancel { .. })));
    }

    #[test]
    fn cancel_just_after_departure_waits_one_second() {
        let mut f = make_fixture();
        let t = create(&mut f.world, f.alice, request(f.home, f.foreign, 100, 1)).unwrap();
        run(&mut f, 5);
        cancel(&f.rules, &mut f.world, f.alice, t.id, Utc::now()).unwrap();
        assert_eq!(f.world.transport(t.id).unwrap().remaining_secs, 1);
    }

    #[test]
    fn unknown_or_foreign_transport_cannot_be_cancelled() {
        let mut f = make_fixture();
        let missing = cancel(&f.rules, &mut f.world, f.alice, TransportId(9), Utc::now());
        assert!(matches!(missing, Err(CommandError::TransportNotFound(_))));
        let t = create(&mut f.world, f.alice, request(f.home, f.foreign, 100, 1)).unwrap();
        let foreign = cancel(&f.rules, &mut f.world, f.bob, t.id, Utc::now());
        assert!(matches!(foreign, Err(CommandError::NotOwner(_))));
    }

    #[test]
    fn refused_without_ships_or_goods() {
        let mut f = make_fixture();
        let too_many = create(&mut f.world, f.alice, request(f.home, f.colony, 10, 4));
        assert!(matches!(too_many, Err(CommandError::NotEnoughShips { .. })));
        let none = create(&mut f.world, f.alice, request(f.home, f.colony, 10, 0));
        assert!(matches!(none, Err(CommandError::NotEnoughShips { .. })));
        let greedy = create(&mut f.world, f.alice, request(f.home, f.colony, 5000, 1));
        assert!(matches!(greedy, Err(CommandError::InsufficientResources { .. })));
        let stolen = create(&mut f.world, f.bob, request(f.home, f.colony, 10, 1));
        assert!(matches!(stolen, Err(CommandError::NotOwner(_))));
        assert_eq!(f.world.transports().count(), 0);
    }

    #[test]
    fn ids_are_reused_after_delivery() {
        let mut f = make_fixture();
        let first = create(&mut f.world, f.alice, request(f.home, f.colony, 10, 1)).unwrap();
        run(&mut f, 8);
        assert!(f.world.transport(first.id).is_none());
        let next = create(&mut f.world, f.alice, request(f.home, f.colony, 10, 1)).unwrap();
        assert_eq!(next.id, TransportId(1));
    }

    #[test]
    fn players_see_sent_and_received() {
        let mut f = make_fixture();
        create(&mut f.world, f.alice, request(f.home, f.foreign, 10, 1)).unwrap();
        assert_eq!(for_player(&f.world, f.alice).len(), 1);
        assert_eq!(for_player(&f.world, f.bob).len(), 1);
        assert!(for_player(&f.world, PlayerId::new()).is_empty());
    }
}
