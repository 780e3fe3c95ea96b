//! The world arena: every mutable entity in flat id-keyed maps.
//!
//! [`World`] owns players, islands, cities, resource sites, active
//! transports and notifications. Entities never hold references to each
//! other; a city names its island by [`IslandId`], a transport names its
//! endpoints by [`CityId`] and [`PlayerId`]. Lookups return `Option`, so a
//! dangling id reads as "not found" instead of a panic.
//!
//! The arena converts to and from [`WorldSnapshot`], the plain-data tree
//! used for persistence and polling.

use std::collections::BTreeMap;

use archipel_types::{
    City, CityId, Island, IslandId, Notification, Player, PlayerId, Resource, ResourceSite,
    Transport, TransportId, WorldSnapshot,
};
use chrono::{DateTime, Utc};

use crate::error::WorldError;

/// All mutable state of one game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct World {
    /// Simulated seconds elapsed since the world was created.
    tick: u64,
    players: BTreeMap<PlayerId, Player>,
    islands: BTreeMap<IslandId, Island>,
    cities: BTreeMap<CityId, City>,
    sites: BTreeMap<(IslandId, Resource), ResourceSite>,
    transports: BTreeMap<TransportId, Transport>,
    notifications: BTreeMap<PlayerId, Vec<Notification>>,
}

impl World {
    /// Create an empty world.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            players: BTreeMap::new(),
            islands: BTreeMap::new(),
            cities: BTreeMap::new(),
            sites: BTreeMap::new(),
            transports: BTreeMap::new(),
            notifications: BTreeMap::new(),
        }
    }

    /// Simulated seconds elapsed.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Count one more simulated second.
    pub const fn advance_tick(&mut self) -> u64 {
        self.tick = self.tick.saturating_add(1);
        self.tick
    }

    // -------------------------------------------------------------------
    // Players
    // -------------------------------------------------------------------

    /// Add a player.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicatePlayer`] if the id is taken.
    pub fn add_player(&mut self, player: Player) -> Result<(), WorldError> {
        if self.players.contains_key(&player.id) {
            return Err(WorldError::DuplicatePlayer(player.id));
        }
        self.players.insert(player.id, player);
        Ok(())
    }

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Look up a player mutably.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Find a player by login name.
    pub fn player_by_username(&self, username: &str) -> Option<&Player> {
        self.players.values().find(|p| p.username == username)
    }

    /// Iterate over all players.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// All player ids.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    // -------------------------------------------------------------------
    // Islands and cities
    // -------------------------------------------------------------------

    /// Add an island.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateIsland`] if the id is taken.
    pub fn add_island(&mut self, island: Island) -> Result<(), WorldError> {
        if self.islands.contains_key(&island.id) {
            return Err(WorldError::DuplicateIsland(island.id));
        }
        self.islands.insert(island.id, island);
        Ok(())
    }

    /// Look up an island.
    pub fn island(&self, id: IslandId) -> Option<&Island> {
        self.islands.get(&id)
    }

    /// Iterate over all islands.
    pub fn islands(&self) -> impl Iterator<Item = &Island> {
        self.islands.values()
    }

    /// Add a city and register it on its island.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateCity`] if the id is taken, or
    /// [`WorldError::IslandNotFound`] if the island does not exist.
    pub fn add_city(&mut self, city: City) -> Result<(), WorldError> {
        if self.cities.contains_key(&city.id) {
            return Err(WorldError::DuplicateCity(city.id));
        }
        let island = self
            .islands
            .get_mut(&city.island)
            .ok_or(WorldError::IslandNotFound(city.island))?;
        if !island.cities.contains(&city.id) {
            island.cities.push(city.id);
        }
        self.cities.insert(city.id, city);
        Ok(())
    }

    /// Look up a city.
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(&id)
    }

    /// Look up a city mutably.
    pub fn city_mut(&mut self, id: CityId) -> Option<&mut City> {
        self.cities.get_mut(&id)
    }

    /// Look up a city, failing when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CityNotFound`].
    pub fn try_city(&self, id: CityId) -> Result<&City, WorldError> {
        self.city(id).ok_or(WorldError::CityNotFound(id))
    }

    /// Iterate over all cities.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// Iterate over all cities mutably.
    pub fn cities_mut(&mut self) -> impl Iterator<Item = &mut City> {
        self.cities.values_mut()
    }

    /// All city ids.
    pub fn city_ids(&self) -> Vec<CityId> {
        self.cities.keys().copied().collect()
    }

    /// Ids of the cities a player owns, oldest first.
    pub fn cities_of(&self, player: PlayerId) -> Vec<CityId> {
        self.cities
            .values()
            .filter(|c| c.owner == Some(player))
            .map(|c| c.id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Resource sites
    // -------------------------------------------------------------------

    /// Add or replace a resource site.
    pub fn insert_site(&mut self, site: ResourceSite) {
        self.sites.insert((site.island, site.resource), site);
    }

    /// Look up the site of a resource on an island.
    pub fn site(&self, island: IslandId, resource: Resource) -> Option<&ResourceSite> {
        self.sites.get(&(island, resource))
    }

    /// Look up a site mutably.
    pub fn site_mut(&mut self, island: IslandId, resource: Resource) -> Option<&mut ResourceSite> {
        self.sites.get_mut(&(island, resource))
    }

    /// Iterate over all sites.
    pub fn sites(&self) -> impl Iterator<Item = &ResourceSite> {
        self.sites.values()
    }

    /// Keys of every site.
    pub fn site_keys(&self) -> Vec<(IslandId, Resource)> {
        self.sites.keys().copied().collect()
    }

    // -------------------------------------------------------------------
    // Transports
    // -------------------------------------------------------------------

    /// The smallest transport id not in the active set, starting at 1.
    pub fn next_transport_id(&self) -> TransportId {
        let mut candidate = 1_u64;
        for id in self.transports.keys() {
            if id.0 == candidate {
                candidate = candidate.saturating_add(1);
            } else if id.0 > candidate {
                break;
            }
        }
        TransportId(candidate)
    }

    /// Add a transport to the active set.
    pub fn insert_transport(&mut self, transport: Transport) {
        self.transports.insert(transport.id, transport);
    }

    /// Remove a transport from the active set.
    pub fn remove_transport(&mut self, id: TransportId) -> Option<Transport> {
        self.transports.remove(&id)
    }

    /// Look up an active transport.
    pub fn transport(&self, id: TransportId) -> Option<&Transport> {
        self.transports.get(&id)
    }

    /// Look up an active transport mutably.
    pub fn transport_mut(&mut self, id: TransportId) -> Option<&mut Transport> {
        self.transports.get_mut(&id)
    }

    /// Iterate over active transports in id order.
    pub fn transports(&self) -> impl Iterator<Item = &Transport> {
        self.transports.values()
    }

    /// Ids of every active transport.
    pub fn transport_ids(&self) -> Vec<TransportId> {
        self.transports.keys().copied().collect()
    }

    // -------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------

    /// A player's notifications in delivery order.
    pub fn notifications(&self, player: PlayerId) -> &[Notification] {
        self.notifications.get(&player).map_or(&[], Vec::as_slice)
    }

    /// A player's notification list, created empty on first use.
    pub fn notifications_mut(&mut self, player: PlayerId) -> &mut Vec<Notification> {
        self.notifications.entry(player).or_default()
    }

    // -------------------------------------------------------------------
    // Snapshot conversion
    // -------------------------------------------------------------------

    /// Copy the world into its plain-data form.
    pub fn to_snapshot(&self, now: DateTime<Utc>) -> WorldSnapshot {
        WorldSnapshot {
            taken_at: Some(now),
            tick: self.tick,
            players: self.players.values().cloned().collect(),
            islands: self.islands.values().cloned().collect(),
            cities: self.cities.values().cloned().collect(),
            sites: self.sites.values().cloned().collect(),
            transports: self.transports.values().cloned().collect(),
            notifications: self.notifications.clone(),
        }
    }

    /// Rebuild a world from its plain-data form.
    ///
    /// Duplicate ids keep the first occurrence. A city whose island is
    /// missing, or a site on a missing island, is dropped with a warning.
    pub fn from_snapshot(snapshot: WorldSnapshot) -> Self {
        let mut world = Self::new();
        world.tick = snapshot.tick;

        for player in snapshot.players {
            if let Err(e) = world.add_player(player) {
                tracing::warn!(error = %e, "Skipping player from snapshot");
            }
        }
        for mut island in snapshot.islands {
            island.cities.clear();
            if let Err(e) = world.add_island(island) {
                tracing::warn!(error = %e, "Skipping island from snapshot");
            }
        }
        for city in snapshot.cities {
            if let Err(e) = world.add_city(city) {
                tracing::warn!(error = %e, "Skipping city from snapshot");
            }
        }
        for site in snapshot.sites {
            if world.islands.contains_key(&site.island) {
                world.insert_site(site);
            } else {
                tracing::warn!(
                    island = %site.island,
                    resource = ?site.resource,
                    "Skipping site on unknown island"
                );
            }
        }
        for transport in snapshot.transports {
            world.insert_transport(transport);
        }
        world.notifications = snapshot.notifications;
        world
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use archipel_types::{Coordinates, TransportState};
    use rust_decimal::Decimal;

    use super::*;
    use crate::rules::Rules;
    use crate::starting_world::fresh_city;

    fn make_island() -> Island {
        Island {
            id: IslandId::new(),
            name: String::from("Tortuga"),
            coordinates: Coordinates::new(0, 0),
            base_resource: Resource::Stone,
            advanced_resource: Resource::Coal,
            cities: Vec::new(),
        }
    }

    fn make_transport(id: u64) -> Transport {
        Transport {
            id: TransportId(id),
            source: CityId::new(),
            destination: CityId::new(),
            cargo: BTreeMap::new(),
            ships: 1,
            source_player: PlayerId::new(),
            destination_player: None,
            loading_secs: 5,
            travel_secs: 10,
            remaining_secs: 5,
            state: TransportState::Loading,
            resources_deducted: true,
            cancelled_at: None,
        }
    }

    #[test]
    fn add_city_registers_on_island() {
        let mut world = World::new();
        let island = make_island();
        let island_id = island.id;
        world.add_island(island).unwrap();
        let city = fresh_city(&Rules::standard(), "Nassau", island_id, Coordinates::new(1, 1));
        let city_id = city.id;
        world.add_city(city).unwrap();
        assert_eq!(world.island(island_id).unwrap().cities, vec![city_id]);
    }

    #[test]
    fn add_city_requires_island() {
        let mut world = World::new();
        let rules = Rules::standard();
        let city = fresh_city(&rules, "Nowhere", IslandId::new(), Coordinates::new(0, 0));
        assert!(matches!(world.add_city(city), Err(WorldError::IslandNotFound(_))));
    }

    #[test]
    fn dangling_ids_read_as_missing() {
        let world = World::new();
        assert!(world.city(CityId::new()).is_none());
        assert!(world.player(PlayerId::new()).is_none());
        assert!(world.site(IslandId::new(), Resource::Wood).is_none());
        assert!(world.notifications(PlayerId::new()).is_empty());
    }

    #[test]
    fn transport_ids_fill_gaps() {
        let mut world = World::new();
        assert_eq!(world.next_transport_id(), TransportId(1));
        world.insert_transport(make_transport(1));
        world.insert_transport(make_transport(2));
        world.insert_transport(make_transport(4));
        assert_eq!(world.next_transport_id(), TransportId(3));
        world.insert_transport(make_transport(3));
        assert_eq!(world.next_transport_id(), TransportId(5));
        world.remove_transport(TransportId(1));
        assert_eq!(world.next_transport_id(), TransportId(1));
    }

    #[test]
    fn snapshot_roundtrip_preserves_entities() {
        let mut world = World::new();
        let island = make_island();
        let island_id = island.id;
        world.add_island(island).unwrap();
        let mut city = fresh_city(&Rules::standard(), "Havana", island_id, Coordinates::new(2, 3));
        city.population = Decimal::from(55);
        world.add_city(city).unwrap();
        world.insert_transport(make_transport(1));
        world.advance_tick();

        let snap = world.to_snapshot(Utc::now());
        let restored = World::from_snapshot(snap);
        assert_eq!(restored, world);
    }

    #[test]
    fn snapshot_drops_orphan_city() {
        let rules = Rules::standard();
        let city = fresh_city(&rules, "Orphan", IslandId::new(), Coordinates::new(0, 0));
        let snap = WorldSnapshot {
            cities: vec![city],
            ..WorldSnapshot::default()
        };
        let world = World::from_snapshot(snap);
        assert_eq!(world.cities().count(), 0);
    }
}
