//! Research unlocking.

use archipel_types::{NotificationKind, PlayerId, Research};
use archipel_world::{ResearchEffect, Rules, World};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::construction::ensure_affordable;
use crate::error::CommandError;
use crate::notifications;

/// Unlock a research for a player.
///
/// Research points come from the player's balance and the resource cost
/// from the player's first city. A production bonus applies to every city
/// the player owns at the time of the unlock.
///
/// # Errors
///
/// Fails when the player is unknown or owns no city, the research is
/// already unlocked or unknown, or either balance is too low.
pub fn unlock(
    rules: &Rules,
    world: &mut World,
    player: PlayerId,
    research: Research,
    now: DateTime<Utc>,
) -> Result<(), CommandError> {
    let account = world
        .player(player)
        .ok_or(CommandError::PlayerNotFound(player))?;
    let cities = world.cities_of(player);
    let first = *cities.first().ok_or(CommandError::NoCity)?;
    if account.unlocked_research.contains(&research) {
        return Err(CommandError::AlreadyUnlocked(research));
    }
    let definition = rules
        .research
        .get(research)
        .ok_or(CommandError::UnknownResearch(research))?;
    if account.research_points < definition.points_cost {
        return Err(CommandError::NotEnoughResearchPoints {
            required: definition.points_cost,
            available: account.research_points,
        });
    }
    let city = world.city(first).ok_or(CommandError::CityNotFound(first))?;
    ensure_affordable(city, &definition.resource_cost)?;

    if let Some(account) = world.player_mut(player) {
        account.research_points = account.research_points.saturating_sub(definition.points_cost);
        account.unlocked_research.insert(research);
    }
    if let Some(city) = world.city_mut(first) {
        for (resource, amount) in &definition.resource_cost {
            let stock = city.stock.entry(*resource).or_insert(Decimal::ZERO);
            *stock = stock.saturating_sub(Decimal::from(*amount));
        }
    }
    if let ResearchEffect::ProductionBonus { resource, percent } = definition.effect {
        for id in &cities {
            if let Some(city) = world.city_mut(*id) {
                let bonus = city.research_bonus.entry(resource).or_insert(0);
                *bonus = bonus.saturating_add(percent);
            }
        }
    }

    info!(%player, ?research, "Research unlocked");
    notifications::notify(
        world,
        player,
        NotificationKind::Research,
        format!("Research {research:?} unlocked."),
        now,
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use archipel_types::{CityId, Coordinates, Island, IslandId, Player, Resource};
    use archipel_world::fresh_city;
    use rust_decimal_macros::dec;

    use super::*;

    fn make_world(rules: &Rules, points: Decimal, cities: usize) -> (World, PlayerId, Vec<CityId>) {
        let mut world = World::new();
        let player = PlayerId::new();
        world
            .add_player(Player {
                id: player,
                username: String::from("scholar"),
                credential: String::from("pw"),
                diamonds: 0,
                ships: 1,
                ships_available: 1,
                research_points: points,
                unlocked_research: BTreeSet::new(),
                created_at: Utc::now(),
            })
            .unwrap();
        let island = IslandId::new();
        world
            .add_island(Island {
                id: island,
                name: String::from("Lyceum"),
                coordinates: Coordinates::new(0, 0),
                base_resource: Resource::Papyrus,
                advanced_resource: Resource::Coal,
                cities: Vec::new(),
            })
            .unwrap();
        let ids = (0..cities)
            .map(|n| {
                let name = format!("City {n}");
                let mut city = fresh_city(rules, &name, island, Coordinates::new(0, 0));
                city.owner = Some(player);
                let id = city.id;
                world.add_city(city).unwrap();
                id
            })
            .collect();
        (world, player, ids)
    }

    #[test]
    fn unlock_spends_points_and_resources() {
        let rules = Rules::standard();
        let (mut world, player, cities) = make_world(&rules, dec!(50), 1);
        let city = *cities.first().unwrap();
        let wood_before = world.city(city).unwrap().stock_of(Resource::Wood);

        unlock(&rules, &mut world, player, Research::Agriculture, Utc::now()).unwrap();

        let account = world.player(player).unwrap();
        assert_eq!(account.research_points, dec!(40));
        assert!(account.unlocked_research.contains(&Research::Agriculture));
        assert_eq!(
            world.city(city).unwrap().stock_of(Resource::Wood),
            wood_before - dec!(100)
        );
        assert_eq!(
            notifications::unread_count(&world, player, Some(NotificationKind::Research)),
            1
        );
    }

    #[test]
    fn bonus_applies_to_every_city() {
        let rules = Rules::standard();
        let (mut world, player, cities) = make_world(&rules, dec!(50), 2);
        unlock(&rules, &mut world, player, Research::Forestry, Utc::now()).unwrap();
        for id in cities {
            // Fresh cities start with a 4 percent wood bonus.
            assert_eq!(world.city(id).unwrap().research_bonus.get(&Resource::Wood), Some(&9));
        }
    }

    #[test]
    fn checks_run_in_order() {
        let rules = Rules::standard();
        let (mut world, player, _) = make_world(&rules, dec!(50), 0);
        let result = unlock(&rules, &mut world, player, Research::Mining, Utc::now());
        assert!(matches!(result, Err(CommandError::NoCity)));

        let (mut world, player, _) = make_world(&rules, dec!(5), 1);
        let result = unlock(&rules, &mut world, player, Research::Agriculture, Utc::now());
        assert!(matches!(result, Err(CommandError::NotEnoughResearchPoints { .. })));

        let (mut world, player, _) = make_world(&rules, dec!(100), 1);
        unlock(&rules, &mut world, player, Research::Agriculture, Utc::now()).unwrap();
        let result = unlock(&rules, &mut world, player, Research::Agriculture, Utc::now());
        assert!(matches!(result, Err(CommandError::AlreadyUnlocked(_))));
    }

    #[test]
    fn missing_resources_change_nothing() {
        let rules = Rules::standard();
        let (mut world, player, cities) = make_world(&rules, dec!(100), 1);
        let city = *cities.first().unwrap();
        world.city_mut(city).unwrap().stock.insert(Resource::Papyrus, dec!(10));
        let before = world.clone();
        let result = unlock(&rules, &mut world, player, Research::ConstructionPlans, Utc::now());
        assert!(matches!(result, Err(CommandError::InsufficientResources { .. })));
        assert_eq!(world, before);
    }

    #[test]
    fn unknown_player_is_refused() {
        let rules = Rules::standard();
        let mut world = World::new();
        let result = unlock(&rules, &mut world, PlayerId::new(), Research::Mining, Utc::now());
        assert!(matches!(result, Err(CommandError::PlayerNotFound(_))));
    }
}
