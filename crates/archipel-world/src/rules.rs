//! The immutable rule bundle injected into every engine.
//!
//! [`Rules`] gathers the static tables and the balance constants. It is
//! built once at startup and passed by reference; tests build fixture
//! rules by replacing individual tables or constants.

use rust_decimal::Decimal;

use crate::building::BuildingTable;
use crate::research::ResearchTable;
use crate::resource::ResourceTable;
use crate::site::SiteTable;

/// Balance constants not tied to a single table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// Cereal eaten per unfed citizen per second at multiplier 1.
    pub cereal_per_citizen: Decimal,
    /// Citizens fed by the town hall without cereal.
    pub food_limit: Decimal,
    /// Satisfaction score before any factor applies.
    pub base_satisfaction: u32,
    /// Malus while cereal runs short.
    pub famine_malus: u32,
    /// Malus while the city has plague.
    pub plague_malus: u32,
    /// Bonus when cleanliness exceeds the population.
    pub hygiene_bonus: u32,
    /// Hygiene percentage under which plague breaks out.
    pub plague_threshold_percent: u32,
    /// Largest windmill satisfaction bonus, reached at the maximum multiplier.
    pub windmill_bonus_max: u32,
    /// Remaining seconds under which a construction may be finished instantly.
    pub instant_completion_secs: u64,
    /// Gold per citizen charged by a plague cure.
    pub cure_gold_per_citizen: u32,
    /// Percent chance a cure succeeds.
    pub cure_success_percent: u32,
    /// Gold price of a player's second ship.
    pub ship_base_price: u32,
    /// Diamonds granted to a new player.
    pub starting_diamonds: u64,
    /// Ships granted to a new player.
    pub starting_ships: u32,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            cereal_per_citizen: Decimal::new(1, 1), // 0.1
            food_limit: Decimal::ZERO,
            base_satisfaction: 50,
            famine_malus: 40,
            plague_malus: 40,
            hygiene_bonus: 5,
            plague_threshold_percent: 50,
            windmill_bonus_max: 10,
            instant_completion_secs: 8,
            cure_gold_per_citizen: 2,
            cure_success_percent: 95,
            ship_base_price: 100,
            starting_diamonds: 100,
            starting_ships: 1,
        }
    }
}

/// Every static table plus the balance constants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules {
    /// Resource definitions.
    pub resources: ResourceTable,
    /// Building definitions.
    pub buildings: BuildingTable,
    /// Resource site levels.
    pub sites: SiteTable,
    /// Research definitions.
    pub research: ResearchTable,
    /// Balance constants.
    pub balance: Balance,
}

impl Rules {
    /// The rules of the live game.
    pub fn standard() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use archipel_types::{BuildingKind, Resource};

    use super::*;

    #[test]
    fn standard_rules_are_populated() {
        let rules = Rules::standard();
        assert!(rules.buildings.get(BuildingKind::Academy).is_some());
        assert!(rules.sites.level(Resource::Cotton, 1).is_some());
        assert_eq!(rules.balance.food_limit, Decimal::ZERO);
    }
}
