//! Research definitions.
//!
//! Each [`Research`] costs research points plus resources taken from the
//! player's first city, and applies one [`ResearchEffect`] once unlocked.

use std::collections::BTreeMap;

use archipel_types::{Research, Resource};
use rust_decimal::Decimal;

/// What unlocking a research does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchEffect {
    /// Lifts the research gate of building definitions naming it.
    UnlockBuildings,
    /// Raises a production bonus in every city the player owns.
    ProductionBonus {
        /// Resource boosted.
        resource: Resource,
        /// Percentage points added to the city research bonus.
        percent: u32,
    },
    /// Allows finishing nearly-complete constructions instantly.
    InstantCompletion,
}

/// Static description of one research.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchDefinition {
    /// The research described.
    pub research: Research,
    /// Research points spent.
    pub points_cost: Decimal,
    /// Resources taken from the player's first city.
    pub resource_cost: BTreeMap<Resource, u32>,
    /// Effect applied on unlock.
    pub effect: ResearchEffect,
}

/// Return the canonical definition of a research.
pub fn definition(research: Research) -> ResearchDefinition {
    let (points, cost, effect): (i64, &[(Resource, u32)], ResearchEffect) = match research {
        Research::Agriculture => (10, &[(Resource::Wood, 100)], ResearchEffect::UnlockBuildings),
        Research::Mining => (
            20,
            &[(Resource::Wood, 150), (Resource::Stone, 100)],
            ResearchEffect::UnlockBuildings,
        ),
        Research::Architecture => (
            30,
            &[(Resource::Wood, 200), (Resource::Stone, 200)],
            ResearchEffect::UnlockBuildings,
        ),
        Research::ConstructionPlans => (
            40,
            &[(Resource::Papyrus, 150)],
            ResearchEffect::InstantCompletion,
        ),
        Research::Forestry => (25, &[(Resource::Wood, 250)], ResearchEffect::ProductionBonus {
            resource: Resource::Wood,
            percent: 5,
        }),
        Research::Masonry => (25, &[(Resource::Stone, 250)], ResearchEffect::ProductionBonus {
            resource: Resource::Stone,
            percent: 5,
        }),
    };
    ResearchDefinition {
        research,
        points_cost: Decimal::from(points),
        resource_cost: cost.iter().copied().collect(),
        effect,
    }
}

/// Lookup table of every research definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchTable {
    definitions: BTreeMap<Research, ResearchDefinition>,
}

impl ResearchTable {
    /// The table of the live game.
    pub fn standard() -> Self {
        Self::from_definitions(Research::ALL.into_iter().map(definition))
    }

    /// Build a table from explicit definitions.
    pub fn from_definitions(definitions: impl IntoIterator<Item = ResearchDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().map(|d| (d.research, d)).collect(),
        }
    }

    /// Definition of a research, if present.
    pub fn get(&self, research: Research) -> Option<&ResearchDefinition> {
        self.definitions.get(&research)
    }

    /// Iterate over every definition.
    pub fn iter(&self) -> impl Iterator<Item = &ResearchDefinition> {
        self.definitions.values()
    }
}

impl Default for ResearchTable {
    fn default() -> Self {
        Self::standard()
    }
}
