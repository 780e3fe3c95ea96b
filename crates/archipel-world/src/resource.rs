//! Resource definitions and capped stock arithmetic.
//!
//! Every [`Resource`] has a [`ResourceDefinition`] giving its tier, the
//! production rate of one worker, the default city storage capacity and the
//! stock a fresh city starts with. [`ResourceTable`] bundles the
//! definitions so engines consult one injected value instead of a global.
//!
//! [`add_capped`] and [`clamp_stock`] implement the storage rule shared by
//! every producer: a stock never exceeds its capacity and never goes below
//! zero.

use std::collections::BTreeMap;

use archipel_types::{Resource, ResourceTier};
use rust_decimal::Decimal;

/// Population of a freshly created city.
pub const STARTING_POPULATION: u32 = 40;

/// Static description of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefinition {
    /// The resource described.
    pub resource: Resource,
    /// Progression tier, `None` for gold.
    pub tier: Option<ResourceTier>,
    /// Units produced per assigned worker per second.
    pub base_rate: Decimal,
    /// Storage capacity of a city without warehouses.
    pub default_capacity: Decimal,
    /// Stock of a freshly created city.
    pub starting_stock: Decimal,
    /// Research production bonus percentage of a fresh city.
    pub starting_research_bonus: u32,
}

/// Return the canonical definition of a resource.
pub fn definition(resource: Resource) -> ResourceDefinition {
    let (capacity, start, bonus): (i64, i64, u32) = match resource {
        Resource::Wood => (1800, 1500, 4),
        Resource::Stone => (2000, 3000, 8),
        Resource::Iron | Resource::Papyrus => (2000, 1000, 0),
        Resource::Cereal => (2000, 2000, 0),
        Resource::Horse => (1600, 10, 0),
        Resource::Marble => (1600, 20, 0),
        Resource::Glass => (1600, 30, 0),
        Resource::Meat => (1600, 40, 0),
        Resource::Coal => (1600, 50, 0),
        Resource::Gunpowder => (1600, 60, 0),
        Resource::Spices => (1600, 70, 0),
        Resource::Cotton => (1600, 80, 0),
        Resource::Gold => (1_000_000, 80, 0),
    };
    ResourceDefinition {
        resource,
        tier: resource.tier(),
        base_rate: if resource.is_harvestable() {
            Decimal::ONE
        } else {
            Decimal::ZERO
        },
        default_capacity: Decimal::from(capacity),
        starting_stock: Decimal::from(start),
        starting_research_bonus: bonus,
    }
}

/// Lookup table of every resource definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTable {
    definitions: BTreeMap<Resource, ResourceDefinition>,
}

impl ResourceTable {
    /// The table of the live game.
    pub fn standard() -> Self {
        Self::from_definitions(Resource::ALL.into_iter().map(definition))
    }

    /// Build a table from explicit definitions (fixtures use this).
    pub fn from_definitions(definitions: impl IntoIterator<Item = ResourceDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().map(|d| (d.resource, d)).collect(),
        }
    }

    /// Definition of a resource, if present.
    pub fn get(&self, resource: Resource) -> Option<&ResourceDefinition> {
        self.definitions.get(&resource)
    }

    /// Units one worker produces per second; zero when undefined.
    pub fn base_rate(&self, resource: Resource) -> Decimal {
        self.get(resource).map_or(Decimal::ZERO, |d| d.base_rate)
    }

    /// Default storage capacity; zero when undefined.
    pub fn default_capacity(&self, resource: Resource) -> Decimal {
        self.get(resource).map_or(Decimal::ZERO, |d| d.default_capacity)
    }

    /// Starting stocks of a fresh city.
    pub fn starting_stock(&self) -> BTreeMap<Resource, Decimal> {
        self.definitions
            .values()
            .map(|d| (d.resource, d.starting_stock))
            .collect()
    }

    /// Starting research bonuses of a fresh city, zero entries omitted.
    pub fn starting_research_bonus(&self) -> BTreeMap<Resource, u32> {
        self.definitions
            .values()
            .filter(|d| d.starting_research_bonus > 0)
            .map(|d| (d.resource, d.starting_research_bonus))
            .collect()
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Capped stock arithmetic
// ---------------------------------------------------------------------------

/// Add up to `amount` to `stock` without exceeding `capacity`.
///
/// Returns the quantity actually added, which is zero when the stock is
/// already at or above capacity or when `amount` is not positive.
pub fn add_capped(stock: &mut Decimal, amount: Decimal, capacity: Decimal) -> Decimal {
    let headroom = capacity.saturating_sub(*stock).max(Decimal::ZERO);
    let added = amount.min(headroom).max(Decimal::ZERO);
    *stock = stock.saturating_add(added);
    added
}

/// Force a stock back into `[0, capacity]`.
///
/// Returns `true` if the value had to be changed.
pub fn clamp_stock(stock: &mut Decimal, capacity: Decimal) -> bool {
    let clamped = (*stock).max(Decimal::ZERO).min(capacity.max(Decimal::ZERO));
    let changed = clamped != *stock;
    *stock = clamped;
    changed
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn wood_definition() {
        let def = definition(Resource::Wood);
        assert_eq!(def.tier, Some(ResourceTier::Base));
        assert_eq!(def.default_capacity, dec!(1800));
        assert_eq!(def.starting_stock, dec!(1500));
        assert_eq!(def.starting_research_bonus, 4);
    }

    #[test]
    fn gold_is_not_worker_produced() {
        let def = definition(Resource::Gold);
        assert_eq!(def.base_rate, Decimal::ZERO);
        assert_eq!(def.default_capacity, dec!(1000000));
    }

    #[test]
    fn standard_table_covers_every_resource() {
        let table = ResourceTable::standard();
        for r in Resource::ALL {
            assert!(table.get(r).is_some(), "{r:?} missing");
        }
        let bonus = table.starting_research_bonus();
        assert_eq!(bonus.len(), 2);
        assert_eq!(bonus.get(&Resource::Stone), Some(&8));
    }

    #[test]
    fn add_capped_respects_capacity() {
        let mut stock = dec!(95);
        let added = add_capped(&mut stock, dec!(10), dec!(100));
        assert_eq!(added, dec!(5));
        assert_eq!(stock, dec!(100));
    }

    #[test]
    fn add_capped_over_capacity_adds_nothing() {
        let mut stock = dec!(3000);
        let added = add_capped(&mut stock, dec!(10), dec!(2000));
        assert_eq!(added, Decimal::ZERO);
        assert_eq!(stock, dec!(3000));
    }

    #[test]
    fn clamp_stock_both_ends() {
        let mut high = dec!(3000);
        assert!(clamp_stock(&mut high, dec!(2000)));
        assert_eq!(high, dec!(2000));

        let mut low = dec!(-4.5);
        assert!(clamp_stock(&mut low, dec!(2000)));
        assert_eq!(low, Decimal::ZERO);

        let mut fine = dec!(12.5);
        assert!(!clamp_stock(&mut fine, dec!(2000)));
    }
}
