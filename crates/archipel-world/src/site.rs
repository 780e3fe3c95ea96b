//! Resource site level tables.
//!
//! A site runs from level 1 to [`MAX_SITE_LEVEL`]. The entry for level `n`
//! gives how many workers each city may place on the site at that level,
//! and what it costs (in donations) and how long it takes to leave level
//! `n` for `n + 1`. The top level has an empty cost: it cannot be upgraded.

use std::collections::BTreeMap;

use archipel_types::Resource;

/// Highest level a resource site can reach.
pub const MAX_SITE_LEVEL: u32 = 10;

/// One level of a resource site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLevel {
    /// Workers one city may assign at this level.
    pub max_workers_per_city: u32,
    /// Donations required to reach the next level; empty at the top.
    pub upgrade_cost: BTreeMap<Resource, u32>,
    /// Seconds the upgrade takes once fully funded.
    pub upgrade_secs: u64,
}

/// How one cost line scales with the level.
#[derive(Debug, Clone, Copy)]
enum Growth {
    /// `base * 2^(n-1)`.
    Doubling(u32),
    /// `base * n`.
    Linear(u32),
}

impl Growth {
    fn at(self, level: u32) -> u32 {
        match self {
            Self::Doubling(base) => {
                base.saturating_mul(2_u32.saturating_pow(level.saturating_sub(1)))
            }
            Self::Linear(base) => base.saturating_mul(level),
        }
    }
}

const BASE_WORKERS: [u32; 10] = [8, 12, 16, 20, 25, 30, 36, 42, 49, 57];
const INTERMEDIATE_WORKERS: [u32; 10] = [6, 10, 14, 18, 22, 26, 30, 34, 38, 40];
const ADVANCED_WORKERS: [u32; 10] = [4, 8, 12, 16, 20, 24, 28, 32, 36, 40];

const STEADY_TIMES: [u64; 10] = [10, 15, 20, 25, 30, 35, 40, 45, 50, 60];
const LATE_TIMES: [u64; 10] = [20, 25, 30, 35, 40, 45, 50, 55, 60, 60];

/// Wood costs of the forest, which follow no formula.
const FOREST_WOOD: [u32; 9] = [200, 300, 500, 600, 700, 800, 1200, 1600, 1900];

/// Return the full level table of the site yielding `resource`.
///
/// Gold has no site and yields an empty table.
pub fn site_levels(resource: Resource) -> Vec<SiteLevel> {
    use Growth::{Doubling, Linear};
    use Resource::{
        Cereal, Coal, Cotton, Glass, Gold, Gunpowder, Horse, Iron, Marble, Meat, Papyrus, Spices,
        Stone, Wood,
    };

    let (workers, times, costs): (&[u32; 10], [u64; 10], Vec<(Resource, Growth)>) = match resource
    {
        Wood => (&BASE_WORKERS, [5, 7, 8, 10, 12, 15, 40, 45, 50, 60], Vec::new()),
        Stone => (
            &BASE_WORKERS,
            [4, 5, 6, 7, 8, 35, 40, 45, 50, 60],
            vec![(Wood, Doubling(100)), (Stone, Doubling(200))],
        ),
        Iron => (
            &BASE_WORKERS,
            STEADY_TIMES,
            vec![(Wood, Doubling(120)), (Stone, Doubling(120)), (Iron, Doubling(200))],
        ),
        Papyrus => (
            &BASE_WORKERS,
            STEADY_TIMES,
            vec![(Wood, Doubling(150)), (Stone, Doubling(150)), (Papyrus, Doubling(200))],
        ),
        Cereal => (
            &BASE_WORKERS,
            [6, 8, 10, 12, 14, 16, 18, 20, 22, 24],
            vec![(Wood, Doubling(100)), (Cereal, Doubling(200))],
        ),
        Marble => (
            &BASE_WORKERS,
            STEADY_TIMES,
            vec![(Wood, Doubling(120)), (Stone, Doubling(200)), (Marble, Doubling(200))],
        ),
        Horse => (
            &INTERMEDIATE_WORKERS,
            STEADY_TIMES,
            vec![(Wood, Linear(100)), (Meat, Linear(100)), (Horse, Linear(100))],
        ),
        Glass | Meat => (
            &INTERMEDIATE_WORKERS,
            STEADY_TIMES,
            vec![(Wood, Linear(100)), (resource, Linear(100))],
        ),
        Coal => (
            &ADVANCED_WORKERS,
            [15, 20, 25, 30, 35, 40, 45, 50, 55, 60],
            vec![(Wood, Linear(200)), (Coal, Linear(100))],
        ),
        Gunpowder => (
            &ADVANCED_WORKERS,
            LATE_TIMES,
            vec![(Wood, Linear(200)), (Coal, Linear(100)), (Gunpowder, Linear(100))],
        ),
        Spices | Cotton => (
            &ADVANCED_WORKERS,
            LATE_TIMES,
            vec![(Wood, Linear(200)), (resource, Linear(100))],
        ),
        Gold => return Vec::new(),
    };

    (1..=MAX_SITE_LEVEL)
        .zip(workers.iter().zip(times))
        .map(|(n, (max_workers_per_city, upgrade_secs))| {
            let upgrade_cost = if n >= MAX_SITE_LEVEL {
                BTreeMap::new()
            } else if resource == Wood {
                let index = usize::try_from(n.saturating_sub(1)).unwrap_or(usize::MAX);
                FOREST_WOOD
                    .get(index)
                    .map(|amount| BTreeMap::from([(Wood, *amount)]))
                    .unwrap_or_default()
            } else {
                costs.iter().map(|(r, growth)| (*r, growth.at(n))).collect()
            };
            SiteLevel {
                max_workers_per_city: *max_workers_per_city,
                upgrade_cost,
                upgrade_secs,
            }
        })
        .collect()
}

/// Lookup table of every site's levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTable {
    levels: BTreeMap<Resource, Vec<SiteLevel>>,
}

impl SiteTable {
    /// The table of the live game.
    pub fn standard() -> Self {
        Self {
            levels: Resource::HARVESTABLE
                .into_iter()
                .map(|r| (r, site_levels(r)))
                .collect(),
        }
    }

    /// Build a table from explicit per-resource level lists.
    pub const fn from_levels(levels: BTreeMap<Resource, Vec<SiteLevel>>) -> Self {
        Self { levels }
    }

    /// Details of one level of a site.
    pub fn level(&self, resource: Resource, level: u32) -> Option<&SiteLevel> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.levels.get(&resource)?.get(index)
    }

    /// Workers one city may assign at a level, zero when unknown.
    pub fn max_workers_per_city(&self, resource: Resource, level: u32) -> u32 {
        self.level(resource, level)
            .map_or(0, |l| l.max_workers_per_city)
    }
}

impl Default for SiteTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_harvestable_site_has_ten_levels() {
        for r in Resource::HARVESTABLE {
            assert_eq!(site_levels(r).len(), 10, "{r:?}");
        }
        assert!(site_levels(Resource::Gold).is_empty());
    }

    #[test]
    fn top_level_cannot_be_upgraded() {
        let table = SiteTable::standard();
        for r in Resource::HARVESTABLE {
            let top = table.level(r, MAX_SITE_LEVEL).unwrap();
            assert!(top.upgrade_cost.is_empty(), "{r:?}");
        }
    }

    #[test]
    fn forest_costs_are_explicit() {
        let table = SiteTable::standard();
        let l1 = table.level(Resource::Wood, 1).unwrap();
        assert_eq!(l1.upgrade_cost, BTreeMap::from([(Resource::Wood, 200)]));
        assert_eq!(l1.upgrade_secs, 5);
        assert_eq!(l1.max_workers_per_city, 8);
        let l9 = table.level(Resource::Wood, 9).unwrap();
        assert_eq!(l9.upgrade_cost.get(&Resource::Wood), Some(&1900));
    }

    #[test]
    fn quarry_costs_double() {
        let table = SiteTable::standard();
        let l3 = table.level(Resource::Stone, 3).unwrap();
        assert_eq!(l3.upgrade_cost.get(&Resource::Wood), Some(&400));
        assert_eq!(l3.upgrade_cost.get(&Resource::Stone), Some(&800));
        assert_eq!(l3.upgrade_secs, 6);
    }

    #[test]
    fn advanced_costs_grow_linearly() {
        let table = SiteTable::standard();
        let l4 = table.level(Resource::Gunpowder, 4).unwrap();
        assert_eq!(l4.upgrade_cost.get(&Resource::Wood), Some(&800));
        assert_eq!(l4.upgrade_cost.get(&Resource::Coal), Some(&400));
        assert_eq!(l4.upgrade_cost.get(&Resource::Gunpowder), Some(&400));
        assert_eq!(l4.max_workers_per_city, 16);
    }

    #[test]
    fn unknown_level_has_no_workers() {
        let table = SiteTable::standard();
        assert_eq!(table.max_workers_per_city(Resource::Coal, 0), 0);
        assert_eq!(table.max_workers_per_city(Resource::Coal, 11), 0);
        assert_eq!(table.max_workers_per_city(Resource::Gold, 1), 0);
    }
}
