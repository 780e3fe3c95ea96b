//! Error types for the `archipel-core` crate.
//!
//! [`CommandError`] covers every reason a player command can be refused.
//! Commands validate completely before touching the world, so an error
//! always means nothing was changed. The `Display` text is the
//! human-readable message returned to the client.

use archipel_types::{
    BuildingCategory, BuildingKind, CityId, IslandId, PlayerId, Research, Resource, TransportId,
    TransportState,
};
use archipel_world::WorldError;
use rust_decimal::Decimal;

/// Why a command was refused.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The player does not exist.
    #[error("unknown player: {0}")]
    PlayerNotFound(PlayerId),

    /// The city does not exist.
    #[error("unknown city: {0}")]
    CityNotFound(CityId),

    /// The island has no site for that resource.
    #[error("no {resource:?} site on island {island}")]
    SiteNotFound {
        /// Island searched.
        island: IslandId,
        /// Resource the site would yield.
        resource: Resource,
    },

    /// No active transport has that id.
    #[error("transport {0} not found")]
    TransportNotFound(TransportId),

    /// The player does not own the city.
    #[error("you do not own city {0}")]
    NotOwner(CityId),

    /// The building kind is not in the building table.
    #[error("unknown building {0:?}")]
    UnknownBuilding(BuildingKind),

    /// A research gate is still closed.
    #[error("research {0:?} is required")]
    ResearchRequired(Research),

    /// The slot index is outside the city layout.
    #[error("slot {0} does not exist")]
    InvalidSlot(usize),

    /// The slot does not accept this kind of building.
    #[error("slot {slot} only accepts {expected:?} buildings")]
    WrongSlotCategory {
        /// Slot requested.
        slot: usize,
        /// Category the slot accepts.
        expected: BuildingCategory,
    },

    /// Another building stands in the slot.
    #[error("slot {slot} is occupied by a {occupant:?}")]
    SlotOccupied {
        /// Slot requested.
        slot: usize,
        /// Building already there.
        occupant: BuildingKind,
    },

    /// The slot holds nothing to act on.
    #[error("slot {0} is empty")]
    EmptySlot(usize),

    /// The building is still being built.
    #[error("construction already in progress in slot {0}")]
    ConstructionInProgress(usize),

    /// The building is not under construction.
    #[error("no construction in progress in slot {0}")]
    NotUnderConstruction(usize),

    /// The building is at its top level.
    #[error("{0:?} is already at its maximum level")]
    MaxLevelReached(BuildingKind),

    /// The city already has as many buildings of this kind as allowed.
    #[error("maximum number of {0:?} reached")]
    MaxCountReached(BuildingKind),

    /// The building table has no entry for the target level.
    #[error("no data for {kind:?} level {level}")]
    MissingLevel {
        /// Building kind.
        kind: BuildingKind,
        /// Level looked up.
        level: u32,
    },

    /// The city does not hold enough of a resource.
    #[error("insufficient {resource:?}: {required} required, {available} available")]
    InsufficientResources {
        /// Resource short.
        resource: Resource,
        /// Amount needed.
        required: Decimal,
        /// Amount held.
        available: Decimal,
    },

    /// The resource cannot be harvested on a site.
    #[error("{0:?} is not harvested on island sites")]
    NotHarvestable(Resource),

    /// The city has no finished academy.
    #[error("city has no finished academy")]
    NoAcademy,

    /// The city does not stand on the site's island.
    #[error("city {0} is not on this island")]
    NotOnIsland(CityId),

    /// The resource is not part of the current upgrade cost.
    #[error("{0:?} is not required for this level")]
    NotRequired(Resource),

    /// The site already received everything it needs of this resource.
    #[error("the site already received all the {0:?} it needs")]
    AlreadyFunded(Resource),

    /// The requested amount is zero.
    #[error("amount must be positive")]
    ZeroAmount,

    /// The player lacks available ships.
    #[error("not enough ships: {required} required, {available} available")]
    NotEnoughShips {
        /// Ships requested.
        required: u32,
        /// Ships in port.
        available: u32,
    },

    /// The transport can no longer be cancelled.
    #[error("transport {id} cannot be cancelled while {state:?}")]
    CannotCancel {
        /// Transport id.
        id: TransportId,
        /// Its current state.
        state: TransportState,
    },

    /// The player owns no city.
    #[error("player owns no city")]
    NoCity,

    /// The research is already unlocked.
    #[error("research {0:?} is already unlocked")]
    AlreadyUnlocked(Research),

    /// The research is not in the research table.
    #[error("unknown research {0:?}")]
    UnknownResearch(Research),

    /// Not enough research points.
    #[error("not enough research points: {required} required, {available} available")]
    NotEnoughResearchPoints {
        /// Points needed.
        required: Decimal,
        /// Points held.
        available: Decimal,
    },

    /// Remaining construction time is above the instant threshold.
    #[error("{remaining} seconds remain, instant completion needs {threshold} or less")]
    TooFarFromCompletion {
        /// Seconds left.
        remaining: u64,
        /// Highest allowed.
        threshold: u64,
    },

    /// The city has no plague to cure.
    #[error("city has no plague")]
    NoPlague,

    /// Hygiene must reach 100 percent before a cure.
    #[error("hygiene is {0}%, a cure needs 100%")]
    HygieneTooLow(u32),

    /// Another player owns the city.
    #[error("city is already owned by another player")]
    CityTaken,

    /// The city name is empty.
    #[error("city name must not be empty")]
    EmptyName,

    /// The username is empty.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The credential does not match.
    #[error("wrong credential for {0}")]
    WrongCredential(String),

    /// An arena operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying arena error.
        #[from]
        source: WorldError,
    },
}

impl CommandError {
    /// Whether the error names an entity that does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PlayerNotFound(_)
                | Self::CityNotFound(_)
                | Self::SiteNotFound { .. }
                | Self::TransportNotFound(_)
        )
    }
}
