//! The command vocabulary of the world actor.
//!
//! Every mutation a client can request is a [`Command`]; [`execute`] routes
//! it to the engine that owns it and wraps the result in an [`Outcome`].

use archipel_types::{
    BuildingKind, CityId, IslandId, NotificationId, NotificationKind, PlayerId, Research, Resource,
    TaxRate, Transport, TransportId, TransportState, Workplace,
};
use archipel_world::{Rules, World};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::commands::{self, CureOutcome, ShipPurchase};
use crate::construction::{self, BuildOrder};
use crate::error::CommandError;
use crate::sites::{self, DonationOutcome};
use crate::transport::{self, TransportRequest};
use crate::{notifications, research};

/// A state-changing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in, creating the account on first use.
    Join {
        /// Login name.
        username: String,
        /// Plaintext credential.
        credential: String,
    },
    /// Take an unowned city.
    ClaimCity {
        /// Acting player.
        player: PlayerId,
        /// City to claim.
        city: CityId,
    },
    /// Rename a city.
    RenameCity {
        /// Acting player.
        player: PlayerId,
        /// City to rename.
        city: CityId,
        /// New name.
        name: String,
    },
    /// Build a new building or upgrade the one in the slot.
    BuildOrUpgrade {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Slot index.
        slot: usize,
        /// Building kind.
        kind: BuildingKind,
    },
    /// Lower or remove the building in a slot.
    Destroy {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Slot index.
        slot: usize,
    },
    /// Finish a nearly complete construction.
    CompleteInstantly {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Slot index.
        slot: usize,
    },
    /// Set the workers of a site or the academy.
    AssignWorkers {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Site or academy.
        workplace: Workplace,
        /// Requested worker count.
        count: u32,
    },
    /// Donate toward a site upgrade.
    Donate {
        /// Acting player.
        player: PlayerId,
        /// Donor city.
        city: CityId,
        /// Island of the site.
        island: IslandId,
        /// Resource the site yields.
        site: Resource,
        /// Resource donated.
        resource: Resource,
        /// Amount offered.
        amount: u32,
    },
    /// Ship goods to another city.
    CreateTransport {
        /// Acting player.
        player: PlayerId,
        /// Shipment details.
        request: TransportRequest,
    },
    /// Cancel a shipment.
    CancelTransport {
        /// Acting player.
        player: PlayerId,
        /// Transport to cancel.
        id: TransportId,
    },
    /// Unlock a research.
    UnlockResearch {
        /// Acting player.
        player: PlayerId,
        /// Research to unlock.
        research: Research,
    },
    /// Select a tax band.
    SetTaxRate {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// New band.
        rate: TaxRate,
    },
    /// Select the windmill cereal multiplier.
    SetWindmillMultiplier {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
        /// Chosen multiplier.
        multiplier: u32,
    },
    /// Try to cure a city's plague.
    CurePlague {
        /// Acting player.
        player: PlayerId,
        /// Target city.
        city: CityId,
    },
    /// Buy a ship with gold from a city.
    BuyShip {
        /// Acting player.
        player: PlayerId,
        /// City paying.
        city: CityId,
    },
    /// Credit diamonds to a player.
    AddDiamonds {
        /// Player credited.
        player: PlayerId,
        /// Diamonds added.
        amount: u64,
    },
    /// Deliver an arbitrary message to a player.
    Notify {
        /// Recipient.
        player: PlayerId,
        /// Category.
        kind: NotificationKind,
        /// Text.
        message: String,
    },
    /// Mark every notification of a player as read.
    MarkNotificationsRead {
        /// Player whose inbox is cleared.
        player: PlayerId,
    },
}

/// What an accepted command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Nothing to report beyond success.
    Done,
    /// The player's id after a join.
    Player {
        /// Player id.
        player_id: PlayerId,
    },
    /// A construction started.
    Construction(BuildOrder),
    /// Whether a destroy changed anything.
    Destroyed {
        /// `false` when the slot was already empty.
        destroyed: bool,
    },
    /// Workers actually assigned.
    Workers {
        /// Count after clamping.
        assigned: u32,
    },
    /// A donation was accepted.
    Donation(DonationOutcome),
    /// A transport was created.
    Transport(Box<Transport>),
    /// State of a transport after cancellation.
    Cancelled {
        /// `cancelled` in port, `returning` at sea.
        state: TransportState,
    },
    /// Windmill multiplier stored.
    Multiplier {
        /// Value stored.
        multiplier: u32,
    },
    /// Plague cure attempt.
    Cure(CureOutcome),
    /// Ship bought.
    Ship(ShipPurchase),
    /// Diamond balance after a top-up.
    Diamonds {
        /// New balance.
        diamonds: u64,
    },
    /// A notification was delivered.
    Notified {
        /// Its id.
        id: NotificationId,
    },
    /// Notifications marked read.
    MarkedRead {
        /// How many changed.
        marked: usize,
    },
}

/// Apply one command to the world.
///
/// # Errors
///
/// Returns the engine's [`CommandError`]; the world is then unchanged.
pub fn execute(
    rules: &Rules,
    world: &mut World,
    rng: &mut impl Rng,
    command: Command,
    now: DateTime<Utc>,
) -> Result<Outcome, CommandError> {
    match command {
        Command::Join { username, credential } => {
            commands::join(rules, world, &username, &credential, now)
                .map(|player_id| Outcome::Player { player_id })
        }
        Command::ClaimCity { player, city } => {
            commands::claim_city(world, player, city).map(|()| Outcome::Done)
        }
        Command::RenameCity { player, city, name } => {
            commands::rename_city(world, player, city, &name).map(|()| Outcome::Done)
        }
        Command::BuildOrUpgrade {
            player,
            city,
            slot,
            kind,
        } => construction::build_or_upgrade(rules, world, player, city, slot, kind, now)
            .map(Outcome::Construction),
        Command::Destroy { player, city, slot } => Ok(Outcome::Destroyed {
            destroyed: construction::destroy(rules, world, player, city, slot),
        }),
        Command::CompleteInstantly { player, city, slot } => {
            construction::complete_instantly(rules, world, player, city, slot, now)
                .map(|()| Outcome::Done)
        }
        Command::AssignWorkers {
            player,
            city,
            workplace,
            count,
        } => commands::assign_workers(rules, world, player, city, workplace, count)
            .map(|assigned| Outcome::Workers { assigned }),
        Command::Donate {
            player,
            city,
            island,
            site,
            resource,
            amount,
        } => sites::donate(rules, world, player, city, island, site, resource, amount, now)
            .map(Outcome::Donation),
        Command::CreateTransport { player, request } => {
            transport::create(world, player, request).map(|t| Outcome::Transport(Box::new(t)))
        }
        Command::CancelTransport { player, id } => {
            transport::cancel(rules, world, player, id, now)
                .map(|state| Outcome::Cancelled { state })
        }
        Command::UnlockResearch { player, research } => {
            research::unlock(rules, world, player, research, now).map(|()| Outcome::Done)
        }
        Command::SetTaxRate { player, city, rate } => {
            commands::set_tax_rate(world, player, city, rate).map(|()| Outcome::Done)
        }
        Command::SetWindmillMultiplier {
            player,
            city,
            multiplier,
        } => commands::set_windmill_multiplier(world, player, city, multiplier)
            .map(|multiplier| Outcome::Multiplier { multiplier }),
        Command::CurePlague { player, city } => {
            commands::cure_plague(rules, world, player, city, rng).map(Outcome::Cure)
        }
        Command::BuyShip { player, city } => {
            commands::buy_ship(rules, world, player, city).map(Outcome::Ship)
        }
        Command::AddDiamonds { player, amount } => {
            commands::add_diamonds(world, player, amount)
                .map(|diamonds| Outcome::Diamonds { diamonds })
        }
        Command::Notify {
            player,
            kind,
            message,
        } => {
            if world.player(player).is_none() {
                return Err(CommandError::PlayerNotFound(player));
            }
            Ok(Outcome::Notified {
                id: notifications::notify(world, player, kind, message, now),
            })
        }
        Command::MarkNotificationsRead { player } => Ok(Outcome::MarkedRead {
            marked: notifications::mark_all_read(world, player),
        }),
    }
}
