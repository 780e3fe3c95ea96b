//! The world actor: the only task that ever touches the [`World`].
//!
//! [`spawn_world`] moves a [`Game`] into a tokio task that owns it
//! exclusively. Clients talk to it through a cloneable [`WorldHandle`],
//! which sends a message over an mpsc channel and awaits the oneshot
//! reply. The actor multiplexes three event sources with `select!`:
//!
//! - **Tick interval** -- elapsed real time goes through the
//!   [`Scheduler`], which decides how many simulated seconds to run.
//! - **Save interval** -- a snapshot is handed to the [`SnapshotSink`].
//! - **Messages** -- commands and queries, handled between ticks, so a
//!   command never observes a half-applied tick.
//!
//! The actor stops on [`WorldHandle::shutdown`] or when every handle is
//! dropped, and saves one final snapshot either way.

use std::future::Future;
use std::time::Duration;

use archipel_types::{
    IslandId, Notification, NotificationKind, PlayerId, Resource, Transport, WorldSnapshot,
};
use archipel_world::{Rules, World};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::dispatch::{self, Command, Outcome};
use crate::error::CommandError;
use crate::scheduler::Scheduler;
use crate::sites::{self, SiteInfo};
use crate::{notifications, tick, transport};

/// Capacity of the actor's inbox.
const INBOX_CAPACITY: usize = 256;

/// Errors returned by a [`WorldHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The world actor is no longer running.
    #[error("world actor stopped")]
    Stopped,

    /// The command was rejected.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Everything the world actor owns.
#[derive(Debug, Clone)]
pub struct Game {
    /// Static rule tables.
    pub rules: Rules,
    /// Mutable world state.
    pub world: World,
    rng: SmallRng,
}

impl Game {
    /// Create a game with an OS-seeded random generator.
    pub fn new(rules: Rules, world: World) -> Self {
        Self {
            rules,
            world,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Create a game with a fixed seed, for reproducible runs.
    pub fn with_seed(rules: Rules, world: World, seed: u64) -> Self {
        Self {
            rules,
            world,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Apply one command at the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns the rejecting [`CommandError`].
    pub fn execute(&mut self, command: Command) -> Result<Outcome, CommandError> {
        dispatch::execute(&self.rules, &mut self.world, &mut self.rng, command, Utc::now())
    }
}

/// Destination of periodic world snapshots.
pub trait SnapshotSink: Send + 'static {
    /// Store a snapshot. Failures are logged by the implementation.
    fn persist(&mut self, snapshot: WorldSnapshot) -> impl Future<Output = ()> + Send;
}

/// A sink that discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl SnapshotSink for NoOpSink {
    fn persist(&mut self, _snapshot: WorldSnapshot) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

enum Message {
    Execute {
        command: Command,
        reply: oneshot::Sender<Result<Outcome, CommandError>>,
    },
    Snapshot {
        reply: oneshot::Sender<WorldSnapshot>,
    },
    Notifications {
        player: PlayerId,
        reply: oneshot::Sender<Vec<Notification>>,
    },
    UnreadCount {
        player: PlayerId,
        kind: Option<NotificationKind>,
        reply: oneshot::Sender<usize>,
    },
    Transports {
        player: PlayerId,
        reply: oneshot::Sender<Vec<Transport>>,
    },
    SiteInfo {
        island: IslandId,
        resource: Resource,
        reply: oneshot::Sender<Result<SiteInfo, CommandError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable access point to the world actor.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    tx: mpsc::Sender<Message>,
}

impl WorldHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> Result<T, RunnerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_closed| RunnerError::Stopped)?;
        rx.await.map_err(|_dropped| RunnerError::Stopped)
    }

    /// Apply a command.
    pub async fn execute(&self, command: Command) -> Result<Outcome, RunnerError> {
        let result = self
            .request(|reply| Message::Execute { command, reply })
            .await?;
        Ok(result?)
    }

    /// The full world tree as plain data.
    pub async fn snapshot(&self) -> Result<WorldSnapshot, RunnerError> {
        self.request(|reply| Message::Snapshot { reply }).await
    }

    /// A player's notifications, newest first.
    pub async fn notifications(&self, player: PlayerId) -> Result<Vec<Notification>, RunnerError> {
        self.request(|reply| Message::Notifications { player, reply })
            .await
    }

    /// Unread notifications of a player, optionally of one kind.
    pub async fn unread_count(
        &self,
        player: PlayerId,
        kind: Option<NotificationKind>,
    ) -> Result<usize, RunnerError> {
        self.request(|reply| Message::UnreadCount {
            player,
            kind,
            reply,
        })
        .await
    }

    /// Transports a player sent or receives.
    pub async fn transports(&self, player: PlayerId) -> Result<Vec<Transport>, RunnerError> {
        self.request(|reply| Message::Transports { player, reply })
            .await
    }

    /// Level, cost, donations and workers of a resource site.
    pub async fn site_info(
        &self,
        island: IslandId,
        resource: Resource,
    ) -> Result<SiteInfo, RunnerError> {
        let result = self
            .request(|reply| Message::SiteInfo {
                island,
                resource,
                reply,
            })
            .await?;
        Ok(result?)
    }

    /// Save a final snapshot and stop the actor.
    pub async fn shutdown(&self) -> Result<(), RunnerError> {
        self.request(|reply| Message::Shutdown { reply }).await
    }
}

/// Move a game into its own task and return the handle to it.
///
/// The join handle yields the game back once the actor stops.
pub fn spawn_world<S: SnapshotSink>(
    game: Game,
    config: &GameConfig,
    sink: S,
) -> (WorldHandle, JoinHandle<Game>) {
    let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
    let tick_period = Duration::from_millis(config.simulation.tick_interval_ms.max(1));
    let save_period = Duration::from_secs(config.persistence.save_interval_secs.max(1));
    let scheduler = Scheduler::from_config(&config.simulation);
    let task = tokio::spawn(run(game, rx, sink, scheduler, tick_period, save_period));
    (WorldHandle { tx }, task)
}

async fn run<S: SnapshotSink>(
    mut game: Game,
    mut rx: mpsc::Receiver<Message>,
    mut sink: S,
    mut scheduler: Scheduler,
    tick_period: Duration,
    save_period: Duration,
) -> Game {
    let start = Instant::now();
    let first_tick = start.checked_add(tick_period).unwrap_or(start);
    let mut ticks = tokio::time::interval_at(first_tick, tick_period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let first_save = start.checked_add(save_period).unwrap_or(start);
    let mut saves = tokio::time::interval_at(first_save, save_period);
    saves.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = start;

    info!(
        tick = game.world.tick(),
        tick_interval_ms = tick_period.as_millis(),
        save_interval_secs = save_period.as_secs(),
        "World actor started"
    );

    loop {
        tokio::select! {
            now = ticks.tick() => {
                let steps = scheduler.advance(now.duration_since(last));
                last = now;
                for _ in 0..steps {
                    tick::run_tick(&game.rules, &mut game.world, Utc::now());
                }
            }
            _ = saves.tick() => {
                debug!(tick = game.world.tick(), "Saving world snapshot");
                sink.persist(game.world.to_snapshot(Utc::now())).await;
            }
            message = rx.recv() => {
                let Some(message) = message else {
                    info!("All world handles dropped");
                    break;
                };
                if let Message::Shutdown { reply } = message {
                    sink.persist(game.world.to_snapshot(Utc::now())).await;
                    let _ = reply.send(());
                    info!(tick = game.world.tick(), "World actor shut down");
                    return game;
                }
                handle(&mut game, message);
            }
        }
    }

    sink.persist(game.world.to_snapshot(Utc::now())).await;
    info!(tick = game.world.tick(), "World actor stopped");
    game
}

/// Answer one message. A dropped reply receiver is not an error.
fn handle(game: &mut Game, message: Message) {
    let now = Utc::now();
    match message {
        Message::Execute { command, reply } => {
            let _ = reply.send(game.execute(command));
        }
        Message::Snapshot { reply } => {
            let _ = reply.send(game.world.to_snapshot(now));
        }
        Message::Notifications { player, reply } => {
            let _ = reply.send(notifications::list(&game.world, player));
        }
        Message::UnreadCount {
            player,
            kind,
            reply,
        } => {
            let _ = reply.send(notifications::unread_count(&game.world, player, kind));
        }
        Message::Transports { player, reply } => {
            let _ = reply.send(transport::for_player(&game.world, player));
        }
        Message::SiteInfo {
            island,
            resource,
            reply,
        } => {
            let _ = reply.send(sites::site_info(
                &game.rules,
                &mut game.world,
                island,
                resource,
                now,
            ));
        }
        Message::Shutdown { reply } => {
            let _ = reply.send(());
        }
    }
}
