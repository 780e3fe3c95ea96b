//! Simulation engines, command layer and world actor for Archipel.
//!
//! This crate owns everything that changes the world: the per-tick
//! engines, the player commands that validate and apply requests, and the
//! actor task that serializes both against a single [`World`] instance.
//!
//! # Modules
//!
//! - [`commands`] -- Account, city, worker, plague and ship commands.
//! - [`config`] -- Configuration loading from `archipel-config.yaml` into
//!   strongly-typed structs.
//! - [`construction`] -- Building costs, timers, completion and
//!   demolition.
//! - [`dispatch`] -- The [`Command`] vocabulary and its router.
//! - [`economy`] -- Storage caps, production and research points.
//! - [`error`] -- [`CommandError`], every reason a command is refused.
//! - [`notifications`] -- Per-player message inbox.
//! - [`population`] -- Growth, satisfaction, hygiene and worker release.
//! - [`research`] -- Unlocking researches.
//! - [`runner`] -- The world actor, [`WorldHandle`] and snapshot sinks.
//! - [`scheduler`] -- Real time to simulated seconds.
//! - [`sites`] -- Shared resource site donations and upgrades.
//! - [`tick`] -- One simulated second across every engine.
//! - [`transport`] -- Shipments between cities.
//!
//! [`World`]: archipel_world::World

pub mod commands;
pub mod config;
pub mod construction;
pub mod dispatch;
pub mod economy;
pub mod error;
pub mod notifications;
pub mod population;
pub mod research;
pub mod runner;
pub mod scheduler;
pub mod sites;
pub mod tick;
pub mod transport;

// Re-export primary types at crate root.
pub use config::{ConfigError, GameConfig};
pub use dispatch::{Command, Outcome};
pub use error::CommandError;
pub use runner::{Game, NoOpSink, RunnerError, SnapshotSink, WorldHandle, spawn_world};
pub use scheduler::Scheduler;
pub use tick::{TickSummary, run_tick};
