//! Game server binary for Archipel.
//!
//! Wires the world actor, the snapshot store and the HTTP API together
//! and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `archipel-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Restore the saved world, or seed the default archipelago
//! 4. Spawn the world actor with the snapshot store as its sink
//! 5. Serve the HTTP API until `Ctrl-C`
//! 6. Stop the actor, which writes a final snapshot

mod error;

use std::path::Path;
use std::sync::Arc;

use archipel_core::config::LoggingConfig;
use archipel_core::{Game, GameConfig, spawn_world};
use archipel_server::AppState;
use archipel_store::SnapshotStore;
use archipel_world::Rules;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the optional configuration file.
const CONFIG_PATH: &str = "archipel-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the world actor
/// does not stop cleanly.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        port = config.server.port,
        tick_interval_ms = config.simulation.tick_interval_ms,
        time_scale = %config.simulation.time_scale,
        snapshot_path = %config.persistence.snapshot_path.display(),
        "archipel-engine starting"
    );

    run(&config).await?;
    info!("archipel-engine stopped");
    Ok(())
}

async fn run(config: &GameConfig) -> Result<(), EngineError> {
    // 3. Restore or seed.
    let rules = Rules::standard();
    let store = SnapshotStore::new(config.persistence.snapshot_path.clone());
    let world = store.restore_or_seed(&rules).await?;
    info!(
        tick = world.tick(),
        players = world.players().count(),
        cities = world.cities().count(),
        "World ready"
    );

    // 4. World actor.
    let (handle, task) = spawn_world(Game::new(rules, world), config, store);

    // 5. HTTP API.
    let state = Arc::new(AppState::new(handle.clone()));
    let served = archipel_server::start_server(&config.server, state, shutdown_signal()).await;

    // 6. Final save, even when serving failed.
    handle.shutdown().await?;
    let game = task.await?;
    info!(tick = game.world.tick(), "World saved");
    served?;
    Ok(())
}

/// Load configuration from `archipel-config.yaml`.
///
/// If the file does not exist, defaults are used. Environment overrides
/// apply either way.
fn load_config() -> Result<GameConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(GameConfig::from_file(config_path)?)
    } else {
        let mut config = GameConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Resolve on `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
