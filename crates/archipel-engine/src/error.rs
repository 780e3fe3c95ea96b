//! Error types for the game server binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, serving and shutdown.

/// Top-level error for the game server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: archipel_core::ConfigError,
    },

    /// Restoring or seeding the world failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: archipel_store::StoreError,
    },

    /// The world actor did not stop cleanly.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: archipel_core::RunnerError,
    },

    /// The API server failed to start or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: archipel_server::ServerError,
    },

    /// The world actor task panicked.
    #[error("world task failed: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
