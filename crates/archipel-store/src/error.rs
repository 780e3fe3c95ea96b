//! Error types for the snapshot store.
//!
//! All errors are propagated via [`StoreError`], which wraps the underlying
//! I/O and JSON errors together with the file involved.

use std::path::PathBuf;

use archipel_world::WorldError;

/// Errors that can occur while saving or loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot could not be serialized or parsed.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking writer task panicked or was cancelled.
    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Seeding the default world failed.
    #[error("failed to seed world: {0}")]
    World(#[from] WorldError),
}
