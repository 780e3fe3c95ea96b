//! Shared application state for the API server.

use archipel_core::WorldHandle;

/// State shared by every handler.
///
/// Only the handle is shared; the world itself stays inside its actor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Channel to the world actor.
    pub world: WorldHandle,
}

impl AppState {
    /// Wrap a world handle.
    pub const fn new(world: WorldHandle) -> Self {
        Self { world }
    }
}
