//! HTTP facade over the Archipel world actor.
//!
//! The server holds no game state of its own. Every request becomes one
//! message to the [`WorldHandle`](archipel_core::WorldHandle): `GET`
//! endpoints read, `POST` endpoints send a single
//! [`Command`](archipel_core::Command). Clients poll the full state and
//! diff locally.
//!
//! # Modules
//!
//! - [`error`] -- [`ApiError`] and its JSON rendering.
//! - [`handlers`] -- Query and command endpoint handlers.
//! - [`router`] -- Route table with CORS and request tracing.
//! - [`server`] -- TCP binding and graceful shutdown.
//! - [`state`] -- [`AppState`] shared by the handlers.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
