//! Snapshot persistence for the Archipel world.
//!
//! The whole world is one JSON document mirroring
//! [`WorldSnapshot`](archipel_types::WorldSnapshot). It is written to a
//! temporary file and renamed into place, so a crash mid-save never leaves
//! a torn snapshot behind.
//!
//! # Modules
//!
//! - [`error`] -- [`StoreError`] for I/O, JSON and seeding failures.
//! - [`snapshot_store`] -- [`SnapshotStore`], save, load and
//!   restore-or-seed.

pub mod error;
pub mod snapshot_store;

pub use error::StoreError;
pub use snapshot_store::SnapshotStore;
