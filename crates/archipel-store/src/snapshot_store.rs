//! Save and restore the world as a single JSON file.
//!
//! Serialization and file I/O run on the blocking pool so the world actor
//! only pays for building the [`WorldSnapshot`] itself.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use archipel_core::SnapshotSink;
use archipel_types::WorldSnapshot;
use archipel_world::{Rules, World, create_starting_world};
use tracing::{debug, info, warn};

use crate::error::StoreError;

/// A snapshot file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store bound to a file path. Nothing is touched yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot, replacing the previous one atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if serialization fails, or
    /// [`StoreError::Io`] if the file cannot be written.
    pub async fn save(&self, snapshot: WorldSnapshot) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &snapshot)).await?
    }

    /// Read the snapshot, or `None` if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read,
    /// or [`StoreError::Json`] if it does not parse.
    pub async fn load(&self) -> Result<Option<WorldSnapshot>, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read(&path)).await?
    }

    /// Restore the saved world, or seed the default archipelago when the
    /// snapshot is missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::World`] only if seeding itself fails.
    pub async fn restore_or_seed(&self, rules: &Rules) -> Result<World, StoreError> {
        match self.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    path = %self.path.display(),
                    tick = snapshot.tick,
                    cities = snapshot.cities.len(),
                    players = snapshot.players.len(),
                    "Restored world snapshot"
                );
                Ok(World::from_snapshot(snapshot))
            }
            Ok(None) => {
                info!(
                    path = %self.path.display(),
                    "No snapshot found, seeding default archipelago"
                );
                Ok(create_starting_world(rules)?)
            }
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    %error,
                    "Discarding unreadable snapshot, seeding default archipelago"
                );
                Ok(create_starting_world(rules)?)
            }
        }
    }
}

impl SnapshotSink for SnapshotStore {
    fn persist(&mut self, snapshot: WorldSnapshot) -> impl Future<Output = ()> + Send {
        async move {
            let tick = snapshot.tick;
            match self.save(snapshot).await {
                Ok(()) => debug!(tick, path = %self.path.display(), "Snapshot saved"),
                Err(error) => warn!(tick, %error, "Snapshot save failed"),
            }
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_atomic(path: &Path, snapshot: &WorldSnapshot) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(snapshot)?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;
    }
    let staging = path.with_extension("tmp");
    std::fs::write(&staging, bytes).map_err(|source| io_error(&staging, source))?;
    std::fs::rename(&staging, path).map_err(|source| io_error(path, source))
}

fn read(path: &Path) -> Result<Option<WorldSnapshot>, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(io_error(path, source)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn make_store() -> (SnapshotStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("archipel_store_{}", uuid::Uuid::new_v4()));
        (SnapshotStore::new(dir.join("saves").join("world.json")), dir)
    }

    fn make_world() -> World {
        create_starting_world(&Rules::standard()).unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_nothing() {
        let (store, _dir) = make_store();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_world_is_restored() {
        let (store, dir) = make_store();
        let mut world = make_world();
        world.advance_tick();
        let snapshot = world.to_snapshot(Utc::now());

        store.save(snapshot.clone()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        let restored = store.restore_or_seed(&Rules::standard()).await.unwrap();
        assert_eq!(restored.tick(), 1);
        assert_eq!(restored.city_ids(), world.city_ids());
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn missing_snapshot_seeds_default_world() {
        let (store, _dir) = make_store();
        let world = store.restore_or_seed(&Rules::standard()).await.unwrap();
        assert_eq!(world.islands().count(), 4);
        assert_eq!(world.cities().count(), 12);
        assert_eq!(world.tick(), 0);
    }

    #[tokio::test]
    async fn corrupt_snapshot_falls_back_to_seed() {
        let (store, dir) = make_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), b"{ not json").unwrap();

        assert!(matches!(store.load().await, Err(StoreError::Json(_))));
        let world = store.restore_or_seed(&Rules::standard()).await.unwrap();
        assert_eq!(world.islands().count(), 4);
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn sink_writes_the_file() {
        let (mut store, dir) = make_store();
        let snapshot = make_world().to_snapshot(Utc::now());
        store.persist(snapshot).await;
        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());
        std::fs::remove_dir_all(dir).ok();
    }
}
