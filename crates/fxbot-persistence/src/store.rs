//! Channel store.
//!
//! Channels are keyed by a store-assigned surrogate `id`; `channel_id` is
//! unique across rows. Two backends share one table implementation:
//! [`InMemoryChannelStore`] and [`JsonChannelStore`], which rewrites a JSON
//! file (via a temp file and rename) on every mutation.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::Utc;
use fxbot_core::{Channel, ChannelId, NewChannel};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Persistence collaborator for channel rows.
pub trait ChannelStore: Send + Sync {
    /// Insert a channel. Fails with `DuplicateChannel` if `channel_id` exists.
    fn create(&self, channel: NewChannel) -> PersistenceResult<Channel>;

    /// Channels ordered by id, paginated.
    fn list(&self, skip: usize, limit: usize) -> PersistenceResult<Vec<Channel>>;

    fn get(&self, id: u64) -> PersistenceResult<Option<Channel>>;

    fn find_by_channel_id(&self, channel_id: &ChannelId) -> PersistenceResult<Option<Channel>>;

    /// Delete a channel, returning the removed row.
    fn delete(&self, id: u64) -> PersistenceResult<Channel>;

    /// All registered channel ids.
    fn channel_ids(&self) -> PersistenceResult<Vec<ChannelId>>;
}

/// Arc wrapper for ChannelStore trait objects.
pub type DynChannelStore = Arc<dyn ChannelStore>;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct ChannelTable {
    next_id: u64,
    channels: Vec<Channel>,
}

impl ChannelTable {
    fn insert(&mut self, new: NewChannel) -> PersistenceResult<Channel> {
        if self.channels.iter().any(|c| c.channel_id == new.channel_id) {
            return Err(PersistenceError::DuplicateChannel(new.channel_id.to_string()));
        }
        self.next_id = self.next_id.max(self.channels.iter().map(|c| c.id).max().unwrap_or(0)) + 1;
        let now = Utc::now();
        let channel = Channel {
            id: self.next_id,
            channel_id: new.channel_id,
            name: new.name,
            created_at: now,
            updated_at: now,
        };
        self.channels.push(channel.clone());
        Ok(channel)
    }

    fn list(&self, skip: usize, limit: usize) -> Vec<Channel> {
        self.channels.iter().skip(skip).take(limit).cloned().collect()
    }

    fn get(&self, id: u64) -> Option<Channel> {
        self.channels.iter().find(|c| c.id == id).cloned()
    }

    fn find(&self, channel_id: &ChannelId) -> Option<Channel> {
        self.channels
            .iter()
            .find(|c| &c.channel_id == channel_id)
            .cloned()
    }

    fn remove(&mut self, id: u64) -> PersistenceResult<Channel> {
        let idx = self
            .channels
            .iter()
            .position(|c| c.id == id)
            .ok_or(PersistenceError::NotFound(id))?;
        Ok(self.channels.remove(idx))
    }

    fn ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|c| c.channel_id.clone()).collect()
    }
}

/// Volatile channel store.
#[derive(Debug, Default)]
pub struct InMemoryChannelStore {
    table: Mutex<ChannelTable>,
}

impl InMemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelStore for InMemoryChannelStore {
    fn create(&self, channel: NewChannel) -> PersistenceResult<Channel> {
        self.table.lock().insert(channel)
    }

    fn list(&self, skip: usize, limit: usize) -> PersistenceResult<Vec<Channel>> {
        Ok(self.table.lock().list(skip, limit))
    }

    fn get(&self, id: u64) -> PersistenceResult<Option<Channel>> {
        Ok(self.table.lock().get(id))
    }

    fn find_by_channel_id(&self, channel_id: &ChannelId) -> PersistenceResult<Option<Channel>> {
        Ok(self.table.lock().find(channel_id))
    }

    fn delete(&self, id: u64) -> PersistenceResult<Channel> {
        self.table.lock().remove(id)
    }

    fn channel_ids(&self) -> PersistenceResult<Vec<ChannelId>> {
        Ok(self.table.lock().ids())
    }
}

/// Channel store persisted to a JSON file.
pub struct JsonChannelStore {
    path: PathBuf,
    table: Mutex<ChannelTable>,
}

impl JsonChannelStore {
    /// Open the store at `path`, loading existing rows if the file exists.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let table = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                ChannelTable::default()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            ChannelTable::default()
        };
        info!(path = %path.display(), channels = table.channels.len(), "Opened channel store");

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Apply a mutation and persist it; the in-memory table is left
    /// unchanged if writing fails.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut ChannelTable) -> PersistenceResult<R>,
    ) -> PersistenceResult<R> {
        let mut table = self.table.lock();
        let mut next = table.clone();
        let result = f(&mut next)?;
        self.write(&next)?;
        *table = next;
        Ok(result)
    }

    fn write(&self, table: &ChannelTable) -> PersistenceResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(table)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), channels = table.channels.len(), "Channel store written");
        Ok(())
    }
}

impl ChannelStore for JsonChannelStore {
    fn create(&self, channel: NewChannel) -> PersistenceResult<Channel> {
        self.mutate(|t| t.insert(channel))
    }

    fn list(&self, skip: usize, limit: usize) -> PersistenceResult<Vec<Channel>> {
        Ok(self.table.lock().list(skip, limit))
    }

    fn get(&self, id: u64) -> PersistenceResult<Option<Channel>> {
        Ok(self.table.lock().get(id))
    }

    fn find_by_channel_id(&self, channel_id: &ChannelId) -> PersistenceResult<Option<Channel>> {
        Ok(self.table.lock().find(channel_id))
    }

    fn delete(&self, id: u64) -> PersistenceResult<Channel> {
        self.mutate(|t| t.remove(id))
    }

    fn channel_ids(&self) -> PersistenceResult<Vec<ChannelId>> {
        Ok(self.table.lock().ids())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_channel(id: &str, name: &str) -> NewChannel {
        NewChannel {
            channel_id: ChannelId::new(id).unwrap(),
            name: name.to_string(),
        }
    }

    fn exercise(store: &dyn ChannelStore) {
        let a = store.create(new_channel("-100", "alpha")).unwrap();
        let b = store.create(new_channel("@beta", "beta")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        let dup = store.create(new_channel("-100", "again")).unwrap_err();
        assert!(matches!(dup, PersistenceError::DuplicateChannel(_)));

        assert_eq!(store.list(0, 100).unwrap().len(), 2);
        assert_eq!(store.list(1, 100).unwrap(), vec![b.clone()]);
        assert_eq!(store.list(0, 1).unwrap(), vec![a.clone()]);
        assert_eq!(store.get(2).unwrap(), Some(b.clone()));
        assert_eq!(store.get(9).unwrap(), None);
        assert_eq!(
            store.find_by_channel_id(&a.channel_id).unwrap(),
            Some(a.clone())
        );

        assert_eq!(store.delete(1).unwrap(), a);
        assert!(matches!(store.delete(1), Err(PersistenceError::NotFound(1))));
        assert_eq!(store.channel_ids().unwrap(), vec![b.channel_id.clone()]);

        // ids are never reused
        let c = store.create(new_channel("-100", "alpha again")).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_in_memory_store() {
        exercise(&InMemoryChannelStore::new());
    }

    #[test]
    fn test_json_store() {
        let temp_dir = TempDir::new().unwrap();
        exercise(&JsonChannelStore::open(temp_dir.path().join("channels.json")).unwrap());
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("channels.json");
        {
            let store = JsonChannelStore::open(&path).unwrap();
            store.create(new_channel("-100", "alpha")).unwrap();
            store.create(new_channel("-200", "beta")).unwrap();
            store.delete(2).unwrap();
        }

        let store = JsonChannelStore::open(&path).unwrap();
        let ids = store.channel_ids().unwrap();
        assert_eq!(ids, vec![ChannelId::new("-100").unwrap()]);
        let next = store.create(new_channel("-300", "gamma")).unwrap();
        assert_eq!(next.id, 3, "next id persists across reopen");
    }
}
