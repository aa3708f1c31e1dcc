//! Key-value blob storage.
//!
//! Every logical collection lives under a single key as one JSON document, and
//! every write replaces that document whole. Nothing here locks across a
//! read-modify-write cycle: two writers racing on the same key keep the last
//! write.

use redis::{Client, Commands};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::{StoreError, StoreResult};

pub const USERS_KEY: &str = "taskflow_users";
pub const TASKS_KEY: &str = "taskflow_tasks";
pub const SESSION_KEY: &str = "taskflow_auth";

/// Synchronous get/set storage of string blobs.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    /// Drops every key this store owns.
    fn clear(&self) -> StoreResult<()>;
}

pub type SharedStore = Arc<dyn KvStore>;

pub fn open_store(config: &StorageConfig) -> StoreResult<SharedStore> {
    let store: SharedStore = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::default()),
        StorageBackend::File => Arc::new(FileStore::open(&config.data_dir)?),
        StorageBackend::Redis => Arc::new(RedisStore::new(
            Client::open(config.redis_url.as_str())?,
            &config.key_prefix,
        )),
    };
    tracing::info!("Opened {:?} store", config.backend);
    Ok(store)
}

/// A stored JSON array, decoded element by element.
///
/// Elements that do not decode as `T` are kept as raw JSON and written back
/// unchanged, in their original position, whenever the collection is saved.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct Collection<T> {
    slots: Vec<Slot<T>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Slot<T> {
    Record(T),
    Opaque(serde_json::Value),
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Record(record) => Some(record),
            Slot::Opaque(_) => None,
        })
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Record(record) => Some(record),
            Slot::Opaque(_) => None,
        })
    }

    pub fn into_records(self) -> Vec<T> {
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Record(record) => Some(record),
                Slot::Opaque(_) => None,
            })
            .collect()
    }

    pub fn push(&mut self, record: T) {
        self.slots.push(Slot::Record(record));
    }

    /// Drops decoded records for which `keep` is false. Raw elements stay.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.slots.retain(|slot| match slot {
            Slot::Record(record) => keep(record),
            Slot::Opaque(_) => true,
        });
    }

    /// Raw elements that did not decode.
    pub fn opaque(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Opaque(value) => Some(value),
            Slot::Record(_) => None,
        })
    }

    /// Number of stored elements, decoded or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Reads a JSON array stored under `key`.
///
/// A missing key is an empty collection. A value that is not an array is
/// logged and also treated as empty.
pub fn read_collection<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> StoreResult<Collection<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(Collection::default());
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("Malformed collection under {}, treating as empty: {}", key, e);
            return Ok(Collection::default());
        }
    };

    let slots = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match T::deserialize(&value) {
            Ok(record) => Slot::Record(record),
            Err(e) => {
                tracing::warn!("Keeping undecodable record {} under {} as-is: {}", index, key, e);
                Slot::Opaque(value)
            }
        })
        .collect();
    Ok(Collection { slots })
}

pub fn write_collection<T: Serialize>(store: &dyn KvStore, key: &str, collection: &Collection<T>) -> StoreResult<()> {
    let raw = serde_json::to_string(collection)?;
    store.set(key, &raw)
}

/// Reads a single JSON record; anything that fails to decode is `None`.
pub fn read_record<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> StoreResult<Option<T>> {
    Ok(store.get(key)?.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Malformed record under {}, ignoring: {}", key, e);
            None
        }
    }))
}

pub fn write_record<T: Serialize>(store: &dyn KvStore, key: &str, record: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(record)?;
    store.set(key, &raw)
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.clear();
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                tracing::error!("Failed to create data directory {}: {}", dir.display(), e);
                StoreError::Io(e)
            })?;
        }
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)?) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Keys live under `<prefix>:<key>` so several stores can share one server.
pub struct RedisStore {
    client: Client,
    prefix: String,
}

impl RedisStore {
    pub fn new(client: Client, prefix: &str) -> Self {
        Self {
            client,
            prefix: prefix.to_string(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

impl KvStore for RedisStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.client.get_connection()?;
        Ok(conn.get(self.namespaced(key))?)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.client.get_connection()?;
        conn.set::<_, _, ()>(self.namespaced(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.client.get_connection()?;
        conn.del::<_, ()>(self.namespaced(key))?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut conn = self.client.get_connection()?;
        let keys: Vec<String> = conn.keys(format!("{}:*", self.prefix))?;
        if !keys.is_empty() {
            conn.del::<_, ()>(keys)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_malformed_collections_read_as_empty() {
        let store = MemoryStore::default();
        let empty: Collection<serde_json::Value> = read_collection(&store, TASKS_KEY).unwrap();
        assert!(empty.is_empty());

        store.set(TASKS_KEY, "{not json").unwrap();
        let empty: Collection<serde_json::Value> = read_collection(&store, TASKS_KEY).unwrap();
        assert!(empty.is_empty());

        store.set(TASKS_KEY, r#"{"tasks": []}"#).unwrap();
        let empty: Collection<serde_json::Value> = read_collection(&store, TASKS_KEY).unwrap();
        assert!(empty.is_empty());
    }

    #[derive(Deserialize, Serialize, Debug, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn undecodable_elements_are_hidden_from_records() {
        let store = MemoryStore::default();
        store.set("items", &json!([{"id": 1}, {"name": "x"}, {"id": 3}]).to_string()).unwrap();

        let items: Collection<Item> = read_collection(&store, "items").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items.opaque().collect::<Vec<_>>(), vec![&json!({"name": "x"})]);
        assert_eq!(items.into_records(), vec![Item { id: 1 }, Item { id: 3 }]);
    }

    #[test]
    fn undecodable_elements_survive_a_write() {
        let store = MemoryStore::default();
        store
            .set("items", &json!([{"id": 1}, {"name": "x"}, {"id": "three"}]).to_string())
            .unwrap();

        let mut items: Collection<Item> = read_collection(&store, "items").unwrap();
        items.retain(|item| item.id != 1);
        items.push(Item { id: 4 });
        for item in items.records_mut() {
            item.id += 10;
        }
        write_collection(&store, "items", &items).unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&store.get("items").unwrap().unwrap()).unwrap();
        assert_eq!(stored, json!([{"name": "x"}, {"id": "three"}, {"id": 14}]));
    }

    #[test]
    fn malformed_record_reads_as_none() {
        let store = MemoryStore::default();
        store.set(SESSION_KEY, "not json").unwrap();
        let record: Option<serde_json::Value> = read_record(&store, SESSION_KEY).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn file_store_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        store.set(USERS_KEY, "[]").unwrap();
        store.set(TASKS_KEY, "[1]").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(TASKS_KEY).unwrap().as_deref(), Some("[1]"));

        reopened.remove(TASKS_KEY).unwrap();
        reopened.remove(TASKS_KEY).unwrap();
        assert_eq!(reopened.get(TASKS_KEY).unwrap(), None);

        reopened.clear().unwrap();
        assert_eq!(reopened.get(USERS_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
    }
}
