use super::{load_json, save_json, KeyValueBackend, StorageError};
use crate::models::{DiscoveryRun, NewDiscoveryRun};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub(crate) const RUNS_KEY: &str = "chem_discovery_runs";

const COLLECTION_VERSION: u32 = 1;
const TIMESTAMP_INDEX: &str = "timestamp";

/// The persisted collection. Stored as a single entry so every operation is
/// one read plus at most one write.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct RunCollection {
    version: u32,
    next_id: u64,
    /// Secondary indexes created with the collection.
    indexes: Vec<String>,
    records: BTreeMap<u64, DiscoveryRun>,
    /// (timestamp, id), ascending.
    #[serde(default)]
    by_timestamp: BTreeSet<(i64, u64)>,
}

impl RunCollection {
    fn create() -> Self {
        Self {
            version: COLLECTION_VERSION,
            next_id: 1,
            indexes: vec![TIMESTAMP_INDEX.to_string()],
            records: BTreeMap::new(),
            by_timestamp: BTreeSet::new(),
        }
    }

    fn has_timestamp_index(&self) -> bool {
        self.indexes.iter().any(|i| i == TIMESTAMP_INDEX)
    }
}

/// Durable store of past discovery runs, keyed by an auto-incrementing id
/// and indexed by timestamp.
#[derive(Clone)]
pub(crate) struct RunStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl RunStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    fn load(&self) -> Result<Option<RunCollection>, StorageError> {
        load_json(self.backend.as_ref(), RUNS_KEY)
    }

    fn load_or_create(&self) -> Result<RunCollection, StorageError> {
        Ok(self.load()?.unwrap_or_else(RunCollection::create))
    }

    fn write(&self, collection: &RunCollection) -> Result<(), StorageError> {
        save_json(self.backend.as_ref(), RUNS_KEY, collection)
    }

    /// Opens the collection, creating it and its timestamp index when absent.
    /// Safe to call any number of times.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        if self.load()?.is_some() {
            return Ok(());
        }
        leptos::logging::log!("[store] creating run collection");
        self.write(&RunCollection::create())
    }

    /// Inserts a new run and returns it with its assigned id.
    pub async fn save(&self, run: NewDiscoveryRun) -> Result<DiscoveryRun, StorageError> {
        let mut collection = self.load_or_create()?;
        let id = collection.next_id;
        collection.next_id += 1;

        let stored = DiscoveryRun::from_new(id, run);
        if collection.has_timestamp_index() {
            collection.by_timestamp.insert((stored.timestamp, id));
        }
        collection.records.insert(id, stored.clone());

        self.write(&collection)?;
        Ok(stored)
    }

    /// Every stored run, in primary-key order.
    pub async fn get_all(&self) -> Result<Vec<DiscoveryRun>, StorageError> {
        Ok(self
            .load()?
            .map(|c| c.records.into_values().collect())
            .unwrap_or_default())
    }

    /// Every stored run, newest first, read through the timestamp index.
    pub async fn list_newest_first(&self) -> Result<Vec<DiscoveryRun>, StorageError> {
        let Some(mut collection) = self.load()? else {
            return Ok(Vec::new());
        };
        if !collection.has_timestamp_index() {
            let mut runs: Vec<DiscoveryRun> = collection.records.into_values().collect();
            sort_newest_first(&mut runs);
            return Ok(runs);
        }
        Ok(collection
            .by_timestamp
            .iter()
            .rev()
            .filter_map(|(_, id)| collection.records.remove(id))
            .collect())
    }

    pub async fn get_one(&self, id: u64) -> Result<Option<DiscoveryRun>, StorageError> {
        Ok(self.load()?.and_then(|mut c| c.records.remove(&id)))
    }

    /// Removes one run. Unknown ids are not an error and leave the store
    /// untouched.
    pub async fn delete(&self, id: u64) -> Result<(), StorageError> {
        let Some(mut collection) = self.load()? else {
            return Ok(());
        };
        let Some(removed) = collection.records.remove(&id) else {
            return Ok(());
        };
        collection.by_timestamp.remove(&(removed.timestamp, id));
        self.write(&collection)
    }

    /// Removes every run. Ids are not reused afterwards.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut collection = self.load_or_create()?;
        collection.records.clear();
        collection.by_timestamp.clear();
        self.write(&collection)
    }
}

/// Timestamp descending; the later insert wins a tie.
pub(crate) fn sort_newest_first(runs: &mut [DiscoveryRun]) {
    runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}
