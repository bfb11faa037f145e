/// In-process metadata store.
///
/// Backs the CLI and the tests. Ingestion writes records in; the pipeline and
/// modules only ever read. A single `RwLock` is enough because writes are
/// rare (one per ingested file) and reads are short clones.
use crate::model::FileRecord;
use crate::provider::{FileMetadataProvider, ProviderError};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, FileRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, returning its `object_id`.
    pub fn insert(&self, record: FileRecord) -> String {
        let id = record.object_id.clone();
        self.records.write().insert(id.clone(), record);
        id
    }

    /// Remove a record. Returns `true` if it was present.
    pub fn remove(&self, object_id: &str) -> bool {
        self.records.write().remove(object_id).is_some()
    }

    pub fn contains(&self, object_id: &str) -> bool {
        self.records.read().contains_key(object_id)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// All stored ids, sorted for deterministic iteration.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}

impl FileMetadataProvider for InMemoryStore {
    fn get_file_metadata(&self, object_id: &str) -> Result<FileRecord, ProviderError> {
        self.records
            .read()
            .get(object_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(object_id.to_owned()))
    }
}
