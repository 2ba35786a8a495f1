//! In-memory persistence adapter.

use super::{PersistenceAdapter, StoreError, StoreResult};
use crate::entity::{EntityRef, Record, RecordPatch};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

/// Pending injected failures.
#[derive(Debug, Default)]
struct FaultPlan {
    /// Number of successful updates still allowed before the next one fails.
    updates_before_failure: Option<usize>,
    fail_list_children: bool,
}

/// Map-backed adapter. Keys are ordered so `list_children` is deterministic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<EntityRef, Record>>,
    faults: Mutex<FaultPlan>,
    update_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        for record in records {
            store.put(record);
        }
        store
    }

    /// Inserts a new record.
    pub fn insert(&self, record: Record) -> StoreResult<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let key = record.entity_ref();
        if records.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        records.insert(key, record);
        Ok(())
    }

    /// Inserts or replaces a record without any checks. Test setup helper for
    /// building states the coordinators would never produce.
    pub fn put(&self, record: Record) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.entity_ref(), record);
    }

    pub fn all(&self) -> Vec<Record> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total `update` calls received, successful or not.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Lets `successes` further updates through, then fails the next one (once).
    pub fn fail_update_after(&self, successes: usize) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .updates_before_failure = Some(successes);
    }

    /// Fails every `list_children` call until cleared.
    pub fn fail_list_children(&self, fail: bool) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_list_children = fail;
    }

    fn take_update_fault(&self) -> bool {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        match faults.updates_before_failure {
            Some(0) => {
                faults.updates_before_failure = None;
                true
            }
            Some(n) => {
                faults.updates_before_failure = Some(n - 1);
                false
            }
            None => false,
        }
    }
}

impl PersistenceAdapter for InMemoryStore {
    fn get(&self, entity: EntityRef) -> StoreResult<Record> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&entity)
            .cloned()
            .ok_or(StoreError::NotFound(entity))
    }

    fn update(&self, entity: EntityRef, patch: &RecordPatch) -> StoreResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_update_fault() {
            return Err(StoreError::Unavailable(format!(
                "injected failure writing {entity}"
            )));
        }

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .get_mut(&entity)
            .ok_or(StoreError::NotFound(entity))?;
        record.apply(patch, Utc::now());
        Ok(())
    }

    fn list_children(&self, parent: EntityRef) -> StoreResult<Vec<Record>> {
        if self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_list_children
        {
            return Err(StoreError::Unavailable(format!(
                "injected failure listing children of {parent}"
            )));
        }

        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .values()
            .filter(|record| record.parent() == Some(parent))
            .cloned()
            .collect())
    }
}
