//! Archival service.
//!
//! The one entry point every caller (CLI, REST handlers, tests) goes through. It owns the
//! persistence adapter and the per-patient lock table and hands borrowed views of them to
//! the coordinators for the duration of a call.

use crate::archive::{ArchiveCoordinator, ArchiveOutcome};
use crate::consistency::{self, Violation};
use crate::entity::{EntityRef, Record};
use crate::error::{ArchivalError, ArchivalResult};
use crate::lock::PatientLocks;
use crate::restore::{ProbeOutcome, RestoreCoordinator, RestoreOutcome};
use crate::snapshot::SubtreeSnapshot;
use crate::store::PersistenceAdapter;
use mpr_uuid::RecordId;
use std::sync::Arc;

/// Cheap to clone; clones share the store and the lock table.
#[derive(Clone)]
pub struct ArchivalService {
    store: Arc<dyn PersistenceAdapter>,
    locks: Arc<PatientLocks>,
}

impl ArchivalService {
    pub fn new(store: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            store,
            locks: Arc::new(PatientLocks::new()),
        }
    }

    /// Shares an existing lock table, e.g. between two services over the same store.
    pub fn with_locks(store: Arc<dyn PersistenceAdapter>, locks: Arc<PatientLocks>) -> Self {
        Self { store, locks }
    }

    pub fn archive(&self, target: EntityRef) -> ArchivalResult<ArchiveOutcome> {
        ArchiveCoordinator::new(self.store.as_ref(), &self.locks).archive(target)
    }

    pub fn probe(&self, target: EntityRef) -> ArchivalResult<ProbeOutcome> {
        RestoreCoordinator::new(self.store.as_ref(), &self.locks).probe(target)
    }

    pub fn commit(&self, target: EntityRef, cascade: bool) -> ArchivalResult<RestoreOutcome> {
        RestoreCoordinator::new(self.store.as_ref(), &self.locks).commit(target, cascade)
    }

    /// Runs the consistency checker over one patient's record. Takes no lock.
    pub fn check(&self, patient_id: RecordId) -> ArchivalResult<Vec<Violation>> {
        let snapshot = self.snapshot(patient_id)?;
        Ok(consistency::check(&snapshot))
    }

    pub fn snapshot(&self, patient_id: RecordId) -> ArchivalResult<SubtreeSnapshot> {
        SubtreeSnapshot::load_patient(self.store.as_ref(), patient_id)
    }

    pub fn get(&self, entity: EntityRef) -> ArchivalResult<Record> {
        self.store.get(entity).map_err(ArchivalError::lookup_failed)
    }
}

impl std::fmt::Debug for ArchivalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchivalService")
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}
