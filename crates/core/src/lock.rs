//! Per-patient single-flight lock.
//!
//! Archive and restore commits on the same patient are serialised; operations on different
//! patients run in parallel. Probes and consistency checks never take the lock.
//!
//! The lock is keyed by patient id only, so it needs no knowledge of the record graph.
//! Callers resolve the patient first and hold the returned guard for the whole operation.

use mpr_uuid::RecordId;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct PatientLocks {
    held: Mutex<HashSet<RecordId>>,
    released: Condvar,
}

impl PatientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until no other guard for `patient_id` is alive.
    pub fn acquire(&self, patient_id: RecordId) -> PatientLockGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&patient_id) {
            tracing::trace!("waiting for patient lock {}", patient_id);
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(patient_id);
        PatientLockGuard {
            locks: self,
            patient_id,
        }
    }

    /// Non-blocking variant of [`acquire`](Self::acquire).
    pub fn try_acquire(&self, patient_id: RecordId) -> Option<PatientLockGuard<'_>> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(patient_id) {
            return None;
        }
        Some(PatientLockGuard {
            locks: self,
            patient_id,
        })
    }

    pub fn is_held(&self, patient_id: RecordId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&patient_id)
    }

    fn release(&self, patient_id: RecordId) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&patient_id);
        self.released.notify_all();
    }
}

/// Releases the patient lock when dropped, including on early return or panic.
#[derive(Debug)]
pub struct PatientLockGuard<'a> {
    locks: &'a PatientLocks,
    patient_id: RecordId,
}

impl PatientLockGuard<'_> {
    pub fn patient_id(&self) -> RecordId {
        self.patient_id
    }
}

impl Drop for PatientLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(self.patient_id);
    }
}
