//! Archive (soft delete).
//!
//! Archiving a record sets `is_active = false` on it and on everything it owns along the
//! graph's cascade edges, breadth-first from the target down. Ancestors are never touched.
//! For a patient that is the whole record; for a medical history it is its consultations and
//! prescriptions; for any leaf it is the single row.

use crate::cascade::apply_activation;
use crate::chain::AncestorChain;
use crate::entity::EntityRef;
use crate::error::{ArchivalError, ArchivalResult};
use crate::lock::PatientLocks;
use crate::snapshot::SubtreeSnapshot;
use crate::store::PersistenceAdapter;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveOutcome {
    /// Rows that changed from active to archived. Zero on a repeated call.
    pub archived_count: usize,
}

pub struct ArchiveCoordinator<'a> {
    store: &'a dyn PersistenceAdapter,
    locks: &'a PatientLocks,
}

impl<'a> ArchiveCoordinator<'a> {
    pub fn new(store: &'a dyn PersistenceAdapter, locks: &'a PatientLocks) -> Self {
        Self { store, locks }
    }

    pub fn archive(&self, target: EntityRef) -> ArchivalResult<ArchiveOutcome> {
        let patient_id = AncestorChain::resolve(self.store, target)?.patient_id();
        let _guard = self.locks.acquire(patient_id);

        // Re-read under the lock; the unlocked read only located the patient.
        let record = self
            .store
            .get(target)
            .map_err(ArchivalError::lookup_failed)?;
        let subtree = SubtreeSnapshot::load(self.store, record)?;
        let archived_count = apply_activation(self.store, subtree.records(), false)?;

        tracing::info!(
            "archived {} ({} of {} row(s) changed)",
            target,
            archived_count,
            subtree.len()
        );
        Ok(ArchiveOutcome { archived_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{PatientTree, PatientTreeBuilder};
    use crate::entity::{EntityType, Record};
    use crate::store::InMemoryStore;
    use mpr_uuid::RecordId;

    fn scenario() -> (InMemoryStore, PatientTree) {
        let tree = PatientTreeBuilder::named("Ada Lovelace")
            .unwrap()
            .representative("Grace Hopper")
            .unwrap()
            .consultation("C1")
            .consultation("C2")
            .build();
        let store = InMemoryStore::with_records(tree.records().iter().cloned());
        (store, tree)
    }

    fn is_active(store: &InMemoryStore, entity: EntityRef) -> bool {
        store.get(entity).unwrap().is_active()
    }

    #[test]
    fn archiving_patient_cascades_to_whole_record() {
        let (store, tree) = scenario();
        let locks = PatientLocks::new();
        let coordinator = ArchiveCoordinator::new(&store, &locks);

        let outcome = coordinator.archive(tree.patient_ref()).unwrap();
        assert_eq!(outcome.archived_count, 5);
        assert!(store.all().iter().all(|r| !r.is_active()));
        assert!(!locks.is_held(tree.patient_id()));
    }

    #[test]
    fn archiving_patient_writes_root_first() {
        let (store, tree) = scenario();
        let locks = PatientLocks::new();
        // Only the first write succeeds.
        store.fail_update_after(1);

        let err = ArchiveCoordinator::new(&store, &locks)
            .archive(tree.patient_ref())
            .unwrap_err();
        assert_eq!(err.rows_changed(), 1);
        assert!(!is_active(&store, tree.patient_ref()));
        assert!(is_active(&store, tree.history_ref()));
    }

    #[test]
    fn repeated_archive_changes_nothing() {
        let (store, tree) = scenario();
        let locks = PatientLocks::new();
        let coordinator = ArchiveCoordinator::new(&store, &locks);

        coordinator.archive(tree.patient_ref()).unwrap();
        let calls = store.update_calls();
        let again = coordinator.archive(tree.patient_ref()).unwrap();
        assert_eq!(again.archived_count, 0);
        assert_eq!(store.update_calls(), calls);
    }

    #[test]
    fn archiving_leaf_touches_only_the_leaf() {
        let (store, tree) = scenario();
        let locks = PatientLocks::new();
        let c1 = tree.consultation_refs()[0];

        let outcome = ArchiveCoordinator::new(&store, &locks).archive(c1).unwrap();
        assert_eq!(outcome.archived_count, 1);
        assert!(!is_active(&store, c1));
        let still_active = store.all().iter().filter(|r| r.is_active()).count();
        assert_eq!(still_active, 4);
    }

    #[test]
    fn archiving_history_cascades_below_it_only() {
        let tree = PatientTreeBuilder::named("Ada")
            .unwrap()
            .representative("Grace")
            .unwrap()
            .consultation("C1")
            .prescription_for(0, "Salbutamol")
            .build();
        let store = InMemoryStore::with_records(tree.records().iter().cloned());
        let locks = PatientLocks::new();

        let outcome = ArchiveCoordinator::new(&store, &locks)
            .archive(tree.history_ref())
            .unwrap();
        assert_eq!(outcome.archived_count, 3);
        assert!(is_active(&store, tree.patient_ref()));
        assert!(is_active(&store, tree.representative_refs()[0]));
    }

    #[test]
    fn archiving_consultation_leaves_linked_prescription_active() {
        let tree = PatientTreeBuilder::named("Ada")
            .unwrap()
            .consultation("C1")
            .prescription_for(0, "Salbutamol")
            .build();
        let store = InMemoryStore::with_records(tree.records().iter().cloned());
        let locks = PatientLocks::new();

        ArchiveCoordinator::new(&store, &locks)
            .archive(tree.consultation_refs()[0])
            .unwrap();
        assert!(is_active(&store, tree.prescription_refs()[0]));
    }

    #[test]
    fn archiving_missing_record_is_not_found() {
        let (store, _) = scenario();
        let locks = PatientLocks::new();
        let missing = EntityRef::new(EntityType::Representative, RecordId::new());

        let err = ArchiveCoordinator::new(&store, &locks)
            .archive(missing)
            .unwrap_err();
        assert!(matches!(err, ArchivalError::NotFound(e) if e == missing));
        assert_eq!(store.update_calls(), 0);
    }

    #[test]
    fn retry_after_partial_archive_converges() {
        let (store, tree) = scenario();
        let locks = PatientLocks::new();
        let coordinator = ArchiveCoordinator::new(&store, &locks);
        store.fail_update_after(3);

        let err = coordinator.archive(tree.patient_ref()).unwrap_err();
        assert!(err.is_retryable());
        let retried = coordinator.archive(tree.patient_ref()).unwrap();
        assert_eq!(err.rows_changed() + retried.archived_count, 5);
        assert!(store.all().iter().all(|r: &Record| !r.is_active()));
    }
}
