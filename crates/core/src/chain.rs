//! Ancestor chain resolution.

use crate::entity::{EntityRef, Record};
use crate::error::{ArchivalError, ArchivalResult};
use crate::graph::ArchivalGraph;
use crate::store::{PersistenceAdapter, StoreError};
use mpr_uuid::RecordId;

/// A record together with every owning ancestor up to the patient.
#[derive(Clone, Debug)]
pub struct AncestorChain {
    target: Record,
    /// Nearest first; the last element is the patient unless the target is the patient.
    ancestors: Vec<Record>,
}

impl AncestorChain {
    /// Reads the target and walks ownership keys upward.
    ///
    /// A missing target is [`ArchivalError::NotFound`]. A missing ancestor means a stored
    /// parent key dangles; that is reported as [`ArchivalError::InvalidInput`] naming both
    /// records and is not retryable.
    pub fn resolve(store: &dyn PersistenceAdapter, target: EntityRef) -> ArchivalResult<Self> {
        let target = store.get(target).map_err(ArchivalError::lookup_failed)?;
        let mut ancestors = Vec::with_capacity(ArchivalGraph::depth(target.entity_type()));

        let mut current = target.parent();
        let mut child = target.entity_ref();
        while let Some(parent) = current {
            let record = store.get(parent).map_err(|e| match e {
                StoreError::NotFound(_) => ArchivalError::InvalidInput(format!(
                    "{child} points at missing owner {parent}"
                )),
                other => ArchivalError::lookup_failed(other),
            })?;
            child = record.entity_ref();
            current = record.parent();
            ancestors.push(record);
        }

        Ok(Self { target, ancestors })
    }

    pub fn target(&self) -> &Record {
        &self.target
    }

    /// Ancestors, nearest first.
    pub fn ancestors(&self) -> &[Record] {
        &self.ancestors
    }

    /// The patient record at the top of the chain (the target itself for a patient).
    pub fn root(&self) -> &Record {
        self.ancestors.last().unwrap_or(&self.target)
    }

    pub fn patient_id(&self) -> RecordId {
        self.root().id()
    }

    pub fn ancestors_active(&self) -> bool {
        self.ancestors.iter().all(Record::is_active)
    }

    /// The inactive ancestor closest to the patient, i.e. the record that must be restored
    /// before anything beneath it can become active again.
    pub fn topmost_inactive_ancestor(&self) -> Option<&Record> {
        self.ancestors.iter().rev().find(|r| !r.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PatientTreeBuilder;
    use crate::entity::{EntityType, RecordPatch};
    use crate::store::InMemoryStore;

    fn store_with_tree() -> (InMemoryStore, crate::builder::PatientTree) {
        let tree = PatientTreeBuilder::named("Ada")
            .unwrap()
            .consultation("Review")
            .prescription_for(0, "Salbutamol")
            .build();
        let store = InMemoryStore::with_records(tree.records().iter().cloned());
        (store, tree)
    }

    #[test]
    fn prescription_chain_goes_through_history_only() {
        let (store, tree) = store_with_tree();
        let chain = AncestorChain::resolve(&store, tree.prescription_refs()[0]).unwrap();

        let kinds: Vec<_> = chain.ancestors().iter().map(Record::entity_type).collect();
        assert_eq!(kinds, vec![EntityType::MedicalHistory, EntityType::Patient]);
        assert_eq!(chain.patient_id(), tree.patient_id());
        assert!(chain.ancestors_active());
        assert!(chain.topmost_inactive_ancestor().is_none());
    }

    #[test]
    fn patient_chain_is_just_the_target() {
        let (store, tree) = store_with_tree();
        let chain = AncestorChain::resolve(&store, tree.patient_ref()).unwrap();
        assert!(chain.ancestors().is_empty());
        assert_eq!(chain.root().entity_ref(), tree.patient_ref());
    }

    #[test]
    fn topmost_inactive_ancestor_prefers_the_patient() {
        let (store, tree) = store_with_tree();
        store
            .update(tree.history_ref(), &RecordPatch::set_active(false))
            .unwrap();
        let chain = AncestorChain::resolve(&store, tree.consultation_refs()[0]).unwrap();
        assert_eq!(
            chain.topmost_inactive_ancestor().map(Record::entity_ref),
            Some(tree.history_ref())
        );

        store
            .update(tree.patient_ref(), &RecordPatch::set_active(false))
            .unwrap();
        let chain = AncestorChain::resolve(&store, tree.consultation_refs()[0]).unwrap();
        assert_eq!(
            chain.topmost_inactive_ancestor().map(Record::entity_ref),
            Some(tree.patient_ref())
        );
    }

    #[test]
    fn missing_target_is_not_found() {
        let (store, _) = store_with_tree();
        let missing = EntityRef::new(EntityType::Consultation, RecordId::new());
        assert!(matches!(
            AncestorChain::resolve(&store, missing),
            Err(ArchivalError::NotFound(e)) if e == missing
        ));
    }

    #[test]
    fn dangling_owner_is_reported() {
        let tree = PatientTreeBuilder::named("Ada").unwrap().consultation("A").build();
        let store = InMemoryStore::with_records(
            tree.records()
                .iter()
                .filter(|r| r.entity_type() != EntityType::MedicalHistory)
                .cloned(),
        );
        let err = AncestorChain::resolve(&store, tree.consultation_refs()[0]).unwrap_err();
        assert!(matches!(err, ArchivalError::InvalidInput(msg) if msg.contains("missing owner")));
    }
}
