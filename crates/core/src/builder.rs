//! Construction of complete patient subtrees.
//!
//! Creating records is not part of the archival engine, but every caller that needs a
//! realistic patient (seeding a store, tests, demos) needs the same shape: one patient,
//! exactly one medical history, and any number of representatives, consultations and
//! prescriptions, all active.

use crate::entity::{
    Consultation, DisplayName, EntityRef, EntityType, MedicalHistory, Patient, Prescription,
    Record, RecordMeta, Representative,
};
use crate::error::ArchivalResult;
use mpr_uuid::RecordId;

#[derive(Debug)]
struct PlannedPrescription {
    medication: Option<String>,
    consultation: Option<usize>,
}

#[derive(Debug)]
pub struct PatientTreeBuilder {
    name: DisplayName,
    representatives: Vec<DisplayName>,
    consultations: Vec<Option<String>>,
    prescriptions: Vec<PlannedPrescription>,
}

impl PatientTreeBuilder {
    pub fn named(name: impl AsRef<str>) -> ArchivalResult<Self> {
        Ok(Self {
            name: DisplayName::new(name)?,
            representatives: Vec::new(),
            consultations: Vec::new(),
            prescriptions: Vec::new(),
        })
    }

    pub fn representative(mut self, name: impl AsRef<str>) -> ArchivalResult<Self> {
        self.representatives.push(DisplayName::new(name)?);
        Ok(self)
    }

    pub fn consultation(mut self, reason: impl Into<String>) -> Self {
        self.consultations.push(Some(reason.into()));
        self
    }

    /// A prescription issued outside any consultation.
    pub fn prescription(mut self, medication: impl Into<String>) -> Self {
        self.prescriptions.push(PlannedPrescription {
            medication: Some(medication.into()),
            consultation: None,
        });
        self
    }

    /// A prescription linked to the `consultation`-th consultation added so far.
    /// Out-of-range indices leave the prescription unlinked.
    pub fn prescription_for(mut self, consultation: usize, medication: impl Into<String>) -> Self {
        self.prescriptions.push(PlannedPrescription {
            medication: Some(medication.into()),
            consultation: Some(consultation),
        });
        self
    }

    pub fn build(self) -> PatientTree {
        let patient_id = RecordId::new();
        let history_id = RecordId::new();
        let mut records = vec![
            Record::Patient(Patient {
                meta: RecordMeta::new(patient_id),
                name: self.name,
            }),
            Record::MedicalHistory(MedicalHistory {
                meta: RecordMeta::new(history_id),
                patient_id,
            }),
        ];

        for name in self.representatives {
            records.push(Record::Representative(Representative {
                meta: RecordMeta::new(RecordId::new()),
                patient_id,
                name,
            }));
        }

        let mut consultation_ids = Vec::with_capacity(self.consultations.len());
        for reason in self.consultations {
            let id = RecordId::new();
            consultation_ids.push(id);
            records.push(Record::Consultation(Consultation {
                meta: RecordMeta::new(id),
                medical_history_id: history_id,
                reason,
            }));
        }

        for planned in self.prescriptions {
            records.push(Record::Prescription(Prescription {
                meta: RecordMeta::new(RecordId::new()),
                medical_history_id: history_id,
                consultation_id: planned
                    .consultation
                    .and_then(|idx| consultation_ids.get(idx).copied()),
                medication: planned.medication,
            }));
        }

        PatientTree {
            patient_id,
            history_id,
            records,
        }
    }
}

/// Records produced by [`PatientTreeBuilder::build`], patient first, then the medical
/// history, representatives, consultations and prescriptions.
#[derive(Clone, Debug)]
pub struct PatientTree {
    patient_id: RecordId,
    history_id: RecordId,
    records: Vec<Record>,
}

impl PatientTree {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn patient_id(&self) -> RecordId {
        self.patient_id
    }

    pub fn patient_ref(&self) -> EntityRef {
        EntityRef::patient(self.patient_id)
    }

    pub fn history_ref(&self) -> EntityRef {
        EntityRef::new(EntityType::MedicalHistory, self.history_id)
    }

    pub fn representative_refs(&self) -> Vec<EntityRef> {
        self.refs_of(EntityType::Representative)
    }

    pub fn consultation_refs(&self) -> Vec<EntityRef> {
        self.refs_of(EntityType::Consultation)
    }

    pub fn prescription_refs(&self) -> Vec<EntityRef> {
        self.refs_of(EntityType::Prescription)
    }

    fn refs_of(&self, entity_type: EntityType) -> Vec<EntityRef> {
        self.records
            .iter()
            .filter(|r| r.entity_type() == entity_type)
            .map(Record::entity_ref)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_history_and_links_children() {
        let tree = PatientTreeBuilder::named("Ada Lovelace")
            .unwrap()
            .representative("Grace Hopper")
            .unwrap()
            .consultation("Annual review")
            .prescription_for(0, "Salbutamol")
            .prescription("Vitamin D")
            .build();

        assert_eq!(tree.records().len(), 6);
        assert_eq!(tree.records()[0].entity_ref(), tree.patient_ref());
        assert_eq!(tree.records()[1].entity_ref(), tree.history_ref());
        assert!(tree.records().iter().all(Record::is_active));

        for record in &tree.records()[2..] {
            let expected_parent = match record.entity_type() {
                EntityType::Representative => tree.patient_ref(),
                _ => tree.history_ref(),
            };
            assert_eq!(record.parent(), Some(expected_parent));
        }

        let linked: Vec<_> = tree
            .records()
            .iter()
            .flat_map(Record::references)
            .collect();
        assert_eq!(linked, tree.consultation_refs());
    }

    #[test]
    fn out_of_range_consultation_leaves_prescription_unlinked() {
        let tree = PatientTreeBuilder::named("Ada")
            .unwrap()
            .prescription_for(3, "Paracetamol")
            .build();
        assert!(tree.records()[2].references().is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(PatientTreeBuilder::named(" ").is_err());
        assert!(PatientTreeBuilder::named("Ada")
            .unwrap()
            .representative("")
            .is_err());
    }
}
