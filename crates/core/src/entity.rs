//! Practice record entities.
//!
//! The five record kinds form a closed set. Each variant carries the shared base
//! ([`RecordMeta`]: id, active flag, timestamps) plus the keys that link it into the
//! archival graph and the few fields needed to describe it to a user.
//!
//! Relationships are not encoded here by hand: [`Record::parent`] asks the
//! [`ArchivalGraph`](crate::graph::ArchivalGraph) which key names the owning record.

use crate::error::{ArchivalError, ArchivalResult};
use crate::graph::{ArchivalGraph, ParentKey};
use chrono::{DateTime, Utc};
use mpr_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of practice record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    Patient,
    MedicalHistory,
    Representative,
    Consultation,
    Prescription,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Patient,
        EntityType::MedicalHistory,
        EntityType::Representative,
        EntityType::Consultation,
        EntityType::Prescription,
    ];

    /// External (kebab-case) name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Patient => "patient",
            EntityType::MedicalHistory => "medical-history",
            EntityType::Representative => "representative",
            EntityType::Consultation => "consultation",
            EntityType::Prescription => "prescription",
        }
    }

    /// Directory name used by file-backed stores.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::Patient => "patients",
            EntityType::MedicalHistory => "medical_histories",
            EntityType::Representative => "representatives",
            EntityType::Consultation => "consultations",
            EntityType::Prescription => "prescriptions",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ArchivalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| {
                ArchivalError::InvalidInput(format!(
                    "unknown entity type '{s}' (expected one of: patient, medical-history, representative, consultation, prescription)"
                ))
            })
    }
}

/// Typed address of a single record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub id: RecordId,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, id: RecordId) -> Self {
        Self { entity_type, id }
    }

    pub fn patient(id: RecordId) -> Self {
        Self::new(EntityType::Patient, id)
    }

    /// Builds a reference from untrusted strings (CLI arguments, REST path segments).
    pub fn parse(entity_type: &str, id: &str) -> ArchivalResult<Self> {
        Ok(Self::new(entity_type.parse()?, RecordId::parse(id)?))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity_type, self.id)
    }
}

/// Non-empty, trimmed display text (patient and representative names).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(input: impl AsRef<str>) -> ArchivalResult<Self> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ArchivalError::InvalidInput("name cannot be empty".into()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DisplayName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DisplayName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DisplayName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Fields shared by every record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordMeta {
    pub id: RecordId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    /// Metadata for a freshly created record. Records are created active.
    pub fn new(id: RecordId) -> Self {
        let now = Utc::now();
        Self {
            id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patient {
    pub meta: RecordMeta,
    pub name: DisplayName,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicalHistory {
    pub meta: RecordMeta,
    pub patient_id: RecordId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Representative {
    pub meta: RecordMeta,
    pub patient_id: RecordId,
    pub name: DisplayName,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consultation {
    pub meta: RecordMeta,
    pub medical_history_id: RecordId,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prescription {
    pub meta: RecordMeta,
    pub medical_history_id: RecordId,
    /// Optional link to the consultation the prescription was issued in. Not an ownership edge.
    pub consultation_id: Option<RecordId>,
    pub medication: Option<String>,
}

/// A stored practice record of any kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Patient(Patient),
    MedicalHistory(MedicalHistory),
    Representative(Representative),
    Consultation(Consultation),
    Prescription(Prescription),
}

impl Record {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Record::Patient(_) => EntityType::Patient,
            Record::MedicalHistory(_) => EntityType::MedicalHistory,
            Record::Representative(_) => EntityType::Representative,
            Record::Consultation(_) => EntityType::Consultation,
            Record::Prescription(_) => EntityType::Prescription,
        }
    }

    pub fn meta(&self) -> &RecordMeta {
        match self {
            Record::Patient(r) => &r.meta,
            Record::MedicalHistory(r) => &r.meta,
            Record::Representative(r) => &r.meta,
            Record::Consultation(r) => &r.meta,
            Record::Prescription(r) => &r.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut RecordMeta {
        match self {
            Record::Patient(r) => &mut r.meta,
            Record::MedicalHistory(r) => &mut r.meta,
            Record::Representative(r) => &mut r.meta,
            Record::Consultation(r) => &mut r.meta,
            Record::Prescription(r) => &mut r.meta,
        }
    }

    pub fn id(&self) -> RecordId {
        self.meta().id
    }

    pub fn is_active(&self) -> bool {
        self.meta().is_active
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type(), self.id())
    }

    /// Value of a linking key, if this record kind carries it and it is set.
    pub fn key(&self, key: ParentKey) -> Option<RecordId> {
        match (self, key) {
            (Record::MedicalHistory(r), ParentKey::PatientId) => Some(r.patient_id),
            (Record::Representative(r), ParentKey::PatientId) => Some(r.patient_id),
            (Record::Consultation(r), ParentKey::MedicalHistoryId) => Some(r.medical_history_id),
            (Record::Prescription(r), ParentKey::MedicalHistoryId) => Some(r.medical_history_id),
            (Record::Prescription(r), ParentKey::ConsultationId) => r.consultation_id,
            _ => None,
        }
    }

    /// The owning record, following the graph's ownership edge. `None` for the root.
    pub fn parent(&self) -> Option<EntityRef> {
        let edge = ArchivalGraph::owner_edge(self.entity_type())?;
        self.key(edge.parent_key)
            .map(|id| EntityRef::new(edge.parent, id))
    }

    /// Non-owning links (currently only prescription → consultation).
    pub fn references(&self) -> Vec<EntityRef> {
        ArchivalGraph::reference_edges(self.entity_type())
            .filter_map(|edge| {
                self.key(edge.parent_key)
                    .map(|id| EntityRef::new(edge.parent, id))
            })
            .collect()
    }

    /// Human-readable label used when asking a user to confirm an escalation.
    pub fn display_name(&self) -> String {
        match self {
            Record::Patient(r) => r.name.to_string(),
            Record::MedicalHistory(_) => "Medical history".to_string(),
            Record::Representative(r) => r.name.to_string(),
            Record::Consultation(r) => match &r.reason {
                Some(reason) => format!("Consultation: {reason}"),
                None => "Consultation".to_string(),
            },
            Record::Prescription(r) => match &r.medication {
                Some(medication) => format!("Prescription: {medication}"),
                None => "Prescription".to_string(),
            },
        }
    }

    /// Applies `patch` and bumps `updated_at`. Returns whether anything changed.
    pub fn apply(&mut self, patch: &RecordPatch, now: DateTime<Utc>) -> bool {
        let meta = self.meta_mut();
        let mut changed = false;
        if let Some(active) = patch.is_active {
            if meta.is_active != active {
                meta.is_active = active;
                changed = true;
            }
        }
        if changed {
            meta.updated_at = now;
        }
        changed
    }
}

/// Field changes sent through [`PersistenceAdapter::update`](crate::store::PersistenceAdapter::update).
///
/// Values are absolute, never deltas, so re-sending a patch is harmless.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub is_active: Option<bool>,
}

impl RecordPatch {
    pub fn set_active(active: bool) -> Self {
        Self {
            is_active: Some(active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prescription(consultation_id: Option<RecordId>) -> (Record, RecordId) {
        let history = RecordId::new();
        let record = Record::Prescription(Prescription {
            meta: RecordMeta::new(RecordId::new()),
            medical_history_id: history,
            consultation_id,
            medication: Some("Amoxicillin".into()),
        });
        (record, history)
    }

    #[test]
    fn entity_type_names_round_trip_through_from_str() {
        for ty in EntityType::ALL {
            assert_eq!(ty.as_str().parse::<EntityType>().unwrap(), ty);
        }
        let err = "doctor".parse::<EntityType>().expect_err("unknown type");
        assert!(matches!(err, ArchivalError::InvalidInput(msg) if msg.contains("doctor")));
    }

    #[test]
    fn entity_type_serde_matches_external_names() {
        let json = serde_json::to_string(&EntityType::MedicalHistory).unwrap();
        assert_eq!(json, "\"medical-history\"");
    }

    #[test]
    fn entity_ref_parse_validates_both_parts() {
        let id = RecordId::new();
        let parsed = EntityRef::parse("consultation", &id.to_string()).unwrap();
        assert_eq!(parsed, EntityRef::new(EntityType::Consultation, id));

        assert!(matches!(
            EntityRef::parse("consultation", "NOT-CANONICAL"),
            Err(ArchivalError::Uuid(_))
        ));
        assert!(matches!(
            EntityRef::parse("visit", &id.to_string()),
            Err(ArchivalError::InvalidInput(_))
        ));
    }

    #[test]
    fn display_name_is_trimmed_and_non_empty() {
        assert_eq!(DisplayName::new("  Ada Lovelace ").unwrap().as_str(), "Ada Lovelace");
        assert!(DisplayName::new("   ").is_err());
    }

    #[test]
    fn prescription_parent_is_history_not_consultation() {
        let consultation = RecordId::new();
        let (record, history) = prescription(Some(consultation));

        assert_eq!(
            record.parent(),
            Some(EntityRef::new(EntityType::MedicalHistory, history))
        );
        assert_eq!(
            record.references(),
            vec![EntityRef::new(EntityType::Consultation, consultation)]
        );
    }

    #[test]
    fn patient_has_no_parent() {
        let record = Record::Patient(Patient {
            meta: RecordMeta::new(RecordId::new()),
            name: DisplayName::new("Ada").unwrap(),
        });
        assert_eq!(record.parent(), None);
        assert_eq!(record.display_name(), "Ada");
    }

    #[test]
    fn apply_reports_change_only_when_flag_flips() {
        let (mut record, _) = prescription(None);
        let created = record.meta().updated_at;
        let later = created + chrono::Duration::seconds(5);

        assert!(!record.apply(&RecordPatch::set_active(true), later));
        assert_eq!(record.meta().updated_at, created);

        assert!(record.apply(&RecordPatch::set_active(false), later));
        assert!(!record.is_active());
        assert_eq!(record.meta().updated_at, later);

        assert!(!record.apply(&RecordPatch::default(), later));
    }
}
