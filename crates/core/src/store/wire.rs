//! On-disk YAML wire model for [`YamlFileStore`](super::YamlFileStore).
//!
//! Responsibilities:
//! - Define a strict wire struct (unknown keys rejected) for one record document
//! - Translate between the wire struct and the typed [`Record`] variants
//! - Surface the failing field path when a document does not match the schema

use crate::entity::{
    Consultation, DisplayName, EntityType, MedicalHistory, Patient, Prescription, Record,
    RecordMeta, Representative,
};
use chrono::{DateTime, Utc};
use mpr_uuid::RecordId;
use serde::{Deserialize, Serialize};

/// Exact structure of a `record.yaml` document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct RecordWire {
    id: String,
    kind: EntityType,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    medical_history_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consultation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    medication: Option<String>,
}

/// Parses a record document. Errors are plain messages; the caller attaches the path.
pub(super) fn parse(yaml_text: &str) -> Result<Record, String> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    let wire = match serde_path_to_error::deserialize::<_, RecordWire>(deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(format!("record schema mismatch at {path}: {source}"));
        }
    };

    wire_to_domain(wire)
}

pub(super) fn render(record: &Record) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&domain_to_wire(record))
}

fn parse_id(field: &str, value: &str) -> Result<RecordId, String> {
    RecordId::parse(value).map_err(|e| format!("{field}: {e}"))
}

fn required_id(field: &str, value: Option<&String>) -> Result<RecordId, String> {
    match value {
        Some(v) => parse_id(field, v),
        None => Err(format!("missing required field {field}")),
    }
}

fn required_name(value: Option<&String>) -> Result<DisplayName, String> {
    let value = value.ok_or_else(|| "missing required field name".to_string())?;
    DisplayName::new(value).map_err(|e| format!("name: {e}"))
}

fn wire_to_domain(wire: RecordWire) -> Result<Record, String> {
    let meta = RecordMeta {
        id: parse_id("id", &wire.id)?,
        is_active: wire.is_active,
        created_at: wire.created_at,
        updated_at: wire.updated_at,
    };

    let record = match wire.kind {
        EntityType::Patient => Record::Patient(Patient {
            meta,
            name: required_name(wire.name.as_ref())?,
        }),
        EntityType::MedicalHistory => Record::MedicalHistory(MedicalHistory {
            meta,
            patient_id: required_id("patient_id", wire.patient_id.as_ref())?,
        }),
        EntityType::Representative => Record::Representative(Representative {
            meta,
            patient_id: required_id("patient_id", wire.patient_id.as_ref())?,
            name: required_name(wire.name.as_ref())?,
        }),
        EntityType::Consultation => Record::Consultation(Consultation {
            meta,
            medical_history_id: required_id(
                "medical_history_id",
                wire.medical_history_id.as_ref(),
            )?,
            reason: wire.reason,
        }),
        EntityType::Prescription => Record::Prescription(Prescription {
            meta,
            medical_history_id: required_id(
                "medical_history_id",
                wire.medical_history_id.as_ref(),
            )?,
            consultation_id: wire
                .consultation_id
                .as_deref()
                .map(|v| parse_id("consultation_id", v))
                .transpose()?,
            medication: wire.medication,
        }),
    };

    Ok(record)
}

fn domain_to_wire(record: &Record) -> RecordWire {
    let meta = record.meta();
    let mut wire = RecordWire {
        id: meta.id.to_string(),
        kind: record.entity_type(),
        is_active: meta.is_active,
        created_at: meta.created_at,
        updated_at: meta.updated_at,
        name: None,
        patient_id: None,
        medical_history_id: None,
        consultation_id: None,
        reason: None,
        medication: None,
    };

    match record {
        Record::Patient(r) => wire.name = Some(r.name.to_string()),
        Record::MedicalHistory(r) => wire.patient_id = Some(r.patient_id.to_string()),
        Record::Representative(r) => {
            wire.patient_id = Some(r.patient_id.to_string());
            wire.name = Some(r.name.to_string());
        }
        Record::Consultation(r) => {
            wire.medical_history_id = Some(r.medical_history_id.to_string());
            wire.reason = r.reason.clone();
        }
        Record::Prescription(r) => {
            wire.medical_history_id = Some(r.medical_history_id.to_string());
            wire.consultation_id = r.consultation_id.map(|id| id.to_string());
            wire.medication = r.medication.clone();
        }
    }

    wire
}
