//! JSON request and response bodies.
//!
//! Core outcome types stay free of HTTP and schema concerns; these mirror them with string
//! ids and kebab-case type names for the wire.

use mpr_core::{AncestorSummary, ArchiveOutcome, ProbeOutcome, RestoreOutcome, Violation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveRes {
    pub archived_count: usize,
}

impl From<ArchiveOutcome> for ArchiveRes {
    fn from(outcome: ArchiveOutcome) -> Self {
        Self {
            archived_count: outcome.archived_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AncestorRes {
    pub entity_type: String,
    pub id: String,
    pub name: String,
}

impl From<AncestorSummary> for AncestorRes {
    fn from(ancestor: AncestorSummary) -> Self {
        Self {
            entity_type: ancestor.entity_type.to_string(),
            id: ancestor.id.to_string(),
            name: ancestor.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProbeRes {
    pub needs_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<AncestorRes>,
}

impl From<ProbeOutcome> for ProbeRes {
    fn from(outcome: ProbeOutcome) -> Self {
        Self {
            needs_confirmation: outcome.needs_confirmation,
            ancestor: outcome.ancestor.map(AncestorRes::from),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CommitReq {
    /// Consent to restore the whole patient record when an ancestor is archived.
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommitRes {
    pub restored_count: usize,
    /// `target` or `subtree`.
    pub scope: String,
    /// Records of the patient still archived after this call.
    pub remaining_inactive: usize,
}

impl From<RestoreOutcome> for CommitRes {
    fn from(outcome: RestoreOutcome) -> Self {
        let scope = match outcome.scope {
            mpr_core::RestoreScope::Target => "target",
            mpr_core::RestoreScope::Subtree => "subtree",
        };
        Self {
            restored_count: outcome.restored_count,
            scope: scope.into(),
            remaining_inactive: outcome.remaining_inactive,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ViolationRes {
    pub entity_type: String,
    pub id: String,
    pub inactive_ancestor_type: String,
    pub inactive_ancestor_id: String,
}

impl From<&Violation> for ViolationRes {
    fn from(v: &Violation) -> Self {
        Self {
            entity_type: v.entity.entity_type.to_string(),
            id: v.entity.id.to_string(),
            inactive_ancestor_type: v.inactive_ancestor.entity_type.to_string(),
            inactive_ancestor_id: v.inactive_ancestor.id.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckRes {
    pub patient_id: String,
    pub violations: Vec<ViolationRes>,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    pub rows_changed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<AncestorRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<ViolationRes>>,
}
