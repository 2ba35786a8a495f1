//! Two-phase restore.
//!
//! Restoring a record whose ancestors are all active is a single-row write. Restoring a
//! record under an archived ancestor would break the graph invariant, so it escalates to a
//! restore of the whole patient record, and only with explicit consent from the caller:
//!
//! 1. [`RestoreCoordinator::probe`] reports, without writing, whether consent is needed and
//!    which archived ancestor is responsible.
//! 2. [`RestoreCoordinator::commit`] performs the restore. With an archived ancestor it
//!    rejects unless `cascade` is set.
//!
//! | State before      | probe                   | commit(cascade=false) | commit(cascade=true)   |
//! |-------------------|-------------------------|-----------------------|------------------------|
//! | ancestors active  | no confirmation needed  | target only           | target only            |
//! | ancestor archived | confirmation needed     | `PreconditionFailed`  | whole patient record   |
//!
//! Commit never trusts an earlier probe: it re-reads the chain under the patient lock, and
//! checks the patient record for consistency before reporting success.

use crate::cascade::apply_activation;
use crate::chain::AncestorChain;
use crate::consistency;
use crate::entity::{EntityRef, EntityType, Record};
use crate::error::{ArchivalError, ArchivalResult};
use crate::lock::PatientLocks;
use crate::snapshot::SubtreeSnapshot;
use crate::store::PersistenceAdapter;
use mpr_uuid::RecordId;
use serde::Serialize;
use std::fmt;

/// Identity of an archived ancestor, shown to the user when asking for confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AncestorSummary {
    pub entity_type: EntityType,
    pub id: RecordId,
    pub name: String,
}

impl AncestorSummary {
    pub fn of(record: &Record) -> Self {
        Self {
            entity_type: record.entity_type(),
            id: record.id(),
            name: record.display_name(),
        }
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.id)
    }
}

impl fmt::Display for AncestorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.entity())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub needs_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<AncestorSummary>,
}

/// What a commit restored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestoreScope {
    /// The target row alone.
    Target,
    /// The whole patient record, root first.
    Subtree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    /// Rows that changed from archived to active. Zero on a repeated call.
    pub restored_count: usize,
    pub scope: RestoreScope,
    /// Records of the same patient still archived after the commit. Non-zero after a
    /// target-only restore, including the retry of an interrupted escalation.
    pub remaining_inactive: usize,
}

/// Decides the restore scope from a resolved chain. No I/O.
pub fn plan_restore(chain: &AncestorChain, cascade: bool) -> ArchivalResult<RestoreScope> {
    if chain.target().entity_type() == EntityType::Patient {
        return Ok(RestoreScope::Subtree);
    }
    match chain.topmost_inactive_ancestor() {
        None => Ok(RestoreScope::Target),
        Some(_) if cascade => Ok(RestoreScope::Subtree),
        Some(ancestor) => Err(ArchivalError::PreconditionFailed {
            target: chain.target().entity_ref(),
            ancestor: AncestorSummary::of(ancestor),
        }),
    }
}

pub struct RestoreCoordinator<'a> {
    store: &'a dyn PersistenceAdapter,
    locks: &'a PatientLocks,
}

impl<'a> RestoreCoordinator<'a> {
    pub fn new(store: &'a dyn PersistenceAdapter, locks: &'a PatientLocks) -> Self {
        Self { store, locks }
    }

    /// Phase one. Read-only and lock-free.
    pub fn probe(&self, target: EntityRef) -> ArchivalResult<ProbeOutcome> {
        let chain = AncestorChain::resolve(self.store, target)?;
        let ancestor = match target.entity_type {
            EntityType::Patient => None,
            _ => chain.topmost_inactive_ancestor().map(AncestorSummary::of),
        };
        tracing::debug!(
            "probe {}: confirmation {}",
            target,
            if ancestor.is_some() { "needed" } else { "not needed" }
        );
        Ok(ProbeOutcome {
            needs_confirmation: ancestor.is_some(),
            ancestor,
        })
    }

    /// Phase two.
    pub fn commit(&self, target: EntityRef, cascade: bool) -> ArchivalResult<RestoreOutcome> {
        let patient_id = AncestorChain::resolve(self.store, target)?.patient_id();
        let _guard = self.locks.acquire(patient_id);

        let chain = AncestorChain::resolve(self.store, target)?;
        let scope = match plan_restore(&chain, cascade) {
            Ok(scope) => scope,
            Err(e) => {
                tracing::warn!("restore of {} rejected: {}", target, e);
                return Err(e);
            }
        };

        let restored_count = match scope {
            RestoreScope::Target => apply_activation(self.store, [chain.target()], true)?,
            RestoreScope::Subtree => {
                let subtree = SubtreeSnapshot::load(self.store, chain.root().clone())?;
                apply_activation(self.store, subtree.records(), true)?
            }
        };

        let remaining_inactive = self
            .verify(patient_id)
            .map_err(|e| e.after_writes(restored_count))?;

        tracing::info!(
            "restored {} ({:?}, {} row(s) changed, {} still archived)",
            target,
            scope,
            restored_count,
            remaining_inactive
        );
        Ok(RestoreOutcome {
            restored_count,
            scope,
            remaining_inactive,
        })
    }

    /// Checks the whole patient record and returns how many of its rows are archived.
    fn verify(&self, patient_id: RecordId) -> ArchivalResult<usize> {
        let snapshot = SubtreeSnapshot::load_patient(self.store, patient_id)?;
        let violations = consistency::check(&snapshot);
        if violations.is_empty() {
            return Ok(snapshot.len() - snapshot.active_count());
        }
        for v in &violations {
            tracing::error!("consistency violation in patient {}: {}", patient_id, v);
        }
        Err(ArchivalError::InvariantViolation {
            violations,
            rows_changed: 0,
        })
    }
}
