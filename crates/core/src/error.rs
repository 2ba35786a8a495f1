use crate::consistency::Violation;
use crate::entity::EntityRef;
use crate::restore::AncestorSummary;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ArchivalError {
    #[error("{0} not found")]
    NotFound(EntityRef),

    #[error(
        "cannot restore {target} on its own while {} is archived; resubmit with cascade to restore the whole patient record",
        .ancestor.entity()
    )]
    PreconditionFailed {
        target: EntityRef,
        ancestor: AncestorSummary,
    },

    #[error("storage operation failed after {rows_changed} row(s) changed: {source}")]
    OperationFailed {
        #[source]
        source: StoreError,
        rows_changed: usize,
    },

    #[error(
        "consistency invariant violated after commit ({} violation(s), {rows_changed} row(s) changed)",
        .violations.len()
    )]
    InvariantViolation {
        violations: Vec<Violation>,
        rows_changed: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid record id: {0}")]
    Uuid(#[from] mpr_uuid::UuidError),
}

impl ArchivalError {
    /// True when the identical call may simply be repeated.
    ///
    /// Only adapter failures qualify; every write is an absolute boolean set, so a retry
    /// converges on the intended state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArchivalError::OperationFailed { .. })
    }

    /// Rows whose `is_active` flag actually changed before the error was raised.
    pub fn rows_changed(&self) -> usize {
        match self {
            ArchivalError::OperationFailed { rows_changed, .. }
            | ArchivalError::InvariantViolation { rows_changed, .. } => *rows_changed,
            _ => 0,
        }
    }

    /// Maps a failed read of `entity` itself. A missing row is surfaced as-is.
    pub(crate) fn lookup_failed(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ArchivalError::NotFound(entity),
            source => ArchivalError::OperationFailed {
                source,
                rows_changed: 0,
            },
        }
    }

    /// Adds rows written by an earlier stage of the same operation.
    pub(crate) fn after_writes(self, earlier: usize) -> Self {
        match self {
            ArchivalError::OperationFailed {
                source,
                rows_changed,
            } => ArchivalError::OperationFailed {
                source,
                rows_changed: rows_changed + earlier,
            },
            ArchivalError::InvariantViolation {
                violations,
                rows_changed,
            } => ArchivalError::InvariantViolation {
                violations,
                rows_changed: rows_changed + earlier,
            },
            other => other,
        }
    }

    /// Maps a failure part-way through a cascade.
    pub(crate) fn write_failed(source: StoreError, rows_changed: usize) -> Self {
        ArchivalError::OperationFailed {
            source,
            rows_changed,
        }
    }
}

pub type ArchivalResult<T> = std::result::Result<T, ArchivalError>;
