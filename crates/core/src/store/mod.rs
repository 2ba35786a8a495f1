//! Persistence adapter seam.
//!
//! The archival engine never talks to storage directly. It consumes the three-call
//! [`PersistenceAdapter`] contract and assumes nothing beyond single-row reads and writes:
//! no multi-row transactions, no ordering guarantees across rows.
//!
//! Two adapters ship with the crate:
//! - [`InMemoryStore`] for tests and demos, with fault injection.
//! - [`YamlFileStore`], one strict YAML document per record in a sharded directory tree.

pub mod memory;
mod wire;
pub mod yaml;

pub use memory::InMemoryStore;
pub use yaml::YamlFileStore;

use crate::entity::{EntityRef, Record, RecordPatch};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(EntityRef),
    #[error("{0} already exists")]
    AlreadyExists(EntityRef),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt record file {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },
    #[error("failed to serialize record: {0}")]
    Serialization(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage operations the archival engine relies on.
///
/// Implementations hold no business rules. `update` must be an absolute write of the
/// patched fields so that repeating it is harmless.
pub trait PersistenceAdapter: Send + Sync {
    /// Loads one record; [`StoreError::NotFound`] if it does not exist.
    fn get(&self, entity: EntityRef) -> StoreResult<Record>;

    /// Writes the fields present in `patch` to one record.
    fn update(&self, entity: EntityRef, patch: &RecordPatch) -> StoreResult<()>;

    /// Records directly owned by `parent` (ownership edges only), in a stable order.
    fn list_children(&self, parent: EntityRef) -> StoreResult<Vec<Record>>;
}
