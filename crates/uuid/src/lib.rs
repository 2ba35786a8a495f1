//! Record identifiers and sharded-path utilities.
//!
//! Every practice record (patient, medical history, representative, consultation, prescription)
//! is addressed by a UUID. To keep lookups and on-disk paths deterministic, the workspace uses a
//! *canonical* textual form for identifiers: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that guarantees the canonical form once constructed.
//! - The sharding rule used by file-backed stores to place a record on disk.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (CLI arguments, REST path segments) must already be canonical.
//! Uppercase, hyphenated, short or non-hex input is rejected rather than normalised.
//!
//! ## Sharded layout
//! For a canonical id `u`, file-backed stores keep the record under
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`, which bounds directory fan-out.

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Input was not a canonical identifier.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
