//! # MPR Core
//!
//! Archival engine for medical practice records.
//!
//! Records form a small ownership graph rooted at the patient:
//!
//! ```text
//! Patient
//! ├── MedicalHistory (exactly one)
//! │   ├── Consultation*
//! │   └── Prescription*   (may also reference a Consultation)
//! └── Representative*
//! ```
//!
//! Records are never deleted, only archived (`is_active = false`). This crate decides how an
//! archive or restore propagates through the graph so that an active record never hangs off
//! an archived ancestor:
//! - [`ArchivalService::archive`] cascades deactivation down from the target.
//! - [`ArchivalService::probe`] and [`ArchivalService::commit`] implement two-phase restore,
//!   escalating to a full patient restore only with caller consent.
//! - [`ArchivalService::check`] runs the consistency checker over one patient.
//!
//! Storage is reached through the [`PersistenceAdapter`] trait only; writes are sequential
//! single-row updates and every operation is idempotent, so retrying a failed call converges.
//!
//! **No API concerns**: HTTP servers and command-line parsing belong in `api-rest` and `cli`.

pub mod archive;
pub mod builder;
pub mod cascade;
pub mod chain;
pub mod config;
pub mod consistency;
pub mod constants;
pub mod entity;
pub mod error;
pub mod graph;
pub mod lock;
pub mod restore;
pub mod service;
pub mod snapshot;
pub mod store;

pub use archive::ArchiveOutcome;
pub use builder::{PatientTree, PatientTreeBuilder};
pub use config::CoreConfig;
pub use consistency::Violation;
pub use entity::{EntityRef, EntityType, Record, RecordPatch};
pub use error::{ArchivalError, ArchivalResult};
pub use graph::ArchivalGraph;
pub use mpr_uuid::RecordId;
pub use restore::{AncestorSummary, ProbeOutcome, RestoreOutcome, RestoreScope};
pub use service::ArchivalService;
pub use snapshot::SubtreeSnapshot;
pub use store::{InMemoryStore, PersistenceAdapter, StoreError, YamlFileStore};
