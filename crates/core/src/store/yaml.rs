//! File-backed persistence adapter.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   patients/<s1>/<s2>/<id>/record.yaml
//!   medical_histories/<s1>/<s2>/<id>/record.yaml
//!   representatives/...
//!   consultations/...
//!   prescriptions/...
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record id.
//!
//! Each write goes to a temporary sibling file that is then renamed over `record.yaml`, so a
//! crash mid-write leaves either the old or the new document, never a torn one.
//!
//! `list_children` scans the child collections and matches parent keys. That is linear in
//! the number of stored children, which is fine for a single practice.

use super::{wire, PersistenceAdapter, StoreError, StoreResult};
use crate::config::CoreConfig;
use crate::constants::{RECORD_FILENAME, RECORD_TMP_FILENAME};
use crate::entity::{EntityRef, EntityType, Record, RecordPatch};
use crate::graph::ArchivalGraph;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct YamlFileStore {
    cfg: Arc<CoreConfig>,
}

impl YamlFileStore {
    /// Opens the store rooted at the configured data directory, creating it if needed.
    pub fn open(cfg: Arc<CoreConfig>) -> StoreResult<Self> {
        fs::create_dir_all(cfg.data_dir())?;
        Ok(Self { cfg })
    }

    /// Writes a new record. Creation is outside the archival engine's contract, but seeding
    /// and the CLI need it.
    pub fn insert(&self, record: &Record) -> StoreResult<()> {
        let entity = record.entity_ref();
        let dir = self.record_dir(entity);
        if dir.join(RECORD_FILENAME).exists() {
            return Err(StoreError::AlreadyExists(entity));
        }
        fs::create_dir_all(&dir)?;
        self.write_record(&dir, record)
    }

    fn collection_dir(&self, entity_type: EntityType) -> PathBuf {
        self.cfg.data_dir().join(entity_type.collection())
    }

    fn record_dir(&self, entity: EntityRef) -> PathBuf {
        entity
            .id
            .sharded_dir(&self.collection_dir(entity.entity_type))
    }

    fn read_record(&self, path: &Path, expected: Option<EntityRef>) -> StoreResult<Record> {
        let contents = fs::read_to_string(path)?;
        let record = wire::parse(&contents).map_err(|message| StoreError::Corrupt {
            path: path.to_path_buf(),
            message,
        })?;

        if let Some(expected) = expected {
            if record.entity_ref() != expected {
                return Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    message: format!(
                        "file holds {} but was read as {}",
                        record.entity_ref(),
                        expected
                    ),
                });
            }
        }
        Ok(record)
    }

    fn write_record(&self, dir: &Path, record: &Record) -> StoreResult<()> {
        let yaml = wire::render(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = dir.join(RECORD_TMP_FILENAME);
        fs::write(&tmp, yaml)?;
        fs::rename(&tmp, dir.join(RECORD_FILENAME))?;
        Ok(())
    }

    /// Every `record.yaml` under a collection's shard tree.
    fn record_files(&self, entity_type: EntityType) -> StoreResult<Vec<PathBuf>> {
        let root = self.collection_dir(entity_type);
        let mut files = Vec::new();

        let s1_iter = match fs::read_dir(&root) {
            Ok(it) => it,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };
        for s1 in s1_iter {
            let s1_path = s1?.path();
            if !s1_path.is_dir() {
                continue;
            }
            for s2 in fs::read_dir(&s1_path)? {
                let s2_path = s2?.path();
                if !s2_path.is_dir() {
                    continue;
                }
                for id_ent in fs::read_dir(&s2_path)? {
                    let record_path = id_ent?.path().join(RECORD_FILENAME);
                    if record_path.is_file() {
                        files.push(record_path);
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

impl PersistenceAdapter for YamlFileStore {
    fn get(&self, entity: EntityRef) -> StoreResult<Record> {
        let path = self.record_dir(entity).join(RECORD_FILENAME);
        if !path.is_file() {
            return Err(StoreError::NotFound(entity));
        }
        self.read_record(&path, Some(entity))
    }

    fn update(&self, entity: EntityRef, patch: &RecordPatch) -> StoreResult<()> {
        let dir = self.record_dir(entity);
        let path = dir.join(RECORD_FILENAME);
        if !path.is_file() {
            return Err(StoreError::NotFound(entity));
        }

        let mut record = self.read_record(&path, Some(entity))?;
        if record.apply(patch, Utc::now()) {
            self.write_record(&dir, &record)?;
        }
        Ok(())
    }

    fn list_children(&self, parent: EntityRef) -> StoreResult<Vec<Record>> {
        let mut children = Vec::new();
        for child_type in ArchivalGraph::child_types(parent.entity_type) {
            for path in self.record_files(child_type)? {
                // A cascade must see every child, so unreadable files fail the call
                // instead of being skipped.
                let record = self.read_record(&path, None)?;
                if record.entity_type() != child_type {
                    return Err(StoreError::Corrupt {
                        path,
                        message: format!(
                            "{} stored under {}",
                            record.entity_type(),
                            child_type.collection()
                        ),
                    });
                }
                if record.parent() == Some(parent) {
                    children.push(record);
                }
            }
        }
        Ok(children)
    }
}
