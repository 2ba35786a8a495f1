//! In-memory view of a record subtree.
//!
//! A snapshot is what the coordinators compute write sets from and what the consistency
//! checker inspects. Records are kept in breadth-first order from the subtree root when
//! loaded from a store, which is also the order archive writes are issued in.

use crate::entity::{EntityRef, Record};
use crate::error::{ArchivalError, ArchivalResult};
use crate::graph::ArchivalGraph;
use crate::store::PersistenceAdapter;
use mpr_uuid::RecordId;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Clone, Debug)]
pub struct SubtreeSnapshot {
    root: EntityRef,
    records: Vec<Record>,
    index: HashMap<EntityRef, usize>,
}

impl SubtreeSnapshot {
    /// Loads `root` and everything reachable from it along cascade edges.
    ///
    /// Leaf records are never asked for children, so a leaf snapshot costs no extra reads.
    pub fn load(store: &dyn PersistenceAdapter, root: Record) -> ArchivalResult<Self> {
        let root_ref = root.entity_ref();
        let mut records = Vec::new();
        let mut queue = VecDeque::from([root]);

        while let Some(record) = queue.pop_front() {
            let entity_type = record.entity_type();
            if ArchivalGraph::cascade_edges(entity_type).next().is_some() {
                let children = store
                    .list_children(record.entity_ref())
                    .map_err(|e| ArchivalError::write_failed(e, 0))?;
                queue.extend(children.into_iter().filter(|child| {
                    ArchivalGraph::owner_edge(child.entity_type())
                        .is_some_and(|edge| edge.parent == entity_type && edge.cascades_on_archive)
                }));
            }
            records.push(record);
        }

        Ok(Self::from_records(root_ref, records))
    }

    /// Loads a whole patient subtree by patient id.
    pub fn load_patient(
        store: &dyn PersistenceAdapter,
        patient_id: RecordId,
    ) -> ArchivalResult<Self> {
        let root = store
            .get(EntityRef::patient(patient_id))
            .map_err(ArchivalError::lookup_failed)?;
        Self::load(store, root)
    }

    /// Assembles a snapshot from records already in hand. Order is preserved; a repeated
    /// entity keeps its last occurrence in the index.
    pub fn from_records(root: EntityRef, records: Vec<Record>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.entity_ref(), i))
            .collect();
        Self {
            root,
            records,
            index,
        }
    }

    pub fn root(&self) -> EntityRef {
        self.root
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, entity: EntityRef) -> Option<&Record> {
        self.index.get(&entity).map(|&i| &self.records[i])
    }

    /// The owning record of `record`, if it is part of this snapshot.
    pub fn parent_of(&self, record: &Record) -> Option<&Record> {
        record.parent().and_then(|parent| self.get(parent))
    }

    pub fn children_of(&self, entity: EntityRef) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(move |r| r.parent() == Some(entity))
    }

    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_active()).count()
    }

    /// `is_active` per record, keyed and ordered by entity.
    pub fn activation(&self) -> BTreeMap<EntityRef, bool> {
        self.records
            .iter()
            .map(|r| (r.entity_ref(), r.is_active()))
            .collect()
    }
}
