//! Static archival graph.
//!
//! Declares which record kinds own which, through which key, and whether archiving the
//! owner walks the edge. Every coordinator and the consistency checker consult this table
//! instead of hard-coding relationships.
//!
//! ```text
//! Patient
//! ├── MedicalHistory        (patient_id, 1:1)
//! │   ├── Consultation      (medical_history_id)
//! │   └── Prescription      (medical_history_id)
//! │         ┆ consultation_id  (reference only)
//! └── Representative        (patient_id)
//! ```
//!
//! Ownership edges define the ancestor chain. The prescription → consultation link is a
//! reference edge: it never cascades and never makes a consultation an ancestor.

use crate::entity::EntityType;

/// Field on the child that names its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParentKey {
    PatientId,
    MedicalHistoryId,
    ConsultationId,
}

impl ParentKey {
    pub fn field_name(&self) -> &'static str {
        match self {
            ParentKey::PatientId => "patient_id",
            ParentKey::MedicalHistoryId => "medical_history_id",
            ParentKey::ConsultationId => "consultation_id",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// The child belongs to the parent; the parent is an ancestor.
    Ownership,
    /// The child merely points at the target.
    Reference,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub child: EntityType,
    pub parent: EntityType,
    pub parent_key: ParentKey,
    pub kind: EdgeKind,
    pub cascades_on_archive: bool,
}

const HISTORY_TO_PATIENT: Edge = Edge {
    child: EntityType::MedicalHistory,
    parent: EntityType::Patient,
    parent_key: ParentKey::PatientId,
    kind: EdgeKind::Ownership,
    cascades_on_archive: true,
};

const REPRESENTATIVE_TO_PATIENT: Edge = Edge {
    child: EntityType::Representative,
    parent: EntityType::Patient,
    parent_key: ParentKey::PatientId,
    kind: EdgeKind::Ownership,
    cascades_on_archive: true,
};

const CONSULTATION_TO_HISTORY: Edge = Edge {
    child: EntityType::Consultation,
    parent: EntityType::MedicalHistory,
    parent_key: ParentKey::MedicalHistoryId,
    kind: EdgeKind::Ownership,
    cascades_on_archive: true,
};

const PRESCRIPTION_TO_HISTORY: Edge = Edge {
    child: EntityType::Prescription,
    parent: EntityType::MedicalHistory,
    parent_key: ParentKey::MedicalHistoryId,
    kind: EdgeKind::Ownership,
    cascades_on_archive: true,
};

const PRESCRIPTION_TO_CONSULTATION: Edge = Edge {
    child: EntityType::Prescription,
    parent: EntityType::Consultation,
    parent_key: ParentKey::ConsultationId,
    kind: EdgeKind::Reference,
    cascades_on_archive: false,
};

const EDGES: [Edge; 5] = [
    HISTORY_TO_PATIENT,
    REPRESENTATIVE_TO_PATIENT,
    CONSULTATION_TO_HISTORY,
    PRESCRIPTION_TO_HISTORY,
    PRESCRIPTION_TO_CONSULTATION,
];

/// Read-only view over the edge table.
///
/// Zero-sized; all methods are associated functions.
pub struct ArchivalGraph;

impl ArchivalGraph {
    pub const ROOT: EntityType = EntityType::Patient;

    /// The ownership edge from `child` to its parent, `None` for the root.
    ///
    /// Written as an exhaustive match so adding an entity kind fails to compile until its
    /// place in the graph is declared.
    pub fn owner_edge(child: EntityType) -> Option<&'static Edge> {
        match child {
            EntityType::Patient => None,
            EntityType::MedicalHistory => Some(&HISTORY_TO_PATIENT),
            EntityType::Representative => Some(&REPRESENTATIVE_TO_PATIENT),
            EntityType::Consultation => Some(&CONSULTATION_TO_HISTORY),
            EntityType::Prescription => Some(&PRESCRIPTION_TO_HISTORY),
        }
    }

    pub fn parent_type(child: EntityType) -> Option<EntityType> {
        Self::owner_edge(child).map(|edge| edge.parent)
    }

    /// Non-owning links leaving `child`.
    pub fn reference_edges(child: EntityType) -> impl Iterator<Item = &'static Edge> {
        EDGES
            .iter()
            .filter(move |edge| edge.child == child && edge.kind == EdgeKind::Reference)
    }

    /// Ownership edges walked when a record of type `parent` is archived or restored as a subtree.
    pub fn cascade_edges(parent: EntityType) -> impl Iterator<Item = &'static Edge> {
        EDGES.iter().filter(move |edge| {
            edge.parent == parent && edge.kind == EdgeKind::Ownership && edge.cascades_on_archive
        })
    }

    /// Kinds directly owned by `parent`, in edge-table order.
    pub fn child_types(parent: EntityType) -> Vec<EntityType> {
        EDGES
            .iter()
            .filter(|edge| edge.parent == parent && edge.kind == EdgeKind::Ownership)
            .map(|edge| edge.child)
            .collect()
    }

    pub fn is_root(ty: EntityType) -> bool {
        Self::owner_edge(ty).is_none()
    }

    pub fn is_leaf(ty: EntityType) -> bool {
        Self::child_types(ty).is_empty()
    }

    /// Number of ownership hops from `ty` to the root.
    pub fn depth(ty: EntityType) -> usize {
        Self::ancestor_types(ty).len()
    }

    /// Ancestor kinds, nearest first, ending at the root.
    pub fn ancestor_types(ty: EntityType) -> Vec<EntityType> {
        let mut out = Vec::new();
        let mut current = ty;
        while let Some(parent) = Self::parent_type(current) {
            out.push(parent);
            current = parent;
        }
        out
    }
}
