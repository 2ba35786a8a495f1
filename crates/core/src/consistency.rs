//! Consistency checking.
//!
//! The single invariant of the record graph: an active record never hangs off an inactive
//! ancestor. Equivalently, the whole subtree below an archived record is archived.
//!
//! [`check`] is pure. It only inspects a [`SubtreeSnapshot`] and is used both after every
//! restore commit and as the oracle in property tests.

use crate::entity::{EntityRef, Record};
use crate::snapshot::SubtreeSnapshot;
use serde::Serialize;
use std::fmt;

/// An active record with an inactive ancestor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub entity: EntityRef,
    /// The nearest inactive ancestor.
    pub inactive_ancestor: EntityRef,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is active but its ancestor {} is archived",
            self.entity, self.inactive_ancestor
        )
    }
}

/// Every active record in `snapshot` whose ancestor chain, within the snapshot, contains an
/// inactive record. Ancestors outside the snapshot are not considered.
pub fn check(snapshot: &SubtreeSnapshot) -> Vec<Violation> {
    snapshot
        .records()
        .iter()
        .filter(|record| record.is_active())
        .filter_map(|record| {
            nearest_inactive_ancestor(snapshot, record).map(|ancestor| Violation {
                entity: record.entity_ref(),
                inactive_ancestor: ancestor.entity_ref(),
            })
        })
        .collect()
}

fn nearest_inactive_ancestor<'a>(
    snapshot: &'a SubtreeSnapshot,
    record: &Record,
) -> Option<&'a Record> {
    let mut current = snapshot.parent_of(record);
    while let Some(ancestor) = current {
        if !ancestor.is_active() {
            return Some(ancestor);
        }
        current = snapshot.parent_of(ancestor);
    }
    None
}
