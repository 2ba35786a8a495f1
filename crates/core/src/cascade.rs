//! Sequential activation writes.
//!
//! There is no multi-row transaction: rows are written one by one in the order given. Rows
//! already in the wanted state are skipped, so the returned count is the number of rows
//! that actually changed and repeating the call converges.

use crate::entity::{Record, RecordPatch};
use crate::error::{ArchivalError, ArchivalResult};
use crate::store::PersistenceAdapter;

/// Sets `is_active = active` on each record that differs, in order.
///
/// On the first adapter failure the error carries the number of rows already flipped.
pub fn apply_activation<'a>(
    store: &dyn PersistenceAdapter,
    records: impl IntoIterator<Item = &'a Record>,
    active: bool,
) -> ArchivalResult<usize> {
    let patch = RecordPatch::set_active(active);
    let mut changed = 0;

    for record in records {
        if record.is_active() == active {
            continue;
        }
        let entity = record.entity_ref();
        if let Err(e) = store.update(entity, &patch) {
            tracing::warn!(
                "write to {} failed after {} row(s) changed: {}",
                entity,
                changed,
                e
            );
            return Err(ArchivalError::write_failed(e, changed));
        }
        tracing::debug!("set is_active={} on {}", active, entity);
        changed += 1;
    }

    Ok(changed)
}
