use bitvec::prelude::*;
use tracing::{debug, info, instrument, warn};

use super::{ensure_kind, ensure_topology_layout};
use crate::core::models::container::{ContainerKind, PropertyContainer};
use crate::core::models::property::{PropertyData, StandardProperty};
use crate::core::models::topology::IndexTuple;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;

const DELETED: usize = usize::MAX;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub particles_removed: usize,
    /// Rows removed from each dependent container, in processing order.
    pub dependents: Vec<(ContainerKind, usize)>,
    /// Dependent rows that already referenced a nonexistent particle.
    pub healed: usize,
}

impl CascadeSummary {
    pub fn removed_from(&self, kind: ContainerKind) -> usize {
        self.dependents
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, n)| n)
            .sum()
    }
}

/// `index_map[old] = new` for surviving rows, [`DELETED`] for flagged ones.
fn build_index_map(mask: &BitSlice) -> Vec<usize> {
    let mut next = 0;
    mask.iter()
        .by_vals()
        .map(|deleted| {
            if deleted {
                DELETED
            } else {
                next += 1;
                next - 1
            }
        })
        .collect()
}

/// Rewrites surviving rows through `index_map` in place and returns the
/// per-row drop mask together with the number of rows that were dangling.
fn flag_and_remap<T: IndexTuple>(rows: &mut [T], index_map: &[usize]) -> (BitVec, usize) {
    let old_count = index_map.len();
    let mut drop_mask = bitvec![0; rows.len()];
    let mut healed = 0;

    for (row_index, row) in rows.iter_mut().enumerate() {
        if !row.all_within(old_count) {
            drop_mask.set(row_index, true);
            healed += 1;
            continue;
        }
        if row
            .indices()
            .iter()
            .any(|&index| index_map[index as usize] == DELETED)
        {
            drop_mask.set(row_index, true);
            continue;
        }
        for index in row.indices_mut() {
            *index = index_map[*index as usize] as i64;
        }
    }
    (drop_mask, healed)
}

/// Drops and renumbers the rows of one dependent container. Returns the
/// removed and healed row counts, or `None` if it has no index column.
fn cascade_into(
    dependent: &mut PropertyContainer,
    index_map: &[usize],
) -> Result<Option<(usize, usize)>, EngineError> {
    let kind = dependent.kind();
    let (drop_mask, healed) = match dependent.standard_mut(StandardProperty::Topology) {
        Some(PropertyData::Pairs(rows)) => flag_and_remap(rows, index_map),
        Some(PropertyData::Triplets(rows)) => flag_and_remap(rows, index_map),
        Some(PropertyData::Quadruplets(rows)) => flag_and_remap(rows, index_map),
        _ => return Ok(None),
    };
    if healed > 0 {
        warn!(
            container = %kind,
            rows = healed,
            "Removed rows referencing nonexistent particles."
        );
    }
    let removed = dependent.compact(&drop_mask)?;
    debug!(container = %kind, removed, remaining = dependent.element_count(), "Cascaded deletion.");
    Ok(Some((removed, healed)))
}

/// Removes the particles flagged in `mask` and cascades the deletion into
/// every dependent topology container.
///
/// A dependent row is dropped if any of its indices is flagged or already out
/// of range; all other rows have their indices renumbered. The cascades into
/// different dependents are independent of each other and keep the relative
/// order of surviving rows.
///
/// Masks and layouts are validated up front. A failure after that point
/// leaves the containers mutually inconsistent. Each processed dependent is
/// one step of a task reported to `reporter`.
#[instrument(skip_all, name = "cascade_delete_task")]
pub fn run(
    particles: &mut PropertyContainer,
    dependents: &mut [&mut PropertyContainer],
    mask: &BitSlice,
    reporter: &ProgressReporter,
) -> Result<CascadeSummary, EngineError> {
    ensure_kind(particles, ContainerKind::Particles)?;
    if mask.len() != particles.element_count() {
        return Err(EngineError::MaskLengthMismatch {
            expected: particles.element_count(),
            actual: mask.len(),
        });
    }
    for dependent in dependents.iter() {
        ensure_topology_layout(dependent)?;
    }

    let index_map = build_index_map(mask);
    let particles_removed = particles.compact(mask)?;
    if particles_removed == 0 {
        debug!("Deletion mask is empty; nothing to cascade.");
    }

    let mut summary = CascadeSummary {
        particles_removed,
        ..CascadeSummary::default()
    };
    reporter.task(dependents.len(), |tick| {
        for dependent in dependents.iter_mut() {
            if let Some((removed, healed)) = cascade_into(dependent, &index_map)? {
                summary.dependents.push((dependent.kind(), removed));
                summary.healed += healed;
            }
            tick();
        }
        Ok::<_, EngineError>(())
    })?;

    info!(
        particles = particles_removed,
        remaining = particles.element_count(),
        dependent_rows = summary.dependents.iter().map(|(_, n)| n).sum::<usize>(),
        "Deleted particles."
    );
    Ok(summary)
}
