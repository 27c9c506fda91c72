use tracing::{debug, info, instrument};

use super::{ensure_kind, ensure_topology_layout};
use crate::core::models::container::{ContainerKind, PropertyContainer};
use crate::core::models::property::{PropertyData, StandardProperty};
use crate::core::models::topology::IndexTuple;
use crate::engine::error::EngineError;

/// Rewrites indices through `inverted_permutation`. Negative and
/// out-of-range indices are left as they are; their count is returned.
fn remap_indices<T: IndexTuple>(rows: &mut [T], inverted_permutation: &[usize]) -> usize {
    let mut untouched = 0;
    for index in rows.iter_mut().flat_map(|row| row.indices_mut()) {
        match usize::try_from(*index)
            .ok()
            .and_then(|i| inverted_permutation.get(i))
        {
            Some(&new) => *index = new as i64,
            None => untouched += 1,
        }
    }
    untouched
}

/// Stable-sorts the particles by identifier and renumbers the particle
/// indices of every dependent container accordingly.
///
/// Returns the inverted permutation (`result[old] == new`), or an empty
/// vector if the particles have no identifiers or were already in order. Row
/// count and row order of the dependents never change.
#[instrument(skip_all, name = "stable_sort_task")]
pub fn run(
    particles: &mut PropertyContainer,
    dependents: &mut [&mut PropertyContainer],
) -> Result<Vec<usize>, EngineError> {
    ensure_kind(particles, ContainerKind::Particles)?;
    for dependent in dependents.iter() {
        ensure_topology_layout(dependent)?;
    }

    let inverted_permutation = particles.sort_by_identifier()?;
    if inverted_permutation.is_empty() {
        debug!("Particles have no identifiers or are already sorted.");
        return Ok(inverted_permutation);
    }

    for dependent in dependents.iter_mut() {
        let kind = dependent.kind();
        let untouched = match dependent.standard_mut(StandardProperty::Topology) {
            Some(PropertyData::Pairs(rows)) => remap_indices(rows, &inverted_permutation),
            Some(PropertyData::Triplets(rows)) => remap_indices(rows, &inverted_permutation),
            Some(PropertyData::Quadruplets(rows)) => remap_indices(rows, &inverted_permutation),
            _ => continue,
        };
        debug!(
            container = %kind,
            rows = dependent.element_count(),
            out_of_range = untouched,
            "Renumbered particle indices."
        );
    }

    info!(
        particles = inverted_permutation.len(),
        dependents = dependents.len(),
        "Sorted particles by identifier."
    );
    Ok(inverted_permutation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::property::Property;

    fn particles(ids: &[i64]) -> PropertyContainer {
        let mut particles = PropertyContainer::new(ContainerKind::Particles);
        particles
            .add_property(Property::new(
                StandardProperty::Identifier,
                PropertyData::Int64(ids.to_vec()),
            ))
            .unwrap();
        particles
    }

    fn bonds(pairs: Vec<[i64; 2]>) -> PropertyContainer {
        let mut bonds = PropertyContainer::new(ContainerKind::Bonds);
        bonds
            .add_property(Property::new(StandardProperty::Topology, PropertyData::Pairs(pairs)))
            .unwrap();
        bonds
    }

    fn ids(particles: &PropertyContainer) -> Vec<i64> {
        particles
            .standard(StandardProperty::Identifier)
            .and_then(|d| d.as_int64())
            .unwrap()
            .to_vec()
    }

    fn pairs(bonds: &PropertyContainer) -> Vec<[i64; 2]> {
        bonds
            .standard(StandardProperty::Topology)
            .and_then(|d| d.as_pairs())
            .unwrap()
            .to_vec()
    }

    fn identifier_pairs(particles: &PropertyContainer, bonds: &PropertyContainer) -> Vec<(i64, i64)> {
        let ids = ids(particles);
        pairs(bonds)
            .iter()
            .map(|row| (ids[row[0] as usize], ids[row[1] as usize]))
            .collect()
    }

    #[test]
    fn sort_preserves_identifier_pairs_of_every_bond() {
        let mut particles = particles(&[40, 10, 30, 20]);
        let mut bonds = bonds(vec![[0, 1], [1, 2], [3, 0], [2, 3]]);
        let before = identifier_pairs(&particles, &bonds);

        let inverted = run(&mut particles, &mut [&mut bonds]).unwrap();

        assert_eq!(inverted, vec![3, 0, 2, 1]);
        assert_eq!(ids(&particles), vec![10, 20, 30, 40]);
        assert_eq!(identifier_pairs(&particles, &bonds), before);
        assert_eq!(pairs(&bonds), vec![[3, 0], [0, 2], [1, 3], [2, 1]]);
    }

    #[test]
    fn sort_renumbers_all_dependent_kinds() {
        let mut particles = particles(&[3, 2, 1]);
        let mut angles = PropertyContainer::new(ContainerKind::Angles);
        angles
            .add_property(Property::new(
                StandardProperty::Topology,
                PropertyData::Triplets(vec![[0, 1, 2]]),
            ))
            .unwrap();
        let mut impropers = PropertyContainer::new(ContainerKind::Impropers);
        impropers
            .add_property(Property::new(
                StandardProperty::Topology,
                PropertyData::Quadruplets(vec![[2, 2, 1, 0]]),
            ))
            .unwrap();

        run(&mut particles, &mut [&mut angles, &mut impropers]).unwrap();

        assert_eq!(
            angles.standard(StandardProperty::Topology),
            Some(&PropertyData::Triplets(vec![[2, 1, 0]]))
        );
        assert_eq!(
            impropers.standard(StandardProperty::Topology),
            Some(&PropertyData::Quadruplets(vec![[0, 0, 1, 2]]))
        );
    }

    #[test]
    fn out_of_range_indices_are_left_untouched() {
        let mut particles = particles(&[2, 1]);
        let mut bonds = bonds(vec![[0, 5], [-1, 1], [1, 0]]);

        run(&mut particles, &mut [&mut bonds]).unwrap();

        assert_eq!(pairs(&bonds), vec![[1, 5], [-1, 0], [0, 1]]);
    }

    #[test]
    fn sorted_particles_leave_topology_unchanged() {
        let mut particles = particles(&[1, 2, 3]);
        let mut bonds = bonds(vec![[2, 0]]);

        let inverted = run(&mut particles, &mut [&mut bonds]).unwrap();

        assert!(inverted.is_empty());
        assert_eq!(pairs(&bonds), vec![[2, 0]]);
    }

    #[test]
    fn particles_without_identifiers_are_not_sorted() {
        let mut particles = PropertyContainer::with_count(ContainerKind::Particles, 2);
        let mut bonds = bonds(vec![[1, 0]]);

        let inverted = run(&mut particles, &mut [&mut bonds]).unwrap();

        assert!(inverted.is_empty());
        assert_eq!(pairs(&bonds), vec![[1, 0]]);
    }
}
