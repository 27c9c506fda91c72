use std::sync::Arc;

use bitvec::prelude::*;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::models::cell::SimulationCell;
use crate::core::models::container::{ContainerKind, PropertyContainer};
use crate::core::models::property::{Property, PropertyData, StandardProperty};
use crate::core::models::topology::Bond;
use crate::core::topology::adjacency::AdjacencyIndex;
use crate::core::topology::geometry;
use crate::engine::appearance::DefaultAppearanceProvider;
use crate::engine::config::MergeOptions;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::delete_particles::CascadeSummary;
use crate::engine::tasks::merge_bonds::MergeSummary;
use crate::engine::tasks::{self, ensure_kind, ensure_topology_layout};
use crate::engine::utils::scan;

/// One particle container plus optional bonds, angles, dihedrals and
/// impropers that reference its rows.
///
/// Containers are reference counted so clones of a dataset share storage.
/// Every mutating method first takes an exclusive copy of the containers it
/// touches, leaving other datasets that shared them unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleDataset {
    particles: Arc<PropertyContainer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bonds: Option<Arc<PropertyContainer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    angles: Option<Arc<PropertyContainer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dihedrals: Option<Arc<PropertyContainer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    impropers: Option<Arc<PropertyContainer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cell: Option<SimulationCell>,
}

impl ParticleDataset {
    pub fn new(particles: PropertyContainer) -> Result<Self, EngineError> {
        ensure_kind(&particles, ContainerKind::Particles)?;
        Ok(Self {
            particles: Arc::new(particles),
            bonds: None,
            angles: None,
            dihedrals: None,
            impropers: None,
            cell: None,
        })
    }

    /// Attaches a topology container, replacing any container of the same kind.
    pub fn with_topology(mut self, container: PropertyContainer) -> Result<Self, EngineError> {
        self.set_topology(container)?;
        Ok(self)
    }

    pub fn with_cell(mut self, cell: SimulationCell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn set_topology(&mut self, container: PropertyContainer) -> Result<(), EngineError> {
        ensure_topology_layout(&container)?;
        if let Some(slot) = self.slot_mut(container.kind()) {
            *slot = Some(Arc::new(container));
        }
        Ok(())
    }

    pub fn remove_topology(&mut self, kind: ContainerKind) -> Option<PropertyContainer> {
        self.slot_mut(kind)?.take().map(Arc::unwrap_or_clone)
    }

    pub fn set_cell(&mut self, cell: Option<SimulationCell>) {
        self.cell = cell;
    }

    fn slot(&self, kind: ContainerKind) -> Option<&Arc<PropertyContainer>> {
        match kind {
            ContainerKind::Particles => Some(&self.particles),
            ContainerKind::Bonds => self.bonds.as_ref(),
            ContainerKind::Angles => self.angles.as_ref(),
            ContainerKind::Dihedrals => self.dihedrals.as_ref(),
            ContainerKind::Impropers => self.impropers.as_ref(),
        }
    }

    /// Storage slot of a topology kind; `None` for particles, which are
    /// always present.
    fn slot_mut(&mut self, kind: ContainerKind) -> Option<&mut Option<Arc<PropertyContainer>>> {
        match kind {
            ContainerKind::Particles => None,
            ContainerKind::Bonds => Some(&mut self.bonds),
            ContainerKind::Angles => Some(&mut self.angles),
            ContainerKind::Dihedrals => Some(&mut self.dihedrals),
            ContainerKind::Impropers => Some(&mut self.impropers),
        }
    }

    pub fn particles(&self) -> &PropertyContainer {
        &self.particles
    }

    pub fn bonds(&self) -> Option<&PropertyContainer> {
        self.bonds.as_deref()
    }

    pub fn angles(&self) -> Option<&PropertyContainer> {
        self.angles.as_deref()
    }

    pub fn dihedrals(&self) -> Option<&PropertyContainer> {
        self.dihedrals.as_deref()
    }

    pub fn impropers(&self) -> Option<&PropertyContainer> {
        self.impropers.as_deref()
    }

    pub fn container(&self, kind: ContainerKind) -> Option<&PropertyContainer> {
        self.slot(kind).map(|arc| arc.as_ref())
    }

    pub fn cell(&self) -> Option<&SimulationCell> {
        self.cell.as_ref()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.element_count()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds().map_or(0, PropertyContainer::element_count)
    }

    /// Exclusive access to the particles, copying them first if shared.
    pub fn particles_mut(&mut self) -> &mut PropertyContainer {
        Arc::make_mut(&mut self.particles)
    }

    /// Exclusive access to a topology container, copying it first if shared.
    pub fn topology_mut(&mut self, kind: ContainerKind) -> Option<&mut PropertyContainer> {
        self.slot_mut(kind)?.as_mut().map(Arc::make_mut)
    }

    /// Whether both datasets currently share the same container storage.
    pub fn shares_container(&self, other: &ParticleDataset, kind: ContainerKind) -> bool {
        match (self.slot(kind), other.slot(kind)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn expect_bonds(&self) -> Result<&PropertyContainer, EngineError> {
        self.bonds()
            .ok_or(EngineError::MissingContainer(ContainerKind::Bonds))
    }

    fn bond_topology(&self) -> Result<(&[[i64; 2]], Option<&[Vector3<i32>]>), EngineError> {
        let bonds = self.expect_bonds()?;
        let topology = bonds
            .standard(StandardProperty::Topology)
            .and_then(|data| data.as_pairs())
            .unwrap_or(&[]);
        let shifts = bonds
            .standard(StandardProperty::PeriodicImage)
            .and_then(|data| data.as_vec3i());
        Ok((topology, shifts))
    }

    /// Builds an adjacency index over the current bonds. The index borrows
    /// the dataset, so it has to be dropped before the next mutation.
    pub fn adjacency(&self) -> Result<AdjacencyIndex<'_>, EngineError> {
        let (topology, shifts) = self.bond_topology()?;
        Ok(AdjacencyIndex::new(topology, shifts, self.particle_count()))
    }

    pub fn bond(&self, row: usize) -> Option<Bond> {
        let (topology, shifts) = self.bond_topology().ok()?;
        let pair = topology.get(row)?;
        let index1 = usize::try_from(pair[0]).ok()?;
        let index2 = usize::try_from(pair[1]).ok()?;
        let shift = shifts
            .and_then(|s| s.get(row).copied())
            .unwrap_or_else(Vector3::zeros);
        Some(Bond::with_shift(index1, index2, shift))
    }

    fn positions(&self) -> Option<&[Vector3<f64>]> {
        self.particles
            .standard(StandardProperty::Position)
            .and_then(|data| data.as_vec3())
    }

    /// Vector from the first to the second particle of a bond, unwrapped
    /// across periodic boundaries when the dataset has a cell.
    pub fn bond_vector(&self, row: usize) -> Option<Vector3<f64>> {
        geometry::bond_vector(self.positions()?, self.cell.as_ref(), &self.bond(row)?)
    }

    pub fn bond_center(&self, row: usize) -> Option<Point3<f64>> {
        geometry::bond_center(self.positions()?, self.cell.as_ref(), &self.bond(row)?)
    }

    pub fn bond_index_from_pick_id(&self, pick_id: u32) -> Option<usize> {
        geometry::bond_index_from_pick_id(pick_id, self.bond_count())
    }

    fn identifiers(&self) -> Option<&[i64]> {
        self.particles
            .standard(StandardProperty::Identifier)
            .and_then(|data| data.as_int64())
    }

    /// Finds the bond of `target` that corresponds to bond `row` of this dataset.
    ///
    /// With particle identifiers on both sides, bonds are matched by the
    /// identifiers of their endpoints in either order, trying the same row
    /// first. Without identifiers, rows are assumed to correspond one to one
    /// if both datasets have the same particle and bond counts.
    pub fn remap_bond_index(&self, row: usize, target: &ParticleDataset) -> Option<usize> {
        let (source_topology, _) = self.bond_topology().ok()?;
        let (target_topology, _) = target.bond_topology().ok()?;
        let source_pair = source_topology.get(row)?;

        if let (Some(source_ids), Some(target_ids)) = (self.identifiers(), target.identifiers()) {
            let id_of = |ids: &[i64], index: i64| {
                usize::try_from(index).ok().and_then(|i| ids.get(i)).copied()
            };
            let wanted = (id_of(source_ids, source_pair[0])?, id_of(source_ids, source_pair[1])?);
            let ids_of = |pair: &[i64; 2]| Some((id_of(target_ids, pair[0])?, id_of(target_ids, pair[1])?));

            if target_topology.get(row).and_then(ids_of) == Some(wanted) {
                return Some(row);
            }
            return target_topology.iter().position(|pair| {
                ids_of(pair).is_some_and(|(a, b)| (a, b) == wanted || (b, a) == wanted)
            });
        }

        (self.particle_count() == target.particle_count()
            && source_topology.len() == target_topology.len())
        .then_some(row)
    }

    /// Mask of particles whose `Selection` value is non-zero, if the particles
    /// carry a selection.
    pub fn selected_particles(&self) -> Option<BitVec> {
        self.particles
            .standard(StandardProperty::Selection)
            .and_then(|data| data.as_int())
            .map(scan::selection_mask)
    }

    /// Marks the bonds whose endpoints both satisfy `predicate`.
    pub fn select_bonds<F>(&self, predicate: F) -> Result<BitVec, EngineError>
    where
        F: Fn(usize) -> bool + Sync,
    {
        let (topology, _) = self.bond_topology()?;
        Ok(scan::select_bonds(topology, predicate))
    }

    /// Merges candidate bonds, creating the bonds container if the dataset has
    /// none yet. See [`tasks::merge_bonds::run`] for the merge rules.
    #[instrument(skip_all, name = "dataset_merge_bonds")]
    pub fn merge_bonds(
        &mut self,
        candidates: &[Bond],
        auxiliary: &[Property],
        options: &MergeOptions,
        appearance: &dyn DefaultAppearanceProvider,
        reporter: &ProgressReporter,
    ) -> Result<MergeSummary, EngineError> {
        let _phase = reporter.phase("Merging bonds");
        let summary = match self.bonds.as_mut() {
            Some(bonds) => tasks::merge_bonds::run(
                &self.particles,
                Arc::make_mut(bonds),
                candidates,
                auxiliary,
                options,
                appearance,
                reporter,
            )?,
            None => {
                let mut bonds = PropertyContainer::new(ContainerKind::Bonds);
                let summary = tasks::merge_bonds::run(
                    &self.particles,
                    &mut bonds,
                    candidates,
                    auxiliary,
                    options,
                    appearance,
                    reporter,
                )?;
                self.bonds = Some(Arc::new(bonds));
                summary
            }
        };
        reporter.report(Progress::Message(format!(
            "Appended {} of {} candidate bonds.",
            summary.appended,
            candidates.len()
        )));
        Ok(summary)
    }

    fn split_for_cascade(&mut self) -> (&mut PropertyContainer, Vec<&mut PropertyContainer>) {
        let dependents = [
            &mut self.bonds,
            &mut self.angles,
            &mut self.dihedrals,
            &mut self.impropers,
        ]
        .into_iter()
        .filter_map(|slot| slot.as_mut().map(Arc::make_mut))
        .collect();
        (Arc::make_mut(&mut self.particles), dependents)
    }

    /// Deletes the particles flagged in `mask` together with every bond,
    /// angle, dihedral and improper that references one of them.
    #[instrument(skip_all, name = "dataset_delete_particles")]
    pub fn delete_particles(
        &mut self,
        mask: &BitSlice,
        reporter: &ProgressReporter,
    ) -> Result<CascadeSummary, EngineError> {
        let _phase = reporter.phase("Deleting particles");
        if mask.len() != self.particle_count() {
            return Err(EngineError::MaskLengthMismatch {
                expected: self.particle_count(),
                actual: mask.len(),
            });
        }
        let (particles, mut dependents) = self.split_for_cascade();
        let summary = tasks::delete_particles::run(particles, &mut dependents, mask, reporter)?;
        reporter.report(Progress::Message(format!(
            "Deleted {} particles.",
            summary.particles_removed
        )));
        Ok(summary)
    }

    /// Deletes all particles with a non-zero `Selection` value. Returns an
    /// empty summary when the particles carry no selection.
    pub fn delete_selected_particles(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<CascadeSummary, EngineError> {
        match self.selected_particles() {
            Some(mask) => self.delete_particles(&mask, reporter),
            None => Ok(CascadeSummary::default()),
        }
    }

    /// Sorts the particles by identifier and renumbers all topology.
    #[instrument(skip_all, name = "dataset_sort_by_identifier")]
    pub fn sort_by_identifier(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<Vec<usize>, EngineError> {
        let _phase = reporter.phase("Sorting particles");
        if self.identifiers().is_none() {
            return Ok(Vec::new());
        }
        let (particles, mut dependents) = self.split_for_cascade();
        tasks::sort_particles::run(particles, &mut dependents)
    }

    /// Recomputes all bond periodic images for `cell` and stores the cell in
    /// the dataset.
    #[instrument(skip_all, name = "dataset_periodic_images")]
    pub fn generate_periodic_images(
        &mut self,
        cell: SimulationCell,
        reporter: &ProgressReporter,
    ) -> Result<usize, EngineError> {
        let _phase = reporter.phase("Generating periodic images");
        let bonds = self
            .bonds
            .as_mut()
            .ok_or(EngineError::MissingContainer(ContainerKind::Bonds))?;
        let crossing = tasks::periodic_images::run(&self.particles, Arc::make_mut(bonds), &cell)?;
        self.cell = Some(cell);
        Ok(crossing)
    }

    /// Checks every container's columns and every topology index.
    pub fn verify_integrity(&self) -> Result<(), EngineError> {
        self.particles.verify_integrity()?;
        let particle_count = self.particle_count();

        for kind in ContainerKind::TOPOLOGY_KINDS {
            let Some(container) = self.container(kind) else {
                continue;
            };
            ensure_topology_layout(container)?;
            let Some(topology) = container.standard(StandardProperty::Topology) else {
                continue;
            };
            let dangling = match topology {
                PropertyData::Pairs(rows) => first_dangling(rows, particle_count),
                PropertyData::Triplets(rows) => first_dangling(rows, particle_count),
                PropertyData::Quadruplets(rows) => first_dangling(rows, particle_count),
                _ => None,
            };
            if let Some((row, index)) = dangling {
                return Err(EngineError::DanglingReference {
                    container: kind,
                    row,
                    index,
                    particle_count,
                });
            }
        }
        info!(
            particles = particle_count,
            bonds = self.bond_count(),
            "Dataset passed integrity check."
        );
        Ok(())
    }
}

fn first_dangling<const N: usize>(rows: &[[i64; N]], particle_count: usize) -> Option<(usize, i64)> {
    rows.iter().enumerate().find_map(|(row, indices)| {
        indices
            .iter()
            .find(|&&index| index < 0 || index as u64 >= particle_count as u64)
            .map(|&index| (row, index))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::appearance::StandardAppearance;
    use std::sync::Mutex;

    fn particles(count: usize) -> PropertyContainer {
        let mut particles = PropertyContainer::new(ContainerKind::Particles);
        particles
            .add_property(Property::new(
                StandardProperty::Identifier,
                PropertyData::Int64((1..=count as i64).collect()),
            ))
            .unwrap();
        particles
            .add_property(Property::new(
                StandardProperty::Position,
                PropertyData::Vec3((0..count).map(|i| Vector3::new(i as f64, 0.0, 0.0)).collect()),
            ))
            .unwrap();
        particles
    }

    fn topology(kind: ContainerKind, data: PropertyData) -> PropertyContainer {
        let mut container = PropertyContainer::new(kind);
        container
            .add_property(Property::new(StandardProperty::Topology, data))
            .unwrap();
        container
    }

    fn chain_dataset(count: usize) -> ParticleDataset {
        let pairs = (0..count as i64 - 1).map(|i| [i, i + 1]).collect();
        ParticleDataset::new(particles(count))
            .unwrap()
            .with_topology(topology(ContainerKind::Bonds, PropertyData::Pairs(pairs)))
            .unwrap()
    }

    fn pairs(dataset: &ParticleDataset) -> Vec<[i64; 2]> {
        dataset
            .bonds()
            .and_then(|b| b.standard(StandardProperty::Topology))
            .and_then(|d| d.as_pairs())
            .unwrap()
            .to_vec()
    }

    fn merge(dataset: &mut ParticleDataset, candidates: &[Bond]) -> MergeSummary {
        dataset
            .merge_bonds(
                candidates,
                &[],
                &MergeOptions::default(),
                &StandardAppearance::default(),
                &ProgressReporter::new(),
            )
            .unwrap()
    }

    mod construction {
        use super::*;

        #[test]
        fn new_rejects_non_particle_container() {
            let err = ParticleDataset::new(PropertyContainer::new(ContainerKind::Bonds)).unwrap_err();
            assert!(matches!(err, EngineError::WrongContainerKind { .. }));
        }

        #[test]
        fn with_topology_places_container_by_kind() {
            let dataset = ParticleDataset::new(particles(3))
                .unwrap()
                .with_topology(topology(
                    ContainerKind::Angles,
                    PropertyData::Triplets(vec![[0, 1, 2]]),
                ))
                .unwrap();
            assert!(dataset.bonds().is_none());
            assert_eq!(dataset.angles().map(|a| a.element_count()), Some(1));
        }

        #[test]
        fn with_topology_rejects_particles() {
            let err = ParticleDataset::new(particles(1))
                .unwrap()
                .with_topology(particles(1))
                .unwrap_err();
            assert!(matches!(err, EngineError::WrongContainerKind { .. }));
        }

        #[test]
        fn adjacency_requires_bonds() {
            let dataset = ParticleDataset::new(particles(2)).unwrap();
            let err = dataset.adjacency().unwrap_err();
            assert_eq!(err.to_string(), "Operation requires bonds as input");
        }
    }

    mod merging {
        use super::*;

        #[test]
        fn merge_creates_bonds_container_and_deduplicates() {
            let mut dataset = ParticleDataset::new(particles(4)).unwrap();

            merge(&mut dataset, &[Bond::new(0, 1), Bond::new(1, 0)]);
            assert_eq!(dataset.bond_count(), 1);

            merge(&mut dataset, &[Bond::new(2, 3)]);
            assert_eq!(dataset.bond_count(), 2);
            assert_eq!(pairs(&dataset), vec![[0, 1], [2, 3]]);
        }

        #[test]
        fn failed_merge_does_not_create_bonds_container() {
            let mut dataset = ParticleDataset::new(particles(2)).unwrap();
            let result = dataset.merge_bonds(
                &[Bond::new(0, 5)],
                &[],
                &MergeOptions::default(),
                &StandardAppearance::default(),
                &ProgressReporter::new(),
            );
            assert!(result.is_err());
            assert!(dataset.bonds().is_none());
        }

        #[test]
        fn merge_reports_phase_progress() {
            let events = Mutex::new(Vec::new());
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(event);
            }));
            let mut dataset = chain_dataset(3);

            dataset
                .merge_bonds(
                    &[Bond::new(2, 0)],
                    &[],
                    &MergeOptions::default(),
                    &StandardAppearance::default(),
                    &reporter,
                )
                .unwrap();
            drop(reporter);

            let events = events.into_inner().unwrap();
            assert_eq!(
                events,
                vec![
                    Progress::PhaseStart {
                        name: "Merging bonds"
                    },
                    Progress::TaskStart { total_steps: 1 },
                    Progress::TaskIncrement,
                    Progress::TaskFinish,
                    Progress::Message("Appended 1 of 1 candidate bonds.".to_string()),
                    Progress::PhaseFinish,
                ]
            );
        }

        #[test]
        fn merge_ignores_bond_rows_referencing_missing_particles() {
            let mut dataset = ParticleDataset::new(particles(2))
                .unwrap()
                .with_topology(topology(
                    ContainerKind::Bonds,
                    PropertyData::Pairs(vec![[0, i64::MAX]]),
                ))
                .unwrap();

            let summary = merge(&mut dataset, &[Bond::new(0, 1)]);

            assert_eq!(summary.appended, 1);
            assert_eq!(pairs(&dataset), vec![[0, i64::MAX], [0, 1]]);
            let adjacency = dataset.adjacency().unwrap();
            assert_eq!(adjacency.neighbors_of(0).collect::<Vec<_>>(), vec![1]);
        }

        #[test]
        fn merge_on_shared_dataset_copies_before_writing() {
            let original = chain_dataset(3);
            let mut copy = original.clone();
            assert!(copy.shares_container(&original, ContainerKind::Bonds));

            merge(&mut copy, &[Bond::new(0, 2)]);

            assert_eq!(original.bond_count(), 2);
            assert_eq!(copy.bond_count(), 3);
            assert!(!copy.shares_container(&original, ContainerKind::Bonds));
            assert!(copy.shares_container(&original, ContainerKind::Particles));
        }
    }

    mod deletion {
        use super::*;

        #[test]
        fn deleting_a_chain_member_cascades_into_bonds() {
            let mut dataset = chain_dataset(5);
            let mut mask = bitvec![0; 5];
            mask.set(2, true);

            let summary = dataset
                .delete_particles(&mask, &ProgressReporter::new())
                .unwrap();

            assert_eq!(summary.particles_removed, 1);
            assert_eq!(dataset.particle_count(), 4);
            assert_eq!(pairs(&dataset), vec![[0, 1], [2, 3]]);
            assert!(dataset.verify_integrity().is_ok());
        }

        #[test]
        fn deletion_leaves_other_clones_untouched() {
            let original = chain_dataset(4);
            let mut copy = original.clone();

            copy.delete_particles(bits![1, 0, 0, 0], &ProgressReporter::new())
                .unwrap();

            assert_eq!(original.particle_count(), 4);
            assert_eq!(pairs(&original), vec![[0, 1], [1, 2], [2, 3]]);
            assert_eq!(pairs(&copy), vec![[0, 1], [1, 2]]);
        }

        #[test]
        fn delete_selected_uses_selection_column() {
            let mut dataset = chain_dataset(4);
            dataset
                .particles_mut()
                .add_property(Property::new(
                    StandardProperty::Selection,
                    PropertyData::Int(vec![0, 0, 0, 1]),
                ))
                .unwrap();

            let summary = dataset
                .delete_selected_particles(&ProgressReporter::new())
                .unwrap();

            assert_eq!(summary.particles_removed, 1);
            assert_eq!(pairs(&dataset), vec![[0, 1], [1, 2]]);
        }

        #[test]
        fn delete_selected_without_selection_is_a_no_op() {
            let mut dataset = chain_dataset(3);
            let summary = dataset
                .delete_selected_particles(&ProgressReporter::new())
                .unwrap();
            assert_eq!(summary, CascadeSummary::default());
            assert_eq!(dataset.particle_count(), 3);
        }

        #[test]
        fn mask_length_is_checked_before_copying() {
            let original = chain_dataset(3);
            let mut copy = original.clone();
            let err = copy
                .delete_particles(bits![1, 0], &ProgressReporter::new())
                .unwrap_err();
            assert!(matches!(err, EngineError::MaskLengthMismatch { .. }));
            assert!(copy.shares_container(&original, ContainerKind::Particles));
        }
    }

    mod sorting {
        use super::*;

        #[test]
        fn sort_keeps_identifier_pairs_for_bonds_and_angles() {
            let mut particles = PropertyContainer::new(ContainerKind::Particles);
            particles
                .add_property(Property::new(
                    StandardProperty::Identifier,
                    PropertyData::Int64(vec![30, 10, 20]),
                ))
                .unwrap();
            let mut dataset = ParticleDataset::new(particles)
                .unwrap()
                .with_topology(topology(
                    ContainerKind::Bonds,
                    PropertyData::Pairs(vec![[0, 1], [1, 2]]),
                ))
                .unwrap()
                .with_topology(topology(
                    ContainerKind::Angles,
                    PropertyData::Triplets(vec![[0, 1, 2]]),
                ))
                .unwrap();

            let inverted = dataset.sort_by_identifier(&ProgressReporter::new()).unwrap();

            assert_eq!(inverted, vec![2, 0, 1]);
            assert_eq!(pairs(&dataset), vec![[2, 0], [0, 1]]);
            assert_eq!(
                dataset
                    .angles()
                    .and_then(|a| a.standard(StandardProperty::Topology))
                    .cloned(),
                Some(PropertyData::Triplets(vec![[2, 0, 1]]))
            );
        }

        #[test]
        fn sort_without_identifiers_keeps_storage_shared() {
            let original = ParticleDataset::new(PropertyContainer::with_count(ContainerKind::Particles, 2))
                .unwrap();
            let mut copy = original.clone();
            assert!(copy.sort_by_identifier(&ProgressReporter::new()).unwrap().is_empty());
            assert!(copy.shares_container(&original, ContainerKind::Particles));
        }
    }

    mod geometry_queries {
        use super::*;

        #[test]
        fn periodic_images_are_generated_and_cell_is_stored() {
            let mut dataset = ParticleDataset::new(particles(10))
                .unwrap()
                .with_topology(topology(ContainerKind::Bonds, PropertyData::Pairs(vec![[0, 9]])))
                .unwrap();
            let cell = SimulationCell::orthorhombic(Vector3::repeat(10.0), [true; 3]);

            let crossing = dataset
                .generate_periodic_images(cell.clone(), &ProgressReporter::new())
                .unwrap();

            assert_eq!(crossing, 1);
            assert_eq!(dataset.cell(), Some(&cell));
            assert_eq!(dataset.bond(0).unwrap().shift, Vector3::new(-1, 0, 0));
            let vector = dataset.bond_vector(0).unwrap();
            assert!((vector - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);
            let center = dataset.bond_center(0).unwrap();
            assert!((center - Point3::new(-0.5, 0.0, 0.0)).norm() < 1e-9);
        }

        #[test]
        fn periodic_images_require_bonds() {
            let mut dataset = ParticleDataset::new(particles(2)).unwrap();
            let cell = SimulationCell::orthorhombic(Vector3::repeat(10.0), [true; 3]);
            let err = dataset
                .generate_periodic_images(cell, &ProgressReporter::new())
                .unwrap_err();
            assert!(matches!(
                err,
                EngineError::MissingContainer(ContainerKind::Bonds)
            ));
        }

        #[test]
        fn pick_ids_resolve_to_bond_rows() {
            let dataset = chain_dataset(4);
            assert_eq!(dataset.bond_index_from_pick_id(5), Some(2));
            assert_eq!(dataset.bond_index_from_pick_id(6), None);
        }

        #[test]
        fn select_bonds_uses_particle_predicate() {
            let dataset = chain_dataset(5);
            let selected = dataset.select_bonds(|p| p >= 2).unwrap();
            assert_eq!(selected.iter_ones().collect::<Vec<_>>(), vec![2, 3]);
        }

        #[test]
        fn adjacency_queries_reflect_current_bonds() {
            let dataset = chain_dataset(4);
            let adjacency = dataset.adjacency().unwrap();
            assert_eq!(adjacency.degree(1), 2);
            assert_eq!(adjacency.find_bond(&Bond::new(2, 1)), Some(1));
        }
    }

    mod remapping {
        use super::*;

        #[test]
        fn remap_by_identifiers_follows_reordering() {
            let source = chain_dataset(4);
            let mut target = source.clone();
            target.sort_by_identifier(&ProgressReporter::new()).unwrap();
            target
                .particles_mut()
                .standard_mut(StandardProperty::Identifier)
                .and_then(|d| match d {
                    PropertyData::Int64(ids) => Some(ids),
                    _ => None,
                })
                .unwrap()
                .reverse();
            target
                .topology_mut(ContainerKind::Bonds)
                .and_then(|b| b.standard_mut(StandardProperty::Topology))
                .and_then(|d| d.as_pairs_mut())
                .unwrap()
                .copy_from_slice(&[[3, 2], [2, 1], [1, 0]]);

            assert_eq!(source.remap_bond_index(0, &target), Some(0));
            assert_eq!(source.remap_bond_index(2, &target), Some(2));

            target
                .topology_mut(ContainerKind::Bonds)
                .and_then(|b| b.standard_mut(StandardProperty::Topology))
                .and_then(|d| d.as_pairs_mut())
                .unwrap()
                .copy_from_slice(&[[1, 0], [3, 2], [2, 1]]);
            assert_eq!(source.remap_bond_index(0, &target), Some(1));
            assert_eq!(source.remap_bond_index(1, &target), Some(2));
        }

        #[test]
        fn remap_without_identifiers_requires_matching_counts() {
            let anonymous = |count: usize| {
                let pairs = (0..count as i64 - 1).map(|i| [i, i + 1]).collect();
                ParticleDataset::new(PropertyContainer::with_count(ContainerKind::Particles, count))
                    .unwrap()
                    .with_topology(topology(ContainerKind::Bonds, PropertyData::Pairs(pairs)))
                    .unwrap()
            };
            assert_eq!(anonymous(4).remap_bond_index(1, &anonymous(4)), Some(1));
            assert_eq!(anonymous(4).remap_bond_index(1, &anonymous(5)), None);
        }
    }

    mod integrity {
        use super::*;

        #[test]
        fn verify_integrity_reports_dangling_rows() {
            let dataset = ParticleDataset::new(particles(3))
                .unwrap()
                .with_topology(topology(
                    ContainerKind::Dihedrals,
                    PropertyData::Quadruplets(vec![[0, 1, 2, 0], [0, 1, 2, 3]]),
                ))
                .unwrap();

            let err = dataset.verify_integrity().unwrap_err();
            assert!(matches!(
                err,
                EngineError::DanglingReference {
                    container: ContainerKind::Dihedrals,
                    row: 1,
                    index: 3,
                    particle_count: 3
                }
            ));
        }

        #[test]
        fn dataset_survives_toml_snapshot() {
            let mut dataset = chain_dataset(3)
                .with_cell(SimulationCell::orthorhombic(Vector3::repeat(5.0), [true, false, true]));
            merge(&mut dataset, &[Bond::with_shift(2, 0, Vector3::new(1, 0, 0))]);

            let text = toml::to_string(&dataset).unwrap();
            let restored: ParticleDataset = toml::from_str(&text).unwrap();

            assert_eq!(restored, dataset);
            assert!(restored.verify_integrity().is_ok());
        }
    }
}
