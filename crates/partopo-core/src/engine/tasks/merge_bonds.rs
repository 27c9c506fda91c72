use std::collections::HashMap;

use bitvec::prelude::*;
use nalgebra::Vector3;
use tracing::{debug, info, instrument};

use super::ensure_kind;
use crate::core::models::container::{ContainerError, ContainerKind, PropertyContainer};
use crate::core::models::property::{
    DataType, Property, PropertyData, PropertyKey, StandardProperty,
};
use crate::core::models::topology::Bond;
use crate::core::topology::adjacency::AdjacencyIndex;
use crate::engine::appearance::DefaultAppearanceProvider;
use crate::engine::config::{DuplicatePolicy, MergeOptions};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    /// Number of rows appended to the bonds container.
    pub appended: usize,
    /// Bond row each candidate resolved to, in candidate order.
    pub mapping: Vec<usize>,
}

impl MergeSummary {
    pub fn duplicates(&self) -> usize {
        self.mapping.len() - self.appended
    }
}

fn validate_auxiliary(
    bonds: &PropertyContainer,
    auxiliary: &[Property],
    candidate_count: usize,
    options: &MergeOptions,
) -> Result<(), EngineError> {
    for property in auxiliary {
        let reserved = match property.key {
            PropertyKey::Standard(StandardProperty::Topology)
            | PropertyKey::Standard(StandardProperty::PeriodicImage) => true,
            PropertyKey::Standard(StandardProperty::Type) => options.bond_type.is_some(),
            _ => false,
        };
        if reserved {
            return Err(EngineError::ReservedProperty(property.name()));
        }
        if property.len() != candidate_count {
            return Err(EngineError::AuxiliaryLengthMismatch {
                property: property.name(),
                expected: candidate_count,
                actual: property.len(),
            });
        }

        let expected = match &property.key {
            PropertyKey::Standard(standard) => Some(
                ContainerKind::Bonds.standard_layout(*standard).ok_or(
                    ContainerError::UnsupportedProperty {
                        container: ContainerKind::Bonds,
                        property: *standard,
                    },
                )?,
            ),
            PropertyKey::User(_) => bonds.get_property(&property.key).map(|p| p.data.data_type()),
        };
        if let Some(expected) = expected {
            let actual = property.data.data_type();
            if expected != actual {
                return Err(EngineError::AuxiliaryTypeMismatch {
                    property: property.name(),
                    expected,
                    actual,
                });
            }
        }
    }
    Ok(())
}

/// Resolves every candidate to an existing bond row or to a slot among the
/// rows to be appended. Returns the mapping and the bonds to append.
fn resolve_candidates(
    adjacency: &AdjacencyIndex<'_>,
    candidates: &[Bond],
    tick: &dyn Fn(),
) -> (Vec<usize>, Vec<Bond>) {
    let existing_count = adjacency.bond_count();
    let mut appended: Vec<Bond> = Vec::new();
    let mut appended_rows: HashMap<Bond, usize> = HashMap::new();

    let mapping = candidates
        .iter()
        .map(|candidate| {
            let row = match adjacency.find_bond(candidate) {
                Some(row) => row,
                None => *appended_rows
                    .entry(candidate.canonical())
                    .or_insert_with(|| {
                        appended.push(*candidate);
                        existing_count + appended.len() - 1
                    }),
            };
            tick();
            row
        })
        .collect();
    (mapping, appended)
}

/// Scatter targets for auxiliary values under the given duplicate policy.
fn scatter_targets(mapping: &[usize], row_count: usize, policy: DuplicatePolicy) -> Vec<Option<usize>> {
    match policy {
        DuplicatePolicy::LastWins => mapping.iter().map(|&row| Some(row)).collect(),
        DuplicatePolicy::FirstWins => {
            let mut claimed = bitvec![0; row_count];
            mapping
                .iter()
                .map(|&row| {
                    if claimed[row] {
                        None
                    } else {
                        claimed.set(row, true);
                        Some(row)
                    }
                })
                .collect()
        }
    }
}

/// Merges a batch of candidate bonds into `bonds` without creating duplicates.
///
/// A candidate matching an existing row in either orientation, or an earlier
/// candidate of the same batch, is not appended again; its auxiliary values
/// are written to the matched row instead. Newly appended rows get their
/// topology, periodic shift and (optionally) `options.bond_type`. Color and
/// width columns not supplied in `auxiliary` are filled for the new rows by
/// `appearance`.
///
/// All inputs are validated before the container is touched. Candidate
/// resolution is reported to `reporter` as a task with one step per candidate.
#[instrument(skip_all, name = "merge_bonds_task")]
pub fn run(
    particles: &PropertyContainer,
    bonds: &mut PropertyContainer,
    candidates: &[Bond],
    auxiliary: &[Property],
    options: &MergeOptions,
    appearance: &dyn DefaultAppearanceProvider,
    reporter: &ProgressReporter,
) -> Result<MergeSummary, EngineError> {
    ensure_kind(particles, ContainerKind::Particles)?;
    ensure_kind(bonds, ContainerKind::Bonds)?;
    if candidates.is_empty() {
        return Err(EngineError::EmptyBatch);
    }

    let particle_count = particles.element_count();
    for (candidate_index, candidate) in candidates.iter().enumerate() {
        if let Some(&index) = [candidate.index1, candidate.index2]
            .iter()
            .find(|&&index| index >= particle_count)
        {
            return Err(EngineError::CandidateOutOfRange {
                candidate: candidate_index,
                index,
                particle_count,
            });
        }
    }
    validate_auxiliary(bonds, auxiliary, candidates.len(), options)?;
    bonds.verify_integrity()?;

    let existing_count = bonds.element_count();
    let (mapping, new_bonds) = {
        let empty: &[[i64; 2]] = &[];
        let topology = if existing_count == 0 {
            bonds
                .standard(StandardProperty::Topology)
                .and_then(|data| data.as_pairs())
                .unwrap_or(empty)
        } else {
            let data = bonds.expect_standard(StandardProperty::Topology)?;
            data.as_pairs().ok_or_else(|| ContainerError::TypeMismatch {
                property: StandardProperty::Topology.to_string(),
                expected: DataType::Pairs,
                actual: data.data_type(),
            })?
        };
        let shifts = bonds
            .standard(StandardProperty::PeriodicImage)
            .and_then(|data| data.as_vec3i());
        let adjacency = AdjacencyIndex::new(topology, shifts, particle_count);
        reporter.task(candidates.len(), |tick| {
            resolve_candidates(&adjacency, candidates, tick)
        })
    };

    let appended = new_bonds.len();
    let row_count = existing_count + appended;
    debug!(
        existing = existing_count,
        candidates = candidates.len(),
        appended,
        "Resolved bond candidates against existing topology."
    );

    if appended > 0 {
        bonds.set_element_count(row_count);

        let topology = bonds.create_standard_property(StandardProperty::Topology)?;
        if let Some(rows) = topology.as_pairs_mut() {
            for (slot, bond) in rows[existing_count..].iter_mut().zip(&new_bonds) {
                *slot = bond.topology();
            }
        }

        let needs_shifts = bonds.contains(&StandardProperty::PeriodicImage.into())
            || new_bonds.iter().any(|b| b.shift != Vector3::zeros());
        if needs_shifts {
            let shifts = bonds.create_standard_property(StandardProperty::PeriodicImage)?;
            if let Some(rows) = shifts.as_vec3i_mut() {
                for (slot, bond) in rows[existing_count..].iter_mut().zip(&new_bonds) {
                    *slot = bond.shift;
                }
            }
        }

        if let Some(bond_type) = options.bond_type {
            let types = bonds.create_standard_property(StandardProperty::Type)?;
            if let Some(rows) = types.as_int_mut() {
                rows[existing_count..].fill(bond_type);
            }
        }

        apply_default_appearance(particles, bonds, auxiliary, existing_count..row_count, appearance);
    }

    if !auxiliary.is_empty() {
        let targets = scatter_targets(&mapping, row_count, options.duplicate_policy);
        for property in auxiliary {
            let column = match &property.key {
                PropertyKey::Standard(standard) => bonds.create_standard_property(*standard)?,
                PropertyKey::User(name) => {
                    bonds.create_user_property(name, property.data.data_type())?
                }
            };
            column
                .scatter_from(&property.data, &targets)
                .map_err(|mismatch| EngineError::auxiliary_type_mismatch(property.name(), mismatch))?;
            debug!(property = %property.key, "Copied auxiliary bond property.");
        }
    }

    info!(
        appended,
        duplicates = candidates.len() - appended,
        total = row_count,
        "Merged bond candidates."
    );
    Ok(MergeSummary { appended, mapping })
}

fn apply_default_appearance(
    particles: &PropertyContainer,
    bonds: &mut PropertyContainer,
    auxiliary: &[Property],
    rows: std::ops::Range<usize>,
    appearance: &dyn DefaultAppearanceProvider,
) {
    let supplied = |property: StandardProperty| {
        auxiliary
            .iter()
            .any(|p| p.key == PropertyKey::Standard(property))
    };

    if bonds.contains(&StandardProperty::Color.into()) && !supplied(StandardProperty::Color) {
        let colors = appearance.bond_colors(particles, bonds, rows.clone());
        if let Some(column) = bonds
            .standard_mut(StandardProperty::Color)
            .and_then(PropertyData::as_vec3_mut)
        {
            for (slot, color) in column[rows.clone()].iter_mut().zip(colors) {
                *slot = color;
            }
        }
    }
    if bonds.contains(&StandardProperty::Width.into()) && !supplied(StandardProperty::Width) {
        let widths = appearance.bond_widths(particles, bonds, rows.clone());
        if let Some(column) = bonds
            .standard_mut(StandardProperty::Width)
            .and_then(PropertyData::as_float_mut)
        {
            for (slot, width) in column[rows].iter_mut().zip(widths) {
                *slot = width;
            }
        }
    }
}
