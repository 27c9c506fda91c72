use crate::cli::{DeleteArgs, DeleteTarget};
use crate::error::{CliError, Result};
use crate::snapshot;
use crate::utils::parser;
use crate::utils::progress::CliProgressHandler;
use bitvec::prelude::*;
use partopo::engine::progress::ProgressReporter;
use partopo::workflows::dataset::ParticleDataset;
use tracing::{info, warn};

/// Deletion mask for the particle rows in `indices`.
fn index_mask(indices: &[usize], particle_count: usize) -> Result<BitVec> {
    let mut mask = bitvec![0; particle_count];
    for &index in indices {
        if index >= particle_count {
            return Err(CliError::Argument(format!(
                "Particle index {} is out of range for {} particles",
                index, particle_count
            )));
        }
        mask.set(index, true);
    }
    Ok(mask)
}

fn resolve_mask(target: &DeleteTarget, dataset: &ParticleDataset) -> Result<Option<BitVec>> {
    match &target.indices {
        Some(list) => {
            let indices =
                parser::parse_index_list(list).map_err(|e| CliError::Argument(e.to_string()))?;
            index_mask(&indices, dataset.particle_count()).map(Some)
        }
        None => Ok(dataset.selected_particles()),
    }
}

pub fn run(args: DeleteArgs) -> Result<()> {
    let mut dataset = snapshot::read_dataset(&args.input)?;

    let Some(mask) = resolve_mask(&args.target, &dataset)? else {
        warn!("Particles carry no Selection property; nothing to delete.");
        snapshot::write_dataset(&dataset, &args.output)?;
        println!("No particles selected; dataset written unchanged to {}", args.output.display());
        return Ok(());
    };
    info!("Deleting {} of {} particles.", mask.count_ones(), mask.len());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let summary = dataset.delete_particles(&mask, &reporter)?;

    snapshot::write_dataset(&dataset, &args.output)?;
    println!(
        "Deleted {} particle(s) and {} dependent row(s); written to {}",
        summary.particles_removed,
        summary.dependents.iter().map(|(_, n)| n).sum::<usize>(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures;
    use partopo::core::models::property::{Property, PropertyData, StandardProperty};
    use std::path::Path;
    use tempfile::tempdir;

    fn args(input: &Path, output: &Path, indices: Option<&str>) -> DeleteArgs {
        DeleteArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            target: DeleteTarget {
                indices: indices.map(str::to_string),
                selected: indices.is_none(),
            },
        }
    }

    fn pairs(dataset: &ParticleDataset) -> Vec<[i64; 2]> {
        dataset
            .bonds()
            .and_then(|b| b.standard(StandardProperty::Topology))
            .and_then(|d| d.as_pairs())
            .unwrap()
            .to_vec()
    }

    #[test]
    fn deleting_by_indices_cascades_into_bonds() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.toml");
        let output = dir.path().join("out.toml");
        snapshot::write_dataset(&fixtures::chain(5), &input).unwrap();

        run(args(&input, &output, Some("2"))).unwrap();

        let result = snapshot::read_dataset(&output).unwrap();
        assert_eq!(result.particle_count(), 4);
        assert_eq!(pairs(&result), vec![[0, 1], [2, 3]]);
    }

    #[test]
    fn deleting_selected_particles_uses_selection_column() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.toml");
        let output = dir.path().join("out.toml");
        let mut dataset = fixtures::chain(4);
        dataset
            .particles_mut()
            .add_property(Property::new(
                StandardProperty::Selection,
                PropertyData::Int(vec![1, 0, 0, 0]),
            ))
            .unwrap();
        snapshot::write_dataset(&dataset, &input).unwrap();

        run(args(&input, &output, None)).unwrap();

        let result = snapshot::read_dataset(&output).unwrap();
        assert_eq!(result.particle_count(), 3);
        assert_eq!(pairs(&result), vec![[0, 1], [1, 2]]);
    }

    #[test]
    fn selection_without_column_writes_dataset_unchanged() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.toml");
        let output = dir.path().join("out.toml");
        let dataset = fixtures::chain(3);
        snapshot::write_dataset(&dataset, &input).unwrap();

        run(args(&input, &output, None)).unwrap();

        assert_eq!(snapshot::read_dataset(&output).unwrap(), dataset);
    }

    #[test]
    fn out_of_range_index_is_an_argument_error() {
        assert!(matches!(index_mask(&[0, 3], 3), Err(CliError::Argument(_))));
        assert_eq!(index_mask(&[2, 0, 2], 3).unwrap(), bitvec![1, 0, 1]);
    }
}
