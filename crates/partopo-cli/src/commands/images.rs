use crate::cli::ImagesArgs;
use crate::error::{CliError, Result};
use crate::snapshot;
use crate::utils::progress::CliProgressHandler;
use partopo::engine::progress::ProgressReporter;

pub fn run(args: ImagesArgs) -> Result<()> {
    let mut dataset = snapshot::read_dataset(&args.input)?;
    let cell = dataset.cell().cloned().ok_or_else(|| {
        CliError::Argument(format!(
            "Snapshot {} has no simulation cell; periodic images need one.",
            args.input.display()
        ))
    })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let crossing = dataset.generate_periodic_images(cell, &reporter)?;

    snapshot::write_dataset(&dataset, &args.output)?;
    println!(
        "{} of {} bonds cross a periodic boundary; written to {}",
        crossing,
        dataset.bond_count(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures;
    use nalgebra::Vector3;
    use partopo::core::models::cell::SimulationCell;
    use partopo::core::models::property::{PropertyData, StandardProperty};
    use tempfile::tempdir;

    #[test]
    fn images_are_written_for_bonds_crossing_the_cell() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.toml");
        let output = dir.path().join("out.toml");
        let mut dataset = fixtures::chain(4)
            .with_cell(SimulationCell::orthorhombic(Vector3::repeat(10.0), [true, false, false]));
        if let Some(PropertyData::Vec3(positions)) = dataset
            .particles_mut()
            .standard_mut(StandardProperty::Position)
        {
            positions[3].x = 9.5;
        }
        snapshot::write_dataset(&dataset, &input).unwrap();

        run(ImagesArgs {
            input: input.clone(),
            output: output.clone(),
        })
        .unwrap();

        let result = snapshot::read_dataset(&output).unwrap();
        let shifts: Vec<_> = (0..3).filter_map(|row| result.bond(row)).map(|b| b.shift).collect();
        assert_eq!(
            shifts,
            vec![Vector3::zeros(), Vector3::zeros(), Vector3::new(-1, 0, 0)]
        );
    }

    #[test]
    fn snapshot_without_cell_is_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.toml");
        snapshot::write_dataset(&fixtures::chain(2), &input).unwrap();

        let err = run(ImagesArgs {
            input,
            output: dir.path().join("out.toml"),
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }
}
