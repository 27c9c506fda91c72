use crate::cli::MergeBondsArgs;
use crate::config::builder::build_merge_config;
use crate::error::Result;
use crate::snapshot;
use crate::utils::progress::CliProgressHandler;
use partopo::engine::appearance::StandardAppearance;
use partopo::engine::progress::ProgressReporter;
use tracing::info;

pub fn run(args: MergeBondsArgs) -> Result<()> {
    let app_config = build_merge_config(&args)?;
    info!(
        "Merging {} candidate bond(s) with duplicate policy '{}'.",
        args.bonds.len(),
        app_config.options.duplicate_policy
    );

    let mut dataset = snapshot::read_dataset(&app_config.input_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let appearance = StandardAppearance::new(app_config.appearance);

    let summary = dataset.merge_bonds(
        &args.bonds,
        &[],
        &app_config.options,
        &appearance,
        &reporter,
    )?;

    snapshot::write_dataset(&dataset, &app_config.output_path)?;
    println!(
        "Appended {} bond(s), {} already present. Dataset now has {} bonds; written to {}",
        summary.appended,
        summary.duplicates(),
        dataset.bond_count(),
        app_config.output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::snapshot::fixtures;
    use partopo::core::models::property::StandardProperty;
    use partopo::core::models::topology::Bond;
    use partopo::engine::error::EngineError;
    use std::path::Path;
    use tempfile::tempdir;

    fn args(input: &Path, output: &Path, bonds: Vec<Bond>) -> MergeBondsArgs {
        MergeBondsArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bonds,
            config: None,
            bond_type: None,
            duplicate_policy: None,
            bond_color: None,
            bond_width: None,
            use_particle_colors: false,
            set_values: vec![],
        }
    }

    #[test]
    fn merges_new_bonds_and_skips_existing_ones() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.toml");
        let output = dir.path().join("out.toml");
        snapshot::write_dataset(&fixtures::chain(4), &input).unwrap();

        let mut merge_args = args(
            &input,
            &output,
            vec![Bond::new(1, 0), Bond::new(3, 0), Bond::new(0, 3)],
        );
        merge_args.bond_type = Some(2);
        run(merge_args).unwrap();

        let merged = snapshot::read_dataset(&output).unwrap();
        assert_eq!(merged.bond_count(), 4);
        assert_eq!(merged.bond(3), Some(Bond::new(3, 0)));
        let types = merged
            .bonds()
            .and_then(|b| b.standard(StandardProperty::Type))
            .and_then(|d| d.as_int())
            .unwrap();
        assert_eq!(types, &[0, 0, 0, 2]);
    }

    #[test]
    fn out_of_range_candidate_leaves_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.toml");
        let output = dir.path().join("out.toml");
        snapshot::write_dataset(&fixtures::chain(2), &input).unwrap();

        let err = run(args(&input, &output, vec![Bond::new(0, 5)])).unwrap_err();

        assert!(matches!(
            err,
            CliError::Engine(EngineError::CandidateOutOfRange { .. })
        ));
        assert!(!output.exists());
    }
}
