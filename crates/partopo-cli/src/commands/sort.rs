use crate::cli::SortArgs;
use crate::error::Result;
use crate::snapshot;
use crate::utils::progress::CliProgressHandler;
use partopo::engine::progress::ProgressReporter;

pub fn run(args: SortArgs) -> Result<()> {
    let mut dataset = snapshot::read_dataset(&args.input)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let permutation = dataset.sort_by_identifier(&reporter)?;

    snapshot::write_dataset(&dataset, &args.output)?;
    if permutation.is_empty() {
        println!(
            "Particles already in identifier order; written to {}",
            args.output.display()
        );
    } else {
        println!(
            "Sorted {} particles by identifier; written to {}",
            permutation.len(),
            args.output.display()
        );
    }
    Ok(())
}
