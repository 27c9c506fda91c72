use crate::error::{CliError, Result};
use partopo::workflows::dataset::ParticleDataset;
use std::path::Path;
use tracing::{debug, info};

/// Loads a dataset snapshot and checks that all of its topology references
/// resolve, so commands never start from a corrupted dataset.
pub fn read_dataset(path: &Path) -> Result<ParticleDataset> {
    debug!("Reading dataset snapshot from {:?}", path);
    let content = std::fs::read_to_string(path)?;
    let dataset: ParticleDataset =
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
    dataset
        .verify_integrity()
        .map_err(|source| CliError::InvalidSnapshot {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        particles = dataset.particle_count(),
        bonds = dataset.bond_count(),
        "Loaded dataset snapshot."
    );
    Ok(dataset)
}

pub fn write_dataset(dataset: &ParticleDataset, path: &Path) -> Result<()> {
    let content = toml::to_string(dataset).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    std::fs::write(path, content)?;
    info!("Wrote dataset snapshot to {:?}", path);
    Ok(())
}
