use crate::error::{CliError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileAppearanceConfig {
    pub bond_color: Option<[f64; 3]>,
    pub bond_width: Option<f64>,
    pub use_particle_colors: Option<bool>,
    /// Colors keyed by bond type ID. TOML keys are strings, so IDs are
    /// parsed when the configuration is built.
    #[serde(default)]
    pub type_colors: BTreeMap<String, [f64; 3]>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileMergeConfig {
    pub duplicate_policy: Option<String>,
    pub bond_type: Option<i32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub appearance: Option<FileAppearanceConfig>,
    pub merge: Option<FileMergeConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
