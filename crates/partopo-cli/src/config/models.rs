use partopo::engine::config as core_config;
use std::path::PathBuf;

pub struct MergeAppConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub options: core_config::MergeOptions,
    pub appearance: core_config::AppearanceConfig,
}
