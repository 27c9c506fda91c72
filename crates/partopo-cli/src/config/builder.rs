use super::defaults::DefaultsConfig;
use super::file::{FileAppearanceConfig, FileConfig};
use super::models::MergeAppConfig;
use crate::cli::MergeBondsArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use partopo::engine::config as core_config;
use std::str::FromStr;

/// Resolves the merge configuration from, in increasing precedence: built-in
/// defaults, the configuration file, `--set` values, and dedicated flags.
pub fn build_merge_config(args: &MergeBondsArgs) -> Result<MergeAppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let merge_file = file_config.merge.take().unwrap_or_default();
    let duplicate_policy = match (args.duplicate_policy, merge_file.duplicate_policy) {
        (Some(policy), _) => policy,
        (None, Some(name)) => parse_policy(&name)?,
        (None, None) => defaults.duplicate_policy,
    };
    let options = core_config::MergeOptionsBuilder::new()
        .duplicate_policy(duplicate_policy)
        .bond_type(args.bond_type.or(merge_file.bond_type))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let appearance_file = file_config.appearance.take().unwrap_or_default();
    let appearance = merge_appearance(args, appearance_file, &defaults)?;

    Ok(MergeAppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        options,
        appearance,
    })
}

fn merge_appearance(
    args: &MergeBondsArgs,
    file_val: FileAppearanceConfig,
    defaults: &DefaultsConfig,
) -> Result<core_config::AppearanceConfig> {
    let bond_color = match &args.bond_color {
        Some(spec) => parser::parse_color(spec).map_err(|e| CliError::Argument(e.to_string()))?,
        None => file_val.bond_color.unwrap_or(defaults.bond_color),
    };
    let bond_width = args
        .bond_width
        .or(file_val.bond_width)
        .unwrap_or(defaults.bond_width);
    let use_particle_colors = args.use_particle_colors
        || file_val
            .use_particle_colors
            .unwrap_or(defaults.use_particle_colors);

    let mut builder = core_config::AppearanceConfigBuilder::new()
        .bond_color(bond_color)
        .bond_width(bond_width)
        .use_particle_colors(use_particle_colors);
    for (type_id, color) in file_val.type_colors {
        let type_id = type_id.trim().parse::<i32>().map_err(|_| {
            CliError::Config(format!(
                "Invalid bond type ID '{}' in `appearance.type-colors`",
                type_id
            ))
        })?;
        builder = builder.type_color(type_id, color);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn parse_policy(name: &str) -> Result<core_config::DuplicatePolicy> {
    core_config::DuplicatePolicy::from_str(name).map_err(|e| CliError::Config(e.to_string()))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let invalid = |kind: &str| {
            CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
        };

        match key {
            "appearance.bond-color" => {
                config
                    .appearance
                    .get_or_insert_with(Default::default)
                    .bond_color =
                    Some(parser::parse_color(value_str).map_err(|_| invalid("color"))?);
            }
            "appearance.bond-width" => {
                config
                    .appearance
                    .get_or_insert_with(Default::default)
                    .bond_width = Some(value_str.parse().map_err(|_| invalid("float"))?);
            }
            "appearance.use-particle-colors" => {
                config
                    .appearance
                    .get_or_insert_with(Default::default)
                    .use_particle_colors =
                    Some(value_str.parse().map_err(|_| invalid("boolean"))?);
            }
            "merge.duplicate-policy" => {
                parse_policy(value_str)?;
                config
                    .merge
                    .get_or_insert_with(Default::default)
                    .duplicate_policy = Some(value_str.to_string());
            }
            "merge.bond-type" => {
                config.merge.get_or_insert_with(Default::default).bond_type =
                    Some(value_str.parse().map_err(|_| invalid("integer"))?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
