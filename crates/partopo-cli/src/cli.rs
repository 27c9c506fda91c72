use clap::{Args, Parser, Subcommand};
use partopo::core::models::topology::Bond;
use partopo::engine::config::DuplicatePolicy;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "partopo CLI - Inspect and edit the bond topology of particle dataset snapshots.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel scans.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print container sizes and bond connectivity statistics of a snapshot.
    Inspect(InspectArgs),
    /// Add bonds to a snapshot, skipping bonds that already exist.
    MergeBonds(MergeBondsArgs),
    /// Delete particles together with every bond, angle, dihedral and improper using them.
    Delete(DeleteArgs),
    /// Sort particles by identifier and renumber all topology.
    Sort(SortArgs),
    /// Recompute bond periodic images from the snapshot's simulation cell.
    Images(ImagesArgs),
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the input dataset snapshot (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,
}

/// Arguments for the `merge-bonds` subcommand.
#[derive(Args, Debug)]
pub struct MergeBondsArgs {
    // --- Core Arguments ---
    /// Path to the input dataset snapshot (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output dataset snapshot.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Bond to merge, given as particle rows 'I-J' with an optional periodic
    /// shift 'I-J@SX,SY,SZ'. Can be used multiple times.
    #[arg(short, long = "bond", value_name = "SPEC", required = true, num_args(1..))]
    pub bonds: Vec<Bond>,

    /// Path to a merge configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Merge Overrides ---
    /// Assign this bond type to every newly appended bond.
    #[arg(short = 't', long, value_name = "INT")]
    pub bond_type: Option<i32>,

    /// Which duplicate candidate keeps its values: 'first' or 'last'.
    #[arg(long, value_name = "POLICY")]
    pub duplicate_policy: Option<DuplicatePolicy>,

    // --- Appearance Overrides ---
    /// Override the default color of new bonds, given as 'R,G,B' in [0, 1].
    #[arg(long, value_name = "R,G,B")]
    pub bond_color: Option<String>,

    /// Override the default width of new bonds.
    #[arg(long, value_name = "FLOAT")]
    pub bond_width: Option<f64>,

    /// Color new bonds after their first particle where particle colors exist.
    #[arg(long)]
    pub use_particle_colors: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S appearance.bond-width=0.3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `delete` subcommand.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Path to the input dataset snapshot (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output dataset snapshot.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub target: DeleteTarget,
}

/// Exactly one way of choosing the particles to delete.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct DeleteTarget {
    /// Comma-separated particle rows and inclusive ranges, e.g. '0,4,7-9'.
    #[arg(long, value_name = "LIST")]
    pub indices: Option<String>,
    /// Delete the particles whose Selection value is non-zero.
    #[arg(long)]
    pub selected: bool,
}

/// Arguments for the `sort` subcommand.
#[derive(Args, Debug)]
pub struct SortArgs {
    /// Path to the input dataset snapshot (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output dataset snapshot.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `images` subcommand.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Path to the input dataset snapshot (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output dataset snapshot.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}
