use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Marek Kochanczyk, Frederic Grabowski",
    version,
    about = "VIS-A-VIS CLI - Run the VIS-A-VIS cell-signaling simulator and analyze its output.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulation in a fresh workspace and report the observed hours.
    Run(RunArgs),
    /// Load the output of an existing workspace and compute statistics on it.
    Analyze(AnalyzeArgs),
    /// Write the default parameter set as JSON.
    Parameters(ParametersArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the simulator executable. `<PATH>.exe` is tried when PATH is not a file.
    #[arg(required = true, value_name = "EXECUTABLE")]
    pub executable: PathBuf,

    /// Path to the protocol file handed to the simulator.
    #[arg(required = true, value_name = "PROTOCOL")]
    pub protocol: PathBuf,

    /// Parameter file (TOML or JSON) merged over the default parameter set.
    #[arg(short, long, value_name = "PATH")]
    pub parameters: Option<PathBuf>,

    // --- Run Overrides ---
    /// Ask the simulator to write one image per timepoint.
    #[arg(long)]
    pub images: bool,

    /// Annotate the images after a successful run. Requires --images and --keep.
    #[arg(long)]
    pub annotate: bool,

    /// Keep the workspace after the run instead of removing it.
    #[arg(long)]
    pub keep: bool,

    /// Workspace name; a random `sim_...` name is generated when omitted.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Directory under which the workspace is created.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Kill the simulator if it runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Set a specific configuration value, overriding the parameter file.
    /// Can be used multiple times. Example: -S die=0.0002
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Workspace directory left behind by a finished run.
    #[arg(required = true, value_name = "DIR")]
    pub directory: PathBuf,

    /// Restrict the report to one hour. All observed hours are used otherwise.
    #[arg(long, value_name = "HOURS", allow_hyphen_values = true)]
    pub hour: Option<f64>,

    /// Association between two attributes of the same cell, e.g. `Vinf_act:ISG_act`.
    #[arg(long = "ks", value_name = "A:B")]
    pub ks: Vec<String>,

    /// Association between attributes of neighboring cells, e.g. `IFNi_act:ISG_act`.
    #[arg(long = "neighbor-ks", value_name = "A:B")]
    pub neighbor_ks: Vec<String>,

    /// Print the pairwise co-activation tables (permille of fields).
    #[arg(long)]
    pub pairwise: bool,

    /// Print the per-hour population summary.
    #[arg(long)]
    pub summary: bool,
}

/// Arguments for the `parameters` subcommand.
#[derive(Args, Debug)]
pub struct ParametersArgs {
    /// Destination file. Printed to standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing destination file.
    #[arg(long)]
    pub force: bool,
}
