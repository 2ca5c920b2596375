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
    version,
    about = "foldpost - post-processing of multi-model structure predictions: cataloguing, restrained relaxation, interface analysis and residue modification.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the ranked models of a prediction folder with their confidence scores.
    Catalog(CatalogArgs),
    /// Relax every model under error-matrix restraints, analyse interfaces,
    /// optionally apply modifications, and save the results.
    Run(RunArgs),
    /// Parse a modification annotation and print the sites as JSON.
    Annotate(AnnotateArgs),
}

/// Arguments for the `catalog` subcommand.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Prediction folder holding the ranked models.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub folder: PathBuf,

    /// Write the catalog as CSV instead of printing it.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Prediction folder holding the ranked models.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub folder: PathBuf,

    /// Folder receiving the catalog, error matrices and structures.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to an analysis configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Refinement Overrides ---
    /// Override the cycles of the side-chain relaxation.
    #[arg(long, value_name = "INT")]
    pub sidechain_cycles: Option<usize>,

    /// Override the cycles of the restrained full relaxation.
    #[arg(long, value_name = "INT")]
    pub cycles: Option<usize>,

    // --- Interface Overrides ---
    /// Override the interface descriptor (e.g. 'A_B', 'AB_C').
    #[arg(long, value_name = "DESCRIPTOR")]
    pub interface: Option<String>,

    /// Skip interface analysis.
    #[arg(long)]
    pub no_interface: bool,

    // --- Modification ---
    /// Annotation text file with modification sites (e.g. 'S45-p K12-m1').
    #[arg(short, long, value_name = "PATH")]
    pub modifications: Option<PathBuf>,

    /// Chain the annotation's residue numbers refer to.
    #[arg(long, value_name = "CHAIN")]
    pub chain: Option<char>,

    /// Lowest residue number kept from the annotation.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    pub min: Option<isize>,

    /// Highest residue number kept from the annotation; below 1 means no bound.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    pub max: Option<isize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S constraints.error-cutoff=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `annotate` subcommand.
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Annotation text file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Lowest residue number kept.
    #[arg(long, value_name = "INT", default_value_t = 1, allow_negative_numbers = true)]
    pub min: isize,

    /// Highest residue number kept; below 1 means no bound.
    #[arg(long, value_name = "INT", default_value_t = 0, allow_negative_numbers = true)]
    pub max: isize,
}
