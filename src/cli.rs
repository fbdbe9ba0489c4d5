use std::path::PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "insect-thorax",
    about = "Locate the thorax band of insect specimens from segmentation label grids"
)]
pub struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Override the attachment policy from the settings file
    #[arg(long, global = true, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Paint unclassified regions gray in the overlay
    #[arg(long, global = true, default_value_t = false)]
    pub render_other: bool,

    /// Show debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Print build information and exit
    #[arg(long = "version", short = 'V')]
    pub show_version: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one label grid
    Analyze {
        /// Label grid (.json, or single-channel .png/.tif/.pgm)
        grid: PathBuf,
        /// Label hierarchy JSON naming the region ids
        #[arg(long)]
        taxonomy: PathBuf,
        /// Write the RGBA overlay as PNG
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Write the band report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Analyze every label grid in a directory
    Batch {
        dir: PathBuf,
        #[arg(long)]
        taxonomy: PathBuf,
        /// Output directory for overlays and reports
        #[arg(long)]
        out: PathBuf,
    },
    /// Write a commented settings file with the default values
    InitSettings {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Deepest,
    All,
    Percentile,
}

impl PolicyArg {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyArg::Deepest => "deepest",
            PolicyArg::All => "all",
            PolicyArg::Percentile => "percentile",
        }
    }
}
