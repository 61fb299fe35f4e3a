use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cartwright")]
#[command(author, version, about = "Cue-point audio trimming and timer marker resync")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trim leading dead air up to the cue point and resync timer markers
    Trim {
        /// Asset ids (CAT/CART, CAT:CART or CATCART)
        ids: Vec<String>,

        /// Read additional asset ids from a file, one per line
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,

        /// Ask before every change instead of making it
        #[arg(long)]
        dry_run: bool,

        /// Keep going when the server rejects a metadata update
        #[arg(long)]
        continue_on_reject: bool,
    },

    /// Show the planned marker changes without touching anything
    Plan {
        /// Asset ids (CAT/CART, CAT:CART or CATCART)
        ids: Vec<String>,

        /// Read additional asset ids from a file, one per line
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
