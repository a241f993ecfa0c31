use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{IndexStrategy, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "wordindex")]
#[command(author, version, about = "Concurrent word frequency indexer for text files and zip archives")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a directory tree and write both reports
    Index {
        /// Configuration file (TOML, or legacy key=value)
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Number of indexer threads (overrides the configuration)
        #[arg(short, long)]
        threads: Option<usize>,

        /// How indexers publish their counts
        #[arg(short, long, value_enum)]
        strategy: Option<IndexStrategy>,

        /// Hide the progress spinner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Write a configuration template
    Init {
        /// Destination of the template
        #[arg(default_value = "wordindex.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
