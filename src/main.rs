use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use wordindex::cli::{Cli, Commands};
use wordindex::commands::index::IndexOverrides;
use wordindex::config::Config;
use wordindex::logging::{init_early_logging, init_logging};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            config,
            threads,
            strategy,
            quiet,
        } => {
            let loaded = Config::load(&config)
                .with_context(|| format!("Failed to load {}", config.display()))?;

            // Relative log directories resolve next to the configuration file
            let base_dir = config
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            // The guard MUST be held until program exit to ensure logs are flushed
            let _logging_guard = init_logging(&loaded.logging, base_dir)?;

            tracing::info!("wordindex starting up");
            tracing::debug!("Loaded configuration from: {}", config.display());

            wordindex::commands::index::run(
                &loaded,
                IndexOverrides {
                    threads,
                    strategy,
                    quiet,
                },
            )?;
        }
        Commands::Init { path, force } => {
            init_early_logging();
            wordindex::commands::init::run(&path, force)?;
        }
    }

    Ok(())
}
