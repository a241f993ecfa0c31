//! Index command implementation.
//!
//! Loads the configuration, applies command line overrides, runs the
//! pipeline and writes the two reports.

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::{Config, IndexStrategy};
use crate::indexing::Pipeline;

/// Options from the command line that take precedence over the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexOverrides {
    pub threads: Option<usize>,
    pub strategy: Option<IndexStrategy>,
    pub quiet: bool,
}

/// Run the index command against an already loaded configuration.
pub fn run(config: &Config, overrides: IndexOverrides) -> Result<()> {
    let paths = config.run_paths()?;

    let mut settings = config.indexer.clone();
    if let Some(threads) = overrides.threads {
        settings.indexing_threads = threads;
    }
    if let Some(strategy) = overrides.strategy {
        settings.strategy = strategy;
    }

    let outcome = Pipeline::new(paths.indir.clone(), settings)
        .with_progress(!overrides.quiet)
        .run()
        .with_context(|| format!("Indexing {} failed", paths.indir.display()))?;

    outcome
        .write_reports(&paths)
        .context("Failed to write reports")?;

    if outcome.errors.has_errors() {
        warn!("{} file(s) were skipped", outcome.errors.total_errors);
        outcome.errors.print_summary();
    }

    if !overrides.quiet {
        println!(
            "Indexed {} files ({} words, {} distinct) in {:.2}s",
            outcome.stats.units_indexed,
            outcome.stats.words_counted,
            outcome.counts.len(),
            outcome.elapsed.as_secs_f64()
        );
        println!("  by name:  {}", paths.out_by_name.display());
        println!("  by value: {}", paths.out_by_value.display());
    }

    Ok(())
}
