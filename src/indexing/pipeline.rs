//! Orchestrator: wires the stages together, runs them to completion and
//! collects the final word counts.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::concurrent::BoundedQueue;
use crate::config::{IndexStrategy, IndexerConfig, RunPaths};
use crate::error::{IndexError, IndexResult, PipelineError};
use crate::indexer::Walker;
use crate::report::write_report;

use super::errors::{ErrorCollector, ErrorReport};
use super::stages::{
    EndOfStream, Enumerator, Indexer, Loader, Merger, PartialQueue, PathQueue, StageContext,
    UnitQueue, WordMap, WordSink,
};
use super::stats::{PipelineStats, StatsSnapshot};

/// Word counting pipeline over one directory tree.
///
/// Topology: one enumerator, one loader, `indexing_threads` indexers and, with
/// [`IndexStrategy::Merge`], `merging_threads` mergers. Every stage runs on
/// its own named OS thread and talks to its neighbours only through bounded
/// queues.
pub struct Pipeline {
    root: PathBuf,
    settings: IndexerConfig,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(root: PathBuf, settings: IndexerConfig) -> Self {
        Self {
            root,
            settings,
            show_progress: false,
        }
    }

    /// Show a spinner that ticks once per indexed file
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Check everything that can be checked before a thread is spawned.
    fn preflight(&self) -> IndexResult<()> {
        self.settings.validate()?;
        if !self.root.exists() {
            return Err(IndexError::NotFound(format!(
                "input directory {}",
                self.root.display()
            )));
        }
        Ok(())
    }

    /// Run every stage to completion and snapshot the resulting counts.
    pub fn run(&self) -> Result<IndexOutcome, PipelineError> {
        self.preflight()?;

        let start = Instant::now();
        let settings = &self.settings;
        info!(
            "Indexing {} with {} indexer(s), strategy {}",
            self.root.display(),
            settings.indexing_threads,
            settings.strategy
        );

        let names: PathQueue = BoundedQueue::new(settings.names_queue_capacity);
        let units: UnitQueue = BoundedQueue::new(settings.files_queue_capacity);
        let partials: Option<PartialQueue> = match settings.strategy {
            IndexStrategy::Shared => None,
            IndexStrategy::Merge => Some(BoundedQueue::new(settings.words_queue_capacity)),
        };
        let map = WordMap::with_shards(settings.shard_count);

        let stats = PipelineStats::default();
        let errors = ErrorCollector::new();
        let progress = self.create_progress_bar();
        let ctx = StageContext {
            stats: &stats,
            errors: &errors,
            progress: &progress,
        };

        let enumerator = Enumerator::new(
            Walker::new(self.root.clone()).follow_links(settings.follow_links),
            settings.max_file_size,
        );
        let sink = match &partials {
            Some(queue) => WordSink::Partials(queue),
            None => WordSink::Shared(&map),
        };

        thread::scope(|scope| {
            self.run_stages(scope, &names, &units, partials.as_ref(), &map, sink, &enumerator, ctx)
        })?;

        progress.finish_and_clear();

        let counts = map.snapshot();
        let elapsed = start.elapsed();
        let stats = stats.snapshot();
        info!(
            "Indexed {} files ({} words, {} distinct) in {:.2}s",
            stats.units_indexed,
            stats.words_counted,
            counts.len(),
            elapsed.as_secs_f64()
        );

        Ok(IndexOutcome {
            counts,
            stats,
            errors: errors.get_report(),
            elapsed,
        })
    }

    /// Spawn consumers before producers, then join in pipeline order.
    ///
    /// Sentinel guards for the enumerator and loader outputs are created up
    /// front and moved into their threads. If a spawn fails, the guards of
    /// the stages that never started are dropped here, which posts their
    /// sentinels and lets the already running stages drain and exit.
    #[allow(clippy::too_many_arguments)]
    fn run_stages<'scope, 'env>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        names: &'env PathQueue,
        units: &'env UnitQueue,
        partials: Option<&'env PartialQueue>,
        map: &'env WordMap,
        sink: WordSink<'env>,
        enumerator: &'env Enumerator,
        ctx: StageContext<'env>,
    ) -> Result<(), PipelineError> {
        let settings = &self.settings;
        let names_done = EndOfStream::new(names);
        let units_done = EndOfStream::new(units);
        let partials_done = partials.map(EndOfStream::new);

        let mut spawn_error = None;
        let mut mergers = Vec::new();
        let mut indexers = Vec::new();

        if let Some(partials) = partials {
            for id in 0..settings.merging_threads {
                let merger = Merger::new(id);
                match spawn_stage(scope, format!("merger-{id}"), move || {
                    merger.run(partials, map, ctx)
                }) {
                    Ok(handle) => mergers.push(handle),
                    Err(err) => {
                        spawn_error = Some(err);
                        break;
                    }
                }
            }
        }

        if spawn_error.is_none() {
            for id in 0..settings.indexing_threads {
                let indexer = Indexer::new(id, settings.max_file_size, sink);
                match spawn_stage(scope, format!("indexer-{id}"), move || indexer.run(units, ctx)) {
                    Ok(handle) => indexers.push(handle),
                    Err(err) => {
                        spawn_error = Some(err);
                        break;
                    }
                }
            }
        }

        let loader = if spawn_error.is_none() {
            match spawn_stage(scope, "loader".to_string(), move || {
                Loader.run(names, units, units_done, ctx)
            }) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    None
                }
            }
        } else {
            drop(units_done);
            None
        };

        let enumerator = if spawn_error.is_none() {
            match spawn_stage(scope, "enumerator".to_string(), move || {
                enumerator.run(names, names_done, ctx)
            }) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    None
                }
            }
        } else {
            drop(names_done);
            None
        };

        let mut first_panic = None;
        let mut join = |handle: ScopedJoinHandle<'scope, ()>| {
            let name = handle.thread().name().unwrap_or("stage").to_string();
            match handle.join() {
                Ok(()) => debug!("Joined {}", name),
                Err(_) => {
                    first_panic.get_or_insert(PipelineError::StagePanicked(name));
                }
            }
        };

        enumerator.into_iter().for_each(&mut join);
        loader.into_iter().for_each(&mut join);
        indexers.into_iter().for_each(&mut join);
        // Every indexer has returned, so no partial can follow this sentinel.
        drop(partials_done);
        mergers.into_iter().for_each(&mut join);

        match spawn_error.or(first_panic) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn create_progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] Indexed {pos} files {msg}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

fn spawn_stage<'scope, 'env, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: String,
    body: F,
) -> Result<ScopedJoinHandle<'scope, ()>, PipelineError>
where
    F: FnOnce() + Send + 'scope,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn_scoped(scope, body)
        .map_err(|source| PipelineError::Spawn { name, source })
}

/// Result of a completed run.
#[derive(Debug)]
pub struct IndexOutcome {
    /// Consistent snapshot of the word map taken after every stage joined.
    pub counts: HashMap<String, u64>,
    pub stats: StatsSnapshot,
    pub errors: ErrorReport,
    pub elapsed: Duration,
}

impl IndexOutcome {
    /// Words in ascending byte order.
    pub fn by_name(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Words in ascending count order; equal counts stay in name order.
    pub fn by_value(&self) -> Vec<(&str, u64)> {
        let mut entries = self.by_name();
        entries.sort_by_key(|&(_, count)| count);
        entries
    }

    /// Write both sorted views to their destinations.
    pub fn write_reports(&self, paths: &RunPaths) -> IndexResult<()> {
        write_report(&paths.out_by_name, self.by_name())?;
        write_report(&paths.out_by_value, self.by_value())?;
        info!(
            "Wrote {} and {}",
            paths.out_by_name.display(),
            paths.out_by_value.display()
        );
        Ok(())
    }
}
