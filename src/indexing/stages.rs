//! Stage bodies run on the pipeline's threads.
//!
//! Each stage loops over its input queue until the sentinel reaches the head,
//! then emits its own sentinel downstream exactly once. Sentinels are posted
//! by [`EndOfStream`] guards on drop, so a stage that unwinds, or a stage
//! whose thread never started, still releases the stages after it.

use indicatif::ProgressBar;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::concurrent::{BoundedQueue, Envelope, ShardedMap};
use crate::error::IndexResult;
use crate::indexer::{read_file, text, ArchiveReader, RawUnit, SourceKind, Walker};

use super::errors::{ErrorCollector, ProcessingStage};
use super::stats::PipelineStats;

pub type PathQueue = BoundedQueue<Envelope<PathBuf>>;
pub type UnitQueue = BoundedQueue<Envelope<RawUnit>>;
pub type PartialQueue = BoundedQueue<Envelope<PartialCounts>>;
pub type WordMap = ShardedMap<String, u64>;

/// Word counts for one unit, produced by an indexer in merge mode.
pub type PartialCounts = HashMap<String, u64>;

/// Lifecycle of a stage thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Running,
    Draining,
    Finished,
}

struct Lifecycle<'a> {
    name: &'a str,
    state: StageState,
}

impl<'a> Lifecycle<'a> {
    fn start(name: &'a str) -> Self {
        debug!(stage = name, "Stage running");
        Self {
            name,
            state: StageState::Running,
        }
    }

    fn advance(&mut self, next: StageState) {
        debug!(stage = self.name, from = ?self.state, to = ?next, "Stage transition");
        self.state = next;
    }
}

/// Posts one sentinel to its queue when dropped.
pub struct EndOfStream<'a, T> {
    queue: &'a BoundedQueue<Envelope<T>>,
}

impl<'a, T> EndOfStream<'a, T> {
    pub fn new(queue: &'a BoundedQueue<Envelope<T>>) -> Self {
        Self { queue }
    }
}

impl<T> Drop for EndOfStream<'_, T> {
    fn drop(&mut self) {
        self.queue.push_back(Envelope::Sentinel);
    }
}

/// State every stage thread shares.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub stats: &'a PipelineStats,
    pub errors: &'a ErrorCollector,
    pub progress: &'a ProgressBar,
}

/// Walks the input tree and queues every file below the size threshold.
pub struct Enumerator {
    walker: Walker,
    max_file_size: u64,
}

impl Enumerator {
    pub fn new(walker: Walker, max_file_size: u64) -> Self {
        Self {
            walker,
            max_file_size,
        }
    }

    pub fn run(&self, out: &PathQueue, done: EndOfStream<'_, PathBuf>, ctx: StageContext<'_>) {
        let mut life = Lifecycle::start("enumerator");

        for entry in self.walker.walk() {
            match entry {
                Ok(entry) if entry.is_dir => {}
                Ok(entry) if entry.size >= self.max_file_size => {
                    trace!("Skipping {} ({} bytes)", entry.path.display(), entry.size);
                    PipelineStats::incr(&ctx.stats.files_skipped_oversize);
                }
                Ok(entry) => {
                    PipelineStats::incr(&ctx.stats.files_enumerated);
                    out.push_back(Envelope::Item(entry.path));
                }
                Err(err) => {
                    PipelineStats::incr(&ctx.stats.walk_errors);
                    let path = err.path().map(PathBuf::from).unwrap_or_default();
                    ctx.errors.record(path, err, ProcessingStage::Enumerate);
                }
            }
        }

        life.advance(StageState::Draining);
        drop(done);
        life.advance(StageState::Finished);
    }
}

/// Reads queued paths into memory and tags them by format.
pub struct Loader;

impl Loader {
    pub fn run(
        &self,
        input: &PathQueue,
        out: &UnitQueue,
        done: EndOfStream<'_, RawUnit>,
        ctx: StageContext<'_>,
    ) {
        let mut life = Lifecycle::start("loader");

        while let Some(path) = input.next_item() {
            match read_file(&path) {
                Ok(bytes) => {
                    let unit = RawUnit::new(path, bytes);
                    trace!("Loaded {} as {}", unit.path.display(), unit.kind);
                    PipelineStats::incr(&ctx.stats.units_loaded);
                    out.push_back(Envelope::Item(unit));
                }
                Err(err) => {
                    warn!("Failed to read file: {}", err);
                    PipelineStats::incr(&ctx.stats.read_failures);
                    ctx.errors.record(path, err, ProcessingStage::FileRead);
                }
            }
        }

        life.advance(StageState::Draining);
        drop(done);
        life.advance(StageState::Finished);
    }
}

/// Where an indexer sends the words it finds.
#[derive(Clone, Copy)]
pub enum WordSink<'a> {
    /// Increment the shared map word by word.
    Shared(&'a WordMap),
    /// Tally each unit locally and hand the partial to the merge stage.
    Partials(&'a PartialQueue),
}

/// Turns raw units into word counts.
pub struct Indexer<'a> {
    name: String,
    max_member_size: u64,
    sink: WordSink<'a>,
}

impl<'a> Indexer<'a> {
    pub fn new(id: usize, max_member_size: u64, sink: WordSink<'a>) -> Self {
        Self {
            name: format!("indexer-{id}"),
            max_member_size,
            sink,
        }
    }

    /// Process units until the sentinel reaches the head of `input`.
    ///
    /// The sentinel is never consumed, so sibling indexers sharing the queue
    /// all see it and stop.
    pub fn run(&self, input: &UnitQueue, ctx: StageContext<'_>) {
        let mut life = Lifecycle::start(&self.name);

        while let Some(unit) = input.next_item() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.index_unit(&unit)));
            match outcome {
                Ok(Ok(words)) => {
                    PipelineStats::incr(&ctx.stats.units_indexed);
                    PipelineStats::add(&ctx.stats.words_counted, words);
                }
                Ok(Err(err)) => {
                    warn!("Skipping {}: {}", unit.path.display(), err);
                    PipelineStats::incr(&ctx.stats.unit_failures);
                    ctx.errors
                        .record(unit.path.clone(), err, ProcessingStage::Decode);
                }
                Err(_) => {
                    warn!("Panic while indexing {}", unit.path.display());
                    PipelineStats::incr(&ctx.stats.unit_failures);
                    ctx.errors.record(
                        unit.path.clone(),
                        "panic during indexing",
                        ProcessingStage::Index,
                    );
                }
            }
            ctx.progress.inc(1);
        }

        life.advance(StageState::Draining);
        life.advance(StageState::Finished);
    }

    /// Count the words of one unit, returning how many were counted.
    ///
    /// Text is extracted in full before anything is counted, so a unit that
    /// fails contributes nothing.
    pub fn index_unit(&self, unit: &RawUnit) -> IndexResult<u64> {
        let bodies = extract_texts(unit, self.max_member_size)?;

        let mut counted = 0u64;
        match self.sink {
            WordSink::Shared(map) => {
                for body in &bodies {
                    for word in text::words(body) {
                        map.upsert_or_increment(word.to_string(), 1);
                        counted += 1;
                    }
                }
            }
            WordSink::Partials(queue) => {
                let mut partial = PartialCounts::new();
                for body in &bodies {
                    for word in text::words(body) {
                        *partial.entry(word.to_string()).or_insert(0) += 1;
                        counted += 1;
                    }
                }
                if !partial.is_empty() {
                    queue.push_back(Envelope::Item(partial));
                }
            }
        }
        Ok(counted)
    }
}

/// Decoded text bodies of a unit: the file itself for plain text, every
/// `.txt` member below `max_member_size` for archives, nothing otherwise.
pub fn extract_texts(unit: &RawUnit, max_member_size: u64) -> IndexResult<Vec<String>> {
    match unit.kind {
        SourceKind::PlainText => Ok(vec![text::normalize(&unit.bytes)]),
        SourceKind::Archive => {
            let mut reader = ArchiveReader::open(&unit.bytes)?;
            let mut bodies = Vec::new();
            for member in reader.members()? {
                if SourceKind::from_path(Path::new(&member.name)) != SourceKind::PlainText {
                    continue;
                }
                if member.size >= max_member_size {
                    trace!("Skipping archive member {} ({} bytes)", member.name, member.size);
                    continue;
                }
                let bytes = reader.read_member(&member.name, max_member_size)?;
                bodies.push(text::normalize(&bytes));
            }
            Ok(bodies)
        }
        SourceKind::Unknown => {
            trace!("No text extracted from {}", unit.path.display());
            Ok(Vec::new())
        }
    }
}

/// Folds partial counts into the shared map (merge strategy).
pub struct Merger {
    name: String,
}

impl Merger {
    pub fn new(id: usize) -> Self {
        Self {
            name: format!("merger-{id}"),
        }
    }

    pub fn run(&self, input: &PartialQueue, map: &WordMap, ctx: StageContext<'_>) {
        let mut life = Lifecycle::start(&self.name);

        while let Some(partial) = input.next_item() {
            for (word, count) in partial {
                map.upsert_or_increment(word, count);
            }
            PipelineStats::incr(&ctx.stats.partials_merged);
        }

        life.advance(StageState::Draining);
        life.advance(StageState::Finished);
    }
}
