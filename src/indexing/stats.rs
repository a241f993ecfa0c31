//! Run counters shared by the stage threads

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated with relaxed atomics; read once the stages have joined.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub files_enumerated: AtomicU64,
    pub files_skipped_oversize: AtomicU64,
    pub walk_errors: AtomicU64,
    pub units_loaded: AtomicU64,
    pub read_failures: AtomicU64,
    pub units_indexed: AtomicU64,
    pub unit_failures: AtomicU64,
    pub words_counted: AtomicU64,
    pub partials_merged: AtomicU64,
}

/// Plain copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_enumerated: u64,
    pub files_skipped_oversize: u64,
    pub walk_errors: u64,
    pub units_loaded: u64,
    pub read_failures: u64,
    pub units_indexed: u64,
    pub unit_failures: u64,
    pub words_counted: u64,
    pub partials_merged: u64,
}

impl PipelineStats {
    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            files_enumerated: load(&self.files_enumerated),
            files_skipped_oversize: load(&self.files_skipped_oversize),
            walk_errors: load(&self.walk_errors),
            units_loaded: load(&self.units_loaded),
            read_failures: load(&self.read_failures),
            units_indexed: load(&self.units_indexed),
            unit_failures: load(&self.unit_failures),
            words_counted: load(&self.words_counted),
            partials_merged: load(&self.partials_merged),
        }
    }
}
