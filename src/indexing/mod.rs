//! Multi-stage word indexing pipeline

pub mod errors;
pub mod pipeline;
pub mod stages;
pub mod stats;

pub use errors::{ErrorCollector, ErrorReport, FileError, ProcessingStage};
pub use pipeline::{IndexOutcome, Pipeline};
pub use stages::{PartialCounts, StageState, WordMap};
pub use stats::{PipelineStats, StatsSnapshot};
