pub mod cli;
pub mod commands;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod indexer;
pub mod indexing;
pub mod logging;
pub mod report;

pub use concurrent::{BoundedQueue, Envelope, ShardedMap};
pub use config::Config;
pub use error::{IndexError, IndexResult, PipelineError};
pub use indexing::{IndexOutcome, Pipeline};
