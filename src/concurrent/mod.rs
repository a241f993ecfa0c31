//! Synchronization primitives shared by the pipeline stages.

pub mod queue;
pub mod sharded_map;

pub use queue::{BoundedQueue, Envelope};
pub use sharded_map::{ShardedMap, DEFAULT_SHARDS};
