//! Lock-striped map for concurrent counting.
//!
//! Keys are routed to one of a fixed number of shards by hash. Each shard
//! owns its own `HashMap` behind its own mutex, so writers touching
//! different shards never contend. The only mutation offered is
//! [`ShardedMap::upsert_or_increment`], which reads and writes a key under a
//! single lock acquisition.

use parking_lot::{Mutex, MutexGuard};
use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ops::AddAssign;

use crate::error::{IndexError, IndexResult};

/// Shard count used when none is configured.
pub const DEFAULT_SHARDS: usize = 16;

/// Concurrent map partitioned into independently locked shards.
pub struct ShardedMap<K, V, S = RandomState> {
    shards: Box<[Mutex<HashMap<K, V>>]>,
    hasher: S,
    mask: usize,
}

impl<K, V> ShardedMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    /// Create a map with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a map with `shard_count` shards.
    ///
    /// # Panics
    /// Panics unless `shard_count` is a non-zero power of two.
    pub fn with_shards(shard_count: usize) -> Self {
        Self::with_shards_and_hasher(shard_count, RandomState::new())
    }
}

impl<K, V> Default for ShardedMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ShardedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Create a map with an explicit hasher, shared by every shard for routing.
    pub fn with_shards_and_hasher(shard_count: usize, hasher: S) -> Self {
        assert!(
            shard_count.is_power_of_two(),
            "shard count must be a power of two, got {shard_count}"
        );
        let shards = (0..shard_count)
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher,
            mask: shard_count - 1,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard that owns `key`. Stable for the lifetime of the map.
    #[inline]
    pub fn shard_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        (self.hasher.hash_one(key) as usize) & self.mask
    }

    #[inline]
    fn shard<Q>(&self, key: &Q) -> MutexGuard<'_, HashMap<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shards[self.shard_index(key)].lock()
    }

    /// Insert `key` with `delta`, or add `delta` to the value already there.
    ///
    /// The lookup and the write happen under the owning shard's lock, so
    /// concurrent calls on the same key never lose an update.
    pub fn upsert_or_increment(&self, key: K, delta: V)
    where
        V: AddAssign,
    {
        let mut shard = self.shard(&key);
        match shard.get_mut(&key) {
            Some(value) => *value += delta,
            None => {
                shard.insert(key, delta);
            }
        }
    }

    /// Current value for `key`.
    pub fn get<Q>(&self, key: &Q) -> IndexResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
        V: Clone,
    {
        self.shard(key)
            .get(key)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(format!("key {key:?}")))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shard(key).contains_key(key)
    }

    /// Total entries, summed shard by shard.
    ///
    /// Each shard is read under its own lock, so no shard is ever counted
    /// half-written, but concurrent writers can make the total stale.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.lock().is_empty())
    }

    /// Consistent copy of the whole map.
    ///
    /// Every shard lock is taken in ascending shard order and held until the
    /// copy is complete, so the result reflects a single point in time across
    /// all shards. The fixed order keeps concurrent snapshots deadlock-free.
    pub fn snapshot(&self) -> HashMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let guards: Vec<MutexGuard<'_, HashMap<K, V>>> =
            self.shards.iter().map(|shard| shard.lock()).collect();

        let total = guards.iter().map(|guard| guard.len()).sum();
        let mut copy = HashMap::with_capacity(total);
        for guard in &guards {
            copy.extend(guard.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        copy
    }
}

impl<K, V, S> fmt::Debug for ShardedMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedMap")
            .field("shards", &self.shards.len())
            .finish_non_exhaustive()
    }
}
