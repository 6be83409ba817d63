// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sharded concurrent map keyed by `u64`
//!
//! Fine-grained locking: keys are spread over a power-of-two number of
//! buckets, each bucket an [`AHashMap`] under its own mutex. Registries
//! (actor table, concept ids, term hashes) all sit on this map.

use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;
use parking_lot::Mutex;

/// Default bucket count. Plenty for the registry sizes this engine sees.
pub const DEFAULT_SHARDS: usize = 16;

/// Concurrent `u64 -> V` map with per-bucket locks.
///
/// `len()` is maintained as an atomic counter by the mutating operations,
/// so it never takes a bucket lock. Traversal locks one bucket at a time
/// and therefore cannot deadlock against concurrent mutators; a mutation
/// racing with traversal may or may not be observed, but values are never
/// torn.
pub struct ShardedMap<V> {
    shards: Box<[Mutex<AHashMap<u64, V>>]>,
    len: AtomicUsize,
}

impl<V> ShardedMap<V> {
    /// Create a map with the default shard count.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS, 0)
    }

    /// Create a map with `shards` buckets (rounded up to a power of two)
    /// and a per-bucket initial capacity derived from `capacity`.
    pub fn with_shards(shards: usize, capacity: usize) -> Self {
        let count = shards.max(1).next_power_of_two();
        let per_bucket = capacity / count;
        let shards = (0..count)
            .map(|_| Mutex::new(AHashMap::with_capacity(per_bucket)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shards,
            len: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: u64) -> &Mutex<AHashMap<u64, V>> {
        // Shard count is a power of two; mask selects the bucket. Sequential
        // ids (the common key pattern here) spread evenly.
        &self.shards[(key as usize) & (self.shards.len() - 1)]
    }

    /// Insert or overwrite. Returns the previous value, if any.
    pub fn insert(&self, key: u64, value: V) -> Option<V> {
        let previous = self.shard(key).lock().insert(key, value);
        if previous.is_none() {
            self.len.fetch_add(1, Ordering::SeqCst);
        }
        previous
    }

    /// Insert only if the key is absent. On conflict the existing value is
    /// left in place and returned as `Err`.
    pub fn insert_if_absent(&self, key: u64, value: V) -> Result<(), V>
    where
        V: Clone,
    {
        let mut bucket = self.shard(key).lock();
        if let Some(existing) = bucket.get(&key) {
            return Err(existing.clone());
        }
        bucket.insert(key, value);
        self.len.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn remove(&self, key: u64) -> Option<V> {
        let removed = self.shard(key).lock().remove(&key);
        if removed.is_some() {
            self.len.fetch_sub(1, Ordering::SeqCst);
        }
        removed
    }

    pub fn get(&self, key: u64) -> Option<V>
    where
        V: Clone,
    {
        self.shard(key).lock().get(&key).cloned()
    }

    pub fn contains_key(&self, key: u64) -> bool {
        self.shard(key).lock().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys, taken one bucket at a time.
    pub fn keys(&self) -> Vec<u64> {
        let mut keys = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            keys.extend(shard.lock().keys().copied());
        }
        keys
    }

    /// Visit every entry, holding at most one bucket lock at a time.
    ///
    /// Entries inserted or removed in other buckets while the traversal is
    /// in flight may or may not be visited.
    pub fn for_each(&self, mut f: impl FnMut(u64, &V)) {
        for shard in self.shards.iter() {
            let bucket = shard.lock();
            for (key, value) in bucket.iter() {
                f(*key, value);
            }
        }
    }
}

impl<V> Default for ShardedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
