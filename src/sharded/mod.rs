/*
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! The sharded concurrent wrapper: a fixed array of independently-locked
//! [`TableCore`]s, with shard selection on the **high** bits of the smeared
//! hash so it never correlates with in-table H2/probe placement. The
//! aggregate size counter is a single [`AtomicUsize`], updated alongside
//! (not instead of) each shard's own counters — lock-free to read, never the
//! source of truth for an individual shard's state.
//!
//! Iteration over the whole map takes one shard's read lock at a time and
//! copies its live entries out before moving to the next shard: strongly
//! consistent per shard, weakly consistent across shards — there is no
//! global snapshot and no cross-shard transaction support.

pub(crate) mod shard;
pub mod set;

use core::hash::{BuildHasher, Hash};
use std::borrow::Borrow;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::RandomState;

use crate::config::ShardedConfig;
use crate::error::{Error, SwissResult};
use crate::hash;
use crate::nullable::NullableKey;

pub use shard::Ref;
pub use set::ShardedSet;
use shard::Shard;

pub(crate) fn default_shard_count() -> usize {
    ShardedConfig::default().shard_count
}

pub struct ShardedMap<K, V, S = RandomState> {
    shards: Vec<Shard<K, V>>,
    shard_bits: u32,
    hasher: S,
    size: AtomicUsize,
}

impl<K, V> ShardedMap<K, V, RandomState> {
    pub fn new() -> Self {
        Self::with_shard_count(default_shard_count())
    }

    pub fn with_shard_count(shard_count: usize) -> Self {
        Self::with_shard_count_and_hasher(shard_count, RandomState::new())
    }
}

impl<K, V> Default for ShardedMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S: BuildHasher> ShardedMap<K, V, S> {
    pub fn with_shard_count_and_hasher(shard_count: usize, hasher: S) -> Self {
        let shard_count = crate::config::clamp_shard_count(shard_count);
        let shard_bits = shard_count.trailing_zeros();
        let defaults = ShardedConfig::default();
        let shards = (0..shard_count)
            .map(|_| Shard::new(defaults.initial_capacity, defaults.load_factor))
            .collect();
        Self {
            shards,
            shard_bits,
            hasher,
            size: AtomicUsize::new(0),
        }
    }

    /// Builds a sharded map from a validated [`ShardedConfig`].
    pub fn with_config(config: ShardedConfig, hasher: S) -> SwissResult<Self> {
        config.validate()?;
        let shard_count = config.shard_count.next_power_of_two();
        let shard_bits = shard_count.trailing_zeros();
        let shards = (0..shard_count)
            .map(|_| Shard::new(config.initial_capacity, config.load_factor))
            .collect();
        Ok(Self {
            shards,
            shard_bits,
            hasher,
            size: AtomicUsize::new(0),
        })
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for<Q: Hash + ?Sized>(&self, key: &Q) -> &Shard<K, V> {
        let smeared = hash::smeared_hash(&self.hasher, key);
        &self.shards[hash::shard_index(smeared, self.shard_bits)]
    }

    /// Lock-free: reads a single atomic counter, never touches a shard lock.
    #[inline]
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut removed = 0usize;
        for shard in &self.shards {
            removed += shard.clear();
        }
        self.size.fetch_sub(removed, Ordering::Relaxed);
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).contains(&self.hasher, key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<Ref<'_, V>>
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).get(&self.hasher, key)
    }

    pub fn put(&self, key: K, value: V) -> SwissResult<Option<V>>
    where
        K: Eq + Hash + NullableKey,
    {
        if key.is_null() {
            return Err(Error::NullKeyRejected);
        }
        let prev = self.shard_for(&key).put(&self.hasher, key, value)?;
        if prev.is_none() {
            self.size.fetch_add(1, Ordering::Relaxed);
        }
        Ok(prev)
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        let prev = self.shard_for(key).remove(&self.hasher, key);
        if prev.is_some() {
            self.size.fetch_sub(1, Ordering::Relaxed);
        }
        prev
    }

    /// Buckets `entries` by destination shard, then inserts each bucket
    /// under a single write-lock acquisition per shard.
    pub fn put_all<I>(&self, entries: I) -> SwissResult<()>
    where
        K: Eq + Hash + NullableKey,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut buckets: Vec<Vec<(K, V)>> = (0..self.shard_count()).map(|_| Vec::new()).collect();
        for (k, v) in entries {
            if k.is_null() {
                return Err(Error::NullKeyRejected);
            }
            let smeared = hash::smeared_hash(&self.hasher, &k);
            let idx = hash::shard_index(smeared, self.shard_bits);
            buckets[idx].push((k, v));
        }
        for (idx, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let inserted = self.shards[idx].put_all(&self.hasher, bucket)?;
            self.size.fetch_add(inserted, Ordering::Relaxed);
        }
        Ok(())
    }

    /// A snapshot iterator: strongly consistent within a shard, weakly
    /// consistent across shards (see module docs). Supports
    /// [`ShardedIter::remove_current`], which delegates back to this map's
    /// own `remove`.
    pub fn iter(&self) -> ShardedIter<'_, K, V, S>
    where
        K: Clone,
        V: Clone,
    {
        ShardedIter {
            map: self,
            shard_idx: 0,
            buffer: Vec::new().into_iter(),
            last_key: None,
        }
    }
}

pub struct ShardedIter<'a, K, V, S> {
    map: &'a ShardedMap<K, V, S>,
    shard_idx: usize,
    buffer: std::vec::IntoIter<(K, V)>,
    last_key: Option<K>,
}

impl<'a, K: Clone, V: Clone, S> Iterator for ShardedIter<'a, K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, v)) = self.buffer.next() {
                self.last_key = Some(k.clone());
                return Some((k, v));
            }
            if self.shard_idx >= self.map.shards.len() {
                return None;
            }
            let snapshot = self.map.shards[self.shard_idx].snapshot();
            self.shard_idx += 1;
            self.buffer = snapshot.into_iter();
        }
    }
}

impl<'a, K, V, S: BuildHasher> ShardedIter<'a, K, V, S> {
    /// Removes the entry most recently yielded by `next`, delegating to the
    /// wrapper's own `remove` (so the aggregate size counter and the shard's
    /// lock discipline stay correct). Returns `None` if `next` hasn't been
    /// called yet, or the entry was already removed via this method once.
    pub fn remove_current(&mut self) -> Option<V>
    where
        K: Eq + Hash,
    {
        let key = self.last_key.take()?;
        self.map.remove(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn s5_concurrent_put_from_many_threads_preserves_total_count() {
        let map: Arc<ShardedMap<i32, i32>> = Arc::new(ShardedMap::with_shard_count(8));
        let mut handles = Vec::new();
        for t in 0..8 {
            let map = Arc::clone(&map);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    map.put(t * 1000 + i, i).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(map.len(), 8 * 200);
        for t in 0..8 {
            for i in 0..200 {
                assert_eq!(map.get(&(t * 1000 + i)).as_deref(), Some(&i));
            }
        }
    }

    #[test]
    fn shard_selection_is_stable_for_a_given_key() {
        let map: ShardedMap<i32, i32> = ShardedMap::with_shard_count(4);
        map.put(7, 1).unwrap();
        assert_eq!(map.get(&7).as_deref(), Some(&1));
        assert_eq!(map.get(&7).as_deref(), Some(&1));
    }

    #[test]
    fn null_key_rejected() {
        let map: ShardedMap<Option<i32>, i32> = ShardedMap::with_shard_count(4);
        assert_eq!(map.put(None, 1), Err(Error::NullKeyRejected));
    }

    #[test]
    fn put_all_buckets_across_shards() {
        let map: ShardedMap<i32, i32> = ShardedMap::with_shard_count(4);
        map.put_all((0..500).map(|i| (i, i))).unwrap();
        assert_eq!(map.len(), 500);
        let mut seen: Vec<i32> = map.iter().map(|(k, _)| k).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn shard_count_request_rounds_up_to_a_power_of_two() {
        let map: ShardedMap<i32, i32> = ShardedMap::with_shard_count(5);
        assert_eq!(map.shard_count(), 8);
    }

    #[test]
    fn zero_shard_count_request_clamps_to_one() {
        let map: ShardedMap<i32, i32> = ShardedMap::with_shard_count(0);
        assert_eq!(map.shard_count(), 1);
    }

    #[test]
    fn iterator_removal_deletes_only_the_targeted_entries() {
        let map: ShardedMap<i32, i32> = ShardedMap::with_shard_count(4);
        map.put_all((0..100).map(|i| (i, i))).unwrap();
        let mut it = map.iter();
        while let Some((k, _)) = it.next() {
            if k % 2 == 0 {
                it.remove_current().unwrap();
            }
        }
        assert_eq!(map.len(), 50);
        for i in 0..100 {
            if i % 2 == 0 {
                assert!(map.get(&i).is_none());
            } else {
                assert_eq!(map.get(&i).as_deref(), Some(&i));
            }
        }
    }

    #[test]
    fn remove_current_before_next_is_a_noop() {
        let map: ShardedMap<i32, i32> = ShardedMap::with_shard_count(4);
        map.put(1, 1).unwrap();
        let mut it = map.iter();
        assert_eq!(it.remove_current(), None);
    }

    #[test]
    fn with_config_rejects_a_shard_count_overlapping_h2_bits() {
        let cfg = ShardedConfig {
            shard_count: 1 << 30,
            ..ShardedConfig::default()
        };
        assert!(matches!(
            ShardedMap::<i32, i32>::with_config(cfg, RandomState::new()),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
