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

//! The sharded set: identical shape to [`super::ShardedMap`] with `V = ()`
//! and no null-key restriction, same as the single-threaded pair in
//! [`crate::map`] / [`crate::set`].

use core::hash::{BuildHasher, Hash};
use std::borrow::Borrow;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::RandomState;

use crate::config::ShardedConfig;
use crate::error::SwissResult;
use crate::hash;

use super::default_shard_count;
use super::shard::Shard;

pub struct ShardedSet<K, S = RandomState> {
    shards: Vec<Shard<K, ()>>,
    shard_bits: u32,
    hasher: S,
    size: AtomicUsize,
}

impl<K> ShardedSet<K, RandomState> {
    pub fn new() -> Self {
        Self::with_shard_count(default_shard_count())
    }

    pub fn with_shard_count(shard_count: usize) -> Self {
        Self::with_shard_count_and_hasher(shard_count, RandomState::new())
    }
}

impl<K> Default for ShardedSet<K, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S: BuildHasher> ShardedSet<K, S> {
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

    /// Builds a sharded set from a validated [`ShardedConfig`].
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

    fn shard_for<Q: Hash + ?Sized>(&self, key: &Q) -> &Shard<K, ()> {
        let smeared = hash::smeared_hash(&self.hasher, key);
        &self.shards[hash::shard_index(smeared, self.shard_bits)]
    }

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

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.shard_for(key).contains(&self.hasher, key)
    }

    pub fn add(&self, key: K) -> SwissResult<bool>
    where
        K: Eq + Hash,
    {
        let newly = self.shard_for(&key).put(&self.hasher, key, ())?.is_none();
        if newly {
            self.size.fetch_add(1, Ordering::Relaxed);
        }
        Ok(newly)
    }

    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.shard_for(key).remove(&self.hasher, key).is_some();
        if removed {
            self.size.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn add_all<I>(&self, keys: I) -> SwissResult<()>
    where
        K: Eq + Hash,
        I: IntoIterator<Item = K>,
    {
        let mut buckets: Vec<Vec<(K, ())>> = (0..self.shard_count()).map(|_| Vec::new()).collect();
        for k in keys {
            let smeared = hash::smeared_hash(&self.hasher, &k);
            let idx = hash::shard_index(smeared, self.shard_bits);
            buckets[idx].push((k, ()));
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
    /// [`ShardedSetIter::remove_current`], which delegates back to this
    /// set's own `remove`.
    pub fn iter(&self) -> ShardedSetIter<'_, K, S>
    where
        K: Clone,
    {
        ShardedSetIter {
            set: self,
            shard_idx: 0,
            buffer: Vec::new().into_iter(),
            last_key: None,
        }
    }
}

pub struct ShardedSetIter<'a, K, S> {
    set: &'a ShardedSet<K, S>,
    shard_idx: usize,
    buffer: std::vec::IntoIter<K>,
    last_key: Option<K>,
}

impl<'a, K: Clone, S> Iterator for ShardedSetIter<'a, K, S> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                self.last_key = Some(item.clone());
                return Some(item);
            }
            if self.shard_idx >= self.set.shards.len() {
                return None;
            }
            let snapshot: Vec<K> = self.set.shards[self.shard_idx]
                .snapshot()
                .into_iter()
                .map(|(k, ())| k)
                .collect();
            self.shard_idx += 1;
            self.buffer = snapshot.into_iter();
        }
    }
}

impl<'a, K, S: BuildHasher> ShardedSetIter<'a, K, S> {
    /// Removes the entry most recently yielded by `next`, delegating to the
    /// wrapper's own `remove`. Returns `false` if `next` hasn't been called
    /// yet, or the entry was already removed via this method once.
    pub fn remove_current(&mut self) -> bool
    where
        K: Eq + Hash,
    {
        match self.last_key.take() {
            Some(key) => self.set.remove(&key),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_add_from_many_threads_preserves_total_count() {
        let set: Arc<ShardedSet<i32>> = Arc::new(ShardedSet::with_shard_count(8));
        let mut handles = Vec::new();
        for t in 0..8 {
            let set = Arc::clone(&set);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    set.add(t * 1000 + i).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(set.len(), 8 * 200);
    }

    #[test]
    fn add_remove_roundtrip() {
        let set: ShardedSet<i32> = ShardedSet::with_shard_count(4);
        assert!(set.add(1).unwrap());
        assert!(set.contains(&1));
        assert!(set.remove(&1));
        assert!(!set.contains(&1));
    }

    #[test]
    fn shard_count_request_rounds_up_to_a_power_of_two() {
        let set: ShardedSet<i32> = ShardedSet::with_shard_count(5);
        assert_eq!(set.shard_count(), 8);
    }

    #[test]
    fn iterator_removal_deletes_only_the_targeted_entries() {
        let set: ShardedSet<i32> = ShardedSet::with_shard_count(4);
        set.add_all(0..100).unwrap();
        let mut it = set.iter();
        while let Some(k) = it.next() {
            if k % 2 == 0 {
                assert!(it.remove_current());
            }
        }
        assert_eq!(set.len(), 50);
        for i in 0..100 {
            assert_eq!(set.contains(&i), i % 2 != 0);
        }
    }

    #[test]
    fn remove_current_before_next_is_a_noop() {
        let set: ShardedSet<i32> = ShardedSet::with_shard_count(4);
        set.add(1).unwrap();
        let mut it = set.iter();
        assert!(!it.remove_current());
    }

    #[test]
    fn with_config_rejects_a_shard_count_overlapping_h2_bits() {
        use crate::error::Error;
        let cfg = ShardedConfig {
            shard_count: 1 << 30,
            ..ShardedConfig::default()
        };
        assert!(matches!(
            ShardedSet::<i32>::with_config(cfg, RandomState::new()),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
