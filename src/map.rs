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

//! `SwissMap<K, V>`: the single-threaded key/value façade over [`TableCore`].
//! Rejects a null key (see [`crate::nullable`]) — use
//! [`crate::set::SwissSet`] if you need to store an absent-key marker.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use ahash::RandomState;

use crate::config::MapConfig;
use crate::error::{Error, SwissResult};
use crate::iter::{Iter, RemovingIter};
use crate::nullable::NullableKey;
use crate::table::TableCore;

const DEFAULT_LOAD_FACTOR: f64 = 0.875;
const DEFAULT_CAPACITY: usize = 16;

pub struct SwissMap<K, V, S = RandomState> {
    table: TableCore<K, V>,
    hasher: S,
}

impl<K, V> SwissMap<K, V, RandomState> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: TableCore::with_capacity(capacity, DEFAULT_LOAD_FACTOR),
            hasher: RandomState::new(),
        }
    }
}

impl<K, V> Default for SwissMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S: BuildHasher> SwissMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: TableCore::with_capacity(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR),
            hasher,
        }
    }

    /// Builds a map with an explicit initial capacity and load factor. Returns
    /// [`Error::InvalidConfiguration`] if `load_factor` is outside `(0.0, 1.0)`.
    pub fn with_capacity_and_load_factor(
        capacity: usize,
        load_factor: f64,
        hasher: S,
    ) -> SwissResult<Self> {
        Self::with_config(
            MapConfig {
                initial_capacity: capacity,
                load_factor,
            },
            hasher,
        )
    }

    /// Builds a map from a validated [`MapConfig`], rejected up front (not
    /// mid-operation) the same way this codebase's config loader rejects
    /// out-of-range settings at startup.
    pub fn with_config(config: MapConfig, hasher: S) -> SwissResult<Self> {
        config.validate()?;
        Ok(Self {
            table: TableCore::with_capacity(config.initial_capacity, config.load_factor),
            hasher,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.table.contains(&self.hasher, key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(&self.hasher, key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_mut(&self.hasher, key)
    }

    /// Inserts `key`/`value`, returning the previous value if `key` was
    /// already present. Fails with [`Error::NullKeyRejected`] if `key.is_null()`.
    pub fn put(&mut self, key: K, value: V) -> SwissResult<Option<V>>
    where
        K: Eq + Hash + NullableKey,
    {
        if key.is_null() {
            return Err(Error::NullKeyRejected);
        }
        self.table.put(&self.hasher, key, value)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(&self.hasher, key).map(|(_, v)| v)
    }

    /// Bulk insert from any iterable source, pre-sizing the table once up
    /// front rather than growing incrementally.
    pub fn put_all<I>(&mut self, entries: I) -> SwissResult<()>
    where
        K: Eq + Hash + NullableKey,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries = entries.into_iter();
        let (lower, _) = entries.size_hint();
        self.table.reserve_for_bulk(&self.hasher, lower);
        for (k, v) in entries {
            self.put(k, v)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.table)
    }

    /// An iterator that additionally supports removing the most recently
    /// yielded entry via [`RemovingIter::remove`].
    pub fn iter_remove(&mut self) -> RemovingIter<'_, K, V> {
        RemovingIter::new(&mut self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_null_key_rejected() {
        let mut m: SwissMap<Option<i32>, &str> = SwissMap::new();
        assert_eq!(m.put(None, "x"), Err(Error::NullKeyRejected));
        assert!(m.put(Some(1), "y").unwrap().is_none());
        assert_eq!(m.get(&Some(1)), Some(&"y"));
    }

    #[test]
    fn put_all_preserves_all_entries() {
        let mut m: SwissMap<i32, i32> = SwissMap::new();
        m.put_all((0..100).map(|i| (i, i * i))).unwrap();
        assert_eq!(m.len(), 100);
        for i in 0..100 {
            assert_eq!(m.get(&i), Some(&(i * i)));
        }
    }

    #[test]
    fn overwrite_returns_previous_value() {
        let mut m: SwissMap<&str, i32> = SwissMap::new();
        assert_eq!(m.put("a", 1).unwrap(), None);
        assert_eq!(m.put("a", 2).unwrap(), Some(1));
        assert_eq!(m.get("a"), Some(&2));
    }

    #[test]
    fn rejects_invalid_load_factor() {
        let res = SwissMap::<i32, i32, RandomState>::with_capacity_and_load_factor(
            16,
            1.5,
            RandomState::new(),
        );
        assert!(matches!(res, Err(Error::InvalidConfiguration(_))));
    }
}
