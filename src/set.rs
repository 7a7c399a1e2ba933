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

//! `SwissSet<K>`: the single-threaded set façade over [`TableCore`].
//! Unlike [`crate::map::SwissMap`], a set element may be "null" — there
//! is no value slot whose absence would be ambiguous with an absent key, so
//! the restriction [`crate::nullable::NullableKey`] exists for doesn't apply
//! here.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use ahash::RandomState;

use crate::config::SetConfig;
use crate::error::SwissResult;
use crate::iter::{Iter, RemovingIter};
use crate::table::TableCore;

const DEFAULT_LOAD_FACTOR: f64 = 0.875;
const DEFAULT_CAPACITY: usize = 16;

pub struct SwissSet<K, S = RandomState> {
    table: TableCore<K, ()>,
    hasher: S,
}

impl<K> SwissSet<K, RandomState> {
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

impl<K> Default for SwissSet<K, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S: BuildHasher> SwissSet<K, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: TableCore::with_capacity(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR),
            hasher,
        }
    }

    pub fn with_capacity_and_load_factor(
        capacity: usize,
        load_factor: f64,
        hasher: S,
    ) -> SwissResult<Self> {
        Self::with_config(
            SetConfig {
                initial_capacity: capacity,
                load_factor,
            },
            hasher,
        )
    }

    /// Builds a set from a validated [`SetConfig`].
    pub fn with_config(config: SetConfig, hasher: S) -> SwissResult<Self> {
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

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.table.contains(&self.hasher, key)
    }

    /// Adds `key`, returning `true` if it was newly inserted.
    pub fn add(&mut self, key: K) -> SwissResult<bool>
    where
        K: Eq + Hash,
    {
        Ok(self.table.put(&self.hasher, key, ())?.is_none())
    }

    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove(&self.hasher, key).is_some()
    }

    pub fn add_all<I>(&mut self, keys: I) -> SwissResult<()>
    where
        K: Eq + Hash,
        I: IntoIterator<Item = K>,
    {
        let keys = keys.into_iter();
        let (lower, _) = keys.size_hint();
        self.table.reserve_for_bulk(&self.hasher, lower);
        for k in keys {
            self.add(k)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        Iter::new(&self.table).map(|(k, _)| k)
    }

    pub fn iter_remove(&mut self) -> RemovingIter<'_, K, ()> {
        RemovingIter::new(&mut self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_accepts_null_element() {
        let mut s: SwissSet<Option<i32>> = SwissSet::new();
        assert!(s.add(None).unwrap());
        assert!(s.contains(&None));
        assert!(!s.add(None).unwrap());
    }

    #[test]
    fn add_remove_roundtrip() {
        let mut s: SwissSet<i32> = SwissSet::new();
        assert!(s.add(1).unwrap());
        assert!(s.contains(&1));
        assert!(s.remove(&1));
        assert!(!s.contains(&1));
        assert!(!s.remove(&1));
    }

    #[test]
    fn rejects_invalid_load_factor() {
        use crate::error::Error;
        let res = SwissSet::<i32, RandomState>::with_capacity_and_load_factor(
            16,
            0.0,
            RandomState::new(),
        );
        assert!(matches!(res, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn add_all_then_iterate() {
        let mut s: SwissSet<i32> = SwissSet::new();
        s.add_all(0..50).unwrap();
        assert_eq!(s.len(), 50);
        let mut seen: Vec<i32> = s.iter().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }
}
