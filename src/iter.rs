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

//! The iteration driver: walks every slot exactly once in an
//! order that is randomized per-iterator (so no caller may depend on a
//! stable order across two `iter()` calls on the same table), and supports
//! safe element removal mid-walk without the iterator itself triggering a
//! rehash.
//!
//! The walk is a linear-congruential permutation over slot indices:
//! `pos_i = (start + i * step) mod capacity`. Because `capacity` is always a
//! power of two and `step` is always odd, `step` is coprime to `capacity`,
//! so the sequence visits all `capacity` slots exactly once before
//! repeating — every group's worth of slots included, not just group starts.

use crate::error::Error;
use crate::group;
use crate::table::TableCore;

fn random_walk_params(capacity: usize) -> (usize, usize) {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let start = rng.gen_range(0..capacity);
    // any odd number is coprime with a power of two
    let step = rng.gen_range(0..capacity) | 1;
    (start, step)
}

/// A read-only, randomized-order iterator over a table's live entries.
pub struct Iter<'a, K, V> {
    table: &'a TableCore<K, V>,
    start: usize,
    step: usize,
    capacity: usize,
    visited: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(table: &'a TableCore<K, V>) -> Self {
        let capacity = table.capacity();
        let (start, step) = random_walk_params(capacity);
        Self {
            table,
            start,
            step,
            capacity,
            visited: 0,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.visited < self.capacity {
            let pos = (self.start + self.visited * self.step) % self.capacity;
            self.visited += 1;
            if group::is_full(self.table.ctrl_at(pos)) {
                let (k, v) = self.table.entry_at(pos).expect("full slot with no entry");
                return Some((k, v));
            }
        }
        None
    }
}

/// A randomized-order iterator that also allows removing the most recently
/// yielded entry. Unlike [`Iter`], this cannot implement [`std::iter::Iterator`]
/// (the returned borrow is only valid until the next call, which the standard
/// trait cannot express without GATs) — callers drive it with `while let Some(..)
/// = it.next() { ... }` instead.
pub struct RemovingIter<'a, K, V> {
    table: &'a mut TableCore<K, V>,
    start: usize,
    step: usize,
    capacity: usize,
    visited: usize,
    last_returned: Option<usize>,
}

impl<'a, K, V> RemovingIter<'a, K, V> {
    pub(crate) fn new(table: &'a mut TableCore<K, V>) -> Self {
        let capacity = table.capacity();
        let (start, step) = random_walk_params(capacity);
        Self {
            table,
            start,
            step,
            capacity,
            visited: 0,
            last_returned: None,
        }
    }

    /// Advance to the next live entry, if any.
    pub fn next(&mut self) -> Option<(&K, &V)> {
        self.last_returned = None;
        while self.visited < self.capacity {
            let pos = (self.start + self.visited * self.step) % self.capacity;
            self.visited += 1;
            if group::is_full(self.table.ctrl_at(pos)) {
                self.last_returned = Some(pos);
                let (k, v) = self.table.entry_at(pos).expect("full slot with no entry");
                return Some((k, v));
            }
        }
        None
    }

    /// Remove the entry most recently returned by [`Self::next`]. Marks the
    /// slot DELETED directly — it never calls back into the rehash
    /// controller, so removing mid-walk cannot invalidate the walk's own
    /// `start`/`step`/`capacity`.
    pub fn remove(&mut self) -> Result<(K, V), Error> {
        let idx = self.last_returned.take().ok_or(Error::IteratorIllegalState)?;
        Ok(self.table.take_at(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::RandomState;

    #[test]
    fn iter_visits_every_live_entry_exactly_once() {
        let mut t = TableCore::with_capacity(8, 0.875);
        let h = RandomState::new();
        for i in 0..20i32 {
            t.put(&h, i, i).unwrap();
        }
        let mut seen: Vec<i32> = Iter::new(&t).map(|(k, _)| *k).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn removing_iter_can_delete_current_entry() {
        let mut t = TableCore::with_capacity(8, 0.875);
        let h = RandomState::new();
        for i in 0..10i32 {
            t.put(&h, i, i).unwrap();
        }
        {
            let mut it = RemovingIter::new(&mut t);
            while let Some((k, _)) = it.next() {
                if *k % 2 == 0 {
                    it.remove().unwrap();
                }
            }
        }
        assert_eq!(t.len(), 5);
        for i in 0..10i32 {
            if i % 2 == 0 {
                assert_eq!(t.get(&h, &i), None);
            } else {
                assert_eq!(t.get(&h, &i), Some(&i));
            }
        }
    }

    #[test]
    fn removing_iter_rejects_double_remove() {
        let mut t = TableCore::with_capacity(8, 0.875);
        let h = RandomState::new();
        t.put(&h, 1, 1).unwrap();
        let mut it = RemovingIter::new(&mut t);
        it.next().unwrap();
        it.remove().unwrap();
        assert_eq!(it.remove(), Err(Error::IteratorIllegalState));
    }
}
