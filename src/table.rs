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

//! The table core: owns the three parallel arrays (control, keys, values —
//! modeled here as one `Vec<Option<(K, V)>>` gated by the control byte) plus
//! the counters that drive the rehash controller.
//!
//! This module is single-owner, not thread-safe in isolation — all thread
//! safety lives in [`crate::sharded`]. Every method that can trigger a
//! rehash takes `&S: BuildHasher` explicitly because the table core does not
//! own a hasher; the map/set wrapper does.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;

use crate::error::Error;
use crate::group::{self, Group};
use crate::hash;
use crate::probe::ProbeSequence;
use crate::util::compiler;

const GROUP_WIDTH: usize = Group::WIDTH;

const LOAD_FACTOR_DEFAULT: f64 = 0.875;

#[inline]
fn compute_max_load(capacity: usize, load_factor: f64) -> usize {
    let raw = (capacity as f64 * load_factor).floor() as usize;
    raw.clamp(1, capacity.saturating_sub(1).max(1))
}

/// Rounds a requested minimum element count up to `group_width * 2^k`.
#[inline]
fn capacity_for(min_capacity: usize) -> usize {
    let groups_needed = (min_capacity + GROUP_WIDTH - 1) / GROUP_WIDTH;
    let group_count = groups_needed.max(1).next_power_of_two();
    group_count * GROUP_WIDTH
}

pub(crate) struct TableCore<K, V> {
    ctrl: Vec<u8>,
    entries: Vec<Option<(K, V)>>,
    live: usize,
    tombstones: usize,
    max_load: usize,
    load_factor: f64,
    group_mask: usize,
}

impl<K, V> TableCore<K, V> {
    pub fn with_capacity(min_capacity: usize, load_factor: f64) -> Self {
        let capacity = capacity_for(min_capacity);
        let group_mask = capacity / GROUP_WIDTH - 1;
        let max_load = compute_max_load(capacity, load_factor);
        Self {
            ctrl: vec![group::EMPTY; capacity],
            entries: (0..capacity).map(|_| None).collect(),
            live: 0,
            tombstones: 0,
            max_load,
            load_factor,
            group_mask,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(16, LOAD_FACTOR_DEFAULT)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ctrl.len()
    }

    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    #[inline]
    fn group_count(&self) -> usize {
        self.group_mask + 1
    }

    pub fn clear(&mut self) {
        for b in self.ctrl.iter_mut() {
            *b = group::EMPTY;
        }
        for e in self.entries.iter_mut() {
            *e = None;
        }
        self.live = 0;
        self.tombstones = 0;
    }

    #[inline]
    fn load_group(&self, g: usize) -> Group {
        let base = g * GROUP_WIDTH;
        Group::load(&self.ctrl[base..base + GROUP_WIDTH])
    }

    /// Returns the index of `key`'s entry, if present.
    pub fn find<Q, S>(&self, hasher: &S, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: BuildHasher,
    {
        if self.live == 0 {
            return None;
        }
        let (h1, h2) = hash::hash_key(hasher, key);
        let mut probe = ProbeSequence::new(h1, self.group_mask);
        let group_count = self.group_count();
        let mut visited = 0usize;
        loop {
            let g = probe.group();
            let base = g * GROUP_WIDTH;
            let group = self.load_group(g);
            for bit in group.match_fingerprint(h2) {
                let idx = base + bit;
                if let Some((k, _)) = &self.entries[idx] {
                    if k.borrow() == key {
                        return Some(idx);
                    }
                }
            }
            if group.match_empty().any_bit_set() {
                return None;
            }
            visited += 1;
            if visited >= group_count {
                return None;
            }
            probe.advance();
        }
    }

    #[inline]
    pub fn contains<Q, S>(&self, hasher: &S, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: BuildHasher,
    {
        self.find(hasher, key).is_some()
    }

    #[inline]
    pub fn get<Q, S>(&self, hasher: &S, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: BuildHasher,
    {
        let idx = self.find(hasher, key)?;
        self.entries[idx].as_ref().map(|(_, v)| v)
    }

    #[inline]
    pub fn get_mut<Q, S>(&mut self, hasher: &S, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: BuildHasher,
    {
        let idx = self.find(hasher, key)?;
        self.entries[idx].as_mut().map(|(_, v)| v)
    }

    /// Inserts `key`/`value`, overwriting and returning any previous value.
    pub fn put<S>(&mut self, hasher: &S, key: K, value: V) -> Result<Option<V>, Error>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        self.maybe_rehash(hasher);

        let (h1, h2) = hash::hash_key(hasher, &key);
        let mut probe = ProbeSequence::new(h1, self.group_mask);
        let group_count = self.group_count();
        let mut visited = 0usize;
        let mut first_tombstone: Option<usize> = None;

        loop {
            let g = probe.group();
            let base = g * GROUP_WIDTH;
            let group = self.load_group(g);

            for bit in group.match_fingerprint(h2) {
                let idx = base + bit;
                let matches = matches!(&self.entries[idx], Some((k, _)) if *k == key);
                if matches {
                    let (_, old) = self.entries[idx].replace((key, value)).unwrap();
                    return Ok(Some(old));
                }
            }

            if first_tombstone.is_none() {
                if let Some(bit) = group.match_tombstone().lowest_set_bit() {
                    first_tombstone = Some(base + bit);
                }
            }

            if let Some(bit) = group.match_empty().lowest_set_bit() {
                let target = first_tombstone.unwrap_or(base + bit);
                let reused_tombstone = first_tombstone.is_some();
                self.entries[target] = Some((key, value));
                self.ctrl[target] = h2;
                if reused_tombstone {
                    self.tombstones -= 1;
                }
                self.live += 1;
                return Ok(None);
            }

            visited += 1;
            if compiler::unlikely(visited >= group_count) {
                log::error!("probe sequence exhausted {group_count} groups without a match or an empty slot");
                return Err(Error::ProbeCycleExhausted);
            }
            probe.advance();
        }
    }

    /// Removes `key`'s entry, marking its slot DELETED, and returns it.
    pub fn remove<Q, S>(&mut self, hasher: &S, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        S: BuildHasher,
    {
        let idx = self.find(hasher, key)?;
        let kv = self.entries[idx].take();
        self.ctrl[idx] = group::DELETED;
        self.live -= 1;
        self.tombstones += 1;
        self.maybe_rehash(hasher);
        kv
    }

    /// Bulk-insert pre-sizing heuristic. Conservative: on a workload that is
    /// a pure overlap of existing keys this can over-estimate and trigger an
    /// avoidable grow; left unrefined since over-growing is cheap relative to
    /// the rehashes it avoids.
    pub fn reserve_for_bulk<S>(&mut self, hasher: &S, source_size: usize)
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        let projected = self.live + self.tombstones + source_size.saturating_sub(self.tombstones);
        if projected < self.max_load {
            return;
        }
        let mut target_capacity = self.capacity();
        while compute_max_load(target_capacity, self.load_factor) < self.live + source_size {
            target_capacity = usize::max(target_capacity * 2, GROUP_WIDTH).next_power_of_two();
        }
        if target_capacity > self.capacity() {
            log::debug!(
                "pre-growing table from {} to {target_capacity} for a bulk insert of {source_size} entries",
                self.capacity()
            );
            self.rebuild(hasher, target_capacity);
        }
    }

    /// Evaluated after every write, and before every `put`.
    fn maybe_rehash<S>(&mut self, hasher: &S)
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        if self.live + self.tombstones >= self.max_load {
            let new_capacity = usize::max(self.capacity() * 2, GROUP_WIDTH).next_power_of_two();
            log::debug!(
                "growing table: capacity {} -> {new_capacity} (live={}, tombstones={})",
                self.capacity(),
                self.live,
                self.tombstones
            );
            self.rebuild(hasher, new_capacity);
        } else if self.tombstones > self.live / 2 {
            log::debug!(
                "same-capacity rebuild at capacity {} to purge {} tombstones (live={})",
                self.capacity(),
                self.tombstones,
                self.live
            );
            let capacity = self.capacity();
            self.rebuild(hasher, capacity);
        }
    }

    /// Allocate fresh arrays, fill with EMPTY, reset counters, then reinsert
    /// every live entry via a probe that never
    /// encounters DELETED (only EMPTY, since the new table starts empty).
    fn rebuild<S>(&mut self, hasher: &S, new_capacity: usize)
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        debug_assert!(new_capacity >= GROUP_WIDTH && new_capacity.is_power_of_two() || new_capacity % GROUP_WIDTH == 0);
        let old_ctrl = mem::replace(&mut self.ctrl, vec![group::EMPTY; new_capacity]);
        let old_entries = mem::replace(
            &mut self.entries,
            (0..new_capacity).map(|_| None).collect(),
        );
        self.group_mask = new_capacity / GROUP_WIDTH - 1;
        self.max_load = compute_max_load(new_capacity, self.load_factor);
        let live_before = self.live;
        self.live = 0;
        self.tombstones = 0;

        for (ctrl_byte, slot) in old_ctrl.into_iter().zip(old_entries.into_iter()) {
            if group::is_full(ctrl_byte) {
                let (k, v) = slot.expect("control byte marked full but entry cell was empty");
                self.insert_fresh(hasher, k, v);
            }
        }
        debug_assert_eq!(self.live, live_before, "rebuild must preserve every live entry exactly once");
    }

    /// Insert into a table known to contain no DELETED slots and no entry
    /// equal to `key` (used only from [`Self::rebuild`]).
    fn insert_fresh<S>(&mut self, hasher: &S, key: K, value: V)
    where
        K: Hash,
        S: BuildHasher,
    {
        let (h1, h2) = hash::hash_key(hasher, &key);
        let mut probe = ProbeSequence::new(h1, self.group_mask);
        let group_count = self.group_count();
        for _ in 0..=group_count {
            let g = probe.group();
            let base = g * GROUP_WIDTH;
            let group = self.load_group(g);
            if let Some(bit) = group.match_empty().lowest_set_bit() {
                let idx = base + bit;
                self.ctrl[idx] = h2;
                self.entries[idx] = Some((key, value));
                self.live += 1;
                return;
            }
            probe.advance();
        }
        unreachable!("a freshly sized table must always have room for every previously-live entry");
    }

    #[inline]
    pub fn ctrl_at(&self, idx: usize) -> u8 {
        self.ctrl[idx]
    }

    #[inline]
    pub fn entry_at(&self, idx: usize) -> Option<&(K, V)> {
        self.entries[idx].as_ref()
    }

    /// A clone of every live `(K, V)` pair, in whatever order the
    /// table's slots happen to occupy (not randomized — callers that need
    /// the randomized walk should use [`crate::iter::Iter`] instead; this
    /// is for the sharded wrapper's snapshot iteration, which has already
    /// committed to per-shard rather than global ordering guarantees).
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        (0..self.capacity())
            .filter(|&i| group::is_full(self.ctrl[i]))
            .map(|i| self.entries[i].clone().unwrap())
            .collect()
    }

    /// Used by the iteration driver and the snapshot iterator: take the
    /// entry out of slot `idx`, marking it DELETED. Caller is responsible
    /// for having verified `idx` is currently full.
    pub fn take_at(&mut self, idx: usize) -> (K, V) {
        let kv = self.entries[idx].take().expect("slot marked full was empty");
        self.ctrl[idx] = group::DELETED;
        self.live -= 1;
        self.tombstones += 1;
        kv
    }
}
