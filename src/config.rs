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

//! Construction-time configuration, validated up front rather than discovered
//! mid-operation — the same discipline this codebase's own config loader
//! applies to its settings. `MapConfig`/`SetConfig` cover the single-threaded
//! façades; `ShardedConfig` adds `shard_count` for the concurrent wrapper.

use crate::error::{Error, SwissResult};

pub(crate) const DEFAULT_INITIAL_CAPACITY: usize = 16;
pub(crate) const DEFAULT_LOAD_FACTOR: f64 = 0.875;

/// H2 occupies the low 7 bits of a 32-bit smeared hash, leaving 25 bits for
/// shard selection off the high end. A `shard_count` whose `log2` exceeds
/// this would make `shard_bits` overlap H2's bit range (correlating shard
/// choice with in-table placement) and, past 32, make
/// `hash::shard_index`'s `smeared >> (32 - shard_bits)` underflow.
pub(crate) const MAX_SHARD_BITS: u32 = 25;

fn default_shard_count() -> usize {
    (2 * num_cpus::get()).next_power_of_two()
}

/// Rounds `requested` up to a power of two and caps it at
/// `2^MAX_SHARD_BITS`, the largest shard count that still leaves H2 its own
/// 7 bits. Used by the infallible `with_shard_count*` constructors, which
/// have no `Result` to report an out-of-range request through — they clamp
/// instead of panicking or silently overlapping H2's bits. Callers that want
/// a request rejected outright should go through [`ShardedConfig::validate`].
pub(crate) fn clamp_shard_count(requested: usize) -> usize {
    let max_shards = 1usize << MAX_SHARD_BITS;
    requested
        .max(1)
        .checked_next_power_of_two()
        .map(|rounded| rounded.min(max_shards))
        .unwrap_or(max_shards)
}

fn validate_load_factor(load_factor: f64) -> SwissResult<()> {
    if load_factor > 0.0 && load_factor < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration(format!(
            "load_factor must be in (0.0, 1.0), got {load_factor}"
        )))
    }
}

/// Construction knobs shared by [`crate::map::SwissMap`] and
/// [`crate::set::SwissSet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    pub initial_capacity: usize,
    pub load_factor: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> SwissResult<()> {
        validate_load_factor(self.load_factor)
    }
}

/// `SetConfig` is the same shape as [`MapConfig`]; kept as a distinct type so
/// a future divergence between the two (e.g. a set-only knob) doesn't need to
/// touch map call sites.
pub type SetConfig = MapConfig;

/// Construction knobs for [`crate::sharded::ShardedMap`] /
/// [`crate::sharded::ShardedSet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShardedConfig {
    pub initial_capacity: usize,
    pub load_factor: f64,
    pub shard_count: usize,
}

impl Default for ShardedConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            shard_count: default_shard_count(),
        }
    }
}

impl ShardedConfig {
    pub fn validate(&self) -> SwissResult<()> {
        validate_load_factor(self.load_factor)?;
        if self.shard_count == 0 {
            return Err(Error::InvalidConfiguration(
                "shard_count must be at least 1".to_string(),
            ));
        }
        let shard_bits = match self.shard_count.checked_next_power_of_two() {
            Some(rounded) => rounded.trailing_zeros(),
            None => u32::MAX,
        };
        if shard_bits > MAX_SHARD_BITS {
            return Err(Error::InvalidConfiguration(format!(
                "shard_count {} is too large: log2 (rounded up to {shard_bits} bits) exceeds \
                 the {MAX_SHARD_BITS}-bit budget left after H2's 7 bits",
                self.shard_count
            )));
        }
        Ok(())
    }
}
