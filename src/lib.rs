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

//! An open-addressed hash map and hash set built on a SwissTable-style
//! probing scheme: packed control-byte metadata, group-wise matching, and
//! triangular probing over groups instead of individual slots.
//!
//! - [`map::SwissMap`] / [`set::SwissSet`] — single-threaded, `!Sync`.
//! - [`sharded::ShardedMap`] / [`sharded::ShardedSet`] — a fixed array of
//!   independently-locked tables behind one facade, for concurrent callers
//!   that don't need a single global snapshot (see [`sharded`] for the
//!   consistency model).
//!
//! Iteration order is unspecified and randomized per-iterator on purpose —
//! nothing in this crate promises insertion order, sorted order, or a
//! stable order across two calls to `iter()` on the same collection.

pub mod config;
pub mod error;
pub mod iter;
pub mod map;
pub mod nullable;
pub mod set;
pub mod sharded;

mod group;
mod hash;
mod probe;
mod table;
mod util;

pub use error::{Error, SwissResult};
pub use map::SwissMap;
pub use set::SwissSet;
pub use sharded::{ShardedMap, ShardedSet};
