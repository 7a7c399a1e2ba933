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

use std::fmt;

/// The result type returned by every fallible operation in this crate.
pub type SwissResult<T> = Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Raised by a constructor when `load_factor` or `shard_count` is out of range.
    InvalidConfiguration(String),
    /// Raised when a null-rejecting variant (the SWAR map) is given a null key.
    NullKeyRejected,
    /// The probe sequence visited every group without finding a match or an
    /// EMPTY slot. This is a fatal invariant violation: the rehash controller
    /// is supposed to prevent the table from ever saturating with tombstones.
    ProbeCycleExhausted,
    /// `remove` was called on an iterator before `next`, or twice in a row.
    IteratorIllegalState,
    /// Reserved for a future stateful iterator that detects structural
    /// mutation it did not perform. Never raised by the single-threaded core
    /// or by the sharded wrapper's snapshot iterator.
    ConcurrentModification,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::NullKeyRejected => write!(f, "null key rejected by this variant"),
            Self::ProbeCycleExhausted => {
                write!(f, "probe sequence exhausted every group without a match or an empty slot")
            }
            Self::IteratorIllegalState => {
                write!(f, "remove() called before next() or twice in a row")
            }
            Self::ConcurrentModification => {
                write!(f, "iterator detected a structural mutation it did not perform")
            }
        }
    }
}

impl std::error::Error for Error {}
