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
 * You should have received a copy of the GNU Affero License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! The group matcher: given one group of `WIDTH` contiguous control bytes,
//! answer which lanes hold a given byte value with a single packed bitmask.
//!
//! Two implementations exist behind the same shape: [`swar::Group`] (portable,
//! `WIDTH = 8`, the crate default — SIMD measured no faster on profiled
//! hardware, so SWAR stays the default for portability) and [`simd::Group`]
//! (SSE2, `WIDTH = 16`, opt-in via the `simd` feature). Variant
//! selection happens at compile time through `cfg_if!`, never as a runtime
//! branch on a hot path.

pub mod bitmask;
pub mod swar;

#[cfg(all(
    feature = "simd",
    target_feature = "sse2",
    any(target_arch = "x86", target_arch = "x86_64")
))]
pub mod simd;

cfg_if::cfg_if! {
    if #[cfg(all(
        feature = "simd",
        target_feature = "sse2",
        any(target_arch = "x86", target_arch = "x86_64")
    ))] {
        pub use self::simd::Group;
    } else {
        pub use self::swar::Group;
    }
}

/// Control byte value for an empty bucket: top bit set, rest zero.
pub const EMPTY: u8 = 0b1000_0000;
/// Control byte value for a tombstone (a deleted bucket).
pub const DELETED: u8 = 0b1111_1110;

/// A byte is live (holds a fingerprint) iff its top bit is clear.
#[inline]
pub const fn is_full(ctrl: u8) -> bool {
    ctrl & 0x80 == 0
}

/// A byte is EMPTY or DELETED iff its top bit is set.
#[inline]
pub const fn is_special(ctrl: u8) -> bool {
    ctrl & 0x80 != 0
}
