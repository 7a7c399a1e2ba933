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

//! [`SwissMap`](crate::map::SwissMap) rejects a "null" key; the set
//! variant accepts one freely. Rust has no universal null, so "null" here
//! means whatever a key type's author designates as its empty/absent value —
//! most naturally `Option::None`, but a sentinel-bearing type could designate
//! its own.
//!
//! There is deliberately no blanket `impl<T> NullableKey for T` — that would
//! conflict with the specific `impl NullableKey for Option<T>` below under
//! Rust's coherence rules. Instead the default method says "never null",
//! `Option<T>` overrides it, and common primitive key types get a trivial
//! opt-in impl so `SwissMap<i32, V>` etc. works out of the box. A custom key
//! type that wants its own sentinel treated as null implements this trait
//! directly.

pub trait NullableKey {
    /// Returns `true` if this value represents "no key" and should be
    /// rejected by [`crate::map::SwissMap::put`].
    fn is_null(&self) -> bool {
        false
    }
}

impl<T> NullableKey for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

macro_rules! never_null {
    ($($t:ty),* $(,)?) => {
        $(impl NullableKey for $t {})*
    };
}

never_null!(
    bool, char, str, String,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
);

impl<T: ?Sized> NullableKey for &T {}
impl<T> NullableKey for Box<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_is_null_tracks_none() {
        let some: Option<i32> = Some(1);
        let none: Option<i32> = None;
        assert!(!some.is_null());
        assert!(none.is_null());
    }

    #[test]
    fn primitives_are_never_null() {
        assert!(!42i32.is_null());
        assert!(!"hello".is_null());
    }
}
