//! Fixed-width vectors of four-state bits, stored as bit planes.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest vector a [`LogicVec`] can hold.
pub const MAX_WIDTH: u32 = 64;

/// A vector of four-state [`Logic`] values of at most [`MAX_WIDTH`] bits.
///
/// Three `u64` planes hold the bits: `value` carries the level of every
/// resolved bit, `unknown` flags bits that are X or Z, and `hiz` tells Z apart
/// from X among the unknown bits. Bit 0 is the least significant. Bits at or
/// above `width` are always clear in every plane.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicVec {
    width: u32,
    value: u64,
    unknown: u64,
    hiz: u64,
}

/// Returns a mask with the low `width` bits set.
pub fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl LogicVec {
    /// Creates a new `LogicVec` of the given width, initialized to all `Zero`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or larger than [`MAX_WIDTH`].
    pub fn new(width: u32) -> Self {
        assert!(
            (1..=MAX_WIDTH).contains(&width),
            "width {width} outside 1..={MAX_WIDTH}"
        );
        Self {
            width,
            value: 0,
            unknown: 0,
            hiz: 0,
        }
    }

    /// Creates a vector with every bit `X`.
    pub fn unknown(width: u32) -> Self {
        let mut v = Self::new(width);
        v.unknown = width_mask(width);
        v
    }

    /// Creates a vector with every bit `Z`.
    pub fn high_z(width: u32) -> Self {
        let mut v = Self::unknown(width);
        v.hiz = v.unknown;
        v
    }

    /// Creates a single-bit vector from a boolean.
    pub fn from_bool(value: bool) -> Self {
        Self::from_u64(u64::from(value), 1)
    }

    /// Creates a fully resolved vector from a `u64`, discarding bits at or
    /// above `width`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        v.value = value & width_mask(width);
        v
    }

    /// Returns the number of bits in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let bit = 1u64 << index;
        match (self.unknown & bit != 0, self.hiz & bit != 0) {
            (false, _) if self.value & bit != 0 => Logic::One,
            (false, _) => Logic::Zero,
            (true, true) => Logic::Z,
            (true, false) => Logic::X,
        }
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, logic: Logic) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let bit = 1u64 << index;
        self.value &= !bit;
        self.unknown &= !bit;
        self.hiz &= !bit;
        match logic {
            Logic::Zero => {}
            Logic::One => self.value |= bit,
            Logic::X => self.unknown |= bit,
            Logic::Z => {
                self.unknown |= bit;
                self.hiz |= bit;
            }
        }
    }

    /// Returns `true` when no bit is X or Z.
    pub fn is_resolvable(&self) -> bool {
        self.unknown == 0
    }

    /// Converts to a `u64` if every bit is resolved.
    pub fn to_u64(&self) -> Option<u64> {
        self.is_resolvable().then_some(self.value)
    }

    /// Returns the least significant bit.
    pub fn lsb(&self) -> Logic {
        self.get(0)
    }

    /// Parses a binary string like `"10XZ"` into a `LogicVec`.
    ///
    /// The leftmost character is the most significant bit. Returns `None` for
    /// invalid characters or a length outside `1..=64`.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let width = u32::try_from(s.chars().count()).ok()?;
        if !(1..=MAX_WIDTH).contains(&width) {
            return None;
        }
        let mut v = Self::new(width);
        for (i, c) in s.chars().rev().enumerate() {
            v.set(i as u32, Logic::from_char(c)?);
        }
        Some(v)
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_u64() {
            Some(v) => write!(f, "{v}"),
            None => {
                for i in (0..self.width).rev() {
                    write!(f, "{}", self.get(i))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicVec({}'b", self.width)?;
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero_and_resolvable() {
        let v = LogicVec::new(8);
        assert_eq!(v.width(), 8);
        assert_eq!(v.to_u64(), Some(0));
        assert!(v.is_resolvable());
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn new_rejects_zero_width() {
        let _ = LogicVec::new(0);
    }

    #[test]
    fn set_get_roundtrip() {
        let mut v = LogicVec::new(4);
        v.set(0, Logic::Zero);
        v.set(1, Logic::One);
        v.set(2, Logic::X);
        v.set(3, Logic::Z);
        assert_eq!(v.get(0), Logic::Zero);
        assert_eq!(v.get(1), Logic::One);
        assert_eq!(v.get(2), Logic::X);
        assert_eq!(v.get(3), Logic::Z);
    }

    #[test]
    fn overwriting_unknown_bit_resolves_it() {
        let mut v = LogicVec::unknown(2);
        v.set(0, Logic::One);
        v.set(1, Logic::Zero);
        assert_eq!(v.to_u64(), Some(1));
    }

    #[test]
    fn single_unknown_bit_makes_vector_unresolvable() {
        let mut v = LogicVec::from_u64(0b1011, 4);
        v.set(2, Logic::X);
        assert!(!v.is_resolvable());
        assert_eq!(v.to_u64(), None);
    }

    #[test]
    fn high_z_is_unresolvable() {
        let v = LogicVec::high_z(3);
        assert!(!v.is_resolvable());
        assert_eq!(v.get(1), Logic::Z);
    }

    #[test]
    fn from_u64_masks_to_width() {
        let v = LogicVec::from_u64(63, 5);
        assert_eq!(v.to_u64(), Some(31));
    }

    #[test]
    fn full_width_vector() {
        let v = LogicVec::from_u64(u64::MAX, 64);
        assert_eq!(v.to_u64(), Some(u64::MAX));
        assert_eq!(width_mask(64), u64::MAX);
    }

    #[test]
    fn from_binary_str() {
        let v = LogicVec::from_binary_str("10XZ").unwrap();
        assert_eq!(v.width(), 4);
        assert_eq!(v.get(3), Logic::One);
        assert_eq!(v.get(2), Logic::Zero);
        assert_eq!(v.get(1), Logic::X);
        assert_eq!(v.get(0), Logic::Z);
    }

    #[test]
    fn from_binary_str_invalid() {
        assert!(LogicVec::from_binary_str("10A1").is_none());
        assert!(LogicVec::from_binary_str("").is_none());
    }

    #[test]
    fn display_resolved_as_decimal() {
        assert_eq!(format!("{}", LogicVec::from_u64(67, 7)), "67");
    }

    #[test]
    fn display_unresolved_as_bits() {
        let v = LogicVec::from_binary_str("10XZ").unwrap();
        assert_eq!(format!("{v}"), "10XZ");
        assert_eq!(format!("{v:?}"), "LogicVec(4'b10XZ)");
    }

    #[test]
    fn serde_roundtrip() {
        let v = LogicVec::from_binary_str("10XZ1010").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: LogicVec = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
