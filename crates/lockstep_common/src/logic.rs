//! Four-state scalar logic values as observed on a simulated wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single four-state logic value.
///
/// - `Zero`: driven low
/// - `One`: driven high
/// - `X`: unknown, uninitialized or conflicting
/// - `Z`: high-impedance (undriven)
///
/// Both `X` and `Z` are *unresolved*: a model or comparator that needs a
/// definite bit must reject them instead of defaulting to zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    #[default]
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown.
    X = 2,
    /// High-impedance.
    Z = 3,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts '0', '1', 'x'/'X', and 'z'/'Z'.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }

    /// Lower-case character used in value-change dumps.
    pub fn to_vcd_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }

    /// Returns `true` for `Zero` and `One`.
    pub fn is_resolved(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Returns the boolean level, or `None` when unresolved.
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Logic::Zero => Some(false),
            Logic::One => Some(true),
            Logic::X | Logic::Z => None,
        }
    }
}

impl From<bool> for Logic {
    fn from(value: bool) -> Self {
        if value {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "X"),
            Logic::Z => write!(f, "Z"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Logic;
    use super::Logic::*;

    #[test]
    fn resolved_states() {
        assert!(Zero.is_resolved());
        assert!(One.is_resolved());
        assert!(!X.is_resolved());
        assert!(!Z.is_resolved());
    }

    #[test]
    fn to_bool_rejects_unknowns() {
        assert_eq!(Zero.to_bool(), Some(false));
        assert_eq!(One.to_bool(), Some(true));
        assert_eq!(X.to_bool(), None);
        assert_eq!(Z.to_bool(), None);
    }

    #[test]
    fn from_bool() {
        assert_eq!(Logic::from(true), One);
        assert_eq!(Logic::from(false), Zero);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{Zero}"), "0");
        assert_eq!(format!("{One}"), "1");
        assert_eq!(format!("{X}"), "X");
        assert_eq!(format!("{Z}"), "Z");
    }

    #[test]
    fn vcd_chars_are_lower_case() {
        assert_eq!(X.to_vcd_char(), 'x');
        assert_eq!(Z.to_vcd_char(), 'z');
        assert_eq!(One.to_vcd_char(), '1');
    }

    #[test]
    fn from_char_valid() {
        assert_eq!(Logic::from_char('0'), Some(Zero));
        assert_eq!(Logic::from_char('1'), Some(One));
        assert_eq!(Logic::from_char('x'), Some(X));
        assert_eq!(Logic::from_char('X'), Some(X));
        assert_eq!(Logic::from_char('z'), Some(Z));
        assert_eq!(Logic::from_char('Z'), Some(Z));
    }

    #[test]
    fn from_char_invalid() {
        assert_eq!(Logic::from_char('a'), None);
        assert_eq!(Logic::from_char('2'), None);
    }
}
