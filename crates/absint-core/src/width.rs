//! Bit-width, signedness, and float-shape metadata shared by every element kind.

use serde::{Deserialize, Serialize};

/// Signedness of an integer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signedness {
    Signed,
    Unsigned,
}

impl Signedness {
    pub fn flip(self) -> Signedness {
        match self {
            Signedness::Signed => Signedness::Unsigned,
            Signedness::Unsigned => Signedness::Signed,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Signedness::Signed)
    }
}

/// The two IEEE float shapes C-like source languages expose: `binary32`
/// (`f32`) and `binary64` (`f64`). `FloatShape` carries the generic
/// `(mantissa_bits, exponent_bits)` fields so a host can query them, but
/// only these two concrete shapes are implemented -- see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatShape {
    Binary32,
    Binary64,
}

impl FloatShape {
    pub fn mantissa_bits(self) -> u32 {
        match self {
            FloatShape::Binary32 => 23,
            FloatShape::Binary64 => 52,
        }
    }

    pub fn exponent_bits(self) -> u32 {
        match self {
            FloatShape::Binary32 => 8,
            FloatShape::Binary64 => 11,
        }
    }

    pub fn width(self) -> u32 {
        match self {
            FloatShape::Binary32 => 32,
            FloatShape::Binary64 => 64,
        }
    }
}

/// Maximum bit-width this implementation supports for `ApInt`. C scalar
/// types never exceed `__int128`; see DESIGN.md for why this bound was
/// chosen over a true arbitrary-precision backing store.
pub const MAX_WIDTH: u32 = 128;

pub fn is_supported_width(width: u32) -> bool {
    (1..=MAX_WIDTH).contains(&width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_roundtrips() {
        assert_eq!(Signedness::Signed.flip(), Signedness::Unsigned);
        assert_eq!(Signedness::Unsigned.flip().flip(), Signedness::Unsigned);
    }

    #[test]
    fn float_shape_bits() {
        assert_eq!(FloatShape::Binary32.mantissa_bits(), 23);
        assert_eq!(FloatShape::Binary32.exponent_bits(), 8);
        assert_eq!(FloatShape::Binary64.mantissa_bits(), 52);
        assert_eq!(FloatShape::Binary64.exponent_bits(), 11);
    }

    #[test]
    fn width_bounds() {
        assert!(is_supported_width(1));
        assert!(is_supported_width(128));
        assert!(!is_supported_width(0));
        assert!(!is_supported_width(129));
    }
}
