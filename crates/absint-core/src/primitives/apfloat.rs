//! IEEE-shaped float primitive: the two C-visible shapes, `binary32`/`binary64`.
//!
//! Transcendental operations are never evaluated here -- they always widen
//! to `Top` at the dispatch layer. This module only implements what is
//! required directly: the four arithmetic operations, modulo, ordered
//! comparisons, negation, and casts.

use serde::{Deserialize, Serialize};

use crate::flags::{ErrorFlag, FlagSet};
use crate::width::FloatShape;

use super::ApInt;

/// A concrete IEEE `binary32` or `binary64` value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ApFloat {
    F32(f32),
    F64(f64),
}

impl PartialEq for ApFloat {
    /// Bit-pattern equality (distinguishes `+0.0`/`-0.0`, treats all NaNs as
    /// equal to each other), consistent with `Constant`'s requirement to be
    /// a total, hashable identity rather than IEEE `==`.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ApFloat::F32(a), ApFloat::F32(b)) => a.to_bits() == b.to_bits(),
            (ApFloat::F64(a), ApFloat::F64(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl ApFloat {
    pub fn shape(&self) -> FloatShape {
        match self {
            ApFloat::F32(_) => FloatShape::Binary32,
            ApFloat::F64(_) => FloatShape::Binary64,
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            ApFloat::F32(v) => v.is_nan(),
            ApFloat::F64(v) => v.is_nan(),
        }
    }

    fn nan_flags() -> FlagSet {
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::NaN);
        f
    }

    pub fn add(&self, other: &ApFloat) -> (ApFloat, FlagSet) {
        let r = match (self, other) {
            (ApFloat::F32(a), ApFloat::F32(b)) => ApFloat::F32(a + b),
            (ApFloat::F64(a), ApFloat::F64(b)) => ApFloat::F64(a + b),
            _ => panic!("ApFloat shape mismatch in add"),
        };
        let flags = if r.is_nan() { Self::nan_flags() } else { FlagSet::new() };
        (r, flags)
    }

    pub fn sub(&self, other: &ApFloat) -> (ApFloat, FlagSet) {
        let r = match (self, other) {
            (ApFloat::F32(a), ApFloat::F32(b)) => ApFloat::F32(a - b),
            (ApFloat::F64(a), ApFloat::F64(b)) => ApFloat::F64(a - b),
            _ => panic!("ApFloat shape mismatch in sub"),
        };
        let flags = if r.is_nan() { Self::nan_flags() } else { FlagSet::new() };
        (r, flags)
    }

    pub fn mul(&self, other: &ApFloat) -> (ApFloat, FlagSet) {
        let r = match (self, other) {
            (ApFloat::F32(a), ApFloat::F32(b)) => ApFloat::F32(a * b),
            (ApFloat::F64(a), ApFloat::F64(b)) => ApFloat::F64(a * b),
            _ => panic!("ApFloat shape mismatch in mul"),
        };
        let flags = if r.is_nan() { Self::nan_flags() } else { FlagSet::new() };
        (r, flags)
    }

    pub fn div(&self, other: &ApFloat) -> (ApFloat, FlagSet) {
        let mut flags = FlagSet::new();
        let is_zero_divisor = match other {
            ApFloat::F32(v) => *v == 0.0,
            ApFloat::F64(v) => *v == 0.0,
        };
        if is_zero_divisor {
            flags.set_sure(ErrorFlag::DivisionByZero);
        }
        let r = match (self, other) {
            (ApFloat::F32(a), ApFloat::F32(b)) => ApFloat::F32(a / b),
            (ApFloat::F64(a), ApFloat::F64(b)) => ApFloat::F64(a / b),
            _ => panic!("ApFloat shape mismatch in div"),
        };
        if r.is_nan() {
            flags.set_sure(ErrorFlag::NaN);
        }
        (r, flags)
    }

    pub fn rem(&self, other: &ApFloat) -> (ApFloat, FlagSet) {
        let r = match (self, other) {
            (ApFloat::F32(a), ApFloat::F32(b)) => ApFloat::F32(a % b),
            (ApFloat::F64(a), ApFloat::F64(b)) => ApFloat::F64(a % b),
            _ => panic!("ApFloat shape mismatch in rem"),
        };
        let flags = if r.is_nan() { Self::nan_flags() } else { FlagSet::new() };
        (r, flags)
    }

    pub fn neg(&self) -> ApFloat {
        match self {
            ApFloat::F32(v) => ApFloat::F32(-v),
            ApFloat::F64(v) => ApFloat::F64(-v),
        }
    }

    pub fn fabs(&self) -> ApFloat {
        match self {
            ApFloat::F32(v) => ApFloat::F32(v.abs()),
            ApFloat::F64(v) => ApFloat::F64(v.abs()),
        }
    }

    /// Ordered `<`. NaN operands compare `false` and flag `NaN`, matching
    /// C/LLVM `fcmp o*` semantics.
    pub fn lt(&self, other: &ApFloat) -> (bool, FlagSet) {
        self.ordered_cmp(other, |a, b| a < b)
    }

    pub fn le(&self, other: &ApFloat) -> (bool, FlagSet) {
        self.ordered_cmp(other, |a, b| a <= b)
    }

    pub fn gt(&self, other: &ApFloat) -> (bool, FlagSet) {
        self.ordered_cmp(other, |a, b| a > b)
    }

    pub fn ge(&self, other: &ApFloat) -> (bool, FlagSet) {
        self.ordered_cmp(other, |a, b| a >= b)
    }

    fn ordered_cmp(&self, other: &ApFloat, op: impl Fn(f64, f64) -> bool) -> (bool, FlagSet) {
        if self.is_nan() || other.is_nan() {
            return (false, Self::nan_flags());
        }
        let (a, b) = self.as_f64_pair(other);
        (op(a, b), FlagSet::new())
    }

    fn as_f64_pair(&self, other: &ApFloat) -> (f64, f64) {
        let a = match self {
            ApFloat::F32(v) => *v as f64,
            ApFloat::F64(v) => *v,
        };
        let b = match other {
            ApFloat::F32(v) => *v as f64,
            ApFloat::F64(v) => *v,
        };
        (a, b)
    }

    pub fn cast_to_float(&self, shape: FloatShape) -> (ApFloat, FlagSet) {
        let mut flags = FlagSet::new();
        let r = match shape {
            FloatShape::Binary32 => {
                let v = match self {
                    ApFloat::F32(v) => *v,
                    ApFloat::F64(v) => {
                        let narrowed = *v as f32;
                        if narrowed as f64 != *v {
                            flags.set_sure(ErrorFlag::Inexact);
                        }
                        narrowed
                    }
                };
                ApFloat::F32(v)
            }
            FloatShape::Binary64 => ApFloat::F64(match self {
                ApFloat::F32(v) => *v as f64,
                ApFloat::F64(v) => *v,
            }),
        };
        if r.is_nan() {
            flags.set_sure(ErrorFlag::NaN);
        }
        (r, flags)
    }

    /// Casts to an integer of `width`/`signedness` with IEEE-style
    /// round-toward-zero truncation, saturating and flagging overflow the
    /// way `float->int` casts in a C-like language trap or saturate.
    pub fn cast_to_int(&self, width: u32, signedness: crate::width::Signedness) -> (ApInt, FlagSet) {
        use crate::width::Signedness;
        let mut flags = FlagSet::new();
        let value = match self {
            ApFloat::F32(v) => *v as f64,
            ApFloat::F64(v) => *v,
        };
        if value.is_nan() {
            flags.set_sure(ErrorFlag::NaN);
            return (ApInt::zero(width), flags);
        }
        let truncated = value.trunc();
        if truncated != value {
            flags.set_sure(ErrorFlag::Inexact);
        }
        match signedness {
            Signedness::Signed => {
                let max = ApInt::max_value(width, signedness).as_signed() as f64;
                let min = ApInt::min_value(width, signedness).as_signed() as f64;
                if truncated > max {
                    flags.set_sure(ErrorFlag::PositiveOverflow);
                    (ApInt::max_value(width, signedness), flags)
                } else if truncated < min {
                    flags.set_sure(ErrorFlag::NegativeOverflow);
                    (ApInt::min_value(width, signedness), flags)
                } else {
                    (ApInt::from_signed(width, truncated as i128), flags)
                }
            }
            Signedness::Unsigned => {
                let max = ApInt::max_value(width, signedness).as_unsigned() as f64;
                if truncated < 0.0 {
                    flags.set_sure(ErrorFlag::NegativeOverflow);
                    (ApInt::zero(width), flags)
                } else if truncated > max {
                    flags.set_sure(ErrorFlag::PositiveOverflow);
                    (ApInt::max_value(width, signedness), flags)
                } else {
                    (ApInt::from_unsigned(width, truncated as u128), flags)
                }
            }
        }
    }
}
