//! The operation catalogue, grouped into three tiers (int, bool, float)
//! wrapped by a top-level enum, the same way a larger op vocabulary gets
//! split into sub-enums by category rather than one flat list.

use serde::{Deserialize, Serialize};

use crate::width::{FloatShape, Signedness};

/// Arithmetic signedness mode. `UnsignedWithSigned` is the mixed-sign case:
/// it is accepted by the catalogue but every dispatch rule for it surfaces
/// `Operation` as [`crate::error::CoreError::Unimplemented`] rather than
/// guessing -- see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithKind {
    Signed,
    Unsigned,
    UnsignedWithSigned,
}

/// Tier 1: operations over multi-bit integers (width > 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntOp {
    CastZeroExtend { to_width: u32 },
    CastSignExtend { to_width: u32 },
    CastReduce { to_width: u32 },
    CastToBit,
    CastToFloat { shape: FloatShape },
    /// Insert a sub-range `[lo, hi]` from the second operand into the first.
    BitSet { lo: u32, hi: u32 },
    Concat,
    Next(Signedness),
    Prev(Signedness),
    Add(ArithKind),
    Sub(ArithKind),
    Mul(ArithKind),
    Div(ArithKind),
    Opposite,
    Min(Signedness),
    Max(Signedness),
    Mod(Signedness),
    BitOr,
    BitAnd,
    BitXor,
    BitNot,
    Shl,
    ShrLogical,
    ShrArith,
    RotateLeft,
    RotateRight,
    CmpLt(Signedness),
    CmpLe(Signedness),
    CmpGt(Signedness),
    CmpGe(Signedness),
    CmpEq,
    CmpNe,
}

/// Tier: boolean (width-1) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// The transcendental stub catalogue: each of these always
/// widens to `Top` with every applicable float flag set, at every kind --
/// see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transcendental {
    Acos,
    Asin,
    Atan,
    Atan2,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Fabs,
    Floor,
    Fmod,
    Frexp,
    Ldexp,
    Log,
    Log10,
    Modf,
    Pow,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
}

/// Tier: float operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatOp {
    Add,
    Sub,
    Mul,
    Div,
    CastToInt { width: u32, signedness: Signedness },
    CastToFloat { shape: FloatShape },
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    Opposite,
    Transcendental(Transcendental),
}

/// The operation passed to `apply`/`apply_to`/`constraint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Int(IntOp),
    Bool(BoolOp),
    Float(FloatOp),
}

impl Operation {
    /// `true` for operations whose backward constraint rule has no precise
    /// inversion. The
    /// backward solver degrades these to "no propagation" and records
    /// `Verdict::Degradate`.
    pub fn is_non_injective_for_constraint(self) -> bool {
        matches!(
            self,
            Operation::Int(
                IntOp::BitAnd
                    | IntOp::BitOr
                    | IntOp::BitXor
                    | IntOp::Shl
                    | IntOp::ShrLogical
                    | IntOp::ShrArith
                    | IntOp::Mod(_)
                    | IntOp::RotateLeft
                    | IntOp::RotateRight
            )
        )
    }
}
