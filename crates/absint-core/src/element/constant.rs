//! `Constant`: the singleton abstract value.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::env::{ConstraintEnvironment, EvaluationEnvironment, Verdict};
use crate::flags::{ErrorFlag, FlagSet};
use crate::ops::{ArithKind, BoolOp, FloatOp, IntOp, Operation};
use crate::primitives::{ApFloat, ApInt};
use crate::width::{FloatShape, Signedness};

use super::{Element, Top};

/// The scalar value a `Constant` owns: exactly one of an integer, a float, or a
/// boolean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Int(ApInt),
    Float(ApFloat),
    Bool(bool),
}

/// `Constant` owns one concrete primitive value. Immutable after
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    value: ScalarValue,
    signedness: Signedness,
}

impl Constant {
    pub fn from_int(value: ApInt, signedness: Signedness) -> Constant {
        Constant { value: ScalarValue::Int(value), signedness }
    }

    pub fn from_float(value: ApFloat) -> Constant {
        Constant { value: ScalarValue::Float(value), signedness: Signedness::Signed }
    }

    pub fn from_bool(value: bool) -> Constant {
        Constant { value: ScalarValue::Bool(value), signedness: Signedness::Unsigned }
    }

    pub fn value(&self) -> ScalarValue {
        self.value
    }

    pub fn as_int(&self) -> Option<ApInt> {
        match self.value {
            ScalarValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<ApFloat> {
        match self.value {
            ScalarValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            ScalarValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn width(&self) -> u32 {
        match self.value {
            ScalarValue::Int(v) => v.width(),
            ScalarValue::Float(v) => v.shape().width(),
            ScalarValue::Bool(_) => 1,
        }
    }

    pub fn signedness(&self) -> Signedness {
        self.signedness
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.value, ScalarValue::Bool(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.value, ScalarValue::Float(_))
    }

    pub fn float_shape(&self) -> Option<FloatShape> {
        match self.value {
            ScalarValue::Float(v) => Some(v.shape()),
            _ => None,
        }
    }

    /// Total order used for interval invariants and backward narrowing.
    /// Bools order `false < true`; ints order by `signedness()`; floats by
    /// their ordered comparison (NaN is never produced by a `Constant`
    /// bound, so `partial_cmp` is total here).
    pub fn compare(&self, other: &Constant) -> Ordering {
        match (self.value, other.value) {
            (ScalarValue::Int(a), ScalarValue::Int(b)) => {
                if a.eq_bits(&b) {
                    Ordering::Equal
                } else if a.compare_lt(&b, self.signedness) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => a.cmp(&b),
            (ScalarValue::Float(a), ScalarValue::Float(b)) => {
                if a == b {
                    Ordering::Equal
                } else if a.lt(&b).0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            _ => panic!("Constant::compare: scalar-type mismatch"),
        }
    }

    pub fn compare_le(&self, other: &Constant) -> bool {
        self.compare(other) != Ordering::Greater
    }

    pub fn compare_lt(&self, other: &Constant) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_zero(&self) -> bool {
        match self.value {
            ScalarValue::Int(v) => v.is_zero(),
            ScalarValue::Float(v) => v == ApFloat::F32(0.0) || matches!(v, ApFloat::F64(f) if f == 0.0),
            ScalarValue::Bool(b) => !b,
        }
    }

    /// Renders the value for `Element::write` round-tripping.
    pub fn write(&self) -> String {
        match self.value {
            ScalarValue::Int(v) => format!(
                "const:i{}:{}:{}",
                v.width(),
                if self.signedness.is_signed() { "s" } else { "u" },
                v.to_bits()
            ),
            ScalarValue::Float(ApFloat::F32(f)) => format!("const:f32:{}", f.to_bits()),
            ScalarValue::Float(ApFloat::F64(f)) => format!("const:f64:{}", f.to_bits()),
            ScalarValue::Bool(b) => format!("const:bool:{}", b),
        }
    }

    pub fn parse(text: &str) -> Option<Constant> {
        let mut parts = text.split(':');
        if parts.next()? != "const" {
            return None;
        }
        let tag = parts.next()?;
        if tag == "bool" {
            let b: bool = parts.next()?.parse().ok()?;
            return Some(Constant::from_bool(b));
        }
        if let Some(width) = tag.strip_prefix('i') {
            let width: u32 = width.parse().ok()?;
            let sign = parts.next()?;
            let bits: u128 = parts.next()?.parse().ok()?;
            let signedness = if sign == "s" { Signedness::Signed } else { Signedness::Unsigned };
            return Some(Constant::from_int(ApInt::from_bits(width, bits), signedness));
        }
        match tag {
            "f32" => {
                let bits: u32 = parts.next()?.parse().ok()?;
                Some(Constant::from_float(ApFloat::F32(f32::from_bits(bits))))
            }
            "f64" => {
                let bits: u64 = parts.next()?.parse().ok()?;
                Some(Constant::from_float(ApFloat::F64(f64::from_bits(bits))))
            }
            _ => None,
        }
    }

    /// Forward evaluation entirely delegated to the primitive value.
    pub fn apply_binary(&self, op: Operation, other: &Constant, env: &mut EvaluationEnvironment) {
        env.dispatch();
        match (op, self.value, other.value) {
            (Operation::Int(int_op), ScalarValue::Int(a), ScalarValue::Int(b)) => {
                self.apply_int(int_op, a, b, env)
            }
            (Operation::Bool(bool_op), ScalarValue::Bool(a), ScalarValue::Bool(b)) => {
                let r = match bool_op {
                    BoolOp::And => a && b,
                    BoolOp::Or => a || b,
                    BoolOp::Not => !a,
                };
                env.store_result(Element::Constant(Constant::from_bool(r)));
                env.merge_flags(FlagSet::new());
            }
            (Operation::Float(float_op), ScalarValue::Float(a), ScalarValue::Float(b)) => {
                self.apply_float(float_op, a, b, env)
            }
            _ => panic!("Constant::apply_binary: operation/scalar-type mismatch"),
        }
    }

    /// The unary half of `apply` (`Opposite`, `BitNot`, `Not`, casts, the
    /// float transcendental stubs).
    pub fn apply_unary(&self, op: Operation, env: &mut EvaluationEnvironment) {
        env.dispatch();
        match (op, self.value) {
            (Operation::Int(int_op), ScalarValue::Int(a)) => self.apply_int_unary(int_op, a, env),
            (Operation::Bool(BoolOp::Not), ScalarValue::Bool(a)) => {
                env.store_result(Element::Constant(Constant::from_bool(!a)));
                env.merge_flags(FlagSet::new());
            }
            (Operation::Float(float_op), ScalarValue::Float(a)) => {
                self.apply_float_unary(float_op, a, env)
            }
            _ => panic!("Constant::apply_unary: operation/scalar-type mismatch"),
        }
    }

    fn apply_int(&self, op: IntOp, a: ApInt, b: ApInt, env: &mut EvaluationEnvironment) {
        let signedness = self.signedness;
        match op {
            IntOp::Add(ArithKind::Signed) | IntOp::Add(ArithKind::Unsigned) => {
                let (r, f) = a.add(&b, signedness);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::Sub(ArithKind::Signed) | IntOp::Sub(ArithKind::Unsigned) => {
                let (r, f) = a.sub(&b, signedness);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::Mul(ArithKind::Signed) | IntOp::Mul(ArithKind::Unsigned) => {
                let (r, f) = a.mul(&b, signedness);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::Div(ArithKind::Signed) | IntOp::Div(ArithKind::Unsigned) => {
                let (r, f) = a.div(&b, signedness);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::Add(ArithKind::UnsignedWithSigned)
            | IntOp::Sub(ArithKind::UnsignedWithSigned)
            | IntOp::Mul(ArithKind::UnsignedWithSigned)
            | IntOp::Div(ArithKind::UnsignedWithSigned) => unimplemented_op(op, self.width(), env),
            IntOp::Mod(s) => {
                let (r, f) = a.rem(&b, s);
                env.store_result(Element::Constant(Constant::from_int(r, s)));
                env.merge_flags(f);
            }
            IntOp::Min(s) => {
                env.store_result(Element::Constant(Constant::from_int(a.min(&b, s), s)));
                env.merge_flags(FlagSet::new());
            }
            IntOp::Max(s) => {
                env.store_result(Element::Constant(Constant::from_int(a.max(&b, s), s)));
                env.merge_flags(FlagSet::new());
            }
            IntOp::BitOr => {
                env.store_result(Element::Constant(Constant::from_int(a.bitor(&b), signedness)));
                env.merge_flags(FlagSet::new());
            }
            IntOp::BitAnd => {
                env.store_result(Element::Constant(Constant::from_int(a.bitand(&b), signedness)));
                env.merge_flags(FlagSet::new());
            }
            IntOp::BitXor => {
                env.store_result(Element::Constant(Constant::from_int(a.bitxor(&b), signedness)));
                env.merge_flags(FlagSet::new());
            }
            IntOp::Shl => {
                let (r, f) = a.shl(b.as_unsigned() as u32);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::ShrLogical => {
                let (r, f) = a.shr_logical(b.as_unsigned() as u32);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::ShrArith => {
                let (r, f) = a.shr_arith(b.as_unsigned() as u32);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::RotateLeft => {
                env.store_result(Element::Constant(Constant::from_int(
                    a.rotate_left(b.as_unsigned() as u32),
                    signedness,
                )));
                env.merge_flags(FlagSet::new());
            }
            IntOp::RotateRight => {
                env.store_result(Element::Constant(Constant::from_int(
                    a.rotate_right(b.as_unsigned() as u32),
                    signedness,
                )));
                env.merge_flags(FlagSet::new());
            }
            IntOp::Concat => match a.concat(&b) {
                Some(r) => {
                    env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                    env.merge_flags(FlagSet::new());
                }
                None => {
                    env.set_empty();
                    let mut f = FlagSet::new();
                    f.set_sure(ErrorFlag::Unimplemented);
                    env.merge_flags(f);
                }
            },
            IntOp::BitSet { lo, hi } => {
                env.store_result(Element::Constant(Constant::from_int(a.bit_set(lo, hi, &b), signedness)));
                env.merge_flags(FlagSet::new());
            }
            IntOp::CmpLt(s) => bool_result(a.compare_lt(&b, s), env),
            IntOp::CmpLe(s) => bool_result(a.compare_le(&b, s), env),
            IntOp::CmpGt(s) => bool_result(a.compare_gt(&b, s), env),
            IntOp::CmpGe(s) => bool_result(a.compare_ge(&b, s), env),
            IntOp::CmpEq => bool_result(a.eq_bits(&b), env),
            IntOp::CmpNe => bool_result(!a.eq_bits(&b), env),
            _ => panic!("Constant::apply_int: {op:?} is not a binary int op"),
        }
    }

    fn apply_int_unary(&self, op: IntOp, a: ApInt, env: &mut EvaluationEnvironment) {
        let signedness = self.signedness;
        match op {
            IntOp::Opposite => {
                let (r, f) = a.opposite(signedness);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::Next(s) => {
                let (r, f) = a.next(s);
                env.store_result(Element::Constant(Constant::from_int(r, s)));
                env.merge_flags(f);
            }
            IntOp::Prev(s) => {
                let (r, f) = a.prev(s);
                env.store_result(Element::Constant(Constant::from_int(r, s)));
                env.merge_flags(f);
            }
            IntOp::BitNot => {
                env.store_result(Element::Constant(Constant::from_int(a.bitnot(), signedness)));
                env.merge_flags(FlagSet::new());
            }
            IntOp::CastZeroExtend { to_width } => {
                env.store_result(Element::Constant(Constant::from_int(
                    a.cast_zero_extend(to_width),
                    Signedness::Unsigned,
                )));
                env.merge_flags(FlagSet::new());
            }
            IntOp::CastSignExtend { to_width } => {
                env.store_result(Element::Constant(Constant::from_int(
                    a.cast_sign_extend(to_width),
                    Signedness::Signed,
                )));
                env.merge_flags(FlagSet::new());
            }
            IntOp::CastReduce { to_width } => {
                let (r, f) = a.cast_reduce(to_width);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            IntOp::CastToBit => {
                env.store_result(Element::Constant(Constant::from_bool(!a.is_zero())));
                env.merge_flags(FlagSet::new());
            }
            IntOp::CastToFloat { shape } => {
                let (r, f) = a.cast_to_float(signedness, shape);
                env.store_result(Element::Constant(Constant::from_float(r)));
                env.merge_flags(f);
            }
            _ => panic!("Constant::apply_int_unary: {op:?} is not a unary int op"),
        }
    }

    fn apply_float(&self, op: FloatOp, a: ApFloat, b: ApFloat, env: &mut EvaluationEnvironment) {
        match op {
            FloatOp::Add => store_float(a.add(&b), env),
            FloatOp::Sub => store_float(a.sub(&b), env),
            FloatOp::Mul => store_float(a.mul(&b), env),
            FloatOp::Div => store_float(a.div(&b), env),
            FloatOp::CmpLt => {
                let (r, f) = a.lt(&b);
                env.store_result(Element::Constant(Constant::from_bool(r)));
                env.merge_flags(f);
            }
            FloatOp::CmpLe => {
                let (r, f) = a.le(&b);
                env.store_result(Element::Constant(Constant::from_bool(r)));
                env.merge_flags(f);
            }
            FloatOp::CmpGt => {
                let (r, f) = a.gt(&b);
                env.store_result(Element::Constant(Constant::from_bool(r)));
                env.merge_flags(f);
            }
            FloatOp::CmpGe => {
                let (r, f) = a.ge(&b);
                env.store_result(Element::Constant(Constant::from_bool(r)));
                env.merge_flags(f);
            }
            _ => panic!("Constant::apply_float: {op:?} is not a binary float op"),
        }
    }

    fn apply_float_unary(&self, op: FloatOp, a: ApFloat, env: &mut EvaluationEnvironment) {
        match op {
            FloatOp::Opposite => {
                env.store_result(Element::Constant(Constant::from_float(a.neg())));
                env.merge_flags(FlagSet::new());
            }
            FloatOp::CastToFloat { shape } => store_float(a.cast_to_float(shape), env),
            FloatOp::CastToInt { width, signedness } => {
                let (r, f) = a.cast_to_int(width, signedness);
                env.store_result(Element::Constant(Constant::from_int(r, signedness)));
                env.merge_flags(f);
            }
            FloatOp::Transcendental(t) => {
                // Never evaluated precisely, even for a concrete constant
                //.
                let top = Top::new_for_transcendental(a.shape(), t);
                let mut f = FlagSet::new();
                f.set_may(ErrorFlag::NaN);
                f.set_may(ErrorFlag::Inexact);
                env.store_result(Element::Top(top));
                env.merge_flags(f);
            }
            _ => panic!("Constant::apply_float_unary: {op:?} is not a unary float op"),
        }
    }

    /// Backward: verify `op(self, other) ⊇ r`, else empty the environment.
    pub fn constraint_as_first(&self, other: &Element, env: &mut ConstraintEnvironment) {
        let mut fwd = EvaluationEnvironment::new(env.op, Element::Constant(*self), Some(other.clone()));
        Element::Constant(*self).apply(env.op, Some(other), &mut fwd);
        let result = fwd.finish();
        env.merge_flags(result.flags);
        match result.result {
            Some(actual) if !result.empty && env.required.contain(&actual) != Contain::False => {
                env.store_first(Element::Constant(*self));
                if let Some(o) = other.as_constant() {
                    env.store_second(Element::Constant(o));
                }
            }
            _ => {
                env.set_empty();
                env.degrade();
            }
        }
    }
}

fn bool_result(value: bool, env: &mut EvaluationEnvironment) {
    env.store_result(Element::Constant(Constant::from_bool(value)));
    env.merge_flags(FlagSet::new());
}

fn store_float((value, flags): (ApFloat, FlagSet), env: &mut EvaluationEnvironment) {
    env.store_result(Element::Constant(Constant::from_float(value)));
    env.merge_flags(flags);
}

pub(crate) fn unimplemented_op(op: IntOp, width: u32, env: &mut EvaluationEnvironment) {
    let mut f = FlagSet::new();
    f.set_sure(ErrorFlag::Unimplemented);
    env.store_result(Element::Top(Top::new(width, env.first.signedness())));
    env.merge_flags(f);
    env.merge_verdict_degradate();
    let _ = op;
}

use super::Contain;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip_constant() {
        let c = Constant::from_int(ApInt::from_signed(32, -17), Signedness::Signed);
        let json = serde_json::to_string(&c).unwrap();
        let back: Constant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn compare_le_is_consistent_with_compare() {
        let a = Constant::from_int(ApInt::from_signed(8, -3), Signedness::Signed);
        let b = Constant::from_int(ApInt::from_signed(8, 5), Signedness::Signed);
        assert!(a.compare_le(&b));
        assert!(!b.compare_le(&a));
        assert!(a.compare_le(&a));
    }
}
