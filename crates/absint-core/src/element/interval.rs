//! `Interval`: the bounded-range abstract value.

use serde::{Deserialize, Serialize};

use crate::env::{ConstraintEnvironment, EvaluationEnvironment, LatticeMode, Verdict};
use crate::flags::{ErrorFlag, FlagSet};
use crate::ops::{ArithKind, IntOp, Operation};
use crate::primitives::ApInt;
use crate::width::Signedness;

use super::{Constant, Contain, Element};

/// `Interval` owns two `Constant` bounds of the same width/signedness.
/// Restricted to integers: forward rules here (shifts, bitwise, modulo,
/// overflow partitioning) are all integer-specific, and float ranges stay
/// out of this type -- see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    min: Constant,
    max: Constant,
}

impl Interval {
    /// Normalises: `min == max` collapses to `Constant`.
    /// Panics on `min > max` -- an interval is never constructed inverted;
    /// a caller that needs emptiness signals it through the environment.
    pub fn new(min: Constant, max: Constant) -> Element {
        debug_assert_eq!(min.width(), max.width(), "Interval::new: width mismatch");
        debug_assert_eq!(min.signedness(), max.signedness(), "Interval::new: signedness mismatch");
        match min.compare(&max) {
            std::cmp::Ordering::Greater => panic!("Interval::new: min > max"),
            std::cmp::Ordering::Equal => Element::Constant(min),
            std::cmp::Ordering::Less => Element::Interval(Interval { min, max }),
        }
    }

    /// Same as `new` but returns `Interval` directly, used internally once
    /// callers have already proven `min < max`.
    fn new_strict(min: Constant, max: Constant) -> Interval {
        Interval { min, max }
    }

    pub fn min(&self) -> &Constant {
        &self.min
    }

    pub fn max(&self) -> &Constant {
        &self.max
    }

    pub fn width(&self) -> u32 {
        self.min.width()
    }

    pub fn signedness(&self) -> Signedness {
        self.min.signedness()
    }

    pub fn is_boolean(&self) -> bool {
        false
    }

    pub fn is_float(&self) -> bool {
        false
    }

    pub fn contains_constant(&self, c: &Constant) -> bool {
        self.min.compare_le(c) && c.compare_le(&self.max)
    }

    fn bounds(&self) -> (ApInt, ApInt) {
        (self.min.as_int().expect("Interval bounds are always int"), self.max.as_int().expect("Interval bounds are always int"))
    }

    pub fn write(&self) -> String {
        format!("interval:{}:{}", self.min.write(), self.max.write())
    }

    pub fn parse(text: &str) -> Option<Element> {
        let rest = text.strip_prefix("interval:")?;
        let second_start = rest.match_indices("const:").nth(1)?.0;
        let min = Constant::parse(&rest[..second_start - 1])?;
        let max = Constant::parse(&rest[second_start..])?;
        Some(Interval::new(min, max))
    }

    // ---- forward: unary ----

    pub fn apply_unary(&self, op: Operation, env: &mut EvaluationEnvironment) {
        env.dispatch();
        let (lo, hi) = self.bounds();
        let signedness = self.signedness();
        match op {
            Operation::Int(IntOp::Opposite) => {
                let (r0, f0) = lo.opposite(signedness);
                let (r1, f1) = hi.opposite(signedness);
                // Negation reverses order: apply to hi first, lo second.
                endpoint_result(r1, f1, r0, f0, signedness, env);
            }
            Operation::Int(IntOp::BitNot) => {
                store_interval(
                    Interval::new(Constant::from_int(hi.bitnot(), signedness), Constant::from_int(lo.bitnot(), signedness)),
                    FlagSet::new(),
                    env,
                );
            }
            Operation::Int(IntOp::Next(s)) => {
                let (r, f) = hi.next(s);
                store_interval(Interval::new(Constant::from_int(lo, s), Constant::from_int(r, s)), f.downgrade_sure_to_may(), env);
            }
            Operation::Int(IntOp::Prev(s)) => {
                let (r, f) = lo.prev(s);
                store_interval(Interval::new(Constant::from_int(r, s), Constant::from_int(hi, s)), f.downgrade_sure_to_may(), env);
            }
            Operation::Int(IntOp::CastZeroExtend { to_width }) => {
                store_interval(
                    Interval::new(
                        Constant::from_int(lo.cast_zero_extend(to_width), Signedness::Unsigned),
                        Constant::from_int(hi.cast_zero_extend(to_width), Signedness::Unsigned),
                    ),
                    FlagSet::new(),
                    env,
                );
            }
            Operation::Int(IntOp::CastSignExtend { to_width }) => {
                store_interval(
                    Interval::new(
                        Constant::from_int(lo.cast_sign_extend(to_width), Signedness::Signed),
                        Constant::from_int(hi.cast_sign_extend(to_width), Signedness::Signed),
                    ),
                    FlagSet::new(),
                    env,
                );
            }
            Operation::Int(IntOp::CastReduce { to_width }) => {
                // Narrowing can fold the whole range onto itself; fall
                // back to Top rather than risk an unsound tight bound.
                let mut f = FlagSet::new();
                f.set_may(ErrorFlag::Inexact);
                env.store_result(Element::Top(super::Top::new(to_width, signedness)));
                env.merge_flags(f);
            }
            Operation::Int(IntOp::CastToBit) => {
                if !self.contains_constant(&Constant::from_int(ApInt::zero(self.width()), signedness)) {
                    env.store_result(Element::Constant(Constant::from_bool(true)));
                } else {
                    env.store_result(super::disjunction::boolean_disjunction());
                }
                env.merge_flags(FlagSet::new());
            }
            _ => {
                // Casts to float and anything else without a precise
                // interval rule widen soundly.
                env.store_result(Element::Top(super::Top::new(self.width(), signedness)));
                env.merge_flags(FlagSet::new());
            }
        }
    }

    // ---- forward: binary, self dominant (self op other) ----

    pub fn apply_binary(&self, op: Operation, other: &Element, env: &mut EvaluationEnvironment) {
        env.dispatch();
        match other {
            Element::Constant(c) => self.apply_const(op, c, env, false),
            Element::Interval(b) => self.apply_interval(op, b, env),
            _ => panic!("Interval::apply_binary: operand kind not lower or equal"),
        }
    }

    /// `self` is the second operand; `first` (lower-kinded) dispatched here
    ///. Only reachable with `first` a `Constant`.
    pub fn apply_to(&self, op: Operation, first: &Element, env: &mut EvaluationEnvironment) {
        env.dispatch();
        match first {
            Element::Constant(c) => self.apply_const(op, c, env, true),
            _ => panic!("Interval::apply_to: first operand kind not lower"),
        }
    }

    /// `swapped = true` means the original call was `c op self`, not
    /// `self op c`.
    fn apply_const(&self, op: Operation, c: &Constant, env: &mut EvaluationEnvironment, swapped: bool) {
        let (lo, hi) = self.bounds();
        let signedness = self.signedness();
        let cv = match c.as_int() {
            Some(v) => v,
            None => {
                env.store_result(Element::Top(super::Top::new(self.width(), signedness)));
                env.merge_flags(FlagSet::new());
                return;
            }
        };
        match op {
            Operation::Int(IntOp::Add(ArithKind::Signed)) | Operation::Int(IntOp::Add(ArithKind::Unsigned)) => {
                add_const(lo, hi, cv, signedness, env)
            }
            Operation::Int(IntOp::Sub(ArithKind::Signed)) | Operation::Int(IntOp::Sub(ArithKind::Unsigned)) => {
                if swapped {
                    // c - [lo, hi] : reverses order, decreasing in x.
                    let (r0, f0) = cv.sub(&hi, signedness);
                    let (r1, f1) = cv.sub(&lo, signedness);
                    endpoint_result(r0, f0, r1, f1, signedness, env);
                } else {
                    sub_const(lo, hi, cv, signedness, env)
                }
            }
            Operation::Int(IntOp::Mul(ArithKind::Signed)) | Operation::Int(IntOp::Mul(ArithKind::Unsigned)) => {
                mul_const(lo, hi, cv, signedness, env)
            }
            Operation::Int(IntOp::Div(ArithKind::Signed)) | Operation::Int(IntOp::Div(ArithKind::Unsigned)) => {
                if swapped {
                    // c / [lo, hi]: non-monotonic in general; widen unless
                    // the interval excludes zero and is single-signed.
                    div_reverse(cv, lo, hi, signedness, env)
                } else {
                    div_const(lo, hi, cv, signedness, env)
                }
            }
            Operation::Int(IntOp::Mod(s)) => {
                if swapped {
                    env.store_result(Element::Top(super::Top::new(self.width(), s)));
                    env.merge_flags(FlagSet::new());
                } else {
                    mod_const(lo, hi, cv, s, env)
                }
            }
            Operation::Int(IntOp::Min(s)) => min_max_const(lo, hi, cv, s, env, true),
            Operation::Int(IntOp::Max(s)) => min_max_const(lo, hi, cv, s, env, false),
            Operation::Int(IntOp::BitAnd) => bitwise_const(lo, hi, cv, signedness, env, BitwiseKind::And),
            Operation::Int(IntOp::BitOr) => bitwise_const(lo, hi, cv, signedness, env, BitwiseKind::Or),
            Operation::Int(IntOp::BitXor) => bitwise_const(lo, hi, cv, signedness, env, BitwiseKind::Xor),
            Operation::Int(IntOp::Shl) => shift_const(lo, hi, cv, signedness, env, ShiftKind::Left),
            Operation::Int(IntOp::ShrLogical) => shift_const(lo, hi, cv, signedness, env, ShiftKind::Logical),
            Operation::Int(IntOp::ShrArith) => shift_const(lo, hi, cv, signedness, env, ShiftKind::Arith),
            Operation::Int(IntOp::CmpLt(s)) => compare_const(lo, hi, cv, s, env, CompareKind::Lt, swapped),
            Operation::Int(IntOp::CmpLe(s)) => compare_const(lo, hi, cv, s, env, CompareKind::Le, swapped),
            Operation::Int(IntOp::CmpGt(s)) => compare_const(lo, hi, cv, s, env, CompareKind::Gt, swapped),
            Operation::Int(IntOp::CmpGe(s)) => compare_const(lo, hi, cv, s, env, CompareKind::Ge, swapped),
            Operation::Int(IntOp::CmpEq) => {
                let known = lo.eq_bits(&hi) && lo.eq_bits(&cv);
                let excluded = !self.contains_constant(c);
                if excluded {
                    env.store_result(Element::Constant(Constant::from_bool(false)));
                } else if known {
                    env.store_result(Element::Constant(Constant::from_bool(true)));
                } else {
                    env.store_result(super::disjunction::boolean_disjunction());
                }
                env.merge_flags(FlagSet::new());
            }
            Operation::Int(IntOp::CmpNe) => {
                let excluded = !self.contains_constant(c);
                if excluded {
                    env.store_result(Element::Constant(Constant::from_bool(true)));
                } else {
                    env.store_result(super::disjunction::boolean_disjunction());
                }
                env.merge_flags(FlagSet::new());
            }
            Operation::Int(IntOp::BitSet { .. }) | Operation::Int(IntOp::Concat) => {
                env.store_result(Element::Top(super::Top::new(self.width().max(c.width()), signedness)));
                env.merge_flags(FlagSet::new());
            }
            _ => {
                env.store_result(Element::Top(super::Top::new(self.width(), signedness)));
                env.merge_flags(FlagSet::new());
            }
        }
    }

    fn apply_interval(&self, op: Operation, other: &Interval, env: &mut EvaluationEnvironment) {
        if self.signedness() != other.signedness() {
            // "Changing the sign representation": split at
            // zero into same-signedness intervals and recurse per half,
            // merging the results into a disjunction.
            return self.apply_interval_mixed_signedness(op, other, env);
        }
        let (a_lo, a_hi) = self.bounds();
        let (b_lo, b_hi) = other.bounds();
        let signedness = self.signedness();
        match op {
            Operation::Int(IntOp::Add(ArithKind::Signed)) if signedness.is_signed() => {
                let (r0, f0) = a_lo.add(&b_lo, signedness);
                let (r1, f1) = a_hi.add(&b_hi, signedness);
                endpoint_result(r0, f0, r1, f1, signedness, env);
            }
            Operation::Int(IntOp::Sub(ArithKind::Signed)) if signedness.is_signed() => {
                let (r0, f0) = a_lo.sub(&b_hi, signedness);
                let (r1, f1) = a_hi.sub(&b_lo, signedness);
                endpoint_result(r0, f0, r1, f1, signedness, env);
            }
            Operation::Int(IntOp::Add(_)) | Operation::Int(IntOp::Sub(_)) => {
                // Unsigned interval+interval wraparound widens rather than
                // tracking the modular two-region split `add_const_unsigned`
                // does for a single constant operand (see DESIGN.md).
                widen_with_may_overflow(self.width(), signedness, env)
            }
            Operation::Int(IntOp::Mul(ArithKind::Signed)) if signedness.is_signed() => {
                // Cartesian corner evaluation: the extremes of a product
                // over a rectangle always land on one of its four corners.
                let corners = [
                    a_lo.mul(&b_lo, signedness),
                    a_lo.mul(&b_hi, signedness),
                    a_hi.mul(&b_lo, signedness),
                    a_hi.mul(&b_hi, signedness),
                ];
                corners_result(corners, signedness, env);
            }
            Operation::Int(IntOp::Mul(_)) => widen_with_may_overflow(self.width(), signedness, env),
            Operation::Int(IntOp::Div(_)) => div_interval(a_lo, a_hi, b_lo, b_hi, signedness, env),
            Operation::Int(IntOp::Mod(_)) => mod_interval(a_lo, a_hi, b_lo, b_hi, signedness, env),
            Operation::Int(IntOp::CmpLt(s) | IntOp::CmpLe(s) | IntOp::CmpGt(s) | IntOp::CmpGe(s)) => {
                let kind = match op {
                    Operation::Int(IntOp::CmpLt(_)) => CompareKind::Lt,
                    Operation::Int(IntOp::CmpLe(_)) => CompareKind::Le,
                    Operation::Int(IntOp::CmpGt(_)) => CompareKind::Gt,
                    _ => CompareKind::Ge,
                };
                compare_interval(a_lo, a_hi, b_lo, b_hi, s, env, kind);
            }
            Operation::Int(IntOp::CmpEq) => {
                if a_hi.compare_lt(&b_lo, signedness) || b_hi.compare_lt(&a_lo, signedness) {
                    env.store_result(Element::Constant(Constant::from_bool(false)));
                } else if a_lo.eq_bits(&a_hi) && b_lo.eq_bits(&b_hi) && a_lo.eq_bits(&b_lo) {
                    env.store_result(Element::Constant(Constant::from_bool(true)));
                } else {
                    env.store_result(super::disjunction::boolean_disjunction());
                }
                env.merge_flags(FlagSet::new());
            }
            Operation::Int(IntOp::CmpNe) => {
                if a_hi.compare_lt(&b_lo, signedness) || b_hi.compare_lt(&a_lo, signedness) {
                    env.store_result(Element::Constant(Constant::from_bool(true)));
                } else {
                    env.store_result(super::disjunction::boolean_disjunction());
                }
                env.merge_flags(FlagSet::new());
            }
            Operation::Int(IntOp::Min(s)) => {
                let lo = a_lo.min(&b_lo, s);
                let hi = a_hi.min(&b_hi, s);
                store_interval(Interval::new(Constant::from_int(lo, s), Constant::from_int(hi, s)), FlagSet::new(), env);
            }
            Operation::Int(IntOp::Max(s)) => {
                let lo = a_lo.max(&b_lo, s);
                let hi = a_hi.max(&b_hi, s);
                store_interval(Interval::new(Constant::from_int(lo, s), Constant::from_int(hi, s)), FlagSet::new(), env);
            }
            Operation::Int(
                IntOp::BitAnd
                    | IntOp::BitOr
                    | IntOp::BitXor
                    | IntOp::Shl
                    | IntOp::ShrLogical
                    | IntOp::ShrArith
                    | IntOp::RotateLeft
                    | IntOp::RotateRight,
            ) => {
                // Bitwise/shift/rotate over two variable ranges: not
                // monotonic in either operand in general, so widen rather
                // than track bit patterns through a second free variable.
                widen_with_inexact(self.width(), signedness, env)
            }
            _ => {
                env.store_result(Element::Top(super::Top::new(self.width(), signedness)));
                env.merge_flags(FlagSet::new());
            }
        }
    }

    fn apply_interval_mixed_signedness(&self, op: Operation, other: &Interval, env: &mut EvaluationEnvironment) {
        let target = other.signedness();
        let resplit = self.resigned_split(target);
        let mut results = Vec::new();
        let mut flags = FlagSet::new();
        for part in resplit {
            let mut sub_env = EvaluationEnvironment::new(op, part.clone(), Some(Element::Interval(*other)));
            part.apply(op, Some(&Element::Interval(*other)), &mut sub_env);
            let r = sub_env.finish();
            flags.merge(r.flags);
            if let Some(e) = r.result {
                results.push(e);
            }
        }
        env.merge_flags(flags);
        match results.len() {
            0 => env.set_empty(),
            1 => env.store_result(results.remove(0)),
            _ => {
                let mut d = super::disjunction::Disjunction::empty(results[0].width());
                for r in results {
                    d.add_may(r);
                }
                env.store_result(Element::Disjunction(d));
            }
        }
    }

    /// Splits `self` at zero into intervals reinterpreted as `target`
    /// signedness.
    fn resigned_split(&self, target: Signedness) -> Vec<Element> {
        let (lo, hi) = self.bounds();
        let zero = ApInt::zero(self.width());
        let signedness = self.signedness();
        let mut parts = Vec::new();
        if signedness.is_signed() && !lo.compare_ge(&zero, signedness) {
            let neg_hi = if hi.compare_lt(&zero, signedness) { hi } else { zero.prev(signedness).0 };
            parts.push(Interval::new(
                Constant::from_int(lo, target),
                Constant::from_int(neg_hi, target),
            ));
        }
        let pos_lo = if lo.compare_ge(&zero, signedness) { lo } else { zero };
        if pos_lo.compare_le(&hi, signedness) {
            parts.push(Interval::new(Constant::from_int(pos_lo, target), Constant::from_int(hi, target)));
        }
        if parts.is_empty() {
            parts.push(Interval::new(Constant::from_int(lo, target), Constant::from_int(hi, target)));
        }
        parts
    }

    // ---- lattice ----

    pub fn merge_with(&self, other: &Element, mode: LatticeMode) -> Element {
        match other {
            Element::Constant(c) => self.merge_constant(c, mode),
            Element::Interval(b) => self.merge_interval(b),
            Element::Top(_) => other.clone(),
            Element::Disjunction(_) => other.merge_with(&Element::Interval(*self), mode),
        }
    }

    fn merge_constant(&self, c: &Constant, mode: LatticeMode) -> Element {
        if self.contains_constant(c) {
            return Element::Interval(*self);
        }
        match mode {
            LatticeMode::Disjunction => {
                let mut d = super::disjunction::Disjunction::empty(self.width());
                d.add_may(Element::Interval(*self));
                d.add_may(Element::Constant(*c));
                Element::Disjunction(d)
            }
            LatticeMode::Top => Element::Top(super::Top::new(self.width(), self.signedness())),
            _ => {
                let signedness = self.signedness();
                let (lo, hi) = self.bounds();
                let cv = c.as_int().expect("merge_constant: int only");
                let new_lo = if cv.compare_lt(&lo, signedness) { cv } else { lo };
                let new_hi = if cv.compare_gt(&hi, signedness) { cv } else { hi };
                Interval::new(Constant::from_int(new_lo, signedness), Constant::from_int(new_hi, signedness))
            }
        }
    }

    fn merge_interval(&self, other: &Interval) -> Element {
        if self.signedness() != other.signedness() {
            return Element::Top(super::Top::new(self.width(), self.signedness()));
        }
        let signedness = self.signedness();
        let (a_lo, a_hi) = self.bounds();
        let (b_lo, b_hi) = other.bounds();
        let lo = if a_lo.compare_lt(&b_lo, signedness) { a_lo } else { b_lo };
        let hi = if a_hi.compare_gt(&b_hi, signedness) { a_hi } else { b_hi };
        Interval::new(Constant::from_int(lo, signedness), Constant::from_int(hi, signedness))
    }

    pub fn contain(&self, other: &Element) -> Contain {
        match other {
            Element::Constant(c) => {
                if c.width() != self.width() {
                    return Contain::False;
                }
                if self.contains_constant(c) {
                    Contain::True
                } else {
                    Contain::False
                }
            }
            Element::Interval(b) => {
                if b.signedness() != self.signedness() {
                    return Contain::False;
                }
                if self.contains_constant(&b.min) && self.contains_constant(&b.max) {
                    Contain::True
                } else if self.contains_constant(&b.min) || self.contains_constant(&b.max) {
                    Contain::Partial
                } else {
                    Contain::False
                }
            }
            Element::Top(_) => Contain::False,
            Element::Disjunction(d) => d.all_members_within(&Element::Interval(*self)),
        }
    }

    pub fn intersect_with(&self, other: &Element) -> Option<Element> {
        match other {
            Element::Constant(c) => {
                if self.contains_constant(c) {
                    Some(Element::Constant(*c))
                } else {
                    None
                }
            }
            Element::Interval(b) => {
                if self.signedness() != b.signedness() {
                    return None;
                }
                let signedness = self.signedness();
                let (a_lo, a_hi) = self.bounds();
                let (b_lo, b_hi) = b.bounds();
                let lo = if a_lo.compare_gt(&b_lo, signedness) { a_lo } else { b_lo };
                let hi = if a_hi.compare_lt(&b_hi, signedness) { a_hi } else { b_hi };
                if lo.compare_le(&hi, signedness) {
                    Some(Interval::new(Constant::from_int(lo, signedness), Constant::from_int(hi, signedness)))
                } else {
                    None
                }
            }
            Element::Top(_) => Some(Element::Interval(*self)),
            Element::Disjunction(_) => other.intersect_with(&Element::Interval(*self)),
        }
    }

    // ---- backward ----

    pub fn constraint_as_first(&self, other: &Element, env: &mut ConstraintEnvironment) {
        let op = env.op;
        if op.is_non_injective_for_constraint() {
            env.store_first(Element::Interval(*self));
            if let Some(o) = other.as_constant_or_interval() {
                env.store_second(o);
            }
            env.degrade();
            return;
        }
        let c = match other.as_constant() {
            Some(c) => c,
            None => {
                env.store_first(Element::Interval(*self));
                env.degrade();
                return;
            }
        };
        let cv = c.as_int().expect("constraint_as_first: int only");
        let signedness = self.signedness();
        let (lo, hi) = self.bounds();
        let forced = env.required.as_constant().and_then(|r| r.as_bool());
        match (op, forced) {
            (Operation::Int(IntOp::CmpLt(_)), Some(true)) => {
                // `[lo,hi] < c` forced true: narrow hi <- min(hi, c-1).
                let (pred, _) = cv.prev(signedness);
                let new_hi = if pred.compare_lt(&hi, signedness) { pred } else { hi };
                narrow_first(self, lo, new_hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpLt(_)), Some(false)) => {
                let new_lo = if cv.compare_gt(&lo, signedness) { cv } else { lo };
                narrow_first(self, new_lo, hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpLe(_)), Some(true)) => {
                let new_hi = if cv.compare_lt(&hi, signedness) { cv } else { hi };
                narrow_first(self, lo, new_hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpLe(_)), Some(false)) => {
                let (succ, _) = cv.next(signedness);
                let new_lo = if succ.compare_gt(&lo, signedness) { succ } else { lo };
                narrow_first(self, new_lo, hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpGt(_)), Some(true)) => {
                let (succ, _) = cv.next(signedness);
                let new_lo = if succ.compare_gt(&lo, signedness) { succ } else { lo };
                narrow_first(self, new_lo, hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpGt(_)), Some(false)) => {
                let new_hi = if cv.compare_lt(&hi, signedness) { cv } else { hi };
                narrow_first(self, lo, new_hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpGe(_)), Some(true)) => {
                let new_lo = if cv.compare_gt(&lo, signedness) { cv } else { lo };
                narrow_first(self, new_lo, hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpGe(_)), Some(false)) => {
                let (pred, _) = cv.prev(signedness);
                let new_hi = if pred.compare_lt(&hi, signedness) { pred } else { hi };
                narrow_first(self, lo, new_hi, signedness, env);
            }
            (Operation::Int(IntOp::CmpEq), _) => {
                if self.contains_constant(&c) {
                    env.store_first(Element::Constant(c));
                } else {
                    env.set_empty();
                }
            }
            (Operation::Int(IntOp::CmpNe), _) => {
                env.store_first(Element::Interval(*self));
                env.degrade();
            }
            (Operation::Int(IntOp::Add(ArithKind::Signed)), _) => {
                // X + c = r  =>  X = r - c; `env.required` here carries r.
                if let Some(rc) = env.required.as_constant().and_then(|r| r.as_int()) {
                    let (x, _) = rc.sub(&cv, signedness);
                    if self.contains_constant(&Constant::from_int(x, signedness)) {
                        env.store_first(Element::Constant(Constant::from_int(x, signedness)));
                    } else {
                        env.set_empty();
                    }
                } else {
                    env.store_first(Element::Interval(*self));
                    env.degrade();
                }
            }
            _ => {
                env.store_first(Element::Interval(*self));
                env.degrade();
            }
        }
    }
}

fn narrow_first(original: &Interval, lo: ApInt, hi: ApInt, signedness: Signedness, env: &mut ConstraintEnvironment) {
    if lo.compare_le(&hi, signedness) {
        env.store_first(Interval::new(Constant::from_int(lo, signedness), Constant::from_int(hi, signedness)));
    } else {
        env.set_empty();
    }
    let _ = original;
}

#[derive(Clone, Copy)]
enum CompareKind {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy)]
enum BitwiseKind {
    And,
    Or,
    Xor,
}

#[derive(Clone, Copy)]
enum ShiftKind {
    Left,
    Logical,
    Arith,
}

/// Endpoint evaluation for a jointly-monotonic-nondecreasing op: if both
/// endpoints saturate to the same value the whole interval
/// collapses to that constant (sure flag); if only one saturates, the
/// result is a genuine interval up to the rail (may flag only); otherwise
/// clean.
fn endpoint_result(lo_val: ApInt, lo_f: FlagSet, hi_val: ApInt, hi_f: FlagSet, signedness: Signedness, env: &mut EvaluationEnvironment) {
    match (lo_f.any_sure(), hi_f.any_sure()) {
        (true, true) => {
            store_result_element(Element::Constant(Constant::from_int(lo_val, signedness)), lo_f.merged(hi_f), env);
        }
        (false, false) => {
            store_interval(Interval::new(Constant::from_int(lo_val, signedness), Constant::from_int(hi_val, signedness)), FlagSet::new(), env);
        }
        _ => {
            let flags = lo_f.merged(hi_f).downgrade_sure_to_may();
            if lo_val.compare_le(&hi_val, signedness) {
                store_interval(Interval::new(Constant::from_int(lo_val, signedness), Constant::from_int(hi_val, signedness)), flags, env);
            } else {
                store_result_element(Element::Constant(Constant::from_int(lo_val, signedness)), flags, env);
            }
        }
    }
}

fn store_interval(element: Element, flags: FlagSet, env: &mut EvaluationEnvironment) {
    env.store_result(element);
    env.merge_flags(flags);
}

fn store_result_element(element: Element, flags: FlagSet, env: &mut EvaluationEnvironment) {
    env.store_result(element);
    env.merge_flags(flags);
}

fn widen_with_may_overflow(width: u32, signedness: Signedness, env: &mut EvaluationEnvironment) {
    let mut f = FlagSet::new();
    f.set_may(ErrorFlag::PositiveOverflow);
    f.set_may(ErrorFlag::NegativeOverflow);
    env.store_result(Element::Top(super::Top::new(width, signedness)));
    env.merge_flags(f);
}

/// Widen to `Top` flagging that the returned range may be wider than the
/// true result, without any accompanying overflow claim.
fn widen_with_inexact(width: u32, signedness: Signedness, env: &mut EvaluationEnvironment) {
    let mut f = FlagSet::new();
    f.set_may(ErrorFlag::Inexact);
    env.store_result(Element::Top(super::Top::new(width, signedness)));
    env.merge_flags(f);
}

/// `[a_lo,a_hi] / [b_lo,b_hi]`, same signedness. Division is monotonic
/// along each axis once the divisor's sign is fixed, so the extremes of
/// the quotient lie at one of the four corners of the operand rectangle;
/// a divisor range straddling zero is widened rather than split.
fn div_interval(a_lo: ApInt, a_hi: ApInt, b_lo: ApInt, b_hi: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    let width = a_lo.width();
    let zero = ApInt::zero(width);
    if signedness.is_signed() {
        let crosses_zero = b_lo.compare_le(&zero, signedness) && zero.compare_le(&b_hi, signedness);
        if crosses_zero {
            env.store_result(Element::Top(super::Top::new(width, signedness)));
            let mut f = FlagSet::new();
            f.set_may(ErrorFlag::DivisionByZero);
            env.merge_flags(f);
            return;
        }
        let corners = [a_lo.div(&b_lo, signedness), a_lo.div(&b_hi, signedness), a_hi.div(&b_lo, signedness), a_hi.div(&b_hi, signedness)];
        corners_result(corners, signedness, env);
        return;
    }
    if b_hi.is_zero() {
        env.set_empty();
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::DivisionByZero);
        env.merge_flags(f);
        return;
    }
    let mut extra = FlagSet::new();
    let b_lo_nonzero = if b_lo.is_zero() {
        extra.set_may(ErrorFlag::DivisionByZero);
        ApInt::from_unsigned(width, 1)
    } else {
        b_lo
    };
    let corners = [
        a_lo.div(&b_lo_nonzero, signedness),
        a_lo.div(&b_hi, signedness),
        a_hi.div(&b_lo_nonzero, signedness),
        a_hi.div(&b_hi, signedness),
    ];
    corners_result_with_extra(corners, signedness, extra, env);
}

/// `[a_lo,a_hi] % [b_lo,b_hi]`, same signedness. Bounds the result by the
/// largest magnitude the divisor range can take, the same rule
/// `mod_const` applies to a single divisor constant.
fn mod_interval(a_lo: ApInt, a_hi: ApInt, b_lo: ApInt, b_hi: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    let width = a_lo.width();
    let zero = ApInt::zero(width);
    if b_lo.is_zero() && b_hi.is_zero() {
        env.set_empty();
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::DivisionByZero);
        env.merge_flags(f);
        return;
    }
    let mut flags = FlagSet::new();
    let straddles_zero = b_lo.compare_le(&zero, signedness) && zero.compare_le(&b_hi, signedness);
    if straddles_zero {
        flags.set_may(ErrorFlag::DivisionByZero);
    }
    let b_hi_abs = if signedness.is_signed() && b_hi.compare_lt(&zero, signedness) { b_hi.opposite(signedness).0 } else { b_hi };
    let b_lo_abs = if signedness.is_signed() && b_lo.compare_lt(&zero, signedness) { b_lo.opposite(signedness).0 } else { b_lo };
    let c_abs = if b_hi_abs.compare_gt(&b_lo_abs, signedness) { b_hi_abs } else { b_lo_abs };
    let (bound, _) = c_abs.prev(signedness);
    let non_negative = a_lo.compare_ge(&zero, signedness);
    let non_positive = a_hi.compare_le(&zero, signedness);
    let (new_lo, new_hi) = if non_negative {
        (zero, bound)
    } else if non_positive {
        (bound.opposite(signedness).0, zero)
    } else {
        (bound.opposite(signedness).0, bound)
    };
    store_interval(Interval::new(Constant::from_int(new_lo, signedness), Constant::from_int(new_hi, signedness)), flags, env);
}

fn add_const(lo: ApInt, hi: ApInt, c: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    if signedness.is_signed() {
        let (r0, f0) = lo.add(&c, signedness);
        let (r1, f1) = hi.add(&c, signedness);
        endpoint_result(r0, f0, r1, f1, signedness, env);
        return;
    }
    add_const_unsigned(lo, hi, c, env);
}

fn add_const_unsigned(lo: ApInt, hi: ApInt, c: ApInt, env: &mut EvaluationEnvironment) {
    let width = lo.width();
    let mask: u128 = if width == 128 { u128::MAX } else { (1u128 << width) - 1 };
    let m: u128 = mask.wrapping_add(1); // 0 when width == 128, handled via wrapping below.
    let (a, b, cc) = (lo.as_unsigned(), hi.as_unsigned(), c.as_unsigned());
    if cc == 0 {
        store_interval(Interval::new(Constant::from_int(lo, Signedness::Unsigned), Constant::from_int(hi, Signedness::Unsigned)), FlagSet::new(), env);
        return;
    }
    let threshold = if width == 128 { u128::MAX.wrapping_sub(cc).wrapping_add(1) } else { m - cc };
    let wraps_a = a >= threshold;
    let wraps_b = b >= threshold;
    if wraps_a == wraps_b {
        // Both wrap or neither: single clean interval on the modular ring.
        let r0 = ApInt::from_unsigned(lo.width(), a.wrapping_add(cc) & mask);
        let r1 = ApInt::from_unsigned(lo.width(), b.wrapping_add(cc) & mask);
        let mut flags = FlagSet::new();
        if wraps_a {
            flags.set_sure(ErrorFlag::PositiveOverflow);
        }
        store_interval(Interval::new(Constant::from_int(r0, Signedness::Unsigned), Constant::from_int(r1, Signedness::Unsigned)), flags, env);
    } else {
        // threshold inside (a, b]: two-region split.
        let clean_hi = ApInt::from_unsigned(lo.width(), (threshold - 1).wrapping_add(cc) & mask);
        let wrapped_lo = ApInt::from_unsigned(lo.width(), 0);
        let wrapped_hi = ApInt::from_unsigned(lo.width(), b.wrapping_add(cc) & mask);
        let clean_lo = ApInt::from_unsigned(lo.width(), a.wrapping_add(cc) & mask);
        let mut d = super::disjunction::Disjunction::empty(lo.width());
        d.add_may(Interval::new(Constant::from_int(clean_lo, Signedness::Unsigned), Constant::from_int(clean_hi, Signedness::Unsigned)));
        d.add_may(if wrapped_hi.is_zero() {
            Element::Constant(Constant::from_int(wrapped_lo, Signedness::Unsigned))
        } else {
            Interval::new(Constant::from_int(wrapped_lo, Signedness::Unsigned), Constant::from_int(wrapped_hi, Signedness::Unsigned))
        });
        let mut flags = FlagSet::new();
        flags.set_may(ErrorFlag::PositiveOverflow);
        env.store_result(Element::Disjunction(d));
        env.merge_flags(flags);
    }
}

fn sub_const(lo: ApInt, hi: ApInt, c: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    if signedness.is_signed() {
        let (r0, f0) = lo.sub(&c, signedness);
        let (r1, f1) = hi.sub(&c, signedness);
        endpoint_result(r0, f0, r1, f1, signedness, env);
        return;
    }
    let (neg_c, _) = c.opposite(Signedness::Unsigned);
    add_const_unsigned(lo, hi, neg_c, env);
}

fn mul_const(lo: ApInt, hi: ApInt, c: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    let zero = ApInt::zero(lo.width());
    if c.eq_bits(&zero) {
        store_result_element(Element::Constant(Constant::from_int(zero, signedness)), FlagSet::new(), env);
        return;
    }
    if signedness.is_signed() {
        let negative = c.compare_lt(&zero, signedness);
        let (r0, f0) = if negative { hi.mul(&c, signedness) } else { lo.mul(&c, signedness) };
        let (r1, f1) = if negative { lo.mul(&c, signedness) } else { hi.mul(&c, signedness) };
        endpoint_result(r0, f0, r1, f1, signedness, env);
        return;
    }
    let (r0, f0) = lo.mul(&c, signedness);
    let (r1, f1) = hi.mul(&c, signedness);
    if f0.any_sure() || f1.any_sure() {
        widen_with_may_overflow(lo.width(), signedness, env);
    } else {
        store_interval(Interval::new(Constant::from_int(r0, signedness), Constant::from_int(r1, signedness)), FlagSet::new(), env);
    }
}

fn corners_result(corners: [(ApInt, FlagSet); 4], signedness: Signedness, env: &mut EvaluationEnvironment) {
    let any_sure = corners.iter().any(|(_, f)| f.any_sure());
    let mut lo = corners[0].0;
    let mut hi = corners[0].0;
    let mut flags = FlagSet::new();
    for (v, f) in corners {
        flags.merge(f);
        if v.compare_lt(&lo, signedness) {
            lo = v;
        }
        if v.compare_gt(&hi, signedness) {
            hi = v;
        }
    }
    if any_sure {
        flags = flags.downgrade_sure_to_may();
    }
    store_interval(Interval::new(Constant::from_int(lo, signedness), Constant::from_int(hi, signedness)), flags, env);
}

/// Same as `corners_result` but folds in flags already known before the
/// corner evaluation ran (e.g. a may-zero divisor endpoint clamped away).
fn corners_result_with_extra(corners: [(ApInt, FlagSet); 4], signedness: Signedness, extra: FlagSet, env: &mut EvaluationEnvironment) {
    let any_sure = corners.iter().any(|(_, f)| f.any_sure());
    let mut lo = corners[0].0;
    let mut hi = corners[0].0;
    let mut flags = extra;
    for (v, f) in corners {
        flags.merge(f);
        if v.compare_lt(&lo, signedness) {
            lo = v;
        }
        if v.compare_gt(&hi, signedness) {
            hi = v;
        }
    }
    if any_sure {
        flags = flags.downgrade_sure_to_may();
    }
    store_interval(Interval::new(Constant::from_int(lo, signedness), Constant::from_int(hi, signedness)), flags, env);
}

fn div_const(lo: ApInt, hi: ApInt, c: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    if c.is_zero() {
        env.set_empty();
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::DivisionByZero);
        env.merge_flags(f);
        return;
    }
    let zero = ApInt::zero(lo.width());
    if signedness.is_signed() && c.compare_lt(&zero, signedness) {
        let (r0, f0) = hi.div(&c, signedness);
        let (r1, f1) = lo.div(&c, signedness);
        endpoint_result(r0, f0, r1, f1, signedness, env);
        return;
    }
    let (r0, f0) = lo.div(&c, signedness);
    let (r1, f1) = hi.div(&c, signedness);
    endpoint_result(r0, f0, r1, f1, signedness, env);
}

fn div_reverse(c: ApInt, lo: ApInt, hi: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    let zero = ApInt::zero(lo.width());
    let crosses_zero = lo.compare_le(&zero, signedness) && zero.compare_le(&hi, signedness);
    if crosses_zero {
        env.store_result(Element::Top(super::Top::new(lo.width(), signedness)));
        let mut f = FlagSet::new();
        f.set_may(ErrorFlag::DivisionByZero);
        env.merge_flags(f);
        return;
    }
    let (r0, f0) = c.div(&lo, signedness);
    let (r1, f1) = c.div(&hi, signedness);
    endpoint_result(r0, f0, r1, f1, signedness, env);
}

fn mod_const(lo: ApInt, hi: ApInt, c: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment) {
    if c.is_zero() {
        env.set_empty();
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::DivisionByZero);
        env.merge_flags(f);
        return;
    }
    let width = lo.width();
    let zero = ApInt::zero(width);
    let c_abs = if signedness.is_signed() && c.compare_lt(&zero, signedness) { c.opposite(signedness).0 } else { c };
    let (bound, _) = c_abs.prev(signedness);
    let non_negative = lo.compare_ge(&zero, signedness);
    let non_positive = hi.compare_le(&zero, signedness);
    let (new_lo, new_hi) = if non_negative {
        (zero, bound)
    } else if non_positive {
        (bound.opposite(signedness).0, zero)
    } else {
        (bound.opposite(signedness).0, bound)
    };
    store_interval(Interval::new(Constant::from_int(new_lo, signedness), Constant::from_int(new_hi, signedness)), FlagSet::new(), env);
}

fn min_max_const(lo: ApInt, hi: ApInt, c: ApInt, s: Signedness, env: &mut EvaluationEnvironment, is_min: bool) {
    let op = |a: ApInt, b: ApInt| if is_min { a.min(&b, s) } else { a.max(&b, s) };
    let r_lo = op(lo, c);
    let r_hi = op(hi, c);
    if lo.compare_lt(&c, s) && c.compare_lt(&hi, s) {
        // c strictly inside (lo, hi): preserve precision with a two-disjunct result.
        let clamped = Interval::new(Constant::from_int(r_lo, s), Constant::from_int(r_hi, s));
        let mut d = super::disjunction::Disjunction::empty(lo.width());
        d.add_may(clamped);
        d.add_may(Element::Constant(Constant::from_int(c, s)));
        env.store_result(Element::Disjunction(d));
    } else {
        store_interval(Interval::new(Constant::from_int(r_lo, s), Constant::from_int(r_hi, s)), FlagSet::new(), env);
        return;
    }
    env.merge_flags(FlagSet::new());
}

fn covering_mask(v: u128, width: u32) -> u128 {
    if v == 0 {
        return 0;
    }
    let bits = 128 - v.leading_zeros();
    if bits >= width {
        if width == 128 { u128::MAX } else { (1u128 << width) - 1 }
    } else {
        (1u128 << bits) - 1
    }
}

fn bitwise_const(lo: ApInt, hi: ApInt, c: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment, kind: BitwiseKind) {
    let zero = ApInt::zero(lo.width());
    if signedness.is_signed() && lo.compare_lt(&zero, signedness) {
        // Mixed/negative-sign operand: widen soundly (see DESIGN.md).
        env.store_result(Element::Top(super::Top::new(lo.width(), signedness)));
        env.merge_flags(FlagSet::new());
        return;
    }
    let width = lo.width();
    let (a_lo, a_hi, cc) = (lo.as_unsigned(), hi.as_unsigned(), c.as_unsigned());
    let (r_lo, r_hi) = match kind {
        BitwiseKind::And => (0u128, a_hi.min(cc)),
        BitwiseKind::Or => (a_lo.max(cc), covering_mask(a_hi, width) | covering_mask(cc, width)),
        BitwiseKind::Xor => (0u128, covering_mask(a_hi, width) | covering_mask(cc, width)),
    };
    store_interval(
        Interval::new(
            Constant::from_int(ApInt::from_unsigned(width, r_lo), signedness),
            Constant::from_int(ApInt::from_unsigned(width, r_hi), signedness),
        ),
        FlagSet::new(),
        env,
    );
}

fn shift_const(lo: ApInt, hi: ApInt, c: ApInt, signedness: Signedness, env: &mut EvaluationEnvironment, kind: ShiftKind) {
    let amount = c.as_unsigned() as u32;
    match kind {
        ShiftKind::Left => {
            let (r0, f0) = lo.shl(amount);
            let (r1, f1) = hi.shl(amount);
            if f0.any_sure() || f1.any_sure() || lo.compare_gt(&hi, signedness) {
                widen_with_may_overflow(lo.width(), signedness, env);
            } else {
                store_interval(Interval::new(Constant::from_int(r0, signedness), Constant::from_int(r1, signedness)), f0.merged(f1), env);
            }
        }
        ShiftKind::Logical => {
            let (r0, _) = lo.shr_logical(amount);
            let (r1, _) = hi.shr_logical(amount);
            store_interval(Interval::new(Constant::from_int(r0, signedness), Constant::from_int(r1, signedness)), FlagSet::new(), env);
        }
        ShiftKind::Arith => {
            let (r0, _) = lo.shr_arith(amount);
            let (r1, _) = hi.shr_arith(amount);
            if r0.compare_le(&r1, signedness) {
                store_interval(Interval::new(Constant::from_int(r0, signedness), Constant::from_int(r1, signedness)), FlagSet::new(), env);
            } else {
                env.store_result(Element::Top(super::Top::new(lo.width(), signedness)));
                env.merge_flags(FlagSet::new());
            }
        }
    }
}

fn compare_const(lo: ApInt, hi: ApInt, c: ApInt, s: Signedness, env: &mut EvaluationEnvironment, kind: CompareKind, swapped: bool) {
    // Normalise to "interval `kind` c"; if swapped, the call was `c kind interval`.
    let (sure, may) = match (kind, swapped) {
        (CompareKind::Lt, false) => (hi.compare_lt(&c, s), lo.compare_lt(&c, s)),
        (CompareKind::Lt, true) => (c.compare_lt(&lo, s), c.compare_lt(&hi, s)),
        (CompareKind::Le, false) => (hi.compare_le(&c, s), lo.compare_le(&c, s)),
        (CompareKind::Le, true) => (c.compare_le(&lo, s), c.compare_le(&hi, s)),
        (CompareKind::Gt, false) => (lo.compare_gt(&c, s), hi.compare_gt(&c, s)),
        (CompareKind::Gt, true) => (c.compare_gt(&hi, s), c.compare_gt(&lo, s)),
        (CompareKind::Ge, false) => (lo.compare_ge(&c, s), hi.compare_ge(&c, s)),
        (CompareKind::Ge, true) => (c.compare_ge(&hi, s), c.compare_ge(&lo, s)),
    };
    if sure {
        env.store_result(Element::Constant(Constant::from_bool(true)));
    } else if !may {
        env.store_result(Element::Constant(Constant::from_bool(false)));
    } else {
        env.store_result(super::disjunction::boolean_disjunction());
    }
    env.merge_flags(FlagSet::new());
}

fn compare_interval(a_lo: ApInt, a_hi: ApInt, b_lo: ApInt, b_hi: ApInt, s: Signedness, env: &mut EvaluationEnvironment, kind: CompareKind) {
    let (sure, may) = match kind {
        CompareKind::Lt => (a_hi.compare_lt(&b_lo, s), a_lo.compare_lt(&b_hi, s)),
        CompareKind::Le => (a_hi.compare_le(&b_lo, s), a_lo.compare_le(&b_hi, s)),
        CompareKind::Gt => (a_lo.compare_gt(&b_hi, s), a_hi.compare_gt(&b_lo, s)),
        CompareKind::Ge => (a_lo.compare_ge(&b_hi, s), a_hi.compare_ge(&b_lo, s)),
    };
    if sure {
        env.store_result(Element::Constant(Constant::from_bool(true)));
    } else if !may {
        env.store_result(Element::Constant(Constant::from_bool(false)));
    } else {
        env.store_result(super::disjunction::boolean_disjunction());
    }
    env.merge_flags(FlagSet::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Operation;

    fn iv(lo: i128, hi: i128) -> Element {
        Interval::new(
            Constant::from_int(ApInt::from_signed(32, lo), Signedness::Signed),
            Constant::from_int(ApInt::from_signed(32, hi), Signedness::Signed),
        )
    }

    fn c(v: i128) -> Element {
        Element::Constant(Constant::from_int(ApInt::from_signed(32, v), Signedness::Signed))
    }

    #[test]
    fn scenario_a_add_clean() {
        let a = iv(10, 20);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Add(ArithKind::Signed)), a.clone(), Some(c(5)));
        a.apply(Operation::Int(IntOp::Add(ArithKind::Signed)), Some(&c(5)), &mut env);
        let r = env.finish();
        assert!(r.flags.is_empty());
        match r.result {
            Some(Element::Interval(iv)) => {
                assert_eq!(iv.min().as_int().unwrap().as_signed(), 15);
                assert_eq!(iv.max().as_int().unwrap().as_signed(), 25);
            }
            other => panic!("expected interval, got {other:?}"),
        }
    }

    #[test]
    fn scenario_b_add_overflow_sure_with_stop_on_errors() {
        let max = i32::MAX as i128;
        let a = iv(max - 3, max);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Add(ArithKind::Signed)), a.clone(), Some(c(5)))
            .with_stop_on_errors(true);
        a.apply(Operation::Int(IntOp::Add(ArithKind::Signed)), Some(&c(5)), &mut env);
        let r = env.finish();
        assert!(r.empty);
        assert!(r.flags.sure(ErrorFlag::PositiveOverflow));
    }

    #[test]
    fn scenario_d_backward_lt_forced_true() {
        let a = Interval::new_strict(
            Constant::from_int(ApInt::from_signed(32, 0), Signedness::Signed),
            Constant::from_int(ApInt::from_signed(32, 100), Signedness::Signed),
        );
        let mut cenv = ConstraintEnvironment::new(
            Operation::Int(IntOp::CmpLt(Signedness::Signed)),
            Element::Interval(a),
            Some(c(50)),
            Element::Constant(Constant::from_bool(true)),
        );
        a.constraint_as_first(&c(50), &mut cenv);
        let r = cenv.finish();
        match r.first {
            Some(Element::Interval(n)) => {
                assert_eq!(n.min().as_int().unwrap().as_signed(), 0);
                assert_eq!(n.max().as_int().unwrap().as_signed(), 49);
            }
            other => panic!("expected narrowed interval, got {other:?}"),
        }
    }

    #[test]
    fn div_interval_by_interval_uses_corner_bounds() {
        let a = iv(20, 40);
        let b = iv(2, 5);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Div(ArithKind::Signed)), a.clone(), Some(b.clone()));
        a.apply(Operation::Int(IntOp::Div(ArithKind::Signed)), Some(&b), &mut env);
        let r = env.finish();
        assert!(r.flags.is_empty());
        match r.result {
            Some(Element::Interval(iv)) => {
                assert_eq!(iv.min().as_int().unwrap().as_signed(), 4);
                assert_eq!(iv.max().as_int().unwrap().as_signed(), 20);
            }
            other => panic!("expected interval, got {other:?}"),
        }
    }

    #[test]
    fn div_interval_zero_straddling_divisor_widens_with_may_flag() {
        let a = iv(10, 20);
        let b = iv(-1, 1);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Div(ArithKind::Signed)), a.clone(), Some(b.clone()));
        a.apply(Operation::Int(IntOp::Div(ArithKind::Signed)), Some(&b), &mut env);
        let r = env.finish();
        assert!(r.flags.may(ErrorFlag::DivisionByZero));
        assert!(matches!(r.result, Some(Element::Top(_))));
    }

    #[test]
    fn mod_interval_by_interval_bounds_on_max_divisor_magnitude() {
        let a = iv(5, 15);
        let b = iv(3, 4);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Mod(Signedness::Signed)), a.clone(), Some(b.clone()));
        a.apply(Operation::Int(IntOp::Mod(Signedness::Signed)), Some(&b), &mut env);
        let r = env.finish();
        assert!(!r.flags.may(ErrorFlag::DivisionByZero));
        match r.result {
            Some(Element::Interval(iv)) => {
                assert_eq!(iv.min().as_int().unwrap().as_signed(), 0);
                assert_eq!(iv.max().as_int().unwrap().as_signed(), 3);
            }
            other => panic!("expected interval, got {other:?}"),
        }
    }

    #[test]
    fn bitwise_interval_by_interval_widens_with_inexact_flag() {
        let a = iv(1, 2);
        let b = iv(1, 2);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::BitAnd), a.clone(), Some(b.clone()));
        a.apply(Operation::Int(IntOp::BitAnd), Some(&b), &mut env);
        let r = env.finish();
        assert!(r.flags.may(ErrorFlag::Inexact));
        assert!(matches!(r.result, Some(Element::Top(_))));
    }

    #[test]
    fn scenario_e_merge_interval_mode() {
        let a = iv(0, 10);
        let merged = match &a {
            Element::Interval(i) => i.merge_with(&c(15), LatticeMode::Interval),
            _ => unreachable!(),
        };
        match merged {
            Element::Interval(n) => {
                assert_eq!(n.min().as_int().unwrap().as_signed(), 0);
                assert_eq!(n.max().as_int().unwrap().as_signed(), 15);
            }
            other => panic!("expected interval, got {other:?}"),
        }
    }
}
