//! `Top`: the universal set (top of the lattice).

use serde::{Deserialize, Serialize};

use crate::env::{ConstraintEnvironment, EvaluationEnvironment, LatticeMode};
use crate::flags::{ErrorFlag, FlagSet};
use crate::ops::{FloatOp, IntOp, Operation, Transcendental};
use crate::width::{FloatShape, Signedness};

use super::{Constant, Contain, Element};

/// Function-pointer extension hooks a host analysis can attach to a `Top`
/// instance for domain-specific override behaviour. Not serializable: a
/// host that round-trips a `Top` through `write`/`parse` gets one back
/// without hooks (see DESIGN.md).
#[derive(Clone, Copy)]
pub struct TopHooks {
    pub apply: Option<fn(&Top, Operation, Option<&Element>, &mut EvaluationEnvironment)>,
    pub constraint: Option<fn(&Top, Operation, Option<&Element>, &mut ConstraintEnvironment)>,
}

impl std::fmt::Debug for TopHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopHooks")
            .field("apply", &self.apply.map(|p| p as usize))
            .field("constraint", &self.constraint.map(|p| p as usize))
            .finish()
    }
}

impl PartialEq for TopHooks {
    fn eq(&self, other: &Self) -> bool {
        self.apply.map(|p| p as usize) == other.apply.map(|p| p as usize)
            && self.constraint.map(|p| p as usize) == other.constraint.map(|p| p as usize)
    }
}

/// `Top` carries only width and optional float shape. An
/// integer `Top` also carries a nominal signedness so comparisons and
/// arithmetic dispatch can still be width/signedness-checked at the API
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Top {
    width: u32,
    signedness: Option<Signedness>,
    float_shape: Option<FloatShape>,
    #[serde(skip)]
    hooks: Option<TopHooks>,
}

impl Top {
    pub fn new(width: u32, signedness: Signedness) -> Top {
        Top { width, signedness: Some(signedness), float_shape: None, hooks: None }
    }

    pub fn new_float(shape: FloatShape) -> Top {
        Top { width: shape.width(), signedness: None, float_shape: Some(shape), hooks: None }
    }

    pub fn new_boolean() -> Top {
        Top { width: 1, signedness: Some(Signedness::Unsigned), float_shape: None, hooks: None }
    }

    pub(crate) fn new_for_transcendental(shape: FloatShape, _t: Transcendental) -> Top {
        Top::new_float(shape)
    }

    pub fn with_hooks(mut self, hooks: TopHooks) -> Top {
        self.hooks = Some(hooks);
        self
    }

    pub fn hooks(&self) -> Option<TopHooks> {
        self.hooks
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn signedness(&self) -> Signedness {
        self.signedness.unwrap_or(Signedness::Unsigned)
    }

    pub fn is_float(&self) -> bool {
        self.float_shape.is_some()
    }

    pub fn is_boolean(&self) -> bool {
        self.width == 1 && self.float_shape.is_none()
    }

    pub fn float_shape(&self) -> Option<FloatShape> {
        self.float_shape
    }

    pub fn write(&self) -> String {
        match self.float_shape {
            Some(FloatShape::Binary32) => "top:f32".to_string(),
            Some(FloatShape::Binary64) => "top:f64".to_string(),
            None => format!(
                "top:i{}:{}",
                self.width,
                if self.signedness().is_signed() { "s" } else { "u" }
            ),
        }
    }

    pub fn parse(text: &str) -> Option<Top> {
        let mut parts = text.split(':');
        if parts.next()? != "top" {
            return None;
        }
        match parts.next()? {
            "f32" => Some(Top::new_float(FloatShape::Binary32)),
            "f64" => Some(Top::new_float(FloatShape::Binary64)),
            tag => {
                let width: u32 = tag.strip_prefix('i')?.parse().ok()?;
                let sign = parts.next()?;
                let signedness = if sign == "s" { Signedness::Signed } else { Signedness::Unsigned };
                Some(Top::new(width, signedness))
            }
        }
    }

    /// `true` for every comparison: comparisons always produce a boolean,
    /// regardless of operand kind.
    fn is_comparison(op: Operation) -> bool {
        matches!(
            op,
            Operation::Int(
                IntOp::CmpLt(_)
                    | IntOp::CmpLe(_)
                    | IntOp::CmpGt(_)
                    | IntOp::CmpGe(_)
                    | IntOp::CmpEq
                    | IntOp::CmpNe
            ) | Operation::Float(FloatOp::CmpLt | FloatOp::CmpLe | FloatOp::CmpGt | FloatOp::CmpGe)
        )
    }

    fn is_division(op: Operation) -> bool {
        matches!(
            op,
            Operation::Int(IntOp::Div(_) | IntOp::Mod(_)) | Operation::Float(FloatOp::Div)
        )
    }

    /// Flags a ⊤-arithmetic result raises: every overflow/underflow kind
    /// the corresponding concrete operation *can* raise on some input
    ///, plus `DivisionByZero` if the other operand may be
    /// zero.
    fn arithmetic_flags(op: Operation, other: Option<&Element>) -> FlagSet {
        let mut f = FlagSet::new();
        if Top::is_float_op(op) {
            f.set_may(ErrorFlag::NaN);
            f.set_may(ErrorFlag::Inexact);
        } else {
            f.set_may(ErrorFlag::PositiveOverflow);
            f.set_may(ErrorFlag::NegativeOverflow);
            f.set_may(ErrorFlag::PositiveUnderflow);
            f.set_may(ErrorFlag::NegativeUnderflow);
        }
        if Top::is_division(op) {
            match other.map(Element::may_be_zero) {
                Some(super::ZeroKnowledge::Sure) => f.set_sure(ErrorFlag::DivisionByZero),
                Some(super::ZeroKnowledge::May) => f.set_may(ErrorFlag::DivisionByZero),
                _ => f.set_may(ErrorFlag::DivisionByZero),
            }
        }
        f
    }

    fn is_float_op(op: Operation) -> bool {
        matches!(op, Operation::Float(_))
    }

    /// Handles `Top` as the dominant operand in a binary call, regardless
    /// of whether it was originally the first or second argument: for
    /// arithmetic it returns `Top` and raises every flag the operation can
    /// raise.
    fn apply_dominant(&self, op: Operation, other: Option<&Element>, env: &mut EvaluationEnvironment) {
        env.dispatch();
        if let Some(hooks) = self.hooks {
            if let Some(apply) = hooks.apply {
                apply(self, op, other, env);
                return;
            }
        }
        if Top::is_comparison(op) {
            let d = super::disjunction::boolean_disjunction();
            env.store_result(d);
            env.merge_flags(FlagSet::new());
            return;
        }
        if let Operation::Float(FloatOp::Transcendental(_)) = op {
            let mut f = FlagSet::new();
            f.set_may(ErrorFlag::NaN);
            f.set_may(ErrorFlag::Inexact);
            env.store_result(Element::Top(*self));
            env.merge_flags(f);
            return;
        }
        let flags = Top::arithmetic_flags(op, other);
        env.store_result(Element::Top(*self));
        env.merge_flags(flags);
    }

    pub fn apply_binary(&self, op: Operation, other: &Element, env: &mut EvaluationEnvironment) {
        self.apply_dominant(op, Some(other), env);
    }

    pub fn apply_unary(&self, op: Operation, env: &mut EvaluationEnvironment) {
        self.apply_dominant(op, None, env);
    }

    /// `self` is the second operand of the original call; `first` is the
    /// lower-kinded operand that dispatched to us.
    pub fn apply_to(&self, op: Operation, first: &Element, env: &mut EvaluationEnvironment) {
        env.dispatch();
        if let Some(hooks) = self.hooks {
            if let Some(apply) = hooks.apply {
                apply(self, op, Some(first), env);
                return;
            }
        }
        if Top::is_comparison(op) {
            env.store_result(super::disjunction::boolean_disjunction());
            env.merge_flags(FlagSet::new());
            return;
        }
        let flags = if Top::is_division(op) {
            // `first / self`: self (the divisor) is Top, so it may be zero.
            let mut f = Top::arithmetic_flags(op, Some(&Element::Top(*self)));
            f.merge(FlagSet::new());
            f
        } else {
            Top::arithmetic_flags(op, Some(first))
        };
        env.store_result(Element::Top(*self));
        env.merge_flags(flags);
    }

    /// Self-promotes to the full-width interval so interval backward rules
    /// apply.
    pub fn promote_to_interval(&self) -> Option<Element> {
        if self.is_float() {
            return None;
        }
        let signedness = self.signedness();
        let min = Constant::from_int(crate::primitives::ApInt::min_value(self.width, signedness), signedness);
        let max = Constant::from_int(crate::primitives::ApInt::max_value(self.width, signedness), signedness);
        Some(super::interval::Interval::new(min, max))
    }

    pub fn constraint_as_first(&self, _other: &Element, env: &mut ConstraintEnvironment) {
        if let Some(hooks) = self.hooks {
            if let Some(c) = hooks.constraint {
                c(self, env.op, None, env);
                return;
            }
        }
        if let Some(promoted) = self.promote_to_interval() {
            if let Element::Interval(interval) = &promoted {
                interval.constraint_as_first(_other, env);
                return;
            }
        }
        env.store_first(Element::Top(*self));
        env.degrade();
    }

    pub fn contain(&self, other: &Element) -> Contain {
        if other.width() != self.width {
            return Contain::False;
        }
        Contain::True
    }

    pub fn merge_with(&self, _other: &Element, _mode: LatticeMode) -> Element {
        Element::Top(*self)
    }

    pub fn intersect_with(&self, other: &Element) -> Option<Element> {
        Some(other.clone())
    }
}
