//! `absint-core`: the abstract-interpretation scalar value domain. A
//! static analyzer's host loop calls into exactly the surface re-exported
//! here -- [`apply`], [`constraint`], [`merge`]/[`contain`]/[`intersect`],
//! and [`query`] -- over [`Element`], the tagged union of [`Constant`],
//! [`Interval`], [`Disjunction`], and [`Top`].

pub mod dispatch;
pub mod element;
pub mod env;
pub mod error;
pub mod flags;
pub mod kind;
pub mod lattice;
pub mod ops;
pub mod primitives;
pub mod query;
pub mod width;

pub use element::{Constant, Disjunction, Element, Interval, Top, TopHooks};
pub use env::{ConstraintEnvironment, ConstraintResult, EvaluationEnvironment, EvaluationResult, InformationKind, LatticeMode, Verdict};
pub use error::{CoreError, CoreResult};
pub use kind::Kind;
pub use lattice::{contain, intersect, merge};
pub use ops::Operation;
pub use query::{query, Query, QueryResult};
pub use width::{FloatShape, Signedness};

use primitives::{ApFloat, ApInt};

/// Builds a `Constant`. `value` is taken as a raw two's-complement bit
/// pattern truncated to `width`; callers that have a signed magnitude
/// should build it via [`ApInt::from_signed`] directly and pass the
/// resulting `to_bits()` instead.
pub fn new_constant(width: u32, signedness: Signedness, value: u128) -> CoreResult<Element> {
    if !width::is_supported_width(width) {
        return Err(CoreError::UnsupportedWidth(width));
    }
    Ok(Element::Constant(Constant::from_int(ApInt::from_bits(width, value), signedness)))
}

pub fn new_constant_bool(value: bool) -> Element {
    Element::new_constant_bool(value)
}

pub fn new_constant_float32(value: f32) -> Element {
    Element::Constant(Constant::from_float(ApFloat::F32(value)))
}

pub fn new_constant_float64(value: f64) -> Element {
    Element::Constant(Constant::from_float(ApFloat::F64(value)))
}

/// Builds an `Interval`. Returns [`CoreError::InvalidInterval`] rather
/// than panicking, unlike [`Interval::new`] which is an internal
/// constructor that trusts its caller already normalised the bounds --
/// API-boundary misuse is recoverable, internal invariant breaks are not.
pub fn new_interval(width: u32, signedness: Signedness, min_value: u128, max_value: u128) -> CoreResult<Element> {
    if !width::is_supported_width(width) {
        return Err(CoreError::UnsupportedWidth(width));
    }
    let min = Constant::from_int(ApInt::from_bits(width, min_value), signedness);
    let max = Constant::from_int(ApInt::from_bits(width, max_value), signedness);
    if max.compare_lt(&min) {
        return Err(CoreError::InvalidInterval {
            min: ApInt::from_bits(width, min_value).as_signed(),
            max: ApInt::from_bits(width, max_value).as_signed(),
        });
    }
    Ok(Interval::new(min, max))
}

pub fn new_disjunction(width: u32) -> Disjunction {
    Disjunction::empty(width)
}

pub fn new_top(width: u32, signedness: Signedness) -> Element {
    Element::Top(Top::new(width, signedness))
}

pub fn new_top_float(shape: FloatShape) -> Element {
    Element::Top(Top::new_float(shape))
}

/// Forward evaluation: results left in `env` for the caller to `finish()`.
pub fn apply(element: &Element, op: Operation, second: Option<&Element>, env: &mut EvaluationEnvironment) {
    element.apply(op, second, env)
}

/// Backward propagation given `op(first, second) = required`.
pub fn constraint(op: Operation, first: Element, second: Option<Element>, required: Element) -> ConstraintResult {
    Element::constraint(op, first, second, required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_constant_rejects_unsupported_width() {
        assert_eq!(new_constant(0, Signedness::Signed, 0), Err(CoreError::UnsupportedWidth(0)));
        assert_eq!(new_constant(200, Signedness::Signed, 0), Err(CoreError::UnsupportedWidth(200)));
    }

    #[test]
    fn new_interval_rejects_inverted_bounds() {
        let min = ApInt::from_signed(8, 5).to_bits();
        let max = ApInt::from_signed(8, 1).to_bits();
        assert!(new_interval(8, Signedness::Signed, min, max).is_err());
    }

    #[test]
    fn new_disjunction_then_add_may_builds_a_union() {
        let mut d = new_disjunction(8);
        d.add_may(new_constant(8, Signedness::Signed, 1).unwrap());
        d.add_may(new_constant(8, Signedness::Signed, 2).unwrap());
        assert_eq!(d.all_members().count(), 2);
    }

    #[test]
    fn scenario_a_add_clean() {
        let five = new_constant(32, Signedness::Signed, ApInt::from_signed(32, 5).to_bits()).unwrap();
        let ten = ApInt::from_signed(32, 10).to_bits();
        let twenty = ApInt::from_signed(32, 20).to_bits();
        let interval = new_interval(32, Signedness::Signed, ten, twenty).unwrap();

        let mut env = EvaluationEnvironment::new(Operation::Int(ops::IntOp::Add(ops::ArithKind::Signed)), interval.clone(), Some(five.clone()));
        apply(&interval, Operation::Int(ops::IntOp::Add(ops::ArithKind::Signed)), Some(&five), &mut env);
        let r = env.finish();
        assert!(r.flags.is_empty());
        match r.result {
            Some(Element::Interval(i)) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), 15);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 25);
            }
            other => panic!("expected a clean interval, got {other:?}"),
        }
    }
}
