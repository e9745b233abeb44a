//! `Element`: the tagged union over the four kinds, and the shared
//! capability set every kind implements.

mod constant;
pub mod disjunction;
mod interval;
mod top;

pub use constant::{Constant, ScalarValue};
pub use disjunction::Disjunction;
pub use interval::Interval;
pub use top::{Top, TopHooks};

use serde::{Deserialize, Serialize};

use crate::env::{ConstraintEnvironment, ConstraintResult, EvaluationEnvironment, EvaluationResult, LatticeMode};
use crate::kind::Kind;
use crate::ops::Operation;
use crate::primitives::ApInt;
use crate::width::Signedness;

/// Result of [`Element::contain`]: whether `self`'s
/// concretisation is a superset of `other`'s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contain {
    True,
    False,
    /// Neither a subset nor disjoint -- only `Disjunction`/`Interval`
    /// overlap cases produce this.
    Partial,
}

/// What an element can say about whether it concretises to zero, used by
/// `Top`/`Disjunction` division rules to decide `may` vs `sure`
/// `DivisionByZero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroKnowledge {
    /// Every concretisation is zero.
    Sure,
    /// At least one concretisation may be zero (includes "don't know").
    May,
    /// No concretisation is zero.
    Never,
}

/// The abstract value every engine call passes around. No
/// `Box` is needed: `Disjunction`'s buckets are `Vec<Element>`, which
/// already breaks the recursive-size cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Constant(Constant),
    Interval(Interval),
    Disjunction(Disjunction),
    Top(Top),
}

impl Element {
    /// Test/demo convenience: a signed integer constant from an `i128`
    /// magnitude, used throughout the unit-test suites that don't want to
    /// build an `ApInt` by hand.
    pub fn new_constant_i128(width: u32, signedness: Signedness, value: i128) -> Element {
        Element::Constant(Constant::from_int(ApInt::from_signed(width, value), signedness))
    }

    pub fn new_constant_bool(value: bool) -> Element {
        Element::Constant(Constant::from_bool(value))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Element::Constant(_) => Kind::Constant,
            Element::Interval(_) => Kind::Interval,
            Element::Disjunction(_) => Kind::Disjunction,
            Element::Top(_) => Kind::Top,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Element::Constant(c) => c.width(),
            Element::Interval(i) => i.width(),
            Element::Disjunction(d) => d.width(),
            Element::Top(t) => t.width(),
        }
    }

    pub fn signedness(&self) -> Signedness {
        match self {
            Element::Constant(c) => c.signedness(),
            Element::Interval(i) => i.signedness(),
            Element::Disjunction(d) => d.signedness(),
            Element::Top(t) => t.signedness(),
        }
    }

    pub fn is_boolean(&self) -> bool {
        match self {
            Element::Constant(c) => c.is_boolean(),
            Element::Interval(i) => i.is_boolean(),
            Element::Disjunction(d) => d.is_boolean(),
            Element::Top(t) => t.is_boolean(),
        }
    }

    pub fn is_float(&self) -> bool {
        match self {
            Element::Constant(c) => c.is_float(),
            Element::Interval(i) => i.is_float(),
            Element::Disjunction(d) => d.is_float(),
            Element::Top(t) => t.is_float(),
        }
    }

    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            Element::Constant(c) => Some(*c),
            _ => None,
        }
    }

    /// Used by backward rules that can accept either a pinned value or a
    /// range for the operand they're not narrowing.
    pub fn as_constant_or_interval(&self) -> Option<Element> {
        match self {
            Element::Constant(_) | Element::Interval(_) => Some(self.clone()),
            _ => None,
        }
    }

    /// What is known about whether `self` may concretise to zero; used for
    /// division-by-zero bookkeeping on the wider kinds.
    pub fn may_be_zero(&self) -> ZeroKnowledge {
        match self {
            Element::Constant(c) => {
                if c.is_zero() {
                    ZeroKnowledge::Sure
                } else {
                    ZeroKnowledge::Never
                }
            }
            Element::Interval(i) => {
                let zero = ApInt::zero(i.width());
                let z = Constant::from_int(zero, i.signedness());
                if i.contains_constant(&z) {
                    ZeroKnowledge::May
                } else {
                    ZeroKnowledge::Never
                }
            }
            Element::Disjunction(d) => d.may_be_zero(),
            Element::Top(_) => ZeroKnowledge::May,
        }
    }

    pub fn write(&self) -> String {
        match self {
            Element::Constant(c) => c.write(),
            Element::Interval(i) => i.write(),
            Element::Disjunction(d) => d.write(),
            Element::Top(t) => t.write(),
        }
    }

    pub fn parse(text: &str) -> Option<Element> {
        if text.starts_with("const:") {
            Constant::parse(text).map(Element::Constant)
        } else if text.starts_with("interval:") {
            Interval::parse(text)
        } else if text.starts_with("disjunction:") {
            Disjunction::parse(text)
        } else if text.starts_with("top:") {
            Top::parse(text).map(Element::Top)
        } else {
            None
        }
    }

    /// Forward evaluation entry point. `second` is `None`
    /// for unary operations. Implements the kind-ordering dispatch rule:
    /// the side of strictly greater kind handles the call; on equal kinds
    /// the left-hand side (`self`) handles it.
    pub fn apply(&self, op: Operation, second: Option<&Element>, env: &mut EvaluationEnvironment) {
        match second {
            None => match self {
                Element::Constant(c) => c.apply_unary(op, env),
                Element::Interval(i) => i.apply_unary(op, env),
                Element::Disjunction(d) => d.apply_unary(op, env),
                Element::Top(t) => t.apply_unary(op, env),
            },
            Some(b) => {
                if self.kind() < b.kind() {
                    b.apply_to(op, self, env)
                } else {
                    match self {
                        Element::Constant(c) => match b {
                            Element::Constant(bc) => c.apply_binary(op, bc, env),
                            _ => unreachable!("Constant is always the lowest kind"),
                        },
                        Element::Interval(i) => i.apply_binary(op, b, env),
                        Element::Disjunction(d) => d.apply_binary(op, b, env),
                        Element::Top(t) => t.apply_binary(op, b, env),
                    }
                }
            }
        }
    }

    /// Dual of `apply`: `self` is the dominant (higher- or
    /// equal-kinded) operand, originally the *second* argument; `first` is
    /// the lower-kinded operand that dispatched here.
    pub fn apply_to(&self, op: Operation, first: &Element, env: &mut EvaluationEnvironment) {
        match self {
            Element::Constant(_) => unreachable!("Constant is never dominant in apply_to"),
            Element::Interval(i) => i.apply_to(op, first, env),
            Element::Disjunction(d) => d.apply_to(op, first, env),
            Element::Top(t) => t.apply_to(op, first, env),
        }
    }

    /// Convenience wrapper that builds the environment, dispatches, and
    /// returns the finished result (used by hosts and by the `lib.rs`
    /// facade).
    pub fn evaluate(op: Operation, first: Element, second: Option<Element>) -> EvaluationResult {
        let mut env = EvaluationEnvironment::new(op, first.clone(), second.clone());
        first.apply(op, second.as_ref(), &mut env);
        env.finish()
    }

    /// Backward constraint propagation: given `op(first,
    /// second) = required`, narrow `first`/`second`. Dispatches to whichever
    /// operand has the higher kind (ties go to `first`), mirroring `apply`.
    pub fn constraint(op: Operation, first: Element, second: Option<Element>, required: Element) -> ConstraintResult {
        let mut env = ConstraintEnvironment::new(op, first.clone(), second.clone(), required);
        match &second {
            // No kind defines a bespoke narrowing rule for unary operations;
            // backward rules are all stated over the binary ops. The operand
            // comes back unchanged with the verdict degraded.
            None => {
                env.store_first(first.clone());
                env.degrade();
            }
            Some(b) => {
                let first_dominant = !(first.kind() < b.kind());
                if first_dominant {
                    match &first {
                        Element::Constant(c) => c.constraint_as_first(b, &mut env),
                        Element::Interval(i) => i.constraint_as_first(b, &mut env),
                        Element::Disjunction(d) => d.constraint_as_first(b, &mut env),
                        Element::Top(t) => t.constraint_as_first(b, &mut env),
                    }
                } else {
                    match b {
                        Element::Interval(i) => i.constraint_as_first(&first, &mut env),
                        Element::Disjunction(d) => d.constraint_as_first(&first, &mut env),
                        Element::Top(t) => t.constraint_as_first(&first, &mut env),
                        Element::Constant(_) => unreachable!("Constant is always the lowest kind"),
                    }
                }
            }
        }
        env.finish()
    }

    pub fn merge_with(&self, other: &Element, mode: LatticeMode) -> Element {
        if self == other {
            return self.clone();
        }
        match self {
            Element::Constant(c) => match other {
                Element::Constant(oc) => {
                    if c == oc {
                        self.clone()
                    } else {
                        match mode {
                            LatticeMode::Disjunction => {
                                let mut d = Disjunction::empty(self.width());
                                d.add_may(self.clone());
                                d.add_may(other.clone());
                                Element::Disjunction(d)
                            }
                            LatticeMode::Top => Element::Top(Top::new(self.width(), self.signedness())),
                            _ => {
                                let (lo, hi) = if c.compare_le(oc) { (*c, *oc) } else { (*oc, *c) };
                                Interval::new(lo, hi)
                            }
                        }
                    }
                }
                Element::Interval(i) => i.merge_with(self, mode),
                Element::Disjunction(d) => d.merge_with(self, mode),
                Element::Top(t) => t.merge_with(self, mode),
            },
            Element::Interval(i) => i.merge_with(other, mode),
            Element::Disjunction(d) => d.merge_with(other, mode),
            Element::Top(t) => t.merge_with(other, mode),
        }
    }

    pub fn contain(&self, other: &Element) -> Contain {
        if self.width() != other.width() {
            return Contain::False;
        }
        match self {
            Element::Constant(c) => match other {
                Element::Constant(oc) if c == oc => Contain::True,
                _ => Contain::False,
            },
            Element::Interval(i) => i.contain(other),
            Element::Disjunction(d) => d.contain(other),
            Element::Top(t) => t.contain(other),
        }
    }

    pub fn intersect_with(&self, other: &Element) -> Option<Element> {
        match self {
            Element::Constant(c) => match other.contain(self) {
                Contain::False => None,
                _ => Some(Element::Constant(*c)),
            },
            Element::Interval(i) => i.intersect_with(other),
            Element::Disjunction(d) => d.intersect_with(other),
            Element::Top(t) => t.intersect_with(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{ArithKind, IntOp};

    #[test]
    fn kind_ordering_picks_dominant_side() {
        let c = Element::new_constant_i128(32, Signedness::Signed, 5);
        let top = Element::Top(Top::new(32, Signedness::Signed));
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Add(ArithKind::Signed)), c.clone(), Some(top.clone()));
        c.apply(Operation::Int(IntOp::Add(ArithKind::Signed)), Some(&top), &mut env);
        let r = env.finish();
        assert!(matches!(r.result, Some(Element::Top(_))));
    }

    #[test]
    fn write_parse_roundtrip_constant() {
        let c = Element::new_constant_i128(32, Signedness::Signed, -7);
        let text = c.write();
        assert_eq!(Element::parse(&text), Some(c));
    }

    #[test]
    fn write_parse_roundtrip_interval() {
        let a = Element::new_constant_i128(16, Signedness::Signed, 3);
        let b = Element::new_constant_i128(16, Signedness::Signed, 9);
        let iv = match (a, b) {
            (Element::Constant(x), Element::Constant(y)) => Interval::new(x, y),
            _ => unreachable!(),
        };
        let text = iv.write();
        assert_eq!(Element::parse(&text), Some(iv));
    }

    #[test]
    fn contain_is_reflexive() {
        let c = Element::new_constant_i128(8, Signedness::Signed, 1);
        assert_eq!(c.contain(&c), Contain::True);
    }

    #[test]
    fn serde_roundtrip_constant() {
        let c = Element::new_constant_i128(32, Signedness::Signed, -42);
        let json = serde_json::to_string(&c).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn serde_roundtrip_interval() {
        let a = Element::new_constant_i128(16, Signedness::Unsigned, 3);
        let b = Element::new_constant_i128(16, Signedness::Unsigned, 9);
        let iv = match (a, b) {
            (Element::Constant(x), Element::Constant(y)) => Interval::new(x, y),
            _ => unreachable!(),
        };
        let json = serde_json::to_string(&iv).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, iv);
    }
}
