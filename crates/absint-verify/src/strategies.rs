//! Reusable `proptest` generators for `absint-core` elements, exported so a
//! host analyzer's own test suite can build on the same arbitraries this
//! crate's property tests use.

use proptest::prelude::*;

use absint_core::element::{Constant, Interval};
use absint_core::primitives::ApInt;
use absint_core::{Element, Signedness};

/// Widths kept small enough that proptest shrinking stays fast while still
/// exercising sign-bit and saturation edges at several sizes.
pub fn arb_width() -> impl Strategy<Value = u32> {
    prop_oneof![Just(1u32), Just(8), Just(16), Just(32), Just(64)]
}

pub fn arb_signedness() -> impl Strategy<Value = Signedness> {
    prop_oneof![Just(Signedness::Signed), Just(Signedness::Unsigned)]
}

/// A constant at a fixed width/signedness, drawn from the full bit pattern
/// space.
pub fn arb_constant(width: u32, signedness: Signedness) -> impl Strategy<Value = Constant> {
    any::<u128>().prop_map(move |bits| Constant::from_int(ApInt::from_bits(width, bits), signedness))
}

/// A non-degenerate interval `[min, max]` at a fixed width/signedness
/// (`Interval::new` collapses `min == max` to a `Constant`, which is a valid
/// and expected outcome here).
pub fn arb_interval(width: u32, signedness: Signedness) -> impl Strategy<Value = Element> {
    (any::<u128>(), any::<u128>()).prop_map(move |(a, b)| {
        let a = Constant::from_int(ApInt::from_bits(width, a), signedness);
        let b = Constant::from_int(ApInt::from_bits(width, b), signedness);
        let (lo, hi) = if a.compare_le(&b) { (a, b) } else { (b, a) };
        Interval::new(lo, hi)
    })
}

/// A shallow `Element` at a fixed width/signedness: one of `Constant`,
/// `Interval`, or `Top`, but never a `Disjunction` (kept out to bound
/// recursion depth in callers that combine this with another `arb_element`).
pub fn arb_element(width: u32, signedness: Signedness) -> impl Strategy<Value = Element> {
    prop_oneof![
        arb_constant(width, signedness).prop_map(Element::Constant),
        arb_interval(width, signedness),
        Just(Element::Top(absint_core::Top::new(width, signedness))),
    ]
}
