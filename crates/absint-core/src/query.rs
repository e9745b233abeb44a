//! The `query` entry point: static facts about an element that don't
//! require an operation to evaluate -- bit-domain, bounds, sign
//! classification, and simplification hints.

use crate::element::{Constant, Element};
use crate::primitives::ApInt;
use crate::width::Signedness;

/// Which fact to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    BitDomain,
    Bounds,
    SignClass,
    SimplifyAsInterval,
    SimplifyAsConstantDisjunction,
}

/// May-be-one / must-be-zero bitmasks. For non-constant elements this is a
/// sound over-approximation derived from the element's bounds, not an
/// exact bit-level analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDomain {
    pub may_be_one: u128,
    pub must_be_zero: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignClass {
    AllNonNegative,
    AllNegative,
    Mixed,
}

/// Everything a single `query` call can report; only the field matching
/// the requested [`Query`] variant is populated.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub bit_domain: Option<BitDomain>,
    pub bounds: Option<(Constant, Constant)>,
    pub sign_class: Option<SignClass>,
    pub as_interval: Option<Element>,
    pub as_constant_disjunction: Option<Vec<Constant>>,
}

impl QueryResult {
    fn empty() -> QueryResult {
        QueryResult { bit_domain: None, bounds: None, sign_class: None, as_interval: None, as_constant_disjunction: None }
    }
}

pub fn query(element: &Element, q: Query) -> QueryResult {
    let mut result = QueryResult::empty();
    match q {
        Query::BitDomain => result.bit_domain = Some(bit_domain(element)),
        Query::Bounds => result.bounds = bounds(element),
        Query::SignClass => result.sign_class = sign_class(element),
        Query::SimplifyAsInterval => result.as_interval = simplify_as_interval(element),
        Query::SimplifyAsConstantDisjunction => result.as_constant_disjunction = simplify_as_constant_disjunction(element),
    }
    result
}

fn full_mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

fn bit_domain(element: &Element) -> BitDomain {
    match element {
        Element::Constant(c) => match c.as_int() {
            Some(v) => BitDomain { may_be_one: v.to_bits(), must_be_zero: full_mask(v.width()) & !v.to_bits() },
            None => BitDomain { may_be_one: full_mask(element.width()), must_be_zero: 0 },
        },
        Element::Interval(i) => {
            let (min, max) = interval_bits(i);
            // Sound but coarse: treat the two bounds as the only known
            // samples. A bit set in either bound may be set; a bit clear in
            // both is not known to be forced zero for values strictly
            // between the bounds, so must_be_zero only covers bits clear in
            // both endpoints of a width-1 (single-valued) interval.
            BitDomain { may_be_one: min | max, must_be_zero: full_mask(element.width()) & !(min | max) }
        }
        Element::Disjunction(d) => {
            let mut may_be_one = 0u128;
            let mut must_be_zero = full_mask(element.width());
            for m in d.all_members() {
                let bd = bit_domain(m);
                may_be_one |= bd.may_be_one;
                must_be_zero &= bd.must_be_zero;
            }
            BitDomain { may_be_one, must_be_zero }
        }
        Element::Top(_) => BitDomain { may_be_one: full_mask(element.width()), must_be_zero: 0 },
    }
}

fn interval_bits(i: &crate::element::Interval) -> (u128, u128) {
    let lo = i.min().as_int().map(|v| v.to_bits()).unwrap_or(0);
    let hi = i.max().as_int().map(|v| v.to_bits()).unwrap_or(0);
    (lo, hi)
}

fn bounds(element: &Element) -> Option<(Constant, Constant)> {
    match element {
        Element::Constant(c) => Some((*c, *c)),
        Element::Interval(i) => Some((*i.min(), *i.max())),
        Element::Disjunction(d) => {
            let mut members = d.all_members();
            let first = members.next()?;
            let (mut lo, mut hi) = bounds(first)?;
            for m in members {
                let (mlo, mhi) = bounds(m)?;
                if mlo.compare_lt(&lo) {
                    lo = mlo;
                }
                if hi.compare_lt(&mhi) {
                    hi = mhi;
                }
            }
            Some((lo, hi))
        }
        Element::Top(t) => {
            if t.is_float() {
                return None;
            }
            let signedness = t.signedness();
            Some((
                Constant::from_int(ApInt::min_value(t.width(), signedness), signedness),
                Constant::from_int(ApInt::max_value(t.width(), signedness), signedness),
            ))
        }
    }
}

fn sign_class(element: &Element) -> Option<SignClass> {
    let (lo, hi) = bounds(element)?;
    if element.signedness() == Signedness::Unsigned {
        return Some(SignClass::AllNonNegative);
    }
    let zero = Constant::from_int(ApInt::zero(element.width()), Signedness::Signed);
    if !lo.compare_lt(&zero) {
        Some(SignClass::AllNonNegative)
    } else if hi.compare_lt(&zero) {
        Some(SignClass::AllNegative)
    } else {
        Some(SignClass::Mixed)
    }
}

fn simplify_as_interval(element: &Element) -> Option<Element> {
    match element {
        Element::Constant(_) | Element::Interval(_) => Some(element.clone()),
        Element::Disjunction(d) => {
            if d.is_float() {
                return None;
            }
            let (lo, hi) = bounds(element)?;
            let _ = d;
            Some(crate::element::Interval::new(lo, hi))
        }
        Element::Top(_) => None,
    }
}

fn simplify_as_constant_disjunction(element: &Element) -> Option<Vec<Constant>> {
    match element {
        Element::Constant(c) => Some(vec![*c]),
        Element::Disjunction(d) => d.all_members().map(|m| m.as_constant()).collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::width::Signedness;

    #[test]
    fn bit_domain_of_constant_is_exact() {
        let c = Element::new_constant_i128(8, Signedness::Unsigned, 0b1010);
        let bd = bit_domain(&c);
        assert_eq!(bd.may_be_one, 0b1010);
        assert_eq!(bd.must_be_zero, 0b1111_0101);
    }

    #[test]
    fn bounds_of_constant_is_reflexive() {
        let c = Element::new_constant_i128(8, Signedness::Signed, 5);
        let (lo, hi) = bounds(&c).unwrap();
        assert_eq!(lo, hi);
    }

    #[test]
    fn sign_class_detects_all_negative() {
        let a = Element::new_constant_i128(8, Signedness::Signed, -3);
        let b = Element::new_constant_i128(8, Signedness::Signed, -1);
        let iv = crate::element::Interval::new(a.as_constant().unwrap(), b.as_constant().unwrap());
        assert_eq!(sign_class(&iv), Some(SignClass::AllNegative));
    }
}
