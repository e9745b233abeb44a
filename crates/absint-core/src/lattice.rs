//! The join/meet/containment lattice operations: `merge`, `contain`,
//! `intersect`. Thin free-function wrappers over `Element`'s own methods --
//! kept as a separate module because the host API names them at the top
//! level, not as `Element` methods.

use crate::element::{Contain, Element};
use crate::env::LatticeMode;

pub fn merge(a: &Element, b: &Element, mode: LatticeMode) -> Element {
    a.merge_with(b, mode)
}

pub fn contain(a: &Element, b: &Element) -> Contain {
    a.contain(b)
}

/// `None` signals the empty set.
pub fn intersect(a: &Element, b: &Element) -> Option<Element> {
    a.intersect_with(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::width::Signedness;

    #[test]
    fn scenario_e_merge_interval_mode() {
        let a = Element::new_constant_i128(32, Signedness::Signed, 0);
        let b = Element::new_constant_i128(32, Signedness::Signed, 10);
        let lo = a.as_constant().unwrap();
        let hi = b.as_constant().unwrap();
        let interval = crate::element::Interval::new(lo, hi);
        let fifteen = Element::new_constant_i128(32, Signedness::Signed, 15);

        let merged = merge(&interval, &fifteen, LatticeMode::Interval);
        match merged {
            Element::Interval(i) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), 0);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 15);
            }
            other => panic!("expected interval, got {other:?}"),
        }

        let merged_disjunction = merge(&interval, &fifteen, LatticeMode::Disjunction);
        assert!(matches!(merged_disjunction, Element::Disjunction(_)));
    }

    #[test]
    fn contain_and_intersect_agree_on_merge() {
        let a = Element::new_constant_i128(8, Signedness::Signed, 1);
        let b = Element::new_constant_i128(8, Signedness::Signed, 5);
        let merged = merge(&a, &b, LatticeMode::Interval);
        assert_eq!(contain(&merged, &a), Contain::True);
        assert_eq!(contain(&merged, &b), Contain::True);
        assert_eq!(intersect(&a, &merged), Some(a));
    }
}
