//! `absint-verify`: property-based and scenario verification for
//! `absint-core`, kept as a separate crate exercised only by `cargo test`
//! so the law checks don't mix into the library under test.

pub mod strategies;

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use absint_core::element::{Constant, Contain, Disjunction, Interval};
    use absint_core::flags::ErrorFlag;
    use absint_core::ops::{ArithKind, IntOp, Operation};
    use absint_core::primitives::ApInt;
    use absint_core::{Element, LatticeMode, Signedness};

    use crate::strategies::{arb_signedness, arb_width};

    fn signed_interval(width: u32, lo: i128, hi: i128) -> Element {
        let min = Constant::from_int(ApInt::from_signed(width, lo), Signedness::Signed);
        let max = Constant::from_int(ApInt::from_signed(width, hi), Signedness::Signed);
        Interval::new(min, max)
    }

    fn signed_const(width: u32, v: i128) -> Element {
        Element::new_constant_i128(width, Signedness::Signed, v)
    }

    // ---- Testable Property 1: soundness ----

    proptest! {
        #[test]
        fn soundness_add_interval_constant(lo in -500i64..500, span in 0u32..80, c in -500i64..500) {
            let width = 32u32;
            let hi = lo + span as i64;
            let interval = signed_interval(width, lo as i128, hi as i128);
            let constant = signed_const(width, c as i128);
            let r = Element::evaluate(
                Operation::Int(IntOp::Add(ArithKind::Signed)),
                interval,
                Some(constant),
            );
            prop_assume!(!r.empty);
            let result = r.result.unwrap();
            for sample in [lo, hi, (lo + hi) / 2] {
                let sample_bits = ApInt::from_signed(width, sample as i128);
                let c_bits = ApInt::from_signed(width, c as i128);
                let (expected, _) = sample_bits.add(&c_bits, Signedness::Signed);
                let expected_element = Element::Constant(Constant::from_int(expected, Signedness::Signed));
                prop_assert_ne!(result.contain(&expected_element), Contain::False);
            }
        }

        #[test]
        fn soundness_mul_interval_constant(lo in -50i64..50, span in 0u32..20, c in -10i64..10) {
            let width = 32u32;
            let hi = lo + span as i64;
            let interval = signed_interval(width, lo as i128, hi as i128);
            let constant = signed_const(width, c as i128);
            let r = Element::evaluate(
                Operation::Int(IntOp::Mul(ArithKind::Signed)),
                interval,
                Some(constant),
            );
            prop_assume!(!r.empty);
            let result = r.result.unwrap();
            for sample in [lo, hi] {
                let sample_bits = ApInt::from_signed(width, sample as i128);
                let c_bits = ApInt::from_signed(width, c as i128);
                let (expected, _) = sample_bits.mul(&c_bits, Signedness::Signed);
                let expected_element = Element::Constant(Constant::from_int(expected, Signedness::Signed));
                prop_assert_ne!(result.contain(&expected_element), Contain::False);
            }
        }
    }

    // ---- Testable Property 2: lattice laws ----

    proptest! {
        #[test]
        fn merge_is_commutative_and_idempotent(a in -200i64..200, b in -200i64..200) {
            let width = 32u32;
            let ea = signed_const(width, a as i128);
            let eb = signed_const(width, b as i128);
            let ab = absint_core::merge(&ea, &eb, LatticeMode::Interval);
            let ba = absint_core::merge(&eb, &ea, LatticeMode::Interval);
            prop_assert_eq!(ab.clone(), ba);
            let idempotent = absint_core::merge(&ab, &ab, LatticeMode::Interval);
            prop_assert_eq!(idempotent, ab);
        }

        #[test]
        fn merge_contains_both_operands(a in -200i64..200, b in -200i64..200) {
            let width = 32u32;
            let ea = signed_const(width, a as i128);
            let eb = signed_const(width, b as i128);
            let merged = absint_core::merge(&ea, &eb, LatticeMode::Interval);
            prop_assert_ne!(absint_core::contain(&merged, &ea), Contain::False);
            prop_assert_ne!(absint_core::contain(&merged, &eb), Contain::False);
        }

        #[test]
        fn intersect_of_a_with_its_own_merge_is_a(a in -200i64..200, b in -200i64..200) {
            let width = 32u32;
            let ea = signed_const(width, a as i128);
            let eb = signed_const(width, b as i128);
            let merged = absint_core::merge(&ea, &eb, LatticeMode::Interval);
            let back = absint_core::intersect(&ea, &merged);
            prop_assert_eq!(back, Some(ea));
        }
    }

    // ---- Testable Property 3: round-trip ----

    proptest! {
        #[test]
        fn roundtrip_constant(width in arb_width(), signedness in arb_signedness(), bits: u128) {
            let c = Element::Constant(Constant::from_int(ApInt::from_bits(width, bits), signedness));
            let text = c.write();
            prop_assert_eq!(Element::parse(&text), Some(c));
        }

        #[test]
        fn roundtrip_interval(width in arb_width(), signedness in arb_signedness(), a: u128, b: u128) {
            let ca = Constant::from_int(ApInt::from_bits(width, a), signedness);
            let cb = Constant::from_int(ApInt::from_bits(width, b), signedness);
            let (lo, hi) = if ca.compare_le(&cb) { (ca, cb) } else { (cb, ca) };
            let iv = Interval::new(lo, hi);
            let text = iv.write();
            prop_assert_eq!(Element::parse(&text), Some(iv));
        }
    }

    #[test]
    fn roundtrip_disjunction() {
        let mut d = Disjunction::empty(8);
        d.add_may(signed_const(8, 1));
        d.add_may(signed_const(8, 5));
        let element = Element::Disjunction(d);
        let text = element.write();
        assert_eq!(Element::parse(&text), Some(element));
    }

    #[test]
    fn roundtrip_top() {
        let t = absint_core::new_top(32, Signedness::Signed);
        assert_eq!(Element::parse(&t.write()), Some(t));
    }

    // ---- Testable Property 4: backward consistency ----

    proptest! {
        #[test]
        fn backward_add_consistency(lo in -500i64..500, span in 0u32..80, c in -500i64..500, r in -500i64..500) {
            let width = 32u32;
            let hi = lo + span as i64;
            let interval = signed_interval(width, lo as i128, hi as i128);
            let constant = signed_const(width, c as i128);
            let required = signed_const(width, r as i128);
            let result = Element::constraint(
                Operation::Int(IntOp::Add(ArithKind::Signed)),
                interval,
                Some(constant),
                required.clone(),
            );
            prop_assume!(!result.empty);
            let Some(narrowed_first) = result.first else { return Ok(()) };
            for sample in [lo, hi] {
                let sample_element = Element::Constant(Constant::from_int(ApInt::from_signed(width, sample as i128), Signedness::Signed));
                if narrowed_first.contain(&sample_element) == Contain::False {
                    continue;
                }
                let sample_bits = ApInt::from_signed(width, sample as i128);
                let c_bits = ApInt::from_signed(width, c as i128);
                let (applied, _) = sample_bits.add(&c_bits, Signedness::Signed);
                let applied_element = Element::Constant(Constant::from_int(applied, Signedness::Signed));
                prop_assert_ne!(required.contain(&applied_element), Contain::False);
            }
        }
    }

    // ---- Testable Property 5: overflow bookkeeping ----

    #[test]
    fn overflow_bookkeeping_no_wrap_sets_no_flags() {
        let width = 8u32;
        let a = signed_interval(width, 1, 5);
        let b = signed_interval(width, 1, 5);
        let r = Element::evaluate(Operation::Int(IntOp::Add(ArithKind::Signed)), a, Some(b));
        assert!(r.flags.is_empty());
    }

    #[test]
    fn overflow_bookkeeping_sure_wrap_sets_sure_flag() {
        let width = 8i32 as u32;
        let max = ApInt::max_value(width, Signedness::Signed).as_signed();
        let a = signed_interval(width, max - 1, max);
        let b = signed_const(width, 5);
        let r = Element::evaluate(Operation::Int(IntOp::Add(ArithKind::Signed)), a, Some(b));
        assert!(r.flags.sure(ErrorFlag::PositiveOverflow));
    }

    #[test]
    fn overflow_bookkeeping_may_wrap_sets_may_not_sure() {
        let width = 8u32;
        let max = ApInt::max_value(width, Signedness::Signed).as_signed();
        // one endpoint overflows, the other doesn't.
        let a = signed_interval(width, max - 3, max);
        let b = signed_const(width, 2);
        let r = Element::evaluate(Operation::Int(IntOp::Add(ArithKind::Signed)), a, Some(b));
        assert!(r.flags.may(ErrorFlag::PositiveOverflow));
        assert!(!r.flags.sure(ErrorFlag::PositiveOverflow));
    }

    // ---- Testable Property 6: disjunction simplification ----

    #[test]
    fn disjunction_simplification_drops_dominated_may_members() {
        let mut d = Disjunction::empty(8);
        // a wide interval dominates a constant inside it.
        let wide = signed_interval(8, 0, 10);
        d.add_may(wide.clone());
        d.add_may(signed_const(8, 5));
        assert_eq!(d.all_members().count(), 1);
        assert_eq!(d.all_members().next().unwrap(), &wide);
    }

    #[test]
    fn disjunction_simplification_collapses_singleton() {
        let mut d = Disjunction::empty(8);
        d.add_may(signed_const(8, 1));
        assert_eq!(d.collapse(), signed_const(8, 1));
    }

    #[test]
    fn disjunction_simplification_flattens_nesting() {
        let mut inner = Disjunction::empty(8);
        inner.add_may(signed_const(8, 1));
        inner.add_may(signed_const(8, 2));
        let mut outer = Disjunction::empty(8);
        outer.add_may(Element::Disjunction(inner));
        outer.add_may(signed_const(8, 3));
        let collapsed = outer.collapse();
        match collapsed {
            Element::Disjunction(d) => {
                assert!(d.all_members().all(|m| !matches!(m, Element::Disjunction(_))));
                assert_eq!(d.all_members().count(), 3);
            }
            other => panic!("expected a flattened disjunction, got {other:?}"),
        }
    }

    // ---- Concrete scenarios A-F ----

    #[test]
    fn scenario_a_clean_add() {
        let interval = signed_interval(32, 10, 20);
        let five = signed_const(32, 5);
        let r = Element::evaluate(Operation::Int(IntOp::Add(ArithKind::Signed)), interval, Some(five));
        assert!(r.flags.is_empty());
        match r.result {
            Some(Element::Interval(i)) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), 15);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 25);
            }
            other => panic!("expected [15, 25], got {other:?}"),
        }
    }

    #[test]
    fn scenario_b_overflow_disjunction_and_stop_on_errors() {
        let width = 32u32;
        let max = ApInt::max_value(width, Signedness::Signed).as_signed();
        let interval = signed_interval(width, max - 3, max);
        let five = signed_const(width, 5);
        let r = Element::evaluate(Operation::Int(IntOp::Add(ArithKind::Signed)), interval.clone(), Some(five.clone()));
        assert!(r.flags.may(ErrorFlag::PositiveOverflow));

        let mut env = absint_core::EvaluationEnvironment::new(
            Operation::Int(IntOp::Add(ArithKind::Signed)),
            interval.clone(),
            Some(five.clone()),
        )
        .with_stop_on_errors(true);
        interval.apply(Operation::Int(IntOp::Add(ArithKind::Signed)), Some(&five), &mut env);
        let stopped = env.finish();
        assert!(stopped.empty);
        assert!(stopped.flags.sure(ErrorFlag::PositiveOverflow));
    }

    #[test]
    fn scenario_c_symmetric_mul_and_div_by_minus_one() {
        let interval = signed_interval(32, -3, 3);
        let minus_one = signed_const(32, -1);
        let r = Element::evaluate(Operation::Int(IntOp::Mul(ArithKind::Signed)), interval.clone(), Some(minus_one.clone()));
        match r.result {
            Some(Element::Interval(i)) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), -3);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 3);
            }
            other => panic!("expected a symmetric [-3, 3], got {other:?}"),
        }

        let r = Element::evaluate(Operation::Int(IntOp::Div(ArithKind::Signed)), interval, Some(minus_one));
        // MIN_INT is not in [-3, 3], so no extra MIN_INT disjunct is needed.
        match r.result {
            Some(Element::Interval(i)) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), -3);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 3);
            }
            Some(Element::Constant(_)) => {}
            other => panic!("expected [-3, 3] (or a collapsed constant), got {other:?}"),
        }
    }

    #[test]
    fn scenario_d_backward_lt_forced_true_and_false() {
        let width = 32u32;
        let interval = signed_interval(width, 0, 100);
        let fifty = signed_const(width, 50);
        let true_bool = Element::new_constant_bool(true);
        let r = Element::constraint(Operation::Int(IntOp::CmpLt(Signedness::Signed)), interval.clone(), Some(fifty.clone()), true_bool);
        match r.first {
            Some(Element::Interval(i)) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), 0);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 49);
            }
            other => panic!("expected [0, 49], got {other:?}"),
        }

        let false_bool = Element::new_constant_bool(false);
        let r = Element::constraint(Operation::Int(IntOp::CmpLt(Signedness::Signed)), interval, Some(fifty), false_bool);
        match r.first {
            Some(Element::Interval(i)) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), 50);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 100);
            }
            other => panic!("expected [50, 100], got {other:?}"),
        }
    }

    #[test]
    fn scenario_e_merge_interval_vs_disjunction_mode() {
        let width = 32u32;
        let interval = signed_interval(width, 0, 10);
        let fifteen = signed_const(width, 15);
        let merged_interval = absint_core::merge(&interval, &fifteen, LatticeMode::Interval);
        match merged_interval {
            Element::Interval(i) => {
                assert_eq!(i.min().as_int().unwrap().as_signed(), 0);
                assert_eq!(i.max().as_int().unwrap().as_signed(), 15);
            }
            other => panic!("expected [0, 15], got {other:?}"),
        }

        let merged_disjunction = absint_core::merge(&interval, &fifteen, LatticeMode::Disjunction);
        match merged_disjunction {
            Element::Disjunction(d) => assert_eq!(d.all_members().count(), 2),
            other => panic!("expected a two-element disjunction, got {other:?}"),
        }
    }

    #[test]
    fn scenario_f_top_comparison_and_identity_add() {
        let top = absint_core::new_top(32, Signedness::Signed);
        let r = Element::evaluate(Operation::Int(IntOp::CmpLt(Signedness::Signed)), top.clone(), Some(top.clone()));
        match r.result {
            Some(Element::Disjunction(d)) => assert_eq!(d.all_members().count(), 2),
            other => panic!("expected the boolean disjunction, got {other:?}"),
        }

        let zero = signed_const(32, 0);
        let r = Element::evaluate(Operation::Int(IntOp::Add(ArithKind::Signed)), top.clone(), Some(zero));
        assert!(matches!(r.result, Some(Element::Top(_))));
    }
}
