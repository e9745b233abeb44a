//! `Disjunction`: the power-set element with exact/sure/may buckets and
//! dedup-on-insert ("mergeNew") semantics.

use serde::{Deserialize, Serialize};

use crate::env::{ConstraintEnvironment, EvaluationEnvironment, InformationKind, LatticeMode, Verdict};
use crate::flags::FlagSet;
use crate::ops::Operation;
use crate::width::Signedness;

use super::{Constant, Contain, Element, Top, ZeroKnowledge};

/// A finite union of abstract elements, partitioned into three buckets by
/// how certain the engine is that each member actually occurs: exact,
/// sure, and may.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disjunction {
    width: u32,
    /// Precisely this set, no more (`InformationKind::Exact` results land
    /// here).
    exact: Vec<Element>,
    /// Definitely occurs on at least one path.
    sure: Vec<Element>,
    /// Possibly occurs; the catch-all bucket most forward rules populate.
    may: Vec<Element>,
}

impl Disjunction {
    pub fn empty(width: u32) -> Disjunction {
        Disjunction { width, exact: Vec::new(), sure: Vec::new(), may: Vec::new() }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn signedness(&self) -> Signedness {
        self.all_members().next().map(Element::signedness).unwrap_or(Signedness::Unsigned)
    }

    pub fn is_boolean(&self) -> bool {
        self.all_members().next().map(Element::is_boolean).unwrap_or(self.width == 1)
    }

    pub fn is_float(&self) -> bool {
        self.all_members().next().map(Element::is_float).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.sure.is_empty() && self.may.is_empty()
    }

    pub fn all_members(&self) -> impl Iterator<Item = &Element> {
        self.exact.iter().chain(self.sure.iter()).chain(self.may.iter())
    }

    /// The bucket(s) a call must fan out over for a given information
    /// kind: `exact` alone promises precisely this set; `may`/`sure`
    /// additionally pull in the bucket of the same name, since both of
    /// those are supersets of the exact set by construction.
    fn members_for(&self, kind: InformationKind) -> Vec<Element> {
        match kind {
            InformationKind::Exact => self.exact.clone(),
            InformationKind::May => self.exact.iter().chain(self.may.iter()).cloned().collect(),
            InformationKind::Sure => self.exact.iter().chain(self.sure.iter()).cloned().collect(),
        }
    }

    /// `mergeNew`: skip insertion if an existing member already subsumes
    /// `e`; otherwise drop any existing members `e` subsumes, then insert.
    fn merge_into(bucket: &mut Vec<Element>, e: Element) {
        if bucket.iter().any(|existing| existing.contain(&e) == Contain::True) {
            return;
        }
        bucket.retain(|existing| e.contain(existing) != Contain::True);
        bucket.push(e);
    }

    pub fn add_exact(&mut self, e: Element) {
        Disjunction::merge_into(&mut self.exact, e);
    }

    pub fn add_sure(&mut self, e: Element) {
        Disjunction::merge_into(&mut self.sure, e);
    }

    pub fn add_may(&mut self, e: Element) {
        Disjunction::merge_into(&mut self.may, e);
    }

    /// Flattens nested disjunctions, collapses to a single `Top` member if
    /// any member already is one, and drops may-members dominated by
    /// another member. Bucket distinctions (exact/sure) are not preserved
    /// through this pass -- a scope simplification, see DESIGN.md.
    fn simplify(&mut self) {
        for bucket in [&mut self.exact, &mut self.sure, &mut self.may] {
            let mut i = 0;
            while i < bucket.len() {
                if let Element::Disjunction(inner) = bucket[i].clone() {
                    bucket.remove(i);
                    for m in inner.all_members() {
                        bucket.push(m.clone());
                    }
                } else {
                    i += 1;
                }
            }
        }
        if self.all_members().any(|m| matches!(m, Element::Top(_))) {
            let width = self.width;
            let signedness = self.signedness();
            *self = Disjunction::empty(width);
            self.add_may(Element::Top(Top::new(width, signedness)));
            return;
        }
        let all: Vec<Element> = self.all_members().cloned().collect();
        let mut kept: Vec<Element> = Vec::new();
        for e in all {
            if kept.iter().any(|k| k.contain(&e) == Contain::True) {
                continue;
            }
            kept.retain(|k| e.contain(k) != Contain::True);
            kept.push(e);
        }
        self.exact.clear();
        self.sure.clear();
        self.may = kept;
    }

    /// Simplifies, then collapses to a bare `Element` when only one member
    /// survives -- a singleton disjunction is indistinguishable from its
    /// member.
    pub fn collapse(mut self) -> Element {
        self.simplify();
        let total = self.exact.len() + self.sure.len() + self.may.len();
        match total {
            0 => Element::Top(Top::new(self.width, self.signedness())),
            1 => self.all_members().next().cloned().unwrap(),
            _ => Element::Disjunction(self),
        }
    }

    pub fn write(&self) -> String {
        let section = |members: &[Element]| members.iter().map(Element::write).collect::<Vec<_>>().join("|");
        format!(
            "disjunction:{}:E[{}];S[{}];M[{}]",
            self.width,
            section(&self.exact),
            section(&self.sure),
            section(&self.may)
        )
    }

    pub fn parse(text: &str) -> Option<Element> {
        let rest = text.strip_prefix("disjunction:")?;
        let (width_str, rest) = rest.split_once(':')?;
        let width: u32 = width_str.parse().ok()?;
        let mut d = Disjunction::empty(width);
        for (prefix, bucket) in [("E[", &mut d.exact), ("S[", &mut d.sure), ("M[", &mut d.may)] {
            let start = rest.find(prefix)? + prefix.len();
            let end = rest[start..].find(']')? + start;
            let body = &rest[start..end];
            if !body.is_empty() {
                for part in body.split('|') {
                    bucket.push(Element::parse(part)?);
                }
            }
        }
        Some(Element::Disjunction(d))
    }

    // ---- forward ----

    pub fn apply_unary(&self, op: Operation, env: &mut EvaluationEnvironment) {
        env.dispatch();
        let members = self.members_for(env.information_kind);
        apply_cross(op, &members, None, false, env);
    }

    pub fn apply_binary(&self, op: Operation, other: &Element, env: &mut EvaluationEnvironment) {
        env.dispatch();
        let members = self.members_for(env.information_kind);
        apply_cross(op, &members, Some(other.clone()), false, env);
    }

    /// `self` is dominant, originally the second operand; `first` is the
    /// lower-kinded operand.
    pub fn apply_to(&self, op: Operation, first: &Element, env: &mut EvaluationEnvironment) {
        env.dispatch();
        let members = self.members_for(env.information_kind);
        apply_cross(op, &members, Some(first.clone()), true, env);
    }

    // ---- backward ----

    pub fn constraint_as_first(&self, other: &Element, env: &mut ConstraintEnvironment) {
        let members = self.members_for(env.information_kind);
        let mode = env.lattice_mode;
        let mut first_acc: Option<Element> = None;
        let mut second_acc: Option<Element> = None;
        let mut flags = FlagSet::new();
        let mut any_nonempty = false;
        let mut degrade = false;
        for m in &members {
            let r = Element::constraint(env.op, m.clone(), Some(other.clone()), env.required.clone());
            flags.merge(r.flags);
            if r.verdict != Verdict::Exact {
                degrade = true;
            }
            if !r.empty {
                if let Some(f) = r.first {
                    first_acc = Some(match first_acc {
                        None => f,
                        Some(prev) => prev.merge_with(&f, mode),
                    });
                    any_nonempty = true;
                }
                if let Some(s) = r.second {
                    second_acc = Some(match second_acc {
                        None => s,
                        Some(prev) => prev.merge_with(&s, mode),
                    });
                }
            }
        }
        env.merge_flags(flags);
        if !any_nonempty {
            env.set_empty();
        } else {
            env.store_first(first_acc.expect("any_nonempty implies first_acc is Some"));
            if let Some(s) = second_acc {
                env.store_second(s);
            }
        }
        if degrade {
            env.degrade();
        }
    }

    // ---- lattice ----

    pub fn merge_with(&self, other: &Element, mode: LatticeMode) -> Element {
        if let LatticeMode::Top = mode {
            return Element::Top(Top::new(self.width, self.signedness()));
        }
        if let Element::Top(_) = other {
            return other.clone();
        }
        let mut out = self.clone();
        match other {
            Element::Disjunction(d) => {
                for m in d.all_members() {
                    out.add_may(m.clone());
                }
            }
            _ => out.add_may(other.clone()),
        }
        out.collapse()
    }

    pub fn contain(&self, other: &Element) -> Contain {
        let mut partial = false;
        for m in self.all_members() {
            match m.contain(other) {
                Contain::True => return Contain::True,
                Contain::Partial => partial = true,
                Contain::False => {}
            }
        }
        if partial {
            Contain::Partial
        } else {
            Contain::False
        }
    }

    /// True if every member of `self` is contained in `other` (used by
    /// `Interval`/`Top::contain` when `other` is a `Disjunction`).
    pub fn all_members_within(&self, other: &Element) -> Contain {
        let mut partial = false;
        for m in self.all_members() {
            match other.contain(m) {
                Contain::True => {}
                Contain::Partial => partial = true,
                Contain::False => return Contain::False,
            }
        }
        if partial {
            Contain::Partial
        } else {
            Contain::True
        }
    }

    pub fn intersect_with(&self, other: &Element) -> Option<Element> {
        let mut out = Disjunction::empty(self.width);
        for m in self.all_members() {
            if let Some(i) = m.intersect_with(other) {
                out.add_may(i);
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(out.collapse())
        }
    }

    pub fn may_be_zero(&self) -> ZeroKnowledge {
        let mut saw_any = false;
        let mut saw_may = false;
        let mut all_sure = true;
        for m in self.all_members() {
            saw_any = true;
            match m.may_be_zero() {
                ZeroKnowledge::Sure => saw_may = true,
                ZeroKnowledge::May => {
                    saw_may = true;
                    all_sure = false;
                }
                ZeroKnowledge::Never => all_sure = false,
            }
        }
        if !saw_any {
            ZeroKnowledge::Never
        } else if all_sure {
            ZeroKnowledge::Sure
        } else if saw_may {
            ZeroKnowledge::May
        } else {
            ZeroKnowledge::Never
        }
    }
}

/// `{true, false}` as an exact-information two-element disjunction, the
/// canonical "unknown boolean" value: comparisons against a wide operand
/// widen to this rather than to `Top`.
pub fn boolean_disjunction() -> Element {
    let mut d = Disjunction::empty(1);
    d.add_exact(Element::Constant(Constant::from_bool(true)));
    d.add_exact(Element::Constant(Constant::from_bool(false)));
    Element::Disjunction(d)
}

/// Evaluates `op` once per member of `members` and folds the results
/// together under `env.lattice_mode`, the same join `Element::merge_with`
/// performs elsewhere -- `Disjunction` mode keeps every distinct result
/// as a disjunct, `Top` mode collapses on the first divergence, and
/// everything else widens to the tightest interval that covers them all.
fn apply_cross(op: Operation, members: &[Element], other: Option<Element>, swapped: bool, env: &mut EvaluationEnvironment) {
    let mode = env.lattice_mode;
    let mut acc: Option<Element> = None;
    let mut flags = FlagSet::new();
    let mut any_result = false;
    let mut any_empty = false;
    let mut degrade = false;
    for m in members {
        let (first, second) = if swapped {
            (other.clone().expect("apply_cross: swapped requires other"), Some(m.clone()))
        } else {
            (m.clone(), other.clone())
        };
        let r = Element::evaluate(op, first, second);
        flags.merge(r.flags);
        if r.verdict != Verdict::Exact {
            degrade = true;
        }
        match r.result {
            Some(e) if !r.empty => {
                acc = Some(match acc {
                    None => e,
                    Some(prev) => prev.merge_with(&e, mode),
                });
                any_result = true;
            }
            _ => any_empty = true,
        }
    }
    if !any_result {
        env.set_empty();
    } else {
        env.store_result(acc.expect("any_result implies acc is Some"));
        if any_empty {
            degrade = true;
        }
    }
    env.merge_flags(flags);
    if degrade {
        env.merge_verdict_degradate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{ArithKind, IntOp};

    fn c(v: i128) -> Element {
        Element::new_constant_i128(8, Signedness::Signed, v)
    }

    #[test]
    fn add_may_dedups_dominated_members() {
        let mut d = Disjunction::empty(8);
        d.add_may(c(1));
        d.add_may(c(1));
        assert_eq!(d.all_members().count(), 1);
    }

    #[test]
    fn collapse_singleton_returns_bare_element() {
        let mut d = Disjunction::empty(8);
        d.add_may(c(1));
        assert_eq!(d.collapse(), c(1));
    }

    #[test]
    fn scenario_f_disjunction_add_forward() {
        let mut d = Disjunction::empty(8);
        d.add_may(c(1));
        d.add_may(c(5));
        let element = Element::Disjunction(d);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Add(ArithKind::Signed)), element.clone(), Some(c(10)))
            .with_lattice_mode(LatticeMode::Disjunction);
        element.apply(Operation::Int(IntOp::Add(ArithKind::Signed)), Some(&c(10)), &mut env);
        let r = env.finish();
        match r.result {
            Some(Element::Disjunction(out)) => {
                let vals: Vec<i128> = out.all_members().map(|e| e.as_constant().unwrap().as_int().unwrap().as_signed()).collect();
                assert!(vals.contains(&11));
                assert!(vals.contains(&15));
            }
            other => panic!("expected disjunction, got {other:?}"),
        }
    }

    #[test]
    fn forward_fan_out_defaults_to_interval_join() {
        // Default lattice mode is `Interval`: per-member results now fold
        // into the tightest covering interval rather than always
        // rebuilding a disjunction.
        let mut d = Disjunction::empty(8);
        d.add_may(c(1));
        d.add_may(c(5));
        let element = Element::Disjunction(d);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Add(ArithKind::Signed)), element.clone(), Some(c(10)));
        element.apply(Operation::Int(IntOp::Add(ArithKind::Signed)), Some(&c(10)), &mut env);
        let r = env.finish();
        match r.result {
            Some(Element::Interval(iv)) => {
                assert_eq!(iv.min().as_int().unwrap().as_signed(), 11);
                assert_eq!(iv.max().as_int().unwrap().as_signed(), 15);
            }
            other => panic!("expected interval, got {other:?}"),
        }
    }

    #[test]
    fn exact_information_kind_excludes_may_bucket() {
        let mut d = Disjunction::empty(8);
        d.add_exact(c(1));
        d.add_may(c(99));
        let element = Element::Disjunction(d);
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Add(ArithKind::Signed)), element.clone(), Some(c(10)))
            .with_information_kind(InformationKind::Exact);
        element.apply(Operation::Int(IntOp::Add(ArithKind::Signed)), Some(&c(10)), &mut env);
        let r = env.finish();
        assert_eq!(r.result, Some(c(11)));
    }

    #[test]
    fn write_parse_roundtrip() {
        let mut d = Disjunction::empty(8);
        d.add_may(c(1));
        d.add_may(c(5));
        let text = d.clone().collapse();
        if let Element::Disjunction(d2) = &text {
            let roundtrip = d2.write();
            assert_eq!(Element::parse(&roundtrip), Some(text.clone()));
        }
    }
}
