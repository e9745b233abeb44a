//! Per-kind operation tables: three function tables bound once at process
//! start, looked up by [`Kind`] rather than rebuilt per call.
//!
//! `Element`'s kind-matching `apply`/`apply_to`/`constraint` already
//! perform the same dispatch through the enum tag, so this module's
//! tables exist to give a host a stable, introspectable handle per
//! [`Kind`] rather than to re-implement the rule logic a second time --
//! entries delegate straight back to `Element`'s own methods.

use std::sync::OnceLock;

use crate::element::Element;
use crate::env::{ConstraintEnvironment, EvaluationEnvironment};
use crate::kind::Kind;
use crate::ops::Operation;

pub type ApplyFn = fn(&Element, Operation, Option<&Element>, &mut EvaluationEnvironment);
pub type ApplyToFn = fn(&Element, Operation, &Element, &mut EvaluationEnvironment);

/// The apply/apply_to halves of the table, registered once per kind.
/// `constraint` is exposed separately via [`constraint_table`] since it
/// is not kind-dispatched the same way.
#[derive(Clone, Copy)]
pub struct OpTables {
    pub apply: ApplyFn,
    pub apply_to: ApplyToFn,
}

fn apply_entry(element: &Element, op: Operation, second: Option<&Element>, env: &mut EvaluationEnvironment) {
    element.apply(op, second, env)
}

fn apply_to_entry(element: &Element, op: Operation, first: &Element, env: &mut EvaluationEnvironment) {
    element.apply_to(op, first, env)
}

/// Constraint has no per-operand split the way apply/apply_to does --
/// `Element::constraint` already picks the dominant side internally, so the
/// table entry is a single free function rather than a method pointer on
/// `&Element`.
pub type ConstraintFn = fn(Operation, Element, Option<Element>, Element) -> crate::env::ConstraintResult;

fn constraint_entry(op: Operation, first: Element, second: Option<Element>, required: Element) -> crate::env::ConstraintResult {
    Element::constraint(op, first, second, required)
}

fn kind_slot(kind: Kind) -> usize {
    match kind {
        Kind::Constant => 0,
        Kind::Interval => 1,
        // Disjunction and Top share dispatch rank; they still
        // get distinct table slots since each is a distinct Element variant.
        Kind::Disjunction => 2,
        Kind::Top => 3,
        Kind::FormalConstruction => 3,
    }
}

static TABLES: OnceLock<[OpTables; 4]> = OnceLock::new();

fn tables() -> &'static [OpTables; 4] {
    TABLES.get_or_init(|| {
        let entry = OpTables { apply: apply_entry, apply_to: apply_to_entry };
        [entry; 4]
    })
}

/// Looks up the operation table for a kind. Exists as a stable handle a
/// host can cache; never mutated after first call.
pub fn table_for(kind: Kind) -> &'static OpTables {
    &tables()[kind_slot(kind)]
}

pub fn constraint_table() -> ConstraintFn {
    constraint_entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Top;
    use crate::ops::{ArithKind, IntOp};
    use crate::width::Signedness;

    #[test]
    fn table_lookup_is_idempotent_across_kinds() {
        let a = table_for(Kind::Constant);
        let b = table_for(Kind::Constant);
        assert_eq!(a.apply as usize, b.apply as usize);
    }

    #[test]
    fn table_entry_matches_direct_dispatch() {
        let c = Element::new_constant_i128(8, Signedness::Signed, 3);
        let top = Element::Top(Top::new(8, Signedness::Signed));
        let op = Operation::Int(IntOp::Add(ArithKind::Signed));

        let mut via_table = EvaluationEnvironment::new(op, c.clone(), Some(top.clone()));
        (table_for(c.kind()).apply)(&c, op, Some(&top), &mut via_table);

        let mut via_direct = EvaluationEnvironment::new(op, c.clone(), Some(top.clone()));
        c.apply(op, Some(&top), &mut via_direct);

        assert_eq!(via_table.finish().result, via_direct.finish().result);
    }
}
