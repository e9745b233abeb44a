//! `EvaluationEnvironment` and `ConstraintEnvironment`, the value objects
//! that travel with every `apply`/`constraint` call.

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::flags::{ErrorFlag, FlagSet};
use crate::ops::Operation;

/// Per-call precision tag returned to the fixpoint engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Exact,
    Degradate,
    Unstable,
}

/// Which bucket of a disjunction a call must populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InformationKind {
    Exact,
    May,
    Sure,
}

/// Caller's preference for how a lattice join should widen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatticeMode {
    /// Prefer interval joins.
    Interval,
    /// Prefer a disjunction (keeps two constants as a two-element
    /// disjunction rather than widening to an interval).
    Disjunction,
    /// Always widen to `Top` when the exact join is not an interval.
    Top,
    /// Widen to `Top` only if the join would enlarge the set beyond either
    /// operand.
    ShareTop,
    /// Build a symbolic formal-operation element rather than evaluating.
    Formal,
}

/// Internal state machine for one `apply`/`constraint` call:
/// `Initial -> Dispatched -> (EmptyResult | ResultAccepted) -> FlagsMerged -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvalState {
    Initial,
    Dispatched,
    EmptyResult,
    ResultAccepted,
    FlagsMerged,
    Done,
}

/// Forward-evaluation environment: arguments, result slot, verdict,
/// information kind, lattice mode, and the accumulated error-flag set.
#[derive(Debug, Clone)]
pub struct EvaluationEnvironment {
    pub op: Operation,
    pub first: Element,
    pub second: Option<Element>,
    result: Option<Element>,
    empty: bool,
    verdict: Verdict,
    pub information_kind: InformationKind,
    pub lattice_mode: LatticeMode,
    flags: FlagSet,
    stop_on_errors: bool,
    state: EvalState,
}

impl EvaluationEnvironment {
    pub fn new(op: Operation, first: Element, second: Option<Element>) -> Self {
        EvaluationEnvironment {
            op,
            first,
            second,
            result: None,
            empty: false,
            verdict: Verdict::Exact,
            information_kind: InformationKind::May,
            lattice_mode: LatticeMode::Interval,
            flags: FlagSet::new(),
            stop_on_errors: false,
            state: EvalState::Initial,
        }
    }

    pub fn with_information_kind(mut self, kind: InformationKind) -> Self {
        self.information_kind = kind;
        self
    }

    pub fn with_lattice_mode(mut self, mode: LatticeMode) -> Self {
        self.lattice_mode = mode;
        self
    }

    pub fn with_stop_on_errors(mut self, stop: bool) -> Self {
        self.stop_on_errors = stop;
        self
    }

    pub fn stop_on_errors(&self) -> bool {
        self.stop_on_errors
    }

    /// Marks the call as dispatched to a kind-specific rule. Idempotent so
    /// nested calls into the same environment don't panic.
    pub fn dispatch(&mut self) {
        if self.state == EvalState::Initial {
            self.state = EvalState::Dispatched;
        }
    }

    pub fn set_empty(&mut self) {
        self.dispatch();
        self.empty = true;
        self.result = None;
        self.state = EvalState::EmptyResult;
    }

    pub fn store_result(&mut self, element: Element) {
        self.dispatch();
        self.empty = false;
        self.result = Some(element);
        self.state = EvalState::ResultAccepted;
    }

    pub fn merge_flags(&mut self, flags: FlagSet) {
        self.flags.merge(flags);
        if self.stop_on_errors && flags.any_sure() {
            self.set_empty();
        }
        if matches!(self.state, EvalState::EmptyResult | EvalState::ResultAccepted) {
            self.state = EvalState::FlagsMerged;
        }
    }

    /// Escape hatch: a sub-computation was deliberately allowed to empty;
    /// its flags should not poison the caller.
    pub fn clear_empty_flags(&mut self) {
        self.flags.clear_empty();
    }

    pub fn merge_verdict_degradate(&mut self) {
        self.verdict = match self.verdict {
            Verdict::Exact => Verdict::Degradate,
            other => other,
        };
    }

    pub fn merge_verdict_unstable(&mut self) {
        self.verdict = Verdict::Unstable;
    }

    pub fn finish(&mut self) -> EvaluationResult {
        self.state = EvalState::Done;
        EvaluationResult {
            result: self.result.take(),
            empty: self.empty,
            verdict: self.verdict,
            flags: self.flags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn flags(&self) -> FlagSet {
        self.flags
    }

    pub fn result(&self) -> Option<&Element> {
        self.result.as_ref()
    }

    pub fn has_flag_sure(&self, flag: ErrorFlag) -> bool {
        self.flags.sure(flag)
    }
}

/// Outcome of `finish()`: what a host reads back after `apply`.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub result: Option<Element>,
    pub empty: bool,
    pub verdict: Verdict,
    pub flags: FlagSet,
}

/// Backward-propagation environment: the forward fields plus per-argument
/// result slots and the required result `r` being propagated.
#[derive(Debug, Clone)]
pub struct ConstraintEnvironment {
    pub op: Operation,
    pub first: Element,
    pub second: Option<Element>,
    pub required: Element,
    first_result: Option<Element>,
    second_result: Option<Element>,
    empty: bool,
    verdict: Verdict,
    pub information_kind: InformationKind,
    pub lattice_mode: LatticeMode,
    flags: FlagSet,
    stop_on_errors: bool,
}

impl ConstraintEnvironment {
    pub fn new(op: Operation, first: Element, second: Option<Element>, required: Element) -> Self {
        ConstraintEnvironment {
            op,
            first,
            second,
            required,
            first_result: None,
            second_result: None,
            empty: false,
            verdict: Verdict::Exact,
            information_kind: InformationKind::May,
            lattice_mode: LatticeMode::Interval,
            flags: FlagSet::new(),
            stop_on_errors: false,
        }
    }

    pub fn with_lattice_mode(mut self, mode: LatticeMode) -> Self {
        self.lattice_mode = mode;
        self
    }

    pub fn stop_on_errors(&self) -> bool {
        self.stop_on_errors
    }

    pub fn with_stop_on_errors(mut self, stop: bool) -> Self {
        self.stop_on_errors = stop;
        self
    }

    pub fn store_first(&mut self, element: Element) {
        self.first_result = Some(element);
    }

    pub fn store_second(&mut self, element: Element) {
        self.second_result = Some(element);
    }

    pub fn set_empty(&mut self) {
        self.empty = true;
        self.first_result = None;
        self.second_result = None;
    }

    pub fn merge_flags(&mut self, flags: FlagSet) {
        self.flags.merge(flags);
    }

    /// Records that this operation has no precise backward inversion
    ///: the operand is returned unchanged and the
    /// verdict downgraded.
    pub fn degrade(&mut self) {
        self.verdict = match self.verdict {
            Verdict::Exact => Verdict::Degradate,
            other => other,
        };
    }

    pub fn finish(self) -> ConstraintResult {
        ConstraintResult {
            first: self.first_result,
            second: self.second_result,
            empty: self.empty,
            verdict: self.verdict,
            flags: self.flags,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstraintResult {
    pub first: Option<Element>,
    pub second: Option<Element>,
    pub empty: bool,
    pub verdict: Verdict,
    pub flags: FlagSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::ops::{IntOp, Operation};
    use crate::width::Signedness;

    fn sample() -> Element {
        Element::new_constant_i128(32, Signedness::Signed, 5)
    }

    #[test]
    fn finish_after_store_result_is_not_empty() {
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Opposite), sample(), None);
        env.store_result(sample());
        env.merge_flags(FlagSet::new());
        let r = env.finish();
        assert!(!r.empty);
        assert!(r.result.is_some());
    }

    #[test]
    fn stop_on_errors_empties_on_sure_flag() {
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Opposite), sample(), None)
            .with_stop_on_errors(true);
        env.store_result(sample());
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::PositiveOverflow);
        env.merge_flags(f);
        let r = env.finish();
        assert!(r.empty);
        assert!(r.result.is_none());
    }

    #[test]
    fn verdict_degrades_but_never_upgrades() {
        let mut env = EvaluationEnvironment::new(Operation::Int(IntOp::Opposite), sample(), None);
        env.merge_verdict_degradate();
        env.merge_verdict_unstable();
        env.store_result(sample());
        let r = env.finish();
        assert_eq!(r.verdict, Verdict::Unstable);
    }
}
