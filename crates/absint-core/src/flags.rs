//! Error-flag bookkeeping: a 16-bit mask pairing each flag with a may/sure bit.
//!
//! Flags are accumulated with OR across nested sub-computations and never
//! cleared except via the explicit [`FlagSet::clear_empty`] helper used
//! when a sub-computation is deliberately allowed to empty.

use serde::{Deserialize, Serialize};

/// The error kinds the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorFlag {
    PositiveOverflow = 0,
    NegativeOverflow = 1,
    PositiveUnderflow = 2,
    NegativeUnderflow = 3,
    DivisionByZero = 4,
    NaN = 5,
    Inexact = 6,
    Unimplemented = 7,
}

impl ErrorFlag {
    const ALL: [ErrorFlag; 8] = [
        ErrorFlag::PositiveOverflow,
        ErrorFlag::NegativeOverflow,
        ErrorFlag::PositiveUnderflow,
        ErrorFlag::NegativeUnderflow,
        ErrorFlag::DivisionByZero,
        ErrorFlag::NaN,
        ErrorFlag::Inexact,
        ErrorFlag::Unimplemented,
    ];

    fn may_bit(self) -> u16 {
        1 << ((self as u8) * 2)
    }

    fn sure_bit(self) -> u16 {
        1 << ((self as u8) * 2 + 1)
    }
}

/// A 16-bit error-flag set: each of the 8 [`ErrorFlag`] kinds gets a
/// may-bit and a sure-bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet(u16);

impl FlagSet {
    pub const EMPTY: FlagSet = FlagSet(0);

    pub fn new() -> Self {
        FlagSet::EMPTY
    }

    /// Marks `flag` as possible on at least one concretisation.
    pub fn set_may(&mut self, flag: ErrorFlag) {
        self.0 |= flag.may_bit();
    }

    /// Marks `flag` as certain on every concretisation. Implies `may`.
    pub fn set_sure(&mut self, flag: ErrorFlag) {
        self.0 |= flag.may_bit() | flag.sure_bit();
    }

    pub fn may(&self, flag: ErrorFlag) -> bool {
        self.0 & flag.may_bit() != 0
    }

    pub fn sure(&self, flag: ErrorFlag) -> bool {
        self.0 & flag.sure_bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// OR-accumulate `other`'s flags into `self`. The only combination
    /// operator the engine ever applies to flag sets.
    pub fn merge(&mut self, other: FlagSet) {
        self.0 |= other.0;
    }

    pub fn merged(mut self, other: FlagSet) -> FlagSet {
        self.merge(other);
        self
    }

    /// Explicit escape hatch for a sub-computation that is deliberately
    /// allowed to empty without its error flags poisoning the caller.
    pub fn clear_empty(&mut self) {
        self.0 = 0;
    }

    pub fn any_sure(&self) -> bool {
        ErrorFlag::ALL.iter().any(|f| self.sure(*f))
    }

    pub fn any_may(&self) -> bool {
        ErrorFlag::ALL.iter().any(|f| self.may(*f))
    }

    /// Clears every sure bit while keeping the matching may bits set. Used
    /// when only part of an interval's concretisation hits an error
    /// condition.
    pub fn downgrade_sure_to_may(&self) -> FlagSet {
        const SURE_MASK: u16 = 0b1010_1010_1010_1010;
        FlagSet(self.0 & !SURE_MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn may_implies_not_sure_by_default() {
        let mut f = FlagSet::new();
        f.set_may(ErrorFlag::PositiveOverflow);
        assert!(f.may(ErrorFlag::PositiveOverflow));
        assert!(!f.sure(ErrorFlag::PositiveOverflow));
    }

    #[test]
    fn sure_implies_may() {
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::DivisionByZero);
        assert!(f.may(ErrorFlag::DivisionByZero));
        assert!(f.sure(ErrorFlag::DivisionByZero));
    }

    #[test]
    fn merge_is_or() {
        let mut a = FlagSet::new();
        a.set_may(ErrorFlag::PositiveOverflow);
        let mut b = FlagSet::new();
        b.set_sure(ErrorFlag::NegativeOverflow);
        a.merge(b);
        assert!(a.may(ErrorFlag::PositiveOverflow));
        assert!(a.sure(ErrorFlag::NegativeOverflow));
    }

    #[test]
    fn clear_empty_resets() {
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::NaN);
        f.clear_empty();
        assert!(f.is_empty());
    }

    #[test]
    fn downgrade_keeps_may_drops_sure() {
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::PositiveOverflow);
        let d = f.downgrade_sure_to_may();
        assert!(d.may(ErrorFlag::PositiveOverflow));
        assert!(!d.sure(ErrorFlag::PositiveOverflow));
    }

    #[test]
    fn flags_are_independent() {
        let mut f = FlagSet::new();
        f.set_sure(ErrorFlag::PositiveOverflow);
        assert!(!f.may(ErrorFlag::NegativeOverflow));
        assert!(!f.sure(ErrorFlag::Inexact));
    }
}
