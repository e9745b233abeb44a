//! API-boundary error types for absint-core.
//!
//! Uses `thiserror` for structured, matchable error variants.
//!
//! Only misuse a *host* can recover from (mismatched widths, malformed
//! disjunctions passed across the public API) is modeled here. Internal
//! invariant breaks discovered mid-computation -- an interval with
//! `min > max` reaching a forward rule, a dispatch table missing an entry --
//! indicate a bug in the engine or the host and are not recoverable; those
//! paths `panic!` instead -- see DESIGN.md.

use thiserror::Error;

/// Errors produced at the `absint-core` public API boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Two operands that must share bit-width don't.
    #[error("width mismatch: expected {expected}, got {got}")]
    WidthMismatch { expected: u32, got: u32 },

    /// Two operands that must share signedness don't, and the operation
    /// does not define a sign-conversion rule for this case.
    #[error("signedness mismatch: expected {expected:?}, got {got:?}")]
    SignednessMismatch {
        expected: crate::width::Signedness,
        got: crate::width::Signedness,
    },

    /// A bit-width outside `1..=128` was requested.
    #[error("unsupported bit-width: {0} (must be in 1..=128)")]
    UnsupportedWidth(u32),

    /// `min > max` was supplied to `new_interval` (outside of the engine's
    /// own normalisation, which never produces this).
    #[error("invalid interval: min ({min}) > max ({max}) under the given signedness")]
    InvalidInterval { min: i128, max: i128 },

    /// An element of the wrong kind was supplied where a specific kind is
    /// required (e.g. `Disjunction::add_exact` expects bucket members of
    /// the disjunction's own width/signedness).
    #[error("element kind/shape mismatch: {reason}")]
    ShapeMismatch { reason: String },

    /// The requested operation has no defined semantics for the given
    /// element kind. Surfaced explicitly, never silently defaulted.
    #[error("operation {op:?} is unimplemented for this operand shape")]
    Unimplemented { op: crate::ops::Operation },

    /// Textual round-trip parsing (`write` -> parse) failed.
    #[error("malformed element text: {0}")]
    ParseError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
