//! Arbitrary-width integer and IEEE-shaped float primitives.
//!
//! Every operation here is total: it always returns a value together with
//! the [`FlagSet`](crate::flags::FlagSet) of errors that occurred while
//! computing it. Nothing in this module is abstract --
//! these are concrete scalar values manipulated exactly, which is what lets
//! [`crate::element::constant::Constant`] delegate to them directly.

mod apfloat;
mod apint;

pub use apfloat::ApFloat;
pub use apint::ApInt;
