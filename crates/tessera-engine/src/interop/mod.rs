//! Guest-facing interop
//!
//! [`protocol`] exposes every interop message as a function over guest
//! references: receivers are unwrapped, results wrapped back, failures
//! translated. [`message`] names those functions the way the guest
//! `Interop` class declares them, so they can be registered as static
//! substitutions.

pub mod message;
pub mod protocol;

pub use crate::object::unwrap;
pub use message::Message;
