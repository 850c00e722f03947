//! Tessera SDK - the shared interop value model
//!
//! This crate defines how values cross between the Tessera guest runtime and
//! foreign runtimes, without depending on the full tessera-engine:
//!
//! - [`InteropValue`]: primitives inline, everything else an opaque object
//! - [`InteropObject`]: the capability table a foreign object implements
//! - [`library`]: the dispatcher every interop message goes through
//! - [`InteropException`]: the closed set of interop failure kinds
//!
//! # Example
//!
//! ```ignore
//! use tessera_sdk::{library, InteropObject, InteropValue, InteropResult};
//!
//! #[derive(Debug)]
//! struct Answer;
//!
//! impl InteropObject for Answer {
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//!     fn is_number(&self) -> bool { true }
//!     fn fits_in_int(&self) -> bool { true }
//!     fn as_int(&self) -> InteropResult<i32> { Ok(42) }
//! }
//!
//! let v = InteropValue::object(Answer);
//! assert_eq!(library::as_int(&v).unwrap(), 42);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod library;
pub mod number;
pub mod object;
pub mod types;
pub mod value;

pub use error::{InteropError, InteropException, InteropResult};
pub use object::InteropObject;
pub use types::{ByteOrder, ExceptionType, TriState};
pub use value::InteropValue;

/// Re-exported so that implementors name the same `BigInt` the SDK uses
pub use num_bigint::BigInt;
