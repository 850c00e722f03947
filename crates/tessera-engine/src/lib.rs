//! Tessera Engine
//!
//! The runtime side of Tessera's method substitution and foreign interop:
//! - **Substitution**: method keys, factories and the two-tier registry
//!   (`substitution` module), plus the built-in static table
//! - **Object model**: guest references, native or wrapping a foreign value
//!   (`object` and `meta` modules)
//! - **Interop**: guest-facing interop messages and the `Interop` class
//!   message table (`interop` module)
//! - **Exceptions**: translation of interop failures and foreign exceptions
//!   into guest exceptions (`exception` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_engine::{GuestValue, InteropContext};
//!
//! let ctx = InteropContext::new();
//! let method = ctx.describe_method("java/lang/System", "identityHashCode", "(Ljava/lang/Object;)I");
//! let node = ctx.resolve(&method).expect("built-in substitution");
//! let hash = node.call(&ctx, &[GuestValue::null()]).unwrap();
//! assert_eq!(hash.as_int(), Some(0));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Per-runtime interop context
pub mod context;

/// Default configuration constants
pub mod defaults;

/// Exception translation
pub mod exception;

/// Guest-facing interop protocol
pub mod interop;

/// Guest class names and object construction
pub mod meta;

/// Method metadata
pub mod method;

/// Guest object model
pub mod object;

/// Runtime options
pub mod options;

/// Method substitution
pub mod substitution;

mod substitutions;

/// Symbol interning
pub mod symbol;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::InteropContext;
pub use exception::{ExceptionBridge, InternalTypeConverter, Thrown, TypeConverter, TypeMappings};
pub use interop::Message;
pub use meta::{names, GuestHeap, Meta, NativeHeap};
pub use method::{DefiningLoader, MethodDescriptor, MethodInfo, VersionRange};
pub use object::{GuestRef, GuestValue, NativeData};
pub use options::RuntimeOptions;
pub use substitution::{
    DispatchNode, MethodKey, RegistryError, StaticTable, StaticTableBuilder, SubstitutionFactory, SubstitutionKind,
    SubstitutionRegistry,
};
pub use symbol::Symbol;

/// Re-exported so that embedders name the same interop types the engine uses
pub use tessera_sdk;
