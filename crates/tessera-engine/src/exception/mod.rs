//! Exception translation between the interop layer and the guest
//!
//! Every guest-facing operation fails with [`Thrown`]. Interop failures are
//! translated by the [`ExceptionBridge`] at the operation that produced
//! them, so guest code only ever sees exceptions from its own hierarchy.

mod bridge;
mod mappings;

pub use bridge::ExceptionBridge;
pub use mappings::{InternalTypeConverter, TypeConverter, TypeMappings};

use tessera_sdk::InteropValue;

use crate::object::GuestRef;

/// What a guest-facing operation throws.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Thrown {
    /// A guest exception, possibly a carrier of a foreign one
    #[error("guest exception {0:?}")]
    Guest(GuestRef),

    /// A foreign exception that could not be translated, unchanged
    #[error("untranslated foreign exception {0:?}")]
    Foreign(InteropValue),
}

impl Thrown {
    /// The guest exception, if translation produced one
    pub fn as_guest(&self) -> Option<&GuestRef> {
        match self {
            Thrown::Guest(r) => Some(r),
            Thrown::Foreign(_) => None,
        }
    }
}

impl From<GuestRef> for Thrown {
    fn from(exception: GuestRef) -> Self {
        Thrown::Guest(exception)
    }
}
