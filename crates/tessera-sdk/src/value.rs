//! InteropValue - the external representation of a value crossing the
//! language boundary.
//!
//! Primitive values travel inline. Everything else is an
//! [`InteropObject`] behind an `Arc`: the object *is* its capability table,
//! so holding the value is enough to answer any interop message about it.
//!
//! ```text
//! Null                      no payload
//! Boolean / Byte / Short /  inline primitives
//! Int / Long / Float /
//! Double
//! BigInteger                Arc<BigInt>, arbitrary precision
//! String                    Arc<str>
//! Object                    Arc<dyn InteropObject> (opaque handle)
//! ```

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::object::InteropObject;

/// A value in the shared interop representation.
///
/// Cloning is cheap: heap payloads are reference-counted and never copied.
/// Holding an `InteropValue` does not manage the lifetime of whatever the
/// handle refers to on the foreign side.
#[derive(Clone)]
pub enum InteropValue {
    /// The interop null value
    Null,
    /// A boolean
    Boolean(bool),
    /// An 8-bit signed integer
    Byte(i8),
    /// A 16-bit signed integer
    Short(i16),
    /// A 32-bit signed integer
    Int(i32),
    /// A 64-bit signed integer
    Long(i64),
    /// An IEEE 754 single
    Float(f32),
    /// An IEEE 754 double
    Double(f64),
    /// An arbitrary-precision integer
    BigInteger(Arc<BigInt>),
    /// An immutable string
    String(Arc<str>),
    /// Any object answering interop messages through its capability table
    Object(Arc<dyn InteropObject>),
}

impl InteropValue {
    /// Wrap an object implementing the capability table
    #[inline]
    pub fn object(obj: impl InteropObject + 'static) -> Self {
        InteropValue::Object(Arc::new(obj))
    }

    /// Create a string value
    #[inline]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        InteropValue::String(s.into())
    }

    /// Create a big integer value
    #[inline]
    pub fn big_integer(b: impl Into<BigInt>) -> Self {
        InteropValue::BigInteger(Arc::new(b.into()))
    }

    /// Check for the null variant (not the `is_null` message)
    #[inline]
    pub fn is_null_variant(&self) -> bool {
        matches!(self, InteropValue::Null)
    }

    /// Get the object handle if this is an object
    #[inline]
    pub fn as_object(&self) -> Option<&Arc<dyn InteropObject>> {
        match self {
            InteropValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Downcast the object handle to a concrete implementation
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Short type name, for diagnostics only
    pub fn type_name(&self) -> &'static str {
        match self {
            InteropValue::Null => "null",
            InteropValue::Boolean(_) => "boolean",
            InteropValue::Byte(_) => "byte",
            InteropValue::Short(_) => "short",
            InteropValue::Int(_) => "int",
            InteropValue::Long(_) => "long",
            InteropValue::Float(_) => "float",
            InteropValue::Double(_) => "double",
            InteropValue::BigInteger(_) => "bigint",
            InteropValue::String(_) => "string",
            InteropValue::Object(_) => "object",
        }
    }

    /// Structural equality for primitives, pointer equality for objects.
    ///
    /// Used for hash-entry keys and test assertions. Floats compare by bit
    /// pattern so that `NaN` keys can be found again.
    pub fn same_value(&self, other: &InteropValue) -> bool {
        use InteropValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (BigInteger(a), BigInteger(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Object(a), Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for InteropValue {
    fn default() -> Self {
        InteropValue::Null
    }
}

impl fmt::Debug for InteropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteropValue::Null => write!(f, "Null"),
            InteropValue::Boolean(b) => write!(f, "Boolean({})", b),
            InteropValue::Byte(v) => write!(f, "Byte({})", v),
            InteropValue::Short(v) => write!(f, "Short({})", v),
            InteropValue::Int(v) => write!(f, "Int({})", v),
            InteropValue::Long(v) => write!(f, "Long({})", v),
            InteropValue::Float(v) => write!(f, "Float({})", v),
            InteropValue::Double(v) => write!(f, "Double({})", v),
            InteropValue::BigInteger(v) => write!(f, "BigInteger({})", v),
            InteropValue::String(s) => write!(f, "String({:?})", s),
            InteropValue::Object(obj) => write!(f, "Object({:?})", obj),
        }
    }
}

// ============================================================================
// Conversions from Rust values
// ============================================================================

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for InteropValue {
                #[inline]
                fn from(v: $ty) -> Self {
                    InteropValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Boolean,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl From<&str> for InteropValue {
    fn from(s: &str) -> Self {
        InteropValue::String(Arc::from(s))
    }
}

impl From<String> for InteropValue {
    fn from(s: String) -> Self {
        InteropValue::String(Arc::from(s))
    }
}

impl From<BigInt> for InteropValue {
    fn from(b: BigInt) -> Self {
        InteropValue::BigInteger(Arc::new(b))
    }
}

impl<T: Into<InteropValue>> From<Option<T>> for InteropValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(InteropValue::Null)
    }
}
