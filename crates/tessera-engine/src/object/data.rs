//! Contents of native guest objects

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use parking_lot::RwLock;

use crate::object::{GuestRef, GuestValue, Throwable};
use crate::symbol::Symbol;

/// Body of a guest function. A thrown guest exception is returned as `Err`.
pub type GuestFn = Arc<dyn Fn(&[GuestValue]) -> Result<GuestValue, GuestRef> + Send + Sync>;

/// What a native object holds, by object shape.
pub enum NativeData {
    /// Plain instance with named fields, in declaration order
    Fields(RwLock<Vec<(Symbol, GuestValue)>>),
    /// `java/lang/String`
    String(Arc<str>),
    /// A boxed primitive (`java/lang/Integer`, `java/lang/Boolean`, ...)
    Boxed(GuestValue),
    /// `java/math/BigInteger`
    BigInteger(Arc<BigInt>),
    /// Fixed-length array
    Array(ArrayData),
    /// Growable list (`java/util/ArrayList`)
    List(RwLock<Vec<GuestValue>>),
    /// Insertion-ordered map (`java/util/LinkedHashMap`)
    Map(RwLock<Vec<(GuestValue, GuestValue)>>),
    /// Single-pass iterator over a snapshot
    Iterator(RwLock<VecDeque<GuestValue>>),
    /// Callable function object
    Function(FunctionData),
    /// Guest exception
    Exception(ExceptionData),
    /// `java/lang/Class` mirror of the named class
    Class(Symbol),
    /// Enum constant, identified by name
    Constant(Symbol),
}

impl fmt::Debug for NativeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeData::Fields(fields) => f.debug_map().entries(fields.read().iter().map(|(k, v)| (k, v))).finish(),
            NativeData::String(s) => write!(f, "{:?}", s),
            NativeData::Boxed(v) => write!(f, "{:?}", v),
            NativeData::BigInteger(v) => write!(f, "{}", v),
            NativeData::Array(a) => write!(f, "[{}; {}]", a.component, a.len()),
            NativeData::List(items) => write!(f, "List(len={})", items.read().len()),
            NativeData::Map(entries) => write!(f, "Map(len={})", entries.read().len()),
            NativeData::Iterator(rest) => write!(f, "Iterator(remaining={})", rest.read().len()),
            NativeData::Function(func) => write!(f, "Function({})", func.name),
            NativeData::Exception(e) => write!(f, "Exception({:?})", e.message),
            NativeData::Class(name) => write!(f, "Class({})", name),
            NativeData::Constant(name) => write!(f, "Constant({})", name),
        }
    }
}

/// Elements of a fixed-length array
pub struct ArrayData {
    component: Symbol,
    elements: RwLock<Vec<GuestValue>>,
}

impl ArrayData {
    /// Array of `component` descriptors holding `elements`
    pub fn new(component: Symbol, elements: Vec<GuestValue>) -> Self {
        Self {
            component,
            elements: RwLock::new(elements),
        }
    }

    /// Component type descriptor
    #[inline]
    pub fn component(&self) -> Symbol {
        self.component
    }

    /// Whether this is a `byte[]`, which also acts as a buffer
    #[inline]
    pub fn is_byte_array(&self) -> bool {
        self.component.as_str() == "B"
    }

    /// Length
    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    /// Whether the array is empty
    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }

    /// Element storage
    #[inline]
    pub fn elements(&self) -> &RwLock<Vec<GuestValue>> {
        &self.elements
    }
}

/// A callable function object
pub struct FunctionData {
    name: Symbol,
    min_arity: i32,
    max_arity: i32,
    body: GuestFn,
}

impl FunctionData {
    /// A function accepting `min_arity..=max_arity` arguments; `max_arity`
    /// of -1 means variadic
    pub fn new<F>(name: &str, min_arity: i32, max_arity: i32, body: F) -> Self
    where
        F: Fn(&[GuestValue]) -> Result<GuestValue, GuestRef> + Send + Sync + 'static,
    {
        Self {
            name: Symbol::intern(name),
            min_arity,
            max_arity,
            body: Arc::new(body),
        }
    }

    /// Function name
    #[inline]
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Accepted argument counts as `(min, max)`; `max` is -1 if variadic
    #[inline]
    pub fn arity(&self) -> (i32, i32) {
        (self.min_arity, self.max_arity)
    }

    /// Whether `count` arguments are accepted
    pub fn accepts(&self, count: usize) -> bool {
        let count = count as i64;
        count >= self.min_arity as i64 && (self.max_arity < 0 || count <= self.max_arity as i64)
    }

    /// Invoke the body
    pub fn call(&self, args: &[GuestValue]) -> Result<GuestValue, GuestRef> {
        (self.body)(args)
    }
}

/// State of a guest exception
pub struct ExceptionData {
    message: Option<Arc<str>>,
    cause: RwLock<GuestRef>,
    fields: Vec<(Symbol, GuestValue)>,
    throwable: Throwable,
}

impl ExceptionData {
    /// An exception with the given message, cause, kind-specific fields and
    /// captured backtrace
    pub fn new(
        message: Option<&str>,
        cause: GuestRef,
        fields: Vec<(Symbol, GuestValue)>,
        throwable: Throwable,
    ) -> Self {
        Self {
            message: message.map(Arc::from),
            cause: RwLock::new(cause),
            fields,
            throwable,
        }
    }

    /// Detail message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Cause, or null
    pub fn cause(&self) -> GuestRef {
        self.cause.read().clone()
    }

    /// Replace the cause
    pub fn set_cause(&self, cause: GuestRef) {
        *self.cause.write() = cause;
    }

    /// A kind-specific field
    pub fn field(&self, name: &str) -> Option<&GuestValue> {
        let name = Symbol::intern(name);
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Backtrace state
    #[inline]
    pub fn throwable(&self) -> &Throwable {
        &self.throwable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_arity() {
        let f = FunctionData::new("f", 1, 2, |_| Ok(GuestValue::Void));
        assert!(!f.accepts(0));
        assert!(f.accepts(2));
        assert!(!f.accepts(3));

        let variadic = FunctionData::new("v", 1, -1, |_| Ok(GuestValue::Void));
        assert!(variadic.accepts(100));
        assert_eq!(variadic.arity(), (1, -1));
    }

    #[test]
    fn test_byte_array_is_buffer() {
        let bytes = ArrayData::new(Symbol::intern("B"), vec![GuestValue::Byte(0); 4]);
        assert!(bytes.is_byte_array());
        assert_eq!(bytes.len(), 4);
        let ints = ArrayData::new(Symbol::intern("I"), Vec::new());
        assert!(!ints.is_byte_array());
        assert!(ints.is_empty());
    }
}
