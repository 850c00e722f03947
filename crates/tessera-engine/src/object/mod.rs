//! Guest object model
//!
//! A guest reference is either null or points at a [`GuestObject`], which is
//! one of two representations:
//!
//! ```text
//! Native  { klass, data }                  owned by this runtime
//! Foreign { raw, presented, throwable? }   opaque handle from another runtime
//! ```
//!
//! A foreign object's presented class is fixed when it is wrapped and is what
//! type checks and casts see. The raw handle never changes; mutation goes
//! through the interop protocol. Foreign exception carriers additionally hold
//! throwable state (backtrace, stack depth) like any guest exception.

mod convert;
mod data;
mod interop;

pub use convert::{
    box_primitive, coerce, preserve, preserve_value, to_guest, unwrap, unwrap_value, wrap_result,
};
pub use data::{ArrayData, ExceptionData, FunctionData, GuestFn, NativeData};

use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tessera_sdk::InteropValue;

use crate::meta::names;
use crate::symbol::Symbol;

// ============================================================================
// Guest values
// ============================================================================

/// The contents of a guest slot: a primitive or a reference.
#[derive(Debug, Clone, Default)]
pub enum GuestValue {
    /// No value (result of a `V` method)
    #[default]
    Void,
    /// `Z`
    Boolean(bool),
    /// `B`
    Byte(i8),
    /// `C`, a UTF-16 code unit
    Char(u16),
    /// `S`
    Short(i16),
    /// `I`
    Int(i32),
    /// `J`
    Long(i64),
    /// `F`
    Float(f32),
    /// `D`
    Double(f64),
    /// Any reference type, possibly null
    Ref(GuestRef),
}

impl GuestValue {
    /// The null reference
    #[inline]
    pub fn null() -> Self {
        GuestValue::Ref(GuestRef::NULL)
    }

    /// The reference, if this is one
    #[inline]
    pub fn as_ref(&self) -> Option<&GuestRef> {
        match self {
            GuestValue::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// The value as an `I` slot
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            GuestValue::Int(v) => Some(v),
            GuestValue::Short(v) => Some(v as i32),
            GuestValue::Byte(v) => Some(v as i32),
            GuestValue::Char(v) => Some(v as i32),
            _ => None,
        }
    }

    /// The value as a `J` slot
    pub fn as_long(&self) -> Option<i64> {
        match *self {
            GuestValue::Long(v) => Some(v),
            _ => self.as_int().map(i64::from),
        }
    }

    /// The value as a `Z` slot
    pub fn as_boolean(&self) -> Option<bool> {
        match *self {
            GuestValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Field descriptor of the slot kind; `Ljava/lang/Object;` for references
    pub fn descriptor(&self) -> &'static str {
        match self {
            GuestValue::Void => "V",
            GuestValue::Boolean(_) => "Z",
            GuestValue::Byte(_) => "B",
            GuestValue::Char(_) => "C",
            GuestValue::Short(_) => "S",
            GuestValue::Int(_) => "I",
            GuestValue::Long(_) => "J",
            GuestValue::Float(_) => "F",
            GuestValue::Double(_) => "D",
            GuestValue::Ref(_) => "Ljava/lang/Object;",
        }
    }
}

macro_rules! impl_guest_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for GuestValue {
                #[inline]
                fn from(v: $ty) -> Self {
                    GuestValue::$variant(v)
                }
            }
        )*
    };
}

impl_guest_from! {
    bool => Boolean,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    GuestRef => Ref,
}

// ============================================================================
// Throwable state
// ============================================================================

/// One guest stack frame of a captured backtrace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Declaring type of the executing method
    pub declaring_type: Symbol,
    /// Executing method
    pub method: Symbol,
    /// Source line, or -1 if unknown
    pub line: i32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type.as_str().replace('/', "."), self.method)?;
        if self.line >= 0 {
            write!(f, ":{}", self.line)?;
        }
        Ok(())
    }
}

/// Captured guest backtrace
pub type Backtrace = Arc<[StackFrame]>;

/// Backtrace metadata every guest exception carries.
#[derive(Debug, Default)]
pub struct Throwable {
    backtrace: RwLock<Option<Backtrace>>,
    stack_depth: AtomicI32,
}

impl Throwable {
    /// State for a freshly raised exception
    pub fn new(backtrace: Backtrace) -> Self {
        let depth = backtrace.len() as i32;
        Self {
            backtrace: RwLock::new(Some(backtrace)),
            stack_depth: AtomicI32::new(depth),
        }
    }

    /// The captured backtrace, if not cleared
    pub fn backtrace(&self) -> Option<Backtrace> {
        self.backtrace.read().clone()
    }

    /// Number of frames the backtrace covered when captured
    pub fn stack_depth(&self) -> i32 {
        self.stack_depth.load(Ordering::Acquire)
    }

    /// Take over another exception's backtrace and depth
    pub fn copy_from(&self, other: &Throwable) {
        *self.backtrace.write() = other.backtrace();
        self.stack_depth.store(other.stack_depth(), Ordering::Release);
    }

    /// Drop the backtrace so that it is derived again on the next lookup
    pub fn clear(&self) {
        *self.backtrace.write() = None;
        self.stack_depth.store(0, Ordering::Release);
    }
}

// ============================================================================
// Guest objects
// ============================================================================

static NEXT_IDENTITY: AtomicU32 = AtomicU32::new(1);

/// The two representations of a guest object.
#[derive(Debug)]
pub enum Repr {
    /// Owned by this runtime
    Native {
        /// Runtime class
        klass: Symbol,
        /// Contents
        data: NativeData,
    },
    /// Owned by another runtime, reachable only through interop messages
    Foreign {
        /// The foreign handle
        raw: InteropValue,
        /// Class the guest sees; fixed at wrap time
        presented: Symbol,
        /// Set for foreign exception carriers
        throwable: Option<Throwable>,
    },
}

/// A heap object of the guest runtime.
#[derive(Debug)]
pub struct GuestObject {
    identity: i32,
    repr: Repr,
}

impl GuestObject {
    fn new(repr: Repr) -> Self {
        Self {
            identity: NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed) as i32,
            repr,
        }
    }

    /// Representation
    #[inline]
    pub fn repr(&self) -> &Repr {
        &self.repr
    }

    /// Identity hash, stable for the object's lifetime
    #[inline]
    pub fn identity_hash(&self) -> i32 {
        self.identity
    }
}

/// A nullable reference to a guest object.
///
/// Cloning copies the reference, not the object.
#[derive(Clone, Default)]
pub struct GuestRef(Option<Arc<GuestObject>>);

impl GuestRef {
    /// The null reference
    pub const NULL: GuestRef = GuestRef(None);

    /// Allocate a native object
    pub fn native(klass: Symbol, data: NativeData) -> Self {
        GuestRef(Some(Arc::new(GuestObject::new(Repr::Native { klass, data }))))
    }

    /// Wrap a foreign handle, presented to the guest as `presented`
    pub fn foreign(raw: InteropValue, presented: Symbol) -> Self {
        GuestRef(Some(Arc::new(GuestObject::new(Repr::Foreign {
            raw,
            presented,
            throwable: None,
        }))))
    }

    /// Wrap a foreign exception as a guest exception carrier
    pub fn foreign_exception(raw: InteropValue, presented: Symbol, throwable: Throwable) -> Self {
        GuestRef(Some(Arc::new(GuestObject::new(Repr::Foreign {
            raw,
            presented,
            throwable: Some(throwable),
        }))))
    }

    /// Whether this is the null reference
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// The object, unless null
    #[inline]
    pub fn object(&self) -> Option<&GuestObject> {
        self.0.as_deref()
    }

    /// Whether this wraps a foreign handle
    #[inline]
    pub fn is_foreign(&self) -> bool {
        matches!(self.object().map(GuestObject::repr), Some(Repr::Foreign { .. }))
    }

    /// The raw foreign handle, if this wraps one
    pub fn raw_foreign(&self) -> Option<&InteropValue> {
        match self.object()?.repr() {
            Repr::Foreign { raw, .. } => Some(raw),
            Repr::Native { .. } => None,
        }
    }

    /// Contents of a native object
    pub fn native_data(&self) -> Option<&NativeData> {
        match self.object()?.repr() {
            Repr::Native { data, .. } => Some(data),
            Repr::Foreign { .. } => None,
        }
    }

    /// Class as seen by the guest: the runtime class of a native object or
    /// the presented class of a foreign one
    pub fn klass(&self) -> Option<Symbol> {
        match self.object()?.repr() {
            Repr::Native { klass, .. } => Some(*klass),
            Repr::Foreign { presented, .. } => Some(*presented),
        }
    }

    /// Reference equality
    #[inline]
    pub fn ptr_eq(&self, other: &GuestRef) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Identity hash; 0 for null
    pub fn identity_hash(&self) -> i32 {
        self.object().map_or(0, GuestObject::identity_hash)
    }

    /// Backtrace state of a guest exception or a foreign exception carrier
    pub fn throwable(&self) -> Option<&Throwable> {
        match self.object()?.repr() {
            Repr::Native {
                data: NativeData::Exception(e),
                ..
            } => Some(e.throwable()),
            Repr::Foreign { throwable, .. } => throwable.as_ref(),
            Repr::Native { .. } => None,
        }
    }

    /// Whether this is a guest exception (native or carrier)
    #[inline]
    pub fn is_exception(&self) -> bool {
        self.throwable().is_some()
    }

    /// Whether this is a foreign exception carrier
    pub fn is_foreign_exception(&self) -> bool {
        matches!(
            self.object().map(GuestObject::repr),
            Some(Repr::Foreign { throwable: Some(_), .. })
        )
    }

    /// Contents of a native `java/lang/String`
    pub fn host_string(&self) -> Option<Arc<str>> {
        match self.native_data()? {
            NativeData::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Exception data of a native guest exception
    pub fn exception_data(&self) -> Option<&ExceptionData> {
        match self.native_data()? {
            NativeData::Exception(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for GuestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object() {
            None => write!(f, "null"),
            Some(obj) => match obj.repr() {
                Repr::Native { klass, .. } => write!(f, "{}@{:x}", klass, obj.identity),
                Repr::Foreign { raw, presented, .. } => {
                    write!(f, "foreign {}@{:x} -> {:?}", presented, obj.identity, raw)
                }
            },
        }
    }
}

// ============================================================================
// Class mirrors
// ============================================================================

static CLASS_MIRRORS: Lazy<DashMap<Symbol, GuestRef>> = Lazy::new(DashMap::new);

/// The unique `java/lang/Class` object for `klass`
pub fn class_mirror(klass: Symbol) -> GuestRef {
    CLASS_MIRRORS
        .entry(klass)
        .or_insert_with(|| GuestRef::native(names().class, NativeData::Class(klass)))
        .value()
        .clone()
}
