//! Well-known guest classes and guest object construction
//!
//! [`names()`] holds the interned names of every guest class this crate
//! creates or checks for. [`GuestHeap`] is the allocation interface of the
//! embedding runtime; [`Meta`] builds on it to create strings, boxes,
//! arrays, exceptions and foreign wrappers, and owns the enum singletons the
//! `Interop` substitutions hand out.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tessera_sdk::{ByteOrder, ExceptionType, InteropValue};

use crate::exception::Thrown;
use crate::object::{
    box_primitive, ArrayData, Backtrace, ExceptionData, GuestRef, GuestValue, NativeData, StackFrame, Throwable,
};
use crate::symbol::Symbol;

// ============================================================================
// Names
// ============================================================================

macro_rules! define_names {
    ($($field:ident => $name:literal,)*) => {
        /// Interned names of the guest classes used by the bridge
        pub struct Names {
            $(
                #[doc = concat!("`", $name, "`")]
                pub $field: Symbol,
            )*
        }

        impl Names {
            fn new() -> Self {
                Self {
                    $($field: Symbol::intern($name),)*
                }
            }
        }
    };
}

define_names! {
    object => "java/lang/Object",
    class => "java/lang/Class",
    string => "java/lang/String",
    boolean => "java/lang/Boolean",
    byte => "java/lang/Byte",
    character => "java/lang/Character",
    short => "java/lang/Short",
    integer => "java/lang/Integer",
    long => "java/lang/Long",
    float => "java/lang/Float",
    double => "java/lang/Double",
    big_integer => "java/math/BigInteger",
    array_list => "java/util/ArrayList",
    hash_map => "java/util/LinkedHashMap",
    iterator => "java/util/Iterator",
    function => "java/util/function/Function",
    byte_array => "[B",
    int_array => "[I",
    object_array => "[Ljava/lang/Object;",
    string_array => "[Ljava/lang/String;",
    throwable => "java/lang/Throwable",
    runtime_exception => "java/lang/RuntimeException",
    illegal_argument => "java/lang/IllegalArgumentException",
    null_pointer => "java/lang/NullPointerException",
    array_index_out_of_bounds => "java/lang/ArrayIndexOutOfBoundsException",
    array_store => "java/lang/ArrayStoreException",
    byte_order => "java/nio/ByteOrder",
    interop => "org/tessera/polyglot/Interop",
    exception_type => "org/tessera/polyglot/ExceptionType",
    foreign_exception => "org/tessera/polyglot/ForeignException",
    interop_exception => "org/tessera/polyglot/InteropException",
    unsupported_message => "org/tessera/polyglot/UnsupportedMessageException",
    unknown_identifier => "org/tessera/polyglot/UnknownIdentifierException",
    arity => "org/tessera/polyglot/ArityException",
    unsupported_type => "org/tessera/polyglot/UnsupportedTypeException",
    invalid_array_index => "org/tessera/polyglot/InvalidArrayIndexException",
    invalid_buffer_offset => "org/tessera/polyglot/InvalidBufferOffsetException",
    stop_iteration => "org/tessera/polyglot/StopIterationException",
    unknown_key => "org/tessera/polyglot/UnknownKeyException",
}

static NAMES: Lazy<Names> = Lazy::new(Names::new);

/// The well-known guest class names
#[inline]
pub fn names() -> &'static Names {
    &NAMES
}

// ============================================================================
// Heap
// ============================================================================

/// Allocation services of the embedding runtime.
///
/// The defaults allocate plain in-process objects; an embedder overrides
/// them to account for allocations or to hook its collector.
pub trait GuestHeap: Send + Sync + fmt::Debug {
    /// Allocate a native object
    fn allocate(&self, klass: Symbol, data: NativeData) -> GuestRef {
        GuestRef::native(klass, data)
    }

    /// Wrap a foreign handle, presented to the guest as `presented`
    fn wrap_foreign(&self, raw: InteropValue, presented: Symbol) -> GuestRef {
        GuestRef::foreign(raw, presented)
    }

    /// Wrap a foreign exception as a throwable carrier
    fn wrap_foreign_exception(&self, raw: InteropValue, presented: Symbol) -> GuestRef {
        GuestRef::foreign_exception(raw, presented, Throwable::new(self.capture_backtrace()))
    }

    /// Backtrace of the current guest thread, innermost frame first
    fn capture_backtrace(&self) -> Backtrace;
}

/// Default heap: counts allocations and reports a settable backtrace.
#[derive(Debug, Default)]
pub struct NativeHeap {
    allocations: AtomicUsize,
    frames: RwLock<Vec<StackFrame>>,
}

impl NativeHeap {
    /// Create a heap with an empty backtrace
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames reported by subsequent backtrace captures
    pub fn set_frames(&self, frames: Vec<StackFrame>) {
        *self.frames.write() = frames;
    }

    /// Number of objects allocated or wrapped so far
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }
}

impl GuestHeap for NativeHeap {
    fn allocate(&self, klass: Symbol, data: NativeData) -> GuestRef {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        GuestRef::native(klass, data)
    }

    fn wrap_foreign(&self, raw: InteropValue, presented: Symbol) -> GuestRef {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        GuestRef::foreign(raw, presented)
    }

    fn wrap_foreign_exception(&self, raw: InteropValue, presented: Symbol) -> GuestRef {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        GuestRef::foreign_exception(raw, presented, Throwable::new(self.capture_backtrace()))
    }

    fn capture_backtrace(&self) -> Backtrace {
        Arc::from(self.frames.read().as_slice())
    }
}

/// Allocator for objects the capability table hands out, which have no
/// guest thread to take a backtrace from.
#[derive(Debug)]
pub(crate) struct DirectHeap;

impl GuestHeap for DirectHeap {
    fn capture_backtrace(&self) -> Backtrace {
        Arc::from(Vec::new())
    }
}

// ============================================================================
// Meta
// ============================================================================

/// Guest object factory and singletons for one runtime.
#[derive(Debug)]
pub struct Meta {
    heap: Arc<dyn GuestHeap>,
    little_endian: GuestRef,
    big_endian: GuestRef,
    exception_types: [GuestRef; 4],
}

impl Meta {
    /// Create the factory and allocate the enum singletons on `heap`
    pub fn new(heap: Arc<dyn GuestHeap>) -> Self {
        let n = names();
        let constant = |klass: Symbol, name: &str| heap.allocate(klass, NativeData::Constant(Symbol::intern(name)));
        let little_endian = constant(n.byte_order, "LITTLE_ENDIAN");
        let big_endian = constant(n.byte_order, "BIG_ENDIAN");
        let exception_types = ExceptionType::ALL.map(|t| constant(n.exception_type, t.constant_name()));
        Self {
            heap,
            little_endian,
            big_endian,
            exception_types,
        }
    }

    /// The allocation interface
    #[inline]
    pub fn heap(&self) -> &dyn GuestHeap {
        &*self.heap
    }

    /// A new guest string
    pub fn to_guest_string(&self, s: &str) -> GuestRef {
        self.heap.allocate(names().string, NativeData::String(s.into()))
    }

    /// Box a primitive slot
    pub fn box_value(&self, value: GuestValue) -> GuestRef {
        box_primitive(self.heap(), value)
    }

    /// A new array with elements of type `component`, given as a primitive
    /// descriptor, an array descriptor or a class name
    pub fn new_array(&self, component: &str, elements: Vec<GuestValue>) -> GuestRef {
        let descriptor = if component.len() == 1 || component.starts_with('[') {
            component.to_string()
        } else {
            format!("L{};", component)
        };
        let klass = Symbol::intern(&format!("[{}", descriptor));
        let array = ArrayData::new(Symbol::intern(&descriptor), elements);
        self.heap.allocate(klass, NativeData::Array(array))
    }

    /// A new guest exception with a backtrace of the current guest thread
    pub fn new_exception(
        &self,
        class: Symbol,
        message: Option<&str>,
        cause: GuestRef,
        fields: Vec<(Symbol, GuestValue)>,
    ) -> GuestRef {
        let throwable = Throwable::new(self.heap.capture_backtrace());
        self.heap
            .allocate(class, NativeData::Exception(ExceptionData::new(message, cause, fields, throwable)))
    }

    /// An exception of `class` ready to be thrown
    pub fn throw(&self, class: Symbol, message: impl AsRef<str>) -> Thrown {
        Thrown::Guest(self.new_exception(class, Some(message.as_ref()), GuestRef::NULL, Vec::new()))
    }

    /// Wrap a foreign handle
    pub fn create_foreign(&self, raw: InteropValue, presented: Symbol) -> GuestRef {
        self.heap.wrap_foreign(raw, presented)
    }

    /// Wrap a foreign exception as a `ForeignException` carrier
    pub fn create_foreign_exception(&self, raw: InteropValue) -> GuestRef {
        self.heap.wrap_foreign_exception(raw, names().foreign_exception)
    }

    /// The `ByteOrder` constant for `order`
    pub fn byte_order(&self, order: ByteOrder) -> GuestRef {
        match order {
            ByteOrder::Little => self.little_endian.clone(),
            ByteOrder::Big => self.big_endian.clone(),
        }
    }

    /// The byte order a guest `ByteOrder` constant stands for
    pub fn byte_order_of(&self, r: &GuestRef) -> Option<ByteOrder> {
        if r.ptr_eq(&self.little_endian) {
            Some(ByteOrder::Little)
        } else if r.ptr_eq(&self.big_endian) {
            Some(ByteOrder::Big)
        } else {
            None
        }
    }

    /// The `ExceptionType` constant for `t`
    pub fn exception_type(&self, t: ExceptionType) -> GuestRef {
        let index = ExceptionType::ALL.iter().position(|&c| c == t).unwrap_or(0);
        self.exception_types[index].clone()
    }
}
