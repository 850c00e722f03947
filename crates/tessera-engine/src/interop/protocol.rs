//! Interop messages over guest references
//!
//! Every function sends one message to the interop value behind a guest
//! receiver, as given by [`unwrap`]. Values passed along with the message
//! keep their guest types when the receiver is a guest object and are fully
//! unwrapped when it is foreign. Object results come back as guest
//! references: guest objects as they are, anything else as a foreign
//! `java/lang/Object`. Every failure is translated by the context's
//! [`ExceptionBridge`](crate::exception::ExceptionBridge) before it is
//! returned, so callers only see [`Thrown`].

use std::sync::Arc;

use tessera_sdk::{library, ByteOrder, InteropError, InteropException, InteropValue};

use crate::context::InteropContext;
use crate::exception::Thrown;
use crate::meta::names;
use crate::object::{preserve, unwrap, GuestRef, NativeData};

/// Conversion of a value sent along with a message to `receiver`
#[inline]
fn argument(receiver: &GuestRef, value: &GuestRef) -> InteropValue {
    if receiver.is_foreign() {
        unwrap(value)
    } else {
        preserve(value)
    }
}

fn arguments(receiver: &GuestRef, values: &[GuestRef]) -> Vec<InteropValue> {
    values.iter().map(|v| argument(receiver, v)).collect()
}

#[inline]
fn translate<T>(ctx: &InteropContext, result: Result<T, InteropError>) -> Result<T, Thrown> {
    result.map_err(|e| ctx.bridge().translate_error(e))
}

#[inline]
fn wrap(ctx: &InteropContext, result: Result<InteropValue, InteropError>) -> Result<GuestRef, Thrown> {
    translate(ctx, result).map(|v| ctx.wrap_result(v))
}

/// Capability queries; these never fail.
macro_rules! queries {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(receiver: &GuestRef) -> bool {
                library::$name(&unwrap(receiver))
            }
        )*
    };
}

/// Queries about one array element
macro_rules! index_queries {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(receiver: &GuestRef, index: i64) -> bool {
                library::$name(&unwrap(receiver), index)
            }
        )*
    };
}

/// Queries about one member
macro_rules! member_queries {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(receiver: &GuestRef, member: &str) -> bool {
                library::$name(&unwrap(receiver), member)
            }
        )*
    };
}

/// Queries about one hash key
macro_rules! key_queries {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(receiver: &GuestRef, key: &GuestRef) -> bool {
                library::$name(&unwrap(receiver), &argument(receiver, key))
            }
        )*
    };
}

/// Operations with a primitive result
macro_rules! primitive_operations {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(ctx: &InteropContext, receiver: &GuestRef) -> Result<$ty, Thrown> {
                translate(ctx, library::$name(&unwrap(receiver)))
            }
        )*
    };
}

/// Operations with an object result
macro_rules! object_operations {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(ctx: &InteropContext, receiver: &GuestRef) -> Result<GuestRef, Thrown> {
                wrap(ctx, library::$name(&unwrap(receiver)))
            }
        )*
    };
}

// ============================================================================
// Null, Boolean, String
// ============================================================================

queries! {
    /// Whether the receiver is null-like
    is_null;
    /// Whether the receiver is a boolean
    is_boolean;
    /// Whether the receiver is a string
    is_string;
}

primitive_operations! {
    /// The boolean value
    as_boolean -> bool;
}

/// The string value, as a guest string
pub fn as_string(ctx: &InteropContext, receiver: &GuestRef) -> Result<GuestRef, Thrown> {
    let s = translate(ctx, library::as_string(&unwrap(receiver)))?;
    Ok(ctx.meta().to_guest_string(&s))
}

// ============================================================================
// Numbers
// ============================================================================

queries! {
    /// Whether the receiver is a number
    is_number;
    /// Whether the number converts exactly to `byte`
    fits_in_byte;
    /// Whether the number converts exactly to `short`
    fits_in_short;
    /// Whether the number converts exactly to `int`
    fits_in_int;
    /// Whether the number converts exactly to `long`
    fits_in_long;
    /// Whether the number converts exactly to `float`
    fits_in_float;
    /// Whether the number converts exactly to `double`
    fits_in_double;
    /// Whether the number converts exactly to `BigInteger`
    fits_in_big_integer;
}

primitive_operations! {
    /// Exact `byte` value
    as_byte -> i8;
    /// Exact `short` value
    as_short -> i16;
    /// Exact `int` value
    as_int -> i32;
    /// Exact `long` value
    as_long -> i64;
    /// Exact `float` value
    as_float -> f32;
    /// Exact `double` value
    as_double -> f64;
}

/// Exact value as a guest `BigInteger`
pub fn as_big_integer(ctx: &InteropContext, receiver: &GuestRef) -> Result<GuestRef, Thrown> {
    let value = translate(ctx, library::as_big_integer(&unwrap(receiver)))?;
    Ok(ctx
        .meta()
        .heap()
        .allocate(names().big_integer, NativeData::BigInteger(Arc::new(value))))
}

// ============================================================================
// Exceptions
// ============================================================================

queries! {
    /// Whether the receiver is an exception
    is_exception;
    /// Whether the exception has a cause
    has_exception_cause;
    /// Whether the exception has a message
    has_exception_message;
    /// Whether the exception has a stack trace
    has_exception_stack_trace;
}

primitive_operations! {
    /// Whether a parse error stems from incomplete source
    is_exception_incomplete_source -> bool;
    /// Exit status of an exit exception
    get_exception_exit_status -> i32;
}

object_operations! {
    /// Exception message
    get_exception_message;
    /// Exception stack trace
    get_exception_stack_trace;
}

/// The exception to throw for the receiver.
///
/// A foreign exception is translated like any exception arriving from a
/// foreign call; a guest exception is thrown as it is.
pub fn throw_exception(ctx: &InteropContext, receiver: &GuestRef) -> Thrown {
    let value = unwrap(receiver);
    match library::throw_exception(&value) {
        InteropError::Thrown(exception) => ctx.bridge().translate_thrown(exception),
        error => ctx.bridge().translate_error(error),
    }
}

/// Exception category, as a guest `ExceptionType` constant
pub fn get_exception_type(ctx: &InteropContext, receiver: &GuestRef) -> Result<GuestRef, Thrown> {
    let t = translate(ctx, library::get_exception_type(&unwrap(receiver)))?;
    Ok(ctx.meta().exception_type(t))
}

/// Exception cause. A foreign cause is wrapped as a `ForeignException`
/// carrier.
pub fn get_exception_cause(ctx: &InteropContext, receiver: &GuestRef) -> Result<GuestRef, Thrown> {
    let cause = translate(ctx, library::get_exception_cause(&unwrap(receiver)))?;
    match cause.downcast_ref::<GuestRef>() {
        Some(r) => Ok(r.clone()),
        None if cause.is_null_variant() => Ok(GuestRef::NULL),
        None => Ok(ctx.meta().create_foreign_exception(cause)),
    }
}

// ============================================================================
// Arrays
// ============================================================================

queries! {
    /// Whether the receiver has array elements
    has_array_elements;
}

index_queries! {
    /// Whether the element can be read
    is_array_element_readable;
    /// Whether the element can be replaced
    is_array_element_modifiable;
    /// Whether an element can be inserted at the index
    is_array_element_insertable;
    /// Whether the element can be removed
    is_array_element_removable;
}

primitive_operations! {
    /// Number of array elements
    get_array_size -> i64;
}

/// Read an array element
pub fn read_array_element(ctx: &InteropContext, receiver: &GuestRef, index: i64) -> Result<GuestRef, Thrown> {
    wrap(ctx, library::read_array_element(&unwrap(receiver), index))
}

/// Write an array element
pub fn write_array_element(
    ctx: &InteropContext,
    receiver: &GuestRef,
    index: i64,
    value: &GuestRef,
) -> Result<(), Thrown> {
    translate(
        ctx,
        library::write_array_element(&unwrap(receiver), index, argument(receiver, value)),
    )
}

/// Remove an array element
pub fn remove_array_element(ctx: &InteropContext, receiver: &GuestRef, index: i64) -> Result<(), Thrown> {
    translate(ctx, library::remove_array_element(&unwrap(receiver), index))
}

// ============================================================================
// Meta Objects
// ============================================================================

queries! {
    /// Whether the receiver has a meta object
    has_meta_object;
    /// Whether the receiver is a meta object
    is_meta_object;
}

object_operations! {
    /// The receiver's meta object
    get_meta_object;
    /// Qualified name of a meta object
    get_meta_qualified_name;
    /// Simple name of a meta object
    get_meta_simple_name;
}

/// Whether `instance` is an instance of the meta object `receiver`
pub fn is_meta_instance(ctx: &InteropContext, receiver: &GuestRef, instance: &GuestRef) -> Result<bool, Thrown> {
    translate(ctx, library::is_meta_instance(&unwrap(receiver), &unwrap(instance)))
}

/// Human-readable representation
pub fn to_display_string(ctx: &InteropContext, receiver: &GuestRef, allow_side_effects: bool) -> GuestRef {
    ctx.wrap_result(library::to_display_string(&unwrap(receiver), allow_side_effects))
}

// ============================================================================
// Identity
// ============================================================================

queries! {
    /// Whether the receiver has identity
    has_identity;
}

/// Whether both references denote the same value
pub fn is_identical(receiver: &GuestRef, other: &GuestRef) -> bool {
    library::is_identical(&unwrap(receiver), &unwrap(other))
}

primitive_operations! {
    /// Identity hash code
    identity_hash_code -> i32;
}

// ============================================================================
// Members
// ============================================================================

queries! {
    /// Whether the receiver has members
    has_members;
}

member_queries! {
    /// Whether the member can be read
    is_member_readable;
    /// Whether the member can be written
    is_member_modifiable;
    /// Whether the member can be created
    is_member_insertable;
    /// Whether the member can be removed
    is_member_removable;
    /// Whether the member can be invoked
    is_member_invocable;
    /// Whether the member is internal
    is_member_internal;
    /// Whether reading the member may have side effects
    has_member_read_side_effects;
    /// Whether writing the member may have side effects
    has_member_write_side_effects;
}

/// Member names
pub fn get_members(ctx: &InteropContext, receiver: &GuestRef, include_internal: bool) -> Result<GuestRef, Thrown> {
    wrap(ctx, library::get_members(&unwrap(receiver), include_internal))
}

/// Read a member
pub fn read_member(ctx: &InteropContext, receiver: &GuestRef, member: &str) -> Result<GuestRef, Thrown> {
    wrap(ctx, library::read_member(&unwrap(receiver), member))
}

/// Write a member
pub fn write_member(ctx: &InteropContext, receiver: &GuestRef, member: &str, value: &GuestRef) -> Result<(), Thrown> {
    translate(
        ctx,
        library::write_member(&unwrap(receiver), member, argument(receiver, value)),
    )
}

/// Remove a member
pub fn remove_member(ctx: &InteropContext, receiver: &GuestRef, member: &str) -> Result<(), Thrown> {
    translate(ctx, library::remove_member(&unwrap(receiver), member))
}

/// Invoke a member
pub fn invoke_member(
    ctx: &InteropContext,
    receiver: &GuestRef,
    member: &str,
    args: &[GuestRef],
) -> Result<GuestRef, Thrown> {
    let args = arguments(receiver, args);
    wrap(ctx, library::invoke_member(&unwrap(receiver), member, &args))
}

// ============================================================================
// Pointers
// ============================================================================

queries! {
    /// Whether the receiver is a native pointer
    is_pointer;
}

primitive_operations! {
    /// Native address
    as_pointer -> i64;
}

/// Ask the receiver to move to native memory
pub fn to_native(receiver: &GuestRef) {
    library::to_native(&unwrap(receiver));
}

// ============================================================================
// Executables
// ============================================================================

queries! {
    /// Whether the receiver can be executed
    is_executable;
    /// Whether the receiver can be instantiated
    is_instantiable;
    /// Whether the executable has a name
    has_executable_name;
    /// Whether the executable has a declaring meta object
    has_declaring_meta_object;
}

object_operations! {
    /// Executable name
    get_executable_name;
    /// Declaring meta object
    get_declaring_meta_object;
}

/// Execute the receiver
pub fn execute(ctx: &InteropContext, receiver: &GuestRef, args: &[GuestRef]) -> Result<GuestRef, Thrown> {
    let args = arguments(receiver, args);
    wrap(ctx, library::execute(&unwrap(receiver), &args))
}

/// Instantiate the receiver
pub fn instantiate(ctx: &InteropContext, receiver: &GuestRef, args: &[GuestRef]) -> Result<GuestRef, Thrown> {
    let args = arguments(receiver, args);
    wrap(ctx, library::instantiate(&unwrap(receiver), &args))
}

// ============================================================================
// Buffers
// ============================================================================
//
// Not atomic: concurrent accesses to the same region may interleave.

queries! {
    /// Whether the receiver is a byte buffer
    has_buffer_elements;
}

primitive_operations! {
    /// Whether the buffer accepts writes
    is_buffer_writable -> bool;
    /// Buffer size in bytes
    get_buffer_size -> i64;
}

/// Read one byte
pub fn read_buffer_byte(ctx: &InteropContext, receiver: &GuestRef, offset: i64) -> Result<i8, Thrown> {
    translate(ctx, library::read_buffer_byte(&unwrap(receiver), offset))
}

/// Write one byte
pub fn write_buffer_byte(ctx: &InteropContext, receiver: &GuestRef, offset: i64, value: i8) -> Result<(), Thrown> {
    translate(ctx, library::write_buffer_byte(&unwrap(receiver), offset, value))
}

macro_rules! buffer_operations {
    ($($read:ident / $write:ident -> $ty:ty;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` at a byte offset")]
            pub fn $read(ctx: &InteropContext, receiver: &GuestRef, order: ByteOrder, offset: i64) -> Result<$ty, Thrown> {
                translate(ctx, library::$read(&unwrap(receiver), order, offset))
            }

            #[doc = concat!("Write a `", stringify!($ty), "` at a byte offset")]
            pub fn $write(
                ctx: &InteropContext,
                receiver: &GuestRef,
                order: ByteOrder,
                offset: i64,
                value: $ty,
            ) -> Result<(), Thrown> {
                translate(ctx, library::$write(&unwrap(receiver), order, offset, value))
            }
        )*
    };
}

buffer_operations! {
    read_buffer_short / write_buffer_short -> i16;
    read_buffer_int / write_buffer_int -> i32;
    read_buffer_long / write_buffer_long -> i64;
    read_buffer_float / write_buffer_float -> f32;
    read_buffer_double / write_buffer_double -> f64;
}

// ============================================================================
// Iterators
// ============================================================================

queries! {
    /// Whether the receiver can produce an iterator
    has_iterator;
    /// Whether the receiver is an iterator
    is_iterator;
}

primitive_operations! {
    /// Whether the iterator has another element
    has_iterator_next_element -> bool;
}

object_operations! {
    /// A fresh iterator
    get_iterator;
    /// Advance the iterator
    get_iterator_next_element;
}

// ============================================================================
// Hash Entries
// ============================================================================

queries! {
    /// Whether the receiver has hash entries
    has_hash_entries;
}

key_queries! {
    /// Whether the key is mapped and readable
    is_hash_entry_readable;
    /// Whether the mapped value can be replaced
    is_hash_entry_modifiable;
    /// Whether the key can be added
    is_hash_entry_insertable;
    /// Whether the key can be written
    is_hash_entry_writable;
    /// Whether the key can be removed
    is_hash_entry_removable;
    /// Whether the key is mapped
    is_hash_entry_existing;
}

primitive_operations! {
    /// Number of entries
    get_hash_size -> i64;
}

object_operations! {
    /// Iterator over `[key, value]` pairs
    get_hash_entries_iterator;
    /// Iterator over keys
    get_hash_keys_iterator;
    /// Iterator over values
    get_hash_values_iterator;
}

/// Value mapped to `key`
pub fn read_hash_value(ctx: &InteropContext, receiver: &GuestRef, key: &GuestRef) -> Result<GuestRef, Thrown> {
    wrap(ctx, library::read_hash_value(&unwrap(receiver), &argument(receiver, key)))
}

/// Value mapped to `key`, or `default` if there is none
pub fn read_hash_value_or_default(
    ctx: &InteropContext,
    receiver: &GuestRef,
    key: &GuestRef,
    default: &GuestRef,
) -> Result<GuestRef, Thrown> {
    let value = library::read_hash_value_or_default(
        &unwrap(receiver),
        &argument(receiver, key),
        preserve(default),
    );
    wrap(ctx, value)
}

/// Map `key` to `value`
pub fn write_hash_entry(
    ctx: &InteropContext,
    receiver: &GuestRef,
    key: &GuestRef,
    value: &GuestRef,
) -> Result<(), Thrown> {
    translate(
        ctx,
        library::write_hash_entry(&unwrap(receiver), argument(receiver, key), argument(receiver, value)),
    )
}

/// Remove the entry for `key`
pub fn remove_hash_entry(ctx: &InteropContext, receiver: &GuestRef, key: &GuestRef) -> Result<(), Thrown> {
    translate(ctx, library::remove_hash_entry(&unwrap(receiver), &argument(receiver, key)))
}

/// The unsupported-message exception, for callers that reject a receiver
/// before sending anything
pub fn unsupported(ctx: &InteropContext) -> Thrown {
    ctx.bridge().translate(InteropException::unsupported())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::GuestValue;
    use parking_lot::RwLock;

    fn list(ctx: &InteropContext, items: Vec<GuestValue>) -> GuestRef {
        ctx.meta()
            .heap()
            .allocate(names().array_list, NativeData::List(RwLock::new(items)))
    }

    #[test]
    fn test_foreign_results_are_wrapped() {
        let ctx = InteropContext::new();
        let boxed = ctx.meta().box_value(GuestValue::Int(5));
        let l = list(&ctx, vec![GuestValue::Ref(boxed.clone()), GuestValue::Int(6)]);
        // guest elements come back as they are
        let e = read_array_element(&ctx, &l, 0).unwrap();
        assert!(e.ptr_eq(&boxed));
        // primitive elements become foreign objects
        let p = read_array_element(&ctx, &l, 1).unwrap();
        assert!(p.is_foreign());
        assert_eq!(as_int(&ctx, &p).unwrap(), 6);
    }

    #[test]
    fn test_failures_are_guest_exceptions() {
        let ctx = InteropContext::new();
        let l = list(&ctx, Vec::new());
        let Err(Thrown::Guest(exc)) = read_array_element(&ctx, &l, 3) else {
            panic!("expected a guest exception");
        };
        assert_eq!(exc.klass(), Some(names().invalid_array_index));

        let Err(Thrown::Guest(exc)) = as_string(&ctx, &l) else {
            panic!("expected a guest exception");
        };
        assert_eq!(exc.klass(), Some(names().unsupported_message));
    }

    #[test]
    fn test_null_receiver() {
        let ctx = InteropContext::new();
        assert!(is_null(&GuestRef::NULL));
        assert!(!has_members(&GuestRef::NULL));
        assert!(as_int(&ctx, &GuestRef::NULL).is_err());
    }

    #[test]
    fn test_as_string_returns_guest_string() {
        let ctx = InteropContext::new();
        let foreign = ctx.meta().create_foreign(InteropValue::from("hi"), names().object);
        let s = as_string(&ctx, &foreign).unwrap();
        assert_eq!(s.host_string().as_deref(), Some("hi"));
    }
}
