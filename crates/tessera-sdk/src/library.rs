//! The shared interop dispatcher.
//!
//! One free function per interop message. Each resolves forwarding
//! delegates, answers for primitive values directly, and sends the message
//! to the object's capability table otherwise. Non-objects decline every
//! message they cannot answer: queries return `false`, operations fail with
//! `UnsupportedMessage`.
//!
//! The derived messages live here rather than in the trait so that every
//! object gets them uniformly:
//! - fixed-width buffer reads/writes in either byte order, built on
//!   `read_buffer` / `write_buffer`
//! - `read_hash_value_or_default`
//! - `is_identical`, which negotiates between both sides
//! - `throw_exception`

use num_bigint::BigInt;

use crate::error::{InteropError, InteropException, InteropResult};
use crate::number;
use crate::types::{ByteOrder, ExceptionType, TriState};
use crate::value::InteropValue;

#[inline]
fn unsupported<T>() -> InteropResult<T> {
    Err(InteropError::unsupported())
}

/// Longest delegate chain [`resolve`] follows
pub const MAX_DELEGATION_DEPTH: usize = 64;

/// Follow forwarding delegates until reaching a value that answers for itself.
///
/// Chains longer than [`MAX_DELEGATION_DEPTH`], delegate cycles included,
/// stop at the last object reached, which then answers with its own table.
pub fn resolve(value: &InteropValue) -> InteropValue {
    let mut current = value.clone();
    for _ in 0..MAX_DELEGATION_DEPTH {
        let InteropValue::Object(obj) = &current else {
            break;
        };
        match obj.delegate() {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// Capability queries that only objects can answer `true` to.
macro_rules! object_queries {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(value: &InteropValue) -> bool {
                match resolve(value) {
                    InteropValue::Object(obj) => obj.$name(),
                    _ => false,
                }
            }
        )*
    };
}

/// Operations that only objects support.
macro_rules! object_operations {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(value: &InteropValue) -> InteropResult<$ty> {
                match resolve(value) {
                    InteropValue::Object(obj) => obj.$name(),
                    _ => unsupported(),
                }
            }
        )*
    };
}

/// Queries keyed by an argument, objects only.
macro_rules! object_keyed_queries {
    ($($(#[$doc:meta])* $name:ident($arg:ident: $ty:ty);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(value: &InteropValue, $arg: $ty) -> bool {
                match resolve(value) {
                    InteropValue::Object(obj) => obj.$name($arg),
                    _ => false,
                }
            }
        )*
    };
}

// ============================================================================
// Null, Boolean, String
// ============================================================================

/// Whether the value is null-like
pub fn is_null(value: &InteropValue) -> bool {
    match resolve(value) {
        InteropValue::Null => true,
        InteropValue::Object(obj) => obj.is_null(),
        _ => false,
    }
}

/// Whether the value is a boolean
pub fn is_boolean(value: &InteropValue) -> bool {
    match resolve(value) {
        InteropValue::Boolean(_) => true,
        InteropValue::Object(obj) => obj.is_boolean(),
        _ => false,
    }
}

/// The boolean value
pub fn as_boolean(value: &InteropValue) -> InteropResult<bool> {
    match resolve(value) {
        InteropValue::Boolean(b) => Ok(b),
        InteropValue::Object(obj) => obj.as_boolean(),
        _ => unsupported(),
    }
}

/// Whether the value is a string
pub fn is_string(value: &InteropValue) -> bool {
    match resolve(value) {
        InteropValue::String(_) => true,
        InteropValue::Object(obj) => obj.is_string(),
        _ => false,
    }
}

/// The string value
pub fn as_string(value: &InteropValue) -> InteropResult<String> {
    match resolve(value) {
        InteropValue::String(s) => Ok(s.to_string()),
        InteropValue::Object(obj) => obj.as_string(),
        _ => unsupported(),
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Whether the value is a number
pub fn is_number(value: &InteropValue) -> bool {
    match resolve(value) {
        InteropValue::Object(obj) => obj.is_number(),
        other => number::is_number(&other),
    }
}

macro_rules! number_messages {
    ($($fits:ident / $as_fn:ident -> $ty:ty;)*) => {
        $(
            #[doc = concat!("Whether the number converts exactly to `", stringify!($ty), "`")]
            pub fn $fits(value: &InteropValue) -> bool {
                match resolve(value) {
                    InteropValue::Object(obj) => obj.$fits(),
                    other => number::$fits(&other),
                }
            }

            #[doc = concat!("Exact `", stringify!($ty), "` value; `UnsupportedMessage` if it does not fit")]
            pub fn $as_fn(value: &InteropValue) -> InteropResult<$ty> {
                match resolve(value) {
                    InteropValue::Object(obj) => obj.$as_fn(),
                    other => number::$as_fn(&other).ok_or_else(InteropError::unsupported),
                }
            }
        )*
    };
}

number_messages! {
    fits_in_byte / as_byte -> i8;
    fits_in_short / as_short -> i16;
    fits_in_int / as_int -> i32;
    fits_in_long / as_long -> i64;
    fits_in_float / as_float -> f32;
    fits_in_double / as_double -> f64;
    fits_in_big_integer / as_big_integer -> BigInt;
}

// ============================================================================
// Exceptions
// ============================================================================

object_queries! {
    /// Whether the value is an exception
    is_exception;
    /// Whether the exception has a cause
    has_exception_cause;
    /// Whether the exception has a message
    has_exception_message;
    /// Whether the exception has a stack trace
    has_exception_stack_trace;
}

object_operations! {
    /// Exception category
    get_exception_type -> ExceptionType;
    /// Whether a parse error stems from incomplete source
    is_exception_incomplete_source -> bool;
    /// Exit status of an exit exception
    get_exception_exit_status -> i32;
    /// Exception cause
    get_exception_cause -> InteropValue;
    /// Exception message
    get_exception_message -> InteropValue;
    /// Exception stack trace
    get_exception_stack_trace -> InteropValue;
}

/// The error that rethrows `value` in its own runtime.
///
/// Returns `UnsupportedMessage` if the value is not an exception.
pub fn throw_exception(value: &InteropValue) -> InteropError {
    if is_exception(value) {
        InteropError::Thrown(value.clone())
    } else {
        InteropError::unsupported()
    }
}

// ============================================================================
// Arrays
// ============================================================================

object_queries! {
    /// Whether the value has array elements
    has_array_elements;
}

object_operations! {
    /// Number of array elements
    get_array_size -> i64;
}

object_keyed_queries! {
    /// Whether the element is readable
    is_array_element_readable(index: i64);
    /// Whether the element is modifiable
    is_array_element_modifiable(index: i64);
    /// Whether an element can be inserted at the index
    is_array_element_insertable(index: i64);
    /// Whether the element is removable
    is_array_element_removable(index: i64);
}

/// Read an array element
pub fn read_array_element(value: &InteropValue, index: i64) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.read_array_element(index),
        _ => unsupported(),
    }
}

/// Write an array element
pub fn write_array_element(value: &InteropValue, index: i64, element: InteropValue) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.write_array_element(index, element),
        _ => unsupported(),
    }
}

/// Remove an array element
pub fn remove_array_element(value: &InteropValue, index: i64) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.remove_array_element(index),
        _ => unsupported(),
    }
}

// ============================================================================
// Meta Objects
// ============================================================================

object_queries! {
    /// Whether the value has a meta object
    has_meta_object;
    /// Whether the value is a meta object
    is_meta_object;
}

object_operations! {
    /// The value's meta object
    get_meta_object -> InteropValue;
    /// Qualified name of a meta object
    get_meta_qualified_name -> InteropValue;
    /// Simple name of a meta object
    get_meta_simple_name -> InteropValue;
}

/// Whether `instance` is an instance of the meta object `value`
pub fn is_meta_instance(value: &InteropValue, instance: &InteropValue) -> InteropResult<bool> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.is_meta_instance(&resolve(instance)),
        _ => unsupported(),
    }
}

/// Human-readable representation of any value
pub fn to_display_string(value: &InteropValue, allow_side_effects: bool) -> InteropValue {
    let text = match resolve(value) {
        InteropValue::Null => "null".to_string(),
        InteropValue::Boolean(b) => b.to_string(),
        InteropValue::Byte(v) => v.to_string(),
        InteropValue::Short(v) => v.to_string(),
        InteropValue::Int(v) => v.to_string(),
        InteropValue::Long(v) => v.to_string(),
        InteropValue::Float(v) => v.to_string(),
        InteropValue::Double(v) => v.to_string(),
        InteropValue::BigInteger(v) => v.to_string(),
        InteropValue::String(s) => return InteropValue::String(s),
        InteropValue::Object(obj) => return obj.to_display_string(allow_side_effects),
    };
    InteropValue::from(text)
}

/// The meta object's qualified name as a host string, for lookups keyed by
/// type name.
pub fn meta_qualified_name_of(value: &InteropValue) -> InteropResult<String> {
    let meta = get_meta_object(value)?;
    let name = get_meta_qualified_name(&meta)?;
    as_string(&name)
}

// ============================================================================
// Identity
// ============================================================================

object_queries! {
    /// Whether the value has identity semantics
    has_identity;
}

/// Identity comparison.
///
/// The receiver decides first; if it answers `Undefined` the other side is
/// asked. If neither decides, the values are not identical. Values without
/// identity (all primitives) are never identical, not even to themselves.
pub fn is_identical(value: &InteropValue, other: &InteropValue) -> bool {
    let (lhs, rhs) = (resolve(value), resolve(other));
    let (InteropValue::Object(a), InteropValue::Object(b)) = (&lhs, &rhs) else {
        return false;
    };
    match a.is_identical_or_undefined(&rhs) {
        TriState::True => true,
        TriState::False => false,
        TriState::Undefined => b.is_identical_or_undefined(&lhs) == TriState::True,
    }
}

/// Identity hash code; `UnsupportedMessage` for values without identity
pub fn identity_hash_code(value: &InteropValue) -> InteropResult<i32> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.identity_hash_code(),
        _ => unsupported(),
    }
}

// ============================================================================
// Members
// ============================================================================

object_queries! {
    /// Whether the value has members
    has_members;
}

object_keyed_queries! {
    /// Whether the member is readable
    is_member_readable(member: &str);
    /// Whether the member is modifiable
    is_member_modifiable(member: &str);
    /// Whether the member can be created
    is_member_insertable(member: &str);
    /// Whether the member is removable
    is_member_removable(member: &str);
    /// Whether the member is invocable
    is_member_invocable(member: &str);
    /// Whether the member is internal
    is_member_internal(member: &str);
    /// Whether reading the member has side effects
    has_member_read_side_effects(member: &str);
    /// Whether writing the member has side effects
    has_member_write_side_effects(member: &str);
}

/// Member names
pub fn get_members(value: &InteropValue, include_internal: bool) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.get_members(include_internal),
        _ => unsupported(),
    }
}

/// Read a member
pub fn read_member(value: &InteropValue, member: &str) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.read_member(member),
        _ => unsupported(),
    }
}

/// Write a member
pub fn write_member(value: &InteropValue, member: &str, new_value: InteropValue) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.write_member(member, new_value),
        _ => unsupported(),
    }
}

/// Remove a member
pub fn remove_member(value: &InteropValue, member: &str) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.remove_member(member),
        _ => unsupported(),
    }
}

/// Invoke a member
pub fn invoke_member(value: &InteropValue, member: &str, args: &[InteropValue]) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.invoke_member(member, args),
        _ => unsupported(),
    }
}

// ============================================================================
// Pointers
// ============================================================================

object_queries! {
    /// Whether the value is a native pointer
    is_pointer;
}

object_operations! {
    /// Native address
    as_pointer -> i64;
}

/// Hint the value to move to native memory
pub fn to_native(value: &InteropValue) {
    if let InteropValue::Object(obj) = resolve(value) {
        obj.to_native();
    }
}

// ============================================================================
// Executables
// ============================================================================

object_queries! {
    /// Whether the value is executable
    is_executable;
    /// Whether the value is instantiable
    is_instantiable;
    /// Whether the executable has a name
    has_executable_name;
    /// Whether the executable has a declaring meta object
    has_declaring_meta_object;
}

object_operations! {
    /// Executable name
    get_executable_name -> InteropValue;
    /// Declaring meta object
    get_declaring_meta_object -> InteropValue;
}

/// Execute with arguments
pub fn execute(value: &InteropValue, args: &[InteropValue]) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.execute(args),
        _ => unsupported(),
    }
}

/// Instantiate with arguments
pub fn instantiate(value: &InteropValue, args: &[InteropValue]) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.instantiate(args),
        _ => unsupported(),
    }
}

// ============================================================================
// Buffers
// ============================================================================
//
// Accesses are not atomic and not thread-safe: a concurrent writer to the
// same region may be observed half-applied.

object_queries! {
    /// Whether the value is a byte buffer
    has_buffer_elements;
}

object_operations! {
    /// Whether the buffer is writable
    is_buffer_writable -> bool;
    /// Buffer size in bytes
    get_buffer_size -> i64;
}

fn read_bytes<const N: usize>(value: &InteropValue, offset: i64) -> InteropResult<[u8; N]> {
    match resolve(value) {
        InteropValue::Object(obj) => {
            let mut bytes = [0u8; N];
            obj.read_buffer(offset, &mut bytes)?;
            Ok(bytes)
        }
        _ => unsupported(),
    }
}

fn write_bytes(value: &InteropValue, offset: i64, bytes: &[u8]) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.write_buffer(offset, bytes),
        _ => unsupported(),
    }
}

/// Read one byte
pub fn read_buffer_byte(value: &InteropValue, offset: i64) -> InteropResult<i8> {
    read_bytes::<1>(value, offset).map(|b| b[0] as i8)
}

/// Write one byte
pub fn write_buffer_byte(value: &InteropValue, offset: i64, byte: i8) -> InteropResult<()> {
    write_bytes(value, offset, &[byte as u8])
}

/// Copy `dst.len()` bytes out of the buffer
pub fn read_buffer(value: &InteropValue, offset: i64, dst: &mut [u8]) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.read_buffer(offset, dst),
        _ => unsupported(),
    }
}

macro_rules! buffer_messages {
    ($($read:ident / $write:ident -> $ty:ty;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` at a byte offset in the given byte order")]
            pub fn $read(value: &InteropValue, order: ByteOrder, offset: i64) -> InteropResult<$ty> {
                let bytes = read_bytes(value, offset)?;
                Ok(match order {
                    ByteOrder::Little => <$ty>::from_le_bytes(bytes),
                    ByteOrder::Big => <$ty>::from_be_bytes(bytes),
                })
            }

            #[doc = concat!("Write a `", stringify!($ty), "` at a byte offset in the given byte order")]
            pub fn $write(value: &InteropValue, order: ByteOrder, offset: i64, v: $ty) -> InteropResult<()> {
                let bytes = match order {
                    ByteOrder::Little => v.to_le_bytes(),
                    ByteOrder::Big => v.to_be_bytes(),
                };
                write_bytes(value, offset, &bytes)
            }
        )*
    };
}

buffer_messages! {
    read_buffer_short / write_buffer_short -> i16;
    read_buffer_int / write_buffer_int -> i32;
    read_buffer_long / write_buffer_long -> i64;
    read_buffer_float / write_buffer_float -> f32;
    read_buffer_double / write_buffer_double -> f64;
}

// ============================================================================
// Iterators
// ============================================================================

object_queries! {
    /// Whether the value can produce an iterator
    has_iterator;
    /// Whether the value is an iterator
    is_iterator;
}

object_operations! {
    /// A fresh iterator
    get_iterator -> InteropValue;
    /// Whether the iterator has another element
    has_iterator_next_element -> bool;
    /// Advance the iterator
    get_iterator_next_element -> InteropValue;
}

// ============================================================================
// Hash Entries
// ============================================================================

object_queries! {
    /// Whether the value has hash entries
    has_hash_entries;
}

object_operations! {
    /// Number of hash entries
    get_hash_size -> i64;
    /// Iterator over `[key, value]` pairs
    get_hash_entries_iterator -> InteropValue;
    /// Iterator over keys
    get_hash_keys_iterator -> InteropValue;
    /// Iterator over values
    get_hash_values_iterator -> InteropValue;
}

object_keyed_queries! {
    /// Whether the key is mapped and readable
    is_hash_entry_readable(key: &InteropValue);
    /// Whether the mapped value can be replaced
    is_hash_entry_modifiable(key: &InteropValue);
    /// Whether the key can be added
    is_hash_entry_insertable(key: &InteropValue);
    /// Whether the key can be written
    is_hash_entry_writable(key: &InteropValue);
    /// Whether the key can be removed
    is_hash_entry_removable(key: &InteropValue);
    /// Whether the key is mapped
    is_hash_entry_existing(key: &InteropValue);
}

/// Value mapped to `key`
pub fn read_hash_value(value: &InteropValue, key: &InteropValue) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.read_hash_value(key),
        _ => unsupported(),
    }
}

/// Value mapped to `key`, or `default` if the key is not readable
pub fn read_hash_value_or_default(
    value: &InteropValue,
    key: &InteropValue,
    default: InteropValue,
) -> InteropResult<InteropValue> {
    match resolve(value) {
        InteropValue::Object(obj) => {
            if !obj.has_hash_entries() {
                return unsupported();
            }
            if obj.is_hash_entry_readable(key) {
                match obj.read_hash_value(key) {
                    Err(InteropError::Interop(InteropException::UnknownKey { .. })) => Ok(default),
                    other => other,
                }
            } else {
                Ok(default)
            }
        }
        _ => unsupported(),
    }
}

/// Map `key` to `new_value`
pub fn write_hash_entry(value: &InteropValue, key: InteropValue, new_value: InteropValue) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.write_hash_entry(key, new_value),
        _ => unsupported(),
    }
}

/// Remove the mapping for `key`
pub fn remove_hash_entry(value: &InteropValue, key: &InteropValue) -> InteropResult<()> {
    match resolve(value) {
        InteropValue::Object(obj) => obj.remove_hash_entry(key),
        _ => unsupported(),
    }
}
