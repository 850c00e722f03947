//! InteropObject trait - the capability table of a foreign object
//!
//! A runtime that wants its objects to be usable from the guest implements
//! this trait once per object representation. Every message has a default
//! that declines: capability queries return `false`, operations fail with
//! `UnsupportedMessage`. Implementors override only the families they
//! support.
//!
//! Callers should not invoke these methods directly; the free functions in
//! [`crate::library`] add the primitive fast paths, delegate resolution and
//! the derived defaults (`read_hash_value_or_default`, fixed-width buffer
//! access, identity negotiation).

use std::any::Any;
use std::fmt;

use crate::error::{InteropError, InteropException, InteropResult};
use crate::types::{ExceptionType, TriState};
use crate::value::InteropValue;

#[inline]
fn unsupported<T>() -> InteropResult<T> {
    Err(InteropError::Interop(InteropException::unsupported()))
}

/// Capability table for one object representation.
///
/// # Thread Safety
///
/// Objects are shared across interpreter threads behind `Arc`. Messages that
/// mutate (writes, removals, buffer stores, iterator advancement) must use
/// interior mutability. No message is required to be atomic with respect to
/// another.
pub trait InteropObject: Send + Sync + fmt::Debug {
    /// Concrete type access, used to recognize objects this runtime owns
    fn as_any(&self) -> &dyn Any;

    /// If this object only forwards messages to another value, that value.
    ///
    /// The dispatcher resolves delegates before sending any message, so a
    /// forwarding wrapper does not have to re-implement the table.
    fn delegate(&self) -> Option<InteropValue> {
        None
    }

    // ========================================================================
    // Null, Boolean, String
    // ========================================================================

    /// Whether this represents a null-like value
    fn is_null(&self) -> bool {
        false
    }

    /// Whether this represents a boolean
    fn is_boolean(&self) -> bool {
        false
    }

    /// The boolean value
    fn as_boolean(&self) -> InteropResult<bool> {
        unsupported()
    }

    /// Whether this represents a string
    fn is_string(&self) -> bool {
        false
    }

    /// The string value
    fn as_string(&self) -> InteropResult<String> {
        unsupported()
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    /// Whether this represents a number
    fn is_number(&self) -> bool {
        false
    }

    /// Whether the number fits in an i8 without loss
    fn fits_in_byte(&self) -> bool {
        false
    }

    /// Whether the number fits in an i16 without loss
    fn fits_in_short(&self) -> bool {
        false
    }

    /// Whether the number fits in an i32 without loss
    fn fits_in_int(&self) -> bool {
        false
    }

    /// Whether the number fits in an i64 without loss
    fn fits_in_long(&self) -> bool {
        false
    }

    /// Whether the number fits in an f32 without loss
    fn fits_in_float(&self) -> bool {
        false
    }

    /// Whether the number fits in an f64 without loss
    fn fits_in_double(&self) -> bool {
        false
    }

    /// Whether the number is integral (fits in an arbitrary-precision integer)
    fn fits_in_big_integer(&self) -> bool {
        false
    }

    /// Exact i8 value
    fn as_byte(&self) -> InteropResult<i8> {
        unsupported()
    }

    /// Exact i16 value
    fn as_short(&self) -> InteropResult<i16> {
        unsupported()
    }

    /// Exact i32 value
    fn as_int(&self) -> InteropResult<i32> {
        unsupported()
    }

    /// Exact i64 value
    fn as_long(&self) -> InteropResult<i64> {
        unsupported()
    }

    /// Exact f32 value
    fn as_float(&self) -> InteropResult<f32> {
        unsupported()
    }

    /// Exact f64 value
    fn as_double(&self) -> InteropResult<f64> {
        unsupported()
    }

    /// Exact arbitrary-precision value
    fn as_big_integer(&self) -> InteropResult<num_bigint::BigInt> {
        unsupported()
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// Whether this is an exception value that can be thrown
    fn is_exception(&self) -> bool {
        false
    }

    /// Exception category
    fn get_exception_type(&self) -> InteropResult<ExceptionType> {
        unsupported()
    }

    /// Whether a parse error was caused by incomplete source
    fn is_exception_incomplete_source(&self) -> InteropResult<bool> {
        unsupported()
    }

    /// Exit status of an `Exit` exception
    fn get_exception_exit_status(&self) -> InteropResult<i32> {
        unsupported()
    }

    /// Whether the exception has a cause
    fn has_exception_cause(&self) -> bool {
        false
    }

    /// The cause, itself an exception value
    fn get_exception_cause(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether the exception has a message
    fn has_exception_message(&self) -> bool {
        false
    }

    /// The message, a string value
    fn get_exception_message(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether the exception has a stack trace
    fn has_exception_stack_trace(&self) -> bool {
        false
    }

    /// Stack trace as an array value of frames
    fn get_exception_stack_trace(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    /// Whether this has index-addressed elements
    fn has_array_elements(&self) -> bool {
        false
    }

    /// Number of elements
    fn get_array_size(&self) -> InteropResult<i64> {
        unsupported()
    }

    /// Whether the element at `index` can be read
    fn is_array_element_readable(&self, _index: i64) -> bool {
        false
    }

    /// Whether the existing element at `index` can be replaced
    fn is_array_element_modifiable(&self, _index: i64) -> bool {
        false
    }

    /// Whether a new element can be inserted at `index`
    fn is_array_element_insertable(&self, _index: i64) -> bool {
        false
    }

    /// Whether the element at `index` can be removed
    fn is_array_element_removable(&self, _index: i64) -> bool {
        false
    }

    /// Read the element at `index`
    fn read_array_element(&self, _index: i64) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Write the element at `index`
    fn write_array_element(&self, _index: i64, _value: InteropValue) -> InteropResult<()> {
        unsupported()
    }

    /// Remove the element at `index`, shifting later elements down
    fn remove_array_element(&self, _index: i64) -> InteropResult<()> {
        unsupported()
    }

    // ========================================================================
    // Meta Objects
    // ========================================================================

    /// Whether this value has a meta object (its type)
    fn has_meta_object(&self) -> bool {
        false
    }

    /// The meta object
    fn get_meta_object(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether this value is itself a meta object
    fn is_meta_object(&self) -> bool {
        false
    }

    /// Fully qualified name of this meta object
    fn get_meta_qualified_name(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Simple name of this meta object
    fn get_meta_simple_name(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether `instance` is an instance of this meta object
    fn is_meta_instance(&self, _instance: &InteropValue) -> InteropResult<bool> {
        unsupported()
    }

    /// Human-readable representation
    fn to_display_string(&self, _allow_side_effects: bool) -> InteropValue {
        InteropValue::from(format!("{:?}", self))
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Whether this value has identity semantics
    fn has_identity(&self) -> bool {
        false
    }

    /// Identity comparison with `other`, or `Undefined` to let `other` decide
    fn is_identical_or_undefined(&self, _other: &InteropValue) -> TriState {
        TriState::Undefined
    }

    /// Identity hash, consistent with `is_identical`
    fn identity_hash_code(&self) -> InteropResult<i32> {
        unsupported()
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Whether this has string-keyed members
    fn has_members(&self) -> bool {
        false
    }

    /// Member names as an array value of strings
    fn get_members(&self, _include_internal: bool) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether `member` exists and can be read
    fn is_member_readable(&self, _member: &str) -> bool {
        false
    }

    /// Whether `member` exists and can be written
    fn is_member_modifiable(&self, _member: &str) -> bool {
        false
    }

    /// Whether `member` does not exist and can be created
    fn is_member_insertable(&self, _member: &str) -> bool {
        false
    }

    /// Whether `member` can be removed
    fn is_member_removable(&self, _member: &str) -> bool {
        false
    }

    /// Whether `member` can be invoked
    fn is_member_invocable(&self, _member: &str) -> bool {
        false
    }

    /// Whether `member` is internal (hidden from `get_members(false)`)
    fn is_member_internal(&self, _member: &str) -> bool {
        false
    }

    /// Whether reading `member` may have side effects
    fn has_member_read_side_effects(&self, _member: &str) -> bool {
        false
    }

    /// Whether writing `member` may have side effects
    fn has_member_write_side_effects(&self, _member: &str) -> bool {
        false
    }

    /// Read a member
    fn read_member(&self, _member: &str) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Write a member
    fn write_member(&self, _member: &str, _value: InteropValue) -> InteropResult<()> {
        unsupported()
    }

    /// Remove a member
    fn remove_member(&self, _member: &str) -> InteropResult<()> {
        unsupported()
    }

    /// Invoke a member with arguments
    fn invoke_member(&self, _member: &str, _args: &[InteropValue]) -> InteropResult<InteropValue> {
        unsupported()
    }

    // ========================================================================
    // Pointers
    // ========================================================================

    /// Whether this value is a native pointer
    fn is_pointer(&self) -> bool {
        false
    }

    /// Native address
    fn as_pointer(&self) -> InteropResult<i64> {
        unsupported()
    }

    /// Ask the value to move to native memory; a hint, may do nothing
    fn to_native(&self) {}

    // ========================================================================
    // Executables
    // ========================================================================

    /// Whether this value can be executed
    fn is_executable(&self) -> bool {
        false
    }

    /// Execute with arguments
    fn execute(&self, _args: &[InteropValue]) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether this value can be instantiated
    fn is_instantiable(&self) -> bool {
        false
    }

    /// Create an instance with constructor arguments
    fn instantiate(&self, _args: &[InteropValue]) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether this executable has a name
    fn has_executable_name(&self) -> bool {
        false
    }

    /// Executable name as a string value
    fn get_executable_name(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether this executable has a declaring meta object
    fn has_declaring_meta_object(&self) -> bool {
        false
    }

    /// Declaring meta object
    fn get_declaring_meta_object(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    /// Whether this is a byte-addressable buffer
    fn has_buffer_elements(&self) -> bool {
        false
    }

    /// Whether the buffer accepts writes
    fn is_buffer_writable(&self) -> InteropResult<bool> {
        unsupported()
    }

    /// Buffer size in bytes
    fn get_buffer_size(&self) -> InteropResult<i64> {
        unsupported()
    }

    /// Copy `dst.len()` bytes starting at `offset` into `dst`.
    ///
    /// Fails with `InvalidBufferOffset { offset, length: dst.len() }` if any
    /// byte lies outside the buffer.
    fn read_buffer(&self, _offset: i64, _dst: &mut [u8]) -> InteropResult<()> {
        unsupported()
    }

    /// Copy `src` into the buffer starting at `offset`.
    ///
    /// Fails with `UnsupportedMessage` if the buffer is not writable and
    /// with `InvalidBufferOffset` if any byte lies outside the buffer.
    fn write_buffer(&self, _offset: i64, _src: &[u8]) -> InteropResult<()> {
        unsupported()
    }

    // ========================================================================
    // Iterators
    // ========================================================================

    /// Whether this value can produce an iterator
    fn has_iterator(&self) -> bool {
        false
    }

    /// A fresh iterator over this value
    fn get_iterator(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Whether this value is an iterator
    fn is_iterator(&self) -> bool {
        false
    }

    /// Whether the iterator has another element
    fn has_iterator_next_element(&self) -> InteropResult<bool> {
        unsupported()
    }

    /// Advance the iterator; `StopIteration` when exhausted
    fn get_iterator_next_element(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    // ========================================================================
    // Hash Entries
    // ========================================================================

    /// Whether this value maps arbitrary keys to values
    fn has_hash_entries(&self) -> bool {
        false
    }

    /// Number of entries
    fn get_hash_size(&self) -> InteropResult<i64> {
        unsupported()
    }

    /// Whether `key` is mapped and readable
    fn is_hash_entry_readable(&self, _key: &InteropValue) -> bool {
        false
    }

    /// Whether `key` is mapped and its value can be replaced
    fn is_hash_entry_modifiable(&self, _key: &InteropValue) -> bool {
        false
    }

    /// Whether `key` is not mapped and can be added
    fn is_hash_entry_insertable(&self, _key: &InteropValue) -> bool {
        false
    }

    /// Whether `key` can be removed
    fn is_hash_entry_removable(&self, _key: &InteropValue) -> bool {
        false
    }

    /// Whether `key` can be written (modified or inserted)
    fn is_hash_entry_writable(&self, key: &InteropValue) -> bool {
        self.is_hash_entry_modifiable(key) || self.is_hash_entry_insertable(key)
    }

    /// Whether `key` is mapped at all
    fn is_hash_entry_existing(&self, key: &InteropValue) -> bool {
        self.is_hash_entry_readable(key)
            || self.is_hash_entry_modifiable(key)
            || self.is_hash_entry_removable(key)
    }

    /// Value mapped to `key`; `UnknownKey` if absent
    fn read_hash_value(&self, _key: &InteropValue) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Map `key` to `value`
    fn write_hash_entry(&self, _key: InteropValue, _value: InteropValue) -> InteropResult<()> {
        unsupported()
    }

    /// Remove the mapping for `key`; `UnknownKey` if absent
    fn remove_hash_entry(&self, _key: &InteropValue) -> InteropResult<()> {
        unsupported()
    }

    /// Iterator over `[key, value]` pairs
    fn get_hash_entries_iterator(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Iterator over keys
    fn get_hash_keys_iterator(&self) -> InteropResult<InteropValue> {
        unsupported()
    }

    /// Iterator over values
    fn get_hash_values_iterator(&self) -> InteropResult<InteropValue> {
        unsupported()
    }
}
