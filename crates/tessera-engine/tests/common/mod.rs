//! Foreign objects shared by the integration tests
//!
//! Each fixture implements one family of the capability table the way a
//! foreign runtime would, over plain interop values.

#![allow(dead_code)]

use std::any::Any;
use std::collections::VecDeque;

use parking_lot::{Mutex, RwLock};
use tessera_engine::tessera_sdk::{
    library, ExceptionType, InteropError, InteropException, InteropObject, InteropResult, InteropValue,
};
use tessera_engine::{names, GuestRef, InteropContext};

/// Wrap a foreign value the way the guest receives it
pub fn foreign(ctx: &InteropContext, value: InteropValue) -> GuestRef {
    ctx.meta().create_foreign(value, names().object)
}

/// Keys compare by string contents when both are strings, else by value
fn same_key(a: &InteropValue, b: &InteropValue) -> bool {
    match (library::as_string(a), library::as_string(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => a.same_value(b),
    }
}

fn in_bounds(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}

// ============================================================================
// Arrays
// ============================================================================

/// A fixed-size foreign array
#[derive(Debug)]
pub struct ForeignArray {
    items: RwLock<Vec<InteropValue>>,
}

impl ForeignArray {
    pub fn new(items: Vec<InteropValue>) -> InteropValue {
        InteropValue::object(ForeignArray {
            items: RwLock::new(items),
        })
    }

    pub fn ints(values: &[i32]) -> InteropValue {
        Self::new(values.iter().map(|&v| InteropValue::Int(v)).collect())
    }
}

impl InteropObject for ForeignArray {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn has_array_elements(&self) -> bool {
        true
    }

    fn get_array_size(&self) -> InteropResult<i64> {
        Ok(self.items.read().len() as i64)
    }

    fn is_array_element_readable(&self, index: i64) -> bool {
        in_bounds(index, self.items.read().len()).is_some()
    }

    fn is_array_element_modifiable(&self, index: i64) -> bool {
        self.is_array_element_readable(index)
    }

    fn read_array_element(&self, index: i64) -> InteropResult<InteropValue> {
        let items = self.items.read();
        let i = in_bounds(index, items.len()).ok_or(InteropException::invalid_index(index))?;
        Ok(items[i].clone())
    }

    fn write_array_element(&self, index: i64, value: InteropValue) -> InteropResult<()> {
        let mut items = self.items.write();
        let i = in_bounds(index, items.len()).ok_or(InteropException::invalid_index(index))?;
        items[i] = value;
        Ok(())
    }
}

// ============================================================================
// Hash maps
// ============================================================================

/// An insertion-ordered foreign map
#[derive(Debug, Default)]
pub struct ForeignMap {
    entries: RwLock<Vec<(InteropValue, InteropValue)>>,
}

impl ForeignMap {
    pub fn new(entries: Vec<(InteropValue, InteropValue)>) -> InteropValue {
        InteropValue::object(ForeignMap {
            entries: RwLock::new(entries),
        })
    }

    fn position(&self, key: &InteropValue) -> Option<usize> {
        self.entries.read().iter().position(|(k, _)| same_key(k, key))
    }
}

impl InteropObject for ForeignMap {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn has_hash_entries(&self) -> bool {
        true
    }

    fn get_hash_size(&self) -> InteropResult<i64> {
        Ok(self.entries.read().len() as i64)
    }

    fn is_hash_entry_readable(&self, key: &InteropValue) -> bool {
        self.position(key).is_some()
    }

    fn is_hash_entry_modifiable(&self, key: &InteropValue) -> bool {
        self.position(key).is_some()
    }

    fn is_hash_entry_insertable(&self, key: &InteropValue) -> bool {
        self.position(key).is_none()
    }

    fn is_hash_entry_removable(&self, key: &InteropValue) -> bool {
        self.position(key).is_some()
    }

    fn read_hash_value(&self, key: &InteropValue) -> InteropResult<InteropValue> {
        match self.position(key) {
            Some(i) => Ok(self.entries.read()[i].1.clone()),
            None => Err(InteropException::unknown_key(key.clone()).into()),
        }
    }

    fn write_hash_entry(&self, key: InteropValue, value: InteropValue) -> InteropResult<()> {
        match self.position(&key) {
            Some(i) => self.entries.write()[i].1 = value,
            None => self.entries.write().push((key, value)),
        }
        Ok(())
    }

    fn remove_hash_entry(&self, key: &InteropValue) -> InteropResult<()> {
        match self.position(key) {
            Some(i) => {
                self.entries.write().remove(i);
                Ok(())
            }
            None => Err(InteropException::unknown_key(key.clone()).into()),
        }
    }

    fn get_hash_keys_iterator(&self) -> InteropResult<InteropValue> {
        Ok(ForeignIterator::new(self.entries.read().iter().map(|(k, _)| k.clone()).collect()))
    }

    fn get_hash_values_iterator(&self) -> InteropResult<InteropValue> {
        Ok(ForeignIterator::new(self.entries.read().iter().map(|(_, v)| v.clone()).collect()))
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// A one-shot foreign iterator
#[derive(Debug)]
pub struct ForeignIterator {
    rest: Mutex<VecDeque<InteropValue>>,
}

impl ForeignIterator {
    pub fn new(items: Vec<InteropValue>) -> InteropValue {
        InteropValue::object(ForeignIterator {
            rest: Mutex::new(items.into()),
        })
    }
}

impl InteropObject for ForeignIterator {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_iterator(&self) -> bool {
        true
    }

    fn has_iterator_next_element(&self) -> InteropResult<bool> {
        Ok(!self.rest.lock().is_empty())
    }

    fn get_iterator_next_element(&self) -> InteropResult<InteropValue> {
        self.rest
            .lock()
            .pop_front()
            .ok_or_else(|| InteropException::stop_iteration().into())
    }
}

// ============================================================================
// Buffers
// ============================================================================

/// A writable foreign byte buffer
#[derive(Debug)]
pub struct ForeignBuffer {
    bytes: RwLock<Vec<u8>>,
}

impl ForeignBuffer {
    pub fn zeroed(len: usize) -> InteropValue {
        InteropValue::object(ForeignBuffer {
            bytes: RwLock::new(vec![0; len]),
        })
    }

    fn range(&self, offset: i64, len: usize) -> InteropResult<std::ops::Range<usize>> {
        let size = self.bytes.read().len();
        usize::try_from(offset)
            .ok()
            .filter(|&o| o + len <= size)
            .map(|o| o..o + len)
            .ok_or_else(|| InteropException::invalid_offset(offset, len as i64).into())
    }
}

impl InteropObject for ForeignBuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn has_buffer_elements(&self) -> bool {
        true
    }

    fn is_buffer_writable(&self) -> InteropResult<bool> {
        Ok(true)
    }

    fn get_buffer_size(&self) -> InteropResult<i64> {
        Ok(self.bytes.read().len() as i64)
    }

    fn read_buffer(&self, offset: i64, dst: &mut [u8]) -> InteropResult<()> {
        let range = self.range(offset, dst.len())?;
        dst.copy_from_slice(&self.bytes.read()[range]);
        Ok(())
    }

    fn write_buffer(&self, offset: i64, src: &[u8]) -> InteropResult<()> {
        let range = self.range(offset, src.len())?;
        self.bytes.write()[range].copy_from_slice(src);
        Ok(())
    }
}

// ============================================================================
// Members
// ============================================================================

/// A foreign object with one readable field `x` and a method `add(a, b)`
#[derive(Debug)]
pub struct Point {
    x: RwLock<i32>,
}

impl Point {
    pub fn new(x: i32) -> InteropValue {
        InteropValue::object(Point { x: RwLock::new(x) })
    }
}

impl InteropObject for Point {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn has_members(&self) -> bool {
        true
    }

    fn is_member_readable(&self, member: &str) -> bool {
        member == "x"
    }

    fn is_member_modifiable(&self, member: &str) -> bool {
        member == "x"
    }

    fn is_member_invocable(&self, member: &str) -> bool {
        member == "add"
    }

    fn read_member(&self, member: &str) -> InteropResult<InteropValue> {
        match member {
            "x" => Ok(InteropValue::Int(*self.x.read())),
            _ => Err(InteropException::unknown_identifier(member).into()),
        }
    }

    fn write_member(&self, member: &str, value: InteropValue) -> InteropResult<()> {
        if member != "x" {
            return Err(InteropException::unknown_identifier(member).into());
        }
        let v = library::as_int(&value)
            .map_err(|_| InteropException::unsupported_type(vec![value], "x is an int"))?;
        *self.x.write() = v;
        Ok(())
    }

    fn invoke_member(&self, member: &str, args: &[InteropValue]) -> InteropResult<InteropValue> {
        if member != "add" {
            return Err(InteropException::unknown_identifier(member).into());
        }
        if args.len() != 2 {
            return Err(InteropException::arity(2, 2, args.len() as i32).into());
        }
        let (a, b) = (library::as_int(&args[0])?, library::as_int(&args[1])?);
        Ok(InteropValue::Int(a + b))
    }
}

// ============================================================================
// Exceptions
// ============================================================================

/// A foreign meta object that only knows its name
#[derive(Debug)]
pub struct ForeignType {
    name: String,
}

impl InteropObject for ForeignType {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_meta_object(&self) -> bool {
        true
    }

    fn get_meta_qualified_name(&self) -> InteropResult<InteropValue> {
        Ok(InteropValue::string(self.name.as_str()))
    }

    fn get_meta_simple_name(&self) -> InteropResult<InteropValue> {
        let simple = self.name.rsplit('.').next().unwrap_or(&self.name);
        Ok(InteropValue::string(simple))
    }
}

/// An exception raised by a foreign runtime
#[derive(Debug)]
pub struct ForeignError {
    type_name: String,
    message: String,
}

impl ForeignError {
    pub fn new(type_name: &str, message: &str) -> InteropValue {
        InteropValue::object(ForeignError {
            type_name: type_name.to_string(),
            message: message.to_string(),
        })
    }
}

impl InteropObject for ForeignError {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_exception(&self) -> bool {
        true
    }

    fn get_exception_type(&self) -> InteropResult<ExceptionType> {
        Ok(ExceptionType::RuntimeError)
    }

    fn has_exception_message(&self) -> bool {
        true
    }

    fn get_exception_message(&self) -> InteropResult<InteropValue> {
        Ok(InteropValue::string(self.message.as_str()))
    }

    fn has_meta_object(&self) -> bool {
        true
    }

    fn get_meta_object(&self) -> InteropResult<InteropValue> {
        Ok(InteropValue::object(ForeignType {
            name: self.type_name.clone(),
        }))
    }
}

/// A foreign exception whose type cannot be asked for
#[derive(Debug)]
pub struct OpaqueError;

impl InteropObject for OpaqueError {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_exception(&self) -> bool {
        true
    }
}

/// A foreign function that always throws `error`
#[derive(Debug)]
pub struct Thrower {
    error: InteropValue,
}

impl Thrower {
    pub fn new(error: InteropValue) -> InteropValue {
        InteropValue::object(Thrower { error })
    }
}

impl InteropObject for Thrower {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_executable(&self) -> bool {
        true
    }

    fn execute(&self, _args: &[InteropValue]) -> InteropResult<InteropValue> {
        Err(InteropError::Thrown(self.error.clone()))
    }
}
