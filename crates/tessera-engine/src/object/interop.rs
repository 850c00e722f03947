//! Capability table of guest objects
//!
//! Lets guest objects be passed to other runtimes as interop values. What an
//! object answers depends on its shape: strings and boxes behave like the
//! matching primitives, arrays and lists have array elements, `byte[]` is
//! also a buffer, maps have hash entries, and so on. Foreign wrappers only
//! forward to their raw handle.
//!
//! Objects created here (iterators, name arrays, stack traces) are allocated
//! directly without a backtrace.

use std::any::Any;
use std::collections::VecDeque;

use num_bigint::BigInt;
use parking_lot::RwLock;
use tessera_sdk::{
    number, ExceptionType, InteropError, InteropException, InteropObject, InteropResult, InteropValue, TriState,
};

use crate::meta::{names, DirectHeap};
use crate::object::convert::{coerce, key_form, preserve, preserve_value, to_guest, unboxed};
use crate::object::{class_mirror, ArrayData, GuestRef, GuestValue, NativeData, Repr};
use crate::symbol::Symbol;

#[inline]
fn unsupported<T>() -> InteropResult<T> {
    Err(InteropError::unsupported())
}

fn dotted(name: Symbol) -> String {
    name.as_str().replace('/', ".")
}

/// Elements `0..len` are addressable
fn in_bounds(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}

/// Whether two hash keys denote the same entry.
///
/// Guest objects compare by reference unless they unbox to a primitive or a
/// string, which compare by value.
fn same_key(a: &InteropValue, b: &InteropValue) -> bool {
    let (ka, kb) = (key_form(a), key_form(b));
    match (ka.downcast_ref::<GuestRef>(), kb.downcast_ref::<GuestRef>()) {
        (Some(x), Some(y)) => x.ptr_eq(y),
        _ => ka.same_value(&kb),
    }
}

fn guest_string(s: &str) -> GuestRef {
    GuestRef::native(names().string, NativeData::String(s.into()))
}

fn string_array(items: impl IntoIterator<Item = String>) -> InteropValue {
    let elements = items
        .into_iter()
        .map(|s| GuestValue::Ref(guest_string(&s)))
        .collect();
    let array = GuestRef::native(
        names().string_array,
        NativeData::Array(ArrayData::new(Symbol::intern("Ljava/lang/String;"), elements)),
    );
    preserve(&array)
}

fn iterator_over(items: impl IntoIterator<Item = GuestValue>) -> InteropValue {
    let rest: VecDeque<GuestValue> = items.into_iter().collect();
    preserve(&GuestRef::native(names().iterator, NativeData::Iterator(RwLock::new(rest))))
}

fn pair(key: &GuestValue, value: &GuestValue) -> GuestValue {
    let array = GuestRef::native(
        names().object_array,
        NativeData::Array(ArrayData::new(
            Symbol::intern("Ljava/lang/Object;"),
            vec![key.clone(), value.clone()],
        )),
    );
    GuestValue::Ref(array)
}

impl GuestRef {
    fn data(&self) -> Option<&NativeData> {
        self.native_data()
    }

    fn number_value(&self) -> Option<InteropValue> {
        self.data().and_then(unboxed).filter(number::is_number)
    }

    fn with_array<T>(&self, f: impl FnOnce(&RwLock<Vec<GuestValue>>, bool) -> T) -> Option<T> {
        match self.data()? {
            NativeData::Array(a) => Some(f(a.elements(), false)),
            NativeData::List(items) => Some(f(items, true)),
            _ => None,
        }
    }

    fn byte_array(&self) -> Option<&ArrayData> {
        match self.data()? {
            NativeData::Array(a) if a.is_byte_array() => Some(a),
            _ => None,
        }
    }

    fn fields(&self) -> Option<&RwLock<Vec<(Symbol, GuestValue)>>> {
        match self.data()? {
            NativeData::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    fn field_value(&self, member: &str) -> Option<GuestValue> {
        let name = Symbol::intern(member);
        if let Some(fields) = self.fields() {
            return fields.read().iter().find(|(k, _)| *k == name).map(|(_, v)| v.clone());
        }
        self.exception_data()?.field(member).cloned()
    }

    fn function_field(&self, member: &str) -> Option<GuestRef> {
        match self.field_value(member)? {
            GuestValue::Ref(r) if matches!(r.data(), Some(NativeData::Function(_))) => Some(r),
            _ => None,
        }
    }

    fn map_entries(&self) -> Option<&RwLock<Vec<(GuestValue, GuestValue)>>> {
        match self.data()? {
            NativeData::Map(entries) => Some(entries),
            _ => None,
        }
    }

    fn map_index(&self, key: &InteropValue) -> Option<usize> {
        let entries = self.map_entries()?.read();
        entries.iter().position(|(k, _)| same_key(&preserve_value(k), key))
    }

    fn buffer_range(&self, offset: i64, length: usize) -> InteropResult<(&ArrayData, usize)> {
        let Some(array) = self.byte_array() else {
            return unsupported();
        };
        let size = array.len();
        let start = usize::try_from(offset).ok().filter(|&o| o.checked_add(length).is_some_and(|end| end <= size));
        match start {
            Some(start) => Ok((array, start)),
            None => Err(InteropException::invalid_offset(offset, length as i64).into()),
        }
    }
}

impl InteropObject for GuestRef {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn delegate(&self) -> Option<InteropValue> {
        self.raw_foreign().cloned()
    }

    fn is_null(&self) -> bool {
        GuestRef::is_null(self)
    }

    // ========================================================================
    // Boolean, String
    // ========================================================================

    fn is_boolean(&self) -> bool {
        matches!(self.data(), Some(NativeData::Boxed(GuestValue::Boolean(_))))
    }

    fn as_boolean(&self) -> InteropResult<bool> {
        match self.data() {
            Some(NativeData::Boxed(GuestValue::Boolean(b))) => Ok(*b),
            _ => unsupported(),
        }
    }

    fn is_string(&self) -> bool {
        matches!(
            self.data(),
            Some(NativeData::String(_) | NativeData::Boxed(GuestValue::Char(_)))
        )
    }

    fn as_string(&self) -> InteropResult<String> {
        match self.data() {
            Some(NativeData::String(s)) => Ok(s.to_string()),
            Some(NativeData::Boxed(GuestValue::Char(c))) => Ok(String::from_utf16_lossy(&[*c])),
            _ => unsupported(),
        }
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    fn is_number(&self) -> bool {
        self.number_value().is_some()
    }

    fn fits_in_byte(&self) -> bool {
        self.number_value().is_some_and(|n| number::fits_in_byte(&n))
    }

    fn fits_in_short(&self) -> bool {
        self.number_value().is_some_and(|n| number::fits_in_short(&n))
    }

    fn fits_in_int(&self) -> bool {
        self.number_value().is_some_and(|n| number::fits_in_int(&n))
    }

    fn fits_in_long(&self) -> bool {
        self.number_value().is_some_and(|n| number::fits_in_long(&n))
    }

    fn fits_in_float(&self) -> bool {
        self.number_value().is_some_and(|n| number::fits_in_float(&n))
    }

    fn fits_in_double(&self) -> bool {
        self.number_value().is_some_and(|n| number::fits_in_double(&n))
    }

    fn fits_in_big_integer(&self) -> bool {
        self.number_value().is_some_and(|n| number::fits_in_big_integer(&n))
    }

    fn as_byte(&self) -> InteropResult<i8> {
        self.number_value().and_then(|n| number::as_byte(&n)).ok_or_else(InteropError::unsupported)
    }

    fn as_short(&self) -> InteropResult<i16> {
        self.number_value().and_then(|n| number::as_short(&n)).ok_or_else(InteropError::unsupported)
    }

    fn as_int(&self) -> InteropResult<i32> {
        self.number_value().and_then(|n| number::as_int(&n)).ok_or_else(InteropError::unsupported)
    }

    fn as_long(&self) -> InteropResult<i64> {
        self.number_value().and_then(|n| number::as_long(&n)).ok_or_else(InteropError::unsupported)
    }

    fn as_float(&self) -> InteropResult<f32> {
        self.number_value().and_then(|n| number::as_float(&n)).ok_or_else(InteropError::unsupported)
    }

    fn as_double(&self) -> InteropResult<f64> {
        self.number_value().and_then(|n| number::as_double(&n)).ok_or_else(InteropError::unsupported)
    }

    fn as_big_integer(&self) -> InteropResult<BigInt> {
        self.number_value()
            .and_then(|n| number::as_big_integer(&n))
            .ok_or_else(InteropError::unsupported)
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    fn is_exception(&self) -> bool {
        self.exception_data().is_some()
    }

    fn get_exception_type(&self) -> InteropResult<ExceptionType> {
        match self.exception_data() {
            Some(_) => Ok(ExceptionType::RuntimeError),
            None => unsupported(),
        }
    }

    fn has_exception_cause(&self) -> bool {
        self.exception_data().is_some_and(|e| !e.cause().is_null())
    }

    fn get_exception_cause(&self) -> InteropResult<InteropValue> {
        match self.exception_data().map(|e| e.cause()) {
            Some(cause) if !cause.is_null() => Ok(preserve(&cause)),
            _ => unsupported(),
        }
    }

    fn has_exception_message(&self) -> bool {
        self.exception_data().is_some_and(|e| e.message().is_some())
    }

    fn get_exception_message(&self) -> InteropResult<InteropValue> {
        match self.exception_data().and_then(|e| e.message()) {
            Some(message) => Ok(preserve(&guest_string(message))),
            None => unsupported(),
        }
    }

    fn has_exception_stack_trace(&self) -> bool {
        self.exception_data().is_some_and(|e| e.throwable().backtrace().is_some())
    }

    fn get_exception_stack_trace(&self) -> InteropResult<InteropValue> {
        match self.exception_data().and_then(|e| e.throwable().backtrace()) {
            Some(frames) => Ok(string_array(frames.iter().map(ToString::to_string))),
            None => unsupported(),
        }
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    fn has_array_elements(&self) -> bool {
        self.with_array(|_, _| ()).is_some()
    }

    fn get_array_size(&self) -> InteropResult<i64> {
        self.with_array(|items, _| items.read().len() as i64)
            .ok_or_else(InteropError::unsupported)
    }

    fn is_array_element_readable(&self, index: i64) -> bool {
        self.with_array(|items, _| in_bounds(index, items.read().len()).is_some())
            .unwrap_or(false)
    }

    fn is_array_element_modifiable(&self, index: i64) -> bool {
        self.is_array_element_readable(index)
    }

    fn is_array_element_insertable(&self, index: i64) -> bool {
        self.with_array(|items, growable| growable && index == items.read().len() as i64)
            .unwrap_or(false)
    }

    fn is_array_element_removable(&self, index: i64) -> bool {
        self.with_array(|items, growable| growable && in_bounds(index, items.read().len()).is_some())
            .unwrap_or(false)
    }

    fn read_array_element(&self, index: i64) -> InteropResult<InteropValue> {
        let read = self.with_array(|items, _| {
            let items = items.read();
            in_bounds(index, items.len()).map(|i| preserve_value(&items[i]))
        });
        match read {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(InteropException::invalid_index(index).into()),
            None => unsupported(),
        }
    }

    fn write_array_element(&self, index: i64, value: InteropValue) -> InteropResult<()> {
        match self.data() {
            Some(NativeData::Array(array)) => {
                let mut items = array.elements().write();
                let i = in_bounds(index, items.len()).ok_or(InteropException::invalid_index(index))?;
                items[i] = coerce(&DirectHeap, array.component().as_str(), value)?;
                Ok(())
            }
            Some(NativeData::List(items)) => {
                let slot = to_guest(&DirectHeap, value);
                let mut items = items.write();
                if index == items.len() as i64 {
                    items.push(slot);
                    return Ok(());
                }
                let i = in_bounds(index, items.len()).ok_or(InteropException::invalid_index(index))?;
                items[i] = slot;
                Ok(())
            }
            _ => unsupported(),
        }
    }

    fn remove_array_element(&self, index: i64) -> InteropResult<()> {
        match self.data() {
            Some(NativeData::List(items)) => {
                let mut items = items.write();
                let i = in_bounds(index, items.len()).ok_or(InteropException::invalid_index(index))?;
                items.remove(i);
                Ok(())
            }
            _ => unsupported(),
        }
    }

    // ========================================================================
    // Meta Objects
    // ========================================================================

    fn has_meta_object(&self) -> bool {
        matches!(self.object().map(|o| o.repr()), Some(Repr::Native { .. }))
    }

    fn get_meta_object(&self) -> InteropResult<InteropValue> {
        match self.object().map(|o| o.repr()) {
            Some(Repr::Native { klass, .. }) => Ok(preserve(&class_mirror(*klass))),
            _ => unsupported(),
        }
    }

    fn is_meta_object(&self) -> bool {
        matches!(self.data(), Some(NativeData::Class(_)))
    }

    fn get_meta_qualified_name(&self) -> InteropResult<InteropValue> {
        match self.data() {
            Some(NativeData::Class(name)) => Ok(preserve(&guest_string(&dotted(*name)))),
            _ => unsupported(),
        }
    }

    fn get_meta_simple_name(&self) -> InteropResult<InteropValue> {
        match self.data() {
            Some(NativeData::Class(name)) => {
                let simple = name.as_str().rsplit('/').next().unwrap_or_default();
                Ok(preserve(&guest_string(simple)))
            }
            _ => unsupported(),
        }
    }

    fn is_meta_instance(&self, instance: &InteropValue) -> InteropResult<bool> {
        let Some(NativeData::Class(name)) = self.data() else {
            return unsupported();
        };
        let Some(r) = instance.downcast_ref::<GuestRef>() else {
            return Ok(false);
        };
        Ok(match r.klass() {
            Some(_) if *name == names().object => true,
            Some(klass) => klass == *name,
            None => false,
        })
    }

    fn to_display_string(&self, _allow_side_effects: bool) -> InteropValue {
        let Some(obj) = self.object() else {
            return InteropValue::from("null");
        };
        let klass = match obj.repr() {
            Repr::Native { klass, .. } => *klass,
            Repr::Foreign { raw, .. } => return tessera_sdk::library::to_display_string(raw, false),
        };
        let text = match self.data() {
            Some(NativeData::String(s)) => return InteropValue::String(s.clone()),
            Some(data @ (NativeData::Boxed(_) | NativeData::BigInteger(_))) => {
                return tessera_sdk::library::to_display_string(&unboxed(data).unwrap_or_default(), false);
            }
            Some(NativeData::Class(name)) => format!("class {}", dotted(*name)),
            Some(NativeData::Constant(name)) => name.to_string(),
            Some(NativeData::Exception(e)) => match e.message() {
                Some(message) => format!("{}: {}", dotted(klass), message),
                None => dotted(klass),
            },
            _ => format!("{}@{:x}", dotted(klass), obj.identity_hash()),
        };
        InteropValue::from(text)
    }

    // ========================================================================
    // Identity
    // ========================================================================

    fn has_identity(&self) -> bool {
        !GuestRef::is_null(self)
    }

    fn is_identical_or_undefined(&self, other: &InteropValue) -> TriState {
        match other.downcast_ref::<GuestRef>() {
            Some(r) => TriState::from(self.ptr_eq(r)),
            None => TriState::Undefined,
        }
    }

    fn identity_hash_code(&self) -> InteropResult<i32> {
        match self.object() {
            Some(obj) => Ok(obj.identity_hash()),
            None => unsupported(),
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn has_members(&self) -> bool {
        self.fields().is_some()
    }

    fn get_members(&self, _include_internal: bool) -> InteropResult<InteropValue> {
        match self.fields() {
            Some(fields) => Ok(string_array(fields.read().iter().map(|(k, _)| k.to_string()))),
            None => unsupported(),
        }
    }

    fn is_member_readable(&self, member: &str) -> bool {
        self.field_value(member).is_some()
    }

    fn is_member_modifiable(&self, member: &str) -> bool {
        self.fields().is_some() && self.field_value(member).is_some()
    }

    fn is_member_invocable(&self, member: &str) -> bool {
        self.function_field(member).is_some()
    }

    fn read_member(&self, member: &str) -> InteropResult<InteropValue> {
        if self.fields().is_none() && self.exception_data().is_none() {
            return unsupported();
        }
        match self.field_value(member) {
            Some(value) => Ok(preserve_value(&value)),
            None => Err(InteropException::unknown_identifier(member).into()),
        }
    }

    fn write_member(&self, member: &str, value: InteropValue) -> InteropResult<()> {
        let Some(fields) = self.fields() else {
            return unsupported();
        };
        let name = Symbol::intern(member);
        let descriptor = {
            let fields = fields.read();
            match fields.iter().find(|(k, _)| *k == name) {
                Some((_, current)) => current.descriptor(),
                None => return Err(InteropException::unknown_identifier(member).into()),
            }
        };
        let slot = coerce(&DirectHeap, descriptor, value)?;
        if let Some(entry) = fields.write().iter_mut().find(|(k, _)| *k == name) {
            entry.1 = slot;
        }
        Ok(())
    }

    fn invoke_member(&self, member: &str, args: &[InteropValue]) -> InteropResult<InteropValue> {
        if self.fields().is_none() {
            return unsupported();
        }
        match (self.field_value(member), self.function_field(member)) {
            (None, _) => Err(InteropException::unknown_identifier(member).into()),
            (Some(_), None) => unsupported(),
            (Some(_), Some(function)) => function.execute(args),
        }
    }

    // ========================================================================
    // Executables
    // ========================================================================

    fn is_executable(&self) -> bool {
        matches!(self.data(), Some(NativeData::Function(_)))
    }

    fn execute(&self, args: &[InteropValue]) -> InteropResult<InteropValue> {
        let Some(NativeData::Function(function)) = self.data() else {
            return unsupported();
        };
        if !function.accepts(args.len()) {
            let (min, max) = function.arity();
            return Err(InteropException::arity(min, max, args.len() as i32).into());
        }
        let args: Vec<GuestValue> = args.iter().map(|a| to_guest(&DirectHeap, a.clone())).collect();
        match function.call(&args) {
            Ok(result) => Ok(preserve_value(&result)),
            Err(exception) => Err(InteropError::Thrown(preserve(&exception))),
        }
    }

    fn has_executable_name(&self) -> bool {
        self.is_executable()
    }

    fn get_executable_name(&self) -> InteropResult<InteropValue> {
        match self.data() {
            Some(NativeData::Function(function)) => Ok(preserve(&guest_string(function.name().as_str()))),
            _ => unsupported(),
        }
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    fn has_buffer_elements(&self) -> bool {
        self.byte_array().is_some()
    }

    fn is_buffer_writable(&self) -> InteropResult<bool> {
        self.byte_array().map(|_| true).ok_or_else(InteropError::unsupported)
    }

    fn get_buffer_size(&self) -> InteropResult<i64> {
        self.byte_array()
            .map(|a| a.len() as i64)
            .ok_or_else(InteropError::unsupported)
    }

    fn read_buffer(&self, offset: i64, dst: &mut [u8]) -> InteropResult<()> {
        let (array, start) = self.buffer_range(offset, dst.len())?;
        let items = array.elements().read();
        for (byte, slot) in dst.iter_mut().zip(&items[start..]) {
            *byte = match slot {
                GuestValue::Byte(b) => *b as u8,
                _ => 0,
            };
        }
        Ok(())
    }

    fn write_buffer(&self, offset: i64, src: &[u8]) -> InteropResult<()> {
        let (array, start) = self.buffer_range(offset, src.len())?;
        let mut items = array.elements().write();
        for (slot, byte) in items[start..].iter_mut().zip(src) {
            *slot = GuestValue::Byte(*byte as i8);
        }
        Ok(())
    }

    // ========================================================================
    // Iterators
    // ========================================================================

    fn has_iterator(&self) -> bool {
        self.has_array_elements()
    }

    fn get_iterator(&self) -> InteropResult<InteropValue> {
        self.with_array(|items, _| iterator_over(items.read().clone()))
            .ok_or_else(InteropError::unsupported)
    }

    fn is_iterator(&self) -> bool {
        matches!(self.data(), Some(NativeData::Iterator(_)))
    }

    fn has_iterator_next_element(&self) -> InteropResult<bool> {
        match self.data() {
            Some(NativeData::Iterator(rest)) => Ok(!rest.read().is_empty()),
            _ => unsupported(),
        }
    }

    fn get_iterator_next_element(&self) -> InteropResult<InteropValue> {
        let Some(NativeData::Iterator(rest)) = self.data() else {
            return unsupported();
        };
        let next = rest.write().pop_front();
        match next {
            Some(value) => Ok(preserve_value(&value)),
            None => Err(InteropException::stop_iteration().into()),
        }
    }

    // ========================================================================
    // Hash Entries
    // ========================================================================

    fn has_hash_entries(&self) -> bool {
        self.map_entries().is_some()
    }

    fn get_hash_size(&self) -> InteropResult<i64> {
        self.map_entries()
            .map(|entries| entries.read().len() as i64)
            .ok_or_else(InteropError::unsupported)
    }

    fn is_hash_entry_readable(&self, key: &InteropValue) -> bool {
        self.map_index(key).is_some()
    }

    fn is_hash_entry_modifiable(&self, key: &InteropValue) -> bool {
        self.map_index(key).is_some()
    }

    fn is_hash_entry_insertable(&self, key: &InteropValue) -> bool {
        self.map_entries().is_some() && self.map_index(key).is_none()
    }

    fn is_hash_entry_removable(&self, key: &InteropValue) -> bool {
        self.map_index(key).is_some()
    }

    fn read_hash_value(&self, key: &InteropValue) -> InteropResult<InteropValue> {
        let Some(entries) = self.map_entries() else {
            return unsupported();
        };
        let entries = entries.read();
        match entries.iter().find(|(k, _)| same_key(&preserve_value(k), key)) {
            Some((_, value)) => Ok(preserve_value(value)),
            None => Err(InteropException::unknown_key(key.clone()).into()),
        }
    }

    fn write_hash_entry(&self, key: InteropValue, value: InteropValue) -> InteropResult<()> {
        let Some(entries) = self.map_entries() else {
            return unsupported();
        };
        let slot = to_guest(&DirectHeap, value);
        let mut entries = entries.write();
        match entries.iter_mut().find(|(k, _)| same_key(&preserve_value(k), &key)) {
            Some(entry) => entry.1 = slot,
            None => entries.push((to_guest(&DirectHeap, key), slot)),
        }
        Ok(())
    }

    fn remove_hash_entry(&self, key: &InteropValue) -> InteropResult<()> {
        let Some(entries) = self.map_entries() else {
            return unsupported();
        };
        let mut entries = entries.write();
        match entries.iter().position(|(k, _)| same_key(&preserve_value(k), key)) {
            Some(i) => {
                entries.remove(i);
                Ok(())
            }
            None => Err(InteropException::unknown_key(key.clone()).into()),
        }
    }

    fn get_hash_entries_iterator(&self) -> InteropResult<InteropValue> {
        self.map_entries()
            .map(|entries| iterator_over(entries.read().iter().map(|(k, v)| pair(k, v))))
            .ok_or_else(InteropError::unsupported)
    }

    fn get_hash_keys_iterator(&self) -> InteropResult<InteropValue> {
        self.map_entries()
            .map(|entries| iterator_over(entries.read().iter().map(|(k, _)| k.clone())))
            .ok_or_else(InteropError::unsupported)
    }

    fn get_hash_values_iterator(&self) -> InteropResult<InteropValue> {
        self.map_entries()
            .map(|entries| iterator_over(entries.read().iter().map(|(_, v)| v.clone())))
            .ok_or_else(InteropError::unsupported)
    }
}
