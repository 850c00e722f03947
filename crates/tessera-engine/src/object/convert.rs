//! Conversions between guest values and interop values
//!
//! Leaving the guest there are two paths. [`unwrap`] is the full unwrap:
//! a foreign wrapper becomes its raw handle. [`preserve`] is type-preserving:
//! every object, foreign wrappers included, stays a guest object so that a
//! guest receiver gets back exactly what it was given, presented class and
//! all. Messages sent to a preserved foreign wrapper still reach the raw
//! handle through delegate resolution.
//!
//! Entering the guest, [`to_guest`] fills a reference slot (boxing
//! primitives) and [`wrap_result`] turns an interop result into a guest
//! reference, wrapping anything that is not already a guest object as a
//! foreign `java/lang/Object`.

use std::sync::Arc;

use tessera_sdk::{library, InteropException, InteropResult, InteropValue};

use crate::meta::{names, GuestHeap};
use crate::object::{GuestObject, GuestRef, GuestValue, NativeData, Repr};

/// The interop value messages to `receiver` are sent to.
///
/// Foreign wrappers yield the raw handle, native objects yield themselves,
/// null yields interop null.
pub fn unwrap(receiver: &GuestRef) -> InteropValue {
    match receiver.object().map(GuestObject::repr) {
        None => InteropValue::Null,
        Some(Repr::Foreign { raw, .. }) => raw.clone(),
        Some(Repr::Native { .. }) => InteropValue::Object(Arc::new(receiver.clone())),
    }
}

/// The interop value of `r` that keeps guest type information
pub fn preserve(r: &GuestRef) -> InteropValue {
    if r.is_null() {
        InteropValue::Null
    } else {
        InteropValue::Object(Arc::new(r.clone()))
    }
}

fn primitive(value: &GuestValue) -> Option<InteropValue> {
    Some(match *value {
        GuestValue::Void => InteropValue::Null,
        GuestValue::Boolean(b) => InteropValue::Boolean(b),
        GuestValue::Byte(v) => InteropValue::Byte(v),
        GuestValue::Char(c) => InteropValue::from(String::from_utf16_lossy(&[c])),
        GuestValue::Short(v) => InteropValue::Short(v),
        GuestValue::Int(v) => InteropValue::Int(v),
        GuestValue::Long(v) => InteropValue::Long(v),
        GuestValue::Float(v) => InteropValue::Float(v),
        GuestValue::Double(v) => InteropValue::Double(v),
        GuestValue::Ref(_) => return None,
    })
}

/// Full-unwrap conversion of a guest slot
pub fn unwrap_value(value: &GuestValue) -> InteropValue {
    match value {
        GuestValue::Ref(r) => unwrap(r),
        other => primitive(other).unwrap_or_default(),
    }
}

/// Type-preserving conversion of a guest slot
pub fn preserve_value(value: &GuestValue) -> InteropValue {
    match value {
        GuestValue::Ref(r) => preserve(r),
        other => primitive(other).unwrap_or_default(),
    }
}

/// Box a primitive slot; references pass through and `Void` becomes null
pub fn box_primitive(heap: &dyn GuestHeap, value: GuestValue) -> GuestRef {
    let n = names();
    let klass = match value {
        GuestValue::Ref(r) => return r,
        GuestValue::Void => return GuestRef::NULL,
        GuestValue::Boolean(_) => n.boolean,
        GuestValue::Byte(_) => n.byte,
        GuestValue::Char(_) => n.character,
        GuestValue::Short(_) => n.short,
        GuestValue::Int(_) => n.integer,
        GuestValue::Long(_) => n.long,
        GuestValue::Float(_) => n.float,
        GuestValue::Double(_) => n.double,
    };
    heap.allocate(klass, NativeData::Boxed(value))
}

/// A guest reference slot holding `value`
pub fn to_guest(heap: &dyn GuestHeap, value: InteropValue) -> GuestValue {
    let boxed = match value {
        InteropValue::Null => return GuestValue::null(),
        InteropValue::Boolean(b) => GuestValue::Boolean(b),
        InteropValue::Byte(v) => GuestValue::Byte(v),
        InteropValue::Short(v) => GuestValue::Short(v),
        InteropValue::Int(v) => GuestValue::Int(v),
        InteropValue::Long(v) => GuestValue::Long(v),
        InteropValue::Float(v) => GuestValue::Float(v),
        InteropValue::Double(v) => GuestValue::Double(v),
        InteropValue::BigInteger(b) => {
            return GuestValue::Ref(heap.allocate(names().big_integer, NativeData::BigInteger(b)));
        }
        InteropValue::String(s) => {
            return GuestValue::Ref(heap.allocate(names().string, NativeData::String(s)));
        }
        InteropValue::Object(_) => return GuestValue::Ref(wrap_result(heap, value)),
    };
    GuestValue::Ref(box_primitive(heap, boxed))
}

/// The guest reference for an interop result.
///
/// Guest objects come back as they are; interop null is guest null;
/// anything else is wrapped as a foreign `java/lang/Object`.
pub fn wrap_result(heap: &dyn GuestHeap, value: InteropValue) -> GuestRef {
    if value.is_null_variant() {
        return GuestRef::NULL;
    }
    if let Some(r) = value.downcast_ref::<GuestRef>() {
        return r.clone();
    }
    heap.wrap_foreign(value, names().object)
}

/// Convert `value` for a slot of type `descriptor`.
///
/// Primitive slots take only values that convert exactly; reference slots
/// take anything.
pub fn coerce(heap: &dyn GuestHeap, descriptor: &str, value: InteropValue) -> InteropResult<GuestValue> {
    let converted = match descriptor {
        "Z" => library::as_boolean(&value).map(GuestValue::Boolean),
        "B" => library::as_byte(&value).map(GuestValue::Byte),
        "S" => library::as_short(&value).map(GuestValue::Short),
        "I" => library::as_int(&value).map(GuestValue::Int),
        "J" => library::as_long(&value).map(GuestValue::Long),
        "F" => library::as_float(&value).map(GuestValue::Float),
        "D" => library::as_double(&value).map(GuestValue::Double),
        "C" => library::as_string(&value).and_then(|s| {
            let mut units = s.encode_utf16();
            match (units.next(), units.next()) {
                (Some(c), None) => Ok(GuestValue::Char(c)),
                _ => Err(InteropException::unsupported().into()),
            }
        }),
        _ => return Ok(to_guest(heap, value)),
    };
    converted.map_err(|_| {
        let hint = format!("Cannot convert {} to {}", value.type_name(), descriptor);
        InteropException::unsupported_type(vec![value], hint).into()
    })
}

/// Unbox guest strings and boxed primitives, so that keys compare by value
pub(crate) fn key_form(value: &InteropValue) -> InteropValue {
    let Some(r) = value.downcast_ref::<GuestRef>() else {
        return value.clone();
    };
    match r.native_data() {
        Some(NativeData::String(s)) => InteropValue::String(s.clone()),
        Some(NativeData::Boxed(v)) => primitive(v).unwrap_or_default(),
        Some(NativeData::BigInteger(b)) => InteropValue::BigInteger(b.clone()),
        _ => value.clone(),
    }
}

/// Interop form of a boxed primitive or a big integer, for numeric messages
pub(crate) fn unboxed(data: &NativeData) -> Option<InteropValue> {
    match data {
        NativeData::Boxed(v) => primitive(v),
        NativeData::BigInteger(b) => Some(InteropValue::BigInteger(b.clone())),
        _ => None,
    }
}
