//! ExceptionBridge - interop failures into guest exceptions and back
//!
//! Modeled interop exceptions map one-to-one onto the polyglot exception
//! classes, payload included. Arbitrary foreign exceptions are offered to
//! the embedder's type converters first and otherwise travel as
//! `ForeignException` carriers. Translation is best-effort: whenever it
//! cannot complete, the original foreign exception comes back unchanged.

use std::sync::Arc;

use tessera_sdk::{library, InteropError, InteropException, InteropValue};
use tracing::debug;

use crate::exception::{Thrown, TypeMappings};
use crate::meta::{names, Meta};
use crate::object::{preserve, wrap_result, GuestRef, GuestValue};
use crate::symbol::Symbol;

/// Translates exceptions crossing the interop boundary.
#[derive(Debug, Clone)]
pub struct ExceptionBridge {
    meta: Arc<Meta>,
    mappings: Arc<TypeMappings>,
}

impl ExceptionBridge {
    /// A bridge creating guest exceptions through `meta`
    pub fn new(meta: Arc<Meta>, mappings: Arc<TypeMappings>) -> Self {
        Self { meta, mappings }
    }

    /// Registered type converters
    pub fn mappings(&self) -> &TypeMappings {
        &self.mappings
    }

    /// The guest exception for a modeled interop exception
    pub fn translate(&self, exception: InteropException) -> Thrown {
        let n = names();
        let meta = &*self.meta;
        let message = exception.to_string();
        let cause = self.wrap_cause(exception.cause());

        let (class, fields) = match exception {
            InteropException::UnsupportedMessage { .. } => (n.unsupported_message, Vec::new()),
            InteropException::UnknownIdentifier { id, .. } => {
                let id = meta.to_guest_string(&id);
                (n.unknown_identifier, vec![field("unknownIdentifier", id.into())])
            }
            InteropException::Arity { min, max, actual, .. } => (
                n.arity,
                vec![
                    field("expectedMinArity", GuestValue::Int(min)),
                    field("expectedMaxArity", GuestValue::Int(max)),
                    field("actualArity", GuestValue::Int(actual)),
                ],
            ),
            InteropException::UnsupportedType {
                supplied_values, hint, ..
            } => {
                let supplied = supplied_values
                    .into_iter()
                    .map(|v| GuestValue::Ref(wrap_result(meta.heap(), v)))
                    .collect();
                let supplied = meta.new_array("java/lang/Object", supplied);
                let hint = meta.to_guest_string(&hint);
                (
                    n.unsupported_type,
                    vec![field("suppliedValues", supplied.into()), field("hint", hint.into())],
                )
            }
            InteropException::InvalidArrayIndex { index, .. } => {
                (n.invalid_array_index, vec![field("invalidIndex", GuestValue::Long(index))])
            }
            InteropException::InvalidBufferOffset { offset, length, .. } => (
                n.invalid_buffer_offset,
                vec![
                    field("byteOffset", GuestValue::Long(offset)),
                    field("length", GuestValue::Long(length)),
                ],
            ),
            InteropException::StopIteration { .. } => (n.stop_iteration, Vec::new()),
            InteropException::UnknownKey { key, .. } => {
                let key = wrap_result(meta.heap(), key);
                (n.unknown_key, vec![field("unknownKey", key.into())])
            }
        };

        Thrown::Guest(meta.new_exception(class, Some(&message), cause, fields))
    }

    /// Translate anything an interop message failed with
    pub fn translate_error(&self, error: InteropError) -> Thrown {
        match error {
            InteropError::Interop(exception) => self.translate(exception),
            InteropError::Thrown(value) => self.translate_thrown(value),
        }
    }

    /// The guest exception for an arbitrary exception thrown by a foreign
    /// runtime.
    ///
    /// Guest exceptions pass through. Otherwise the internal converter
    /// registered for the exception's meta name is tried, then the general
    /// one; a converted exception takes over the carrier's backtrace. With
    /// no converter the carrier itself is thrown. If the meta name cannot be
    /// determined the original is returned as [`Thrown::Foreign`].
    pub fn translate_thrown(&self, foreign: InteropValue) -> Thrown {
        if let Some(r) = foreign.downcast_ref::<GuestRef>() {
            if r.is_exception() {
                return Thrown::Guest(r.clone());
            }
        }

        let type_name = match library::meta_qualified_name_of(&foreign) {
            Ok(name) => name,
            Err(e) => {
                debug!(error = %e, "cannot name foreign exception; rethrowing it untranslated");
                return Thrown::Foreign(foreign);
            }
        };

        let carrier = self.meta.create_foreign_exception(foreign.clone());

        if let Some(converter) = self.mappings.internal_converter(&type_name) {
            let converted = converter.convert(&self.meta, &foreign);
            if let Some(result) = adopt_backtrace(&carrier, converted) {
                return Thrown::Guest(result);
            }
            debug!(type_name = %type_name, "internal converter did not produce an exception");
        }

        if let Some(converter) = self.mappings.converter(&type_name) {
            let converted = converter.convert(&self.meta, &carrier);
            if let Some(result) = converted.and_then(|c| adopt_backtrace(&carrier, c)) {
                return Thrown::Guest(result);
            }
            debug!(type_name = %type_name, "type converter did not produce an exception");
        }

        Thrown::Guest(carrier)
    }

    /// What a guest exception leaving through interop is thrown as.
    ///
    /// A carrier rethrows the foreign exception it wraps.
    pub fn to_foreign(&self, thrown: Thrown) -> InteropError {
        match thrown {
            Thrown::Foreign(value) => InteropError::Thrown(value),
            Thrown::Guest(r) => match r.raw_foreign() {
                Some(raw) if r.is_foreign_exception() => InteropError::Thrown(raw.clone()),
                _ => InteropError::Thrown(preserve(&r)),
            },
        }
    }

    /// A foreign-exception carrier for an interop exception's cause
    fn wrap_cause(&self, cause: Option<&InteropValue>) -> GuestRef {
        let Some(cause) = cause else {
            return GuestRef::NULL;
        };
        match cause.downcast_ref::<GuestRef>() {
            Some(r) if r.is_exception() => r.clone(),
            _ if library::is_exception(cause) => self.meta.create_foreign_exception(cause.clone()),
            _ => GuestRef::NULL,
        }
    }
}

fn field(name: &str, value: GuestValue) -> (Symbol, GuestValue) {
    (Symbol::intern(name), value)
}

/// Move the carrier's backtrace to `converted`, if that is an exception
fn adopt_backtrace(carrier: &GuestRef, converted: GuestRef) -> Option<GuestRef> {
    let (target, source) = (converted.throwable()?, carrier.throwable()?);
    target.copy_from(source);
    source.clear();
    Some(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::NativeHeap;

    fn bridge() -> ExceptionBridge {
        let meta = Arc::new(Meta::new(Arc::new(NativeHeap::new())));
        ExceptionBridge::new(meta, Arc::new(TypeMappings::default()))
    }

    fn field_of(thrown: &Thrown, name: &str) -> GuestValue {
        let exc = thrown.as_guest().unwrap().exception_data().unwrap();
        exc.field(name).cloned().unwrap()
    }

    #[test]
    fn test_arity_payload() {
        let thrown = bridge().translate(InteropException::arity(1, 2, 5));
        assert_eq!(thrown.as_guest().unwrap().klass(), Some(names().arity));
        assert!(matches!(field_of(&thrown, "expectedMinArity"), GuestValue::Int(1)));
        assert!(matches!(field_of(&thrown, "expectedMaxArity"), GuestValue::Int(2)));
        assert!(matches!(field_of(&thrown, "actualArity"), GuestValue::Int(5)));
    }

    #[test]
    fn test_unknown_identifier_payload() {
        let thrown = bridge().translate(InteropException::unknown_identifier("size"));
        let GuestValue::Ref(id) = field_of(&thrown, "unknownIdentifier") else {
            panic!("expected a string");
        };
        assert_eq!(id.host_string().as_deref(), Some("size"));
        let data = thrown.as_guest().unwrap().exception_data().unwrap();
        assert_eq!(data.message(), Some("Unknown identifier: size"));
        assert!(data.cause().is_null());
    }

    #[test]
    fn test_buffer_offset_payload() {
        let thrown = bridge().translate(InteropException::invalid_offset(6, 4));
        assert_eq!(thrown.as_guest().unwrap().klass(), Some(names().invalid_buffer_offset));
        assert!(matches!(field_of(&thrown, "byteOffset"), GuestValue::Long(6)));
        assert!(matches!(field_of(&thrown, "length"), GuestValue::Long(4)));
    }

    #[test]
    fn test_unsupported_type_wraps_supplied_values() {
        let thrown =
            bridge().translate(InteropException::unsupported_type(vec![InteropValue::Int(1)], "not a string"));
        let GuestValue::Ref(values) = field_of(&thrown, "suppliedValues") else {
            panic!("expected an array");
        };
        assert_eq!(values.klass(), Some(names().object_array));
    }

    #[test]
    fn test_untranslatable_foreign_is_kept() {
        let b = bridge();
        // a host string has no meta object
        let thrown = b.translate_thrown(InteropValue::from("boom"));
        assert!(matches!(thrown, Thrown::Foreign(InteropValue::String(ref s)) if &**s == "boom"));
        assert!(matches!(b.to_foreign(thrown), InteropError::Thrown(InteropValue::String(_))));
    }

    #[test]
    fn test_guest_exception_passes_through() {
        let b = bridge();
        let Thrown::Guest(exc) = b.translate(InteropException::stop_iteration()) else {
            panic!("expected a guest exception");
        };
        let again = b.translate_thrown(preserve(&exc));
        assert!(again.as_guest().unwrap().ptr_eq(&exc));
    }
}
