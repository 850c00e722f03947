//! Exception bridge integration tests
//!
//! Foreign exceptions thrown through interop calls, with and without
//! registered type converters, and guest exceptions leaving again.
//!
//! # Running Tests
//! ```bash
//! cargo test --test exception_bridge_tests
//! ```

mod common;

use std::sync::Arc;

use common::{foreign, ForeignError, OpaqueError, Thrower};
use tessera_engine::interop::protocol;
use tessera_engine::object::{ExceptionData, StackFrame, Throwable};
use tessera_engine::tessera_sdk::{library, InteropError, InteropException, InteropValue};
use tessera_engine::{
    names, GuestRef, GuestValue, InteropContext, Meta, NativeData, NativeHeap, RuntimeOptions, Symbol, Thrown,
    TypeMappings,
};

const VALUE_ERROR: &str = "python.ValueError";
const KEY_ERROR: &str = "python.KeyError";

fn frames() -> Vec<StackFrame> {
    vec![
        StackFrame {
            declaring_type: Symbol::intern("app/Main"),
            method: Symbol::intern("lookup"),
            line: 12,
        },
        StackFrame {
            declaring_type: Symbol::intern("app/Main"),
            method: Symbol::intern("main"),
            line: 3,
        },
    ]
}

fn context(mappings: TypeMappings) -> InteropContext {
    let heap = Arc::new(NativeHeap::new());
    heap.set_frames(frames());
    let options = RuntimeOptions {
        type_mappings: Arc::new(mappings),
        ..RuntimeOptions::default()
    };
    InteropContext::with_heap(options, heap)
}

/// A guest exception with no backtrace of its own
fn bare_exception(class: Symbol, message: &str) -> GuestRef {
    let throwable = Throwable::new(Arc::from(Vec::new()));
    GuestRef::native(
        class,
        NativeData::Exception(ExceptionData::new(Some(message), GuestRef::NULL, Vec::new(), throwable)),
    )
}

fn call_thrower(ctx: &InteropContext, error: InteropValue) -> Thrown {
    let f = foreign(ctx, Thrower::new(error));
    match protocol::execute(ctx, &f, &[]) {
        Err(thrown) => thrown,
        Ok(v) => panic!("expected a throw, got {:?}", v),
    }
}

// ===== Fallback Carrier =====

#[test]
fn test_unmapped_foreign_exception_becomes_carrier() {
    let ctx = context(TypeMappings::new());
    let error = ForeignError::new(VALUE_ERROR, "bad value");

    let Thrown::Guest(carrier) = call_thrower(&ctx, error.clone()) else {
        panic!("expected a guest exception");
    };
    assert!(carrier.is_foreign_exception());
    assert_eq!(carrier.klass(), Some(names().foreign_exception));
    assert!(carrier.raw_foreign().unwrap().same_value(&error));

    // the carrier answers with the original message and the guest backtrace
    let message = protocol::get_exception_message(&ctx, &carrier).unwrap();
    let message = protocol::as_string(&ctx, &message).unwrap();
    assert_eq!(message.host_string().as_deref(), Some("bad value"));
    assert_eq!(carrier.throwable().unwrap().stack_depth(), 2);
}

#[test]
fn test_unnamed_foreign_exception_is_rethrown_unchanged() {
    let ctx = context(TypeMappings::new());
    let error = InteropValue::object(OpaqueError);

    match call_thrower(&ctx, error.clone()) {
        Thrown::Foreign(original) => assert!(original.same_value(&error)),
        Thrown::Guest(exc) => panic!("expected the original, got {:?}", exc),
    }
}

// ===== Converters =====

#[test]
fn test_internal_converter_takes_carrier_backtrace() {
    let mappings = TypeMappings::new().with_internal_converter(
        VALUE_ERROR,
        |_meta: &Meta, foreign: &InteropValue| -> GuestRef {
            let message = library::get_exception_message(foreign)
                .and_then(|m| library::as_string(&m))
                .unwrap_or_default();
            bare_exception(names().illegal_argument, &message)
        },
    );
    let ctx = context(mappings);

    let Thrown::Guest(exc) = call_thrower(&ctx, ForeignError::new(VALUE_ERROR, "negative size")) else {
        panic!("expected a guest exception");
    };
    assert_eq!(exc.klass(), Some(names().illegal_argument));
    assert_eq!(exc.exception_data().unwrap().message(), Some("negative size"));

    let throwable = exc.throwable().unwrap();
    assert_eq!(throwable.stack_depth(), 2);
    assert_eq!(&*throwable.backtrace().unwrap(), frames().as_slice());
}

#[test]
fn test_general_converter_receives_carrier() {
    let mappings = TypeMappings::new().with_converter(
        KEY_ERROR,
        |_meta: &Meta, carrier: &GuestRef| -> Option<GuestRef> {
            assert!(carrier.is_foreign_exception());
            Some(bare_exception(names().null_pointer, "no such key"))
        },
    );
    let ctx = context(mappings);

    let Thrown::Guest(exc) = call_thrower(&ctx, ForeignError::new(KEY_ERROR, "'k'")) else {
        panic!("expected a guest exception");
    };
    assert_eq!(exc.klass(), Some(names().null_pointer));
    assert_eq!(exc.throwable().unwrap().stack_depth(), 2);

    // other types are not affected
    let Thrown::Guest(other) = call_thrower(&ctx, ForeignError::new(VALUE_ERROR, "x")) else {
        panic!("expected a guest exception");
    };
    assert!(other.is_foreign_exception());
}

#[test]
fn test_declining_converters_fall_back_to_carrier() {
    let mappings = TypeMappings::new()
        .with_internal_converter(VALUE_ERROR, |meta: &Meta, _foreign: &InteropValue| -> GuestRef {
            // not an exception
            meta.to_guest_string("oops")
        })
        .with_converter(VALUE_ERROR, |_meta: &Meta, _carrier: &GuestRef| -> Option<GuestRef> { None });
    let ctx = context(mappings);

    let Thrown::Guest(exc) = call_thrower(&ctx, ForeignError::new(VALUE_ERROR, "x")) else {
        panic!("expected a guest exception");
    };
    assert!(exc.is_foreign_exception());
    assert_eq!(exc.throwable().unwrap().stack_depth(), 2);
}

// ===== Modeled Interop Exceptions =====

#[test]
fn test_interop_exception_cause_is_wrapped() {
    let ctx = context(TypeMappings::new());
    let cause = ForeignError::new(VALUE_ERROR, "root cause");
    let thrown = ctx
        .bridge()
        .translate(InteropException::unsupported().with_cause(cause.clone()));

    let exc = thrown.as_guest().unwrap();
    assert_eq!(exc.klass(), Some(names().unsupported_message));
    let wrapped = exc.exception_data().unwrap().cause();
    assert!(wrapped.is_foreign_exception());
    assert!(wrapped.raw_foreign().unwrap().same_value(&cause));

    // reading the cause through interop yields the same carrier
    assert!(protocol::has_exception_cause(exc));
    let via_protocol = protocol::get_exception_cause(&ctx, exc).unwrap();
    assert!(via_protocol.is_foreign_exception());
}

#[test]
fn test_non_exception_cause_is_dropped() {
    let ctx = context(TypeMappings::new());
    let thrown = ctx
        .bridge()
        .translate(InteropException::stop_iteration().with_cause(InteropValue::Int(1)));
    assert!(thrown.as_guest().unwrap().exception_data().unwrap().cause().is_null());
}

// ===== Leaving the Guest =====

#[test]
fn test_carrier_rethrows_original() {
    let ctx = context(TypeMappings::new());
    let error = ForeignError::new(VALUE_ERROR, "bad value");
    let thrown = call_thrower(&ctx, error.clone());

    match ctx.bridge().to_foreign(thrown) {
        InteropError::Thrown(v) => assert!(v.same_value(&error)),
        other => panic!("expected a thrown value, got {:?}", other),
    }
}

#[test]
fn test_guest_exception_leaves_as_guest_object() {
    let ctx = context(TypeMappings::new());
    let Thrown::Guest(exc) = ctx.meta().throw(names().illegal_argument, "bad") else {
        panic!("expected a guest exception");
    };

    let InteropError::Thrown(v) = ctx.bridge().to_foreign(Thrown::Guest(exc.clone())) else {
        panic!("expected a thrown value");
    };
    assert!(v.downcast_ref::<GuestRef>().unwrap().ptr_eq(&exc));

    // and comes back unchanged
    let back = ctx.bridge().translate_thrown(v);
    assert!(back.as_guest().unwrap().ptr_eq(&exc));
}

#[test]
fn test_throw_exception() {
    let ctx = context(TypeMappings::new());
    let carrier_source = foreign(&ctx, ForeignError::new(VALUE_ERROR, "x"));
    let Thrown::Guest(exc) = protocol::throw_exception(&ctx, &carrier_source) else {
        panic!("expected a guest exception");
    };
    assert!(exc.is_foreign_exception());

    let not_exception = ctx.meta().box_value(GuestValue::Int(1));
    let Thrown::Guest(exc) = protocol::throw_exception(&ctx, &not_exception) else {
        panic!("expected a guest exception");
    };
    assert_eq!(exc.klass(), Some(names().unsupported_message));
}
