//! Guest-facing interop protocol tests
//!
//! Exercises the protocol against foreign fixtures and guest objects:
//! - numeric exactness of every width
//! - error kinds of arrays, members and iterators
//! - buffer round trips in both byte orders
//! - identity laws
//! - receiver-dependent argument conversion
//! - dispatch through the `Interop` class substitutions
//!
//! # Running Tests
//! ```bash
//! cargo test --test interop_protocol_tests
//! ```

mod common;

use std::fmt::Debug;

use common::{foreign, ForeignArray, ForeignBuffer, ForeignIterator, ForeignMap, Point};
use parking_lot::RwLock;
use tessera_engine::interop::{protocol, unwrap};
use tessera_engine::tessera_sdk::{library, BigInt, ByteOrder, InteropValue};
use tessera_engine::{names, GuestRef, GuestValue, InteropContext, NativeData, Symbol, Thrown};

fn exception_of<T: Debug>(result: Result<T, Thrown>) -> GuestRef {
    match result {
        Err(Thrown::Guest(exc)) => exc,
        other => panic!("expected a guest exception, got {:?}", other),
    }
}

fn class_of<T: Debug>(result: Result<T, Thrown>) -> Symbol {
    exception_of(result).klass().unwrap()
}

fn field(exc: &GuestRef, name: &str) -> GuestValue {
    exc.exception_data().unwrap().field(name).cloned().unwrap()
}

// ===== Numeric Exactness =====

/// Whether `back`, widened, denotes exactly the number `original` does
fn same_number(original: &InteropValue, back: &InteropValue) -> bool {
    match *back {
        InteropValue::Float(f) => same_float(original, f as f64),
        InteropValue::Double(d) => same_float(original, d),
        _ => match (library::as_big_integer(original), library::as_big_integer(back)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
    }
}

fn same_float(original: &InteropValue, d: f64) -> bool {
    if d.is_nan() {
        return matches!(library::as_double(original), Ok(o) if o.is_nan());
    }
    if let Ok(big) = library::as_big_integer(original) {
        return d.fract() == 0.0 && d.abs() < 1e38 && big == BigInt::from(d as i128);
    }
    matches!(library::as_double(original), Ok(o) if o.to_bits() == d.to_bits())
}

fn check_width<T, F, A>(ctx: &InteropContext, r: &GuestRef, fits: F, as_fn: A)
where
    T: Into<InteropValue> + Debug,
    F: Fn(&GuestRef) -> bool,
    A: Fn(&InteropContext, &GuestRef) -> Result<T, Thrown>,
{
    let original = unwrap(r);
    let result = as_fn(ctx, r);
    assert_eq!(fits(r), result.is_ok(), "fits/as disagree for {:?}", original);
    match result {
        Ok(v) => {
            let back = v.into();
            assert!(same_number(&original, &back), "{:?} came back as {:?}", original, back);
        }
        Err(e) => assert_eq!(class_of::<T>(Err(e)), names().unsupported_message),
    }
}

fn numeric_receivers(ctx: &InteropContext) -> Vec<GuestRef> {
    let primitives = vec![
        InteropValue::Byte(-5),
        InteropValue::Short(300),
        InteropValue::Int(70_000),
        InteropValue::Long(i64::MAX),
        InteropValue::Long((1 << 53) + 1),
        InteropValue::Float(0.1),
        InteropValue::Double(1.5),
        InteropValue::Double(-0.0),
        InteropValue::Double(1e10),
        InteropValue::Double(f64::NAN),
        InteropValue::Double(f64::INFINITY),
        InteropValue::big_integer(BigInt::from(1u128 << 70)),
        InteropValue::big_integer(BigInt::from(-1)),
    ];
    let mut receivers: Vec<GuestRef> = primitives.into_iter().map(|v| foreign(ctx, v)).collect();
    receivers.push(ctx.meta().box_value(GuestValue::Int(42)));
    receivers.push(ctx.meta().box_value(GuestValue::Double(2.5)));
    receivers.push(ctx.meta().box_value(GuestValue::Long(-(1 << 40))));
    receivers
}

#[test]
fn test_fits_agrees_with_exact_conversion() {
    let ctx = InteropContext::new();
    for r in numeric_receivers(&ctx) {
        assert!(protocol::is_number(&r));
        check_width(&ctx, &r, protocol::fits_in_byte, protocol::as_byte);
        check_width(&ctx, &r, protocol::fits_in_short, protocol::as_short);
        check_width(&ctx, &r, protocol::fits_in_int, protocol::as_int);
        check_width(&ctx, &r, protocol::fits_in_long, protocol::as_long);
        check_width(&ctx, &r, protocol::fits_in_float, protocol::as_float);
        check_width(&ctx, &r, protocol::fits_in_double, protocol::as_double);

        let big = protocol::as_big_integer(&ctx, &r);
        assert_eq!(protocol::fits_in_big_integer(&r), big.is_ok());
        if let Ok(b) = big {
            assert_eq!(b.klass(), Some(names().big_integer));
            let back = library::as_big_integer(&unwrap(&b)).unwrap();
            assert!(same_number(&unwrap(&r), &InteropValue::from(back)));
        }
    }
}

#[test]
fn test_lossy_conversions_are_rejected() {
    let ctx = InteropContext::new();
    let half = foreign(&ctx, InteropValue::Double(1.5));
    assert!(!protocol::fits_in_int(&half));
    assert!(!protocol::fits_in_big_integer(&half));

    let odd = foreign(&ctx, InteropValue::Long((1 << 53) + 1));
    assert!(!protocol::fits_in_double(&odd));
    assert!(protocol::fits_in_long(&odd));

    let negative_zero = foreign(&ctx, InteropValue::Double(-0.0));
    assert!(!protocol::fits_in_int(&negative_zero));
    assert!(protocol::fits_in_float(&negative_zero));
}

#[test]
fn test_non_numbers() {
    let ctx = InteropContext::new();
    let s = ctx.meta().to_guest_string("12");
    assert!(!protocol::is_number(&s));
    assert!(!protocol::fits_in_int(&s));
    assert_eq!(class_of(protocol::as_int(&ctx, &s)), names().unsupported_message);
    assert!(!protocol::is_number(&GuestRef::NULL));
}

// ===== Error Kinds =====

#[test]
fn test_unknown_member() {
    let ctx = InteropContext::new();
    let p = foreign(&ctx, Point::new(3));
    assert!(protocol::has_members(&p));
    assert!(protocol::is_member_readable(&p, "x"));

    let exc = exception_of(protocol::read_member(&ctx, &p, "y"));
    assert_eq!(exc.klass(), Some(names().unknown_identifier));
    let GuestValue::Ref(id) = field(&exc, "unknownIdentifier") else {
        panic!("identifier is not a reference");
    };
    assert_eq!(id.host_string().as_deref(), Some("y"));
}

#[test]
fn test_invalid_array_index() {
    let ctx = InteropContext::new();
    let a = foreign(&ctx, ForeignArray::ints(&[1, 2, 3]));
    assert_eq!(protocol::get_array_size(&ctx, &a).unwrap(), 3);
    assert!(!protocol::is_array_element_readable(&a, 5));

    let exc = exception_of(protocol::read_array_element(&ctx, &a, 5));
    assert_eq!(exc.klass(), Some(names().invalid_array_index));
    assert!(matches!(field(&exc, "invalidIndex"), GuestValue::Long(5)));

    // guest arrays answer the same way
    let g = ctx.meta().new_array("I", vec![GuestValue::Int(1)]);
    assert_eq!(
        class_of(protocol::read_array_element(&ctx, &g, -1)),
        names().invalid_array_index
    );
}

#[test]
fn test_arity_mismatch() {
    let ctx = InteropContext::new();
    let p = foreign(&ctx, Point::new(0));
    let one = ctx.meta().box_value(GuestValue::Int(1));
    let args = vec![one.clone(), one.clone(), one.clone()];

    let exc = exception_of(protocol::invoke_member(&ctx, &p, "add", &args));
    assert_eq!(exc.klass(), Some(names().arity));
    assert!(matches!(field(&exc, "expectedMinArity"), GuestValue::Int(2)));
    assert!(matches!(field(&exc, "expectedMaxArity"), GuestValue::Int(2)));
    assert!(matches!(field(&exc, "actualArity"), GuestValue::Int(3)));

    let sum = protocol::invoke_member(&ctx, &p, "add", &args[..2]).unwrap();
    assert_eq!(protocol::as_int(&ctx, &sum).unwrap(), 2);
}

#[test]
fn test_unsupported_type_carries_values() {
    let ctx = InteropContext::new();
    let p = foreign(&ctx, Point::new(0));
    let s = ctx.meta().to_guest_string("not a number");

    let exc = exception_of(protocol::write_member(&ctx, &p, "x", &s));
    assert_eq!(exc.klass(), Some(names().unsupported_type));
    let GuestValue::Ref(hint) = field(&exc, "hint") else {
        panic!("hint is not a reference");
    };
    assert_eq!(hint.host_string().as_deref(), Some("x is an int"));
}

// ===== Iterators =====

#[test]
fn test_iterator_termination() {
    let ctx = InteropContext::new();
    let it = foreign(&ctx, ForeignIterator::new(vec![InteropValue::Int(9)]));
    assert!(protocol::is_iterator(&it));

    assert!(protocol::has_iterator_next_element(&ctx, &it).unwrap());
    let first = protocol::get_iterator_next_element(&ctx, &it).unwrap();
    assert_eq!(protocol::as_int(&ctx, &first).unwrap(), 9);

    assert!(!protocol::has_iterator_next_element(&ctx, &it).unwrap());
    assert_eq!(
        class_of(protocol::get_iterator_next_element(&ctx, &it)),
        names().stop_iteration
    );
}

#[test]
fn test_non_iterator_is_unsupported() {
    let ctx = InteropContext::new();
    let p = foreign(&ctx, Point::new(0));
    assert!(!protocol::is_iterator(&p));
    assert_eq!(
        class_of(protocol::has_iterator_next_element(&ctx, &p)),
        names().unsupported_message
    );
    assert_eq!(
        class_of(protocol::get_iterator_next_element(&ctx, &p)),
        names().unsupported_message
    );
}

#[test]
fn test_guest_list_iterator() {
    let ctx = InteropContext::new();
    let list = ctx.meta().heap().allocate(
        names().array_list,
        NativeData::List(RwLock::new(vec![GuestValue::Int(1), GuestValue::Int(2)])),
    );
    assert!(protocol::has_iterator(&list));
    let it = protocol::get_iterator(&ctx, &list).unwrap();

    let mut seen = Vec::new();
    while protocol::has_iterator_next_element(&ctx, &it).unwrap() {
        let e = protocol::get_iterator_next_element(&ctx, &it).unwrap();
        seen.push(protocol::as_int(&ctx, &e).unwrap());
    }
    assert_eq!(seen, vec![1, 2]);
    assert_eq!(
        class_of(protocol::get_iterator_next_element(&ctx, &it)),
        names().stop_iteration
    );
}

// ===== Buffers =====

fn buffer_receivers(ctx: &InteropContext) -> Vec<GuestRef> {
    vec![
        foreign(ctx, ForeignBuffer::zeroed(16)),
        ctx.meta().new_array("B", vec![GuestValue::Byte(0); 16]),
    ]
}

#[test]
fn test_buffer_round_trip_in_both_orders() {
    let ctx = InteropContext::new();
    for buf in buffer_receivers(&ctx) {
        assert!(protocol::has_buffer_elements(&buf));
        assert_eq!(protocol::get_buffer_size(&ctx, &buf).unwrap(), 16);
        for order in [ByteOrder::Little, ByteOrder::Big] {
            protocol::write_buffer_short(&ctx, &buf, order, 1, -2).unwrap();
            assert_eq!(protocol::read_buffer_short(&ctx, &buf, order, 1).unwrap(), -2);

            protocol::write_buffer_int(&ctx, &buf, order, 3, 0x0102_0304).unwrap();
            assert_eq!(protocol::read_buffer_int(&ctx, &buf, order, 3).unwrap(), 0x0102_0304);

            protocol::write_buffer_long(&ctx, &buf, order, 8, i64::MIN + 7).unwrap();
            assert_eq!(protocol::read_buffer_long(&ctx, &buf, order, 8).unwrap(), i64::MIN + 7);

            protocol::write_buffer_float(&ctx, &buf, order, 0, 3.25).unwrap();
            assert_eq!(protocol::read_buffer_float(&ctx, &buf, order, 0).unwrap(), 3.25);

            protocol::write_buffer_double(&ctx, &buf, order, 7, -1.0e-300).unwrap();
            assert_eq!(protocol::read_buffer_double(&ctx, &buf, order, 7).unwrap(), -1.0e-300);
        }

        protocol::write_buffer_byte(&ctx, &buf, 15, -1).unwrap();
        assert_eq!(protocol::read_buffer_byte(&ctx, &buf, 15).unwrap(), -1);
    }
}

#[test]
fn test_buffer_cross_order_swaps_bytes() {
    let ctx = InteropContext::new();
    for buf in buffer_receivers(&ctx) {
        protocol::write_buffer_int(&ctx, &buf, ByteOrder::Little, 0, 0x0102_0304).unwrap();
        assert_eq!(
            protocol::read_buffer_int(&ctx, &buf, ByteOrder::Big, 0).unwrap(),
            0x0403_0201
        );

        protocol::write_buffer_short(&ctx, &buf, ByteOrder::Big, 4, 0x1234).unwrap();
        assert_eq!(
            protocol::read_buffer_short(&ctx, &buf, ByteOrder::Little, 4).unwrap(),
            0x3412
        );

        let value = 1234.5678_f64;
        protocol::write_buffer_double(&ctx, &buf, ByteOrder::Big, 8, value).unwrap();
        let swapped = protocol::read_buffer_double(&ctx, &buf, ByteOrder::Little, 8).unwrap();
        assert_eq!(swapped.to_bits(), value.to_bits().swap_bytes());
    }
}

#[test]
fn test_buffer_out_of_bounds() {
    let ctx = InteropContext::new();
    for buf in buffer_receivers(&ctx) {
        let exc = exception_of(protocol::read_buffer_long(&ctx, &buf, ByteOrder::Little, 12));
        assert_eq!(exc.klass(), Some(names().invalid_buffer_offset));
        assert!(matches!(field(&exc, "byteOffset"), GuestValue::Long(12)));
        assert!(matches!(field(&exc, "length"), GuestValue::Long(8)));
    }
}

// ===== Identity =====

#[test]
fn test_identity_laws() {
    let ctx = InteropContext::new();
    let s = ctx.meta().to_guest_string("same");
    let alias = s.clone();
    let other = ctx.meta().to_guest_string("same");
    let p = foreign(&ctx, Point::new(1));

    for x in [&s, &other, &p] {
        let first = protocol::is_identical(x, x);
        for _ in 0..3 {
            assert_eq!(protocol::is_identical(x, x), first);
        }
    }

    assert!(protocol::has_identity(&s));
    assert!(protocol::is_identical(&s, &alias));
    assert_eq!(
        protocol::identity_hash_code(&ctx, &s).unwrap(),
        protocol::identity_hash_code(&ctx, &alias).unwrap()
    );
    assert!(!protocol::is_identical(&s, &other));

    let pairs = [(&s, &alias), (&s, &other), (&p, &p), (&s, &p)];
    for (a, b) in pairs {
        if protocol::is_identical(a, b) {
            assert_eq!(
                protocol::identity_hash_code(&ctx, a).ok(),
                protocol::identity_hash_code(&ctx, b).ok()
            );
        }
    }
}

// ===== Receiver Handling =====

#[test]
fn test_guest_receiver_keeps_guest_types() {
    let ctx = InteropContext::new();
    let array = ctx.meta().new_array("java/lang/Object", vec![GuestValue::null()]);
    let p = foreign(&ctx, Point::new(5));

    protocol::write_array_element(&ctx, &array, 0, &p).unwrap();
    let back = protocol::read_array_element(&ctx, &array, 0).unwrap();
    assert!(back.ptr_eq(&p));
}

#[test]
fn test_foreign_receiver_gets_raw_values() {
    let ctx = InteropContext::new();
    let raw = ForeignArray::ints(&[0, 0]);
    let a = foreign(&ctx, raw.clone());

    // a foreign wrapper is unwrapped before it reaches a foreign receiver
    let seven = foreign(&ctx, InteropValue::Int(7));
    protocol::write_array_element(&ctx, &a, 0, &seven).unwrap();
    assert!(matches!(library::read_array_element(&raw, 0).unwrap(), InteropValue::Int(7)));

    // guest objects travel as themselves and come back unchanged
    let s = ctx.meta().to_guest_string("kept");
    protocol::write_array_element(&ctx, &a, 1, &s).unwrap();
    assert!(protocol::read_array_element(&ctx, &a, 1).unwrap().ptr_eq(&s));

    let wrapped = protocol::read_array_element(&ctx, &a, 0).unwrap();
    assert!(wrapped.is_foreign());
    assert_eq!(wrapped.klass(), Some(names().object));
}

#[test]
fn test_null_results_are_guest_null() {
    let ctx = InteropContext::new();
    let a = foreign(&ctx, ForeignArray::new(vec![InteropValue::Null]));
    assert!(protocol::read_array_element(&ctx, &a, 0).unwrap().is_null());
}

// ===== Hash Entries =====

#[test]
fn test_foreign_map_with_guest_keys() {
    let ctx = InteropContext::new();
    let m = foreign(
        &ctx,
        ForeignMap::new(vec![(InteropValue::from("a"), InteropValue::Int(1))]),
    );
    let a = ctx.meta().to_guest_string("a");
    let b = ctx.meta().to_guest_string("b");
    let fallback = ctx.meta().to_guest_string("none");

    assert!(protocol::has_hash_entries(&m));
    assert!(protocol::is_hash_entry_existing(&m, &a));
    assert!(protocol::is_hash_entry_insertable(&m, &b));

    let v = protocol::read_hash_value(&ctx, &m, &a).unwrap();
    assert_eq!(protocol::as_int(&ctx, &v).unwrap(), 1);

    let exc = exception_of(protocol::read_hash_value(&ctx, &m, &b));
    assert_eq!(exc.klass(), Some(names().unknown_key));
    let or_default = protocol::read_hash_value_or_default(&ctx, &m, &b, &fallback).unwrap();
    assert!(or_default.ptr_eq(&fallback));

    let two = ctx.meta().box_value(GuestValue::Int(2));
    protocol::write_hash_entry(&ctx, &m, &b, &two).unwrap();
    assert_eq!(protocol::get_hash_size(&ctx, &m).unwrap(), 2);

    let keys = protocol::get_hash_keys_iterator(&ctx, &m).unwrap();
    let mut names_seen = Vec::new();
    while protocol::has_iterator_next_element(&ctx, &keys).unwrap() {
        let k = protocol::get_iterator_next_element(&ctx, &keys).unwrap();
        let s = protocol::as_string(&ctx, &k).unwrap();
        names_seen.push(s.host_string().unwrap().to_string());
    }
    assert_eq!(names_seen, vec!["a", "b"]);

    protocol::remove_hash_entry(&ctx, &m, &a).unwrap();
    assert!(!protocol::is_hash_entry_existing(&m, &a));
}

#[test]
fn test_guest_map_compares_boxed_keys_by_value() {
    let ctx = InteropContext::new();
    let key = ctx.meta().box_value(GuestValue::Int(10));
    let m = ctx.meta().heap().allocate(
        names().hash_map,
        NativeData::Map(RwLock::new(vec![(GuestValue::Ref(key), GuestValue::Long(100))])),
    );

    let same = ctx.meta().box_value(GuestValue::Int(10));
    assert!(protocol::is_hash_entry_readable(&m, &same));
    let v = protocol::read_hash_value(&ctx, &m, &same).unwrap();
    assert_eq!(protocol::as_long(&ctx, &v).unwrap(), 100);
}

#[test]
fn test_guest_map_read_during_concurrent_removal() {
    let ctx = InteropContext::new();
    let entries = (0..64).map(|i| (GuestValue::Int(i), GuestValue::Int(i))).collect();
    let m = ctx.meta().heap().allocate(names().hash_map, NativeData::Map(RwLock::new(entries)));
    let last = ctx.meta().box_value(GuestValue::Int(63));

    std::thread::scope(|s| {
        let shared = unwrap(&m);
        let churn = s.spawn(move || {
            for _ in 0..2_000 {
                library::remove_hash_entry(&shared, &InteropValue::Int(0)).unwrap();
                library::write_hash_entry(&shared, InteropValue::Int(0), InteropValue::Int(0)).unwrap();
            }
        });

        for _ in 0..2_000 {
            let v = protocol::read_hash_value(&ctx, &m, &last).unwrap();
            assert_eq!(protocol::as_int(&ctx, &v).unwrap(), 63);
        }
        churn.join().unwrap();
    });
    assert_eq!(protocol::get_hash_size(&ctx, &m).unwrap(), 64);
}

// ===== Interop Class Dispatch =====

#[test]
fn test_interop_class_dispatch() {
    let ctx = InteropContext::new();
    let read_member = ctx.describe_method(
        "org/tessera/polyglot/Interop",
        "readMember",
        "(Ljava/lang/Object;Ljava/lang/String;)Ljava/lang/Object;",
    );
    let node = ctx.resolve(&read_member).expect("Interop.readMember is substituted");

    let p = foreign(&ctx, Point::new(3));
    let x = ctx.meta().to_guest_string("x");
    let result = node.call(&ctx, &[p.clone().into(), x.into()]).unwrap();
    let GuestValue::Ref(value) = result else {
        panic!("readMember returns a reference");
    };
    assert_eq!(protocol::as_int(&ctx, &value).unwrap(), 3);

    let missing = ctx.meta().to_guest_string("missing");
    assert_eq!(
        class_of(node.call(&ctx, &[p.into(), missing.into()])),
        names().unknown_identifier
    );
}

#[test]
fn test_interop_class_buffer_dispatch() {
    let ctx = InteropContext::new();
    let write = ctx.describe_method(
        "org/tessera/polyglot/Interop",
        "writeBufferInt",
        "(Ljava/lang/Object;Ljava/nio/ByteOrder;JI)V",
    );
    let read = ctx.describe_method(
        "org/tessera/polyglot/Interop",
        "readBufferInt",
        "(Ljava/lang/Object;Ljava/nio/ByteOrder;J)I",
    );
    let buf = foreign(&ctx, ForeignBuffer::zeroed(8));
    let big = ctx.meta().byte_order(ByteOrder::Big);
    let little = ctx.meta().byte_order(ByteOrder::Little);

    ctx.resolve(&write)
        .unwrap()
        .call(
            &ctx,
            &[buf.clone().into(), big.into(), GuestValue::Long(2), GuestValue::Int(0x0A0B_0C0D)],
        )
        .unwrap();
    let value = ctx
        .resolve(&read)
        .unwrap()
        .call(&ctx, &[buf.into(), little.into(), GuestValue::Long(2)])
        .unwrap();
    assert_eq!(value.as_int(), Some(0x0D0C_0B0A));
}
