//! Exact numeric conversions between interop number representations.
//!
//! Every `as_*` function returns `None` unless the conversion is exact, and
//! the matching `fits_in_*` is defined as `as_*(..).is_some()`, so a fit
//! check can never disagree with the conversion it guards.
//!
//! Rules:
//! - integers convert to a narrower integer iff the value is in range
//! - a float/double converts to an integer iff it is finite, has no
//!   fractional part, is in range and is not `-0.0`
//! - an integer converts to float/double iff the float maps back to the
//!   same integer
//! - `NaN` and the infinities fit in float and double only
//! - `BigInteger` behaves like an integer of unbounded width

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::value::InteropValue;

/// 2^63 as an f64; the first double above `i64::MAX`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// A borrowed view of any numeric interop value.
#[derive(Debug, Clone, Copy)]
pub enum Number<'a> {
    /// Any fixed-width integer, widened
    Integer(i64),
    /// Single-precision float
    Float(f32),
    /// Double-precision float
    Double(f64),
    /// Arbitrary-precision integer
    Big(&'a BigInt),
}

impl<'a> Number<'a> {
    /// View a primitive interop value as a number. Objects are not numbers
    /// here; they answer through their own capability table.
    pub fn of(value: &'a InteropValue) -> Option<Self> {
        match value {
            InteropValue::Byte(v) => Some(Number::Integer(*v as i64)),
            InteropValue::Short(v) => Some(Number::Integer(*v as i64)),
            InteropValue::Int(v) => Some(Number::Integer(*v as i64)),
            InteropValue::Long(v) => Some(Number::Integer(*v)),
            InteropValue::Float(v) => Some(Number::Float(*v)),
            InteropValue::Double(v) => Some(Number::Double(*v)),
            InteropValue::BigInteger(v) => Some(Number::Big(v)),
            _ => None,
        }
    }

    /// Exact i64
    pub fn to_long(self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(i),
            Number::Float(f) => double_to_long(f as f64),
            Number::Double(d) => double_to_long(d),
            Number::Big(b) => b.to_i64(),
        }
    }

    /// Exact i8
    pub fn to_byte(self) -> Option<i8> {
        self.to_long().and_then(|v| i8::try_from(v).ok())
    }

    /// Exact i16
    pub fn to_short(self) -> Option<i16> {
        self.to_long().and_then(|v| i16::try_from(v).ok())
    }

    /// Exact i32
    pub fn to_int(self) -> Option<i32> {
        self.to_long().and_then(|v| i32::try_from(v).ok())
    }

    /// Exact f64
    pub fn to_double(self) -> Option<f64> {
        match self {
            Number::Integer(i) => long_to_double(i),
            Number::Float(f) => Some(f as f64),
            Number::Double(d) => Some(d),
            Number::Big(b) => big_to_double(b),
        }
    }

    /// Exact f32
    pub fn to_float(self) -> Option<f32> {
        match self {
            Number::Integer(i) => long_to_float(i),
            Number::Float(f) => Some(f),
            Number::Double(d) => double_to_float(d),
            Number::Big(b) => big_to_double(b).and_then(double_to_float),
        }
    }

    /// Exact arbitrary-precision integer
    pub fn to_big_integer(self) -> Option<BigInt> {
        match self {
            Number::Integer(i) => Some(BigInt::from(i)),
            Number::Float(f) => double_to_big(f as f64),
            Number::Double(d) => double_to_big(d),
            Number::Big(b) => Some(b.clone()),
        }
    }
}

fn is_integral(d: f64) -> bool {
    d.is_finite() && d.fract() == 0.0 && !(d == 0.0 && d.is_sign_negative())
}

fn double_to_long(d: f64) -> Option<i64> {
    if is_integral(d) && d >= -TWO_POW_63 && d < TWO_POW_63 {
        Some(d as i64)
    } else {
        None
    }
}

fn double_to_big(d: f64) -> Option<BigInt> {
    if is_integral(d) {
        BigInt::from_f64(d)
    } else {
        None
    }
}

fn long_to_double(i: i64) -> Option<f64> {
    let d = i as f64;
    // `as i64` saturates, so 2^63 would falsely map back to i64::MAX
    if d < TWO_POW_63 && d as i64 == i {
        Some(d)
    } else {
        None
    }
}

fn long_to_float(i: i64) -> Option<f32> {
    let f = i as f32;
    let d = f as f64;
    if d < TWO_POW_63 && d as i64 == i {
        Some(f)
    } else {
        None
    }
}

fn double_to_float(d: f64) -> Option<f32> {
    if d.is_nan() {
        return Some(f32::NAN);
    }
    let f = d as f32;
    if f as f64 == d {
        Some(f)
    } else {
        None
    }
}

fn big_to_double(b: &BigInt) -> Option<f64> {
    let d = b.to_f64()?;
    if !d.is_finite() {
        return None;
    }
    match BigInt::from_f64(d) {
        Some(back) if &back == b => Some(d),
        _ => None,
    }
}

// ============================================================================
// Value-level helpers used by the dispatcher
// ============================================================================

/// Whether a primitive interop value is a number
#[inline]
pub fn is_number(value: &InteropValue) -> bool {
    Number::of(value).is_some()
}

macro_rules! value_conversions {
    ($($as_fn:ident / $fits_fn:ident => $method:ident -> $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Exact `", stringify!($ty), "` value of a primitive number")]
            #[inline]
            pub fn $as_fn(value: &InteropValue) -> Option<$ty> {
                Number::of(value).and_then(Number::$method)
            }

            #[doc = concat!("Whether a primitive number converts exactly to `", stringify!($ty), "`")]
            #[inline]
            pub fn $fits_fn(value: &InteropValue) -> bool {
                $as_fn(value).is_some()
            }
        )*
    };
}

value_conversions! {
    as_byte / fits_in_byte => to_byte -> i8,
    as_short / fits_in_short => to_short -> i16,
    as_int / fits_in_int => to_int -> i32,
    as_long / fits_in_long => to_long -> i64,
    as_float / fits_in_float => to_float -> f32,
    as_double / fits_in_double => to_double -> f64,
    as_big_integer / fits_in_big_integer => to_big_integer -> BigInt,
}
