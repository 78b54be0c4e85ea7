//! Leaf value normalization: decoded scalars become [`Value`]s and non-finite floats
//! are replaced by the configured sentinels.

use crate::options::Options;
use crate::parse_scalars::Scalar;
use crate::value::{Number, Value};

/// Replace NaN and the infinities by [`Options::nan`], [`Options::pos_inf`] and
/// [`Options::neg_inf`] when those are set. Finite floats, and non-finite ones without a
/// configured sentinel, pass through unchanged.
///
/// ```rust
/// use saphyr_json::{Options, Value, normalize_float};
///
/// let options = Options::default().with_json_float_sentinels();
/// assert_eq!(normalize_float(f64::NAN, &options), Value::Null);
/// assert_eq!(normalize_float(f64::INFINITY, &options), Value::from(f64::MAX));
/// assert_eq!(normalize_float(2.5, &options), Value::from(2.5));
/// ```
pub fn normalize_float(f: f64, options: &Options) -> Value {
    let sentinel = if f.is_nan() {
        &options.nan
    } else if f == f64::INFINITY {
        &options.pos_inf
    } else if f == f64::NEG_INFINITY {
        &options.neg_inf
    } else {
        return Value::Number(Number::Float(f));
    };
    match sentinel {
        Some(value) => value.clone(),
        None => Value::Number(Number::Float(f)),
    }
}

pub(crate) fn scalar_to_value(scalar: Scalar, options: &Options) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(b),
        Scalar::Int(i) => Value::Number(Number::Int(i)),
        Scalar::UInt(u) => Value::Number(Number::UInt(u)),
        Scalar::Float(f) => normalize_float(f, options),
        Scalar::Str(s) => Value::String(s),
    }
}
