//! Scalar resolution: turning scalar text, style and tag into a primitive.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::error::Error;
use crate::node::ScalarStyle;
use crate::tags::{YamlTag, short_tag};

/// A decoded scalar before float normalization.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

/// Scalar resolution switches taken from [`crate::Options`].
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScalarConfig {
    /// Only `true`/`false` (and their capitalized forms) are booleans.
    pub(crate) strict_booleans: bool,
    /// `0`-prefixed integers such as `0755` are octal.
    pub(crate) legacy_octal_numbers: bool,
}

/// Decode one scalar node.
///
/// Untagged non-plain scalars are always strings. Untagged plain scalars are resolved
/// in the order null, bool, int, float, string. Explicit core tags force a type and fail
/// when the text does not fit it.
pub(crate) fn resolve_scalar(
    value: &str,
    style: ScalarStyle,
    tag: Option<&str>,
    cfg: ScalarConfig,
) -> Result<Scalar, Error> {
    match YamlTag::classify(tag) {
        YamlTag::None if style != ScalarStyle::Plain => Ok(Scalar::Str(value.to_owned())),
        YamlTag::None => Ok(resolve_plain(value, cfg)),
        YamlTag::NonSpecific
        | YamlTag::Str
        | YamlTag::Timestamp
        | YamlTag::Merge
        | YamlTag::Other => Ok(Scalar::Str(value.to_owned())),
        YamlTag::Null => Ok(Scalar::Null),
        YamlTag::Bool => parse_bool(value, cfg.strict_booleans)
            .map(Scalar::Bool)
            .ok_or_else(|| Error::scalar_decode(format!("invalid bool: `{value}`"))),
        YamlTag::Int => parse_int(value, cfg.legacy_octal_numbers)
            .ok_or_else(|| Error::scalar_decode(format!("invalid int: `{value}`"))),
        YamlTag::Float => parse_float(value)
            .or_else(|| parse_integer(value, cfg.legacy_octal_numbers).map(|i| i as f64))
            .map(Scalar::Float)
            .ok_or_else(|| Error::scalar_decode(format!("invalid float: `{value}`"))),
        YamlTag::Binary => decode_binary(value).map(Scalar::Str),
        YamlTag::Seq | YamlTag::Map => Err(Error::unexpected_type(&short_tag(
            tag.unwrap_or_default(),
        ))),
    }
}

fn resolve_plain(value: &str, cfg: ScalarConfig) -> Scalar {
    if scalar_is_nullish(value) {
        return Scalar::Null;
    }
    if let Some(b) = parse_bool(value, cfg.strict_booleans) {
        return Scalar::Bool(b);
    }
    if let Some(int) = parse_int(value, cfg.legacy_octal_numbers) {
        return int;
    }
    if let Some(f) = parse_float(value) {
        return Scalar::Float(f);
    }
    Scalar::Str(value.to_owned())
}

pub(crate) fn scalar_is_nullish(value: &str) -> bool {
    matches!(value, "" | "~" | "null" | "Null" | "NULL")
}

/// YAML 1.2 core booleans when `strict`, otherwise the YAML 1.1 forms too. Strict mode
/// keeps `no` (the "Norway problem") a string.
///
/// Non-strict TRUE literals (case-insensitive): "y", "yes", "true", "on"
/// Non-strict FALSE literals (case-insensitive): "n", "no", "false", "off"
pub(crate) fn parse_bool(s: &str, strict: bool) -> Option<bool> {
    if strict {
        return match s {
            "true" | "True" | "TRUE" => Some(true),
            "false" | "False" | "FALSE" => Some(false),
            _ => None,
        };
    }
    let t = s.trim();
    if t.eq_ignore_ascii_case("true")
        || t.eq_ignore_ascii_case("yes")
        || t.eq_ignore_ascii_case("y")
        || t.eq_ignore_ascii_case("on")
    {
        Some(true)
    } else if t.eq_ignore_ascii_case("false")
        || t.eq_ignore_ascii_case("no")
        || t.eq_ignore_ascii_case("n")
        || t.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        None
    }
}

/// Integer in the narrowest JSON-friendly width: `i64`, then `u64`.
fn parse_int(s: &str, legacy_octal: bool) -> Option<Scalar> {
    let val = parse_integer(s, legacy_octal)?;
    if let Ok(i) = i64::try_from(val) {
        Some(Scalar::Int(i))
    } else {
        u64::try_from(val).ok().map(Scalar::UInt)
    }
}

fn parse_integer(s: &str, legacy_octal: bool) -> Option<i128> {
    let t = s.trim();
    let (neg, rest) = match t.strip_prefix('+') {
        Some(r) => (false, r),
        None => match t.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, t),
        },
    };

    // Detect base
    let (radix, digits) = if let Some(r) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16u32, r)
    } else if let Some(r) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8u32, r)
    } else if let Some(r) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2u32, r)
    } else if legacy_octal && rest.len() > 1 && rest.starts_with('0') {
        (8u32, &rest[1..])
    } else {
        (10u32, rest)
    };

    let mag: i128 = parse_digits_u128(digits, radix)?.try_into().ok()?;
    if neg { mag.checked_neg() } else { Some(mag) }
}

fn parse_digits_u128(digits: &str, radix: u32) -> Option<u128> {
    let mut val: u128 = 0;
    let mut saw = false;
    for b in digits.as_bytes() {
        let d = match *b {
            b'_' => continue,
            b'0'..=b'9' => (b - b'0') as u32,
            b'a'..=b'f' => 10 + (b - b'a') as u32,
            b'A'..=b'F' => 10 + (b - b'A') as u32,
            _ => return None,
        };
        if d >= radix {
            return None;
        }
        val = val.checked_mul(radix as u128)?;
        val = val.checked_add(d as u128)?;
        saw = true;
    }
    if saw { Some(val) } else { None }
}

/// YAML 1.2 float: `.nan`, `.inf`, `-.inf` (any case), or the decimal/exponent form.
pub(crate) fn parse_float(s: &str) -> Option<f64> {
    let t = s.trim();
    let lower = t.to_ascii_lowercase();
    match lower.as_str() {
        ".nan" | "+.nan" | "-.nan" => Some(f64::NAN),
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        _ if looks_like_float(t) => t.parse::<f64>().ok(),
        _ => None,
    }
}

/// `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`
///
/// Rust's `f64::from_str` also accepts `inf`, `NaN` and `infinity`, which must stay strings.
fn looks_like_float(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if int_digits == 0 && i == frac_start {
            return false;
        }
    } else if int_digits == 0 {
        return false;
    }
    if i < b.len() && matches!(b[i], b'e' | b'E') {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == b.len()
}

/// Decode a YAML !!binary scalar (may contain newlines or spaces) into text.
///
/// JSON has no byte strings; invalid UTF-8 is replaced rather than rejected.
fn decode_binary(s: &str) -> Result<String, Error> {
    // YAML allows ASCII whitespace inside the base64 text.
    let cleaned: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let bytes = B64
        .decode(&cleaned)
        .map_err(|err| Error::scalar_decode(format!("invalid !!binary base64: {err}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
