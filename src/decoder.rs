//! Text entry points: YAML (or JSON) text in, [`Value`] out.

use std::io::Read;

use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::compose::compose_str;
use crate::error::Error;
use crate::jsonify::jsonify;
use crate::options::{DuplicateKeyPolicy, Options};
use crate::value::Value;

/// Convert a single YAML document.
///
/// An empty stream converts to `null`. A stream with more than one document is an
/// error; use [`from_multiple`] for those.
///
/// ```rust
/// let value = saphyr_json::from_str("name: demo\nports: [80, 443]\n").unwrap();
/// assert_eq!(saphyr_json::to_string(&value).unwrap(), r#"{"name":"demo","ports":[80,443]}"#);
/// ```
pub fn from_str(input: &str) -> Result<Value, Error> {
    from_str_with_options(input, Options::default())
}

pub fn from_str_with_options(input: &str, options: Options) -> Result<Value, Error> {
    single(input, &options).map_err(|err| maybe_with_snippet(err, input, &options))
}

fn single(input: &str, options: &Options) -> Result<Value, Error> {
    let trees = compose_str(input, options)?;
    match trees.as_slice() {
        [] => Ok(Value::Null),
        [tree] => jsonify(tree, options),
        _ => Err(Error::MultipleDocuments {
            documents: trees.len(),
        }),
    }
}

/// Convert every document of a YAML stream.
///
/// ```rust
/// let values = saphyr_json::from_multiple("a: 1\n---\nb: 2\n").unwrap();
/// assert_eq!(values.len(), 2);
/// ```
pub fn from_multiple(input: &str) -> Result<Vec<Value>, Error> {
    from_multiple_with_options(input, Options::default())
}

/// Each document is converted by its own call: alias counters and anchors do not carry
/// over from one document to the next.
pub fn from_multiple_with_options(input: &str, options: Options) -> Result<Vec<Value>, Error> {
    multiple(input, &options).map_err(|err| maybe_with_snippet(err, input, &options))
}

fn multiple(input: &str, options: &Options) -> Result<Vec<Value>, Error> {
    compose_str(input, options)?
        .iter()
        .map(|tree| jsonify(tree, options))
        .collect()
}

/// Convert a single YAML document from UTF-8 bytes.
pub fn from_slice(bytes: &[u8]) -> Result<Value, Error> {
    from_slice_with_options(bytes, Options::default())
}

pub fn from_slice_with_options(bytes: &[u8], options: Options) -> Result<Value, Error> {
    let input = std::str::from_utf8(bytes).map_err(|_| Error::msg("input is not valid UTF-8"))?;
    from_str_with_options(input, options)
}

/// Convert a single YAML document read from `reader`.
///
/// UTF-8 and UTF-16 (with BOM) are detected and decoded; a leading BOM is dropped.
pub fn from_reader<R: Read>(reader: R) -> Result<Value, Error> {
    from_reader_with_options(reader, Options::default())
}

pub fn from_reader_with_options<R: Read>(reader: R, options: Options) -> Result<Value, Error> {
    let input = read_decoded(reader)?;
    from_str_with_options(&input, options)
}

/// Convert every document read from `reader`.
pub fn from_reader_multiple_with_options<R: Read>(reader: R, options: Options) -> Result<Vec<Value>, Error> {
    let input = read_decoded(reader)?;
    from_multiple_with_options(&input, options)
}

fn read_decoded<R: Read>(reader: R) -> Result<String, Error> {
    // Auto-detect encoding (BOM), decode to UTF-8 on the fly.
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(None)
        .build(reader);
    let mut input = String::new();
    decoder.read_to_string(&mut input)?;
    Ok(input)
}

/// Convert JSON text, keeping object key order.
///
/// The text is first validated as JSON, then converted like YAML (JSON is a YAML
/// subset). Duplicate object keys resolve last-wins, and floats that overflow to
/// infinity become `±f64::MAX`.
///
/// ```rust
/// let value = saphyr_json::from_json_str(r#"{"b": 1e999, "a": [true, null]}"#).unwrap();
/// assert_eq!(value.get("b").and_then(|v| v.as_f64()), Some(f64::MAX));
/// let keys: Vec<&str> = value.as_mapping().unwrap().keys().collect();
/// assert_eq!(keys, ["b", "a"]);
/// ```
pub fn from_json_str(json: &str) -> Result<Value, Error> {
    serde_json::from_str::<serde::de::IgnoredAny>(json)?;
    let options = crate::options! {
        duplicate_keys: DuplicateKeyPolicy::LastWins,
        with_snippet: false,
    }
    .with_json_float_sentinels();
    from_str_with_options(json, options)
}

#[cfg(feature = "snippets")]
fn maybe_with_snippet(err: Error, input: &str, options: &Options) -> Error {
    if options.with_snippet && options.crop_radius > 0 {
        err.with_snippet(input, "<input>", options.crop_radius)
    } else {
        err
    }
}

#[cfg(not(feature = "snippets"))]
fn maybe_with_snippet(err: Error, _input: &str, _options: &Options) -> Error {
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_null() {
        assert_eq!(from_str("").unwrap(), Value::Null);
        assert_eq!(from_str("# only a comment\n").unwrap(), Value::Null);
    }

    #[test]
    fn several_documents_need_from_multiple() {
        let err = from_str("a: 1\n---\nb: 2\n").unwrap_err();
        assert!(matches!(err.inner(), Error::MultipleDocuments { documents: 2 }));
        assert_eq!(from_multiple("a: 1\n---\nb: 2\n").unwrap().len(), 2);
    }

    #[test]
    fn invalid_utf8_slice() {
        assert!(from_slice(&[b'a', b':', b' ', 0xff]).is_err());
        assert_eq!(from_slice(b"x: 1").unwrap().get("x"), Some(&Value::from(1i64)));
    }

    #[test]
    fn reader_decodes_utf16() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "k: v\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let value = from_reader(bytes.as_slice()).unwrap();
        assert_eq!(value.get("k"), Some(&Value::from("v")));
    }

    #[test]
    fn json_input_is_validated_first() {
        assert!(matches!(from_json_str("{'a': 1}"), Err(Error::Json { .. })));
        let value = from_json_str(r#"{"a": 1, "a": 2}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Value::from(2i64)));
        let value = from_json_str("-1e999").unwrap();
        assert_eq!(value, Value::from(-f64::MAX));
    }

    #[cfg(feature = "snippets")]
    #[test]
    fn located_errors_carry_a_snippet() {
        let err = from_str("a: !!int nope\n").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("scalar decode error"), "{text}");
        assert!(text.contains("a: !!int nope"), "{text}");
        assert!(matches!(err.inner(), Error::ScalarDecode { .. }));

        let plain = from_str_with_options("a: !!int nope\n", crate::options! { with_snippet: false }).unwrap_err();
        assert!(plain.to_string().starts_with("scalar decode error: invalid int: `nope` at line 1"));
    }
}
