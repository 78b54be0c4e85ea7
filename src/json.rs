//! JSON text output for converted values.

use std::io;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter, Serializer};

use crate::error::Error;
use crate::value::Value;

/// How JSON text is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Indent with two spaces, one entry per line.
    pub pretty: bool,
    /// Write `<`, `>` and `&` inside strings as `\u003c`, `\u003e` and `\u0026`, so the
    /// output can be embedded in HTML.
    pub escape_html: bool,
}

/// Compact JSON text. Mapping keys keep their YAML order.
///
/// Fails if `value` still holds a NaN or infinite float.
pub fn to_string(value: &Value) -> Result<String, Error> {
    to_string_with_options(value, &JsonOptions::default())
}

pub fn to_string_pretty(value: &Value) -> Result<String, Error> {
    to_string_with_options(
        value,
        &JsonOptions {
            pretty: true,
            ..JsonOptions::default()
        },
    )
}

/// ```rust
/// use saphyr_json::{JsonOptions, Value, to_string_with_options};
///
/// let value = Value::from("<b>&</b>");
/// let json = to_string_with_options(&value, &JsonOptions { escape_html: true, ..JsonOptions::default() }).unwrap();
/// assert_eq!(json, r#""\u003cb\u003e\u0026\u003c/b\u003e""#);
/// ```
pub fn to_string_with_options(value: &Value, options: &JsonOptions) -> Result<String, Error> {
    let mut out = Vec::with_capacity(128);
    to_writer_with_options(&mut out, value, options)?;
    // serde_json only ever writes UTF-8.
    String::from_utf8(out).map_err(|err| Error::msg(err.to_string()))
}

pub fn to_writer_with_options<W: io::Write>(
    writer: W,
    value: &Value,
    options: &JsonOptions,
) -> Result<(), Error> {
    match (options.pretty, options.escape_html) {
        (false, false) => serde_json::to_writer(writer, value)?,
        (true, false) => serde_json::to_writer_pretty(writer, value)?,
        (false, true) => {
            let mut ser = Serializer::with_formatter(writer, HtmlEscaping(CompactFormatter));
            value.serialize(&mut ser)?;
        }
        (true, true) => {
            let mut ser = Serializer::with_formatter(writer, HtmlEscaping(PrettyFormatter::new()));
            value.serialize(&mut ser)?;
        }
    }
    Ok(())
}

/// Default key marshal: compact JSON text of the converted key.
pub(crate) fn marshal_key(key: &Value) -> Result<String, String> {
    serde_json::to_string(key).map_err(|err| err.to_string())
}

/// Formatter wrapper that escapes HTML-significant characters in strings.
struct HtmlEscaping<F>(F);

impl<F: Formatter> Formatter for HtmlEscaping<F> {
    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (i, b) in fragment.bytes().enumerate() {
            let escaped: &[u8] = match b {
                b'<' => b"\\u003c",
                b'>' => b"\\u003e",
                b'&' => b"\\u0026",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[start..i])?;
            writer.write_all(escaped)?;
            start = i + 1;
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}
