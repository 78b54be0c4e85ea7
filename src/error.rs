//! Defines error and its location
use std::fmt;

use saphyr_parser::ScanError;

use crate::budget::BudgetBreach;
use crate::location::Location;

/// Error returned by every conversion entry point.
///
/// All failures are fatal to the current call: the first one aborts the conversion
/// and no partial value is produced.
#[derive(Debug)]
pub enum Error {
    /// Free-form structural error with optional source location.
    Message {
        msg: String,
        location: Location,
    },
    /// The YAML parser rejected the input.
    Scan {
        msg: String,
        location: Location,
    },
    /// Alias references an anchor the parser never defined.
    UnknownAnchor {
        id: usize,
        location: Location,
    },
    /// A single-document entry point received a stream with several documents.
    MultipleDocuments {
        documents: usize,
    },
    /// A document node does not wrap exactly one child.
    InvalidDocument {
        children: usize,
        location: Location,
    },
    /// A node without a kind that still carries a tag or an anchor.
    UnknownNodeKind {
        location: Location,
    },
    /// An alias points at an anchor that is currently being expanded.
    RecursiveAnchor {
        anchor: String,
        location: Location,
    },
    /// Nested alias expansion went deeper than [`crate::AliasLimits::max_alias_depth`].
    AliasDepth {
        depth: usize,
        location: Location,
    },
    /// Containers and aliases nested deeper than [`crate::AliasLimits::max_nesting_depth`]
    /// while converting.
    NestingDepth {
        depth: usize,
        location: Location,
    },
    /// Values produced by alias expansion exceed the allowed share of the document.
    ExcessiveAliasing {
        decodes: usize,
        alias_decodes: usize,
        location: Location,
    },
    /// The value of a `<<` merge key is not a mapping or a sequence of mappings.
    MergeNotMapping {
        location: Location,
    },
    /// The key-marshal function failed for a non-string key.
    KeyMarshal {
        msg: String,
        location: Location,
    },
    /// A scalar could not be decoded into a primitive.
    ScalarDecode {
        msg: String,
        location: Location,
    },
    /// A scalar carries a tag that describes a container.
    UnexpectedType {
        tag: String,
        location: Location,
    },
    /// Two explicit entries of one mapping resolve to the same key.
    DuplicateKey {
        key: String,
        location: Location,
    },
    /// A YAML budget limit was exceeded.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
    /// Unexpected I/O error. This may happen only when reading from a reader or writing output.
    IOError {
        cause: std::io::Error,
    },
    /// JSON text could not be produced or the input is not valid JSON.
    Json {
        cause: serde_json::Error,
    },
    /// Wrap an error with a rendered excerpt of the input text.
    #[cfg(feature = "snippets")]
    WithSnippet {
        /// Pre-rendered snippet output for display. The input text itself is not retained.
        text: String,
        error: Box<Error>,
    },
}

impl Error {
    /// Construct a `Message` error with no known location.
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn scalar_decode<S: Into<String>>(s: S) -> Self {
        Error::ScalarDecode {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unexpected_type(tag: &str) -> Self {
        Error::UnexpectedType {
            tag: tag.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn merge_not_mapping() -> Self {
        Error::MergeNotMapping {
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unknown_anchor(id: usize) -> Self {
        Error::UnknownAnchor {
            id,
            location: Location::UNKNOWN,
        }
    }

    /// Attach/override a concrete location to this error and return it.
    ///
    /// Arguments:
    /// - `set_location`: location to store in the error.
    ///
    /// Returns:
    /// - The same `Error` with location updated. Unknown locations never overwrite known ones.
    ///
    /// Called by:
    /// - The composer and the converter once the offending node is known.
    pub(crate) fn with_location(mut self, set_location: Location) -> Self {
        if !set_location.is_known() {
            return self;
        }
        match &mut self {
            Error::Message { location, .. }
            | Error::Scan { location, .. }
            | Error::UnknownAnchor { location, .. }
            | Error::InvalidDocument { location, .. }
            | Error::UnknownNodeKind { location }
            | Error::RecursiveAnchor { location, .. }
            | Error::AliasDepth { location, .. }
            | Error::NestingDepth { location, .. }
            | Error::ExcessiveAliasing { location, .. }
            | Error::MergeNotMapping { location }
            | Error::KeyMarshal { location, .. }
            | Error::ScalarDecode { location, .. }
            | Error::UnexpectedType { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::Budget { location, .. } => {
                *location = set_location;
            }
            Error::MultipleDocuments { .. } | Error::IOError { .. } | Error::Json { .. } => {}
            #[cfg(feature = "snippets")]
            Error::WithSnippet { .. } => {}
        }
        self
    }

    /// If the error has a known location, return it.
    pub fn location(&self) -> Option<Location> {
        let location = match self {
            Error::Message { location, .. }
            | Error::Scan { location, .. }
            | Error::UnknownAnchor { location, .. }
            | Error::InvalidDocument { location, .. }
            | Error::UnknownNodeKind { location }
            | Error::RecursiveAnchor { location, .. }
            | Error::AliasDepth { location, .. }
            | Error::NestingDepth { location, .. }
            | Error::ExcessiveAliasing { location, .. }
            | Error::MergeNotMapping { location }
            | Error::KeyMarshal { location, .. }
            | Error::ScalarDecode { location, .. }
            | Error::UnexpectedType { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::Budget { location, .. } => *location,
            Error::MultipleDocuments { .. } | Error::IOError { .. } | Error::Json { .. } => {
                return None;
            }
            #[cfg(feature = "snippets")]
            Error::WithSnippet { error, .. } => return error.location(),
        };
        location.is_known().then_some(location)
    }

    /// The underlying error, looking through a snippet wrapper if present.
    pub fn inner(&self) -> &Error {
        match self {
            #[cfg(feature = "snippets")]
            Error::WithSnippet { error, .. } => error.inner(),
            other => other,
        }
    }

    /// Map a `saphyr_parser::ScanError` into our error type with location.
    pub(crate) fn from_scan_error(err: ScanError) -> Self {
        let mark = err.marker();
        Error::Scan {
            msg: err.info().to_owned(),
            location: Location::new(mark.line(), mark.col() + 1),
        }
    }

    /// The error message without the location suffix.
    fn message(&self) -> String {
        match self {
            Error::Message { msg, .. } | Error::Scan { msg, .. } => msg.clone(),
            Error::UnknownAnchor { id, .. } => format!("alias references unknown anchor id {id}"),
            Error::MultipleDocuments { documents } => {
                format!("expected a single YAML document, found {documents}; use from_multiple")
            }
            Error::InvalidDocument { .. } => "invalid document".to_owned(),
            Error::UnknownNodeKind { .. } => "cannot decode node with unknown kind".to_owned(),
            Error::RecursiveAnchor { anchor, .. } => format!("anchor '{anchor}' value contains itself"),
            Error::AliasDepth { depth, .. } => {
                format!("alias expansion nested too deeply (depth {depth})")
            }
            Error::NestingDepth { depth, .. } => {
                format!("value nested too deeply (depth {depth})")
            }
            Error::ExcessiveAliasing {
                decodes,
                alias_decodes,
                ..
            } => format!(
                "document contains excessive aliasing ({alias_decodes} of {decodes} values came from aliases)"
            ),
            Error::MergeNotMapping { .. } => {
                "map merge requires map or sequence of maps as the value".to_owned()
            }
            Error::KeyMarshal { msg, .. } => format!("cannot marshal mapping key: {msg}"),
            Error::ScalarDecode { msg, .. } => format!("scalar decode error: {msg}"),
            Error::UnexpectedType { tag, .. } => format!("unexpected type: scalar tagged {tag}"),
            Error::DuplicateKey { key, .. } => format!("duplicate mapping key: {key}"),
            Error::Budget { breach, .. } => format!("YAML budget breached: {breach:?}"),
            Error::IOError { cause } => format!("IO error: {cause}"),
            Error::Json { cause } => format!("JSON error: {cause}"),
            #[cfg(feature = "snippets")]
            Error::WithSnippet { error, .. } => error.message(),
        }
    }

    /// Re-render this error with an excerpt of `text` around its location.
    ///
    /// Errors without a location are returned unchanged. Nested wrappers are not created.
    #[cfg(feature = "snippets")]
    pub(crate) fn with_snippet(self, text: &str, path: &str, crop_radius: usize) -> Self {
        let inner = match self {
            Error::WithSnippet { error, .. } => *error,
            other => other,
        };
        let Some(location) = inner.location() else {
            return inner;
        };
        match crate::snippet::render(text, path, &inner.message(), &location, crop_radius) {
            Some(rendered) => Error::WithSnippet {
                text: rendered,
                error: Box::new(inner),
            },
            None => inner,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "snippets")]
            Error::WithSnippet { text, .. } => f.write_str(text),
            other => match other.location() {
                Some(location) => fmt_with_location(f, &other.message(), &location),
                None => f.write_str(&other.message()),
            },
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError { cause } => Some(cause),
            Error::Json { cause } => Some(cause),
            #[cfg(feature = "snippets")]
            Error::WithSnippet { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(cause: std::io::Error) -> Self {
        Error::IOError { cause }
    }
}

impl From<serde_json::Error> for Error {
    fn from(cause: serde_json::Error) -> Self {
        Error::Json { cause }
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: &Location) -> fmt::Result {
    if location.is_known() {
        write!(
            f,
            "{msg} at line {}, column {}",
            location.line, location.column
        )
    } else {
        write!(f, "{msg}")
    }
}

/// Convert a budget breach into a user-facing error.
pub(crate) fn budget_error(breach: BudgetBreach) -> Error {
    Error::Budget {
        breach,
        location: Location::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_includes_location_when_known() {
        let err = Error::merge_not_mapping().with_location(Location::new(4, 3));
        assert_eq!(
            err.to_string(),
            "map merge requires map or sequence of maps as the value at line 4, column 3"
        );
        assert_eq!(err.location(), Some(Location::new(4, 3)));
    }

    #[test]
    fn unknown_location_does_not_overwrite_known_one() {
        let err = Error::msg("boom")
            .with_location(Location::new(1, 2))
            .with_location(Location::UNKNOWN);
        assert_eq!(err.location(), Some(Location::new(1, 2)));
    }

    #[test]
    fn locationless_variants_report_none() {
        let err = Error::MultipleDocuments { documents: 2 };
        assert!(err.location().is_none());
        assert!(err.to_string().contains("found 2"));
    }
}
