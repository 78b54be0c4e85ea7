//! Source location utilities.

use saphyr_parser::Span as ParserSpan;

/// Row/column location within the source YAML document (1-indexed, character-based).
///
/// Nodes built by the composer carry the location of the parser event that produced
/// them. Nodes built by hand through [`crate::TreeBuilder`] use [`Location::UNKNOWN`]
/// unless the caller sets one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// 1-indexed line number in the input stream.
    pub(crate) line: u32,
    /// 1-indexed column number in the input stream.
    pub(crate) column: u32,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    pub const UNKNOWN: Self = Self { line: 0, column: 0 };

    /// Create a new location record.
    ///
    /// Arguments:
    /// - `line`: 1-indexed line.
    /// - `column`: 1-indexed column.
    pub const fn new(line: usize, column: usize) -> Self {
        // 4 Gb is larger than any YAML document I can imagine, and also this is
        // error reporting only.
        Self {
            line: line as u32,
            column: column as u32,
        }
    }

    /// 1-indexed line, `0` when unknown.
    #[inline]
    pub fn line(&self) -> u64 {
        self.line as u64
    }

    /// 1-indexed column, `0` when unknown.
    #[inline]
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        self != &Location::UNKNOWN
    }
}

/// Convert a `saphyr_parser::Span` to a 1-indexed [`Location`].
///
/// Called by:
/// - The composer for each raw parser event.
pub(crate) fn location_from_span(span: &ParserSpan) -> Location {
    let start = &span.start;
    Location::new(start.line(), start.col() + 1)
}
