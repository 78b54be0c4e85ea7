//! Rustc-like rendering of located errors with an excerpt of the YAML input.

use annotate_snippets::{
    AnnotationKind, Level, Renderer, Snippet as AnnotateSnippet, renderer::DecorStyle,
};

use crate::location::Location;

/// Render `msg` against a window of `text` around `location`: two lines before and two
/// after, each line cropped to `crop_radius` columns on either side of the error column.
///
/// Returns `None` when the location does not fall inside `text`.
#[cold]
#[inline(never)]
pub(crate) fn render(text: &str, path: &str, msg: &str, location: &Location, crop_radius: usize) -> Option<String> {
    if !location.is_known() {
        return None;
    }
    // Keep coordinates aligned with the parser, which ignores a leading BOM.
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

    let row = location.line as usize;
    let col = location.column as usize;
    let starts = line_starts(text);
    if row == 0 || row > starts.len() {
        return None;
    }

    let total_lines = starts.len();
    let first_row = row.saturating_sub(2).max(1);
    let last_row = row.saturating_add(2).min(total_lines);

    let mut window = String::new();
    let mut span = 0..0;
    for current in first_row..=last_row {
        let line = line_text(text, &starts, current);
        let (shown, offset) = crop_line(line, col, crop_radius);
        if current == row {
            let caret = col_to_byte(line, col).map_or(shown.len(), |b| b.saturating_sub(offset.0) + offset.1);
            let caret = caret.min(shown.len());
            let end = shown[caret..]
                .chars()
                .next()
                .map_or(caret, |c| caret + c.len_utf8());
            span = window.len() + caret..window.len() + end;
        }
        window.push_str(&sanitize(&shown));
        if current != last_row {
            window.push('\n');
        }
    }

    let report = &[Level::ERROR
        .primary_title(format!("line {row} column {col}: {msg}"))
        .element(
            AnnotateSnippet::source(&window)
                .line_start(first_row)
                .path(path)
                .fold(false)
                .annotation(AnnotationKind::Primary.span(span).label(msg)),
        )];

    // Plain ASCII output keeps error strings stable and free of escape sequences.
    let renderer = Renderer::plain().decor_style(DecorStyle::Ascii);
    Some(renderer.render(report).to_string())
}

/// Byte offsets of every line start. A trailing newline opens one more (empty) line.
fn line_starts(source: &str) -> Vec<usize> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0usize];
    starts.extend(
        source
            .bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

/// Text of 1-based `row` without its line terminator.
fn line_text<'t>(source: &'t str, starts: &[usize], row: usize) -> &'t str {
    let start = starts[row - 1];
    let end = starts.get(row).map_or(source.len(), |next| next - 1);
    let line = &source[start..end];
    line.strip_suffix('\r').unwrap_or(line)
}

/// Byte offset of 1-based character column `col` in `line`; `len + 1` points at EOL.
fn col_to_byte(line: &str, col: usize) -> Option<usize> {
    if col == 0 {
        return None;
    }
    line.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line.len()))
        .nth(col - 1)
}

/// Crop `line` to `radius` columns around `col`, marking clipped ends with `…`.
///
/// Returns the shown text plus `(first kept byte, bytes of the left marker)` so byte
/// offsets into `line` can be rebased.
fn crop_line(line: &str, col: usize, radius: usize) -> (String, (usize, usize)) {
    let len = line.chars().count();
    let left = col.saturating_sub(radius).max(1);
    let right = col.saturating_add(radius);
    if radius == 0 || (left <= 1 && right >= len) || left > len {
        return (line.to_owned(), (0, 0));
    }
    let start = col_to_byte(line, left).unwrap_or(0);
    let end = col_to_byte(line, right.saturating_add(1)).unwrap_or(line.len());
    let mut out = String::with_capacity(end - start + 6);
    let mut marker = 0;
    if start > 0 {
        out.push('…');
        marker = '…'.len_utf8();
    }
    out.push_str(&line[start..end]);
    if end < line.len() {
        out.push('…');
    }
    (out, (start, marker))
}

/// Replace control characters (except tab) so the excerpt cannot drive the terminal.
/// Every replacement keeps the byte length, so spans stay valid.
fn sanitize(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\t' => c,
            c if (c as u32) < 0x20 || c as u32 == 0x7F => ' ',
            '\u{80}'..='\u{9F}' => '\u{A0}',
            c => c,
        })
        .collect()
}
