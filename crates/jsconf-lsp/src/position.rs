//! Byte offsets to LSP positions and back. LSP columns count UTF-16 code
//! units.

use jsconf_tree::Span;
use tower_lsp::lsp_types::{Position, Range};

/// Convert a byte offset to an LSP position.
pub fn offset_to_position(content: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut col = 0u32;

    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += ch.len_utf16() as u32;
        }
    }

    Position::new(line, col)
}

/// Convert an LSP position to a byte offset. Positions past the end of a
/// line clamp to the line end.
pub fn position_to_offset(content: &str, position: Position) -> usize {
    let mut current_line = 0u32;
    let mut current_col = 0u32;

    for (i, ch) in content.char_indices() {
        if current_line == position.line && current_col >= position.character {
            return i;
        }
        if ch == '\n' {
            if current_line == position.line {
                return i;
            }
            current_line += 1;
            current_col = 0;
        } else {
            current_col += ch.len_utf16() as u32;
        }
    }

    content.len()
}

pub fn span_to_range(content: &str, span: Span) -> Range {
    Range {
        start: offset_to_position(content, span.start as usize),
        end: offset_to_position(content, span.end as usize),
    }
}
