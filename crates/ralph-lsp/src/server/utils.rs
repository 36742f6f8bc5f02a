//! Offset / line-column conversions between the core's byte ranges and
//! LSP positions.

use lsp_types::{Position, Range};
use ralph_analyzer::SourceIndex;

/// Convert a byte offset in `code` to an LSP position.
pub fn offset_to_position(code: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut character = 0u32;
    for (i, ch) in code.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += 1;
        }
    }
    Position { line, character }
}

/// Convert an LSP position to a byte offset in `code`. Positions past the
/// end of a line or of the file clamp.
pub fn position_to_offset(code: &str, position: Position) -> usize {
    let mut offset = 0usize;
    for (n, line) in code.split('\n').enumerate() {
        if n as u32 == position.line {
            let within = line
                .char_indices()
                .nth(position.character as usize)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            return offset + within;
        }
        offset += line.len() + 1;
    }
    code.len()
}

/// Convert a `SourceIndex` to an LSP range using the text it points into.
pub fn index_to_range(code: &str, index: &SourceIndex) -> Range {
    Range {
        start: offset_to_position(code, index.offset),
        end: offset_to_position(code, index.end()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_offset_to_position() {
        let code = "line one\nline two\nline three";
        assert_eq!(offset_to_position(code, 0), Position { line: 0, character: 0 });
        assert_eq!(offset_to_position(code, 5), Position { line: 0, character: 5 });
        // First character after the newline.
        assert_eq!(offset_to_position(code, 9), Position { line: 1, character: 0 });
        assert_eq!(offset_to_position(code, 14), Position { line: 1, character: 5 });
    }

    #[test]
    fn test_position_to_offset_round_trip() {
        let code = "Contract A() {\n  fn f() -> () { }\n}";
        for offset in [0, 5, 15, 20, code.len() - 1] {
            let position = offset_to_position(code, offset);
            assert_eq!(position_to_offset(code, position), offset);
        }
    }

    #[test]
    fn test_position_past_the_end_clamps() {
        let code = "short";
        assert_eq!(position_to_offset(code, Position { line: 0, character: 99 }), 5);
        assert_eq!(position_to_offset(code, Position { line: 9, character: 0 }), 5);
    }

    #[test]
    fn test_index_to_range() {
        let code = "let x = 1\nlet y = x";
        let uri = Url::parse("file:///w/contracts/a.ral").unwrap();
        let index = SourceIndex::new(code.rfind('x').unwrap(), 1, uri);
        let range = index_to_range(code, &index);
        assert_eq!(range.start, Position { line: 1, character: 8 });
        assert_eq!(range.end, Position { line: 1, character: 9 });
    }
}
