//! Cursor context detection for hover

use crate::host::{KeywordQuery, KeywordQuerySource};
use crate::types::Range;

/// Characters that make up a deck keyword.
fn is_keyword_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Detect the keyword under the cursor.
///
/// Line and column are 1-based; the column counts characters, not bytes.
pub fn detect_keyword(source: &str, line: u32, column: u32) -> Option<KeywordQuery> {
    if line == 0 || column == 0 {
        return None;
    }

    let text = source.lines().nth((line - 1) as usize)?;
    let chars: Vec<char> = text.chars().collect();
    let offset = (column - 1) as usize;

    if offset >= chars.len() || !is_keyword_char(chars[offset]) {
        return None;
    }

    let mut start = offset;
    while start > 0 && is_keyword_char(chars[start - 1]) {
        start -= 1;
    }

    let mut end = offset;
    while end < chars.len() && is_keyword_char(chars[end]) {
        end += 1;
    }

    let word: String = chars[start..end].iter().collect();

    Some(KeywordQuery {
        word,
        line: text.to_string(),
        range: Some(Range {
            start_line: line,
            start_col: start as u32 + 1,
            end_line: line,
            end_col: end as u32 + 1,
        }),
    })
}

/// A cursor position in an in-memory document.
#[derive(Debug, Clone)]
pub struct SourcePosition<'a> {
    pub source: &'a str,
    pub line: u32,
    pub column: u32,
}

impl<'a> SourcePosition<'a> {
    pub fn new(source: &'a str, line: u32, column: u32) -> Self {
        Self {
            source,
            line,
            column,
        }
    }
}

impl KeywordQuerySource for SourcePosition<'_> {
    fn query(&self) -> Option<KeywordQuery> {
        detect_keyword(self.source, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_keyword_with_star() {
        let source = "*WELL 1 'PRODUCER'\n*OPERATE *MAX *STO 500.0";
        let query = detect_keyword(source, 1, 3).unwrap();
        assert_eq!(query.word, "WELL");
        assert_eq!(query.line, "*WELL 1 'PRODUCER'");

        let range = query.range.unwrap();
        assert_eq!(range.start_col, 2);
        assert_eq!(range.end_col, 6);
    }

    #[test]
    fn test_detect_keyword_second_line() {
        let source = "*WELL 1\n*OPERATE *MAX *STO 500.0";
        let query = detect_keyword(source, 2, 12).unwrap();
        assert_eq!(query.word, "MAX");
    }

    #[test]
    fn test_detect_on_separator() {
        let source = "*WELL 1";
        assert!(detect_keyword(source, 1, 1).is_none());
        assert!(detect_keyword(source, 1, 6).is_none());
    }

    #[test]
    fn test_detect_out_of_range() {
        let source = "*WELL";
        assert!(detect_keyword(source, 3, 1).is_none());
        assert!(detect_keyword(source, 1, 40).is_none());
        assert!(detect_keyword(source, 0, 1).is_none());
    }

    #[test]
    fn test_source_position_query() {
        let position = SourcePosition::new("*PTUBE1", 1, 4);
        assert_eq!(position.query().unwrap().word, "PTUBE1");
    }
}
