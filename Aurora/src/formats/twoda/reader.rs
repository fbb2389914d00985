//! 2DA parsing

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Cell, TwoDaTable};
use crate::error::{Error, Result};
use crate::formats::common::decode_cp1252;

/// A data row whose cell count does not match the column count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoDaRowError {
    /// 1-based line number.
    pub line: usize,
    pub expected: usize,
    pub found: usize,
}

impl From<TwoDaRowError> for Error {
    fn from(err: TwoDaRowError) -> Self {
        Error::TwoDaMalformedRow {
            line: err.line,
            expected: err.expected,
            found: err.found,
        }
    }
}

/// Read a 2DA file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid 2DA.
pub fn read_2da<P: AsRef<Path>>(path: P) -> Result<TwoDaTable> {
    let data = std::fs::read(path)?;
    parse_2da_bytes(&data)
}

/// Parse a 2DA, failing on the first malformed row
///
/// # Errors
/// Returns [`Error::InvalidTwoDaHeader`], [`Error::TwoDaMissingColumns`] or
/// [`Error::TwoDaMalformedRow`].
pub fn parse_2da_bytes(data: &[u8]) -> Result<TwoDaTable> {
    let (table, errors) = parse(data, true)?;
    match errors.into_iter().next() {
        Some(err) => Err(err.into()),
        None => Ok(table),
    }
}

/// Parse a 2DA, repairing malformed rows
///
/// Short rows are padded with empty cells and long rows truncated; each
/// repaired row is reported.
///
/// # Errors
/// Returns [`Error::InvalidTwoDaHeader`] or [`Error::TwoDaMissingColumns`].
pub fn parse_2da_bytes_lenient(data: &[u8]) -> Result<(TwoDaTable, Vec<TwoDaRowError>)> {
    parse(data, false)
}

fn parse(data: &[u8], stop_on_error: bool) -> Result<(TwoDaTable, Vec<TwoDaRowError>)> {
    let text = decode_cp1252(data);
    let mut lines = text.lines().enumerate();

    let header = lines.next().map(|(_, l)| l).unwrap_or_default();
    let header_tokens = tokenize(header);
    if header_tokens.len() < 2 || header_tokens[0] != "2DA" || header_tokens[1] != "V2.0" {
        return Err(Error::InvalidTwoDaHeader(header.trim().to_string()));
    }

    let mut default = None;
    let mut table = None;
    for (_, line) in lines.by_ref() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(value) = strip_default_prefix(trimmed) {
            default = tokenize(value).into_iter().next();
            continue;
        }
        table = Some(TwoDaTable::new(tokenize(trimmed)));
        break;
    }
    let mut table = table.ok_or(Error::TwoDaMissingColumns)?;
    table.default = default;

    let expected = table.column_count();
    let mut errors = Vec::new();
    for (index, line) in lines {
        let mut tokens = tokenize(line).into_iter();
        let Some(label) = tokens.next() else {
            continue;
        };
        let cells: Vec<Cell> = tokens.map(|t| Cell::from_token(&t)).collect();
        if cells.len() != expected {
            errors.push(TwoDaRowError {
                line: index + 1,
                expected,
                found: cells.len(),
            });
            if stop_on_error {
                break;
            }
        }
        table.push_row(label, cells);
    }

    if !errors.is_empty() {
        tracing::debug!("2DA: {} malformed row(s)", errors.len());
    }
    Ok((table, errors))
}

fn strip_default_prefix(line: &str) -> Option<&str> {
    let prefix = line.get(..8)?;
    prefix
        .eq_ignore_ascii_case("DEFAULT:")
        .then(|| &line[8..])
}

/// Split on whitespace; a double-quoted run is one token without its quotes.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                token.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "2DA V2.0\r\n\r\n      Label      Name   Icon\r\n0     Fighter    123    \"ic fighter\"\r\n1     ****       DEFAULT ****\r\n";

    #[test]
    fn test_parse_sample() {
        let table = parse_2da_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Label", "Name", "Icon"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(0, "icon"), Some("ic fighter"));
        assert_eq!(table.get(1, "Label"), Some(&Cell::Empty));
        assert_eq!(table.get(1, "Name"), Some(&Cell::Default));
        assert_eq!(table.default, None);
    }

    #[test]
    fn test_default_line() {
        let data = b"2DA\tV2.0\nDEFAULT: 5\nA B\n0 1 DEFAULT\n";
        let table = parse_2da_bytes(data).unwrap();
        assert_eq!(table.default.as_deref(), Some("5"));
        assert_eq!(table.resolve(0, "b"), Some("5"));
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            parse_2da_bytes(b"2DA V1.0\nA\n"),
            Err(Error::InvalidTwoDaHeader(_))
        ));
        assert!(matches!(parse_2da_bytes(b""), Err(Error::InvalidTwoDaHeader(_))));
        assert!(matches!(
            parse_2da_bytes(b"2DA V2.0\n\n"),
            Err(Error::TwoDaMissingColumns)
        ));
    }

    #[test]
    fn test_strict_rejects_short_row() {
        let data = b"2DA V2.0\n\nA B C\n0 1 2 3\n1 1\n";
        assert!(matches!(
            parse_2da_bytes(data),
            Err(Error::TwoDaMalformedRow { line: 5, expected: 3, found: 1 })
        ));
    }

    #[test]
    fn test_lenient_repairs_rows() {
        let data = b"2DA V2.0\n\nA B C\n0 1 2 3 4\n1 1\n2 x y z\n";
        let (table, errors) = parse_2da_bytes_lenient(data).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 4);
        assert_eq!(errors[0].found, 4);
        assert_eq!(table.get(1, "C"), Some(&Cell::Empty));
        assert_eq!(table.rows()[0].cells.len(), 3);
        assert_eq!(table.value(2, "c"), Some("z"));
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(tokenize(r#"0 "a b"  c "" "#), vec!["0", "a b", "c", ""]);
    }
}
