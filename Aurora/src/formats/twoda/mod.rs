//! 2DA V2.0 text tables
//!
//! Rule tables (`classes.2da`, `baseitems.2da`, ...) are whitespace-separated
//! text: a `2DA V2.0` header, an optional `DEFAULT:` line, a line of column
//! names and one line per row, each starting with its row label.

mod reader;
mod writer;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use reader::{TwoDaRowError, parse_2da_bytes, parse_2da_bytes_lenient, read_2da};
pub use writer::{serialize_2da, write_2da};

/// Token marking a cell with no value.
pub const EMPTY_CELL: &str = "****";

/// Token requesting the table default.
pub const DEFAULT_CELL: &str = "DEFAULT";

/// A single cell.
///
/// `Empty` and `Default` are distinct: an empty cell never picks up the
/// table default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Default,
    Value(String),
}

impl Cell {
    /// Classify a raw (already unquoted) token.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            EMPTY_CELL => Cell::Empty,
            DEFAULT_CELL => Cell::Default,
            other => Cell::Value(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// One data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoDaRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// A parsed 2DA table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TwoDaTable {
    /// Value declared by the `DEFAULT:` line.
    pub default: Option<String>,
    columns: Vec<String>,
    /// Lowercased column name to index; first occurrence wins.
    column_lookup: HashMap<String, usize>,
    rows: Vec<TwoDaRow>,
}

impl TwoDaTable {
    /// Create an empty table with the given columns.
    #[must_use]
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut column_lookup = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            column_lookup.entry(name.to_lowercase()).or_insert(i);
        }
        Self {
            default: None,
            columns,
            column_lookup,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[TwoDaRow] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Case-insensitive column lookup.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_lookup.get(&name.to_lowercase()).copied()
    }

    /// Index of the first row with this label.
    #[must_use]
    pub fn row_by_label(&self, label: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.label == label)
    }

    /// Append a row, padding missing cells with [`Cell::Empty`] and dropping
    /// extra ones. Returns the new row index.
    pub fn push_row(&mut self, label: impl Into<String>, mut cells: Vec<Cell>) -> usize {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows.push(TwoDaRow {
            label: label.into(),
            cells,
        });
        self.rows.len() - 1
    }

    /// Raw cell at (row, column).
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.cells.get(col)
    }

    /// Replace a cell. Returns `false` when the row or column does not exist.
    pub fn set(&mut self, row: usize, column: &str, cell: Cell) -> bool {
        let Some(col) = self.column_index(column) else {
            return false;
        };
        match self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Literal value only; `****` and `DEFAULT` both give `None`.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.get(row, column)?.as_value()
    }

    /// Value with `DEFAULT` substituted by the declared table default.
    ///
    /// An empty cell stays `None`; it is not coerced to the default.
    #[must_use]
    pub fn resolve(&self, row: usize, column: &str) -> Option<&str> {
        match self.get(row, column)? {
            Cell::Value(v) => Some(v),
            Cell::Default => self.default.as_deref(),
            Cell::Empty => None,
        }
    }

    /// Resolved value parsed as an integer; `0x` prefixed hex is accepted.
    #[must_use]
    pub fn get_int(&self, row: usize, column: &str) -> Option<i32> {
        parse_int(self.resolve(row, column)?)
    }
}

fn parse_int(text: &str) -> Option<i32> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        // Hex values are bit patterns, e.g. 0xFFFFFFFF.
        return u32::from_str_radix(hex, 16).ok().map(|v| v as i32);
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TwoDaTable {
        let mut t = TwoDaTable::new(["Label", "Name", "HitDie"]);
        t.default = Some("7".to_string());
        t.push_row("0", vec![Cell::Value("Barbarian".into()), Cell::Value("1".into()), Cell::Value("12".into())]);
        t.push_row("1", vec![Cell::Value("Bard".into()), Cell::Empty, Cell::Default]);
        t
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let t = table();
        assert_eq!(t.column_index("Label"), Some(0));
        assert_eq!(t.column_index("label"), t.column_index("LABEL"));
        assert_eq!(t.value(0, "hitdie"), Some("12"));
        assert_eq!(t.column_index("Missing"), None);
    }

    #[test]
    fn test_empty_is_not_default() {
        let t = table();
        assert_eq!(t.get(1, "Name"), Some(&Cell::Empty));
        assert_eq!(t.resolve(1, "Name"), None);
        assert_eq!(t.value(1, "HitDie"), None);
        assert_eq!(t.resolve(1, "HitDie"), Some("7"));
        assert_eq!(t.get_int(1, "HitDie"), Some(7));
    }

    #[test]
    fn test_default_without_declaration() {
        let mut t = table();
        t.default = None;
        assert_eq!(t.resolve(1, "HitDie"), None);
    }

    #[test]
    fn test_push_row_pads() {
        let mut t = table();
        let row = t.push_row("2", vec![Cell::Value("Cleric".into())]);
        assert_eq!(t.rows()[row].cells.len(), 3);
        assert_eq!(t.get(row, "HitDie"), Some(&Cell::Empty));
        assert_eq!(t.row_by_label("2"), Some(2));
    }

    #[test]
    fn test_set_and_hex() {
        let mut t = table();
        assert!(t.set(0, "name", Cell::Value("0x10".into())));
        assert_eq!(t.get_int(0, "Name"), Some(16));
        assert!(!t.set(9, "Name", Cell::Empty));
        assert_eq!(parse_int("0xFFFFFFFF"), Some(-1));
        assert_eq!(parse_int("abc"), None);
    }
}
