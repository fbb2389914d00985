//! 2DA serialization

use std::fmt::Write as _;
use std::path::Path;

use super::{Cell, DEFAULT_CELL, EMPTY_CELL, TwoDaTable};
use crate::error::Result;
use crate::formats::common::encode_cp1252;

/// Write a 2DA table to disk
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_2da<P: AsRef<Path>>(table: &TwoDaTable, path: P) -> Result<()> {
    std::fs::write(path, serialize_2da(table))?;
    Ok(())
}

/// Serialize a 2DA table with columns aligned.
#[must_use]
pub fn serialize_2da(table: &TwoDaTable) -> Vec<u8> {
    let header: Vec<String> = table.columns().iter().map(|c| quote(c)).collect();
    let rows: Vec<(String, Vec<String>)> = table
        .rows()
        .iter()
        .map(|row| (quote(&row.label), row.cells.iter().map(cell_token).collect()))
        .collect();

    // Column 0 holds row labels and has no header.
    let mut widths = vec![0usize; header.len() + 1];
    for (i, name) in header.iter().enumerate() {
        widths[i + 1] = name.chars().count();
    }
    for (label, cells) in &rows {
        widths[0] = widths[0].max(label.chars().count());
        for (i, cell) in cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(i + 1) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::from("2DA V2.0\n");
    if let Some(default) = &table.default {
        let _ = writeln!(out, "DEFAULT: {}", quote(default));
    } else {
        out.push('\n');
    }

    let mut line = format!("{:width$}", "", width = widths[0]);
    for (i, name) in header.iter().enumerate() {
        let _ = write!(line, " {name:width$}", width = widths[i + 1]);
    }
    push_line(&mut out, &line);

    for (label, cells) in &rows {
        let mut line = format!("{label:width$}", width = widths[0]);
        for (i, cell) in cells.iter().enumerate() {
            let width = widths.get(i + 1).copied().unwrap_or(0);
            let _ = write!(line, " {cell:width$}");
        }
        push_line(&mut out, &line);
    }

    encode_cp1252(&out)
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn cell_token(cell: &Cell) -> String {
    match cell {
        Cell::Empty => EMPTY_CELL.to_string(),
        Cell::Default => DEFAULT_CELL.to_string(),
        Cell::Value(v) => quote(v),
    }
}

/// Quote values that would not survive whitespace tokenizing.
fn quote(value: &str) -> String {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
