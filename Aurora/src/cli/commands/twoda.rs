//! CLI commands for 2DA tables

use std::path::Path;

use crate::formats::twoda::{Cell, DEFAULT_CELL, EMPTY_CELL, read_2da};

pub fn get(path: &Path, row: &str, column: &str, resolve: bool) -> anyhow::Result<()> {
    let table = read_2da(path)?;
    let index = match row.parse::<usize>() {
        Ok(index) if index < table.row_count() => index,
        _ => table
            .row_by_label(row)
            .ok_or_else(|| anyhow::anyhow!("no row '{row}' in {}", path.display()))?,
    };
    if table.column_index(column).is_none() {
        anyhow::bail!("no column '{column}' in {}", path.display());
    }

    let text = if resolve {
        table.resolve(index, column).unwrap_or(EMPTY_CELL).to_string()
    } else {
        match table.get(index, column) {
            Some(Cell::Value(v)) => v.clone(),
            Some(Cell::Default) => DEFAULT_CELL.to_string(),
            Some(Cell::Empty) | None => EMPTY_CELL.to_string(),
        }
    };
    println!("{text}");
    Ok(())
}

pub fn columns(path: &Path) -> anyhow::Result<()> {
    let table = read_2da(path)?;
    for (i, name) in table.columns().iter().enumerate() {
        println!("{i:>3}  {name}");
    }
    println!("{} columns, {} rows", table.column_count(), table.row_count());
    Ok(())
}
