//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use prorab_core::OperationResult;
use serde::Serialize;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Table cell, red when `alarm` is set
pub fn flagged_cell(text: &str, alarm: bool) -> Cell {
    let cell = Cell::new(text);
    if alarm {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

/// Print `value` as the data of a successful JSON envelope
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    envelope(&OperationResult::ok(value))
}

/// Print an operation result as pretty JSON
pub fn envelope<T: Serialize>(result: &OperationResult<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
