//! Shared output helpers for command handlers.

use std::fmt::Display;

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Print a value as pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Report a failed action to stderr.
pub fn print_error(action: &str, err: &dyn Display) {
    eprintln!("Error {}: {}", action, err);
}

/// Render rows as a table followed by a count line.
pub fn display_table_with_count<T: Tabled>(rows: Vec<T>, noun: &str) {
    let count = rows.len();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    println!("{} {}", count, noun);
}
