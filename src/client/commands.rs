//! CLI command handlers, one module per resource group.

pub mod assign;
pub mod clones;
pub mod creds;
pub mod files;
pub mod jobs;
pub mod output;
pub mod projects;
pub mod runs;

pub use output::{display_table_with_count, print_error, print_json};
