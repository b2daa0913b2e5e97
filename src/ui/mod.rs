//! Terminal presentation for the CLI

pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use output::{
    dim, error, header, info, message_line, outcome_line, section, success, summary_row, warn,
};
pub use progress::PreloadProgress;
pub use table::{documents_table, facts_table, stats_table};
pub use theme::{theme, Icons, Theme};
