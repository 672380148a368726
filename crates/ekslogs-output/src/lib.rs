//! Terminal output for ekslogs
//!
//! Renders log entries as colored text, bare messages, or JSON lines.

mod highlight;
mod printer;
mod theme;

pub use highlight::highlight_message;
pub use printer::{ColorMode, OutputFormat, ParseModeError, Printer};
pub use theme::Theme;
