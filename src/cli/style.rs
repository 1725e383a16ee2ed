//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips the escapes when the stream
//! is not a terminal (CI logs, redirected output).

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark
pub const CHECK: &str = "✓";
/// Cross mark
pub const CROSS: &str = "✗";

/// Semantic styles for CLI output
pub trait Stylize: Display + Sized {
    /// Positive outcome
    fn success(&self) -> String {
        self.green().bold().to_string()
    }

    /// Policy violation
    fn failure(&self) -> String {
        self.red().bold().to_string()
    }

    /// Infrastructure problem
    fn warn(&self) -> String {
        self.yellow().bold().to_string()
    }

    /// Names and values worth noticing
    fn emphasis(&self) -> String {
        self.cyan().to_string()
    }

    /// Secondary detail
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }
}

impl<T: Display> Stylize for T {}
