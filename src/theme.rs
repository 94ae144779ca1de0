//! Terminal styling helpers
//!
//! `colored` drops styling on its own when stdout is not a terminal or
//! `NO_COLOR` is set, so callers never branch on that.

use crate::model::Safety;
use colored::Colorize;

pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> String {
        text.bold().to_string()
    }

    pub fn primary(text: &str) -> String {
        text.cyan().bold().to_string()
    }

    pub fn muted(text: &str) -> String {
        text.dimmed().to_string()
    }

    pub fn size(text: &str) -> String {
        text.yellow().to_string()
    }

    pub fn value(text: &str) -> String {
        text.bold().to_string()
    }

    pub fn success(text: &str) -> String {
        text.green().to_string()
    }

    pub fn warning(text: &str) -> String {
        text.yellow().bold().to_string()
    }

    pub fn error(text: &str) -> String {
        text.red().bold().to_string()
    }

    pub fn command(text: &str) -> String {
        text.magenta().to_string()
    }

    /// Safety label, colored by how careful the user should be.
    pub fn safety(safety: Safety) -> String {
        let label = safety.as_str();
        match safety {
            Safety::Safe => label.green().to_string(),
            Safety::Caution => label.yellow().to_string(),
            Safety::Dangerous => label.red().bold().to_string(),
        }
    }

    pub fn divider(width: usize) -> String {
        "-".repeat(width).dimmed().to_string()
    }

    pub fn divider_bold(width: usize) -> String {
        "=".repeat(width)
    }
}
